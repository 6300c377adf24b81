//! Stateless helper utilities used by the tagged-workbook writer kernel.

use std::collections::BTreeSet;

use polars::prelude::{AnyValue, DataFrame};

use crate::conf::{
    C_TAG_COLON_STAND_IN, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    TUP_EXCEL_ILLEGAL,
};
use crate::spec::{EnumCellValue, SpecDataBlock, SpecTablePlacement, XlsxLayoutError};

////////////////////////////////////////////////////////////////////////////////
// #region TablePlacement

/// Plan where one table lands when the sheet cursor sits at `row_base`.
///
/// Layout, top to bottom: `n_rows_aux` auxiliary rows, the tag row, the column
/// header row, then `n_rows_data` body rows. The tag row sits at
/// `row_base + max(n_rows_aux, 1)`, so a table without auxiliary rows keeps
/// `row_base` blank. The cursor advances by `n_rows_aux + 2 + n_rows_data + n_rows_gap`.
pub fn plan_table_placement(
    row_base: usize,
    n_rows_aux: usize,
    n_rows_data: usize,
    n_rows_gap: usize,
) -> SpecTablePlacement {
    let row_tag = row_base + usize::max(n_rows_aux, 1);
    let row_header = row_tag + 1;

    SpecTablePlacement {
        row_base,
        row_aux_start: row_tag - n_rows_aux,
        n_rows_aux,
        row_tag,
        row_header,
        row_data_start: row_header + 1,
        n_rows_data,
        row_next: row_base + n_rows_aux + 1 + 1 + n_rows_data + n_rows_gap,
    }
}

/// Reject a table wider than a worksheet.
pub fn validate_table_width(sheet_name: &str, n_width: usize) -> Result<(), XlsxLayoutError> {
    if n_width > N_NCOLS_EXCEL_MAX {
        return Err(XlsxLayoutError::ColumnLimitExceeded {
            sheet_name: sheet_name.to_string(),
            width: n_width,
        });
    }
    Ok(())
}

/// Reject a placement whose content passes the last worksheet row.
pub fn validate_table_placement(
    sheet_name: &str,
    placement: &SpecTablePlacement,
) -> Result<(), XlsxLayoutError> {
    if placement.row_last() >= N_NROWS_EXCEL_MAX {
        return Err(XlsxLayoutError::RowLimitExceeded {
            sheet_name: sheet_name.to_string(),
            row: placement.row_last(),
        });
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MarkerText

/// Build tag marker text: prefix prepended once, `·` rewritten to `:`.
pub fn derive_tag_marker(tag_name: &str, tag_prefix: &str) -> String {
    let c_tag = tag_name.replace(C_TAG_COLON_STAND_IN, ":");
    if tag_prefix.is_empty() || c_tag.starts_with(tag_prefix) {
        return c_tag;
    }
    format!("{tag_prefix}{c_tag}")
}

/// Build one auxiliary header row text (`<prefix>key: value`).
pub fn derive_aux_header_text(key: &str, value: &str, aux_header_prefix: &str) -> String {
    format!("{aux_header_prefix}{key}: {value}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Return `name` or the first free `name__N` (N >= 2), registering the result.
///
/// Excel compares sheet names case-insensitively, so `set_existing` holds
/// lowercase names. The base is shortened per candidate so the `__N` suffix
/// always survives the length limit.
pub fn derive_unique_sheet_name(name: &str, set_existing: &mut BTreeSet<String>) -> String {
    if set_existing.insert(name.to_lowercase()) {
        return name.to_string();
    }

    let mut n_idx = 2usize;
    loop {
        let c_suffix = format!("__{n_idx}");
        let n_len_base = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_suffix.len());
        let base_name: String = name.chars().take(n_len_base).collect();
        let candidate = format!("{base_name}{c_suffix}");
        if set_existing.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n_idx += 1;
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Widths

/// Estimate displayed width units for text (non-ASCII counts ~1.6x).
pub fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DataFrameConversion

/// Convert a DataFrame into a data block (column names + row-major cells).
pub fn derive_data_block_from_dataframe(df: &DataFrame) -> Result<SpecDataBlock, XlsxLayoutError> {
    let l_colnames: Vec<String> = df
        .get_column_names_str()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    let l_cols = df.get_columns();

    let mut l_rows = Vec::with_capacity(df.height());
    for n_idx_row in 0..df.height() {
        let mut row = Vec::with_capacity(l_cols.len());
        for col in l_cols {
            let value = col
                .get(n_idx_row)
                .map_err(|err| XlsxLayoutError::DataFrame(err.to_string()))?;
            row.push(derive_cell_value_from_any_value(value));
        }
        l_rows.push(row);
    }

    SpecDataBlock::new(l_colnames, l_rows)
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => EnumCellValue::Boolean(val),
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
