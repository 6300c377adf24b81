//! Tagged-workbook writer kernel: one instance per output document.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

use log::{debug, info};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::conf::N_COL_AUX_HEADER;
use crate::spec::{
    EnumAutofitColumnsRule, EnumCellValue, EnumDocumentState, SpecCellFormat, SpecDataBlock,
    SpecSheetCursor, SpecTablePlacement, SpecTableRecord, SpecTaggedWriteOptions,
    SpecXlsxReport, XlsxLayoutError,
};
use crate::util::{
    derive_aux_header_text, derive_tag_marker, derive_unique_sheet_name,
    estimate_unicode_string_width, sanitize_sheet_name, validate_table_placement,
    validate_table_width,
};

/// One table write request.
#[derive(Debug, Clone)]
pub struct SpecTableWrite<'a> {
    /// Logical sheet name; must be part of the sheet skeleton.
    pub sheet_name: &'a str,
    /// Tag name (marker text is derived from it).
    pub tag_name: &'a str,
    /// Auxiliary `key: value` rows, written in this order.
    pub aux_headers: Vec<(&'a str, &'a str)>,
    /// Table payload.
    pub block: &'a SpecDataBlock,
}

/// Stateful per-document writer.
///
/// Lifecycle: [`Self::new`] (uninitialized) → [`Self::create_sheets`] →
/// [`Self::write_table`] repeatedly → [`Self::finish`], which consumes the
/// writer. Each sheet owns a [`SpecSheetCursor`]; tables on one sheet must be
/// written in order, tables on different sheets never affect each other.
pub struct XlsxTaggedWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    write_options: SpecTaggedWriteOptions,
    fmt_tag: Format,
    fmt_header: Format,
    fmt_text: Format,
    enum_state: EnumDocumentState,
    l_sheet_names: Vec<String>,
    dict_sheet_names_actual: BTreeMap<String, String>,
    dict_cursors: BTreeMap<String, SpecSheetCursor>,
    dict_widths: BTreeMap<String, Vec<usize>>,
    set_sheet_names_existing: BTreeSet<String>,
    report: SpecXlsxReport,
}

impl XlsxTaggedWriter {
    /// Create writer bound to output path and layout options.
    ///
    /// The workbook is buffered in memory until [`Self::finish`] is called.
    pub fn new(path_file_out: PathBuf, write_options: SpecTaggedWriteOptions) -> Self {
        Self {
            fmt_tag: derive_rust_xlsx_format(&write_options.fmt_tag),
            fmt_header: derive_rust_xlsx_format(&write_options.fmt_header),
            fmt_text: derive_rust_xlsx_format(&write_options.fmt_text),
            path_file_out,
            workbook: Workbook::new(),
            write_options,
            enum_state: EnumDocumentState::Uninitialized,
            l_sheet_names: Vec::new(),
            dict_sheet_names_actual: BTreeMap::new(),
            dict_cursors: BTreeMap::new(),
            dict_widths: BTreeMap::new(),
            set_sheet_names_existing: BTreeSet::new(),
            report: SpecXlsxReport::default(),
        }
    }

    /// Return output file path as string.
    pub fn file_out(&self) -> String {
        self.path_file_out.to_string_lossy().to_string()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EnumDocumentState {
        self.enum_state
    }

    /// Logical sheet names in creation order.
    pub fn sheet_names(&self) -> &[String] {
        &self.l_sheet_names
    }

    /// Cursor of one logical sheet.
    pub fn cursor(&self, sheet_name: &str) -> Option<SpecSheetCursor> {
        self.dict_cursors.get(sheet_name).copied()
    }

    /// Create the sheet skeleton: one empty sheet per distinct name, first-seen order.
    pub fn create_sheets<I, S>(&mut self, sheet_names: I) -> Result<(), XlsxLayoutError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.enum_state != EnumDocumentState::Uninitialized {
            return Err(XlsxLayoutError::SheetsAlreadyCreated(
                self.path_file_out.clone(),
            ));
        }
        if self.write_options.n_rows_gap == 0 {
            return Err(XlsxLayoutError::InvalidOption(
                "n_rows_gap must be >= 1.".to_string(),
            ));
        }

        for sheet_name in sheet_names {
            let sheet_name = sheet_name.as_ref();
            if self.dict_cursors.contains_key(sheet_name) {
                continue;
            }

            let c_sanitized = sanitize_sheet_name(sheet_name, "_");
            let c_actual =
                derive_unique_sheet_name(&c_sanitized, &mut self.set_sheet_names_existing);
            if c_actual != sheet_name {
                self.report.warn(format!(
                    "Sheet {sheet_name:?} written as {c_actual:?} (Excel naming rules)."
                ));
            }

            self.workbook.add_worksheet().set_name(&c_actual)?;

            self.l_sheet_names.push(sheet_name.to_string());
            self.dict_sheet_names_actual
                .insert(sheet_name.to_string(), c_actual.clone());
            self.dict_cursors
                .insert(sheet_name.to_string(), SpecSheetCursor::new());
            self.report.sheets.push(c_actual);
        }

        self.enum_state = EnumDocumentState::SheetsCreated;
        Ok(())
    }

    /// Write one table at its sheet cursor and advance the cursor.
    ///
    /// The cursor is only advanced once every cell of the table is written.
    pub fn write_table(
        &mut self,
        table: SpecTableWrite<'_>,
    ) -> Result<SpecTablePlacement, XlsxLayoutError> {
        if self.enum_state == EnumDocumentState::Uninitialized {
            return Err(XlsxLayoutError::SheetsNotCreated);
        }

        let SpecTableWrite {
            sheet_name,
            tag_name,
            aux_headers,
            block,
        } = table;

        let Some(mut cursor) = self.dict_cursors.get(sheet_name).copied() else {
            return Err(XlsxLayoutError::SheetNotCreated(sheet_name.to_string()));
        };
        let c_actual = self
            .dict_sheet_names_actual
            .get(sheet_name)
            .cloned()
            .ok_or_else(|| XlsxLayoutError::SheetNotCreated(sheet_name.to_string()))?;

        validate_table_width(sheet_name, block.width())?;
        let placement = cursor.place(
            aux_headers.len(),
            block.height(),
            self.write_options.n_rows_gap,
        );
        validate_table_placement(sheet_name, &placement)?;

        let c_tag_marker = derive_tag_marker(tag_name, &self.write_options.tag_prefix);
        let worksheet = self.workbook.worksheet_from_name(&c_actual)?;

        for (n_offset, (key, value)) in aux_headers.iter().enumerate() {
            let c_aux = derive_aux_header_text(key, value, &self.write_options.aux_header_prefix);
            write_text_cell(
                worksheet,
                placement.row_aux_start + n_offset,
                N_COL_AUX_HEADER,
                &c_aux,
                &self.fmt_tag,
            )?;
        }
        write_text_cell(worksheet, placement.row_tag, 0, &c_tag_marker, &self.fmt_tag)?;

        for (n_idx_col, c_col) in block.columns().iter().enumerate() {
            write_text_cell(
                worksheet,
                placement.row_header,
                n_idx_col,
                c_col,
                &self.fmt_header,
            )?;
        }
        for (n_offset, row) in block.rows().iter().enumerate() {
            for (n_idx_col, value) in row.iter().enumerate() {
                write_cell_with_format(
                    worksheet,
                    placement.row_data_start + n_offset,
                    n_idx_col,
                    value,
                    &self.fmt_text,
                )?;
            }
        }

        self.update_widths(sheet_name, block);
        self.dict_cursors.insert(sheet_name.to_string(), cursor);
        self.enum_state = EnumDocumentState::Writing;

        debug!(
            "{} | sheet={sheet_name} | tag={c_tag_marker} | rows {}..={} | next={}",
            self.path_file_out.display(),
            placement.row_base,
            placement.row_last(),
            placement.row_next
        );
        self.report.tables.push(SpecTableRecord {
            sheet_name: sheet_name.to_string(),
            tag_marker: c_tag_marker,
            placement,
        });

        Ok(placement)
    }

    /// Seal the document: apply column widths and save it to disk.
    pub fn finish(mut self) -> Result<SpecXlsxReport, XlsxLayoutError> {
        let policy_autofit = self.write_options.policy_autofit.clone();
        if policy_autofit.rule_columns != EnumAutofitColumnsRule::None {
            let n_min = usize::max(1, policy_autofit.width_cell_min);
            let n_max = usize::min(255, usize::max(n_min, policy_autofit.width_cell_max));

            for (sheet_name, l_widths) in &self.dict_widths {
                let Some(c_actual) = self.dict_sheet_names_actual.get(sheet_name) else {
                    continue;
                };
                let worksheet = self.workbook.worksheet_from_name(c_actual)?;
                for (n_idx_col, n_width_recorded) in l_widths.iter().enumerate() {
                    let n_width_final = usize::min(
                        n_max,
                        usize::max(n_min, n_width_recorded + policy_autofit.width_cell_padding),
                    );
                    worksheet.set_column_width(cast_col_num(n_idx_col)?, n_width_final as f64)?;
                }
            }
        }

        if let Some(path_dir_out) = self.path_file_out.parent()
            && !path_dir_out.as_os_str().is_empty()
        {
            fs::create_dir_all(path_dir_out).map_err(|source| XlsxLayoutError::Io {
                path: path_dir_out.to_path_buf(),
                source,
            })?;
        }
        self.workbook.save(&self.path_file_out)?;

        info!(
            "Wrote {} ({} sheets, {} tables)",
            self.path_file_out.display(),
            self.report.sheets.len(),
            self.report.tables.len()
        );

        let mut report = self.report;
        report.file_out = self.path_file_out;
        Ok(report)
    }

    fn update_widths(&mut self, sheet_name: &str, block: &SpecDataBlock) {
        let enum_rule = self.write_options.policy_autofit.rule_columns;
        if enum_rule == EnumAutofitColumnsRule::None || block.width() == 0 {
            return;
        }

        let l_widths = self.dict_widths.entry(sheet_name.to_string()).or_default();
        if l_widths.len() < block.width() {
            l_widths.resize(block.width(), 0);
        }

        for (n_idx_col, c_col) in block.columns().iter().enumerate() {
            l_widths[n_idx_col] =
                usize::max(l_widths[n_idx_col], estimate_unicode_string_width(c_col));
        }
        if enum_rule == EnumAutofitColumnsRule::All {
            for row in block.rows() {
                for (n_idx_col, value) in row.iter().enumerate() {
                    l_widths[n_idx_col] = usize::max(
                        l_widths[n_idx_col],
                        estimate_unicode_string_width(&value.to_string()),
                    );
                }
            }
        }
    }
}

fn write_text_cell(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    text: &str,
    format: &Format,
) -> Result<(), XlsxLayoutError> {
    worksheet.write_string_with_format(
        cast_row_num(row_idx)?,
        cast_col_num(col_idx)?,
        text,
        format,
    )?;
    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), XlsxLayoutError> {
    match value {
        EnumCellValue::None => {}
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(
                cast_row_num(row_idx)?,
                cast_col_num(col_idx)?,
                val,
                format,
            )?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(
                cast_row_num(row_idx)?,
                cast_col_num(col_idx)?,
                *val,
                format,
            )?;
        }
        EnumCellValue::Boolean(val) => {
            worksheet.write_boolean_with_format(
                cast_row_num(row_idx)?,
                cast_col_num(col_idx)?,
                *val,
                format,
            )?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }
    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, XlsxLayoutError> {
    u32::try_from(value).map_err(|_| {
        XlsxLayoutError::InvalidOption(format!("row index overflow: {value}"))
    })
}

fn cast_col_num(value: usize) -> Result<u16, XlsxLayoutError> {
    u16::try_from(value).map_err(|_| {
        XlsxLayoutError::InvalidOption(format!("column index overflow: {value}"))
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use calamine::{Data, Reader, Xlsx, open_workbook};
    use pretty_assertions::assert_eq;

    use super::*;

    fn s(val: &str) -> EnumCellValue {
        EnumCellValue::String(val.to_string())
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn read_cell(path: &Path, sheet: &str, row: u32, col: u32) -> Option<Data> {
        let mut workbook: Xlsx<_> = open_workbook(path).expect("open workbook");
        let range = workbook.worksheet_range(sheet).expect("sheet range");
        range.get_value((row, col)).cloned()
    }

    #[test]
    fn test_basic_stacking_on_one_sheet() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_out = tmp.path().join("out").join("Book.xlsx");

        let block_first = SpecDataBlock::new(
            cols(&["Region", "Value"]),
            vec![vec![s("NI"), s("1.50")], vec![s("SI"), s("2.25")]],
        )
        .expect("block");
        let block_second = SpecDataBlock::new(
            cols(&["Attribute", "Year"]),
            vec![vec![s("SHARE-I"), EnumCellValue::Number(2030.0)]],
        )
        .expect("block");

        let mut writer = XlsxTaggedWriter::new(path_out.clone(), SpecTaggedWriteOptions::default());
        writer.create_sheets(["S"]).expect("create sheets");
        assert_eq!(writer.state(), EnumDocumentState::SheetsCreated);

        let first = writer
            .write_table(SpecTableWrite {
                sheet_name: "S",
                tag_name: "FI_T",
                aux_headers: vec![],
                block: &block_first,
            })
            .expect("first table");
        assert_eq!((first.row_tag, first.row_header, first.row_data_start), (1, 2, 3));
        assert_eq!(writer.cursor("S").map(|c| c.next_row()), Some(7));
        assert_eq!(writer.state(), EnumDocumentState::Writing);

        let second = writer
            .write_table(SpecTableWrite {
                sheet_name: "S",
                tag_name: "TFM_INS",
                aux_headers: vec![("R_E", "AllRegions")],
                block: &block_second,
            })
            .expect("second table");
        assert_eq!(
            (second.row_aux_start, second.row_tag, second.row_header, second.row_data_start),
            (7, 8, 9, 10)
        );
        assert_eq!(writer.cursor("S").map(|c| c.next_row()), Some(14));

        let report = writer.finish().expect("finish");
        assert_eq!(report.sheets, vec!["S".to_string()]);
        assert_eq!(report.tables.len(), 2);
        assert!(path_out.exists());

        assert_eq!(read_cell(&path_out, "S", 1, 0), Some(Data::String("~FI_T".into())));
        assert_eq!(read_cell(&path_out, "S", 2, 1), Some(Data::String("Value".into())));
        assert_eq!(read_cell(&path_out, "S", 3, 0), Some(Data::String("NI".into())));
        assert_eq!(read_cell(&path_out, "S", 4, 1), Some(Data::String("2.25".into())));
        assert_eq!(
            read_cell(&path_out, "S", 7, 1),
            Some(Data::String("~UC_Sets: R_E: AllRegions".into()))
        );
        assert_eq!(read_cell(&path_out, "S", 8, 0), Some(Data::String("~TFM_INS".into())));
        assert_eq!(read_cell(&path_out, "S", 9, 0), Some(Data::String("Attribute".into())));
        assert_eq!(read_cell(&path_out, "S", 10, 1), Some(Data::Float(2030.0)));
    }

    #[test]
    fn test_sheets_have_independent_cursors() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let block = SpecDataBlock::new(cols(&["a"]), vec![vec![s("1")], vec![s("2")]])
            .expect("block");

        let mut writer = XlsxTaggedWriter::new(
            tmp.path().join("Book.xlsx"),
            SpecTaggedWriteOptions::default(),
        );
        writer.create_sheets(["B", "A", "B"]).expect("create sheets");
        assert_eq!(writer.sheet_names(), ["B".to_string(), "A".to_string()]);

        for _ in 0..3 {
            writer
                .write_table(SpecTableWrite {
                    sheet_name: "A",
                    tag_name: "T",
                    aux_headers: vec![],
                    block: &block,
                })
                .expect("write A");
        }
        assert_eq!(writer.cursor("A").map(|c| c.next_row()), Some(21));
        assert_eq!(writer.cursor("B").map(|c| c.next_row()), Some(0));

        let placement = writer
            .write_table(SpecTableWrite {
                sheet_name: "B",
                tag_name: "T",
                aux_headers: vec![],
                block: &block,
            })
            .expect("write B");
        assert_eq!(placement.row_base, 0);
        assert_eq!(writer.cursor("A").map(|c| c.next_row()), Some(21));

        let report = writer.finish().expect("finish");
        assert_eq!(report.sheets, vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn test_header_only_and_empty_blocks() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_out = tmp.path().join("Book.xlsx");

        let mut writer = XlsxTaggedWriter::new(path_out.clone(), SpecTaggedWriteOptions::default());
        writer.create_sheets(["S"]).expect("create sheets");
        writer
            .write_table(SpecTableWrite {
                sheet_name: "S",
                tag_name: "StartYear",
                aux_headers: vec![],
                block: &SpecDataBlock::header_only(cols(&["2023"])),
            })
            .expect("header only");
        let placement = writer
            .write_table(SpecTableWrite {
                sheet_name: "S",
                tag_name: "Empty",
                aux_headers: vec![],
                block: &SpecDataBlock::default(),
            })
            .expect("empty");
        assert_eq!(placement.row_base, 5);
        assert_eq!(writer.cursor("S").map(|c| c.next_row()), Some(10));
        writer.finish().expect("finish");

        assert_eq!(read_cell(&path_out, "S", 2, 0), Some(Data::String("2023".into())));
        assert_eq!(read_cell(&path_out, "S", 6, 0), Some(Data::String("~Empty".into())));
    }

    #[test]
    fn test_lifecycle_errors() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let block = SpecDataBlock::header_only(cols(&["a"]));

        let mut writer = XlsxTaggedWriter::new(
            tmp.path().join("Book.xlsx"),
            SpecTaggedWriteOptions::default(),
        );
        let err = writer
            .write_table(SpecTableWrite {
                sheet_name: "S",
                tag_name: "T",
                aux_headers: vec![],
                block: &block,
            })
            .unwrap_err();
        assert!(matches!(err, XlsxLayoutError::SheetsNotCreated));

        writer.create_sheets(["S"]).expect("create sheets");
        assert!(matches!(
            writer.create_sheets(["T"]),
            Err(XlsxLayoutError::SheetsAlreadyCreated(_))
        ));

        let err = writer
            .write_table(SpecTableWrite {
                sheet_name: "Other",
                tag_name: "T",
                aux_headers: vec![],
                block: &block,
            })
            .unwrap_err();
        assert!(matches!(err, XlsxLayoutError::SheetNotCreated(name) if name == "Other"));
        assert_eq!(writer.cursor("S").map(|c| c.next_row()), Some(0));
    }

    #[test]
    fn test_zero_gap_is_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut writer = XlsxTaggedWriter::new(
            tmp.path().join("Book.xlsx"),
            SpecTaggedWriteOptions {
                n_rows_gap: 0,
                ..SpecTaggedWriteOptions::default()
            },
        );
        assert!(matches!(
            writer.create_sheets(["S"]),
            Err(XlsxLayoutError::InvalidOption(_))
        ));
    }

    #[test]
    fn test_illegal_sheet_names_are_sanitized_and_reported() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_out = tmp.path().join("Book.xlsx");

        let mut writer = XlsxTaggedWriter::new(path_out.clone(), SpecTaggedWriteOptions::default());
        writer.create_sheets(["a/b", "a_b"]).expect("create sheets");
        writer
            .write_table(SpecTableWrite {
                sheet_name: "a/b",
                tag_name: "T",
                aux_headers: vec![],
                block: &SpecDataBlock::header_only(cols(&["x"])),
            })
            .expect("write");
        let report = writer.finish().expect("finish");

        assert_eq!(report.sheets, vec!["a_b".to_string(), "a_b__2".to_string()]);
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(read_cell(&path_out, "a_b", 1, 0), Some(Data::String("~T".into())));
    }

    #[test]
    fn test_limit_errors_leave_cursor_unchanged() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let block = SpecDataBlock::new(cols(&["a"]), vec![vec![s("1")], vec![s("2")]])
            .expect("block");

        let mut writer = XlsxTaggedWriter::new(
            tmp.path().join("Book.xlsx"),
            SpecTaggedWriteOptions::default(),
        );
        writer.create_sheets(["S"]).expect("create sheets");
        writer
            .write_table(SpecTableWrite {
                sheet_name: "S",
                tag_name: "T",
                aux_headers: vec![],
                block: &block,
            })
            .expect("first table");
        let cursor_before = writer.cursor("S");
        assert_eq!(cursor_before.map(|c| c.next_row()), Some(7));

        let l_cols_wide: Vec<String> = (0..=crate::conf::N_NCOLS_EXCEL_MAX)
            .map(|n_idx| format!("c{n_idx}"))
            .collect();
        let err = writer
            .write_table(SpecTableWrite {
                sheet_name: "S",
                tag_name: "Wide",
                aux_headers: vec![],
                block: &SpecDataBlock::header_only(l_cols_wide),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            XlsxLayoutError::ColumnLimitExceeded { width, .. }
                if width == crate::conf::N_NCOLS_EXCEL_MAX + 1
        ));
        assert_eq!(writer.cursor("S"), cursor_before);

        let block_tall = SpecDataBlock::new(
            vec![],
            vec![Vec::new(); crate::conf::N_NROWS_EXCEL_MAX - 10 + 1],
        )
        .expect("tall block");
        let err = writer
            .write_table(SpecTableWrite {
                sheet_name: "S",
                tag_name: "Tall",
                aux_headers: vec![],
                block: &block_tall,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            XlsxLayoutError::RowLimitExceeded { row, .. } if row == crate::conf::N_NROWS_EXCEL_MAX
        ));
        assert_eq!(writer.cursor("S"), cursor_before);

        let report = writer.finish().expect("finish");
        assert_eq!(report.tables.len(), 1);
    }

    #[test]
    fn test_derive_rust_xlsx_format_maps_every_field() {
        let spec = SpecCellFormat {
            font_name: Some("Arial".into()),
            font_size: Some(12),
            bold: Some(true),
            italic: Some(true),
            align: Some("Center".into()),
            border: Some(1),
            num_format: Some("0.00".into()),
            bg_color: Some("#FFFF00".into()),
            font_color: Some("#C00000".into()),
        };
        let expected = Format::new()
            .set_font_name("Arial")
            .set_font_size(12.0)
            .set_bold()
            .set_italic()
            .set_align(FormatAlign::Center)
            .set_num_format("0.00")
            .set_background_color("#FFFF00")
            .set_font_color("#C00000")
            .set_border(FormatBorder::Thin);
        assert_eq!(derive_rust_xlsx_format(&spec), expected);

        assert_eq!(derive_rust_xlsx_format(&SpecCellFormat::default()), Format::new());
        assert_eq!(
            derive_rust_xlsx_format(&SpecCellFormat {
                bold: Some(false),
                ..SpecCellFormat::default()
            }),
            Format::new()
        );
        assert_eq!(
            derive_rust_xlsx_format(&SpecCellFormat {
                align: Some("diagonal".into()),
                ..SpecCellFormat::default()
            }),
            Format::new()
        );
    }

    #[test]
    fn test_derive_format_border_and_align() {
        assert_eq!(derive_format_border(2), FormatBorder::Medium);
        assert_eq!(derive_format_border(6), FormatBorder::Double);
        assert_eq!(derive_format_border(7), FormatBorder::Hair);
        assert_eq!(derive_format_border(0), FormatBorder::None);
        assert_eq!(derive_format_border(99), FormatBorder::None);

        assert_eq!(derive_format_align(" RIGHT "), Some(FormatAlign::Right));
        assert_eq!(derive_format_align("general"), Some(FormatAlign::General));
        assert_eq!(derive_format_align("justify"), None);
    }

    #[test]
    fn test_autofit_rule_controls_recorded_widths() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let block = SpecDataBlock::new(
            cols(&["id", "Name"]),
            vec![vec![s("1"), s("Residential heating demand")]],
        )
        .expect("block");
        let table = SpecTableWrite {
            sheet_name: "S",
            tag_name: "T",
            aux_headers: vec![],
            block: &block,
        };

        let mut dict_widths_by_rule = BTreeMap::new();
        for (c_file, enum_rule) in [
            ("header.xlsx", EnumAutofitColumnsRule::Header),
            ("all.xlsx", EnumAutofitColumnsRule::All),
            ("none.xlsx", EnumAutofitColumnsRule::None),
        ] {
            let mut write_options = SpecTaggedWriteOptions::default();
            write_options.policy_autofit.rule_columns = enum_rule;
            let mut writer = XlsxTaggedWriter::new(tmp.path().join(c_file), write_options);
            writer.create_sheets(["S"]).expect("create sheets");
            writer.write_table(table.clone()).expect("write");
            dict_widths_by_rule.insert(c_file, writer.dict_widths.get("S").cloned());
            writer.finish().expect("finish");
        }

        assert_eq!(dict_widths_by_rule["header.xlsx"], Some(vec![2, 4]));
        assert_eq!(dict_widths_by_rule["all.xlsx"], Some(vec![2, 26]));
        assert_eq!(dict_widths_by_rule["none.xlsx"], None);
    }

    #[test]
    fn test_body_num_format_reaches_the_workbook() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_out = tmp.path().join("Book.xlsx");
        let block = SpecDataBlock::new(
            cols(&["Date", "Label"]),
            vec![vec![EnumCellValue::Number(45292.0), s("first")]],
        )
        .expect("block");

        let write_options = SpecTaggedWriteOptions {
            fmt_text: SpecCellFormat {
                num_format: Some("yyyy-mm-dd".into()),
                ..SpecCellFormat::default()
            },
            ..SpecTaggedWriteOptions::default()
        };
        let mut writer = XlsxTaggedWriter::new(path_out.clone(), write_options);
        writer.create_sheets(["S"]).expect("create sheets");
        writer
            .write_table(SpecTableWrite {
                sheet_name: "S",
                tag_name: "T",
                aux_headers: vec![],
                block: &block,
            })
            .expect("write");
        writer.finish().expect("finish");

        assert!(matches!(read_cell(&path_out, "S", 3, 0), Some(Data::DateTime(_))));
        assert_eq!(read_cell(&path_out, "S", 3, 1), Some(Data::String("first".into())));
        assert_eq!(read_cell(&path_out, "S", 2, 0), Some(Data::String("Date".into())));
    }
}
