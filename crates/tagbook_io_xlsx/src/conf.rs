//! XLSX constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::SpecCellFormat;

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Blank rows left between two consecutive tables on one sheet.
pub const N_ROWS_TABLE_GAP: usize = 3;
/// Column of auxiliary header rows (B); tag markers and tables start in column A.
pub const N_COL_AUX_HEADER: usize = 1;
/// Prefix put in front of every tag marker.
pub const C_TAG_PREFIX_DEFAULT: &str = "~";
/// Prefix put in front of every auxiliary `key: value` header row.
pub const C_AUX_HEADER_PREFIX_DEFAULT: &str = "~UC_Sets: ";
/// Tag names cannot carry `:` through TOML keys comfortably, so `·` stands in for it.
pub const C_TAG_COLON_STAND_IN: char = '·';

/// Build default named format presets used by [`crate::writer::XlsxTaggedWriter`].
///
/// Keys: `tag`, `header`, `text`.
pub fn derive_default_tagged_formats() -> BTreeMap<String, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat::default();

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert("text".to_string(), cfg_base_fmt_spec.clone());
    dict_fmt.insert(
        "tag".to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            ..Default::default()
        }),
    );
    dict_fmt.insert("header".to_string(), cfg_base_fmt_spec);

    dict_fmt
}

