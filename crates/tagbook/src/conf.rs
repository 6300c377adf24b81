//! Reserved config keys, defaults and well-known file names.

use crate::spec::SpecScalarTableRef;

/// Document name key: required at top level, optional per entry as a routing override.
pub const C_KEY_DOCUMENT_NAME: &str = "DocumentName";
/// Entry key: target sheet.
pub const C_KEY_SHEET_NAME: &str = "SheetName";
/// Entry key: tag name.
pub const C_KEY_TAG_NAME: &str = "TagName";
/// Entry key: external data file.
pub const C_KEY_DATA_LOCATION: &str = "DataLocation";
/// Entry key: inline literal payload.
pub const C_KEY_INLINE_DATA: &str = "InlineData";
/// Entry key: auxiliary header mapping.
pub const C_KEY_AUX_HEADERS: &str = "AuxHeaders";
/// Entry key: free text description.
pub const C_KEY_DESCRIPTION: &str = "Description";
/// Entry keys never moved into a synthesized inline payload.
pub const TUP_RESERVED_ENTRY_KEYS: [&str; 7] = [
    C_KEY_DOCUMENT_NAME,
    C_KEY_SHEET_NAME,
    C_KEY_TAG_NAME,
    C_KEY_DATA_LOCATION,
    C_KEY_INLINE_DATA,
    C_KEY_AUX_HEADERS,
    C_KEY_DESCRIPTION,
];

/// Config discovery pattern, relative to the config root.
pub const C_CONFIG_GLOB_DEFAULT: &str = "**/*.toml";
/// File name of the catalog export.
pub const C_CATALOG_FILE_NAME: &str = "config_metadata.csv";
/// Catalog export columns, in order.
pub const TUP_CATALOG_COLUMNS: [&str; 7] = [
    C_KEY_DOCUMENT_NAME,
    "TableName",
    C_KEY_SHEET_NAME,
    C_KEY_TAG_NAME,
    C_KEY_DATA_LOCATION,
    C_KEY_AUX_HEADERS,
    C_KEY_DESCRIPTION,
];

/// Extensions accepted for external data files (lowercase, no dot).
pub const TUP_DATA_EXTENSIONS: [&str; 3] = ["csv", "tsv", "txt"];
/// Default field delimiter of external data files.
pub const C_DELIMITER_DEFAULT: char = ',';

/// Tables rewritten header-as-value unless configured otherwise.
pub const TUP_SCALAR_TABLES_DEFAULT: [(&str, &str); 2] = [
    ("SysSettings", "StartYear"),
    ("SysSettings", "ActivePDef"),
];

/// Build the default scalar-table list.
pub fn derive_default_scalar_tables() -> Vec<SpecScalarTableRef> {
    TUP_SCALAR_TABLES_DEFAULT
        .iter()
        .map(|(document_name, table_name)| SpecScalarTableRef {
            document_name: document_name.to_string(),
            table_name: table_name.to_string(),
        })
        .collect()
}
