//! Descriptor, payload and option models shared across the pipeline.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tagbook_io_xlsx::{
    EnumCellValue, SpecAutofitCellsPolicy, SpecCellFormat, SpecTaggedWriteOptions, XlsxLayoutError,
};
use thiserror::Error;

use crate::conf::{C_CONFIG_GLOB_DEFAULT, C_DELIMITER_DEFAULT, derive_default_scalar_tables};

////////////////////////////////////////////////////////////////////////////////
// #region InlinePayload

/// One inline literal cell.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumInlineScalar {
    /// Text (TOML datetimes are kept in their text form).
    String(String),
    /// Integer.
    Integer(i64),
    /// Float.
    Float(f64),
    /// Boolean.
    Boolean(bool),
}

impl EnumInlineScalar {
    /// Cell value written for this literal.
    pub fn to_cell_value(&self) -> EnumCellValue {
        match self {
            EnumInlineScalar::String(val) => EnumCellValue::String(val.clone()),
            EnumInlineScalar::Integer(val) => EnumCellValue::Number(*val as f64),
            EnumInlineScalar::Float(val) => EnumCellValue::Number(*val),
            EnumInlineScalar::Boolean(val) => EnumCellValue::Boolean(*val),
        }
    }

    /// TOML value used by the normalized write-back.
    pub fn to_toml_value(&self) -> toml::Value {
        match self {
            EnumInlineScalar::String(val) => toml::Value::String(val.clone()),
            EnumInlineScalar::Integer(val) => toml::Value::Integer(*val),
            EnumInlineScalar::Float(val) => toml::Value::Float(*val),
            EnumInlineScalar::Boolean(val) => toml::Value::Boolean(*val),
        }
    }
}

impl fmt::Display for EnumInlineScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumInlineScalar::String(val) => write!(f, "{val}"),
            EnumInlineScalar::Integer(val) => write!(f, "{val}"),
            EnumInlineScalar::Float(val) => write!(f, "{val}"),
            EnumInlineScalar::Boolean(val) => write!(f, "{val}"),
        }
    }
}

/// Inline column literal: one value or one value per row.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumInlineValue {
    /// Single-row column.
    Scalar(EnumInlineScalar),
    /// Multi-row column.
    Sequence(Vec<EnumInlineScalar>),
}

impl EnumInlineValue {
    /// Column cells in row order.
    pub fn to_cell_values(&self) -> Vec<EnumCellValue> {
        match self {
            EnumInlineValue::Scalar(val) => vec![val.to_cell_value()],
            EnumInlineValue::Sequence(l_vals) => {
                l_vals.iter().map(EnumInlineScalar::to_cell_value).collect()
            }
        }
    }

    /// TOML value used by the normalized write-back.
    pub fn to_toml_value(&self) -> toml::Value {
        match self {
            EnumInlineValue::Scalar(val) => val.to_toml_value(),
            EnumInlineValue::Sequence(l_vals) => toml::Value::Array(
                l_vals.iter().map(EnumInlineScalar::to_toml_value).collect(),
            ),
        }
    }
}

/// Table payload, exactly one kind per descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumTablePayload {
    /// Path of a delimited file, relative to the data root.
    External(String),
    /// Column name → literal column, in config order.
    Inline(IndexMap<String, EnumInlineValue>),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Descriptor

/// Fully normalized description of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecTableDescriptor {
    /// Owning document (output workbook name).
    pub document_name: String,
    /// Entry key; unique within the document.
    pub table_name: String,
    /// Target sheet; never empty.
    pub sheet_name: String,
    /// Tag name; never empty.
    pub tag_name: String,
    /// Payload.
    pub payload: EnumTablePayload,
    /// Auxiliary `key: value` rows, in order.
    pub aux_headers: IndexMap<String, String>,
    /// Free text, possibly empty.
    pub description: String,
    /// Config file the descriptor was read from (relative to the config root).
    pub source_name: String,
}

/// Non-fatal defaulting notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDefaultingWarning {
    /// Source config file.
    pub source_name: String,
    /// Document name.
    pub document_name: String,
    /// Entry key.
    pub table_name: String,
    /// What was defaulted.
    pub message: String,
}

impl fmt::Display for SpecDefaultingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}.{}]: {}",
            self.source_name, self.document_name, self.table_name, self.message
        )
    }
}

/// All descriptors of one config document.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecNormalizedDocument {
    /// Document name.
    pub document_name: String,
    /// Config file (relative to the config root).
    pub source_name: String,
    /// Descriptors in entry order.
    pub descriptors: Vec<SpecTableDescriptor>,
    /// Defaulting notices raised while normalizing.
    pub warnings: Vec<SpecDefaultingWarning>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region BuildOptions

/// `(DocumentName, TableName)` of a header-as-value table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecScalarTableRef {
    /// Document name.
    pub document_name: String,
    /// Table name.
    pub table_name: String,
}

/// Run options; loadable from a TOML settings file, overridden by CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecBuildOptions {
    /// Config root searched for documents.
    pub path_dir_config: PathBuf,
    /// Root that `DataLocation` paths are relative to.
    pub path_dir_data: PathBuf,
    /// Workbook output directory.
    pub path_dir_output: PathBuf,
    /// Optional catalog export written during a build.
    pub path_file_catalog_out: Option<PathBuf>,
    /// Config discovery glob.
    pub config_glob: String,
    /// Field delimiter of external data files (ASCII).
    pub delimiter: char,
    /// Prefix of tag markers.
    pub tag_prefix: String,
    /// Prefix of auxiliary header rows.
    pub aux_header_prefix: String,
    /// Blank rows between tables.
    pub n_rows_gap: usize,
    /// Overlay onto the tag marker preset (bold).
    pub fmt_tag: SpecCellFormat,
    /// Overlay onto the column header preset.
    pub fmt_header: SpecCellFormat,
    /// Overlay onto the body cell preset.
    pub fmt_text: SpecCellFormat,
    /// Column autofit policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
    /// Header-as-value tables.
    pub scalar_tables: Vec<SpecScalarTableRef>,
    /// Parallel document writers (`None`: derived from CPU count).
    pub num_workers_max: Option<usize>,
}

impl Default for SpecBuildOptions {
    fn default() -> Self {
        let write_options = SpecTaggedWriteOptions::default();
        Self {
            path_dir_config: PathBuf::from("config"),
            path_dir_data: PathBuf::from("data"),
            path_dir_output: PathBuf::from("output"),
            path_file_catalog_out: None,
            config_glob: C_CONFIG_GLOB_DEFAULT.to_string(),
            delimiter: C_DELIMITER_DEFAULT,
            tag_prefix: write_options.tag_prefix,
            aux_header_prefix: write_options.aux_header_prefix,
            n_rows_gap: write_options.n_rows_gap,
            fmt_tag: SpecCellFormat::default(),
            fmt_header: SpecCellFormat::default(),
            fmt_text: SpecCellFormat::default(),
            policy_autofit: write_options.policy_autofit,
            scalar_tables: derive_default_scalar_tables(),
            num_workers_max: None,
        }
    }
}

impl SpecBuildOptions {
    /// Load options from a TOML settings file; missing keys keep defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, TagbookError> {
        let c_text = fs::read_to_string(path).map_err(|source| TagbookError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&c_text)
            .map_err(|err| TagbookError::Settings(format!("{}: {err}", path.display())))
    }

    /// Parse options from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, TagbookError> {
        toml::from_str(text).map_err(|err| TagbookError::Settings(err.to_string()))
    }

    /// Delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8, TagbookError> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                TagbookError::Settings(format!(
                    "delimiter must be one ASCII character, got {:?}",
                    self.delimiter
                ))
            })
    }

    /// Layout options handed to each document writer; formats overlay the presets.
    pub fn to_write_options(&self) -> SpecTaggedWriteOptions {
        let write_options_default = SpecTaggedWriteOptions::default();
        SpecTaggedWriteOptions {
            n_rows_gap: self.n_rows_gap,
            tag_prefix: self.tag_prefix.clone(),
            aux_header_prefix: self.aux_header_prefix.clone(),
            fmt_tag: write_options_default.fmt_tag.merge(&self.fmt_tag),
            fmt_header: write_options_default.fmt_header.merge(&self.fmt_header),
            fmt_text: write_options_default.fmt_text.merge(&self.fmt_text),
            policy_autofit: self.policy_autofit.clone(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Fatal pipeline errors.
#[derive(Debug, Error)]
pub enum TagbookError {
    /// Config document cannot be parsed or normalized.
    #[error("Config error in {source_name}: {message}")]
    ConfigParse {
        /// Config file.
        source_name: String,
        /// Document/entry context and cause.
        message: String,
    },
    /// Same `(DocumentName, TableName)` declared twice.
    #[error(
        "Duplicate table {document_name}.{table_name} (in {source_first} and {source_second})"
    )]
    CatalogCollision {
        /// Document name.
        document_name: String,
        /// Table name.
        table_name: String,
        /// Config file of the first declaration.
        source_first: String,
        /// Config file of the second declaration.
        source_second: String,
    },
    /// Table payload cannot be turned into a data block.
    #[error("Cannot resolve {document_name}.{table_name}: {message}")]
    Resolution {
        /// Document name.
        document_name: String,
        /// Table name.
        table_name: String,
        /// Cause.
        message: String,
    },
    /// Workbook layout/write failure.
    #[error("Cannot write document {document_name}: {source}")]
    Layout {
        /// Document name.
        document_name: String,
        /// Writer error.
        source: XlsxLayoutError,
    },
    /// Filesystem failure.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Invalid run options.
    #[error("Invalid settings: {0}")]
    Settings(String),
}

impl TagbookError {
    /// Resolution error scoped to one descriptor.
    pub fn resolution(descriptor: &SpecTableDescriptor, message: impl Into<String>) -> Self {
        TagbookError::Resolution {
            document_name: descriptor.document_name.clone(),
            table_name: descriptor.table_name.clone(),
            message: message.into(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tagbook_io_xlsx::EnumAutofitColumnsRule;

    use super::*;

    #[test]
    fn test_settings_missing_keys_keep_defaults() {
        let options = SpecBuildOptions::from_toml_str(
            r#"
            path_dir_data = "raw"
            delimiter = ";"
            num_workers_max = 2
            scalar_tables = [{ document_name = "SysSettings", table_name = "StartYear" }]
            "#,
        )
        .expect("parse settings");

        assert_eq!(options.path_dir_data, PathBuf::from("raw"));
        assert_eq!(options.delimiter_byte().expect("delimiter"), b';');
        assert_eq!(options.num_workers_max, Some(2));
        assert_eq!(options.scalar_tables.len(), 1);
        assert_eq!(options.n_rows_gap, 3);
        assert_eq!(options.tag_prefix, "~");
        assert_eq!(options.config_glob, "**/*.toml");
    }

    #[test]
    fn test_settings_formats_overlay_presets() {
        let options = SpecBuildOptions::from_toml_str(
            r##"
            [fmt_tag]
            font_color = "#C00000"

            [fmt_text]
            num_format = "0.00"
            border = 1

            [policy_autofit]
            rule_columns = "all"
            width_cell_max = 40
            "##,
        )
        .expect("parse settings");

        let write_options = options.to_write_options();
        assert_eq!(write_options.fmt_tag.bold, Some(true));
        assert_eq!(write_options.fmt_tag.font_color.as_deref(), Some("#C00000"));
        assert_eq!(write_options.fmt_text.num_format.as_deref(), Some("0.00"));
        assert_eq!(write_options.fmt_text.border, Some(1));
        assert_eq!(write_options.fmt_header, SpecCellFormat::default());
        assert_eq!(
            write_options.policy_autofit.rule_columns,
            EnumAutofitColumnsRule::All
        );
        assert_eq!(write_options.policy_autofit.width_cell_max, 40);
        assert_eq!(write_options.policy_autofit.width_cell_min, 8);

        assert!(matches!(
            SpecBuildOptions::from_toml_str("[fmt_tag]\nbolder = true\n"),
            Err(TagbookError::Settings(_))
        ));
    }

    #[test]
    fn test_settings_reject_unknown_keys_and_wide_delimiter() {
        assert!(matches!(
            SpecBuildOptions::from_toml_str("no_such_key = 1"),
            Err(TagbookError::Settings(_))
        ));

        let options = SpecBuildOptions {
            delimiter: '§',
            ..SpecBuildOptions::default()
        };
        assert!(matches!(options.delimiter_byte(), Err(TagbookError::Settings(_))));
    }

    #[test]
    fn test_inline_scalar_cells_keep_their_kind() {
        assert_eq!(
            EnumInlineScalar::Integer(2023).to_cell_value(),
            EnumCellValue::Number(2023.0)
        );
        assert_eq!(
            EnumInlineScalar::Boolean(false).to_cell_value(),
            EnumCellValue::Boolean(false)
        );
        assert_eq!(EnumInlineScalar::Float(1.5).to_string(), "1.5");
        assert_eq!(
            EnumInlineValue::Sequence(vec![
                EnumInlineScalar::String("a".to_string()),
                EnumInlineScalar::Integer(1),
            ])
            .to_cell_values(),
            vec![EnumCellValue::String("a".to_string()), EnumCellValue::Number(1.0)]
        );
    }
}
