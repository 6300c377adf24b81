//! Shared tagged-workbook models: cells, blocks, cursors, options, reports, errors.

use std::fmt;
use std::path::PathBuf;

use rust_xlsxwriter::XlsxError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conf::{C_AUX_HEADER_PREFIX_DEFAULT, C_TAG_PREFIX_DEFAULT, N_ROWS_TABLE_GAP};
use crate::util::plan_table_placement;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format overlay (`None` means "inherit").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            border: other.border.or(self.border),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValue

/// Normalized cell value written into a table body.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value (also used for padding).
    None,
    /// Text value, written verbatim.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
}

impl EnumCellValue {
    /// Whether the cell is blank.
    pub fn is_none(&self) -> bool {
        matches!(self, EnumCellValue::None)
    }
}

impl fmt::Display for EnumCellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumCellValue::None => Ok(()),
            EnumCellValue::String(val) => write!(f, "{val}"),
            EnumCellValue::Number(val) => write!(f, "{val}"),
            EnumCellValue::Boolean(val) => write!(f, "{val}"),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DataBlock

/// Rectangular payload for one table: ordered column names plus rows.
///
/// Every row holds exactly `width()` cells; constructors pad or reject,
/// the writer never has to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecDataBlock {
    columns: Vec<String>,
    rows: Vec<Vec<EnumCellValue>>,
}

impl SpecDataBlock {
    /// Build from row-major data; rejects ragged rows.
    pub fn new(
        columns: Vec<String>,
        rows: Vec<Vec<EnumCellValue>>,
    ) -> Result<Self, XlsxLayoutError> {
        let n_width = columns.len();
        if let Some((row_idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_width) {
            return Err(XlsxLayoutError::RaggedRow {
                row_idx,
                len: row.len(),
                width: n_width,
            });
        }
        Ok(Self { columns, rows })
    }

    /// Build from column-major data, right-padding shorter columns with blanks.
    pub fn from_columns(l_cols: Vec<(String, Vec<EnumCellValue>)>) -> Self {
        let n_height = l_cols.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        let mut columns = Vec::with_capacity(l_cols.len());
        let mut rows = vec![Vec::with_capacity(l_cols.len()); n_height];

        for (c_name, l_values) in l_cols {
            columns.push(c_name);
            let mut it_values = l_values.into_iter();
            for row in rows.iter_mut() {
                row.push(it_values.next().unwrap_or(EnumCellValue::None));
            }
        }

        Self { columns, rows }
    }

    /// Block with a header row and no body.
    pub fn header_only(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: vec![],
        }
    }

    /// Ordered column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Ordered rows.
    pub fn rows(&self) -> &[Vec<EnumCellValue>] {
        &self.rows
    }

    /// Number of body rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Zero columns and zero rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Column values in row order.
    pub fn column_values(&self, col_idx: usize) -> Vec<&EnumCellValue> {
        self.rows.iter().map(|row| &row[col_idx]).collect()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetCursor

/// Row positions of one placed table (all 0-based, absolute on the sheet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecTablePlacement {
    /// Cursor value the table started from.
    pub row_base: usize,
    /// First auxiliary header row (equals `row_tag` when there are none).
    pub row_aux_start: usize,
    /// Number of auxiliary header rows.
    pub n_rows_aux: usize,
    /// Tag marker row.
    pub row_tag: usize,
    /// Column header row.
    pub row_header: usize,
    /// First body row.
    pub row_data_start: usize,
    /// Number of body rows.
    pub n_rows_data: usize,
    /// Cursor value after this table.
    pub row_next: usize,
}

impl SpecTablePlacement {
    /// Last row holding any content of this table.
    pub fn row_last(&self) -> usize {
        if self.n_rows_data == 0 {
            self.row_header
        } else {
            self.row_data_start + self.n_rows_data - 1
        }
    }
}

/// Next free row of one sheet; only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecSheetCursor {
    next_row: usize,
}

impl SpecSheetCursor {
    /// Fresh cursor at row 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next free row index.
    pub fn next_row(&self) -> usize {
        self.next_row
    }

    /// Plan the next table at the cursor and advance past it.
    pub fn place(
        &mut self,
        n_rows_aux: usize,
        n_rows_data: usize,
        n_rows_gap: usize,
    ) -> SpecTablePlacement {
        let placement =
            plan_table_placement(self.next_row, n_rows_aux, n_rows_data, n_rows_gap);
        debug_assert!(placement.row_next > self.next_row);
        self.next_row = placement.row_next;
        placement
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Autofit rule for column width inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumAutofitColumnsRule {
    /// Disable autofit.
    None,
    /// Infer width from column header cells only (default).
    #[default]
    Header,
    /// Infer width from header and body cells.
    All,
}

/// Autofit policy applied per sheet when the document is finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecAutofitCellsPolicy {
    /// Autofit width inference rule.
    pub rule_columns: EnumAutofitColumnsRule,
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            rule_columns: EnumAutofitColumnsRule::Header,
            width_cell_min: 8,
            width_cell_max: 60,
            width_cell_padding: 2,
        }
    }
}

/// Writer-wide layout and formatting options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTaggedWriteOptions {
    /// Blank rows between consecutive tables on one sheet.
    pub n_rows_gap: usize,
    /// Prefix for tag markers.
    pub tag_prefix: String,
    /// Prefix for auxiliary header rows.
    pub aux_header_prefix: String,
    /// Format of tag marker and auxiliary header cells.
    pub fmt_tag: SpecCellFormat,
    /// Format of column header cells.
    pub fmt_header: SpecCellFormat,
    /// Format of body cells.
    pub fmt_text: SpecCellFormat,
    /// Column autofit policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
}

impl Default for SpecTaggedWriteOptions {
    fn default() -> Self {
        let dict_fmt = crate::conf::derive_default_tagged_formats();
        Self {
            n_rows_gap: N_ROWS_TABLE_GAP,
            tag_prefix: C_TAG_PREFIX_DEFAULT.to_string(),
            aux_header_prefix: C_AUX_HEADER_PREFIX_DEFAULT.to_string(),
            fmt_tag: dict_fmt.get("tag").cloned().unwrap_or_default(),
            fmt_header: dict_fmt.get("header").cloned().unwrap_or_default(),
            fmt_text: dict_fmt.get("text").cloned().unwrap_or_default(),
            policy_autofit: SpecAutofitCellsPolicy::default(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DocumentState

/// Lifecycle of one document writer.
///
/// `Finalized` has no variant: [`crate::writer::XlsxTaggedWriter::finish`]
/// consumes the writer, so a sealed document cannot be written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumDocumentState {
    /// No sheets yet.
    #[default]
    Uninitialized,
    /// Sheet skeleton created, cursors at 0.
    SheetsCreated,
    /// At least one table written.
    Writing,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// One written table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTableRecord {
    /// Logical sheet name (as configured).
    pub sheet_name: String,
    /// Marker text written on the tag row.
    pub tag_marker: String,
    /// Row placement.
    pub placement: SpecTablePlacement,
}

/// Per-document write report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Output file.
    pub file_out: PathBuf,
    /// Actual sheet names in workbook order.
    pub sheets: Vec<String>,
    /// Tables in write order.
    pub tables: Vec<SpecTableRecord>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Layout/write failures. Any of these aborts the owning document.
#[derive(Debug, Error)]
pub enum XlsxLayoutError {
    /// Block row length differs from the column count.
    #[error("Block row {row_idx} has {len} cells; expected {width}.")]
    RaggedRow {
        /// Offending row index.
        row_idx: usize,
        /// Its length.
        len: usize,
        /// Declared column count.
        width: usize,
    },
    /// Sheet skeleton requested twice.
    #[error("Sheets already created for {0}.")]
    SheetsAlreadyCreated(PathBuf),
    /// Table written before the sheet skeleton exists.
    #[error("Sheets must be created before writing tables.")]
    SheetsNotCreated,
    /// Table targets a sheet that is not part of the skeleton.
    #[error("Sheet not part of this document: {0:?}")]
    SheetNotCreated(String),
    /// Table would pass the last worksheet row.
    #[error("Excel row limit exceeded on sheet {sheet_name:?}: table needs row {row}.")]
    RowLimitExceeded {
        /// Logical sheet name.
        sheet_name: String,
        /// First row index past the limit.
        row: usize,
    },
    /// Table is wider than a worksheet.
    #[error("Excel column limit exceeded on sheet {sheet_name:?}: {width} columns.")]
    ColumnLimitExceeded {
        /// Logical sheet name.
        sheet_name: String,
        /// Block width.
        width: usize,
    },
    /// Option value outside its valid range.
    #[error("Invalid write option: {0}")]
    InvalidOption(String),
    /// DataFrame cell access failed.
    #[error("Failed to read DataFrame cell: {0}")]
    DataFrame(String),
    /// Backend write error.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] XlsxError),
    /// Output directory could not be prepared.
    #[error("Failed to prepare {}: {source}", path.display())]
    Io {
        /// Path being prepared.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
