//! `tagbook_io_xlsx` v1:
//! Rust-side tagged-workbook layout kernel.
//!
//! Tables are stacked on their sheets below a tag marker row (and optional
//! auxiliary header rows), each sheet tracking its own row cursor.
//!
//! - `conf`   : Excel limits, layout constants and default presets
//! - `spec`   : cell values, data blocks, cursors, options, reports, errors
//! - `util`   : pure helper functions (placement planning, naming, widths)
//! - `writer` : per-document writer kernel
pub mod conf;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_AUX_HEADER_PREFIX_DEFAULT, C_TAG_PREFIX_DEFAULT, N_COL_AUX_HEADER,
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, N_ROWS_TABLE_GAP,
    TUP_EXCEL_ILLEGAL,
};
pub use spec::{
    EnumAutofitColumnsRule, EnumCellValue, EnumDocumentState, SpecAutofitCellsPolicy,
    SpecCellFormat, SpecDataBlock, SpecSheetCursor, SpecTablePlacement, SpecTableRecord,
    SpecTaggedWriteOptions, SpecXlsxReport, XlsxLayoutError,
};
pub use util::{
    derive_aux_header_text, derive_data_block_from_dataframe, derive_tag_marker,
    derive_unique_sheet_name, plan_table_placement, sanitize_sheet_name,
};
pub use writer::{SpecTableWrite, XlsxTaggedWriter};
