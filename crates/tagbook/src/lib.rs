//! `tagbook` v1:
//! Config-driven tagged-workbook serializer.
//!
//! TOML config documents are normalized into table descriptors, flattened
//! into one ordered catalog, resolved into data blocks and written as one
//! tagged workbook per document by [`tagbook_io_xlsx`].
//!
//! - `conf`      : reserved keys, defaults and file names
//! - `spec`      : descriptors, inline payloads, options, errors
//! - `normalize` : config parsing, default inheritance, write-back, discovery
//! - `catalog`   : ordered catalog, collision check, CSV export
//! - `resolve`   : descriptor payload to data block
//! - `transform` : header-as-value rewrite for scalar tables
//! - `report`    : run reports
//! - `util`      : worker limits, output paths
//! - `build`     : end-to-end orchestration
//! - `logging`   : console log sink for the CLI
pub mod build;
pub mod catalog;
pub mod conf;
pub mod logging;
pub mod normalize;
pub mod report;
pub mod resolve;
pub mod spec;
pub mod transform;
pub mod util;

pub use build::{load_catalog, run_build, run_catalog, run_normalize, write_document};
pub use catalog::{SpecCatalog, build_catalog, export_catalog_csv, render_catalog_csv};
pub use normalize::{
    discover_config_files, load_config_documents, normalize_config_document,
    parse_config_document, render_normalized_document,
};
pub use report::SpecBuildReport;
pub use resolve::{DataResolver, derive_block_from_inline};
pub use spec::{
    EnumInlineScalar, EnumInlineValue, EnumTablePayload, SpecBuildOptions,
    SpecDefaultingWarning, SpecNormalizedDocument, SpecScalarTableRef, SpecTableDescriptor,
    TagbookError,
};
pub use transform::{apply_scalar_transform, is_scalar_table};
