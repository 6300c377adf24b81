//! Descriptor payload → rectangular data block.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use polars::prelude::{CsvReadOptions, DataFrame, PolarsResult, SerReader};
use tagbook_io_xlsx::{SpecDataBlock, derive_data_block_from_dataframe};

use crate::conf::TUP_DATA_EXTENSIONS;
use crate::spec::{
    EnumInlineValue, EnumTablePayload, SpecBuildOptions, SpecTableDescriptor, TagbookError,
};

/// Resolves descriptors against one data root.
#[derive(Debug, Clone)]
pub struct DataResolver {
    path_dir_data: PathBuf,
    delimiter: u8,
}

impl DataResolver {
    /// Resolver reading external files under `path_dir_data`.
    pub fn new(path_dir_data: impl Into<PathBuf>, delimiter: u8) -> Self {
        Self {
            path_dir_data: path_dir_data.into(),
            delimiter,
        }
    }

    /// Resolver over the configured data root; fails on a non-ASCII delimiter.
    pub fn from_options(options: &SpecBuildOptions) -> Result<Self, TagbookError> {
        Ok(Self::new(
            options.path_dir_data.clone(),
            options.delimiter_byte()?,
        ))
    }

    /// Produce the data block of one descriptor.
    ///
    /// Every row of the result has exactly as many cells as there are columns.
    pub fn resolve(&self, descriptor: &SpecTableDescriptor) -> Result<SpecDataBlock, TagbookError> {
        match &descriptor.payload {
            EnumTablePayload::External(c_location) => {
                self.resolve_external(descriptor, c_location)
            }
            EnumTablePayload::Inline(dict_inline) => Ok(derive_block_from_inline(dict_inline)),
        }
    }

    fn resolve_external(
        &self,
        descriptor: &SpecTableDescriptor,
        c_location: &str,
    ) -> Result<SpecDataBlock, TagbookError> {
        let path_file = self.path_dir_data.join(c_location);
        let c_ext = path_file
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !TUP_DATA_EXTENSIONS.contains(&c_ext.as_str()) {
            return Err(TagbookError::resolution(
                descriptor,
                format!("unsupported data location {c_location:?}"),
            ));
        }
        if !path_file.is_file() {
            return Err(TagbookError::resolution(
                descriptor,
                format!("data file not found: {}", path_file.display()),
            ));
        }

        let delimiter = if c_ext == "tsv" { b'\t' } else { self.delimiter };
        let df = read_delimited_file(&path_file, delimiter).map_err(|err| {
            TagbookError::resolution(
                descriptor,
                format!("cannot read {}: {err}", path_file.display()),
            )
        })?;

        derive_data_block_from_dataframe(&df)
            .map_err(|err| TagbookError::resolution(descriptor, err.to_string()))
    }
}

/// Read a delimited file with a header row; every column is read as text.
pub fn read_delimited_file(path_file: &Path, delimiter: u8) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_separator(delimiter))
        .try_into_reader_with_file_path(Some(path_file.to_path_buf()))?
        .finish()
}

/// Turn an inline mapping into a block: key → column, shorter columns padded.
pub fn derive_block_from_inline(dict_inline: &IndexMap<String, EnumInlineValue>) -> SpecDataBlock {
    SpecDataBlock::from_columns(
        dict_inline
            .iter()
            .map(|(c_key, value)| (c_key.clone(), value.to_cell_values()))
            .collect(),
    )
}
