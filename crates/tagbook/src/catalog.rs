//! Ordered metadata catalog over all normalized documents.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use indexmap::IndexSet;
use polars::prelude::{Column, CsvWriter, DataFrame, SerWriter};

use crate::conf::TUP_CATALOG_COLUMNS;
use crate::spec::{EnumTablePayload, SpecNormalizedDocument, SpecTableDescriptor, TagbookError};

/// Flat, ordered list of every table descriptor in the run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecCatalog {
    entries: Vec<SpecTableDescriptor>,
}

impl SpecCatalog {
    /// All entries in catalog order.
    pub fn entries(&self) -> &[SpecTableDescriptor] {
        &self.entries
    }

    /// Number of tables across all documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No config entries were discovered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct document names, first-seen order.
    pub fn document_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|e| e.document_name.as_str())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Entries of one document, catalog order.
    pub fn entries_for_document(&self, document_name: &str) -> Vec<&SpecTableDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.document_name == document_name)
            .collect()
    }
}

/// Flatten documents (discovery order, then entry order) into one catalog.
///
/// A repeated `(DocumentName, TableName)` fails the build; nothing is deduplicated.
pub fn build_catalog(documents: &[SpecNormalizedDocument]) -> Result<SpecCatalog, TagbookError> {
    let mut dict_seen: HashMap<(&str, &str), &str> = HashMap::new();
    for descriptor in documents.iter().flat_map(|d| d.descriptors.iter()) {
        let key = (
            descriptor.document_name.as_str(),
            descriptor.table_name.as_str(),
        );
        if let Some(source_first) = dict_seen.insert(key, descriptor.source_name.as_str()) {
            return Err(TagbookError::CatalogCollision {
                document_name: descriptor.document_name.clone(),
                table_name: descriptor.table_name.clone(),
                source_first: source_first.to_string(),
                source_second: descriptor.source_name.clone(),
            });
        }
    }

    Ok(SpecCatalog {
        entries: documents
            .iter()
            .flat_map(|d| d.descriptors.iter().cloned())
            .collect(),
    })
}

/// Render the catalog as CSV text with the seven export columns.
///
/// `DataLocation` holds the external path or, for inline tables, the config
/// file name; `AuxHeaders` is a JSON object in mapping order.
pub fn render_catalog_csv(catalog: &SpecCatalog) -> Result<String, TagbookError> {
    let n_rows = catalog.len();
    let mut l_cols: [Vec<String>; 7] = std::array::from_fn(|_| Vec::with_capacity(n_rows));

    for descriptor in catalog.entries() {
        let c_location = match &descriptor.payload {
            EnumTablePayload::External(c_location) => c_location.clone(),
            EnumTablePayload::Inline(_) => descriptor.source_name.clone(),
        };
        let c_aux = serde_json::to_string(&descriptor.aux_headers)
            .map_err(|err| TagbookError::Settings(format!("AuxHeaders export failed: {err}")))?;

        l_cols[0].push(descriptor.document_name.clone());
        l_cols[1].push(descriptor.table_name.clone());
        l_cols[2].push(descriptor.sheet_name.clone());
        l_cols[3].push(descriptor.tag_name.clone());
        l_cols[4].push(c_location);
        l_cols[5].push(c_aux);
        l_cols[6].push(descriptor.description.clone());
    }

    let l_columns: Vec<Column> = TUP_CATALOG_COLUMNS
        .iter()
        .zip(l_cols)
        .map(|(c_name, l_values)| Column::new((*c_name).into(), l_values))
        .collect();
    let mut df = DataFrame::new(l_columns)
        .map_err(|err| TagbookError::Settings(format!("catalog frame: {err}")))?;

    let mut buf: Vec<u8> = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut df)
        .map_err(|err| TagbookError::Settings(format!("catalog CSV export failed: {err}")))?;

    String::from_utf8(buf)
        .map_err(|err| TagbookError::Settings(format!("catalog CSV is not UTF-8: {err}")))
}

/// Write the catalog export to `path_file_out`, creating parent directories.
pub fn export_catalog_csv(catalog: &SpecCatalog, path_file_out: &Path) -> Result<(), TagbookError> {
    let c_csv = render_catalog_csv(catalog)?;
    if let Some(path_dir) = path_file_out.parent()
        && !path_dir.as_os_str().is_empty()
    {
        fs::create_dir_all(path_dir).map_err(|source| TagbookError::Io {
            path: path_dir.to_path_buf(),
            source,
        })?;
    }
    fs::write(path_file_out, c_csv).map_err(|source| TagbookError::Io {
        path: path_file_out.to_path_buf(),
        source,
    })
}
