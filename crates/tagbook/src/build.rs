//! End-to-end runs: config → catalog → resolved blocks → workbooks.

use std::fs;
use std::path::Path;

use log::{debug, info};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tagbook_io_xlsx::{SpecTableWrite, SpecXlsxReport, XlsxLayoutError, XlsxTaggedWriter};

use crate::catalog::{SpecCatalog, build_catalog, export_catalog_csv, render_catalog_csv};
use crate::conf::C_CATALOG_FILE_NAME;
use crate::normalize::{load_config_documents, render_normalized_document};
use crate::report::SpecBuildReport;
use crate::resolve::DataResolver;
use crate::spec::{SpecBuildOptions, SpecNormalizedDocument, TagbookError};
use crate::transform::{apply_scalar_transform, is_scalar_table};
use crate::util::{calculate_worker_limit, derive_workbook_path};

/// Load and normalize every config document, then build the catalog.
pub fn load_catalog(
    options: &SpecBuildOptions,
) -> Result<(Vec<SpecNormalizedDocument>, SpecCatalog), TagbookError> {
    let l_documents = load_config_documents(&options.path_dir_config, &options.config_glob)?;
    let catalog = build_catalog(&l_documents)?;
    info!(
        "Catalog: {} tables in {} documents",
        catalog.len(),
        catalog.document_names().len()
    );
    Ok((l_documents, catalog))
}

/// Write one document: sheet skeleton first, then every entry in catalog order.
pub fn write_document(
    catalog: &SpecCatalog,
    document_name: &str,
    resolver: &DataResolver,
    options: &SpecBuildOptions,
) -> Result<SpecXlsxReport, TagbookError> {
    let map_layout_error = |source: XlsxLayoutError| TagbookError::Layout {
        document_name: document_name.to_string(),
        source,
    };

    let l_entries = catalog.entries_for_document(document_name);
    let path_file_out = derive_workbook_path(&options.path_dir_output, document_name);
    info!(
        "Writing {document_name} ({} tables) -> {}",
        l_entries.len(),
        path_file_out.display()
    );

    let mut writer = XlsxTaggedWriter::new(path_file_out, options.to_write_options());
    writer
        .create_sheets(l_entries.iter().map(|e| e.sheet_name.as_str()))
        .map_err(map_layout_error)?;

    let mut l_warnings = Vec::new();
    for descriptor in l_entries {
        let mut block = resolver.resolve(descriptor)?;
        if is_scalar_table(descriptor, &options.scalar_tables) {
            let (block_scalar, warning) = apply_scalar_transform(&block, descriptor)?;
            block = block_scalar;
            l_warnings.extend(warning);
        }

        let aux_headers = descriptor
            .aux_headers
            .iter()
            .map(|(c_key, c_value)| (c_key.as_str(), c_value.as_str()))
            .collect();
        writer
            .write_table(SpecTableWrite {
                sheet_name: &descriptor.sheet_name,
                tag_name: &descriptor.tag_name,
                aux_headers,
                block: &block,
            })
            .map_err(map_layout_error)?;
    }

    let mut report = writer.finish().map_err(map_layout_error)?;
    for warning in l_warnings {
        report.warn(warning);
    }

    Ok(report)
}

/// Full rebuild of every document in the catalog.
///
/// Documents are written in parallel (each owns its writer); results are
/// collected in catalog document order and the first failure is returned.
pub fn run_build(options: &SpecBuildOptions) -> Result<SpecBuildReport, TagbookError> {
    let resolver = DataResolver::from_options(options)?;
    let (l_documents, catalog) = load_catalog(options)?;

    let mut report = SpecBuildReport::default();
    for document in &l_documents {
        for warning in &document.warnings {
            report.warn(warning.to_string());
        }
    }
    if let Some(path_file_catalog) = &options.path_file_catalog_out {
        export_catalog_csv(&catalog, path_file_catalog)?;
        report.files_out.push(path_file_catalog.clone());
    }

    let l_document_names = catalog.document_names();
    let n_workers_max = calculate_worker_limit(options.num_workers_max);
    let write_one =
        |document_name: &&str| write_document(&catalog, document_name, &resolver, options);

    let l_results: Vec<Result<SpecXlsxReport, TagbookError>> =
        if n_workers_max <= 1 || l_document_names.len() <= 1 {
            l_document_names.iter().map(write_one).collect()
        } else {
            match ThreadPoolBuilder::new().num_threads(n_workers_max).build() {
                Ok(thread_pool) => {
                    debug!("Writing {} documents on {n_workers_max} workers", l_document_names.len());
                    thread_pool.install(|| l_document_names.par_iter().map(write_one).collect())
                }
                Err(err) => {
                    report.warn(format!(
                        "Failed to initialize thread pool (workers={n_workers_max}): {err}; fallback to serial write."
                    ));
                    l_document_names.iter().map(write_one).collect()
                }
            }
        };

    for res_document in l_results {
        let report_document = res_document?;
        report.cnt_tables += report_document.tables.len() as u64;
        report.files_out.push(report_document.file_out.clone());
        for warning in &report_document.warnings {
            report.warn(format!("{}: {warning}", report_document.file_out.display()));
        }
        report.documents.push(report_document);
    }

    info!("{report}");
    Ok(report)
}

/// Write normalized config documents and the catalog export under `path_dir_out`.
///
/// Each document keeps its path relative to the config root.
pub fn run_normalize(
    options: &SpecBuildOptions,
    path_dir_out: &Path,
) -> Result<SpecBuildReport, TagbookError> {
    let (l_documents, catalog) = load_catalog(options)?;

    let mut report = SpecBuildReport {
        cnt_tables: catalog.len() as u64,
        ..SpecBuildReport::default()
    };
    for document in &l_documents {
        for warning in &document.warnings {
            report.warn(warning.to_string());
        }

        let c_text = render_normalized_document(document)?;
        let path_file_out = path_dir_out.join(&document.source_name);
        if let Some(path_dir) = path_file_out.parent() {
            fs::create_dir_all(path_dir).map_err(|source| TagbookError::Io {
                path: path_dir.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path_file_out, c_text).map_err(|source| TagbookError::Io {
            path: path_file_out.clone(),
            source,
        })?;
        debug!("Normalized {} -> {}", document.source_name, path_file_out.display());
        report.files_out.push(path_file_out);
    }

    let path_file_catalog = path_dir_out.join(C_CATALOG_FILE_NAME);
    export_catalog_csv(&catalog, &path_file_catalog)?;
    report.files_out.push(path_file_catalog);

    info!("{}", report.format("[NORMALIZE]"));
    Ok(report)
}

/// Render the catalog export; also write it when `path_file_out` is given.
pub fn run_catalog(
    options: &SpecBuildOptions,
    path_file_out: Option<&Path>,
) -> Result<String, TagbookError> {
    let (_, catalog) = load_catalog(options)?;
    if let Some(path_file_out) = path_file_out {
        export_catalog_csv(&catalog, path_file_out)?;
    }
    render_catalog_csv(&catalog)
}
