//! Config document normalization, write-back and discovery.

use std::fs;
use std::path::{Path, PathBuf};

use globset::Glob;
use indexmap::IndexMap;
use log::debug;
use walkdir::WalkDir;

use crate::conf::{
    C_KEY_AUX_HEADERS, C_KEY_DATA_LOCATION, C_KEY_DESCRIPTION, C_KEY_DOCUMENT_NAME,
    C_KEY_INLINE_DATA, C_KEY_SHEET_NAME, C_KEY_TAG_NAME, TUP_RESERVED_ENTRY_KEYS,
};
use crate::spec::{
    EnumInlineScalar, EnumInlineValue, EnumTablePayload, SpecDefaultingWarning,
    SpecNormalizedDocument, SpecTableDescriptor, TagbookError,
};

////////////////////////////////////////////////////////////////////////////////
// #region Normalize

/// Parse TOML text and normalize it.
pub fn parse_config_document(
    text: &str,
    source_name: &str,
) -> Result<SpecNormalizedDocument, TagbookError> {
    let dict_doc: toml::Table =
        toml::from_str(text).map_err(|err| derive_config_error(source_name, err.to_string()))?;
    normalize_config_document(&dict_doc, source_name)
}

/// Normalize one parsed config document into descriptors.
///
/// Every top-level entry except `DocumentName` is one table. Missing fields
/// inherit defaults (`TagName` from the entry key, `SheetName` from the
/// document name); a missing `Description` defaults to empty with a warning.
/// An entry-level `DocumentName` routes that table to another workbook.
/// Without `DataLocation`/`InlineData`, the non-reserved keys of the entry
/// become the inline payload.
pub fn normalize_config_document(
    dict_doc: &toml::Table,
    source_name: &str,
) -> Result<SpecNormalizedDocument, TagbookError> {
    let document_name = match dict_doc.get(C_KEY_DOCUMENT_NAME) {
        Some(toml::Value::String(val)) if !val.trim().is_empty() => val.clone(),
        Some(_) => {
            return Err(derive_config_error(
                source_name,
                format!("{C_KEY_DOCUMENT_NAME} must be a non-empty string"),
            ));
        }
        None => {
            return Err(derive_config_error(
                source_name,
                format!("missing top-level {C_KEY_DOCUMENT_NAME}"),
            ));
        }
    };

    let mut l_descriptors = Vec::new();
    let mut l_warnings = Vec::new();
    for (c_key, value) in dict_doc {
        if c_key == C_KEY_DOCUMENT_NAME {
            continue;
        }
        let toml::Value::Table(dict_entry) = value else {
            return Err(derive_config_error(
                source_name,
                format!("{document_name}.{c_key}: entry must be a table"),
            ));
        };

        let descriptor = normalize_entry(&document_name, c_key, dict_entry, source_name)
            .map_err(|message| {
                derive_config_error(source_name, format!("{document_name}.{c_key}: {message}"))
            })?;
        if !dict_entry.contains_key(C_KEY_DESCRIPTION) {
            l_warnings.push(SpecDefaultingWarning {
                source_name: source_name.to_string(),
                document_name: descriptor.document_name.clone(),
                table_name: c_key.clone(),
                message: format!("{C_KEY_DESCRIPTION} missing; defaulted to empty"),
            });
        }
        l_descriptors.push(descriptor);
    }

    Ok(SpecNormalizedDocument {
        document_name,
        source_name: source_name.to_string(),
        descriptors: l_descriptors,
        warnings: l_warnings,
    })
}

fn normalize_entry(
    document_name: &str,
    table_name: &str,
    dict_entry: &toml::Table,
    source_name: &str,
) -> Result<SpecTableDescriptor, String> {
    let document_name_entry = read_optional_text(dict_entry, C_KEY_DOCUMENT_NAME)?
        .unwrap_or_else(|| document_name.to_string());
    let sheet_name = read_optional_text(dict_entry, C_KEY_SHEET_NAME)?
        .unwrap_or_else(|| document_name.to_string());
    let tag_name =
        read_optional_text(dict_entry, C_KEY_TAG_NAME)?.unwrap_or_else(|| table_name.to_string());
    let description = match dict_entry.get(C_KEY_DESCRIPTION) {
        None => String::new(),
        Some(toml::Value::String(val)) => val.clone(),
        Some(_) => return Err(format!("{C_KEY_DESCRIPTION} must be a string")),
    };

    let aux_headers = match dict_entry.get(C_KEY_AUX_HEADERS) {
        None => IndexMap::new(),
        Some(toml::Value::Table(dict_aux)) => {
            let mut aux_headers = IndexMap::with_capacity(dict_aux.len());
            for (c_key, value) in dict_aux {
                aux_headers.insert(c_key.clone(), derive_aux_header_value(c_key, value)?);
            }
            aux_headers
        }
        Some(_) => return Err(format!("{C_KEY_AUX_HEADERS} must be a table")),
    };

    let payload = match (
        dict_entry.get(C_KEY_DATA_LOCATION),
        dict_entry.get(C_KEY_INLINE_DATA),
    ) {
        (Some(_), Some(_)) => {
            return Err(format!(
                "{C_KEY_DATA_LOCATION} and {C_KEY_INLINE_DATA} are mutually exclusive"
            ));
        }
        (Some(toml::Value::String(val)), None) => EnumTablePayload::External(val.clone()),
        (Some(_), None) => return Err(format!("{C_KEY_DATA_LOCATION} must be a string")),
        (None, Some(toml::Value::Table(dict_inline))) => {
            EnumTablePayload::Inline(parse_inline_mapping(dict_inline.iter())?)
        }
        (None, Some(_)) => return Err(format!("{C_KEY_INLINE_DATA} must be a table")),
        (None, None) => EnumTablePayload::Inline(parse_inline_mapping(
            dict_entry
                .iter()
                .filter(|(c_key, _)| !TUP_RESERVED_ENTRY_KEYS.contains(&c_key.as_str())),
        )?),
    };

    Ok(SpecTableDescriptor {
        document_name: document_name_entry,
        table_name: table_name.to_string(),
        sheet_name,
        tag_name,
        payload,
        aux_headers,
        description,
        source_name: source_name.to_string(),
    })
}

/// Absent, empty and blank strings all read as `None`.
fn read_optional_text(dict_entry: &toml::Table, key: &str) -> Result<Option<String>, String> {
    match dict_entry.get(key) {
        None => Ok(None),
        Some(toml::Value::String(val)) if val.trim().is_empty() => Ok(None),
        Some(toml::Value::String(val)) => Ok(Some(val.clone())),
        Some(_) => Err(format!("{key} must be a string")),
    }
}

fn derive_aux_header_value(key: &str, value: &toml::Value) -> Result<String, String> {
    match value {
        toml::Value::String(val) => Ok(val.clone()),
        toml::Value::Integer(_)
        | toml::Value::Float(_)
        | toml::Value::Boolean(_)
        | toml::Value::Datetime(_) => Ok(value.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            Err(format!("{C_KEY_AUX_HEADERS}.{key} must be a scalar"))
        }
    }
}

fn parse_inline_mapping<'a, I>(it_items: I) -> Result<IndexMap<String, EnumInlineValue>, String>
where
    I: Iterator<Item = (&'a String, &'a toml::Value)>,
{
    let mut dict_inline = IndexMap::new();
    for (c_key, value) in it_items {
        let inline_value = match value {
            toml::Value::Array(l_values) => EnumInlineValue::Sequence(
                l_values
                    .iter()
                    .map(|val| parse_inline_scalar(c_key, val))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            _ => EnumInlineValue::Scalar(parse_inline_scalar(c_key, value)?),
        };
        dict_inline.insert(c_key.clone(), inline_value);
    }
    Ok(dict_inline)
}

fn parse_inline_scalar(key: &str, value: &toml::Value) -> Result<EnumInlineScalar, String> {
    match value {
        toml::Value::String(val) => Ok(EnumInlineScalar::String(val.clone())),
        toml::Value::Integer(val) => Ok(EnumInlineScalar::Integer(*val)),
        toml::Value::Float(val) => Ok(EnumInlineScalar::Float(*val)),
        toml::Value::Boolean(val) => Ok(EnumInlineScalar::Boolean(*val)),
        toml::Value::Datetime(val) => Ok(EnumInlineScalar::String(val.to_string())),
        toml::Value::Array(_) | toml::Value::Table(_) => Err(format!(
            "inline column {key:?} holds a nested value; only scalars or flat arrays are allowed"
        )),
    }
}

fn derive_config_error(source_name: &str, message: String) -> TagbookError {
    TagbookError::ConfigParse {
        source_name: source_name.to_string(),
        message,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteBack

/// Render normalized descriptors back to a TOML document with every field explicit.
pub fn render_normalized_document(
    document: &SpecNormalizedDocument,
) -> Result<String, TagbookError> {
    let mut dict_doc = toml::Table::new();
    dict_doc.insert(
        C_KEY_DOCUMENT_NAME.to_string(),
        toml::Value::String(document.document_name.clone()),
    );

    for descriptor in &document.descriptors {
        let mut dict_entry = toml::Table::new();
        dict_entry.insert(
            C_KEY_DOCUMENT_NAME.to_string(),
            toml::Value::String(descriptor.document_name.clone()),
        );
        dict_entry.insert(
            C_KEY_SHEET_NAME.to_string(),
            toml::Value::String(descriptor.sheet_name.clone()),
        );
        dict_entry.insert(
            C_KEY_TAG_NAME.to_string(),
            toml::Value::String(descriptor.tag_name.clone()),
        );
        dict_entry.insert(
            C_KEY_DESCRIPTION.to_string(),
            toml::Value::String(descriptor.description.clone()),
        );
        match &descriptor.payload {
            EnumTablePayload::External(c_location) => {
                dict_entry.insert(
                    C_KEY_DATA_LOCATION.to_string(),
                    toml::Value::String(c_location.clone()),
                );
            }
            EnumTablePayload::Inline(dict_inline) => {
                let dict_inline_toml: toml::Table = dict_inline
                    .iter()
                    .map(|(c_key, value)| (c_key.clone(), value.to_toml_value()))
                    .collect();
                dict_entry.insert(
                    C_KEY_INLINE_DATA.to_string(),
                    toml::Value::Table(dict_inline_toml),
                );
            }
        }
        let dict_aux_toml: toml::Table = descriptor
            .aux_headers
            .iter()
            .map(|(c_key, c_value)| (c_key.clone(), toml::Value::String(c_value.clone())))
            .collect();
        dict_entry.insert(
            C_KEY_AUX_HEADERS.to_string(),
            toml::Value::Table(dict_aux_toml),
        );

        dict_doc.insert(descriptor.table_name.clone(), toml::Value::Table(dict_entry));
    }

    toml::to_string(&dict_doc)
        .map_err(|err| derive_config_error(&document.source_name, err.to_string()))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Discovery

/// Config files under `path_dir_config` matching `pattern`, as sorted relative paths.
pub fn discover_config_files(
    path_dir_config: &Path,
    pattern: &str,
) -> Result<Vec<PathBuf>, TagbookError> {
    if !path_dir_config.is_dir() {
        return Err(TagbookError::Settings(format!(
            "config directory not found: {}",
            path_dir_config.display()
        )));
    }
    let matcher = Glob::new(pattern)
        .map_err(|err| TagbookError::Settings(format!("invalid config glob {pattern:?}: {err}")))?
        .compile_matcher();

    let mut l_paths = Vec::new();
    for entry in WalkDir::new(path_dir_config).follow_links(false) {
        let entry = entry.map_err(|err| TagbookError::Io {
            path: err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| path_dir_config.to_path_buf()),
            source: err.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path_rel = entry
            .path()
            .strip_prefix(path_dir_config)
            .unwrap_or(entry.path());
        if matcher.is_match(path_rel) {
            l_paths.push(path_rel.to_path_buf());
        }
    }
    l_paths.sort();

    Ok(l_paths)
}

/// Discover, read and normalize every config document, in discovery order.
pub fn load_config_documents(
    path_dir_config: &Path,
    pattern: &str,
) -> Result<Vec<SpecNormalizedDocument>, TagbookError> {
    let l_paths = discover_config_files(path_dir_config, pattern)?;
    debug!(
        "Discovered {} config documents under {}",
        l_paths.len(),
        path_dir_config.display()
    );

    let mut l_documents = Vec::with_capacity(l_paths.len());
    for path_rel in l_paths {
        let path_file = path_dir_config.join(&path_rel);
        let c_text = fs::read_to_string(&path_file).map_err(|source| TagbookError::Io {
            path: path_file.clone(),
            source,
        })?;
        let source_name = path_rel.to_string_lossy().replace('\\', "/");
        l_documents.push(parse_config_document(&c_text, &source_name)?);
    }

    Ok(l_documents)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
