use std::path::Path;

use crate::error::SourceError;
use crate::model::{ImportDescriptor, Source};

use super::document::SourceDocument;
use super::registry::SourceTypeRegistry;

/// Reads and parses the source named by `descriptor`.
///
/// An unregistered MIME type fails before the file is touched.
pub async fn load_source(
    registry: &SourceTypeRegistry,
    descriptor: &ImportDescriptor,
) -> Result<Source, SourceError> {
    let path = descriptor.path.as_path();
    let source_type = registry
        .get(&descriptor.mime_type)
        .ok_or_else(|| SourceError::UnsupportedType {
            path: path.to_path_buf(),
            mime_type: descriptor.mime_type.clone(),
        })?;

    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|error| SourceError::Open {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;

    let document = source_type.parse(path, &text)?;
    tracing::debug!(
        path = %path.display(),
        links = document.link_count(),
        "parsed source"
    );
    Ok(document.into_source(path))
}

/// Writes `document` to `path` using the source type registered for `mime_type`.
pub async fn save_document(
    registry: &SourceTypeRegistry,
    path: &Path,
    mime_type: &str,
    document: &SourceDocument,
) -> Result<(), SourceError> {
    let source_type = registry
        .get(mime_type)
        .ok_or_else(|| SourceError::UnsupportedType {
            path: path.to_path_buf(),
            mime_type: mime_type.to_string(),
        })?;
    let text = source_type.write(document)?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|error| {
                SourceError::Write(format!(
                    "failed to create directory {}: {error}",
                    parent.display()
                ))
            })?;
    }
    tokio::fs::write(path, text).await.map_err(|error| {
        SourceError::Write(format!("failed to write {}: {error}", path.display()))
    })
}
