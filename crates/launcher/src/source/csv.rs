use std::path::Path;

use crate::error::SourceError;

use super::document::SourceDocument;
use super::registry::SourceType;

/// Declared CSV source type. Loading always reports it as unsupported.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvSourceType;

impl SourceType for CsvSourceType {
    fn mime_type(&self) -> &str {
        "csv"
    }

    fn parse(&self, path: &Path, _text: &str) -> Result<SourceDocument, SourceError> {
        Err(SourceError::UnsupportedType {
            path: path.to_path_buf(),
            mime_type: self.mime_type().to_string(),
        })
    }

    fn write(&self, _document: &SourceDocument) -> Result<String, SourceError> {
        Err(SourceError::Write(
            "csv sources cannot be written".to_string(),
        ))
    }
}
