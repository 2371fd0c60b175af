use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::SourceError;

use super::csv::CsvSourceType;
use super::document::SourceDocument;
use super::xml::XmlSourceType;

/// A pluggable source format, identified by its MIME-type string.
pub trait SourceType: Send + Sync {
    fn mime_type(&self) -> &str;

    /// Parses the full text of `path` into a document tree.
    fn parse(&self, path: &Path, text: &str) -> Result<SourceDocument, SourceError>;

    /// Serializes a document tree back into this format.
    fn write(&self, document: &SourceDocument) -> Result<String, SourceError>;
}

/// Source types available to the loader. Built once at startup and shared.
#[derive(Default)]
pub struct SourceTypeRegistry {
    types: HashMap<String, Arc<dyn SourceType>>,
}

impl SourceTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in `xml` and `csv` source types.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(XmlSourceType));
        registry.register(Arc::new(CsvSourceType));
        registry
    }

    pub fn register(&mut self, source_type: Arc<dyn SourceType>) -> Option<Arc<dyn SourceType>> {
        self.types
            .insert(source_type.mime_type().to_ascii_lowercase(), source_type)
    }

    pub fn get(&self, mime_type: &str) -> Option<Arc<dyn SourceType>> {
        self.types.get(&mime_type.to_ascii_lowercase()).cloned()
    }

    pub fn mime_types(&self) -> Vec<String> {
        let mut mime_types = self.types.keys().cloned().collect::<Vec<_>>();
        mime_types.sort();
        mime_types
    }
}

impl std::fmt::Debug for SourceTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceTypeRegistry")
            .field("types", &self.mime_types())
            .finish()
    }
}
