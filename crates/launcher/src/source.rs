//! Source loading.
//!
//! This module turns source files into [`crate::model::Source`] values:
//! - `document` - the parsed document tree and its flattening into groups
//! - `registry` - pluggable source types keyed by MIME-type string
//! - `xml` - the XML source type (parse and write)
//! - `csv` - declared CSV source type (always unsupported)
//! - `loader` - async file I/O around a registered source type
//! - `path` - import path resolution

mod csv;
mod document;
mod loader;
mod path;
mod registry;
mod xml;

pub use csv::CsvSourceType;
pub use document::{GroupNode, SourceDocument, SourceNode};
pub use loader::{load_source, save_document};
pub use path::{normalize_path, resolve_import_path};
pub use registry::{SourceType, SourceTypeRegistry};
pub use xml::XmlSourceType;
