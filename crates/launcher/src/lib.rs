pub mod error;
pub mod model;

pub mod bus;
pub mod catalog;
pub mod config;
pub mod event;
pub mod import;
pub mod session;
pub mod source;

pub use crate::catalog::{CatalogRow, GroupId, ItemCatalog};
pub use crate::config::{load_or_create_config, LauncherConfig};
pub use crate::error::{CoreError, CoreResult, SourceError};
pub use crate::import::{spawn_import_coordinator, CoordinatorHandle, CoordinatorOptions};
pub use crate::model::{Epoch, ImportDescriptor, Item, ItemGroup, Source, Style};
pub use crate::session::{ExpressionCache, LinkOpener, QuerySession};
pub use crate::source::SourceTypeRegistry;
