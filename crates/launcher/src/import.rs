//! Recursive, epoch-scoped import loading.
//!
//! The coordinator actor owns the epoch, the catalog and the retry queue.
//! It hands [`protocol::LoadCommand`]s to the executor, which runs each load
//! on the runtime under a shared permit pool and reports back with a
//! [`protocol::LoadEvent`]. Events tagged with an old epoch are dropped.

pub mod coordinator;
pub mod executor;
pub mod handle;
pub mod protocol;
pub mod retry;
pub mod types;

pub use handle::{spawn_import_coordinator, CoordinatorHandle};
pub use protocol::LoadRequest;
pub use retry::RetryQueue;
pub use types::{CoordinatorOptions, CoordinatorSnapshot, RetryPolicy};
