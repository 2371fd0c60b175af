use std::path::PathBuf;

use serde::Serialize;

use crate::model::Epoch;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum LauncherEvent {
    Reset(ResetPayload),
    CatalogChanged(CatalogChangedPayload),
    ImportFailed(ImportFailedPayload),
    RetryScheduled(RetryScheduledPayload),
}

impl LauncherEvent {
    pub fn epoch(&self) -> Epoch {
        match self {
            LauncherEvent::Reset(payload) => payload.epoch,
            LauncherEvent::CatalogChanged(payload) => payload.epoch,
            LauncherEvent::ImportFailed(payload) => payload.epoch,
            LauncherEvent::RetryScheduled(payload) => payload.epoch,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPayload {
    pub epoch: Epoch,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogChangedPayload {
    pub epoch: Epoch,
    pub source: PathBuf,
    pub rows_added: usize,
    pub row_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportFailedPayload {
    pub epoch: Epoch,
    pub path: PathBuf,
    pub mime_type: String,
    pub error: String,
    /// Whether the descriptor was queued for the next retry tick.
    pub will_retry: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetryScheduledPayload {
    pub epoch: Epoch,
    pub count: usize,
}
