use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch, Semaphore};

use crate::bus::Bus;
use crate::catalog::ItemCatalog;
use crate::error::{CoreError, CoreResult};
use crate::event::LauncherEvent;
use crate::import::coordinator::ImportCoordinator;
use crate::import::executor::spawn_load_executor;
use crate::import::protocol::CoordinatorRequest;
use crate::import::types::{CoordinatorOptions, CoordinatorSnapshot};
use crate::model::{Epoch, ImportDescriptor};
use crate::source::SourceTypeRegistry;

/// Cloneable front end of a running import coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    request_tx: mpsc::UnboundedSender<CoordinatorRequest>,
    snapshot_rx: watch::Receiver<CoordinatorSnapshot>,
    bus: Bus,
}

impl CoordinatorHandle {
    pub fn is_closed(&self) -> bool {
        self.request_tx.is_closed()
    }

    /// Resets, then loads `descriptor` as the new root.
    ///
    /// Resolves once the root file itself has loaded or failed; its imports
    /// keep loading in the background.
    pub async fn load_root(&self, descriptor: ImportDescriptor) -> CoreResult<Epoch> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(CoordinatorRequest::LoadRoot {
            descriptor,
            reply: reply_tx,
        })?;
        reply_rx
            .await
            .map_err(|_| CoreError::Internal("import coordinator dropped response".to_string()))?
    }

    /// Loads one more source into the current epoch.
    pub async fn load(&self, descriptor: ImportDescriptor) -> CoreResult<Epoch> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(CoordinatorRequest::Load {
            descriptor,
            reply: reply_tx,
        })?;
        reply_rx
            .await
            .map_err(|_| CoreError::Internal("import coordinator dropped response".to_string()))
    }

    pub async fn reset(&self) -> CoreResult<Epoch> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(CoordinatorRequest::Reset { reply: reply_tx })?;
        reply_rx
            .await
            .map_err(|_| CoreError::Internal("import coordinator dropped response".to_string()))
    }

    /// Resubmits queued failures without waiting for the timer.
    pub async fn retry_now(&self) -> CoreResult<usize> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(CoordinatorRequest::RetryNow { reply: reply_tx })?;
        reply_rx
            .await
            .map_err(|_| CoreError::Internal("import coordinator dropped response".to_string()))
    }

    pub fn snapshot(&self) -> CoordinatorSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn catalog(&self) -> Arc<ItemCatalog> {
        self.snapshot_rx.borrow().catalog.clone()
    }

    pub fn watch(&self) -> watch::Receiver<CoordinatorSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LauncherEvent> {
        self.bus.subscribe()
    }

    /// Waits until no load of the current epoch is outstanding.
    pub async fn wait_until_settled(&self) -> CoreResult<CoordinatorSnapshot> {
        let mut snapshot_rx = self.snapshot_rx.clone();
        let snapshot = snapshot_rx
            .wait_for(CoordinatorSnapshot::is_settled)
            .await
            .map_err(|_| CoreError::Internal("import coordinator stopped".to_string()))?;
        Ok(snapshot.clone())
    }

    fn send(&self, request: CoordinatorRequest) -> CoreResult<()> {
        self.request_tx
            .send(request)
            .map_err(|_| CoreError::Internal("import coordinator stopped".to_string()))
    }
}

/// Spawns the coordinator actor and its load executor on the current runtime.
pub fn spawn_import_coordinator(
    registry: Arc<SourceTypeRegistry>,
    options: CoordinatorOptions,
    bus: Bus,
) -> CoordinatorHandle {
    let epoch = Epoch::new();
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(CoordinatorSnapshot::new(epoch));

    spawn_load_executor(
        registry,
        Arc::new(Semaphore::new(options.max_concurrent_loads.max(1))),
        command_rx,
        event_tx,
    );

    let actor = ImportCoordinator::new(
        epoch,
        options.retry_policy,
        options.retry_interval,
        bus.clone(),
        snapshot_tx,
        request_rx,
        event_rx,
        command_tx,
    );

    tokio::spawn(async move {
        actor.run().await;
    });

    CoordinatorHandle {
        request_tx,
        snapshot_rx,
        bus,
    }
}
