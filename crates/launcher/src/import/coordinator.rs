
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::bus::Bus;
use crate::catalog::ItemCatalog;
use crate::error::{CoreError, CoreResult, SourceError};
use crate::event::{
    CatalogChangedPayload, ImportFailedPayload, LauncherEvent, ResetPayload,
    RetryScheduledPayload,
};
use crate::import::protocol::{CoordinatorRequest, LoadCommand, LoadEvent, LoadRequest};
use crate::import::retry::RetryQueue;
use crate::import::types::{CoordinatorSnapshot, RetryPolicy};
use crate::model::{Epoch, ImportDescriptor, Source};
use crate::source::normalize_path;

pub(crate) struct ImportCoordinator {
    epoch: Epoch,
    catalog: Arc<ItemCatalog>,
    retries: RetryQueue,
    retry_policy: RetryPolicy,
    retry_interval: Duration,
    in_flight: usize,
    root_reply: Option<oneshot::Sender<CoreResult<Epoch>>>,
    bus: Bus,
    snapshot_tx: watch::Sender<CoordinatorSnapshot>,
    request_rx: mpsc::UnboundedReceiver<CoordinatorRequest>,
    event_rx: mpsc::UnboundedReceiver<LoadEvent>,
    command_tx: mpsc::UnboundedSender<LoadCommand>,
}

impl ImportCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        epoch: Epoch,
        retry_policy: RetryPolicy,
        retry_interval: Duration,
        bus: Bus,
        snapshot_tx: watch::Sender<CoordinatorSnapshot>,
        request_rx: mpsc::UnboundedReceiver<CoordinatorRequest>,
        event_rx: mpsc::UnboundedReceiver<LoadEvent>,
        command_tx: mpsc::UnboundedSender<LoadCommand>,
    ) -> Self {
        Self {
            epoch,
            catalog: Arc::new(ItemCatalog::new(epoch)),
            retries: RetryQueue::new(),
            retry_policy,
            retry_interval,
            in_flight: 0,
            root_reply: None,
            bus,
            snapshot_tx,
            request_rx,
            event_rx,
            command_tx,
        }
    }

    pub(crate) async fn run(mut self) {
        let period = self.retry_interval.max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                request = self.request_rx.recv() => match request {
                    Some(request) => self.handle_request(request),
                    None => break,
                },
                Some(event) = self.event_rx.recv() => self.handle_event(event),
                _ = ticker.tick() => {
                    self.tick();
                }
            }
        }
        tracing::debug!(epoch = %self.epoch, "import coordinator stopped");
    }

    fn handle_request(&mut self, request: CoordinatorRequest) {
        match request {
            CoordinatorRequest::LoadRoot { descriptor, reply } => {
                self.load_root(descriptor, reply);
            }
            CoordinatorRequest::Load { descriptor, reply } => {
                self.load(LoadRequest::top_level(normalize_descriptor(descriptor)));
                self.publish_snapshot();
                let _ = reply.send(self.epoch);
            }
            CoordinatorRequest::Reset { reply } => {
                let epoch = self.reset();
                let _ = reply.send(epoch);
            }
            CoordinatorRequest::RetryNow { reply } => {
                let count = self.tick();
                let _ = reply.send(count);
            }
        }
    }

    /// Starts a new epoch. Everything scheduled before is ignored from now on.
    fn reset(&mut self) -> Epoch {
        self.epoch = Epoch::new();
        self.catalog = Arc::new(ItemCatalog::new(self.epoch));
        self.retries.clear();
        self.in_flight = 0;
        if let Some(reply) = self.root_reply.take() {
            let _ = reply.send(Err(CoreError::Internal(
                "root load superseded by a reset".to_string(),
            )));
        }

        tracing::info!(epoch = %self.epoch, "import epoch reset");
        let _ = self
            .bus
            .publish(LauncherEvent::Reset(ResetPayload { epoch: self.epoch }));
        self.publish_snapshot();
        self.epoch
    }

    fn load_root(
        &mut self,
        descriptor: ImportDescriptor,
        reply: oneshot::Sender<CoreResult<Epoch>>,
    ) {
        self.reset();
        self.root_reply = Some(reply);
        self.load(LoadRequest::root(normalize_descriptor(descriptor)));
        self.publish_snapshot();
    }

    /// Submits one load tagged with the current epoch.
    fn load(&mut self, request: LoadRequest) {
        if request.is_cycle() {
            let error = request.cycle_error();
            self.record_failure(request, error);
            return;
        }

        tracing::debug!(
            epoch = %self.epoch,
            path = %request.descriptor.path.display(),
            attempt = request.attempt,
            "scheduling load"
        );
        let command = LoadCommand::Load {
            epoch: self.epoch,
            request,
        };
        if self.command_tx.send(command).is_err() {
            tracing::warn!("load executor is gone; dropping load");
            return;
        }
        self.in_flight += 1;
    }

    fn handle_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Loaded {
                epoch,
                request,
                source,
            } => {
                if epoch != self.epoch {
                    tracing::debug!(
                        stale = %epoch,
                        path = %request.descriptor.path.display(),
                        "dropping stale load result"
                    );
                    return;
                }
                self.in_flight = self.in_flight.saturating_sub(1);
                self.absorb(request, source);
            }
            LoadEvent::Failed {
                epoch,
                request,
                error,
            } => {
                if epoch != self.epoch {
                    tracing::debug!(
                        stale = %epoch,
                        path = %request.descriptor.path.display(),
                        "dropping stale load failure"
                    );
                    return;
                }
                self.in_flight = self.in_flight.saturating_sub(1);
                self.record_failure(request, error);
            }
        }
        self.publish_snapshot();
    }

    /// Merges a loaded source and schedules its imports.
    fn absorb(&mut self, request: LoadRequest, mut source: Source) {
        let imports = std::mem::take(&mut source.imports);
        let file = source.file.clone();
        let rows_added = Arc::make_mut(&mut self.catalog).merge(source);
        let row_count = self.catalog.row_count();

        tracing::info!(
            path = %file.display(),
            rows_added,
            row_count,
            imports = imports.len(),
            "source merged"
        );
        let _ = self
            .bus
            .publish(LauncherEvent::CatalogChanged(CatalogChangedPayload {
                epoch: self.epoch,
                source: file,
                rows_added,
                row_count,
            }));

        if request.root {
            if let Some(reply) = self.root_reply.take() {
                let _ = reply.send(Ok(self.epoch));
            }
        }

        for descriptor in imports {
            self.load(request.child(descriptor));
        }
    }

    fn record_failure(&mut self, request: LoadRequest, error: SourceError) {
        let will_retry = error.is_retryable() && self.retry_policy.allows_retry(request.attempt);
        tracing::warn!(
            path = %request.descriptor.path.display(),
            attempt = request.attempt,
            will_retry,
            "import failed: {error}"
        );

        if request.root {
            if let Some(reply) = self.root_reply.take() {
                let _ = reply.send(Err(CoreError::Import {
                    descriptor: request.descriptor.clone(),
                    source: error.clone(),
                }));
            }
        }

        let _ = self
            .bus
            .publish(LauncherEvent::ImportFailed(ImportFailedPayload {
                epoch: self.epoch,
                path: request.descriptor.path.clone(),
                mime_type: request.descriptor.mime_type.clone(),
                error: error.to_string(),
                will_retry,
            }));

        if will_retry {
            self.retries.push(request);
        } else if error.is_retryable() {
            tracing::warn!(
                path = %request.descriptor.path.display(),
                attempts = request.attempt,
                "giving up on import"
            );
        }
    }

    /// Resubmits every queued failure once. Returns how many were resubmitted.
    fn tick(&mut self) -> usize {
        if self.retries.is_empty() {
            return 0;
        }

        let requests = self.retries.take_all();
        let count = requests.len();
        tracing::info!(epoch = %self.epoch, count, "retrying failed imports");
        let _ = self
            .bus
            .publish(LauncherEvent::RetryScheduled(RetryScheduledPayload {
                epoch: self.epoch,
                count,
            }));

        for request in requests {
            self.load(request.next_attempt());
        }
        self.publish_snapshot();
        count
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(CoordinatorSnapshot {
            epoch: self.epoch,
            catalog: self.catalog.clone(),
            in_flight: self.in_flight,
            pending_retries: self.retries.len(),
        });
    }
}

fn normalize_descriptor(descriptor: ImportDescriptor) -> ImportDescriptor {
    ImportDescriptor {
        path: normalize_path(&descriptor.path),
        mime_type: descriptor.mime_type,
    }
}
