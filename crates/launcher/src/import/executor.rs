use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};

use crate::import::protocol::{LoadCommand, LoadEvent, LoadRequest};
use crate::model::Epoch;
use crate::source::{load_source, SourceTypeRegistry};

/// Runs every received load on its own task. `permits` bounds how many
/// loads touch the filesystem at once.
pub fn spawn_load_executor(
    registry: Arc<SourceTypeRegistry>,
    permits: Arc<Semaphore>,
    mut command_rx: mpsc::UnboundedReceiver<LoadCommand>,
    event_tx: mpsc::UnboundedSender<LoadEvent>,
) {
    tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            match command {
                LoadCommand::Load { epoch, request } => {
                    spawn_load(
                        registry.clone(),
                        permits.clone(),
                        event_tx.clone(),
                        epoch,
                        request,
                    );
                }
            }
        }
        tracing::debug!("load executor stopped");
    });
}

fn spawn_load(
    registry: Arc<SourceTypeRegistry>,
    permits: Arc<Semaphore>,
    event_tx: mpsc::UnboundedSender<LoadEvent>,
    epoch: Epoch,
    request: LoadRequest,
) {
    tokio::spawn(async move {
        let _permit = match permits.acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };

        let event = match load_source(&registry, &request.descriptor).await {
            Ok(source) => LoadEvent::Loaded {
                epoch,
                request,
                source,
            },
            Err(error) => LoadEvent::Failed {
                epoch,
                request,
                error,
            },
        };
        let _ = event_tx.send(event);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::model::ImportDescriptor;
    use tempfile::tempdir;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn reports_loaded_and_failed_sources() {
        let dir = tempdir().expect("tempdir");
        let good = dir.path().join("good.xml");
        std::fs::write(&good, "<items><item><name>a</name></item></items>").expect("write");

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        spawn_load_executor(
            Arc::new(SourceTypeRegistry::with_defaults()),
            Arc::new(Semaphore::new(1)),
            command_rx,
            event_tx,
        );

        let epoch = Epoch::new();
        command_tx
            .send(LoadCommand::Load {
                epoch,
                request: LoadRequest::top_level(ImportDescriptor::xml(&good)),
            })
            .expect("send");
        command_tx
            .send(LoadCommand::Load {
                epoch,
                request: LoadRequest::top_level(ImportDescriptor::xml(
                    dir.path().join("missing.xml"),
                )),
            })
            .expect("send");

        let mut loaded = 0;
        let mut failed = 0;
        for _ in 0..2 {
            let event = timeout(Duration::from_secs(5), event_rx.recv())
                .await
                .expect("timeout")
                .expect("event");
            match event {
                LoadEvent::Loaded {
                    epoch: seen,
                    source,
                    ..
                } => {
                    assert_eq!(seen, epoch);
                    assert_eq!(source.item_count(), 1);
                    loaded += 1;
                }
                LoadEvent::Failed {
                    epoch: seen, error, ..
                } => {
                    assert_eq!(seen, epoch);
                    assert!(matches!(error, SourceError::Open { .. }));
                    failed += 1;
                }
            }
        }
        assert_eq!((loaded, failed), (1, 1));
    }
}
