use tokio::sync::broadcast;

use crate::event::LauncherEvent;

#[derive(Clone)]
pub struct Bus {
    sender: broadcast::Sender<LauncherEvent>,
}

impl Bus {
    /// A zero capacity from config is raised to one; broadcast channels
    /// need room for at least one event.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LauncherEvent> {
        self.sender.subscribe()
    }

    pub fn publish(
        &self,
        event: LauncherEvent,
    ) -> Result<usize, broadcast::error::SendError<LauncherEvent>> {
        self.sender.send(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ResetPayload;
    use crate::model::Epoch;
    use tokio::time::{timeout, Duration};

    fn test_event(epoch: Epoch) -> LauncherEvent {
        LauncherEvent::Reset(ResetPayload { epoch })
    }

    #[tokio::test]
    async fn publish_and_receive_event() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let epoch = Epoch::new();

        let _ = bus.publish(test_event(epoch));

        let received = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("timeout")
            .expect("recv");
        assert!(matches!(received, LauncherEvent::Reset(ref e) if e.epoch == epoch));
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_event() {
        let bus = Bus::new(8);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        let epoch = Epoch::new();

        let _ = bus.publish(test_event(epoch));

        let event1 = rx1.recv().await.expect("recv1");
        let event2 = rx2.recv().await.expect("recv2");

        assert_eq!(event1.epoch(), epoch);
        assert_eq!(event2.epoch(), epoch);
    }

    #[tokio::test]
    async fn zero_capacity_still_delivers() {
        let bus = Bus::new(0);
        let mut rx = bus.subscribe();
        let epoch = Epoch::new();

        assert_eq!(bus.publish(test_event(epoch)).expect("publish"), 1);
        let received = rx.recv().await.expect("recv");
        assert_eq!(received.epoch(), epoch);
    }

    #[test]
    fn publish_without_subscribers_is_an_error() {
        let bus = Bus::new(8);
        assert!(bus.publish(test_event(Epoch::new())).is_err());
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let value = serde_json::to_value(test_event(Epoch::new())).expect("serialize");
        assert_eq!(value["type"], "Reset");
        assert!(value["payload"]["epoch"].is_string());
    }
}
