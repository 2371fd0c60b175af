use super::protocol::LoadRequest;

/// Failed loads waiting for the next retry tick, one entry per failure.
#[derive(Debug, Default)]
pub struct RetryQueue {
    pending: Vec<LoadRequest>,
}

impl RetryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `request` with its own chain. The same descriptor failing
    /// under two parents is queued twice.
    pub fn push(&mut self, request: LoadRequest) {
        self.pending.push(request);
    }

    /// Empties the queue, returning everything that was waiting.
    pub fn take_all(&mut self) -> Vec<LoadRequest> {
        std::mem::take(&mut self.pending)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::ImportDescriptor;

    #[test]
    fn keeps_one_entry_per_failure() {
        let mut queue = RetryQueue::new();
        let left = LoadRequest::top_level(ImportDescriptor::xml("/left.xml"));
        let right = LoadRequest::top_level(ImportDescriptor::xml("/right.xml"));

        queue.push(left.child(ImportDescriptor::xml("/shared.xml")));
        queue.push(right.child(ImportDescriptor::xml("/shared.xml")));
        assert_eq!(queue.len(), 2);

        let taken = queue.take_all();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].descriptor, taken[1].descriptor);
        assert_ne!(taken[0].chain, taken[1].chain);
        assert!(queue.is_empty());
    }
}
