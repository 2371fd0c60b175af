use std::path::PathBuf;

use tokio::sync::oneshot;

use crate::error::{CoreResult, SourceError};
use crate::model::{Epoch, ImportDescriptor, Source};

/// One load to perform, with the chain of files that led to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub descriptor: ImportDescriptor,
    /// Paths of the importing files, outermost first.
    pub chain: Vec<PathBuf>,
    /// 1 for the first attempt; incremented on every retry.
    pub attempt: u32,
    /// Set only for the request issued by `load_root`.
    pub root: bool,
}

impl LoadRequest {
    pub fn root(descriptor: ImportDescriptor) -> Self {
        Self {
            root: true,
            ..Self::top_level(descriptor)
        }
    }

    pub fn top_level(descriptor: ImportDescriptor) -> Self {
        Self {
            descriptor,
            chain: Vec::new(),
            attempt: 1,
            root: false,
        }
    }

    /// A request for an import discovered inside this request's source.
    pub fn child(&self, descriptor: ImportDescriptor) -> Self {
        let mut chain = self.chain.clone();
        chain.push(self.descriptor.path.clone());
        Self {
            descriptor,
            chain,
            attempt: 1,
            root: false,
        }
    }

    pub fn next_attempt(mut self) -> Self {
        self.attempt = self.attempt.saturating_add(1);
        self
    }

    /// True when the descriptor's file is one of its own importers.
    pub fn is_cycle(&self) -> bool {
        self.chain.contains(&self.descriptor.path)
    }

    pub fn cycle_error(&self) -> SourceError {
        SourceError::Cycle {
            path: self.descriptor.path.clone(),
            chain: self.chain.clone(),
        }
    }
}

/// Coordinator -> executor.
#[derive(Debug)]
pub enum LoadCommand {
    Load { epoch: Epoch, request: LoadRequest },
}

/// Executor -> coordinator.
#[derive(Debug)]
pub enum LoadEvent {
    Loaded {
        epoch: Epoch,
        request: LoadRequest,
        source: Source,
    },
    Failed {
        epoch: Epoch,
        request: LoadRequest,
        error: SourceError,
    },
}

/// Handle -> coordinator.
pub enum CoordinatorRequest {
    /// Reset, then load the root; replies once the root itself has loaded or failed.
    LoadRoot {
        descriptor: ImportDescriptor,
        reply: oneshot::Sender<CoreResult<Epoch>>,
    },
    Load {
        descriptor: ImportDescriptor,
        reply: oneshot::Sender<Epoch>,
    },
    Reset {
        reply: oneshot::Sender<Epoch>,
    },
    /// Runs a retry tick immediately; replies with the number resubmitted.
    RetryNow {
        reply: oneshot::Sender<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_extends_chain_and_resets_attempts() {
        let root = LoadRequest::root(ImportDescriptor::xml("/a.xml")).next_attempt();
        assert_eq!(root.attempt, 2);

        let child = root.child(ImportDescriptor::xml("/b.xml"));
        assert_eq!(child.chain, vec![PathBuf::from("/a.xml")]);
        assert_eq!(child.attempt, 1);
        assert!(!child.root);
        assert!(!child.is_cycle());

        let back = child.child(ImportDescriptor::xml("/a.xml"));
        assert!(back.is_cycle());
        assert!(matches!(
            back.cycle_error(),
            SourceError::Cycle { ref chain, .. } if chain.len() == 2
        ));
    }
}
