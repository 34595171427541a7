//! Per-block render operations and cooperative cancellation.
//!
//! A block identity has at most one live operation. Starting a new one
//! cancels the previous token before the caller gets the new token back.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;

/// Stable handle for one diagram block inside a host document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The n-th diagram block of a document.
    pub fn for_block(document: &str, index: usize) -> Self {
        Self(format!("{document}#{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// True when both handles refer to the same operation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

#[derive(Debug, Clone)]
pub struct RenderOperation {
    pub block: BlockId,
    pub token: CancellationToken,
    pub started_at: Instant,
}

#[derive(Debug, Default)]
pub struct RenderOperationManager {
    pending: Mutex<HashMap<BlockId, RenderOperation>>,
}

impl RenderOperationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, block: &BlockId) -> CancellationToken {
        let token = CancellationToken::new();
        let operation = RenderOperation {
            block: block.clone(),
            token: token.clone(),
            started_at: Instant::now(),
        };

        let previous = self.pending.lock().insert(block.clone(), operation);
        if let Some(previous) = previous {
            previous.token.cancel();
            tracing::debug!(
                block = %block,
                elapsed_ms = previous.started_at.elapsed().as_millis() as u64,
                "superseded pending render"
            );
        }
        token
    }

    pub fn cancel(&self, block: &BlockId) {
        if let Some(operation) = self.pending.lock().remove(block) {
            operation.token.cancel();
            tracing::debug!(block = %block, "cancelled render");
        }
    }

    pub fn cancel_all(&self) {
        let drained: Vec<RenderOperation> =
            self.pending.lock().drain().map(|(_, op)| op).collect();
        for operation in &drained {
            operation.token.cancel();
        }
        if !drained.is_empty() {
            tracing::debug!(count = drained.len(), "cancelled all pending renders");
        }
    }

    /// Unregisters the operation owning `token`. A superseded operation
    /// completing late leaves its successor registered.
    pub fn complete(&self, block: &BlockId, token: &CancellationToken) {
        let mut pending = self.pending.lock();
        if pending
            .get(block)
            .is_some_and(|operation| operation.token.ptr_eq(token))
        {
            pending.remove(block);
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_pending(&self, block: &BlockId) -> bool {
        self.pending.lock().contains_key(block)
    }
}
