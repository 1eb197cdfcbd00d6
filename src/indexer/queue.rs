//! The indexing queue.
//!
//! An unbounded FIFO channel between producers and the single worker, plus a
//! counter of items not yet fully processed. Producers never block; waiters
//! block on a condition variable until the counter reaches zero.

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::{Condvar, Mutex};

use crate::document::IndexToken;
use crate::error::{FolioError, Result};

/// One entry in the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueItem {
    /// A token to index.
    Article(IndexToken),
    /// Commit the open transaction.
    Flush,
    /// No further work: finalize the index.
    Drain,
    /// No further work: abandon the build.
    Shutdown,
}

#[derive(Debug)]
struct QueueState {
    pending: usize,
    accepting: bool,
    high_water: usize,
}

/// The queue shared by producers and the worker.
#[derive(Debug)]
pub struct IndexQueue {
    sender: Sender<QueueItem>,
    receiver: Receiver<QueueItem>,
    state: Mutex<QueueState>,
    idle: Condvar,
}

impl Default for IndexQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        IndexQueue {
            sender,
            receiver,
            state: Mutex::new(QueueState {
                pending: 0,
                accepting: true,
                high_water: 0,
            }),
            idle: Condvar::new(),
        }
    }

    /// Append a token. Fails once the queue has been drained or shut down.
    pub fn submit(&self, token: IndexToken) -> Result<()> {
        self.push(QueueItem::Article(token))
    }

    /// Append a checkpoint request, ordered with the tokens before it.
    pub fn request_flush(&self) -> Result<()> {
        self.push(QueueItem::Flush)
    }

    /// Append the drain sentinel. Returns `false` if the queue was already
    /// closed to new work.
    pub fn drain(&self) -> bool {
        self.close_with(QueueItem::Drain)
    }

    /// Append the shutdown sentinel. Returns `false` if the queue was already
    /// closed to new work.
    pub fn shutdown(&self) -> bool {
        self.close_with(QueueItem::Shutdown)
    }

    /// A handle for the consuming side.
    pub fn receiver(&self) -> Receiver<QueueItem> {
        self.receiver.clone()
    }

    /// Mark one received item as fully processed.
    pub fn complete_one(&self) {
        let mut state = self.state.lock();
        state.pending = state.pending.saturating_sub(1);
        if state.pending == 0 {
            self.idle.notify_all();
        }
    }

    /// Release every waiter; the consumer is gone.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.accepting = false;
        state.pending = 0;
        self.idle.notify_all();
    }

    /// Block until every queued item has been processed. No deadline.
    pub fn wait_idle(&self) {
        let mut state = self.state.lock();
        while state.pending > 0 {
            self.idle.wait(&mut state);
        }
    }

    /// Whether items are queued or one is being processed.
    pub fn is_running(&self) -> bool {
        self.state.lock().pending > 0
    }

    /// Items queued or in process.
    pub fn pending(&self) -> usize {
        self.state.lock().pending
    }

    /// Largest number of pending items seen so far.
    pub fn high_water_mark(&self) -> usize {
        self.state.lock().high_water
    }

    /// Whether new work is still accepted.
    pub fn is_accepting(&self) -> bool {
        self.state.lock().accepting
    }

    fn push(&self, item: QueueItem) -> Result<()> {
        let mut state = self.state.lock();
        if !state.accepting {
            return Err(FolioError::invalid_operation(
                "indexing queue no longer accepts work",
            ));
        }
        self.sender
            .send(item)
            .map_err(|_| FolioError::index("indexing queue disconnected"))?;
        state.pending += 1;
        state.high_water = state.high_water.max(state.pending);
        Ok(())
    }

    fn close_with(&self, item: QueueItem) -> bool {
        let mut state = self.state.lock();
        if !state.accepting {
            return false;
        }
        state.accepting = false;
        if self.sender.send(item).is_ok() {
            state.pending += 1;
            state.high_water = state.high_water.max(state.pending);
        }
        true
    }
}
