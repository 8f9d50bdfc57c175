use std::collections::HashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Deferred saves keyed by answer id.
///
/// Scheduling a save for an id aborts any pending save for the same id, so
/// rapid successive edits to one cell coalesce into a single write of the
/// latest value (last-write-wins).
#[derive(Default)]
pub struct SaveScheduler {
    pending: Mutex<HashMap<i64, JoinHandle<()>>>,
}

impl SaveScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handle` as the pending save for `answer_id`, aborting any
    /// previously scheduled save for the same answer.
    pub async fn replace(&self, answer_id: i64, handle: JoinHandle<()>) {
        let mut pending = self.pending.lock().await;
        if let Some(previous) = pending.insert(answer_id, handle) {
            previous.abort();
        }
    }

    /// Awaits every pending save until the scheduler is quiescent.
    ///
    /// Saves scheduled while a flush round runs are picked up by the next
    /// round. Aborted handles resolve with a `JoinError`, which is ignored.
    pub async fn flush(&self) {
        loop {
            let drained: Vec<JoinHandle<()>> = {
                let mut pending = self.pending.lock().await;
                pending.drain().map(|(_, handle)| handle).collect()
            };
            if drained.is_empty() {
                return;
            }
            for handle in drained {
                let _ = handle.await;
            }
        }
    }
}
