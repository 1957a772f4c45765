//! Progress channel subscription and aggregation.

use std::sync::Weak;

use mediastash_protocol::UploadProgress;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::queue::QueueInner;
use crate::types::UploadItem;

/// Handle for a progress channel attached to a queue.
///
/// Dropping the handle or calling [`unsubscribe`](Self::unsubscribe) stops
/// ingestion. Ingestion also stops when the sender side closes or the
/// queue is dropped.
pub struct ProgressSubscription {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ProgressSubscription {
    pub(crate) fn spawn(queue: Weak<QueueInner>, mut rx: mpsc::Receiver<UploadProgress>) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    msg = rx.recv() => {
                        let Some(progress) = msg else { break };
                        let Some(queue) = queue.upgrade() else { break };
                        queue.ingest_progress(&progress);
                    }
                }
            }
            debug!("progress subscription ended");
        });
        Self { cancel, handle }
    }

    /// Stops ingesting progress.
    pub fn unsubscribe(self) {
        self.cancel.cancel();
    }

    /// True while the ingestion task is still running.
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Mean of all items' progress, rounded; 0 for an empty queue.
pub fn overall_progress(items: &[UploadItem]) -> u8 {
    if items.is_empty() {
        return 0;
    }
    let sum: u32 = items.iter().map(|i| u32::from(i.progress)).sum();
    (f64::from(sum) / items.len() as f64).round() as u8
}
