//! In-process job queue.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{DepotError, Result};

/// Post-upload work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadJob {
    /// Owner of the uploaded file.
    pub owner_id: i64,
    /// The uploaded file node.
    pub file_id: i64,
}

/// Sending half of the job queue.
///
/// This is a lightweight handle that can be cloned freely.
#[derive(Debug, Clone)]
pub struct JobDispatcher {
    tx: mpsc::UnboundedSender<UploadJob>,
}

impl JobDispatcher {
    /// Create a new dispatcher and receiver pair.
    ///
    /// The receiver should be given to the worker task. Once every
    /// dispatcher clone is dropped the receiver drains and then ends.
    pub fn new() -> (Self, JobReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, JobReceiver { rx })
    }

    /// Send a job to the worker.
    pub fn dispatch(&self, job: UploadJob) -> Result<()> {
        self.tx
            .send(job)
            .map_err(|_| DepotError::Internal("job receiver has been dropped".into()))
    }

    /// Fire-and-forget dispatch.
    ///
    /// A failure is logged and otherwise ignored: the file is valid
    /// without derived artifacts. Returns whether the job was queued.
    pub fn enqueue(&self, owner_id: i64, file_id: i64) -> bool {
        match self.dispatch(UploadJob { owner_id, file_id }) {
            Ok(()) => {
                debug!(user_id = owner_id, file_id, "Queued upload job");
                true
            }
            Err(e) => {
                warn!(user_id = owner_id, file_id, error = %e, "Failed to queue upload job");
                false
            }
        }
    }
}

/// Receiving half of the job queue.
#[derive(Debug)]
pub struct JobReceiver {
    rx: mpsc::UnboundedReceiver<UploadJob>,
}

impl JobReceiver {
    /// Wait for the next job. `None` once all dispatchers are gone.
    pub async fn recv(&mut self) -> Option<UploadJob> {
        self.rx.recv().await
    }

    /// Take a job if one is ready.
    pub fn try_recv(&mut self) -> Option<UploadJob> {
        self.rx.try_recv().ok()
    }
}
