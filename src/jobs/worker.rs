//! Upload job worker.

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::dispatcher::{JobDispatcher, JobReceiver, UploadJob};
use super::thumbnail::{generate_thumbnails, thumbnail_key, ThumbnailError, DEFAULT_THUMBNAIL_WIDTHS};
use crate::db::Database;
use crate::file::{ByteStore, FileNode, FileRepository};
use crate::DepotError;

/// Files scanned per query during backfill.
const BACKFILL_BATCH: i64 = 200;

/// Why a job failed. Every failure is permanent; the worker never retries.
#[derive(Error, Debug)]
pub enum JobError {
    /// The node is gone or belongs to someone else.
    #[error("file node not found")]
    NodeNotFound,

    /// The node is a folder or not an image.
    #[error("file is not an image")]
    NotAnImage,

    #[error(transparent)]
    Thumbnail(#[from] ThumbnailError),

    #[error(transparent)]
    Store(#[from] DepotError),
}

/// Counters returned when the worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub completed: u64,
    pub failed: u64,
}

/// Consumes upload jobs and writes thumbnails.
#[derive(Clone)]
pub struct JobWorker {
    db: Database,
    bytes: Arc<dyn ByteStore>,
    widths: Vec<u32>,
}

impl JobWorker {
    /// Create a worker generating the default thumbnail widths.
    pub fn new(db: Database, bytes: Arc<dyn ByteStore>) -> Self {
        Self {
            db,
            bytes,
            widths: DEFAULT_THUMBNAIL_WIDTHS.to_vec(),
        }
    }

    /// Set the thumbnail widths to generate.
    pub fn with_widths(mut self, widths: Vec<u32>) -> Self {
        self.widths = widths;
        self
    }

    /// Run the worker on a background task.
    pub fn spawn(self, jobs: JobReceiver) -> JoinHandle<WorkerStats> {
        tokio::spawn(self.run(jobs))
    }

    /// Process jobs one at a time until every dispatcher is dropped.
    pub async fn run(self, mut jobs: JobReceiver) -> WorkerStats {
        info!("Upload job worker started");
        let mut stats = WorkerStats::default();

        while let Some(job) = jobs.recv().await {
            if self.handle(job).await {
                stats.completed += 1;
            } else {
                stats.failed += 1;
            }
        }

        info!(
            completed = stats.completed,
            failed = stats.failed,
            "Upload job worker stopped"
        );
        stats
    }

    /// Process one job, logging the outcome. Returns whether it succeeded.
    pub async fn handle(&self, job: UploadJob) -> bool {
        match self.process(job).await {
            Ok(written) => {
                info!(
                    user_id = job.owner_id,
                    file_id = job.file_id,
                    thumbnails = written,
                    "Upload job completed"
                );
                true
            }
            Err(e @ (JobError::NodeNotFound | JobError::NotAnImage)) => {
                debug!(user_id = job.owner_id, file_id = job.file_id, reason = %e, "Upload job skipped");
                false
            }
            Err(e) => {
                warn!(user_id = job.owner_id, file_id = job.file_id, error = %e, "Upload job failed");
                false
            }
        }
    }

    /// Generate and store every thumbnail for the job's file.
    ///
    /// Returns the number of thumbnails written.
    pub async fn process(&self, job: UploadJob) -> Result<usize, JobError> {
        let node = FileRepository::new(self.db.pool())
            .get_by_id(job.file_id)
            .await?
            .filter(|n| n.user_id == job.owner_id)
            .ok_or(JobError::NodeNotFound)?;

        if !node.is_image() {
            return Err(JobError::NotAnImage);
        }
        let content_key = node.content_key.as_deref().ok_or(JobError::NotAnImage)?;

        let source = self.bytes.read(content_key).await?;
        let widths = self.widths.clone();
        let thumbnails = tokio::task::spawn_blocking(move || generate_thumbnails(&source, &widths))
            .await
            .map_err(DepotError::from)??;

        for (width, bytes) in &thumbnails {
            self.bytes
                .write(&thumbnail_key(content_key, *width), bytes)
                .await?;
        }
        Ok(thumbnails.len())
    }

    async fn missing_thumbnails(&self, node: &FileNode) -> Result<bool, DepotError> {
        let Some(key) = node.content_key.as_deref() else {
            return Ok(false);
        };
        for &width in &self.widths {
            if !self.bytes.exists(&thumbnail_key(key, width)).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Re-enqueue every image file that is missing a thumbnail.
    ///
    /// Recovers jobs lost when the process stopped before the queue was
    /// drained. Returns the number of jobs queued.
    pub async fn backfill(&self, dispatcher: &JobDispatcher) -> Result<usize, DepotError> {
        let repo = FileRepository::new(self.db.pool());
        let mut after_id = 0;
        let mut queued = 0;

        loop {
            let batch = repo.list_files_after(after_id, BACKFILL_BATCH).await?;
            let Some(last) = batch.last() else {
                break;
            };
            after_id = last.id;

            for node in batch.iter().filter(|n| n.is_image()) {
                if self.missing_thumbnails(node).await? && dispatcher.enqueue(node.user_id, node.id)
                {
                    queued += 1;
                }
            }
        }

        if queued > 0 {
            info!(queued, "Re-queued images missing thumbnails");
        }
        Ok(queued)
    }
}
