//! Background processing of uploaded files.
//!
//! The file service hands every stored file to a [`JobDispatcher`]. A
//! single [`JobWorker`] task drains the queue and writes thumbnails next
//! to the original content. Dispatch never waits for processing and a
//! failed job never affects the upload that produced it.

mod dispatcher;
mod thumbnail;
mod worker;

pub use dispatcher::{JobDispatcher, JobReceiver, UploadJob};
pub use thumbnail::{generate_thumbnails, thumbnail_key, ThumbnailError, DEFAULT_THUMBNAIL_WIDTHS};
pub use worker::{JobError, JobWorker, WorkerStats};
