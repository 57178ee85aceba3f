//! Upload Job Pipeline Tests
//!
//! Exercises the file tree manager, dispatcher and worker together without
//! the HTTP layer.

use std::io::Cursor;
use std::sync::Arc;

use depot::file::{ByteStore, DiskByteStore, FileTreeManager};
use depot::jobs::{thumbnail_key, JobDispatcher, JobWorker, WorkerStats};
use depot::{register, Database};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([1, 2, 3]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

#[tokio::test]
async fn test_worker_drains_queue_after_dispatchers_drop() {
    let dir = TempDir::new().unwrap();
    let db = Database::open_in_memory().await.unwrap();
    let owner = register(&db, Some("a@x.com"), Some("pw1")).await.unwrap().id;
    let bytes = Arc::new(DiskByteStore::new(dir.path()).unwrap());

    let (dispatcher, jobs) = JobDispatcher::new();
    let worker = JobWorker::new(db.clone(), bytes.clone()).with_widths(vec![64]);
    let handle = worker.spawn(jobs);

    let files = FileTreeManager::new(db.clone(), bytes.clone(), dispatcher);
    let folder = files.create_folder(owner, "pics", 0, false).await.unwrap();
    let picture = files
        .create_file(owner, "a.png", folder.id, &png(128, 32), false)
        .await
        .unwrap();
    let text = files
        .create_file(owner, "notes.txt", folder.id, b"not an image", false)
        .await
        .unwrap();
    drop(files);

    let stats = handle.await.unwrap();
    assert_eq!(
        stats,
        WorkerStats {
            completed: 1,
            failed: 1
        }
    );

    let key = picture.content_key.unwrap();
    let thumb = bytes.read(&thumbnail_key(&key, 64)).await.unwrap();
    let decoded = image::load_from_memory(&thumb).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 16));

    let text_key = text.content_key.unwrap();
    assert!(!bytes.exists(&thumbnail_key(&text_key, 64)).await.unwrap());
}

#[tokio::test]
async fn test_backfill_recovers_lost_jobs() {
    let dir = TempDir::new().unwrap();
    let db = Database::open_in_memory().await.unwrap();
    let owner = register(&db, Some("a@x.com"), Some("pw1")).await.unwrap().id;
    let bytes = Arc::new(DiskByteStore::new(dir.path()).unwrap());

    // Upload while nobody consumes the queue, then lose it
    let (dispatcher, lost) = JobDispatcher::new();
    let files = FileTreeManager::new(db.clone(), bytes.clone(), dispatcher);
    let picture = files
        .create_file(owner, "a.png", 0, &png(100, 100), true)
        .await
        .unwrap();
    drop(lost);
    drop(files);

    // Restart
    let (dispatcher, jobs) = JobDispatcher::new();
    let worker = JobWorker::new(db.clone(), bytes.clone()).with_widths(vec![10]);
    assert_eq!(worker.backfill(&dispatcher).await.unwrap(), 1);
    drop(dispatcher);

    let stats = worker.spawn(jobs).await.unwrap();
    assert_eq!(stats.completed, 1);

    let key = picture.content_key.unwrap();
    assert!(bytes.exists(&thumbnail_key(&key, 10)).await.unwrap());
}
