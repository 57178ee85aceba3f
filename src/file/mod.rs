//! File management module for Depot.
//!
//! This module provides the per-user file tree:
//! - File and folder node model
//! - Node repository over the `files` table
//! - Byte storage addressed by content key
//! - The tree manager enforcing ownership, hierarchy and visibility

mod node;
mod repository;
mod service;
mod storage;

pub use node::{FileNode, NewNode, NodeType};
pub use repository::FileRepository;
pub use service::{Children, Content, FileTreeManager, Upload};
pub use storage::{ByteStore, DiskByteStore};

/// Nodes per page in listings.
pub const PAGE_SIZE: u32 = 20;
