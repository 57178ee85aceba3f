//! File tree manager for Depot.
//!
//! This module enforces the tree rules on top of the node repository and
//! the byte store:
//! - Parents must be existing folders owned by the same user
//! - Nodes of other users are reported as not found
//! - Private content is only readable by its owner
//! - File bytes are written before the metadata row that references them

use std::sync::Arc;

use futures::stream::{self, Stream, TryStreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::node::{FileNode, NewNode, NodeType};
use super::repository::FileRepository;
use super::storage::ByteStore;
use crate::db::{Database, DbPool};
use crate::jobs::{thumbnail_key, JobDispatcher, DEFAULT_THUMBNAIL_WIDTHS};
use crate::{DepotError, Result};

/// Nodes per page when streaming a listing.
const STREAM_BATCH: i64 = 100;

/// A validated upload request.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Node name.
    pub name: String,
    /// Folder or file.
    pub node_type: NodeType,
    /// Parent folder ID, 0 for root.
    pub parent_id: i64,
    /// Initial visibility.
    pub is_public: bool,
    /// Decoded content. Required for files, ignored for folders.
    pub data: Option<Vec<u8>>,
}

/// Content read from the byte store together with its node.
#[derive(Debug)]
pub struct Content {
    pub node: FileNode,
    pub bytes: Vec<u8>,
}

/// Children of one folder for one owner.
///
/// Nothing is read until [`Children::page`] or [`Children::stream`] is
/// called, and every call starts over from the store.
#[derive(Clone)]
pub struct Children {
    pool: Option<DbPool>,
    owner_id: i64,
    parent_id: i64,
}

impl Children {
    fn empty(owner_id: i64, parent_id: i64) -> Self {
        Self {
            pool: None,
            owner_id,
            parent_id,
        }
    }

    /// Parent folder this listing is for.
    pub fn parent_id(&self) -> i64 {
        self.parent_id
    }

    /// Fetch page `index` (0-based) of `size` nodes.
    pub async fn page(&self, index: u32, size: u32) -> Result<Vec<FileNode>> {
        let Some(pool) = &self.pool else {
            return Ok(Vec::new());
        };
        let offset = i64::from(index) * i64::from(size);
        FileRepository::new(pool)
            .list_by_parent(self.owner_id, self.parent_id, offset, i64::from(size))
            .await
    }

    /// Stream every child, fetching from the store in batches on demand.
    pub fn stream(&self) -> impl Stream<Item = Result<FileNode>> + Send + 'static {
        let state = (self.clone(), 0i64, false);
        stream::try_unfold(state, |(children, offset, done)| async move {
            let Some(pool) = children.pool.clone().filter(|_| !done) else {
                return Ok::<_, DepotError>(None);
            };
            let batch = FileRepository::new(&pool)
                .list_by_parent(children.owner_id, children.parent_id, offset, STREAM_BATCH)
                .await?;
            let done = (batch.len() as i64) < STREAM_BATCH;
            let next = offset + batch.len() as i64;
            let items = stream::iter(batch.into_iter().map(Ok::<FileNode, DepotError>));
            Ok(Some((items, (children, next, done))))
        })
        .try_flatten()
    }

    /// Collect every child.
    pub async fn all(&self) -> Result<Vec<FileNode>> {
        self.stream().try_collect().await
    }
}

/// File tree manager.
///
/// Cheap to clone; all clones share the same stores and dispatcher.
#[derive(Clone)]
pub struct FileTreeManager {
    db: Database,
    bytes: Arc<dyn ByteStore>,
    jobs: JobDispatcher,
    thumbnail_widths: Vec<u32>,
}

impl FileTreeManager {
    /// Create a new FileTreeManager.
    pub fn new(db: Database, bytes: Arc<dyn ByteStore>, jobs: JobDispatcher) -> Self {
        Self {
            db,
            bytes,
            jobs,
            thumbnail_widths: DEFAULT_THUMBNAIL_WIDTHS.to_vec(),
        }
    }

    /// Set the thumbnail widths that can be requested.
    pub fn with_thumbnail_widths(mut self, widths: Vec<u32>) -> Self {
        self.thumbnail_widths = widths;
        self
    }

    fn repo(&self) -> FileRepository<'_> {
        FileRepository::new(self.db.pool())
    }

    /// Check that `parent_id` is the root or a folder owned by `owner_id`.
    async fn check_parent(&self, owner_id: i64, parent_id: i64) -> Result<()> {
        if parent_id == 0 {
            return Ok(());
        }
        match self.repo().get_by_id(parent_id).await? {
            Some(parent) if parent.user_id == owner_id => {
                if parent.is_folder() {
                    Ok(())
                } else {
                    Err(DepotError::ParentNotAFolder)
                }
            }
            _ => Err(DepotError::ParentNotFound),
        }
    }

    /// Create a folder or a file from an upload request.
    pub async fn upload(&self, owner_id: i64, upload: Upload) -> Result<FileNode> {
        match upload.node_type {
            NodeType::Folder => {
                self.create_folder(owner_id, &upload.name, upload.parent_id, upload.is_public)
                    .await
            }
            NodeType::File => {
                let data = upload.data.ok_or(DepotError::MissingField("data"))?;
                self.create_file(
                    owner_id,
                    &upload.name,
                    upload.parent_id,
                    &data,
                    upload.is_public,
                )
                .await
            }
        }
    }

    /// Create a folder.
    pub async fn create_folder(
        &self,
        owner_id: i64,
        name: &str,
        parent_id: i64,
        is_public: bool,
    ) -> Result<FileNode> {
        if name.is_empty() {
            return Err(DepotError::MissingField("name"));
        }
        self.check_parent(owner_id, parent_id).await?;

        let node = self
            .repo()
            .create(&NewNode::folder(owner_id, name, parent_id).with_public(is_public))
            .await?;

        info!(user_id = owner_id, file_id = node.id, "Created folder");
        Ok(node)
    }

    /// Create a file.
    ///
    /// The bytes are stored first. If the metadata insert then fails the
    /// bytes stay behind unreferenced; no rollback is attempted.
    pub async fn create_file(
        &self,
        owner_id: i64,
        name: &str,
        parent_id: i64,
        content: &[u8],
        is_public: bool,
    ) -> Result<FileNode> {
        if name.is_empty() {
            return Err(DepotError::MissingField("name"));
        }
        self.check_parent(owner_id, parent_id).await?;

        let content_key = Uuid::new_v4().to_string();
        self.bytes
            .write(&content_key, content)
            .await
            .map_err(|e| match e {
                DepotError::StorageWriteFailed(_) => e,
                other => DepotError::StorageWriteFailed(other.to_string()),
            })?;

        let new_node =
            NewNode::file(owner_id, name, parent_id, content_key.as_str()).with_public(is_public);
        let node = self.repo().create(&new_node).await.map_err(|e| {
            warn!(%content_key, error = %e, "Metadata insert failed, content left orphaned");
            e
        })?;

        info!(
            user_id = owner_id,
            file_id = node.id,
            size = content.len(),
            "Created file"
        );
        self.jobs.enqueue(owner_id, node.id);
        Ok(node)
    }

    /// Get a node owned by `owner_id`.
    ///
    /// Another user's node is indistinguishable from a missing one.
    pub async fn get_node(&self, owner_id: i64, file_id: i64) -> Result<FileNode> {
        self.repo()
            .get_by_id(file_id)
            .await?
            .filter(|node| node.user_id == owner_id)
            .ok_or(DepotError::NotFound)
    }

    /// List the children of `parent_id`.
    ///
    /// A parent that is not an existing folder of this owner yields an
    /// empty listing, not an error.
    pub async fn list_children(&self, owner_id: i64, parent_id: i64) -> Result<Children> {
        if parent_id != 0 {
            let parent = self.repo().get_by_id(parent_id).await?;
            if !parent.is_some_and(|p| p.is_folder() && p.user_id == owner_id) {
                debug!(user_id = owner_id, parent_id, "Listing a non-folder parent");
                return Ok(Children::empty(owner_id, parent_id));
            }
        }
        Ok(Children {
            pool: Some(self.db.pool().clone()),
            owner_id,
            parent_id,
        })
    }

    /// Set the visibility of a node. Setting the current value is a no-op.
    pub async fn set_public(&self, owner_id: i64, file_id: i64, is_public: bool) -> Result<FileNode> {
        let mut node = self.get_node(owner_id, file_id).await?;
        if node.is_public == is_public {
            return Ok(node);
        }

        if !self.repo().set_public(file_id, is_public).await? {
            return Err(DepotError::NotFound);
        }
        node.is_public = is_public;

        info!(user_id = owner_id, file_id, is_public, "Changed visibility");
        Ok(node)
    }

    /// Resolve a node for reading by `requester_id` (`None` if anonymous).
    async fn readable_node(&self, requester_id: Option<i64>, file_id: i64) -> Result<FileNode> {
        let node = self
            .repo()
            .get_by_id(file_id)
            .await?
            .ok_or(DepotError::NotFound)?;

        if !node.is_public && requester_id != Some(node.user_id) {
            return Err(DepotError::NotFound);
        }
        if node.is_folder() {
            return Err(DepotError::NotDownloadable);
        }
        Ok(node)
    }

    /// Read the content of a file.
    pub async fn read_content(&self, requester_id: Option<i64>, file_id: i64) -> Result<Content> {
        let node = self.readable_node(requester_id, file_id).await?;
        let key = node
            .content_key
            .as_deref()
            .ok_or_else(|| DepotError::Internal(format!("file {file_id} has no content key")))?;

        let bytes = self.bytes.read(key).await?;
        Ok(Content { node, bytes })
    }

    /// Read a generated thumbnail of a file.
    ///
    /// A thumbnail that has not been generated yet is [`DepotError::NotFound`].
    pub async fn read_thumbnail(
        &self,
        requester_id: Option<i64>,
        file_id: i64,
        width: u32,
    ) -> Result<Content> {
        if !self.thumbnail_widths.contains(&width) {
            return Err(DepotError::MalformedRequest(format!(
                "unsupported size {width}"
            )));
        }

        let node = self.readable_node(requester_id, file_id).await?;
        let key = node
            .content_key
            .as_deref()
            .ok_or_else(|| DepotError::Internal(format!("file {file_id} has no content key")))?;

        let bytes = self.bytes.read(&thumbnail_key(key, width)).await?;
        Ok(Content { node, bytes })
    }

    /// Count all nodes.
    pub async fn count(&self) -> Result<i64> {
        self.repo().count().await
    }
}
