//! File node repository for Depot.

use super::node::{FileNode, NewNode};
use crate::db::DbPool;
use crate::{DepotError, Result};

const NODE_COLUMNS: &str = "id, user_id, name, node_type, is_public, parent_id, content_key";

/// Repository for file tree nodes.
pub struct FileRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new node.
    pub async fn create(&self, node: &NewNode) -> Result<FileNode> {
        let result = sqlx::query(
            "INSERT INTO files (user_id, name, node_type, is_public, parent_id, content_key)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(node.user_id)
        .bind(&node.name)
        .bind(node.node_type.as_str())
        .bind(node.is_public)
        .bind(node.parent_id)
        .bind(&node.content_key)
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id).await?.ok_or(DepotError::NotFound)
    }

    /// Get a node by ID, regardless of owner.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<FileNode>> {
        let node = sqlx::query_as::<_, FileNode>(&format!(
            "SELECT {NODE_COLUMNS} FROM files WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(node)
    }

    /// List a user's nodes under `parent_id` in insertion order.
    pub async fn list_by_parent(
        &self,
        user_id: i64,
        parent_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<FileNode>> {
        let nodes = sqlx::query_as::<_, FileNode>(&format!(
            "SELECT {NODE_COLUMNS} FROM files
             WHERE user_id = ? AND parent_id = ?
             ORDER BY id
             LIMIT ? OFFSET ?"
        ))
        .bind(user_id)
        .bind(parent_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;
        Ok(nodes)
    }

    /// List file (non-folder) nodes with an ID greater than `after_id`.
    ///
    /// Used to walk the whole table in batches.
    pub async fn list_files_after(&self, after_id: i64, limit: i64) -> Result<Vec<FileNode>> {
        let nodes = sqlx::query_as::<_, FileNode>(&format!(
            "SELECT {NODE_COLUMNS} FROM files
             WHERE node_type = 'file' AND id > ?
             ORDER BY id
             LIMIT ?"
        ))
        .bind(after_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(nodes)
    }

    /// Set the visibility flag. Returns `false` if the node does not exist.
    pub async fn set_public(&self, id: i64, is_public: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE files SET is_public = ? WHERE id = ?")
            .bind(is_public)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count all nodes.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::file::NodeType;
    use crate::Database;

    async fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("a@x.com", "hash"))
            .await
            .unwrap();
        (db, user.id)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (db, uid) = setup().await;
        let repo = FileRepository::new(db.pool());

        let folder = repo.create(&NewNode::folder(uid, "docs", 0)).await.unwrap();
        assert_eq!(folder.node_type, NodeType::Folder);
        assert!(!folder.is_public);
        assert_eq!(folder.content_key, None);

        let file = repo
            .create(&NewNode::file(uid, "a.txt", folder.id, "k1").with_public(true))
            .await
            .unwrap();
        assert_eq!(file.parent_id, folder.id);
        assert!(file.is_public);

        let fetched = repo.get_by_id(file.id).await.unwrap().unwrap();
        assert_eq!(fetched, file);
        assert!(repo.get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_folder_with_content_key_is_rejected() {
        let (db, uid) = setup().await;
        let repo = FileRepository::new(db.pool());

        let mut bad = NewNode::folder(uid, "docs", 0);
        bad.content_key = Some("k".into());
        assert!(matches!(
            repo.create(&bad).await,
            Err(DepotError::Database(_))
        ));
    }

    #[tokio::test]
    async fn test_list_by_parent_pages_in_insertion_order() {
        let (db, uid) = setup().await;
        let repo = FileRepository::new(db.pool());

        for i in 0..5 {
            repo.create(&NewNode::file(uid, format!("f{i}"), 0, format!("k{i}")))
                .await
                .unwrap();
        }

        let first = repo.list_by_parent(uid, 0, 0, 2).await.unwrap();
        let names: Vec<_> = first.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["f0", "f1"]);

        let last = repo.list_by_parent(uid, 0, 4, 2).await.unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].name, "f4");

        // Another user's root is separate
        assert!(repo.list_by_parent(uid + 1, 0, 0, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_public() {
        let (db, uid) = setup().await;
        let repo = FileRepository::new(db.pool());
        let file = repo.create(&NewNode::file(uid, "a", 0, "k")).await.unwrap();

        assert!(repo.set_public(file.id, true).await.unwrap());
        assert!(repo.get_by_id(file.id).await.unwrap().unwrap().is_public);
        assert!(!repo.set_public(999, true).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_files_after_and_count() {
        let (db, uid) = setup().await;
        let repo = FileRepository::new(db.pool());

        repo.create(&NewNode::folder(uid, "docs", 0)).await.unwrap();
        let a = repo.create(&NewNode::file(uid, "a", 0, "ka")).await.unwrap();
        let b = repo.create(&NewNode::file(uid, "b", 0, "kb")).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 3);

        let files = repo.list_files_after(0, 10).await.unwrap();
        assert_eq!(files.len(), 2);
        let rest = repo.list_files_after(a.id, 10).await.unwrap();
        assert_eq!(rest, vec![b]);
    }
}
