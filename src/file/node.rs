//! File node model.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{DepotError, Result};

/// Kind of a file tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// A folder. Never carries content.
    Folder,
    /// A file with content in the byte store.
    File,
}

impl NodeType {
    /// Parse a node type as sent by clients.
    ///
    /// `dir` is an older spelling of `folder` and is normalised to it.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "folder" | "dir" => Ok(NodeType::Folder),
            "file" => Ok(NodeType::File),
            _ => Err(DepotError::MalformedRequest("Invalid type".to_string())),
        }
    }

    /// Column value in the `files` table.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Folder => "folder",
            NodeType::File => "file",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for NodeType {
    type Error = DepotError;

    fn try_from(value: String) -> Result<Self> {
        match value.as_str() {
            "folder" => Ok(NodeType::Folder),
            "file" => Ok(NodeType::File),
            other => Err(DepotError::Database(format!("unknown node type: {other}"))),
        }
    }
}

/// A file or folder in a user's tree.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FileNode {
    /// Unique node ID.
    pub id: i64,
    /// Owning user ID. Never changes.
    pub user_id: i64,
    /// Display name.
    pub name: String,
    /// Folder or file.
    #[sqlx(try_from = "String")]
    pub node_type: NodeType,
    /// Whether anyone may read the content.
    pub is_public: bool,
    /// Parent folder ID, 0 for the tree root.
    pub parent_id: i64,
    /// Byte store key. Present exactly for files.
    pub content_key: Option<String>,
}

impl FileNode {
    /// Whether this node is a folder.
    pub fn is_folder(&self) -> bool {
        self.node_type == NodeType::Folder
    }

    /// MIME type guessed from the node name.
    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.name)
            .first_or_octet_stream()
            .to_string()
    }

    /// Whether thumbnails can be generated for this node.
    pub fn is_image(&self) -> bool {
        self.node_type == NodeType::File
            && mime_guess::from_path(&self.name)
                .first_raw()
                .is_some_and(|m| m.starts_with("image/"))
    }
}

/// Data for inserting a new node.
#[derive(Debug, Clone)]
pub struct NewNode {
    pub user_id: i64,
    pub name: String,
    pub node_type: NodeType,
    pub is_public: bool,
    pub parent_id: i64,
    pub content_key: Option<String>,
}

impl NewNode {
    /// A folder node.
    pub fn folder(user_id: i64, name: impl Into<String>, parent_id: i64) -> Self {
        Self {
            user_id,
            name: name.into(),
            node_type: NodeType::Folder,
            is_public: false,
            parent_id,
            content_key: None,
        }
    }

    /// A file node whose bytes live under `content_key`.
    pub fn file(
        user_id: i64,
        name: impl Into<String>,
        parent_id: i64,
        content_key: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            name: name.into(),
            node_type: NodeType::File,
            is_public: false,
            parent_id,
            content_key: Some(content_key.into()),
        }
    }

    /// Set the initial visibility.
    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, node_type: NodeType) -> FileNode {
        FileNode {
            id: 1,
            user_id: 1,
            name: name.to_string(),
            node_type,
            is_public: false,
            parent_id: 0,
            content_key: None,
        }
    }

    #[test]
    fn test_parse_node_type() {
        assert_eq!(NodeType::parse("folder").unwrap(), NodeType::Folder);
        assert_eq!(NodeType::parse("dir").unwrap(), NodeType::Folder);
        assert_eq!(NodeType::parse("file").unwrap(), NodeType::File);
        assert!(matches!(
            NodeType::parse("image"),
            Err(DepotError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_node_type_serde() {
        assert_eq!(serde_json::to_string(&NodeType::Folder).unwrap(), "\"folder\"");
        assert_eq!(NodeType::File.to_string(), "file");
    }

    #[test]
    fn test_is_image() {
        assert!(node("cat.png", NodeType::File).is_image());
        assert!(node("CAT.JPG", NodeType::File).is_image());
        assert!(!node("notes.txt", NodeType::File).is_image());
        assert!(!node("noext", NodeType::File).is_image());
        assert!(!node("photos.png", NodeType::Folder).is_image());
    }

    #[test]
    fn test_mime_type() {
        assert_eq!(node("a.txt", NodeType::File).mime_type(), "text/plain");
        assert_eq!(
            node("blob", NodeType::File).mime_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_new_node_builders() {
        let folder = NewNode::folder(1, "docs", 0);
        assert_eq!(folder.node_type, NodeType::Folder);
        assert!(folder.content_key.is_none());

        let file = NewNode::file(1, "a.txt", 3, "key").with_public(true);
        assert_eq!(file.content_key.as_deref(), Some("key"));
        assert!(file.is_public);
        assert_eq!(file.parent_id, 3);
    }
}
