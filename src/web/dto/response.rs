//! Response DTOs for the HTTP API.

use serde::Serialize;

use crate::db::User;
use crate::file::{FileNode, NodeType};

/// `GET /status` response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Token store liveness.
    pub redis: bool,
    /// Metadata store liveness.
    pub db: bool,
}

/// `GET /stats` response.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub users: i64,
    pub files: i64,
}

/// A user without credentials.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// `GET /connect` response.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// A file tree node as returned to clients.
///
/// The content key is internal and never exposed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub is_public: bool,
    pub parent_id: i64,
}

impl From<FileNode> for FileResponse {
    fn from(node: FileNode) -> Self {
        Self {
            id: node.id,
            user_id: node.user_id,
            name: node.name,
            node_type: node.node_type,
            is_public: node.is_public,
            parent_id: node.parent_id,
        }
    }
}
