//! Request DTOs for the HTTP API.
//!
//! Every field is optional at the serde level so that an absent field
//! surfaces as the matching `Missing ...` error instead of a generic
//! deserialization failure.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

use crate::file::{NodeType, Upload};
use crate::{DepotError, Result};

/// User registration request.
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// File or folder upload request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    /// Number or numeric string; absent means the root.
    pub parent_id: Option<Value>,
    pub is_public: Option<bool>,
    /// Base64 content, files only.
    pub data: Option<String>,
}

/// Parse a `parentId` field. Absent, null, `0` and `"0"` are the root.
fn parse_parent_id(value: Option<&Value>) -> Result<i64> {
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n.as_i64().ok_or(DepotError::ParentNotFound),
        Some(Value::String(s)) if s.is_empty() => Ok(0),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| DepotError::ParentNotFound),
        Some(_) => Err(DepotError::ParentNotFound),
    }
}

impl CreateFileRequest {
    /// Validate the request into an [`Upload`].
    pub fn into_upload(self) -> Result<Upload> {
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .ok_or(DepotError::MissingField("name"))?;
        let node_type = self
            .node_type
            .filter(|t| !t.is_empty())
            .ok_or(DepotError::MissingField("type"))
            .and_then(|t| NodeType::parse(&t))?;

        let data = match node_type {
            NodeType::Folder => None,
            NodeType::File => {
                let encoded = self.data.ok_or(DepotError::MissingField("data"))?;
                let decoded = STANDARD
                    .decode(encoded.trim())
                    .map_err(|_| DepotError::MalformedRequest("Invalid data".to_string()))?;
                Some(decoded)
            }
        };

        Ok(Upload {
            name,
            node_type,
            parent_id: parse_parent_id(self.parent_id.as_ref())?,
            is_public: self.is_public.unwrap_or(false),
            data,
        })
    }
}

/// Query for `GET /files`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesQuery {
    pub parent_id: Option<String>,
    pub page: Option<String>,
}

impl ListFilesQuery {
    /// Requested parent, or `None` if it is not a valid ID.
    pub fn parent_id(&self) -> Option<i64> {
        match self.parent_id.as_deref().map(str::trim) {
            None | Some("") => Some(0),
            Some(s) => s.parse().ok(),
        }
    }

    /// Requested page, 0-based. Anything unparseable is the first page.
    pub fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// Query for `GET /files/:id/data`.
#[derive(Debug, Default, Deserialize)]
pub struct DataQuery {
    /// Thumbnail width.
    pub size: Option<String>,
}

impl DataQuery {
    /// Requested thumbnail width, if any.
    pub fn size(&self) -> Result<Option<u32>> {
        match self.size.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => s
                .parse()
                .map(Some)
                .map_err(|_| DepotError::MalformedRequest(format!("unsupported size {s}"))),
        }
    }
}
