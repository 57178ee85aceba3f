//! File tree handlers.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};

use crate::file::{Content, PAGE_SIZE};
use crate::web::dto::{CreateFileRequest, DataQuery, FileResponse, ListFilesQuery};
use crate::web::error::ApiError;
use crate::web::middleware::{AuthUser, OptionalAuthUser};

use super::AppState;

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters are dropped and quotes/backslashes replaced in the
/// plain `filename` parameter. Non-ASCII names also get an RFC 5987
/// `filename*` parameter.
fn content_disposition_header(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && sanitized == filename {
        return format!("inline; filename=\"{filename}\"");
    }

    let encoded = urlencoding::encode(filename);
    format!("inline; filename=\"{sanitized}\"; filename*=UTF-8''{encoded}")
}

fn content_response(content: Content) -> Result<Response<Body>, ApiError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content.node.mime_type())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&content.node.name),
        )
        .header(header::CONTENT_LENGTH, content.bytes.len())
        .body(Body::from(content.bytes))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal()
        })
}

/// POST /files - Create a folder or upload a file.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    payload: Result<Json<CreateFileRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<FileResponse>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let upload = req.into_upload()?;

    let node = state.files.upload(auth.user_id, upload).await?;
    Ok((StatusCode::CREATED, Json(node.into())))
}

/// GET /files/:id - Get one of the caller's nodes.
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(file_id): Path<String>,
) -> Result<Json<FileResponse>, ApiError> {
    let file_id = file_id.parse().map_err(|_| ApiError::not_found())?;
    let node = state.files.get_node(auth.user_id, file_id).await?;
    Ok(Json(node.into()))
}

/// GET /files?parentId=&page= - List one page of a folder's children.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<Vec<FileResponse>>, ApiError> {
    let Some(parent_id) = query.parent_id() else {
        return Ok(Json(Vec::new()));
    };

    let children = state.files.list_children(auth.user_id, parent_id).await?;
    let nodes = children.page(query.page(), PAGE_SIZE).await?;
    Ok(Json(nodes.into_iter().map(FileResponse::from).collect()))
}

async fn set_public(
    state: &AppState,
    auth: &AuthUser,
    file_id: &str,
    is_public: bool,
) -> Result<Json<FileResponse>, ApiError> {
    let file_id = file_id.parse().map_err(|_| ApiError::not_found())?;
    let node = state
        .files
        .set_public(auth.user_id, file_id, is_public)
        .await?;
    Ok(Json(node.into()))
}

/// PUT /files/:id/publish - Make a node public.
pub async fn publish_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(file_id): Path<String>,
) -> Result<Json<FileResponse>, ApiError> {
    set_public(&state, &auth, &file_id, true).await
}

/// PUT /files/:id/unpublish - Make a node private.
pub async fn unpublish_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(file_id): Path<String>,
) -> Result<Json<FileResponse>, ApiError> {
    set_public(&state, &auth, &file_id, false).await
}

/// GET /files/:id/data?size= - Download content or a thumbnail.
///
/// Public files need no token. Private files need the owner's token.
pub async fn get_file_data(
    State(state): State<Arc<AppState>>,
    OptionalAuthUser(requester): OptionalAuthUser,
    Path(file_id): Path<String>,
    Query(query): Query<DataQuery>,
) -> Result<Response<Body>, ApiError> {
    let file_id = file_id.parse().map_err(|_| ApiError::not_found())?;

    let content = match query.size()? {
        Some(width) => state.files.read_thumbnail(requester, file_id, width).await?,
        None => state.files.read_content(requester, file_id).await?,
    };
    content_response(content)
}
