use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use drive_client::{DriveObject, ListFilesQuery, NewFile};

use super::{require_non_empty, require_range};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

fn default_page_size() -> u32 {
    20
}

fn default_spaces() -> Option<String> {
    Some("drive".to_string())
}

#[derive(Debug, Deserialize)]
pub struct ListFilesRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub page_token: Option<String>,
    #[serde(default)]
    pub fields: Option<String>,
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default = "default_spaces")]
    pub spaces: Option<String>,
    #[serde(default)]
    pub include_trashed: bool,
}

#[derive(Debug, Serialize)]
pub struct ListFilesResponse {
    pub files: Vec<Value>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    pub file_id: String,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub file_id: String,
    pub name: Option<String>,
    pub mime_type: Option<String>,
    pub size: Option<String>,
    pub md5_checksum: Option<String>,
    pub content_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub name: String,
    pub content_base64: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub parents: Option<Vec<String>>,
    #[serde(default)]
    pub make_public: bool,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file: DriveObject,
}

/// Decode standard base64, tolerating line breaks and other whitespace.
fn decode_content(encoded: &str) -> ApiResult<Vec<u8>> {
    let compact: String = encoded.split_whitespace().collect();
    STANDARD
        .decode(compact)
        .map_err(|e| ApiError::Validation(format!("`content_base64` is not valid base64: {e}")))
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ListFilesRequest>, JsonRejection>,
) -> ApiResult<Json<ListFilesResponse>> {
    let Json(req) = body?;
    require_range("page_size", req.page_size, 1, 1000)?;

    let query = ListFilesQuery {
        query: req.query,
        page_size: req.page_size,
        page_token: req.page_token,
        fields: req.fields,
        order_by: req.order_by,
        spaces: req.spaces,
        include_trashed: req.include_trashed,
    };
    let mut listing = state.drive.list_files(&query).await?;

    let files = match listing.remove("files") {
        Some(Value::Array(files)) => files,
        _ => Vec::new(),
    };
    let next_page_token = listing
        .get("nextPageToken")
        .and_then(Value::as_str)
        .map(String::from);
    Ok(Json(ListFilesResponse {
        files,
        next_page_token,
    }))
}

pub async fn download(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DownloadRequest>, JsonRejection>,
) -> ApiResult<Json<DownloadResponse>> {
    let Json(req) = body?;
    require_non_empty("file_id", &req.file_id)?;

    let file = state.drive.download_file(&req.file_id).await?;
    Ok(Json(DownloadResponse {
        file_id: file.field("id").unwrap_or(req.file_id),
        name: file.field("name"),
        mime_type: file.field("mimeType"),
        size: file.field("size"),
        md5_checksum: file.field("md5Checksum"),
        content_base64: STANDARD.encode(&file.content),
    }))
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UploadRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let Json(req) = body?;
    require_non_empty("name", &req.name)?;
    let data = decode_content(&req.content_base64)?;

    let file = state
        .drive
        .upload_file(&NewFile {
            name: req.name,
            data,
            mime_type: req.mime_type,
            parents: req.parents.unwrap_or_default(),
            make_public: req.make_public,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(UploadResponse { file })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_defaults() {
        let req: ListFilesRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.page_size, 20);
        assert_eq!(req.spaces.as_deref(), Some("drive"));
        assert!(!req.include_trashed);
    }

    #[test]
    fn decodes_wrapped_base64() {
        assert_eq!(decode_content("aGVs\nbG8=").unwrap(), b"hello");
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(matches!(
            decode_content("not base64!"),
            Err(ApiError::Validation(_))
        ));
    }
}
