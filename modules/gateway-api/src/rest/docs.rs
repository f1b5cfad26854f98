use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use local_docs::DocEntry;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListRequest {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub path: String,
    pub entries: Vec<DocEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ReadRequest {
    pub path: String,
    #[serde(default)]
    pub max_bytes: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ReadResponse {
    pub path: String,
    pub content: String,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ListRequest>, JsonRejection>,
) -> ApiResult<Json<ListResponse>> {
    let Json(req) = body?;
    let entries = state.docs.list_entries(&req.path).await?;
    Ok(Json(ListResponse {
        path: req.path,
        entries,
    }))
}

pub async fn read(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ReadRequest>, JsonRejection>,
) -> ApiResult<Json<ReadResponse>> {
    let Json(req) = body?;
    if req.max_bytes == Some(0) {
        return Err(ApiError::Validation("`max_bytes` must be positive".to_string()));
    }

    let content = state.docs.read_file(&req.path, req.max_bytes).await?;
    Ok(Json(ReadResponse {
        path: req.path,
        content,
    }))
}
