pub mod docs;
pub mod drive;
pub mod facebook;

use axum::response::Json;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn landing() -> &'static str {
    "Personal gateway ready."
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// --- Validation helpers ---

fn require_non_empty(field: &str, value: &str) -> ApiResult<()> {
    if value.is_empty() {
        return Err(ApiError::Validation(format!("`{field}` must not be empty")));
    }
    Ok(())
}

fn require_range<T>(field: &str, value: T, min: T, max: T) -> ApiResult<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(ApiError::Validation(format!(
            "`{field}` must be between {min} and {max}"
        )));
    }
    Ok(())
}
