use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use drive_client::DriveError;
use facebook_client::FacebookError;
use local_docs::DocsError;
use serde_json::{json, Value};
use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Every failure a handler can return. Rendered as `{"detail": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    /// The request body could not be read as JSON.
    #[error("{detail}")]
    Rejected { status: StatusCode, detail: String },

    #[error("{0}")]
    Config(String),

    #[error("{message}")]
    Upstream {
        status: Option<u16>,
        message: String,
        details: Value,
    },

    #[error(transparent)]
    Docs(#[from] DocsError),
}

impl ApiError {
    pub fn unexpected_upstream(message: impl Into<String>) -> Self {
        ApiError::Upstream {
            status: None,
            message: message.into(),
            details: Value::Null,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Rejected { status, .. } => *status,
            ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            ApiError::Docs(err) => match err {
                DocsError::PermissionDenied(_) => StatusCode::FORBIDDEN,
                DocsError::NotFound(_) => StatusCode::NOT_FOUND,
                DocsError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                DocsError::NotUtf8 => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                DocsError::Config(_) | DocsError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn detail(&self) -> Value {
        match self {
            ApiError::Upstream {
                message, details, ..
            } => {
                let mut detail = json!({ "message": message });
                if !is_empty(details) {
                    detail["details"] = details.clone();
                }
                detail
            }
            other => Value::String(other.to_string()),
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "Request failed");
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<FacebookError> for ApiError {
    fn from(err: FacebookError) -> Self {
        match err {
            FacebookError::Config(msg) => ApiError::Config(msg),
            FacebookError::Request {
                message,
                status,
                details,
            } => ApiError::Upstream {
                status,
                message,
                details,
            },
        }
    }
}

impl From<DriveError> for ApiError {
    fn from(err: DriveError) -> Self {
        match err {
            DriveError::Config(msg) => ApiError::Config(msg),
            DriveError::Request {
                message,
                status,
                details,
            } => ApiError::Upstream {
                status,
                message,
                details,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_uses_remote_error_status() {
        let err = ApiError::from(FacebookError::Request {
            message: "bad token".to_string(),
            status: Some(401),
            details: json!({"code": 190}),
        });
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            err.detail(),
            json!({"message": "bad token", "details": {"code": 190}})
        );
    }

    #[test]
    fn upstream_without_error_status_is_bad_gateway() {
        let err = ApiError::Upstream {
            status: Some(200),
            message: "not json".to_string(),
            details: Value::Null,
        };
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.detail(), json!({"message": "not json"}));

        assert_eq!(
            ApiError::unexpected_upstream("x").status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn config_errors_are_plain_strings() {
        let err = ApiError::from(DriveError::Config("missing key".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), json!("missing key"));
    }

    #[test]
    fn docs_errors_map_to_http_statuses() {
        let cases = [
            (DocsError::PermissionDenied("x".into()), StatusCode::FORBIDDEN),
            (DocsError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                DocsError::TooLarge { size: 2, limit: 1 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (DocsError::NotUtf8, StatusCode::UNSUPPORTED_MEDIA_TYPE),
            (DocsError::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
