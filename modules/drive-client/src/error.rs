use serde_json::{json, Value};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DriveError>;

const DEFAULT_MESSAGE: &str = "Google Drive API request failed";

#[derive(Debug, Error)]
pub enum DriveError {
    /// Missing or unusable credentials; no Drive call was made.
    #[error("{0}")]
    Config(String),

    #[error("{message}")]
    Request {
        message: String,
        status: Option<u16>,
        details: Value,
    },
}

impl DriveError {
    /// Normalize an error response body from Google into a `Request` error.
    ///
    /// Drive answers `{"error": {"message": ...}}`; the OAuth token endpoint
    /// answers `{"error": "...", "error_description": ...}`.
    pub fn from_response(status: Option<u16>, body: &str) -> Self {
        let details: Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(_) if body.is_empty() => Value::Null,
            Err(_) => json!({ "raw": body }),
        };

        let message = match details.get("error") {
            Some(Value::Object(err)) => err.get("message").and_then(Value::as_str),
            _ => details.get("error_description").and_then(Value::as_str),
        }
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MESSAGE)
        .to_string();

        DriveError::Request {
            message,
            status,
            details,
        }
    }
}

impl From<reqwest::Error> for DriveError {
    fn from(err: reqwest::Error) -> Self {
        DriveError::Request {
            message: format!("{DEFAULT_MESSAGE}: {err}"),
            status: err.status().map(|s| s.as_u16()),
            details: Value::Null,
        }
    }
}

impl From<serde_json::Error> for DriveError {
    fn from(err: serde_json::Error) -> Self {
        DriveError::Request {
            message: format!("Google Drive API returned an unreadable response: {err}"),
            status: None,
            details: Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(err: DriveError) -> (String, Option<u16>, Value) {
        match err {
            DriveError::Request {
                message,
                status,
                details,
            } => (message, status, details),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn drive_error_object() {
        let body = r#"{"error": {"code": 404, "message": "File not found: abc."}}"#;
        let (message, status, details) = parts(DriveError::from_response(Some(404), body));
        assert_eq!(message, "File not found: abc.");
        assert_eq!(status, Some(404));
        assert_eq!(details["error"]["code"], 404);
    }

    #[test]
    fn oauth_error_description() {
        let body = r#"{"error": "invalid_grant", "error_description": "Invalid JWT Signature."}"#;
        let (message, _, _) = parts(DriveError::from_response(Some(400), body));
        assert_eq!(message, "Invalid JWT Signature.");
    }

    #[test]
    fn raw_text_body() {
        let (message, _, details) = parts(DriveError::from_response(Some(500), "oops"));
        assert_eq!(message, "Google Drive API request failed");
        assert_eq!(details, json!({"raw": "oops"}));
    }
}
