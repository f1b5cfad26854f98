use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FacebookError>;

#[derive(Debug, Error)]
pub enum FacebookError {
    /// Missing or contradictory configuration; no request was sent.
    #[error("{0}")]
    Config(String),

    /// The Graph API call failed or answered with an error payload.
    #[error("{message}")]
    Request {
        message: String,
        status: Option<u16>,
        details: Value,
    },
}

impl FacebookError {
    pub(crate) fn request(message: impl Into<String>, status: Option<u16>) -> Self {
        FacebookError::Request {
            message: message.into(),
            status,
            details: Value::Null,
        }
    }
}

impl From<reqwest::Error> for FacebookError {
    fn from(err: reqwest::Error) -> Self {
        FacebookError::request(
            format!("Facebook API request failed: {err}"),
            err.status().map(|s| s.as_u16()),
        )
    }
}
