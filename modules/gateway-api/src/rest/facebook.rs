use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use facebook_client::{FeedQuery, GraphObject, NewPost, DEFAULT_TARGET};
use gateway_common::time;

use super::{require_non_empty, require_range};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Graph API cap on post body length.
const MAX_MESSAGE_CHARS: usize = 63206;

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}

fn default_true() -> bool {
    true
}

// --- Request and response bodies ---

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    #[serde(default = "default_target")]
    pub target_id: String,
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: GraphObject,
}

#[derive(Debug, Deserialize)]
pub struct FeedRequest {
    #[serde(default = "default_target")]
    pub target_id: String,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub fields: Option<Vec<String>>,
    #[serde(default, with = "time::option")]
    pub since: Option<DateTime<Utc>>,
    #[serde(default, with = "time::option")]
    pub until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub after: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub posts: Vec<Value>,
    pub paging: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default = "default_target")]
    pub target_id: String,
    pub message: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default = "default_true")]
    pub published: bool,
    #[serde(default, with = "time::option")]
    pub scheduled_publish_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub privacy: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Serialize)]
pub struct CreatePostResponse {
    pub id: String,
    pub raw: GraphObject,
}

impl FeedRequest {
    fn validate(&self) -> ApiResult<()> {
        require_non_empty("target_id", &self.target_id)?;
        if let Some(limit) = self.limit {
            require_range("limit", limit, 1, 100)?;
        }
        Ok(())
    }
}

impl CreatePostRequest {
    fn validate(&self) -> ApiResult<()> {
        require_non_empty("target_id", &self.target_id)?;
        require_range("message length", self.message.chars().count(), 1, MAX_MESSAGE_CHARS)?;
        if let Some(ref link) = self.link {
            let parsed = url::Url::parse(link)
                .map_err(|_| ApiError::Validation("`link` must be a valid URL".to_string()))?;
            if !matches!(parsed.scheme(), "http" | "https") || !parsed.has_host() {
                return Err(ApiError::Validation(
                    "`link` must be an http or https URL".to_string(),
                ));
            }
        }
        if self.scheduled_publish_time.is_some() && self.published {
            return Err(ApiError::Validation(
                "Scheduled posts require `published` to be set to false.".to_string(),
            ));
        }
        Ok(())
    }
}

// --- Handlers ---

pub async fn profile(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ProfileRequest>, JsonRejection>,
) -> ApiResult<Json<ProfileResponse>> {
    let Json(req) = body?;
    require_non_empty("target_id", &req.target_id)?;

    let fields = req.fields.unwrap_or_default();
    let profile = state.facebook.fetch_profile(&req.target_id, &fields).await?;
    Ok(Json(ProfileResponse { profile }))
}

pub async fn feed(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FeedRequest>, JsonRejection>,
) -> ApiResult<Json<FeedResponse>> {
    let Json(req) = body?;
    req.validate()?;

    let query = FeedQuery {
        target_id: req.target_id,
        limit: req.limit,
        fields: req.fields.unwrap_or_default(),
        since: req.since,
        until: req.until,
        before: req.before,
        after: req.after,
    };
    let mut feed = state.facebook.get_feed(&query).await?;

    let posts = match feed.remove("data") {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    let paging = feed.remove("paging").filter(|p| !p.is_null());
    Ok(Json(FeedResponse { posts, paging }))
}

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreatePostRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatePostResponse>)> {
    let Json(req) = body?;
    req.validate()?;

    let post = NewPost {
        target_id: req.target_id,
        message: req.message,
        link: req.link,
        published: req.published,
        scheduled_publish_time: req.scheduled_publish_time,
        privacy: req.privacy.map(Value::Object),
    };
    let raw = state.facebook.create_post(&post).await?;

    let id = raw
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .ok_or_else(|| {
            ApiError::unexpected_upstream("Facebook API returned an unexpected response.")
        })?;

    tracing::info!(post_id = %id, target_id = %post.target_id, "Created Facebook post");
    Ok((StatusCode::CREATED, Json(CreatePostResponse { id, raw })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(json: &str) -> CreatePostRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn post_defaults() {
        let req = post(r#"{"message": "hi"}"#);
        assert_eq!(req.target_id, "me");
        assert!(req.published);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn empty_and_oversized_messages_are_rejected() {
        assert!(post(r#"{"message": ""}"#).validate().is_err());
        let long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        let req = CreatePostRequest {
            message: long,
            ..post(r#"{"message": "hi"}"#)
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn link_must_be_http() {
        assert!(post(r#"{"message": "hi", "link": "https://example.com/a"}"#)
            .validate()
            .is_ok());
        assert!(post(r#"{"message": "hi", "link": "ftp://example.com"}"#)
            .validate()
            .is_err());
        assert!(post(r#"{"message": "hi", "link": "example.com"}"#)
            .validate()
            .is_err());
    }

    #[test]
    fn scheduling_requires_unpublished() {
        let req = post(r#"{"message": "hi", "scheduled_publish_time": "2030-01-01T00:00:00"}"#);
        assert!(req.validate().is_err());
        let req = post(
            r#"{"message": "hi", "published": false, "scheduled_publish_time": "2030-01-01T00:00:00"}"#,
        );
        assert!(req.validate().is_ok());
    }

    #[test]
    fn feed_limit_bounds() {
        let req: FeedRequest = serde_json::from_str(r#"{"limit": 0}"#).unwrap();
        assert!(req.validate().is_err());
        let req: FeedRequest = serde_json::from_str(r#"{"limit": 100}"#).unwrap();
        assert!(req.validate().is_ok());
    }
}
