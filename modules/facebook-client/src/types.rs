use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// JSON object returned by the Graph API, passed through untouched.
pub type GraphObject = Map<String, Value>;

pub const DEFAULT_TARGET: &str = "me";

/// Parameters for reading a profile or page feed.
#[derive(Debug, Clone)]
pub struct FeedQuery {
    pub target_id: String,
    pub limit: Option<u32>,
    pub fields: Vec<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            target_id: DEFAULT_TARGET.to_string(),
            limit: None,
            fields: Vec::new(),
            since: None,
            until: None,
            before: None,
            after: None,
        }
    }
}

/// A post to publish (or schedule) on a user or page feed.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub target_id: String,
    pub message: String,
    pub link: Option<String>,
    pub published: bool,
    pub scheduled_publish_time: Option<DateTime<Utc>>,
    pub privacy: Option<Value>,
}

impl NewPost {
    pub fn new(target_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            message: message.into(),
            link: None,
            published: true,
            scheduled_publish_time: None,
            privacy: None,
        }
    }
}
