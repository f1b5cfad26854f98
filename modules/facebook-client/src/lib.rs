pub mod error;
pub mod types;

pub use error::{FacebookError, Result};
pub use types::{FeedQuery, GraphObject, NewPost, DEFAULT_TARGET};

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";
const DEFAULT_API_VERSION: &str = "v19.0";

pub struct FacebookClient {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    access_token: Option<String>,
    timeout: Duration,
    default_fields: Vec<String>,
    default_feed_limit: u32,
    debug: bool,
}

impl FacebookClient {
    /// Create a client against the public Graph API. A missing token is only
    /// reported when a call is made.
    pub fn new(access_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            access_token,
            timeout: Duration::from_secs(10),
            default_fields: vec!["id".to_string(), "name".to_string()],
            default_feed_limit: 25,
            debug: false,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_version(mut self, version: &str) -> Self {
        self.api_version = version.trim_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default_fields(mut self, fields: Vec<String>) -> Self {
        self.default_fields = fields;
        self
    }

    pub fn with_default_feed_limit(mut self, limit: u32) -> Self {
        self.default_feed_limit = limit;
        self
    }

    /// Log every request and response body at debug level.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Fetch profile information for a user or page.
    pub async fn fetch_profile(&self, target_id: &str, fields: &[String]) -> Result<GraphObject> {
        let mut params = Vec::new();
        if let Some(fields) = self.field_list(fields) {
            params.push(("fields", fields));
        }
        self.request(Method::GET, target_id, &params, None).await
    }

    /// Fetch feed entries for a user or page.
    pub async fn get_feed(&self, query: &FeedQuery) -> Result<GraphObject> {
        let mut params = Vec::new();
        if let Some(fields) = self.field_list(&query.fields) {
            params.push(("fields", fields));
        }
        let limit = query.limit.unwrap_or(self.default_feed_limit);
        params.push(("limit", limit.to_string()));
        if let Some(since) = query.since {
            params.push(("since", since.timestamp().to_string()));
        }
        if let Some(until) = query.until {
            params.push(("until", until.timestamp().to_string()));
        }
        if let Some(ref before) = query.before {
            params.push(("before", before.clone()));
        }
        if let Some(ref after) = query.after {
            params.push(("after", after.clone()));
        }

        let path = format!("{}/feed", query.target_id);
        self.request(Method::GET, &path, &params, None).await
    }

    /// Create a post on a user or page feed. Scheduling is forwarded to the
    /// Graph API as `scheduled_publish_time` and requires `published = false`.
    pub async fn create_post(&self, post: &NewPost) -> Result<GraphObject> {
        if post.scheduled_publish_time.is_some() && post.published {
            return Err(FacebookError::Config(
                "Scheduled posts require `published` to be set to false.".to_string(),
            ));
        }

        let mut form = vec![
            ("message", post.message.clone()),
            ("published", post.published.to_string()),
        ];
        if let Some(ref link) = post.link {
            form.push(("link", link.clone()));
        }
        if let Some(at) = post.scheduled_publish_time {
            form.push(("scheduled_publish_time", at.timestamp().to_string()));
        }
        if let Some(ref privacy) = post.privacy {
            form.push(("privacy", privacy.to_string()));
        }

        let path = format!("{}/feed", post.target_id);
        self.request(Method::POST, &path, &[], Some(&form)).await
    }

    fn field_list(&self, requested: &[String]) -> Option<String> {
        let fields = if requested.is_empty() {
            &self.default_fields
        } else {
            requested
        };
        (!fields.is_empty()).then(|| fields.join(","))
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            self.api_version,
            path.trim_start_matches('/')
        )
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        form: Option<&[(&str, String)]>,
    ) -> Result<GraphObject> {
        let token = self.access_token.as_deref().ok_or_else(|| {
            FacebookError::Config(
                "FACEBOOK_ACCESS_TOKEN is not configured. Please update your .env file."
                    .to_string(),
            )
        })?;
        let url = self.url(path);

        if self.debug {
            tracing::debug!(%method, %url, ?params, ?form, "[facebook] request");
        }

        let mut builder = self
            .client
            .request(method, &url)
            .timeout(self.timeout)
            .query(params)
            .query(&[("access_token", token)]);
        if let Some(form) = form {
            builder = builder.form(form);
        }

        let resp = builder.send().await.map_err(|e| {
            if self.debug {
                tracing::debug!(error = %e, "[facebook] request failed");
            }
            FacebookError::from(e)
        })?;

        let status = resp.status();
        if self.debug {
            tracing::debug!(status = status.as_u16(), "[facebook] response");
        }

        let body = resp.text().await?;
        let payload: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(_) => {
                if self.debug {
                    tracing::debug!(%body, "[facebook] non-JSON response body");
                }
                return Err(FacebookError::request(
                    "Facebook API returned a non-JSON response",
                    Some(status.as_u16()),
                ));
            }
        };

        if !status.is_success() {
            let error = payload.get("error").filter(|e| !is_blank(e)).cloned();
            let message = error
                .as_ref()
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("Facebook API request failed")
                .to_string();
            let details = match error {
                Some(e) => e,
                None if payload.is_object() => payload,
                None => Value::Object(GraphObject::new()),
            };
            if self.debug {
                tracing::debug!(%message, %details, "[facebook] API responded with error");
            }
            return Err(FacebookError::Request {
                message,
                status: Some(status.as_u16()),
                details,
            });
        }

        if self.debug {
            tracing::debug!(%payload, "[facebook] API responded with payload");
        }
        match payload {
            Value::Object(map) => Ok(map),
            other => {
                let mut wrapped = GraphObject::new();
                wrapped.insert("data".to_string(), other);
                Ok(wrapped)
            }
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> FacebookClient {
        FacebookClient::new(Some("test-token".to_string())).with_base_url(&server.uri())
    }

    #[tokio::test]
    async fn profile_uses_default_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v19.0/me"))
            .and(query_param("fields", "id,name"))
            .and(query_param("access_token", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1", "name": "Me"})))
            .expect(1)
            .mount(&server)
            .await;

        let profile = client(&server).fetch_profile("me", &[]).await.unwrap();
        assert_eq!(profile["name"], "Me");
    }

    #[tokio::test]
    async fn profile_prefers_requested_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v19.0/page42"))
            .and(query_param("fields", "about,link"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"about": "x"})))
            .expect(1)
            .mount(&server)
            .await;

        let fields = vec!["about".to_string(), "link".to_string()];
        client(&server).fetch_profile("page42", &fields).await.unwrap();
    }

    #[tokio::test]
    async fn feed_forwards_paging_and_time_bounds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v19.0/me/feed"))
            .and(query_param("limit", "25"))
            .and(query_param("since", "1704067200"))
            .and(query_param("after", "cursor-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "p1"}],
                "paging": {"cursors": {"after": "cursor-2"}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = FeedQuery {
            since: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            after: Some("cursor-1".to_string()),
            ..FeedQuery::default()
        };
        let feed = client(&server).get_feed(&query).await.unwrap();
        assert_eq!(feed["data"][0]["id"], "p1");
    }

    #[tokio::test]
    async fn create_post_sends_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v19.0/me/feed"))
            .and(body_string_contains("message=hello"))
            .and(body_string_contains("published=false"))
            .and(body_string_contains("scheduled_publish_time=1704067200"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1_2"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut post = NewPost::new("me", "hello");
        post.published = false;
        post.scheduled_publish_time = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let result = client(&server).create_post(&post).await.unwrap();
        assert_eq!(result["id"], "1_2");
    }

    #[tokio::test]
    async fn scheduled_published_post_is_rejected_locally() {
        let server = MockServer::start().await;
        let mut post = NewPost::new("me", "hello");
        post.scheduled_publish_time = Some(Utc::now());

        let err = client(&server).create_post(&post).await.unwrap_err();
        assert!(matches!(err, FacebookError::Config(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_token_is_config_error() {
        let err = FacebookClient::new(None)
            .fetch_profile("me", &[])
            .await
            .unwrap_err();
        match err {
            FacebookError::Config(msg) => assert!(msg.contains("FACEBOOK_ACCESS_TOKEN")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn api_error_carries_status_and_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v19.0/me"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"message": "Invalid OAuth access token.", "code": 190}
            })))
            .mount(&server)
            .await;

        let err = client(&server).fetch_profile("me", &[]).await.unwrap_err();
        match err {
            FacebookError::Request {
                message,
                status,
                details,
            } => {
                assert_eq!(message, "Invalid OAuth access token.");
                assert_eq!(status, Some(400));
                assert_eq!(details["code"], 190);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_body_is_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let err = client(&server).fetch_profile("me", &[]).await.unwrap_err();
        match err {
            FacebookError::Request { message, status, .. } => {
                assert_eq!(message, "Facebook API returned a non-JSON response");
                assert_eq!(status, Some(502));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn string_error_is_kept_as_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "x",
                "trace": "abc"
            })))
            .mount(&server)
            .await;

        let err = client(&server).fetch_profile("me", &[]).await.unwrap_err();
        match err {
            FacebookError::Request {
                message,
                status,
                details,
            } => {
                assert_eq!(message, "Facebook API request failed");
                assert_eq!(status, Some(400));
                assert_eq!(details, json!("x"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_error_falls_back_to_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": {}, "oops": true})))
            .mount(&server)
            .await;

        let err = client(&server).fetch_profile("me", &[]).await.unwrap_err();
        match err {
            FacebookError::Request { details, .. } => {
                assert_eq!(details, json!({"error": {}, "oops": true}));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "1"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .with_timeout(Duration::from_millis(50))
            .fetch_profile("me", &[])
            .await
            .unwrap_err();
        match err {
            FacebookError::Request {
                message, status, ..
            } => {
                assert!(message.starts_with("Facebook API request failed: "), "{message}");
                assert_eq!(status, None);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        // Nothing listens on port 1.
        let err = FacebookClient::new(Some("test-token".to_string()))
            .with_base_url("http://127.0.0.1:1")
            .fetch_profile("me", &[])
            .await
            .unwrap_err();
        match err {
            FacebookError::Request {
                message, status, ..
            } => {
                assert!(message.starts_with("Facebook API request failed: "), "{message}");
                assert_eq!(status, None);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_object_payload_is_wrapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2])))
            .mount(&server)
            .await;

        let result = client(&server).fetch_profile("me", &[]).await.unwrap();
        assert_eq!(result["data"], json!([1, 2]));
    }
}
