pub mod auth;
pub mod error;
pub mod types;

pub use auth::{ServiceAccountKey, TokenSource};
pub use error::{DriveError, Result};
pub use types::{DownloadedFile, DriveObject, ListFilesQuery, NewFile};

use std::path::PathBuf;

use reqwest::header::{CONTENT_RANGE, CONTENT_TYPE, RANGE};
use reqwest::{Response, StatusCode};
use serde_json::json;
use url::Url;

use types::{DEFAULT_LIST_FIELDS, DEFAULT_MIME_TYPE, DOWNLOAD_METADATA_FIELDS, UPLOAD_RESULT_FIELDS};

const BASE_URL: &str = "https://www.googleapis.com";
const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

pub struct DriveClient {
    http: reqwest::Client,
    base_url: String,
    auth: TokenSource,
    chunk_size: usize,
}

impl DriveClient {
    /// Credentials are read from `service_account_file` on first use.
    pub fn new(service_account_file: Option<PathBuf>) -> Self {
        let http = reqwest::Client::new();
        Self {
            auth: TokenSource::new(http.clone(), service_account_file),
            http,
            base_url: BASE_URL.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.auth.scopes = scopes;
        self
    }

    /// Impersonate a user through domain-wide delegation.
    pub fn with_delegated_user(mut self, user: Option<String>) -> Self {
        self.auth.subject = user;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// `{base_url}/` followed by `segments`, each percent-encoded as a single
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            DriveError::Config(format!("Invalid Google Drive base URL {:?}: {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                DriveError::Config(format!(
                    "Google Drive base URL {:?} cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// List files visible to the service account across all drives.
    pub async fn list_files(&self, query: &ListFilesQuery) -> Result<DriveObject> {
        let token = self.auth.access_token().await?;

        let mut params: Vec<(&str, String)> = vec![
            ("pageSize", query.page_size.to_string()),
            ("includeItemsFromAllDrives", "true".to_string()),
            ("supportsAllDrives", "true".to_string()),
            ("corpora", "allDrives".to_string()),
            (
                "fields",
                query
                    .fields
                    .clone()
                    .unwrap_or_else(|| DEFAULT_LIST_FIELDS.to_string()),
            ),
        ];
        if let Some(q) = query.effective_query() {
            params.push(("q", q));
        }
        if let Some(ref page_token) = query.page_token {
            params.push(("pageToken", page_token.clone()));
        }
        if let Some(ref order_by) = query.order_by {
            params.push(("orderBy", order_by.clone()));
        }
        if let Some(ref spaces) = query.spaces {
            params.push(("spaces", spaces.clone()));
        }

        let url = self.endpoint(&["drive", "v3", "files"])?;
        let resp = self
            .http
            .get(url)
            .bearer_auth(&token)
            .query(&params)
            .send()
            .await?;
        let listing = json_object(resp).await?;

        tracing::debug!(
            count = listing.get("files").and_then(|f| f.as_array()).map(|f| f.len()),
            "Listed Drive files"
        );
        Ok(listing)
    }

    /// Download a file's metadata and content.
    pub async fn download_file(&self, file_id: &str) -> Result<DownloadedFile> {
        let token = self.auth.access_token().await?;
        let url = self.endpoint(&["drive", "v3", "files", file_id])?;

        let resp = self
            .http
            .get(url.clone())
            .bearer_auth(&token)
            .query(&[
                ("fields", DOWNLOAD_METADATA_FIELDS),
                ("supportsAllDrives", "true"),
            ])
            .send()
            .await?;
        let metadata = json_object(resp).await?;

        let content = self.download_media(&url, &token).await?;
        tracing::info!(file_id, bytes = content.len(), "Downloaded Drive file");

        Ok(DownloadedFile { metadata, content })
    }

    /// Fetch media bytes in `chunk_size` ranges until the whole object is read.
    async fn download_media(&self, url: &Url, token: &str) -> Result<Vec<u8>> {
        let mut content: Vec<u8> = Vec::new();
        let mut total: Option<usize> = None;

        loop {
            let start = content.len();
            let end = start.saturating_add(self.chunk_size - 1);
            let resp = self
                .http
                .get(url.clone())
                .bearer_auth(token)
                .query(&[("alt", "media"), ("supportsAllDrives", "true")])
                .header(RANGE, format!("bytes={start}-{end}"))
                .send()
                .await?;

            let status = resp.status();
            match status {
                StatusCode::OK => {
                    // Server ignored the range and sent everything.
                    return Ok(resp.bytes().await?.to_vec());
                }
                StatusCode::PARTIAL_CONTENT => {
                    total = resp
                        .headers()
                        .get(CONTENT_RANGE)
                        .and_then(|v| v.to_str().ok())
                        .and_then(content_range_total)
                        .or(total);
                    let chunk = resp.bytes().await?;
                    let received = chunk.len();
                    content.extend_from_slice(&chunk);

                    tracing::debug!(start, received, ?total, "Downloaded Drive chunk");
                    let complete = match total {
                        Some(total) => content.len() >= total,
                        None => received < self.chunk_size,
                    };
                    if complete || received == 0 {
                        return Ok(content);
                    }
                }
                // Empty file, or a size that is an exact multiple of the chunk
                // size when the server never reported a total.
                StatusCode::RANGE_NOT_SATISFIABLE if start == 0 || total.is_none() => {
                    return Ok(content)
                }
                _ => {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(DriveError::from_response(Some(status.as_u16()), &body));
                }
            }
        }
    }

    /// Upload a new file in a single multipart request, optionally sharing it publicly.
    pub async fn upload_file(&self, file: &NewFile) -> Result<DriveObject> {
        let token = self.auth.access_token().await?;

        let mut metadata = json!({ "name": file.name });
        if !file.parents.is_empty() {
            metadata["parents"] = json!(file.parents);
        }
        let mime_type = file.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE);
        let boundary = format!("gateway-{}", uuid::Uuid::new_v4().simple());
        let body = multipart_related(&boundary, &metadata.to_string(), mime_type, &file.data);

        let url = self.endpoint(&["upload", "drive", "v3", "files"])?;
        let resp = self
            .http
            .post(url)
            .bearer_auth(&token)
            .query(&[
                ("uploadType", "multipart"),
                ("supportsAllDrives", "true"),
                ("fields", UPLOAD_RESULT_FIELDS),
            ])
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?;
        let created = json_object(resp).await?;

        let file_id = created
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| DriveError::Request {
                message: "Google Drive API returned an upload response without an id".to_string(),
                status: None,
                details: serde_json::Value::Object(created.clone()),
            })?;
        tracing::info!(file_id, name = %file.name, bytes = file.data.len(), "Uploaded Drive file");

        if file.make_public {
            let url = self.endpoint(&["drive", "v3", "files", file_id, "permissions"])?;
            let resp = self
                .http
                .post(url)
                .bearer_auth(&token)
                .query(&[("fields", "id")])
                .json(&json!({ "role": "reader", "type": "anyone" }))
                .send()
                .await?;
            json_object(resp).await?;
            tracing::info!(file_id, "Granted public read access");
        }

        Ok(created)
    }
}

async fn json_object(resp: Response) -> Result<DriveObject> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(DriveError::from_response(Some(status.as_u16()), &body));
    }
    Ok(serde_json::from_str(&body)?)
}

/// Parse the total size out of `bytes 0-99/1234`.
fn content_range_total(header: &str) -> Option<usize> {
    header.rsplit('/').next()?.trim().parse().ok()
}

fn multipart_related(boundary: &str, metadata: &str, mime_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + metadata.len() + 256);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("--{boundary}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
