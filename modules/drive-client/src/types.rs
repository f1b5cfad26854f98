use serde_json::{Map, Value};

/// Drive resource JSON (file metadata, listings, permissions), passed through untouched.
pub type DriveObject = Map<String, Value>;

pub const DEFAULT_LIST_FIELDS: &str =
    "nextPageToken, files(id, name, mimeType, modifiedTime, parents, size)";
pub const DOWNLOAD_METADATA_FIELDS: &str = "id, name, mimeType, size, modifiedTime, md5Checksum";
pub const UPLOAD_RESULT_FIELDS: &str = "id, name, mimeType, webViewLink, webContentLink, parents";
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct ListFilesQuery {
    /// Drive search expression, e.g. `name contains 'report'`.
    pub query: Option<String>,
    pub page_size: u32,
    pub page_token: Option<String>,
    pub fields: Option<String>,
    pub order_by: Option<String>,
    pub spaces: Option<String>,
    pub include_trashed: bool,
}

impl Default for ListFilesQuery {
    fn default() -> Self {
        Self {
            query: None,
            page_size: 20,
            page_token: None,
            fields: None,
            order_by: None,
            spaces: Some("drive".to_string()),
            include_trashed: false,
        }
    }
}

impl ListFilesQuery {
    /// The `q` sent to Drive: the caller's query, narrowed to untrashed items
    /// unless trash was asked for.
    pub fn effective_query(&self) -> Option<String> {
        let base = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty());
        match (base, self.include_trashed) {
            (Some(q), true) => Some(q.to_string()),
            (Some(q), false) => Some(format!("{q} and trashed = false")),
            (None, true) => None,
            (None, false) => Some("trashed = false".to_string()),
        }
    }
}

/// A downloaded file: Drive metadata plus the raw bytes.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub metadata: DriveObject,
    pub content: Vec<u8>,
}

impl DownloadedFile {
    pub fn field(&self, name: &str) -> Option<String> {
        match self.metadata.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub data: Vec<u8>,
    pub mime_type: Option<String>,
    pub parents: Vec<String>,
    /// Grant `anyone` read access after upload.
    pub make_public: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn untrashed_filter_is_appended() {
        let query = ListFilesQuery {
            query: Some("name contains 'report'".to_string()),
            ..ListFilesQuery::default()
        };
        assert_eq!(
            query.effective_query().as_deref(),
            Some("name contains 'report' and trashed = false")
        );
    }

    #[test]
    fn untrashed_filter_alone() {
        assert_eq!(
            ListFilesQuery::default().effective_query().as_deref(),
            Some("trashed = false")
        );
    }

    #[test]
    fn trash_included_leaves_query_untouched() {
        let query = ListFilesQuery {
            include_trashed: true,
            ..ListFilesQuery::default()
        };
        assert_eq!(query.effective_query(), None);

        let query = ListFilesQuery {
            query: Some("starred = true".to_string()),
            include_trashed: true,
            ..ListFilesQuery::default()
        };
        assert_eq!(query.effective_query().as_deref(), Some("starred = true"));
    }

    #[test]
    fn metadata_fields_stringify() {
        let file = DownloadedFile {
            metadata: json!({"name": "a.txt", "size": 12, "md5Checksum": null})
                .as_object()
                .cloned()
                .unwrap(),
            content: Vec::new(),
        };
        assert_eq!(file.field("name").as_deref(), Some("a.txt"));
        assert_eq!(file.field("size").as_deref(), Some("12"));
        assert_eq!(file.field("md5Checksum"), None);
        assert_eq!(file.field("mimeType"), None);
    }
}
