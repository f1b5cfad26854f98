pub mod error;

pub use error::{DocsError, Result};

use std::cmp::Ordering;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

pub const DEFAULT_MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocEntry {
    pub name: String,
    /// Path relative to the documentation root.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// A documentation tree rooted at `DOCS_ROOT`. Every path handed in is
/// relative to the root and must stay inside it.
#[derive(Debug, Clone)]
pub struct LocalDocs {
    root: Option<PathBuf>,
    max_file_bytes: u64,
}

impl LocalDocs {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    /// The canonical root directory.
    pub async fn resolve_root(&self) -> Result<PathBuf> {
        let configured = self.root.as_deref().ok_or_else(|| {
            DocsError::Config("DOCS_ROOT is not configured in the environment.".to_string())
        })?;
        let expanded = expand_home(configured);

        let root = match tokio::fs::canonicalize(&expanded).await {
            Ok(root) => root,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DocsError::NotFound(format!(
                    "DOCS_ROOT does not exist: {}",
                    expanded.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        if !tokio::fs::metadata(&root).await?.is_dir() {
            return Err(DocsError::Config(format!(
                "DOCS_ROOT is not a directory: {}",
                root.display()
            )));
        }
        Ok(root)
    }

    /// Resolve `relative` under the root, refusing anything that lands outside it.
    pub async fn resolve_path(&self, relative: &str) -> Result<PathBuf> {
        let root = self.resolve_root().await?;
        self.resolve_under(&root, relative).await
    }

    async fn resolve_under(&self, root: &Path, relative: &str) -> Result<PathBuf> {
        let joined = root.join(relative);
        let target = match tokio::fs::canonicalize(&joined).await {
            Ok(resolved) => resolved,
            Err(e) if e.kind() == ErrorKind::NotFound => normalize_lexically(&joined),
            Err(e) => return Err(e.into()),
        };

        if !target.starts_with(root) {
            tracing::warn!(requested = relative, "Rejected path outside DOCS_ROOT");
            return Err(DocsError::PermissionDenied(
                "Requested path escapes DOCS_ROOT.".to_string(),
            ));
        }
        Ok(target)
    }

    /// List visible files and folders in a directory, sorted case-insensitively.
    pub async fn list_entries(&self, relative: &str) -> Result<Vec<DocEntry>> {
        let root = self.resolve_root().await?;
        let directory = self.resolve_under(&root, relative).await?;

        let metadata = match tokio::fs::metadata(&directory).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DocsError::NotFound("Requested path not found.".to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_dir() {
            return Err(DocsError::PermissionDenied(
                "Requested path is not a directory.".to_string(),
            ));
        }

        let mut entries = Vec::new();
        let mut reader = tokio::fs::read_dir(&directory).await?;
        while let Some(child) = reader.next_entry().await? {
            let name = child.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let child_path = child.path();
            let is_dir = match tokio::fs::metadata(&child_path).await {
                Ok(m) => m.is_dir(),
                Err(_) => child.file_type().await?.is_dir(),
            };
            let path = child_path
                .strip_prefix(&root)
                .unwrap_or(&child_path)
                .to_string_lossy()
                .into_owned();
            entries.push(DocEntry {
                name,
                path,
                kind: if is_dir {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
            });
        }
        entries.sort_by(|a, b| compare_names(&a.name, &b.name));

        tracing::debug!(path = relative, count = entries.len(), "Listed documentation entries");
        Ok(entries)
    }

    /// Read a UTF-8 text file, refusing files above `max_bytes` (or the configured default).
    pub async fn read_file(&self, relative: &str, max_bytes: Option<u64>) -> Result<String> {
        let path = self.resolve_path(relative).await?;

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(DocsError::NotFound("File not found.".to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DocsError::NotFound("File not found.".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let limit = max_bytes.unwrap_or(self.max_file_bytes);
        if metadata.len() > limit {
            return Err(DocsError::TooLarge {
                size: metadata.len(),
                limit,
            });
        }

        let bytes = tokio::fs::read(&path).await?;
        String::from_utf8(bytes).map_err(|_| DocsError::NotUtf8)
    }
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
