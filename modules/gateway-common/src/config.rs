use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

const DEFAULT_FACEBOOK_BASE_URL: &str = "https://graph.facebook.com";
const DEFAULT_DRIVE_BASE_URL: &str = "https://www.googleapis.com";
const DEFAULT_DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;
const DEFAULT_DOCS_MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Credentials are optional at load time; the endpoints that need them
/// report a configuration error per request instead.
#[derive(Debug, Clone)]
pub struct Config {
    // Web server
    pub host: String,
    pub port: u16,

    // Facebook Graph API
    pub facebook_access_token: Option<String>,
    pub facebook_graph_api_version: String,
    pub facebook_base_url: String,
    pub facebook_timeout: Duration,
    pub facebook_default_fields: Vec<String>,
    pub facebook_default_feed_limit: u32,
    pub facebook_enable_debug: bool,

    // Google Drive
    pub google_drive_service_account_file: Option<PathBuf>,
    pub google_drive_delegated_user: Option<String>,
    pub google_drive_scopes: Vec<String>,
    pub google_drive_download_chunk_size: usize,
    pub google_drive_base_url: String,

    // Local documentation
    pub docs_root: Option<PathBuf>,
    pub docs_max_file_bytes: u64,

    // Unmanaged scratch directory, created at startup
    pub cache_dir: PathBuf,
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let facebook_timeout: u64 = parse_or(&var, "FACEBOOK_TIMEOUT", 10)?;
        if facebook_timeout == 0 {
            bail!("FACEBOOK_TIMEOUT must be a positive integer");
        }

        let facebook_default_feed_limit: u32 = parse_or(&var, "FACEBOOK_DEFAULT_FEED_LIMIT", 25)?;
        if !(1..=100).contains(&facebook_default_feed_limit) {
            bail!("FACEBOOK_DEFAULT_FEED_LIMIT must be between 1 and 100");
        }

        let google_drive_download_chunk_size: usize =
            parse_or(&var, "GOOGLE_DRIVE_DOWNLOAD_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?;
        if google_drive_download_chunk_size == 0 {
            bail!("GOOGLE_DRIVE_DOWNLOAD_CHUNK_SIZE must be positive");
        }

        let docs_max_file_bytes: u64 =
            parse_or(&var, "DOCS_MAX_FILE_BYTES", DEFAULT_DOCS_MAX_FILE_BYTES)?;
        if docs_max_file_bytes == 0 {
            bail!("DOCS_MAX_FILE_BYTES must be positive");
        }

        let facebook_enable_debug = match var("FACEBOOK_ENABLE_DEBUG") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| anyhow!("FACEBOOK_ENABLE_DEBUG must be a boolean, got {raw:?}"))?,
            None => false,
        };

        let facebook_base_url = http_url(
            "FACEBOOK_BASE_URL",
            var("FACEBOOK_BASE_URL").unwrap_or_else(|| DEFAULT_FACEBOOK_BASE_URL.to_string()),
        )?;
        let google_drive_base_url = http_url(
            "GOOGLE_DRIVE_BASE_URL",
            var("GOOGLE_DRIVE_BASE_URL").unwrap_or_else(|| DEFAULT_DRIVE_BASE_URL.to_string()),
        )?;

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&var, "PORT", 8000)?,
            facebook_access_token: var("FACEBOOK_ACCESS_TOKEN"),
            facebook_graph_api_version: var("FACEBOOK_GRAPH_API_VERSION")
                .unwrap_or_else(|| "v19.0".to_string()),
            facebook_base_url,
            facebook_timeout: Duration::from_secs(facebook_timeout),
            facebook_default_fields: var("FACEBOOK_DEFAULT_FIELDS")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|| vec!["id".to_string(), "name".to_string()]),
            facebook_default_feed_limit,
            facebook_enable_debug,
            google_drive_service_account_file: var("GOOGLE_DRIVE_SERVICE_ACCOUNT_FILE")
                .map(PathBuf::from),
            google_drive_delegated_user: var("GOOGLE_DRIVE_DELEGATED_USER"),
            google_drive_scopes: var("GOOGLE_DRIVE_SCOPES")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|| vec![DEFAULT_DRIVE_SCOPE.to_string()]),
            google_drive_download_chunk_size,
            google_drive_base_url,
            docs_root: var("DOCS_ROOT").map(PathBuf::from),
            docs_max_file_bytes,
            cache_dir: var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".mcp_cache")),
        })
    }

    /// Log the loaded configuration with secrets reduced to a short preview.
    pub fn log_summary(&self) {
        fn preview(val: &str) -> String {
            let n = val.char_indices().nth(5).map(|(i, _)| i).unwrap_or(val.len());
            format!("{}...({} chars)", &val[..n], val.chars().count())
        }
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => preview(v),
                _ => "<not set>".to_string(),
            }
        }
        fn path_opt(val: &Option<PathBuf>) -> String {
            val.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<not set>".to_string())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  FACEBOOK_ACCESS_TOKEN: {}", preview_opt(&self.facebook_access_token));
        tracing::info!(
            "  FACEBOOK_GRAPH_API: {}/{}",
            self.facebook_base_url,
            self.facebook_graph_api_version
        );
        tracing::info!(
            "  GOOGLE_DRIVE_SERVICE_ACCOUNT_FILE: {}",
            path_opt(&self.google_drive_service_account_file)
        );
        tracing::info!(
            "  GOOGLE_DRIVE_DELEGATED_USER: {}",
            preview_opt(&self.google_drive_delegated_user)
        );
        tracing::info!("  DOCS_ROOT: {}", path_opt(&self.docs_root));
        tracing::info!("  CACHE_DIR: {}", self.cache_dir.display());
    }
}

/// Split a comma separated value, trimming parts and dropping blanks.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_or<T, F>(var: F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got {raw:?}")),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn http_url(key: &str, raw: String) -> Result<String> {
    let parsed = url::Url::parse(&raw).with_context(|| format!("{key} is not a valid URL"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        bail!("{key} must use http or https scheme");
    }
    Ok(raw.trim_end_matches('/').to_string())
}
