use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use drive_client::DriveClient;
use facebook_client::FacebookClient;
use gateway_common::Config;
use local_docs::LocalDocs;

pub mod error;
pub mod rest;
pub mod telemetry;

pub use error::{ApiError, ApiResult};

/// Shared handler state: one adapter per upstream.
pub struct AppState {
    pub facebook: FacebookClient,
    pub drive: DriveClient,
    pub docs: LocalDocs,
}

impl AppState {
    pub fn new(facebook: FacebookClient, drive: DriveClient, docs: LocalDocs) -> Self {
        Self {
            facebook,
            drive,
            docs,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let facebook = FacebookClient::new(config.facebook_access_token.clone())
            .with_base_url(&config.facebook_base_url)
            .with_api_version(&config.facebook_graph_api_version)
            .with_timeout(config.facebook_timeout)
            .with_default_fields(config.facebook_default_fields.clone())
            .with_default_feed_limit(config.facebook_default_feed_limit)
            .with_debug(config.facebook_enable_debug);

        let drive = DriveClient::new(config.google_drive_service_account_file.clone())
            .with_base_url(&config.google_drive_base_url)
            .with_scopes(config.google_drive_scopes.clone())
            .with_delegated_user(config.google_drive_delegated_user.clone())
            .with_chunk_size(config.google_drive_download_chunk_size);

        let docs = LocalDocs::new(config.docs_root.clone())
            .with_max_file_bytes(config.docs_max_file_bytes);

        Self::new(facebook, drive, docs)
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(rest::landing))
        .route("/health", get(rest::health))
        // Facebook Graph API
        .route("/facebook/profile", post(rest::facebook::profile))
        .route("/facebook/feed", post(rest::facebook::feed))
        .route("/facebook/posts", post(rest::facebook::create_post))
        // Google Drive
        .route("/google-drive/files", post(rest::drive::list_files))
        .route("/google-drive/download", post(rest::drive::download))
        .route("/google-drive/upload", post(rest::drive::upload))
        // Local documentation
        .route("/docs/list", post(rest::docs::list))
        .route("/docs/read", post(rest::docs::read))
        .with_state(state)
        // Logging layer: method + path only (no query params, no bodies)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
