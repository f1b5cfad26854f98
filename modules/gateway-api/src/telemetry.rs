use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

const LOG_TARGETS: &[&str] = &[
    "gateway",
    "gateway_api",
    "gateway_common",
    "facebook_client",
    "drive_client",
    "local_docs",
];

/// Build the log filter. A non-empty `RUST_LOG` value is used as given;
/// otherwise the workspace crates log at info (Facebook at debug when
/// `facebook_debug` is set) and everything else at warn.
pub fn log_filter(rust_log: Option<&str>, facebook_debug: bool) -> Result<EnvFilter> {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        return EnvFilter::try_new(directives).context("RUST_LOG is not a valid filter");
    }

    let mut filter = EnvFilter::new("warn");
    for target in LOG_TARGETS {
        filter = filter.add_directive(format!("{target}=info").parse()?);
    }
    if facebook_debug {
        filter = filter.add_directive("facebook_client=debug".parse()?);
    }
    Ok(filter)
}
