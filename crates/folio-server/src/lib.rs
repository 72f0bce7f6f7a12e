//! Folio server
//!
//! Configuration loading, logging setup and the HTTP listener behind the
//! `folio-server` binary.

#![allow(missing_docs)]

pub mod config;

pub use config::{ConfigError, FolioConfig, ServerSection, SessionSection, BIND_ENV};

use folio_api::AppState;
use folio_content::{compute_diff, render_html, DiffOptions, TextDiff};
use folio_versions::InMemoryVersionStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` wins over `server.log_filter`.
pub fn init_tracing(server: &ServerSection) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if server.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Application state over a fresh in-memory store
#[must_use]
pub fn build_state(config: &FolioConfig) -> AppState {
    AppState::new(
        Arc::new(InMemoryVersionStore::new()),
        config.session.to_session_config(),
        config.versions,
    )
}

/// Serve the API until the process is stopped
///
/// # Errors
/// Invalid bind address
pub async fn serve(config: FolioConfig) -> Result<(), ConfigError> {
    let addr: SocketAddr = config.bind_addr()?;
    let state = build_state(&config);
    info!(%addr, "folio listening");
    warp::serve(folio_api::api(state)).run(addr).await;
    Ok(())
}

/// Rendered output of a one-off diff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOutput {
    Json,
    Html,
}

/// Diff two texts outside of any document
///
/// # Errors
/// JSON serialization failure
pub fn render_diff(
    source: &str,
    target: &str,
    options: DiffOptions,
    output: DiffOutput,
) -> Result<String, serde_json::Error> {
    let diff: TextDiff = compute_diff(source, target, options);
    match output {
        DiffOutput::Json => serde_json::to_string_pretty(&diff),
        DiffOutput::Html => Ok(render_html(&diff)),
    }
}
