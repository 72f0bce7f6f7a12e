//! Folio HTTP API
//!
//! Warp filters over open document sessions and the version history.
//!
//! # Core Concepts
//!
//! - [`AppState`]: session registry plus version, diff and restore services
//! - [`SessionRegistry`]: one [`DocumentSession`](folio_events::DocumentSession)
//!   per open document, each behind its own lock
//! - [`api`]: every route, with errors rendered as
//!   `{"error": .., "errorCode": ..}`
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use folio_api::{api, AppState};
//! use folio_events::SessionConfig;
//! use folio_versions::{InMemoryVersionStore, VersionsConfig};
//!
//! let state = AppState::new(
//!     Arc::new(InMemoryVersionStore::new()),
//!     SessionConfig::default(),
//!     VersionsConfig::default(),
//! );
//! let _routes = api(state);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod dto;
mod error;
mod handlers;
mod routes;
mod state;

pub use dto::{
    parse_version_id, AppendEventBody, AppendEventReply, CleanupBody, ClosedSession, DeletedBody,
    DiffFormat, DiffParams, OpenSessionBody, RestoreBody, SessionView, SnapshotBody,
};
pub use error::{handle_rejection, ApiError, ErrorCode};
pub use routes::{api, session_routes, version_routes};
pub use state::{AppState, SessionRegistry};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
