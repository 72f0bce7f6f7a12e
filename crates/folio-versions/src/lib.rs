//! Folio Version History
//!
//! Durable snapshots of document content and everything built on them.
//!
//! # Core Concepts
//!
//! - [`VersionStore`]: async data-access contract; numbering, dedup and the
//!   optimistic check happen in one atomic [`append`](VersionStore::append)
//! - [`VersionManager`]: snapshot, list, fetch, delete, retention, auto-save
//! - [`RetentionPlan`]: pure union-of-clauses retention decision
//! - [`DiffService`]: cached diffs between stored versions
//! - [`RestoreCoordinator`]: forward-only restore with conflict detection
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use folio_events::{DocumentId, DocumentState};
//! use folio_versions::{InMemoryVersionStore, SnapshotRequest, VersionManager, VersionsConfig};
//!
//! # tokio_test_block(async {
//! let manager = VersionManager::new(Arc::new(InMemoryVersionStore::new()), VersionsConfig::default());
//! let state = DocumentState { content: "hello".into(), ..DocumentState::default() };
//! let doc = DocumentId::new("doc-1");
//!
//! let first = manager.create_snapshot(&doc, &state, SnapshotRequest::snapshot()).await.unwrap();
//! let again = manager.create_snapshot(&doc, &state, SnapshotRequest::snapshot()).await.unwrap();
//! assert!(!again.created);
//! assert_eq!(first.version.id, again.version.id);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod compare;
mod config;
mod error;
mod manager;
mod restore;
mod retention;
mod store;
mod version;

pub use compare::{DiffService, VersionDiff};
pub use config::{AutoSnapshotPolicy, VersionsConfig};
pub use error::VersionError;
pub use manager::{ListQuery, SnapshotOutcome, SnapshotRequest, VersionManager, VersionPage};
pub use restore::{RestoreCoordinator, RestoreOutcome, RestorePhase, RestoreRequest};
pub use retention::{RetentionPlan, RetentionPolicy, RetentionReport};
pub use store::{AppendMode, AppendOutcome, InMemoryVersionStore, VersionStore};
pub use version::{Version, VersionDraft, VersionId, VersionRef, VersionSummary};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
