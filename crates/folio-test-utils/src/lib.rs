//! Testing utilities for the folio workspace
//!
//! Shared fixtures: seeded stores and a ready-made app state.

#![allow(missing_docs)]

use folio_api::AppState;
use folio_events::{DocumentId, DocumentState, SessionConfig};
use folio_versions::{
    InMemoryVersionStore, SnapshotRequest, Version, VersionManager, VersionsConfig,
};
use std::sync::Arc;

pub fn doc(id: &str) -> DocumentId {
    DocumentId::new(id)
}

pub fn state_with(content: &str) -> DocumentState {
    DocumentState {
        content: content.to_string(),
        ..DocumentState::default()
    }
}

pub fn store() -> Arc<InMemoryVersionStore> {
    Arc::new(InMemoryVersionStore::new())
}

pub fn manager(store: Arc<InMemoryVersionStore>) -> VersionManager {
    VersionManager::new(store, VersionsConfig::default())
}

/// Store one forced snapshot per entry, in order
pub async fn seed_versions(
    manager: &VersionManager,
    document_id: &DocumentId,
    contents: &[&str],
) -> Vec<Version> {
    let mut versions = Vec::with_capacity(contents.len());
    for content in contents {
        let request = SnapshotRequest {
            force: true,
            ..SnapshotRequest::snapshot()
        };
        let outcome = manager
            .create_snapshot(document_id, &state_with(content), request)
            .await
            .unwrap();
        versions.push(outcome.version);
    }
    versions
}

/// App state over `store` with default configuration
pub fn app_state(store: Arc<InMemoryVersionStore>) -> AppState {
    AppState::new(store, SessionConfig::default(), VersionsConfig::default())
}
