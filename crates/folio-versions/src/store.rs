//! Version persistence contract
//!
//! [`VersionStore`] is the data-access seam between the version manager and
//! whatever persists versions. Every call may suspend and may fail with
//! [`VersionError::StoreUnavailable`]; none of them is retried here.
//!
//! [`VersionStore::append`] is the only write that assigns numbers. It decides
//! numbering, content deduplication and the optimistic latest-version check in
//! one atomic step, so two racing callers can never both observe the same
//! "latest" and both succeed.

use crate::error::VersionError;
use crate::version::{Version, VersionDraft, VersionId};
use async_trait::async_trait;
use dashmap::DashMap;
use folio_events::DocumentId;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How [`VersionStore::append`] treats the current latest version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendMode {
    /// Return the latest version instead of appending when its hash matches
    pub dedup: bool,
    /// Fail with `VersionConflict` unless the latest number equals this
    /// (0 for a document without versions)
    pub expected_latest: Option<u64>,
}

impl AppendMode {
    /// Deduplicating append without an optimistic check
    #[must_use]
    pub const fn dedup() -> Self {
        Self {
            dedup: true,
            expected_latest: None,
        }
    }

    /// Unconditional append
    #[must_use]
    pub const fn forced() -> Self {
        Self {
            dedup: false,
            expected_latest: None,
        }
    }

    /// With an optimistic check
    #[must_use]
    pub const fn expecting(mut self, latest: u64) -> Self {
        self.expected_latest = Some(latest);
        self
    }
}

/// Result of an append
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Stored version (the existing one when deduplicated)
    pub version: Version,
    /// False when deduplication returned the existing latest version
    pub created: bool,
}

/// Data-access contract for versions
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Assign the next number to `draft` and store it, atomically with respect
    /// to other appends on the same document
    async fn append(&self, draft: VersionDraft, mode: AppendMode)
        -> Result<AppendOutcome, VersionError>;

    /// Fetch one version
    async fn get(
        &self,
        document_id: &DocumentId,
        version_id: VersionId,
    ) -> Result<Option<Version>, VersionError>;

    /// Highest-numbered version
    async fn latest(&self, document_id: &DocumentId) -> Result<Option<Version>, VersionError>;

    /// Every version of a document, ascending by number
    async fn list(&self, document_id: &DocumentId) -> Result<Vec<Version>, VersionError>;

    /// Hard delete; returns false when the version was already gone
    async fn delete(
        &self,
        document_id: &DocumentId,
        version_id: VersionId,
    ) -> Result<bool, VersionError>;
}

#[derive(Debug, Default)]
struct DocumentVersions {
    by_number: BTreeMap<u64, Version>,
    /// Highest number ever assigned, including deleted versions
    high_water: u64,
}

impl DocumentVersions {
    fn latest(&self) -> Option<&Version> {
        self.by_number.values().next_back()
    }

    fn find(&self, version_id: VersionId) -> Option<&Version> {
        self.by_number.values().find(|v| v.id == version_id)
    }
}

/// Reference [`VersionStore`] kept in memory
///
/// Writes to one document serialize on that document's lock; documents never
/// contend with each other. Reads hand out owned copies.
#[derive(Debug)]
pub struct InMemoryVersionStore {
    documents: DashMap<DocumentId, Arc<RwLock<DocumentVersions>>>,
    available: AtomicBool,
}

impl Default for InMemoryVersionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryVersionStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage: while unavailable every call fails with
    /// `StoreUnavailable`
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of documents holding at least one version slot
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    fn check_available(&self) -> Result<(), VersionError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(VersionError::unavailable("in-memory store marked unavailable"))
        }
    }

    fn document(&self, document_id: &DocumentId) -> Option<Arc<RwLock<DocumentVersions>>> {
        self.documents.get(document_id).map(|entry| Arc::clone(entry.value()))
    }

    fn document_or_insert(&self, document_id: &DocumentId) -> Arc<RwLock<DocumentVersions>> {
        Arc::clone(
            self.documents
                .entry(document_id.clone())
                .or_default()
                .value(),
        )
    }
}

#[async_trait]
impl VersionStore for InMemoryVersionStore {
    async fn append(
        &self,
        draft: VersionDraft,
        mode: AppendMode,
    ) -> Result<AppendOutcome, VersionError> {
        self.check_available()?;
        let document = self.document_or_insert(&draft.document_id);
        let mut versions = document.write();

        let latest_number = versions.latest().map_or(0, |v| v.version_number);
        if let Some(expected) = mode.expected_latest {
            if expected != latest_number {
                return Err(VersionError::VersionConflict {
                    expected,
                    actual: latest_number,
                });
            }
        }

        if mode.dedup {
            if let Some(latest) = versions.latest() {
                if latest.content_hash == draft.content_hash {
                    return Ok(AppendOutcome {
                        version: latest.clone(),
                        created: false,
                    });
                }
            }
        }

        let number = versions.high_water + 1;
        let version = Version::from_draft(draft, number);
        versions.high_water = number;
        versions.by_number.insert(number, version.clone());
        Ok(AppendOutcome {
            version,
            created: true,
        })
    }

    async fn get(
        &self,
        document_id: &DocumentId,
        version_id: VersionId,
    ) -> Result<Option<Version>, VersionError> {
        self.check_available()?;
        Ok(self
            .document(document_id)
            .and_then(|document| document.read().find(version_id).cloned()))
    }

    async fn latest(&self, document_id: &DocumentId) -> Result<Option<Version>, VersionError> {
        self.check_available()?;
        Ok(self
            .document(document_id)
            .and_then(|document| document.read().latest().cloned()))
    }

    async fn list(&self, document_id: &DocumentId) -> Result<Vec<Version>, VersionError> {
        self.check_available()?;
        Ok(self
            .document(document_id)
            .map(|document| document.read().by_number.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete(
        &self,
        document_id: &DocumentId,
        version_id: VersionId,
    ) -> Result<bool, VersionError> {
        self.check_available()?;
        let Some(document) = self.document(document_id) else {
            return Ok(false);
        };
        let mut versions = document.write();
        let number = versions.find(version_id).map(|v| v.version_number);
        Ok(number.is_some_and(|n| versions.by_number.remove(&n).is_some()))
    }
}
