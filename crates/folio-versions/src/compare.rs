//! Diffs between stored versions
//!
//! Results are cached by the pair of content hashes and the options, so the
//! cache stays valid when versions are deleted or renumbered: identical
//! content always produces an identical diff.

use crate::error::VersionError;
use crate::manager::VersionManager;
use crate::version::{VersionId, VersionRef};
use folio_content::{compute_diff, ContentHash, DiffOptions, TextDiff};
use folio_events::DocumentId;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DiffKey {
    source: ContentHash,
    target: ContentHash,
    options: DiffOptions,
}

/// Diff between two versions of one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDiff {
    pub source_version: VersionRef,
    pub target_version: VersionRef,
    #[serde(flatten)]
    pub diff: TextDiff,
}

/// Loads versions and diffs them, caching results
#[derive(Debug, Clone)]
pub struct DiffService {
    manager: VersionManager,
    cache: Cache<DiffKey, Arc<TextDiff>>,
}

impl DiffService {
    /// Service caching up to `capacity` diffs
    #[must_use]
    pub fn new(manager: VersionManager, capacity: u64) -> Self {
        Self {
            manager,
            cache: Cache::new(capacity),
        }
    }

    /// Diff `from` against `to`, or against the latest version when `to` is
    /// `None`
    ///
    /// Dropping the returned future before completion has no side effects
    /// beyond a possibly warmed cache.
    ///
    /// # Errors
    /// [`VersionError::NotFound`] if either version is missing
    #[instrument(skip(self))]
    pub async fn compare(
        &self,
        document_id: &DocumentId,
        from: VersionId,
        to: Option<VersionId>,
        options: DiffOptions,
    ) -> Result<VersionDiff, VersionError> {
        let source = self.manager.get_version(document_id, from).await?;
        let target = match to {
            Some(to) => self.manager.get_version(document_id, to).await?,
            None => self.manager.latest_version(document_id).await?,
        };

        let key = DiffKey {
            source: source.content_hash,
            target: target.content_hash,
            options,
        };
        let diff = match self.cache.get(&key).await {
            Some(hit) => {
                debug!(%document_id, "diff cache hit");
                hit
            }
            None => {
                let computed = Arc::new(compute_diff(&source.content, &target.content, options));
                self.cache.insert(key, Arc::clone(&computed)).await;
                computed
            }
        };

        Ok(VersionDiff {
            source_version: source.to_ref(),
            target_version: target.to_ref(),
            diff: TextDiff::clone(&diff),
        })
    }

    /// Number of cached diffs (approximate until pending maintenance runs)
    #[must_use]
    pub fn cached_entries(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Run pending cache maintenance
    pub async fn sync_cache(&self) {
        self.cache.run_pending_tasks().await;
    }
}
