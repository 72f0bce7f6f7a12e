//! Version manager
//!
//! Materializes versions from document state and owns listing, deletion,
//! retention and automatic snapshots. Numbering and deduplication are decided
//! by the store in a single atomic append.

use crate::config::VersionsConfig;
use crate::error::VersionError;
use crate::retention::{RetentionPlan, RetentionPolicy, RetentionReport};
use crate::store::{AppendMode, VersionStore};
use crate::version::{Version, VersionDraft, VersionId, VersionSummary};
use chrono::{DateTime, Utc};
use folio_events::{ActorId, DocumentId, DocumentState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Options for [`VersionManager::create_snapshot`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotRequest {
    pub description: Option<String>,
    /// Store a new version even if content is unchanged
    pub force: bool,
    pub created_by: Option<ActorId>,
    /// Explicit checkpoint rather than an incidental save
    pub is_snapshot: bool,
}

impl SnapshotRequest {
    /// Explicit, unforced snapshot
    #[must_use]
    pub fn snapshot() -> Self {
        Self {
            is_snapshot: true,
            ..Self::default()
        }
    }
}

/// Result of [`VersionManager::create_snapshot`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotOutcome {
    pub version: Version,
    /// False when an unchanged document returned its latest version
    pub created: bool,
}

/// Listing parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListQuery {
    /// 1-based page, defaults to 1
    pub page: Option<usize>,
    /// Page size, clamped to the configured maximum
    pub limit: Option<usize>,
    pub snapshots_only: bool,
    pub include_content: bool,
}

/// One page of versions, most recent first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionPage {
    pub versions: Vec<VersionSummary>,
    /// Matching versions across all pages
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

/// Snapshot, list, fetch, delete and retention over a [`VersionStore`]
#[derive(Clone)]
pub struct VersionManager {
    store: Arc<dyn VersionStore>,
    config: VersionsConfig,
}

impl std::fmt::Debug for VersionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl VersionManager {
    /// Manager over `store`
    #[must_use]
    pub fn new(store: Arc<dyn VersionStore>, config: VersionsConfig) -> Self {
        Self { store, config }
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn VersionStore> {
        &self.store
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &VersionsConfig {
        &self.config
    }

    /// Persist the content of `state` as a new version
    ///
    /// Unless forced, returns the most recent version unchanged when its
    /// content hash matches.
    ///
    /// # Errors
    /// Propagates store failures
    #[instrument(skip(self, state, request), fields(force = request.force))]
    pub async fn create_snapshot(
        &self,
        document_id: &DocumentId,
        state: &DocumentState,
        request: SnapshotRequest,
    ) -> Result<SnapshotOutcome, VersionError> {
        let draft = VersionDraft::of_state(document_id.clone(), state, Utc::now())
            .described(request.description)
            .snapshot(request.is_snapshot)
            .by(request.created_by);
        let mode = if request.force {
            AppendMode::forced()
        } else {
            AppendMode::dedup()
        };

        let outcome = self.store.append(draft, mode).await?;
        if outcome.created {
            metrics::counter!("folio_versions_created_total").increment(1);
            info!(
                %document_id,
                version_number = outcome.version.version_number,
                is_snapshot = outcome.version.is_snapshot,
                "version created"
            );
        } else {
            metrics::counter!("folio_snapshots_deduplicated_total").increment(1);
            debug!(
                %document_id,
                version_number = outcome.version.version_number,
                "content unchanged, returning latest version"
            );
        }
        Ok(SnapshotOutcome {
            version: outcome.version,
            created: outcome.created,
        })
    }

    /// Snapshot automatically if a configured threshold was reached
    ///
    /// `events_since_save` and `last_saved_at` describe the session; returns
    /// `None` when nothing is due.
    ///
    /// # Errors
    /// Propagates store failures
    pub async fn maybe_auto_snapshot(
        &self,
        document_id: &DocumentId,
        state: &DocumentState,
        events_since_save: usize,
        last_saved_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<SnapshotOutcome>, VersionError> {
        let since_save = (now - last_saved_at).to_std().unwrap_or_default();
        if !self.config.auto_snapshot().is_due(events_since_save, since_save) {
            return Ok(None);
        }
        debug!(%document_id, events_since_save, "auto snapshot due");
        let request = SnapshotRequest {
            description: Some("Automatic save".to_string()),
            ..SnapshotRequest::default()
        };
        self.create_snapshot(document_id, state, request)
            .await
            .map(Some)
    }

    /// List versions, most recent first
    ///
    /// # Errors
    /// Propagates store failures
    #[instrument(skip(self))]
    pub async fn list_versions(
        &self,
        document_id: &DocumentId,
        query: ListQuery,
    ) -> Result<VersionPage, VersionError> {
        let limit = self.config.clamp_limit(query.limit);
        let page = query.page.unwrap_or(1).max(1);

        let mut versions = self.store.list(document_id).await?;
        if query.snapshots_only {
            versions.retain(|v| v.is_snapshot);
        }
        versions.sort_by(|a, b| b.version_number.cmp(&a.version_number));

        let total = versions.len();
        let versions = versions
            .iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .map(|v| v.summary(query.include_content))
            .collect();
        Ok(VersionPage {
            versions,
            total,
            page,
            limit,
        })
    }

    /// Fetch one version with content
    ///
    /// # Errors
    /// Returns [`VersionError::NotFound`] if absent
    pub async fn get_version(
        &self,
        document_id: &DocumentId,
        version_id: VersionId,
    ) -> Result<Version, VersionError> {
        self.store
            .get(document_id, version_id)
            .await?
            .ok_or_else(|| VersionError::NotFound {
                document_id: document_id.clone(),
                version_id,
            })
    }

    /// Highest-numbered version
    ///
    /// # Errors
    /// Returns [`VersionError::NoVersions`] for a document without versions
    pub async fn latest_version(&self, document_id: &DocumentId) -> Result<Version, VersionError> {
        self.store
            .latest(document_id)
            .await?
            .ok_or_else(|| VersionError::NoVersions {
                document_id: document_id.clone(),
            })
    }

    /// Hard delete
    ///
    /// # Errors
    /// Returns [`VersionError::NotFound`] if absent
    #[instrument(skip(self))]
    pub async fn delete_version(
        &self,
        document_id: &DocumentId,
        version_id: VersionId,
    ) -> Result<VersionId, VersionError> {
        if self.store.delete(document_id, version_id).await? {
            info!(%document_id, %version_id, "version deleted");
            Ok(version_id)
        } else {
            Err(VersionError::NotFound {
                document_id: document_id.clone(),
                version_id,
            })
        }
    }

    /// Delete every version the policy does not protect
    ///
    /// A version deleted concurrently by someone else is not counted as
    /// deleted here, nor as remaining.
    ///
    /// # Errors
    /// Propagates store failures; versions deleted before the failure stay
    /// deleted
    #[instrument(skip(self))]
    pub async fn apply_retention(
        &self,
        document_id: &DocumentId,
        policy: RetentionPolicy,
        now: DateTime<Utc>,
    ) -> Result<RetentionReport, VersionError> {
        let versions = self.store.list(document_id).await?;
        let plan = RetentionPlan::compute(&versions, &policy, now);

        let mut deleted_count = 0;
        for doomed in &plan.delete {
            if self.store.delete(document_id, doomed.id).await? {
                deleted_count += 1;
            }
        }
        let remaining_count = versions.len() - plan.delete.len();
        info!(%document_id, deleted_count, remaining_count, "retention applied");
        Ok(RetentionReport {
            deleted_count,
            remaining_count,
        })
    }
}
