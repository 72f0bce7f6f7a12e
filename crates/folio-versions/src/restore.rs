//! Forward-only restore of historical versions
//!
//! ```text
//! Requested ──► ConflictChecked ──► Applied
//!                      │
//!                      └──────────► Conflicted   (terminal; retry with force
//!                                                 or a fresh expectation)
//! ```
//!
//! The restored content becomes a *new* version. The target version is never
//! modified or deleted. The optimistic check runs inside the store's atomic
//! append, so of two restores racing on the same expectation exactly one wins.

use crate::error::VersionError;
use crate::manager::VersionManager;
use crate::store::AppendMode;
use crate::version::{Version, VersionDraft, VersionId};
use chrono::Utc;
use folio_events::{ActorId, DocumentId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Progress of one restore attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestorePhase {
    Requested,
    ConflictChecked,
    Applied,
    Conflicted,
}

impl RestorePhase {
    /// Phase name used in logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::ConflictChecked => "conflict_checked",
            Self::Applied => "applied",
            Self::Conflicted => "conflicted",
        }
    }

    /// Whether the attempt is over
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Applied | Self::Conflicted)
    }
}

impl fmt::Display for RestorePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for a restore
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreRequest {
    /// Replaces the generated "Restored to version N"
    pub description: Option<String>,
    /// Latest version number the caller believes is current; `None` means
    /// "whatever is current when the request is read"
    pub expected_current: Option<u64>,
    /// Bypass the optimistic check
    pub force: bool,
    pub created_by: Option<ActorId>,
}

/// Result of a successful restore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOutcome {
    /// Version whose content was restored
    pub restored_version: Version,
    /// Version created by the restore
    pub new_version: Version,
}

/// Re-applies historical versions as new forward versions
#[derive(Debug, Clone)]
pub struct RestoreCoordinator {
    manager: VersionManager,
}

impl RestoreCoordinator {
    #[must_use]
    pub fn new(manager: VersionManager) -> Self {
        Self { manager }
    }

    /// Restore `target` as a new version
    ///
    /// The optimistic check runs before the target is looked up, so a stale
    /// request reports the conflict even when the target is gone.
    ///
    /// # Errors
    /// - [`VersionError::VersionConflict`] if the latest version is not the
    ///   expected one and `force` is off
    /// - [`VersionError::NotFound`] if `target` does not exist
    pub async fn restore(
        &self,
        document_id: &DocumentId,
        target: VersionId,
        request: RestoreRequest,
    ) -> Result<RestoreOutcome, VersionError> {
        let mut phase = RestorePhase::Requested;
        tracing::debug!(%document_id, %target, %phase, "restore requested");

        let store = self.manager.store();
        let actual = store
            .latest(document_id)
            .await?
            .map_or(0, |v| v.version_number);

        let mode = match (request.force, request.expected_current) {
            (true, Some(expected)) if expected != actual => {
                warn!(
                    %document_id,
                    expected,
                    actual,
                    "forced restore bypassing version conflict"
                );
                AppendMode::forced()
            }
            (true, _) => AppendMode::forced(),
            (false, Some(expected)) if expected != actual => {
                return Err(Self::conflicted(
                    document_id,
                    target,
                    VersionError::VersionConflict { expected, actual },
                ));
            }
            (false, expected) => AppendMode::forced().expecting(expected.unwrap_or(actual)),
        };

        let restored = self.manager.get_version(document_id, target).await?;

        let description = request
            .description
            .unwrap_or_else(|| format!("Restored to version {}", restored.version_number));
        let draft = VersionDraft::new(
            document_id.clone(),
            restored.title.clone(),
            restored.content.clone(),
            Utc::now(),
        )
        .described(Some(description))
        .snapshot(true)
        .by(request.created_by);

        let appended = store.append(draft, mode).await;
        phase = RestorePhase::ConflictChecked;
        tracing::debug!(%document_id, %target, %phase, "optimistic check done");

        match appended {
            Ok(outcome) => {
                phase = RestorePhase::Applied;
                metrics::counter!("folio_restores_total").increment(1);
                info!(
                    %document_id,
                    restored_from = restored.version_number,
                    version_number = outcome.version.version_number,
                    %phase,
                    "version restored"
                );
                Ok(RestoreOutcome {
                    restored_version: restored,
                    new_version: outcome.version,
                })
            }
            Err(err @ VersionError::VersionConflict { .. }) => {
                Err(Self::conflicted(document_id, target, err))
            }
            Err(err) => Err(err),
        }
    }

    fn conflicted(document_id: &DocumentId, target: VersionId, err: VersionError) -> VersionError {
        let phase = RestorePhase::Conflicted;
        metrics::counter!("folio_restore_conflicts_total").increment(1);
        info!(%document_id, %target, %phase, error = %err, "restore conflicted");
        err
    }
}
