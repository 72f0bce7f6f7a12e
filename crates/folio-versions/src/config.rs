//! Version manager configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits and thresholds for the version manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionsConfig {
    /// Upper bound for `limit` in listings
    pub max_page_size: usize,
    /// `limit` used when a listing names none
    pub default_page_size: usize,
    /// Auto-snapshot after this many events since the last save
    pub auto_snapshot_every_events: Option<usize>,
    /// Auto-snapshot when this many seconds passed since the last save
    pub auto_snapshot_interval_secs: Option<u64>,
    /// Diff results kept in the cache
    pub diff_cache_capacity: u64,
}

impl Default for VersionsConfig {
    fn default() -> Self {
        Self {
            max_page_size: 100,
            default_page_size: 20,
            auto_snapshot_every_events: None,
            auto_snapshot_interval_secs: None,
            diff_cache_capacity: 256,
        }
    }
}

impl VersionsConfig {
    /// Automatic snapshot thresholds
    #[must_use]
    pub fn auto_snapshot(&self) -> AutoSnapshotPolicy {
        AutoSnapshotPolicy {
            every_events: self.auto_snapshot_every_events,
            every_interval: self.auto_snapshot_interval_secs.map(Duration::from_secs),
        }
    }

    /// Clamp a requested page size into `[1, max_page_size]`
    #[must_use]
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

/// When to save a version without an explicit request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoSnapshotPolicy {
    /// Event count threshold
    pub every_events: Option<usize>,
    /// Elapsed time threshold
    pub every_interval: Option<Duration>,
}

impl AutoSnapshotPolicy {
    /// Whether either threshold has been reached
    ///
    /// Nothing is due while no event was applied since the last save.
    #[must_use]
    pub fn is_due(&self, events_since_save: usize, since_save: Duration) -> bool {
        if events_since_save == 0 {
            return false;
        }
        let by_count = self
            .every_events
            .is_some_and(|every| every > 0 && events_since_save >= every);
        let by_time = self
            .every_interval
            .is_some_and(|every| since_save >= every);
        by_count || by_time
    }
}
