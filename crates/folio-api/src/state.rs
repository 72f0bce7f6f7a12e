//! Shared application state
//!
//! Sessions live in a [`DashMap`] keyed by document; each session sits behind
//! its own mutex so a request only ever locks the document it touches. Session
//! locks are synchronous and are never held across an `.await`.

use crate::error::ApiError;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use folio_events::{DocumentId, DocumentSession, Event, SessionConfig};
use folio_versions::{
    DiffService, RestoreCoordinator, VersionManager, VersionStore, VersionsConfig,
};
use parking_lot::Mutex;
use std::sync::Arc;

type SharedSession = Arc<Mutex<DocumentSession>>;

/// Open document sessions
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<DocumentId, SharedSession>,
    config: SessionConfig,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
        }
    }

    /// Open a session, resuming from `events` when given
    ///
    /// Returns `false` when the document already had an open session, which is
    /// then left untouched.
    ///
    /// # Errors
    /// Fails when `events` do not replay into a valid session
    pub fn open(&self, document_id: &DocumentId, events: Vec<Event>) -> Result<bool, ApiError> {
        match self.sessions.entry(document_id.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                let session = if events.is_empty() {
                    DocumentSession::open(document_id.clone(), self.config)
                } else {
                    DocumentSession::resume(document_id.clone(), events, self.config)?
                };
                slot.insert(Arc::new(Mutex::new(session)));
                metrics::gauge!("folio_open_sessions").increment(1.0);
                Ok(true)
            }
        }
    }

    /// Close a session and hand back its events
    ///
    /// # Errors
    /// [`ApiError::session_not_open`] if no session is open
    pub fn close(&self, document_id: &DocumentId) -> Result<Vec<Event>, ApiError> {
        let (_, shared) = self
            .sessions
            .remove(document_id)
            .ok_or_else(|| ApiError::session_not_open(document_id))?;
        metrics::gauge!("folio_open_sessions").decrement(1.0);
        match Arc::try_unwrap(shared) {
            Ok(session) => Ok(session.into_inner().close()?),
            Err(shared) => {
                let mut session = shared.lock();
                session.flush()?;
                Ok(session.log().events().to_vec())
            }
        }
    }

    /// Whether a session is open
    #[must_use]
    pub fn is_open(&self, document_id: &DocumentId) -> bool {
        self.sessions.contains_key(document_id)
    }

    /// Number of open sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no session is open
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Run `f` against the document's session
    ///
    /// Idle coalesced edits are committed before `f` runs.
    ///
    /// # Errors
    /// [`ApiError::session_not_open`] or whatever `f` returns
    pub fn with<T>(
        &self,
        document_id: &DocumentId,
        f: impl FnOnce(&mut DocumentSession) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let shared = self
            .sessions
            .get(document_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ApiError::session_not_open(document_id))?;
        let mut session = shared.lock();
        session.tick(Utc::now())?;
        f(&mut session)
    }
}

/// Everything a request handler needs
#[derive(Debug, Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub versions: VersionManager,
    pub diffs: DiffService,
    pub restores: RestoreCoordinator,
}

impl AppState {
    /// Wire up services over `store`
    #[must_use]
    pub fn new(
        store: Arc<dyn VersionStore>,
        session: SessionConfig,
        versions: VersionsConfig,
    ) -> Self {
        let manager = VersionManager::new(store, versions);
        Self {
            sessions: Arc::new(SessionRegistry::new(session)),
            diffs: DiffService::new(manager.clone(), versions.diff_cache_capacity),
            restores: RestoreCoordinator::new(manager.clone()),
            versions: manager,
        }
    }
}
