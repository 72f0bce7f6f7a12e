//! Coalescing of rapid content edits
//!
//! Keystroke-driven edits arrive far faster than anyone wants to undo them.
//! [`CoalescingBuffer`] holds a burst of content edits and releases them as a
//! single `content-change` event once the burst ends:
//!
//! - an edit arriving more than `window` after the previous one closes the
//!   burst before it, and starts a new one
//! - an edit from a different actor closes the burst
//! - reaching `max_pending` edits closes the burst
//! - [`poll`](CoalescingBuffer::poll) closes a burst idle for `window`
//!
//! Every decision is a pure function of the buffer, the new edit and the
//! timestamps involved; no timers or callbacks are involved.

use crate::event::{ActorId, EventBody, EventId, PendingEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Coalescing limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoalesceConfig {
    /// Maximum gap between edits of one burst
    #[serde(with = "millis")]
    pub window: Duration,
    /// Maximum edits merged into one event
    pub max_pending: usize,
}

impl Default for CoalesceConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(750),
            max_pending: 64,
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// One content edit from the editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEdit {
    /// Full content after the edit
    pub content: String,
    /// New title, if the edit renamed the document
    pub title: Option<String>,
    /// Editing actor
    pub actor_id: Option<ActorId>,
    /// When the edit happened
    pub at: DateTime<Utc>,
}

impl ContentEdit {
    /// Edit without title change or actor
    #[must_use]
    pub fn new(content: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            title: None,
            actor_id: None,
            at,
        }
    }

    /// With actor
    #[inline]
    #[must_use]
    pub fn by(mut self, actor: ActorId) -> Self {
        self.actor_id = Some(actor);
        self
    }

    /// With title
    #[inline]
    #[must_use]
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[derive(Debug, Clone)]
struct Burst {
    content: String,
    title: Option<String>,
    actor_id: Option<ActorId>,
    last_at: DateTime<Utc>,
    merged: usize,
}

impl Burst {
    fn start(edit: ContentEdit) -> Self {
        Self {
            content: edit.content,
            title: edit.title,
            actor_id: edit.actor_id,
            last_at: edit.at,
            merged: 1,
        }
    }

    fn absorb(&mut self, edit: ContentEdit) {
        self.content = edit.content;
        if edit.title.is_some() {
            self.title = edit.title;
        }
        self.last_at = edit.at;
        self.merged += 1;
    }

    fn into_event(self) -> PendingEvent {
        PendingEvent {
            id: EventId::new(),
            body: EventBody::ContentChange {
                content: self.content,
                title: self.title,
            },
            timestamp: self.last_at,
            actor_id: self.actor_id,
        }
    }
}

/// Buffer merging adjacent content edits into one event
#[derive(Debug, Clone, Default)]
pub struct CoalescingBuffer {
    config: CoalesceConfig,
    burst: Option<Burst>,
}

impl CoalescingBuffer {
    /// Empty buffer
    #[must_use]
    pub fn new(config: CoalesceConfig) -> Self {
        Self {
            config,
            burst: None,
        }
    }

    /// Whether an unflushed burst exists
    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.burst.is_some()
    }

    /// Edits merged into the open burst
    #[inline]
    #[must_use]
    pub fn pending_edits(&self) -> usize {
        self.burst.as_ref().map_or(0, |b| b.merged)
    }

    /// Content the open burst would commit
    #[inline]
    #[must_use]
    pub fn pending_content(&self) -> Option<&str> {
        self.burst.as_ref().map(|b| b.content.as_str())
    }

    /// Feed one edit
    ///
    /// Returns the events that are ready for the log, oldest first: the burst
    /// closed by this edit, and this edit's own burst if it hit `max_pending`.
    pub fn push(&mut self, edit: ContentEdit) -> Vec<PendingEvent> {
        let mut ready = Vec::new();
        let joins = self.burst.as_ref().is_some_and(|b| self.joins(b, &edit));
        match self.burst.as_mut() {
            Some(burst) if joins => burst.absorb(edit),
            _ => {
                ready.extend(self.flush());
                self.burst = Some(Burst::start(edit));
            }
        }
        if self.pending_edits() >= self.config.max_pending.max(1) {
            ready.extend(self.flush());
        }
        ready
    }

    /// Close the burst if it has been idle for at least `window`
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<PendingEvent> {
        let idle = self
            .burst
            .as_ref()
            .is_some_and(|b| elapsed(b.last_at, now) >= self.config.window);
        if idle {
            self.flush()
        } else {
            None
        }
    }

    /// Close the burst unconditionally
    pub fn flush(&mut self) -> Option<PendingEvent> {
        self.burst.take().map(Burst::into_event)
    }

    fn joins(&self, burst: &Burst, edit: &ContentEdit) -> bool {
        burst.actor_id == edit.actor_id && elapsed(burst.last_at, edit.at) <= self.config.window
    }
}

fn elapsed(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    (to - from).to_std().unwrap_or(Duration::ZERO)
}
