//! Folio Event Log
//!
//! Every change to a document is an immutable [`Event`]. State is never stored,
//! only derived by folding the pure [`reduce`] function over the applied prefix
//! of the log.
//!
//! # Core Concepts
//!
//! - [`EventLog`]: append-only, hash-chained event sequence with a cursor
//! - [`reduce`]: `(state, event) -> state`, deterministic and side-effect free
//! - [`History`]: undo/redo by moving the cursor, with checkpointed replay
//! - [`CoalescingBuffer`]: merges keystroke bursts into one `content-change`
//! - [`DocumentSession`]: the per-document composition of all of the above
//!
//! # Example
//!
//! ```rust
//! use folio_events::{DocumentId, DocumentSession, EventBody, PendingEvent, SessionConfig};
//!
//! let mut session = DocumentSession::open(DocumentId::new("doc-1"), SessionConfig::default());
//! session.apply(PendingEvent::new(EventBody::content("draft"))).unwrap();
//! session.apply(PendingEvent::new(EventBody::content("draft two"))).unwrap();
//!
//! session.undo().unwrap();
//! assert_eq!(session.state().content, "draft");
//! session.redo().unwrap();
//! assert_eq!(session.state().content, "draft two");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod coalesce;
mod error;
mod event;
mod history;
mod log;
mod metadata;
mod reducer;
mod session;

pub use coalesce::{CoalesceConfig, CoalescingBuffer, ContentEdit};
pub use error::{EventError, HistoryError};
pub use event::{
    ActorId, ConnectionDirection, DocumentId, Event, EventBody, EventHash, EventId, PendingEvent,
};
pub use history::{History, HistoryConfig};
pub use log::EventLog;
pub use metadata::{Metadata, MetadataKey, MetadataNamespace, MetadataValue};
pub use reducer::{reduce, replay, replay_from, Connections, DocumentState, SavedMarker};
pub use session::{DocumentSession, SessionConfig};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
