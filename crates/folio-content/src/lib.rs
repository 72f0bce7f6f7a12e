//! Folio Content Primitives
//!
//! Building blocks shared by the event log and the version store.
//!
//! # Core Concepts
//!
//! - [`ContentHash`]: 32-byte Blake3 hash used to deduplicate versions
//! - [`TextStats`]: word and code-point counts recorded on every version
//! - [`compute_diff`]: Myers edit script between two texts, with statistics
//! - [`render_html`]: HTML presentation of a [`TextDiff`]
//!
//! # Example
//!
//! ```rust
//! use folio_content::{compute_diff, DiffOptions, Granularity};
//!
//! let diff = compute_diff(
//!     "alpha\nbeta\n",
//!     "alpha\ngamma\n",
//!     DiffOptions::new().with_granularity(Granularity::Lines),
//! );
//! assert_eq!(diff.target_text(), "alpha\ngamma\n");
//! assert!(diff.similarity < 1.0);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod diff;
mod hash;
mod stats;

pub use diff::{
    compute_diff, render_html, DiffError, DiffOp, DiffOperation, DiffOptions, Granularity,
    TextDiff,
};
pub use hash::{ContentHash, HashError};
pub use stats::TextStats;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
