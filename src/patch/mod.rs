//! Unified-diff application over in-memory text.
//!
//! Hunks are applied at their declared position first. Positionless hunks,
//! and numbered hunks that miss when the caller allows leniency, are
//! relocated by searching for their context; a search that matches more than
//! one position is reported, never guessed.

pub mod apply;
pub mod error;
pub mod parse;

pub use apply::{apply_hunks, apply_unified_patch, parse_hunks, PatchOptions, MAX_FUZZ};
pub use error::PatchError;
pub use parse::{parse_hunk_header, parse_patch, Hunk, HunkLine, HunkPosition};
