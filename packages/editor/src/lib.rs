//! # Pagelift Editor
//!
//! Targeted, minimally-invasive edits to located markup nodes, and the
//! commit pipeline that makes them durable:
//!
//! ```text
//! parse → locate → mutate → generate → write-back
//! ```
//!
//! Every commit cycle parses the file's current text fresh from the staged
//! file tree; syntax trees are never kept in sync incrementally. A failure
//! at any stage aborts the commit and leaves the tree untouched.

mod errors;
mod mutations;
mod pipeline;

pub use errors::EditorError;
pub use mutations::{Mutation, MutationError};
pub use pipeline::{commit, CommitOutcome};
