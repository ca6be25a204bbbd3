//! # Commit Pipeline
//!
//! The parse → locate → mutate → generate → write-back cycle that durably
//! rewrites source text in the staged file tree.
//!
//! The tree is written only after every stage has succeeded, so a failed
//! commit leaves it byte-identical. Commits against the same file must be
//! serialized by the caller; a commit started on stale text would silently
//! discard the previous write.

use crate::{EditorError, Mutation};
use pagelift_common::{ElementIdentity, StagedFileTree};
use pagelift_parser::{find_element_by_location, generate, parse};
use tracing::debug;

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutcome {
    /// File that was rewritten.
    pub file: String,
    /// New text of the file, as written back into the tree.
    pub new_source: String,
}

/// Apply `mutations` to the element identified by `identity` inside the
/// staged file tree.
pub fn commit(
    tree: &mut StagedFileTree,
    identity: &ElementIdentity,
    mutations: &[Mutation],
) -> Result<CommitOutcome, EditorError> {
    let location = identity.parse()?;
    let source = tree.read_file(&location.file)?.to_string();

    let mut doc = parse(&source)?;

    let node_id = find_element_by_location(&doc, location.line, location.column).ok_or_else(
        || EditorError::NodeNotFound {
            identity: identity.to_string(),
        },
    )?;

    for mutation in mutations {
        mutation.apply(&mut doc, node_id)?;
    }

    let new_source = generate(&doc, &source);
    tree.write_file(&location.file, new_source.clone())?;

    debug!(file = %location.file, node_id, "committed {} mutation(s)", mutations.len());

    Ok(CommitOutcome {
        file: location.file,
        new_source,
    })
}
