//! Error types for the editor

use pagelift_common::{FileTreeError, IdentityError};
use pagelift_parser::ParseError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("File tree error: {0}")]
    FileTree(#[from] FileTreeError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("No node found at or near {identity}")]
    NodeNotFound { identity: String },
}
