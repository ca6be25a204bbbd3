//! # Staged File Tree
//!
//! In-memory file/directory structure used to stage edited source text
//! before it is mounted back into the running preview sandbox.
//!
//! The tree round-trips through the nested JSON mount format:
//!
//! ```json
//! {
//!   "src": {
//!     "directory": {
//!       "hero.tsx": { "file": { "contents": "..." } }
//!     }
//!   }
//! }
//! ```
//!
//! One tree is created per editing session (from template source) and
//! mutated in place for the session's lifetime. Path operations fail with
//! descriptive errors; nothing is retried automatically.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// A single node in the staged tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileTreeNode {
    File { contents: String },
    Directory(BTreeMap<String, FileTreeNode>),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FileTreeError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Path already exists: {0}")]
    AlreadyExists(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Parent directory missing for: {0}")]
    MissingParent(String),

    #[error("Empty path")]
    EmptyPath,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// The staged tree itself: a root directory addressed by `/`-separated paths.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StagedFileTree {
    root: BTreeMap<String, FileTreeNode>,
}

impl StagedFileTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserialize a tree from its JSON mount format.
    pub fn from_json(json: &str) -> Result<Self, FileTreeError> {
        serde_json::from_str(json).map_err(|e| FileTreeError::Serialization(e.to_string()))
    }

    /// Serialize the tree into its JSON mount format.
    pub fn to_json(&self) -> Result<String, FileTreeError> {
        serde_json::to_string_pretty(self).map_err(|e| FileTreeError::Serialization(e.to_string()))
    }

    /// Create a file. Fails if the parent path is missing or the target
    /// already exists.
    pub fn create_file(&mut self, path: &str, contents: impl Into<String>) -> Result<(), FileTreeError> {
        let contents = contents.into();
        self.insert_node(path, FileTreeNode::File { contents })
    }

    /// Create a directory. Same failure modes as `create_file`.
    pub fn create_dir(&mut self, path: &str) -> Result<(), FileTreeError> {
        self.insert_node(path, FileTreeNode::Directory(BTreeMap::new()))
    }

    /// Replace the full contents of an existing file.
    pub fn write_file(&mut self, path: &str, contents: impl Into<String>) -> Result<(), FileTreeError> {
        match self.get_node_mut(path)? {
            FileTreeNode::File { contents: c } => {
                *c = contents.into();
                Ok(())
            }
            FileTreeNode::Directory(_) => Err(FileTreeError::NotAFile(path.to_string())),
        }
    }

    /// Read the contents of an existing file.
    pub fn read_file(&self, path: &str) -> Result<&str, FileTreeError> {
        match self.get_node(path)? {
            FileTreeNode::File { contents } => Ok(contents),
            FileTreeNode::Directory(_) => Err(FileTreeError::NotAFile(path.to_string())),
        }
    }

    /// Literal substring replacement inside an existing file. The search
    /// term is never treated as a pattern.
    pub fn replace_in_file(&mut self, path: &str, search: &str, replacement: &str) -> Result<(), FileTreeError> {
        match self.get_node_mut(path)? {
            FileTreeNode::File { contents } => {
                *contents = contents.replace(search, replacement);
                Ok(())
            }
            FileTreeNode::Directory(_) => Err(FileTreeError::NotAFile(path.to_string())),
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.get_node(path).is_ok()
    }

    fn segments(path: &str) -> Vec<&str> {
        path.split('/').filter(|s| !s.is_empty()).collect()
    }

    fn get_node(&self, path: &str) -> Result<&FileTreeNode, FileTreeError> {
        let segments = Self::segments(path);
        if segments.is_empty() {
            return Err(FileTreeError::EmptyPath);
        }

        let mut current = &self.root;
        for (i, segment) in segments.iter().enumerate() {
            let node = current
                .get(*segment)
                .ok_or_else(|| FileTreeError::NotFound(path.to_string()))?;

            if i == segments.len() - 1 {
                return Ok(node);
            }

            match node {
                FileTreeNode::Directory(children) => current = children,
                FileTreeNode::File { .. } => {
                    return Err(FileTreeError::NotADirectory(path.to_string()))
                }
            }
        }

        unreachable!("segments is non-empty")
    }

    fn get_node_mut(&mut self, path: &str) -> Result<&mut FileTreeNode, FileTreeError> {
        let segments = Self::segments(path);
        if segments.is_empty() {
            return Err(FileTreeError::EmptyPath);
        }

        let mut current = &mut self.root;
        for (i, segment) in segments.iter().enumerate() {
            let node = current
                .get_mut(*segment)
                .ok_or_else(|| FileTreeError::NotFound(path.to_string()))?;

            if i == segments.len() - 1 {
                return Ok(node);
            }

            match node {
                FileTreeNode::Directory(children) => current = children,
                FileTreeNode::File { .. } => {
                    return Err(FileTreeError::NotADirectory(path.to_string()))
                }
            }
        }

        unreachable!("segments is non-empty")
    }

    fn insert_node(&mut self, path: &str, node: FileTreeNode) -> Result<(), FileTreeError> {
        let segments = Self::segments(path);
        let Some((name, parents)) = segments.split_last() else {
            return Err(FileTreeError::EmptyPath);
        };

        let mut current = &mut self.root;
        for segment in parents {
            let parent = current
                .get_mut(*segment)
                .ok_or_else(|| FileTreeError::MissingParent(path.to_string()))?;

            match parent {
                FileTreeNode::Directory(children) => current = children,
                FileTreeNode::File { .. } => {
                    return Err(FileTreeError::NotADirectory(path.to_string()))
                }
            }
        }

        if current.contains_key(*name) {
            return Err(FileTreeError::AlreadyExists(path.to_string()));
        }

        current.insert(name.to_string(), node);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> StagedFileTree {
        let mut tree = StagedFileTree::new();
        tree.create_dir("/src").unwrap();
        tree.create_file("/src/hero.tsx", "<h1>Hi</h1>").unwrap();
        tree
    }

    #[test]
    fn test_create_and_read() {
        let tree = sample_tree();
        assert_eq!(tree.read_file("/src/hero.tsx").unwrap(), "<h1>Hi</h1>");
    }

    #[test]
    fn test_create_file_on_existing_path_fails() {
        let mut tree = sample_tree();
        let err = tree.create_file("/src/hero.tsx", "x").unwrap_err();
        assert_eq!(err, FileTreeError::AlreadyExists("/src/hero.tsx".to_string()));
    }

    #[test]
    fn test_create_file_missing_parent_fails() {
        let mut tree = StagedFileTree::new();
        let err = tree.create_file("/src/hero.tsx", "x").unwrap_err();
        assert_eq!(err, FileTreeError::MissingParent("/src/hero.tsx".to_string()));
    }

    #[test]
    fn test_write_file_on_directory_fails() {
        let mut tree = sample_tree();
        let err = tree.write_file("/src", "x").unwrap_err();
        assert_eq!(err, FileTreeError::NotAFile("/src".to_string()));
    }

    #[test]
    fn test_replace_in_file_nonexistent_fails() {
        let mut tree = sample_tree();
        let err = tree.replace_in_file("/src/missing.tsx", "a", "b").unwrap_err();
        assert_eq!(err, FileTreeError::NotFound("/src/missing.tsx".to_string()));
    }

    #[test]
    fn test_replace_is_literal() {
        let mut tree = StagedFileTree::new();
        tree.create_file("a.txt", "price is $1.00 (sale)").unwrap();

        // Metacharacters must not be interpreted.
        tree.replace_in_file("a.txt", "$1.00 (sale)", "$2.00").unwrap();
        assert_eq!(tree.read_file("a.txt").unwrap(), "price is $2.00");
    }

    #[test]
    fn test_json_round_trip() {
        let tree = sample_tree();
        let json = tree.to_json().unwrap();
        let back = StagedFileTree::from_json(&json).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn test_mount_format_shape() {
        let tree = sample_tree();
        let value: serde_json::Value = serde_json::from_str(&tree.to_json().unwrap()).unwrap();

        assert_eq!(
            value["src"]["directory"]["hero.tsx"]["file"]["contents"],
            "<h1>Hi</h1>"
        );
    }
}
