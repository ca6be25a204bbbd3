pub mod file_tree;
pub mod identity;

pub use file_tree::*;
pub use identity::*;
