//! # Preview Runtime Overlay
//!
//! The script-side of design mode: observes pointer interaction inside the
//! sandboxed preview, resolves the hovered/clicked element's identity from
//! embedded debug-source metadata, and exposes highlight/selection state.
//!
//! While inactive, no pointer instrumentation runs and no messages are
//! emitted, keeping the preview at native behavior.

mod dom;
mod overlay;

pub use dom::{NodePath, PreviewDocument, PreviewElement, SOURCE_ATTR};
pub use overlay::{Overlay, OverlayState};
