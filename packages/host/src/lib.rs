//! # Host Editing Session
//!
//! Orchestrates the host side of design mode:
//!
//! ```text
//! selection → inspection → live (unpersisted) preview update
//!           → committed AST mutation → regenerated source → reload
//! ```
//!
//! The session owns the staged file tree for its lifetime and serializes
//! commits; a commit started on stale text would silently discard the
//! previous write, so there is exactly one writer per session.

mod inject;
mod session;

pub use inject::{injection_assets, BuildMode, InjectedAsset};
pub use session::{EditingSession, SessionError, SessionState};

/// Initialize tracing for host binaries and integration tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().try_init();
}
