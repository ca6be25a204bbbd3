//! # Design Mode Protocol
//!
//! Typed, asynchronous envelopes exchanged between the host editor and the
//! preview runtime across an isolated execution boundary.
//!
//! The two sides share no memory; every message crosses as serialized JSON
//! through a paired channel with FIFO delivery per direction, no ordering
//! across directions, and no delivery guarantee. Messages are therefore
//! self-contained and idempotent: each carries the full element identity
//! and the full patch, never an incremental diff. The boundary is
//! semi-trusted — malformed or unknown envelopes are logged and dropped,
//! never raised as faults.

mod channel;
mod messages;

pub use channel::{channel_pair, Endpoint};
pub use messages::{
    DesignModeMessage, ElementData, ElementState, ElementUpdates, Envelope, ThemeVariables,
};
