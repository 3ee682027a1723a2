//! TCP load balancing
//!
//! This module implements backend selection, the per-session connection
//! handler, and the byte relay that carries each direction of a session.

pub mod backend;
pub mod relay;
pub mod session;

pub use backend::{Backend, BackendPool};
pub use session::{SessionOptions, SessionStats, handle_connection};
