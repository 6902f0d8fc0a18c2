//! Common re-exports for crates that consume this kernel.

#[cfg(feature = "server")]
pub use crate::server::state::{ApiState, ApiStateBuilder, ApiStateError};
