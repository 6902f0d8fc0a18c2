//! Axum server scaffolding shared by `apps/server`: application state and the
//! system (non-feature) router.

mod health;
mod router;
pub mod state;

pub use router::system_router;
