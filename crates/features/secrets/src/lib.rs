//! Secrets feature slice: CRUD for the four closed-set item kinds
//! (cards, login credentials, notes, binaries) and, on the client, the
//! background [`sync::SyncEngine`] that reconciles a local vault against it.

mod error;

#[cfg(feature = "server")]
mod server;

#[cfg(feature = "client")]
mod client;
#[cfg(feature = "client")]
mod sync;

pub use error::{SecretsError, SecretsErrorExt};

#[cfg(feature = "server")]
pub use server::router;

#[cfg(feature = "client")]
pub use client::SecretsClient;
#[cfg(feature = "client")]
pub use sync::SyncEngine;

#[cfg(feature = "server")]
use keeper_database::Database;
#[cfg(feature = "server")]
use keeper_domain::config::ApiConfig;
use keeper_kernel::domain::registry::InitializedSlice;

/// Secrets feature state.
#[keeper_derive::keeper_slice]
pub struct Secrets {
    #[cfg(feature = "server")]
    database: Database,
}

/// Initializes the secrets feature: holds the database handle its handlers
/// use to read/write the four item tables under the authenticated caller's
/// scope.
///
/// # Errors
/// This never fails today; it returns a `Result` so call sites can fold it
/// into the same `?`-chain as every other slice's `init`.
#[cfg(feature = "server")]
pub fn init(_config: &ApiConfig, database: &Database) -> Result<InitializedSlice, SecretsError> {
    tracing::info!("Secrets server slice initialized");

    let inner = SecretsInner { database: database.clone() };
    let slice = Secrets::new(inner);

    Ok(InitializedSlice::new(slice))
}
