//! Identity feature slice: account registration/login and the `gophkeeper-auth`
//! session cookie that every other feature slice authenticates against.

mod error;

#[cfg(feature = "client")]
mod client;
#[cfg(feature = "server")]
mod server;

pub use error::{IdentityError, IdentityErrorExt};

#[cfg(feature = "client")]
pub use client::{AuthClient, LoginOutcome, derive_session_vault};
#[cfg(feature = "server")]
pub use server::{AuthUser, auth_middleware, router};

#[cfg(feature = "server")]
use keeper_database::Database;
#[cfg(feature = "server")]
use keeper_domain::config::ApiConfig;
use keeper_kernel::domain::registry::InitializedSlice;

/// Identity feature state.
#[keeper_derive::keeper_slice]
pub struct Identity {
    #[cfg(feature = "server")]
    config: ApiConfig,
    #[cfg(feature = "server")]
    database: Database,
}

/// Initializes the identity feature: holds the JWT/cookie configuration and
/// the database handle its handlers and middleware need.
///
/// # Errors
/// This never fails today; it returns a `Result` so call sites can fold it
/// into the same `?`-chain as every other slice's `init`.
#[cfg(feature = "server")]
pub fn init(config: &ApiConfig, database: &Database) -> Result<InitializedSlice, IdentityError> {
    tracing::info!("Identity server slice initialized");

    let inner = IdentityInner { config: config.clone(), database: database.clone() };

    let slice = Identity::new(inner);

    Ok(InitializedSlice::new(slice))
}
