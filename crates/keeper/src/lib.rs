//! Facade crate for the vault server's features and shared modules.
//! Re-exports domain/kernel primitives and aggregates feature initialization.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! - Add `keeper` with the desired feature flags (`server`/`client`).
//! - Call `keeper::init` (server) to register feature slices; extend as new slices appear.

#[cfg(feature = "server")]
use keeper_database::Database;
pub use keeper_domain as domain;
#[cfg(feature = "server")]
use keeper_domain::config::ApiConfig;
pub use keeper_kernel as kernel;

#[cfg(feature = "server")]
pub mod server {
    pub mod router {
        pub use keeper_kernel::server::router::system_router;
    }
}

/// Feature registry for runtime introspection.
pub mod features {
    pub use keeper_identity as identity;
    pub use keeper_secrets as secrets;

    /// Build-time enabled features (by Cargo feature).
    pub const ENABLED: &[&str] = &[
        #[cfg(feature = "server")]
        "server",
        #[cfg(feature = "client")]
        "client",
        #[cfg(feature = "server")]
        "identity",
        #[cfg(feature = "server")]
        "secrets",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// Initializes every server-side feature slice, in dependency order: identity
/// first, since [`features::secrets`] authenticates requests against the
/// session it validates.
///
/// # Errors
/// Returns an error if any feature's initialization fails.
#[cfg(feature = "server")]
pub fn init(
    config: &ApiConfig,
    database: &Database,
) -> Result<Vec<domain::registry::InitializedSlice>, Box<dyn std::error::Error>> {
    let mut slices = Vec::new();

    slices.push(features::identity::init(config, database)?);
    slices.push(features::secrets::init(config, database)?);

    Ok(slices)
}
