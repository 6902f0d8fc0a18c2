use std::borrow::Cow;

/// A specialized [`IdentityError`] enum of this crate.
#[keeper_derive::keeper_error]
pub enum IdentityError {
    /// The requested login is already registered.
    #[error("login already registered{}", format_context(.context))]
    NameTaken { context: Option<Cow<'static, str>> },

    /// Login/password pair did not verify, or the account does not exist.
    #[error("wrong credentials{}", format_context(.context))]
    WrongCredentials { context: Option<Cow<'static, str>> },

    /// Raised by [`crate::client::AuthClient::login`] when the local
    /// credentials file names a different account than the one being logged
    /// in with; the stale file and the entire local vault are removed before
    /// this is returned.
    #[error("local vault belonged to a different account and was reset{}", format_context(.context))]
    OwnershipReset { context: Option<Cow<'static, str>> },

    /// The server could not be reached or returned a server-side failure.
    #[error("server unavailable{}", format_context(.context))]
    ServerDown { context: Option<Cow<'static, str>> },

    /// Validation/config errors.
    #[error("validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("database error{}: {source}", format_context(.context))]
    Database {
        #[source]
        source: keeper_database::DatabaseError,
        context: Option<Cow<'static, str>>,
    },

    #[error("local vault error{}: {source}", format_context(.context))]
    LocalVault {
        #[source]
        source: keeper_localstore::LocalVaultError,
        context: Option<Cow<'static, str>>,
    },

    #[error("remote vault error{}: {source}", format_context(.context))]
    Remote {
        #[source]
        source: keeper_remote::RemoteError,
        context: Option<Cow<'static, str>>,
    },

    #[error("vault error{}: {source}", format_context(.context))]
    Vault {
        #[source]
        source: keeper_vault::VaultError,
        context: Option<Cow<'static, str>>,
    },

    #[error("password hashing error{}: {message}", format_context(.context))]
    Hash { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("token error{}: {message}", format_context(.context))]
    Token { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("credentials file error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("credentials file is corrupt{}: {source}", format_context(.context))]
    Serde {
        #[source]
        source: serde_json::Error,
        context: Option<Cow<'static, str>>,
    },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("internal identity error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
