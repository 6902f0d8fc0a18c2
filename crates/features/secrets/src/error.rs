use std::borrow::Cow;

/// A specialized [`SecretsError`] enum of this crate.
#[keeper_derive::keeper_error]
pub enum SecretsError {
    /// The requested name is already taken within the caller's kind/scope.
    #[error("name already taken{}", format_context(.context))]
    NameTaken { context: Option<Cow<'static, str>> },

    /// No item of the requested name/kind exists for the caller.
    #[error("not found{}", format_context(.context))]
    NotFound { context: Option<Cow<'static, str>> },

    /// The server could not be reached or returned a server-side failure.
    #[error("server unavailable{}", format_context(.context))]
    ServerDown { context: Option<Cow<'static, str>> },

    /// The caller has no active session (never registered/logged in).
    #[error("login required{}", format_context(.context))]
    LoginRequired { context: Option<Cow<'static, str>> },

    /// Validation errors (bad kind, malformed request body, unsafe name).
    #[error("validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("database error{}: {source}", format_context(.context))]
    Database {
        #[source]
        source: keeper_database::DatabaseError,
        context: Option<Cow<'static, str>>,
    },

    #[cfg(feature = "client")]
    #[error("local vault error{}: {source}", format_context(.context))]
    LocalVault {
        #[source]
        source: keeper_localstore::LocalVaultError,
        context: Option<Cow<'static, str>>,
    },

    #[cfg(feature = "client")]
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

    #[error("codec error{}: {source}", format_context(.context))]
    Codec {
        #[source]
        source: keeper_codec::CodecError,
        context: Option<Cow<'static, str>>,
    },

    #[error("base64 decoding error{}: {message}", format_context(.context))]
    Encoding { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("internal secrets error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
