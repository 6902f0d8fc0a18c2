use std::borrow::Cow;

/// Errors surfaced by [`crate::LocalVault`] operations.
#[keeper_derive::keeper_error]
pub enum LocalVaultError {
    /// A second item was saved under a name already present in the index.
    #[error("name already taken{}: {name}", format_context(.context))]
    NameTaken { name: String, context: Option<Cow<'static, str>> },

    /// `GetX` found no entry for the requested name.
    #[error("not found{}: {name}", format_context(.context))]
    NotFound { name: String, context: Option<Cow<'static, str>> },

    /// The stored line/file failed AEAD verification or plaintext parsing.
    #[error("decrypt error{}: {message}", format_context(.context))]
    Decrypt { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Filesystem failure opening, reading, or writing a vault file.
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal local vault error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<keeper_vault::VaultError> for LocalVaultError {
    fn from(err: keeper_vault::VaultError) -> Self {
        Self::Decrypt { message: err.to_string().into(), context: None }
    }
}

impl From<keeper_codec::CodecError> for LocalVaultError {
    fn from(err: keeper_codec::CodecError) -> Self {
        Self::Decrypt { message: err.to_string().into(), context: Some("codec".into()) }
    }
}
