use std::borrow::Cow;

/// Errors surfaced by [`crate::RemoteVault`], mapped from HTTP status:
/// `{200/202->ok, 204->NotFound, 400->BadRequest, 401->LoginRequired,
/// 409->NameTaken, 500->ServerDown}`. Any other status becomes
/// [`RemoteError::Opaque`].
#[keeper_derive::keeper_error]
pub enum RemoteError {
    /// The requested name is already taken on the server (409).
    #[error("name already taken{}: {name}", format_context(.context))]
    NameTaken { name: String, context: Option<Cow<'static, str>> },

    /// The server has no entry for the requested name (204).
    #[error("not found{}: {name}", format_context(.context))]
    NotFound { name: String, context: Option<Cow<'static, str>> },

    /// The request body was rejected by the server (400).
    #[error("bad request{}: {message}", format_context(.context))]
    BadRequest { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// No valid session cookie was presented, or credentials were wrong (401).
    #[error("login required{}", format_context(.context))]
    LoginRequired { context: Option<Cow<'static, str>> },

    /// The server reported an internal error (500).
    #[error("server down{}", format_context(.context))]
    ServerDown { context: Option<Cow<'static, str>> },

    /// An HTTP status outside the closed set above.
    #[error("unexpected status {status}{}: {body}", format_context(.context))]
    Opaque { status: u16, body: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Transport-level failure: DNS, TLS, connection refused, timeout, etc.
    #[error("transport error{}: {source}", format_context(.context))]
    Transport {
        #[source]
        source: reqwest::Error,
        context: Option<Cow<'static, str>>,
    },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal remote vault error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
