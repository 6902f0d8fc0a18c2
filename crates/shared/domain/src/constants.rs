//! Canonical table/record-kind names shared between the server's storage layer
//! and [`crate::registry`] / resource-guard validation.

pub const CARDS: &str = "cards";
pub const LOGINCREDS: &str = "logincreds";
pub const NOTES: &str = "notes";
pub const BINARIES: &str = "binaries";
pub const USERS: &str = "users";
pub const PASSWORDS: &str = "passwords";

/// Name of the session cookie carried on every authenticated request.
pub const SESSION_COOKIE_NAME: &str = "gophkeeper-auth";
