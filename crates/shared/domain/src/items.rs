//! Item kinds stored in a user's vault.
//!
//! Four closed-set kinds share one identity attribute, `name`, unique per
//! `(user, kind)`. Field order within each struct is the canonical order the
//! codec concatenates on encode and splits on decode — do not reorder fields
//! without updating `keeper-codec` in lockstep.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four closed-set secret kinds this system stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Card,
    LoginCred,
    Note,
    Binary,
}

impl ItemKind {
    /// All four kinds, in the order a sync tick reconciles them.
    pub const ALL: [Self; 4] = [Self::Card, Self::LoginCred, Self::Note, Self::Binary];

    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Card => crate::constants::CARDS,
            Self::LoginCred => crate::constants::LOGINCREDS,
            Self::Note => crate::constants::NOTES,
            Self::Binary => crate::constants::BINARIES,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// A payment card. Canonical field order:
/// name, number, cardholder_name, cardholder_surname, valid_till, cvv.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub name: String,
    pub number: String,
    pub cardholder_name: String,
    pub cardholder_surname: String,
    pub valid_till: String,
    pub cvv: String,
}

/// A website login credential. Canonical field order: name, site, login, password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCred {
    pub name: String,
    pub site: String,
    pub login: String,
    pub password: String,
}

/// A free-form text note. Canonical field order: name, text (single split —
/// `text` may itself contain commas).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub name: String,
    pub text: String,
}

/// An arbitrary binary blob. `data` never participates in comma-joined
/// concatenation; it travels as raw bytes, `name` separately.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binary {
    pub name: String,
    pub data: Vec<u8>,
}

impl fmt::Debug for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binary").field("name", &self.name).field("data_len", &self.data.len()).finish()
    }
}

/// The opaque shape that crosses the client/server boundary for every kind.
///
/// `data` is the AEAD-sealed, then-base64-encoded ciphertext of the item's
/// non-name fields (or, for [`Binary`], of the raw bytes). The server never
/// inspects `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    pub name: String,
    pub data: String,
}

impl EncryptedEnvelope {
    #[must_use]
    pub const fn new(name: String, data: String) -> Self {
        Self { name, data }
    }
}
