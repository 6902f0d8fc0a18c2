//! # Vault Extensions
//!
//! This module provides the [`VaultExt`] extension trait, which simplifies the process
//! of sealing serializable data into encrypted payloads.
//!
//! By using this trait, you can call cryptographic methods directly on your data structures,
//! reducing boilerplate and ensuring consistent use of type names as cryptographic contexts.

use crate::engine::Vault;
use crate::error::VaultError;
use crate::types::{ProtectedPayload, VaultCipher, VaultSerde};

// --- Extensions ---

/// An extension trait for tagged types to provide ergonomic sealing.
///
/// This trait is automatically implemented for any type that implements [`Serialize`] and [`Tagged`].
pub trait VaultExt: VaultSerde {
    /// Seals the object into a [`ProtectedPayload`].
    ///
    /// The cryptographic context (AAD) is derived from [`Tagged::TAG`].
    ///
    /// # Results
    /// Returns an encrypted [`ProtectedPayload`].
    ///
    /// # Errors
    /// * [`VaultError::Serialization`] If the object cannot be serialized.
    /// * [`VaultError::Encryption`] If the AEAD cipher fails.
    fn seal<C>(&self, vault: &Vault<C>) -> Result<ProtectedPayload<C>, VaultError>
    where
        C: VaultCipher,
        Self: Sized,
    {
        vault.seal(self)
    }

    /// Unseals a [`ProtectedPayload`] back into the original type.
    ///
    /// This method automatically provides the tagged cryptographic context (AAD).
    ///
    /// # Results
    /// Returns the decoded value.
    ///
    /// # Errors
    /// * [`VaultError::Decryption`] If the context, key, or data is invalid.
    /// * [`VaultError::Serialization`] If the decrypted bytes cannot be parsed.
    /// * [`VaultError::Decompression`] If the LZ4 stream is corrupt.
    fn unseal<C>(vault: &Vault<C>, payload: &ProtectedPayload<C>) -> Result<Self, VaultError>
    where
        C: VaultCipher,
    {
        vault.unseal(payload)
    }
}

impl<T: VaultSerde> VaultExt for T {}
