use crate::engine::{Vault, VaultInner};
use crate::error::VaultError;
use crate::types::{Aes, VaultCipher};
use aead::Key;
use argon2::Argon2;
use hkdf::Hkdf;
use private::Sealed;
use sha2::Sha256;
use std::marker::PhantomData;
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop};

const SESSION_KEY_INFO: &[u8] = b"session-key";

#[derive(Debug, Default, ZeroizeOnDrop)]
pub struct NoKeys;
#[derive(Debug, Zeroize, ZeroizeOnDrop)]
pub struct WithKeys {
    key: [u8; 32],
}

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoKeys {}
impl Sealed for WithKeys {}

/// A builder for secure initialization of the [`Vault`].
///
/// Implements `ZeroizeOnDrop` to ensure that raw key material is cleared from
/// memory as soon as the builder is no longer needed.
#[allow(private_bounds)]
#[derive(Debug, Zeroize, ZeroizeOnDrop)]
pub struct VaultBuilder<C: VaultCipher = Aes, K: Sealed + ZeroizeOnDrop = NoKeys> {
    #[zeroize(skip)]
    _cipher: PhantomData<C>,
    compression: bool,
    keys: K,
}

impl<C: VaultCipher> Default for VaultBuilder<C> {
    fn default() -> Self {
        Self { _cipher: PhantomData, compression: false, keys: NoKeys }
    }
}

impl<C: VaultCipher> VaultBuilder<C> {
    /// Creates a new empty builder.
    ///
    /// # Results
    /// Returns a fresh [`VaultBuilder`] with compression disabled.
    ///
    /// # Errors
    /// None.
    #[must_use = "Builder must be configured with `derived_keys` before use"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the vault's symmetric session key from a login/password pair.
    ///
    /// Argon2id (package default parameters) turns `login || password` plus a
    /// per-user `salt` into a 32-byte secret, then HKDF-SHA256 expands that
    /// secret with the domain-separation string `"session-key"` into the
    /// actual AES-256 key used to seal payloads.
    ///
    /// # Arguments
    /// * `login`: account identifier, mixed into the Argon2id input.
    /// * `password`: the user's master password.
    /// * `salt`: per-user salt persisted alongside the local credentials file.
    ///
    /// # Results
    /// Returns a [`VaultBuilder`] configured with a derived session key.
    ///
    /// # Errors
    /// Returns [`VaultError::InvalidConfiguration`] if key derivation fails.
    pub fn derived_keys(
        self,
        login: impl AsRef<[u8]>,
        password: impl AsRef<[u8]>,
        salt: impl AsRef<[u8]>,
    ) -> Result<VaultBuilder<C, WithKeys>, VaultError> {
        let mut ikm = Vec::with_capacity(login.as_ref().len() + password.as_ref().len());
        ikm.extend_from_slice(login.as_ref());
        ikm.extend_from_slice(password.as_ref());

        let mut argon_out = [0u8; 32];
        Argon2::default().hash_password_into(&ikm, salt.as_ref(), &mut argon_out).map_err(
            |_| VaultError::InvalidConfiguration {
                message: "Argon2id key derivation failed".into(),
                context: None,
            },
        )?;
        ikm.zeroize();

        let (_, hk) = Hkdf::<Sha256>::extract(Some(salt.as_ref()), &argon_out);
        argon_out.zeroize();

        let mut key = [0u8; 32];
        hk.expand(SESSION_KEY_INFO, &mut key).map_err(|_| VaultError::Encryption {
            message: "HKDF expansion failed for session key".into(),
            context: None,
        })?;

        Ok(VaultBuilder { _cipher: PhantomData, compression: self.compression, keys: WithKeys { key } })
    }
}

#[allow(private_bounds)]
impl<C: VaultCipher, K: Sealed + ZeroizeOnDrop> VaultBuilder<C, K> {
    /// Toggles LZ4 compression for sealed payloads by default.
    ///
    /// # Security / Threat Model
    /// Compression is applied **before encryption**. While this is the correct order for
    /// AEAD usage, it may leak information via ciphertext length when attacker-controlled
    /// data is sealed and the attacker can observe ciphertext sizes.
    ///
    /// Recommended:
    /// - Enable compression for internal storage where the payload length is not attacker-observable.
    /// - Disable compression for attacker-controlled inputs or public protocols.
    ///
    /// Compression state is stored in the payload header for safe unsealing.
    ///
    /// # Results
    /// Returns the builder with compression set to the provided value.
    ///
    /// # Errors
    /// None.
    #[must_use]
    pub const fn compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }
}

impl<C: VaultCipher> VaultBuilder<C, WithKeys> {
    /// Finalizes vault construction and `zeroes` the builder.
    ///
    /// # Results
    /// Returns a fully initialized [`Vault`].
    ///
    /// # Errors
    /// Returns [`VaultError::InvalidConfiguration`] if keys were not provided or derived.
    pub fn build(mut self) -> Result<Vault<C>, VaultError> {
        let vault = VaultInner { cipher: Self::init_cipher(&self.keys.key)?, compression: self.compression };

        self.zeroize();

        Ok(Vault { inner: Arc::new(vault) })
    }

    fn init_cipher(key: &[u8; 32]) -> Result<C, VaultError> {
        let key = Key::<C>::try_from(&key[..]).map_err(|_| VaultError::InvalidConfiguration {
            message: format!("Invalid key length {}, must be 32 bytes", key.len()).into(),
            context: None,
        })?;
        Ok(C::new(&key))
    }
}
