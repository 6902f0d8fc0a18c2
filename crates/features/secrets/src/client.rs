//! Local-first CRUD facade over [`LocalVault`], plus the sealing/unsealing
//! helpers [`sync::SyncEngine`] uses to move items across the wire.
//!
//! Every `add_*`/`get_*`/`list_*` here only ever touches the local vault —
//! pushing a newly added item to the server, or pulling one the server has
//! that isn't local yet, is the `SyncEngine`'s job, not this facade's.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use keeper_domain::items::{Binary, Card, EncryptedEnvelope, ItemKind, LoginCred, Note};
use keeper_localstore::LocalVault;
use keeper_remote::RemoteVault;
use keeper_vault::Vault;
use keeper_vault::algorithms::Aes;

use crate::error::{SecretsError, SecretsErrorExt};

/// Local-first CRUD plus the wire sealing the `SyncEngine` needs; bundles
/// the local vault, the remote client, and the session's AEAD vault.
#[derive(Debug, Clone)]
pub struct SecretsClient {
    local: LocalVault,
    remote: RemoteVault,
    vault: Vault<Aes>,
}

impl SecretsClient {
    #[must_use]
    pub fn new(local: LocalVault, remote: RemoteVault, vault: Vault<Aes>) -> Self {
        Self { local, remote, vault }
    }

    #[must_use]
    pub fn remote(&self) -> &RemoteVault {
        &self.remote
    }

    #[must_use]
    pub fn local(&self) -> &LocalVault {
        &self.local
    }

    // --- Cards ---

    /// # Errors
    /// [`SecretsError::NameTaken`] if the name is already used locally.
    pub fn add_card(&self, card: &Card) -> Result<(), SecretsError> {
        self.local
            .save_card(card)
            .map_err(|source| SecretsError::LocalVault { source, context: Some("saving card".into()) })
    }

    /// # Errors
    /// [`SecretsError::NotFound`] if no card with that name exists locally.
    pub fn get_card(&self, name: &str) -> Result<Card, SecretsError> {
        self.local
            .get_card(name)
            .map_err(|source| SecretsError::LocalVault { source, context: Some("reading card".into()) })
    }

    #[must_use]
    pub fn list_cards(&self) -> Vec<String> {
        self.local.list_cards()
    }

    // --- Login credentials ---

    /// # Errors
    /// [`SecretsError::NameTaken`] if the name is already used locally.
    pub fn add_login_cred(&self, cred: &LoginCred) -> Result<(), SecretsError> {
        self.local.save_login_cred(cred).map_err(|source| SecretsError::LocalVault {
            source,
            context: Some("saving login credential".into()),
        })
    }

    /// # Errors
    /// [`SecretsError::NotFound`] if no login credential with that name exists locally.
    pub fn get_login_cred(&self, name: &str) -> Result<LoginCred, SecretsError> {
        self.local.get_login_cred(name).map_err(|source| SecretsError::LocalVault {
            source,
            context: Some("reading login credential".into()),
        })
    }

    #[must_use]
    pub fn list_login_creds(&self) -> Vec<String> {
        self.local.list_login_creds()
    }

    // --- Notes ---

    /// # Errors
    /// [`SecretsError::NameTaken`] if the name is already used locally.
    pub fn add_note(&self, note: &Note) -> Result<(), SecretsError> {
        self.local
            .save_note(note)
            .map_err(|source| SecretsError::LocalVault { source, context: Some("saving note".into()) })
    }

    /// # Errors
    /// [`SecretsError::NotFound`] if no note with that name exists locally.
    pub fn get_note(&self, name: &str) -> Result<Note, SecretsError> {
        self.local
            .get_note(name)
            .map_err(|source| SecretsError::LocalVault { source, context: Some("reading note".into()) })
    }

    #[must_use]
    pub fn list_notes(&self) -> Vec<String> {
        self.local.list_notes()
    }

    // --- Binaries ---

    /// # Errors
    /// [`SecretsError::NameTaken`] if the name is already used locally.
    pub fn add_binary(&self, binary: &Binary) -> Result<(), SecretsError> {
        self.local
            .save_binary(binary)
            .map_err(|source| SecretsError::LocalVault { source, context: Some("saving binary".into()) })
    }

    /// # Errors
    /// [`SecretsError::NotFound`] if no binary with that name exists locally.
    pub fn get_binary(&self, name: &str) -> Result<Binary, SecretsError> {
        self.local
            .get_binary(name)
            .map_err(|source| SecretsError::LocalVault { source, context: Some("reading binary".into()) })
    }

    #[must_use]
    pub fn list_binaries(&self) -> Vec<String> {
        self.local.list_binaries()
    }

    /// Seals `name`'s canonical plaintext for `kind` into the wire envelope
    /// the server accepts, using the session vault directly (not the local
    /// vault's own storage encryption, though both derive from the same key).
    ///
    /// # Errors
    /// [`SecretsError::Vault`] if sealing fails.
    pub(crate) fn seal_envelope(
        &self,
        kind: ItemKind,
        name: &str,
        plaintext: &[u8],
    ) -> Result<EncryptedEnvelope, SecretsError> {
        let sealed = self
            .vault
            .seal_bytes(plaintext, kind.table().as_bytes())
            .map_err(|source| SecretsError::Vault { source, context: Some("sealing item".into()) })?;
        Ok(EncryptedEnvelope::new(name.to_owned(), BASE64.encode(sealed.as_slice())))
    }

    /// Unseals a wire envelope back into the canonical plaintext for `kind`.
    ///
    /// # Errors
    /// [`SecretsError::Encoding`] on malformed base64, [`SecretsError::Vault`]
    /// if the ciphertext fails to authenticate.
    pub(crate) fn unseal_envelope(
        &self,
        kind: ItemKind,
        envelope: &EncryptedEnvelope,
    ) -> Result<Vec<u8>, SecretsError> {
        let raw = BASE64
            .decode(envelope.data.as_bytes())
            .map_err(|e| SecretsError::Encoding { message: e.to_string().into(), context: None })?;
        self.vault
            .unseal_bytes(raw, kind.table().as_bytes())
            .map_err(|source| SecretsError::Vault { source, context: Some("unsealing item".into()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keeper_domain::config::RemoteConfig;

    fn vault() -> Vault<Aes> {
        Vault::<Aes>::builder().derived_keys("alice", "hunter2", "fixed-salt").unwrap().build().unwrap()
    }

    fn client(root: &std::path::Path) -> SecretsClient {
        let local = LocalVault::new(root);
        local.init_storage(vault()).unwrap();
        let remote = RemoteVault::new(&RemoteConfig::default()).unwrap();
        SecretsClient::new(local, remote, vault())
    }

    #[test]
    fn seal_then_unseal_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path());

        let envelope = client.seal_envelope(ItemKind::Note, "diary", b"hello,world").unwrap();
        assert_eq!(envelope.name, "diary");

        let plaintext = client.unseal_envelope(ItemKind::Note, &envelope).unwrap();
        assert_eq!(plaintext, b"hello,world");
    }

    #[test]
    fn add_then_get_card_round_trips_locally() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path());

        let card = Card {
            name: "visa".into(),
            number: "4111111111111111".into(),
            cardholder_name: "Alice".into(),
            cardholder_surname: "Wonder".into(),
            valid_till: "12:2030".into(),
            cvv: "123".into(),
        };
        client.add_card(&card).unwrap();
        assert_eq!(client.list_cards(), vec!["visa".to_owned()]);
        assert_eq!(client.get_card("visa").unwrap(), card);
    }

    #[test]
    fn unseal_rejects_malformed_base64() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path());

        let envelope = EncryptedEnvelope::new("x".into(), "not base64!!".into());
        assert!(matches!(
            client.unseal_envelope(ItemKind::Note, &envelope),
            Err(SecretsError::Encoding { .. })
        ));
    }
}
