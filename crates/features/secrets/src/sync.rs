//! Background reconciliation between the local vault and the server vault.
//!
//! Each tick walks the four item kinds in turn. For every kind it lists
//! names on both sides, computes the set difference, uploads whatever only
//! exists locally and downloads whatever only exists on the server. A name
//! present on both sides is left alone — there is no field-level merge or
//! conflict resolution, only "does this name exist here yet".
//!
//! A tick with no session (the caller never logged in, or the server is
//! unreachable) is a silent no-op rather than an error: the shell still
//! works offline against the local vault, sync simply has nothing to do.

use std::collections::HashSet;
use std::time::Duration;

use keeper_domain::items::ItemKind;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::SecretsClient;
use crate::error::SecretsError;

/// Runs [`SecretsClient`] reconciliation on a fixed interval until cancelled.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    client: SecretsClient,
    check_interval: Duration,
}

impl SyncEngine {
    #[must_use]
    pub fn new(client: SecretsClient, check_interval: Duration) -> Self {
        Self { client, check_interval }
    }

    /// Runs the reconciliation loop until `token` is cancelled. Intended to
    /// be spawned as a background task; a single tick's failure is logged
    /// and does not stop the loop — the next tick simply tries again.
    pub async fn run(&self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.check_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = token.cancelled() => {
                    debug!("sync engine shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    self.check_all().await;
                }
            }
        }
    }

    /// Reconciles every kind once. Each kind is independent: a fatal error
    /// reconciling one kind is logged and that kind's tick is abandoned, but
    /// the remaining kinds still run — the tick as a whole never fails.
    pub async fn check_all(&self) {
        if !self.client.remote().has_session() {
            debug!("no active session, skipping sync tick");
            return;
        }

        for kind in ItemKind::ALL {
            if let Err(error) = self.check_kind(kind).await {
                warn!(%error, kind = %kind, "sync of kind aborted");
            }
        }
    }

    async fn check_kind(&self, kind: ItemKind) -> Result<(), SecretsError> {
        let local_names = self.local_names(kind);

        let server_names = match self.client.remote().list_items(kind).await {
            Ok(names) => names.into_iter().collect::<HashSet<_>>(),
            Err(keeper_remote::RemoteError::NotFound { .. }) => HashSet::new(),
            Err(keeper_remote::RemoteError::LoginRequired { .. }) => {
                return Err(SecretsError::LoginRequired { context: None });
            }
            Err(source) => {
                return Err(SecretsError::Remote { source, context: Some(format!("listing {kind}").into()) });
            }
        };

        let to_upload = local_names.difference(&server_names);
        let to_download = server_names.difference(&local_names);

        // A non-`NameTaken` failure aborts the rest of *this kind's* tick
        // (uploads and downloads both) but never the other kinds; `upload`
        // and `download` already swallow `NameTaken` as success.
        for name in to_upload {
            self.upload(kind, name)
                .await
                .map_err(|error| {
                    warn!(%error, kind = %kind, name, "upload failed, aborting sync of this kind");
                    error
                })?;
        }

        for name in to_download {
            self.download(kind, name)
                .await
                .map_err(|error| {
                    warn!(%error, kind = %kind, name, "download failed, aborting sync of this kind");
                    error
                })?;
        }

        Ok(())
    }

    fn local_names(&self, kind: ItemKind) -> HashSet<String> {
        match kind {
            ItemKind::Card => self.client.list_cards(),
            ItemKind::LoginCred => self.client.list_login_creds(),
            ItemKind::Note => self.client.list_notes(),
            ItemKind::Binary => self.client.list_binaries(),
        }
        .into_iter()
        .collect()
    }

    async fn upload(&self, kind: ItemKind, name: &str) -> Result<(), SecretsError> {
        let plaintext = match kind {
            ItemKind::Card => keeper_codec::encode_card(&self.client.get_card(name)?).into_bytes(),
            ItemKind::LoginCred => {
                keeper_codec::encode_login_cred(&self.client.get_login_cred(name)?).into_bytes()
            }
            ItemKind::Note => keeper_codec::encode_note(&self.client.get_note(name)?).into_bytes(),
            ItemKind::Binary => self.client.get_binary(name)?.data,
        };

        let envelope = self.client.seal_envelope(kind, name, &plaintext)?;

        match self.client.remote().send_item(kind, &envelope).await {
            Ok(()) | Err(keeper_remote::RemoteError::NameTaken { .. }) => Ok(()),
            Err(source) => {
                Err(SecretsError::Remote { source, context: Some(format!("uploading {kind} '{name}'").into()) })
            }
        }
    }

    async fn download(&self, kind: ItemKind, name: &str) -> Result<(), SecretsError> {
        let envelope = self
            .client
            .remote()
            .get_item(kind, name)
            .await
            .map_err(|source| SecretsError::Remote { source, context: Some(format!("fetching {kind} '{name}'").into()) })?;

        let plaintext = self.client.unseal_envelope(kind, &envelope)?;

        let save_result = match kind {
            ItemKind::Card => {
                let card = keeper_codec::decode_card(&String::from_utf8_lossy(&plaintext))
                    .map_err(|source| SecretsError::Codec { source, context: None })?;
                self.client.add_card(&card)
            }
            ItemKind::LoginCred => {
                let cred = keeper_codec::decode_login_cred(&String::from_utf8_lossy(&plaintext))
                    .map_err(|source| SecretsError::Codec { source, context: None })?;
                self.client.add_login_cred(&cred)
            }
            ItemKind::Note => {
                let note = keeper_codec::decode_note(&String::from_utf8_lossy(&plaintext))
                    .map_err(|source| SecretsError::Codec { source, context: None })?;
                self.client.add_note(&note)
            }
            ItemKind::Binary => {
                self.client.add_binary(&keeper_domain::items::Binary { name: name.to_owned(), data: plaintext })
            }
        };

        // A name that raced onto the local vault between the listing and this
        // save is the same "skip, don't abort" case as a remote `NameTaken`.
        match save_result {
            Ok(()) | Err(SecretsError::LocalVault { source: keeper_localstore::LocalVaultError::NameTaken { .. }, .. }) => {
                Ok(())
            }
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keeper_domain::config::RemoteConfig;
    use keeper_domain::items::Note;
    use keeper_localstore::LocalVault;
    use keeper_remote::RemoteVault;
    use keeper_vault::Vault;
    use keeper_vault::algorithms::Aes;

    fn vault() -> Vault<Aes> {
        Vault::<Aes>::builder().derived_keys("alice", "hunter2", "fixed-salt").unwrap().build().unwrap()
    }

    /// Never listened on by this test suite, so [`RemoteVault::has_session`]
    /// is always `false` and no request is ever actually sent.
    fn offline_client(root: &std::path::Path) -> SecretsClient {
        let local = LocalVault::new(root);
        local.init_storage(vault()).unwrap();
        let remote = RemoteVault::new(&RemoteConfig {
            base_url: "https://127.0.0.1:1".to_owned(),
            tls: None,
            request_timeout_seconds: 15,
        })
        .unwrap();
        SecretsClient::new(local, remote, vault())
    }

    #[tokio::test]
    async fn a_tick_without_a_session_is_a_silent_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let client = offline_client(dir.path());
        client.add_note(&Note { name: "todo".into(), text: "buy milk".into() }).unwrap();

        let engine = SyncEngine::new(client.clone(), Duration::from_secs(60));
        engine.check_all().await;

        // Nothing was uploaded (there's nowhere to upload to) and the local
        // item added before the tick is untouched.
        assert_eq!(client.list_notes(), vec!["todo".to_owned()]);
    }

    #[test]
    fn local_names_reads_every_kind_from_the_local_vault() {
        let dir = tempfile::tempdir().unwrap();
        let client = offline_client(dir.path());
        client.add_note(&Note { name: "todo".into(), text: "buy milk".into() }).unwrap();

        let engine = SyncEngine::new(client, Duration::from_secs(60));
        let names = engine.local_names(ItemKind::Note);
        assert!(names.contains("todo"));
        assert!(engine.local_names(ItemKind::Card).is_empty());
    }
}
