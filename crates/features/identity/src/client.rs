//! Client-side account management: remote registration/login, offline
//! fallback against a local credentials file, and local vault bootstrap.

use crate::error::{IdentityError, IdentityErrorExt};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use keeper_localstore::LocalVault;
use keeper_remote::{RemoteError, RemoteVault};
use keeper_vault::VaultBuilder;
use keeper_vault::algorithms::Aes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
struct CredentialsFile {
    login: String,
    #[serde(rename = "password")]
    password_hash: String,
}

/// Outcome of a successful [`AuthClient::login`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginOutcome {
    /// `true` when the session was established from the local credentials
    /// file because the server was unreachable (no session cookie exists).
    pub logged_offline: bool,
}

/// Account registration and login against the server vault, with an offline
/// fallback to a local credentials file when the server cannot be reached.
#[derive(Debug, Clone)]
pub struct AuthClient {
    remote: RemoteVault,
    local: LocalVault,
    credentials_path: PathBuf,
}

impl AuthClient {
    #[must_use]
    pub fn new(remote: RemoteVault, local: LocalVault, credentials_path: impl Into<PathBuf>) -> Self {
        Self { remote, local, credentials_path: credentials_path.into() }
    }

    /// Registers a new account online, then derives the session key and
    /// initializes the local vault from it.
    ///
    /// # Errors
    /// [`IdentityError::NameTaken`] on a 409, [`IdentityError::ServerDown`]
    /// on a 500, or [`IdentityError::Validation`] on a 400.
    pub async fn register(&self, login: &str, password: &str) -> Result<(), IdentityError> {
        match self.remote.register(login, password).await {
            Ok(()) => {}
            Err(RemoteError::NameTaken { .. }) => {
                return Err(IdentityError::NameTaken { context: None });
            }
            Err(RemoteError::ServerDown { .. }) => {
                return Err(IdentityError::ServerDown { context: None });
            }
            Err(RemoteError::BadRequest { message, .. }) => {
                return Err(IdentityError::Validation { message, context: None });
            }
            Err(other) => {
                return Err(IdentityError::Remote { source: other, context: None });
            }
        }

        let password_hash = hash_password(password)?;
        self.write_credentials(&CredentialsFile { login: login.to_owned(), password_hash })?;

        let vault = build_vault(login, password)?;
        self.local.init_storage(vault).map_err(|source| IdentityError::LocalVault {
            source,
            context: Some("Initializing local vault after registration".into()),
        })?;

        Ok(())
    }

    /// Logs in, trying the server first and falling back to the local
    /// credentials file when the server cannot be reached.
    ///
    /// An online `401` is a definitive wrong-credentials answer regardless
    /// of what the local file says. A server-side 500 (or a transport
    /// failure) falls through to the offline check with no session cookie.
    /// If the offline file names a different login than the one being used,
    /// it is treated as an ownership change: the stale file and the entire
    /// local vault are deleted and [`IdentityError::OwnershipReset`] is
    /// returned.
    ///
    /// # Errors
    /// [`IdentityError::WrongCredentials`] if neither check succeeds,
    /// [`IdentityError::OwnershipReset`] on an ownership change, or
    /// [`IdentityError::Validation`] on a 400 from the server.
    pub async fn login(&self, login: &str, password: &str) -> Result<LoginOutcome, IdentityError> {
        let online_success = match self.remote.login(login, password).await {
            Ok(()) => true,
            Err(RemoteError::LoginRequired { .. }) => {
                return Err(IdentityError::WrongCredentials { context: None });
            }
            Err(RemoteError::ServerDown { .. } | RemoteError::Transport { .. }) => false,
            Err(RemoteError::BadRequest { message, .. }) => {
                return Err(IdentityError::Validation { message, context: None });
            }
            Err(other) => {
                return Err(IdentityError::Remote { source: other, context: None });
            }
        };

        let credentials = self.read_credentials()?;

        let offline_success = match &credentials {
            Some(file) if file.login == login => verify_password(&file.password_hash, password)?,
            Some(_) => {
                self.local.reset().map_err(|source| IdentityError::LocalVault {
                    source,
                    context: Some("Resetting local vault on ownership change".into()),
                })?;
                let _ = std::fs::remove_file(&self.credentials_path);
                return Err(IdentityError::OwnershipReset { context: None });
            }
            None => false,
        };

        let logged_offline = if online_success { false } else { offline_success };

        if !online_success && !offline_success {
            return Err(IdentityError::WrongCredentials { context: None });
        }

        if online_success {
            let password_hash = hash_password(password)?;
            self.write_credentials(&CredentialsFile { login: login.to_owned(), password_hash })?;
        }

        let vault = build_vault(login, password)?;
        self.local.init_storage(vault).map_err(|source| IdentityError::LocalVault {
            source,
            context: Some("Initializing local vault after login".into()),
        })?;

        Ok(LoginOutcome { logged_offline })
    }

    fn read_credentials(&self) -> Result<Option<CredentialsFile>, IdentityError> {
        match std::fs::read(&self.credentials_path) {
            Ok(bytes) => {
                let file = serde_json::from_slice(&bytes).map_err(|source| IdentityError::Serde {
                    source,
                    context: Some("Parsing local credentials file".into()),
                })?;
                Ok(Some(file))
            }
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => {
                Err(IdentityError::Io { source, context: Some("Reading local credentials file".into()) })
            }
        }
    }

    fn write_credentials(&self, file: &CredentialsFile) -> Result<(), IdentityError> {
        if let Some(parent) = self.credentials_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| IdentityError::Io {
                source,
                context: Some("Creating credentials directory".into()),
            })?;
        }
        let bytes = serde_json::to_vec(file).map_err(|source| IdentityError::Serde {
            source,
            context: Some("Serializing local credentials file".into()),
        })?;
        std::fs::write(&self.credentials_path, bytes).map_err(|source| IdentityError::Io {
            source,
            context: Some("Writing local credentials file".into()),
        })?;
        set_owner_only_permissions(&self.credentials_path)
    }
}

/// Restricts the credentials file to owner read/write (mode 0600), since it
/// holds an Argon2id hash of the user's master password. A no-op on
/// non-Unix targets, which have no equivalent POSIX mode bits.
#[cfg(unix)]
fn set_owner_only_permissions(path: &std::path::Path) -> Result<(), IdentityError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(|source| {
        IdentityError::Io { source, context: Some("Setting credentials file permissions".into()) }
    })
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &std::path::Path) -> Result<(), IdentityError> {
    Ok(())
}

/// Hashes `password` with Argon2id at the package default parameters,
/// returning a self-salted PHC string for local offline verification.
fn hash_password(password: &str) -> Result<String, IdentityError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::fill(&mut salt_bytes)
        .map_err(|e| IdentityError::Hash { message: e.to_string().into(), context: None })?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| IdentityError::Hash { message: e.to_string().into(), context: None })?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Hash { message: e.to_string().into(), context: None })
}

fn verify_password(stored: &str, password: &str) -> Result<bool, IdentityError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| IdentityError::Hash { message: e.to_string().into(), context: None })?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Derives the same session vault [`AuthClient::register`]/[`AuthClient::login`]
/// install into the local vault, for callers (the `SyncEngine`, the secrets
/// facade) that need to seal/unseal wire envelopes with the identical key.
///
/// # Errors
/// [`IdentityError::Vault`] if key derivation fails.
pub fn derive_session_vault(login: &str, password: &str) -> Result<keeper_vault::Vault<Aes>, IdentityError> {
    build_vault(login, password)
}

/// The vault's session key is derived from `login`/`password` plus a salt
/// that is itself deterministic on `login` (`SHA-256(login)`), so the same
/// key is reproducible on any device without persisting it anywhere: the
/// local credentials file only needs to carry `{login, password_hash}`.
fn build_vault(login: &str, password: &str) -> Result<keeper_vault::Vault<Aes>, IdentityError> {
    let salt: [u8; 32] = Sha256::digest(login.as_bytes()).into();
    VaultBuilder::<Aes>::new()
        .derived_keys(login.as_bytes(), password.as_bytes(), salt)
        .map_err(|source| IdentityError::Vault { source, context: Some("Deriving session key".into()) })?
        .build()
        .map_err(|source| IdentityError::Vault { source, context: Some("Building session vault".into()) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use keeper_domain::config::RemoteConfig;

    /// Never listened on by this test suite, so every request to it fails
    /// fast with a connection-refused transport error rather than timing out.
    fn unreachable_remote() -> RemoteVault {
        let config = RemoteConfig {
            base_url: "https://127.0.0.1:1".to_owned(),
            tls: None,
            request_timeout_seconds: 15,
        };
        RemoteVault::new(&config).unwrap()
    }

    fn client_with_credentials(
        dir: &std::path::Path,
        credentials: Option<&CredentialsFile>,
    ) -> AuthClient {
        let credentials_path = dir.join("credentials.json");
        if let Some(file) = credentials {
            std::fs::write(&credentials_path, serde_json::to_vec(file).unwrap()).unwrap();
        }
        let local = LocalVault::new(dir.join("vault"));
        AuthClient::new(unreachable_remote(), local, credentials_path)
    }

    #[tokio::test]
    async fn login_falls_back_to_offline_when_server_is_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let file =
            CredentialsFile { login: "alice".into(), password_hash: hash_password("hunter2").unwrap() };
        let client = client_with_credentials(dir.path(), Some(&file));

        let outcome = client.login("alice", "hunter2").await.unwrap();
        assert!(outcome.logged_offline);
    }

    #[tokio::test]
    async fn login_offline_rejects_wrong_password() {
        let dir = tempfile::tempdir().unwrap();
        let file =
            CredentialsFile { login: "alice".into(), password_hash: hash_password("hunter2").unwrap() };
        let client = client_with_credentials(dir.path(), Some(&file));

        let err = client.login("alice", "WRONG").await.unwrap_err();
        assert!(matches!(err, IdentityError::WrongCredentials { .. }));
    }

    #[tokio::test]
    async fn login_offline_with_no_credentials_file_is_wrong_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let client = client_with_credentials(dir.path(), None);

        let err = client.login("alice", "hunter2").await.unwrap_err();
        assert!(matches!(err, IdentityError::WrongCredentials { .. }));
    }

    #[tokio::test]
    async fn login_with_a_different_login_than_the_credentials_file_resets_the_vault() {
        let dir = tempfile::tempdir().unwrap();
        let file =
            CredentialsFile { login: "bob".into(), password_hash: hash_password("hunter2").unwrap() };
        let client = client_with_credentials(dir.path(), Some(&file));

        let err = client.login("alice", "anything").await.unwrap_err();
        assert!(matches!(err, IdentityError::OwnershipReset { .. }));
        assert!(!client.credentials_path.exists());
    }
}
