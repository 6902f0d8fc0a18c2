//! # Remote Vault
//!
//! A typed HTTPS client against the server's vault API (Component D).
//!
//! `RemoteVault` is immutable after construction: the session cookie lives in
//! its internal [`reqwest::cookie::Jar`], the derived key never passes
//! through this crate (only already-sealed [`EncryptedEnvelope`]s do), and the
//! underlying `reqwest::Client` is cheaply clonable — so a single instance is
//! safe to share across the shell and the `SyncEngine` tasks.
//!
//! Every operation funnels through [`classify`], which maps a closed set of
//! HTTP status codes to [`RemoteError`] variants. `204` is mapped to
//! [`RemoteError::NotFound`] uniformly, including for list endpoints —
//! callers that want "no items yet" instead of an error (the `SyncEngine`)
//! treat that variant as an empty list themselves.

mod error;

pub use error::{RemoteError, RemoteErrorExt};

use keeper_domain::config::RemoteConfig;
use keeper_domain::items::{EncryptedEnvelope, ItemKind};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Response, Url};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Serialize)]
struct Credentials<'a> {
    login: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct NameQuery<'a> {
    name: &'a str,
}

/// Typed client for the server vault's HTTP API.
#[derive(Debug, Clone)]
pub struct RemoteVault {
    http: Client,
    jar: Arc<Jar>,
    base_url: Url,
}

impl RemoteVault {
    /// Builds a client from client configuration: timeout, and (if present)
    /// a TLS trust bundle and/or client certificate for mutual TLS.
    ///
    /// # Errors
    /// Returns [`RemoteError::Internal`] if the base URL or TLS material is
    /// malformed, or if the underlying `reqwest::Client` fails to build.
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| RemoteError::Internal {
            message: format!("invalid base_url '{}': {e}", config.base_url).into(),
            context: None,
        })?;

        let jar = Arc::new(Jar::default());
        let mut builder = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(Duration::from_secs(config.request_timeout_seconds));

        if let Some(tls) = &config.tls {
            if let Some(bundle) = &tls.trust_bundle {
                let pem = std::fs::read(bundle).map_err(|e| RemoteError::Internal {
                    message: format!("failed to read trust bundle {}: {e}", bundle.display()).into(),
                    context: None,
                })?;
                let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| RemoteError::Internal {
                    message: format!("invalid trust bundle PEM: {e}").into(),
                    context: None,
                })?;
                builder = builder.add_root_certificate(cert);
            }
            if let (Some(cert_path), Some(key_path)) = (&tls.client_cert, &tls.client_key) {
                let mut pem = std::fs::read(cert_path).map_err(|e| RemoteError::Internal {
                    message: format!("failed to read client cert {}: {e}", cert_path.display()).into(),
                    context: None,
                })?;
                pem.extend(std::fs::read(key_path).map_err(|e| RemoteError::Internal {
                    message: format!("failed to read client key {}: {e}", key_path.display()).into(),
                    context: None,
                })?);
                let identity = reqwest::Identity::from_pem(&pem).map_err(|e| RemoteError::Internal {
                    message: format!("invalid client identity PEM: {e}").into(),
                    context: None,
                })?;
                builder = builder.identity(identity);
            }
        }

        let http = builder.build().map_err(|e| RemoteError::Internal {
            message: format!("failed to build HTTP client: {e}").into(),
            context: None,
        })?;

        Ok(Self { http, jar, base_url })
    }

    /// Whether the internal cookie jar currently holds a session cookie for
    /// the configured server. The `SyncEngine` skips a tick entirely when
    /// this is `false` rather than issuing requests doomed to 401.
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.jar
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().map(str::to_owned))
            .is_some_and(|cookies| cookies.contains(keeper_domain::constants::SESSION_COOKIE_NAME))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    /// Registers a new account. On success the server's `Set-Cookie` response
    /// is captured by the internal jar automatically.
    ///
    /// # Errors
    /// [`RemoteError::NameTaken`] if the login is already registered,
    /// [`RemoteError::BadRequest`], or [`RemoteError::ServerDown`].
    pub async fn register(&self, login: &str, password: &str) -> Result<(), RemoteError> {
        let resp = self
            .http
            .post(self.url("/api/user/register"))
            .json(&Credentials { login, password })
            .send()
            .await?;
        classify(resp, login).await?;
        Ok(())
    }

    /// Logs in an existing account, capturing the session cookie on success.
    ///
    /// # Errors
    /// [`RemoteError::LoginRequired`] on wrong credentials (401),
    /// [`RemoteError::BadRequest`], or [`RemoteError::ServerDown`].
    pub async fn login(&self, login: &str, password: &str) -> Result<(), RemoteError> {
        let resp = self
            .http
            .post(self.url("/api/user/login"))
            .json(&Credentials { login, password })
            .send()
            .await?;
        classify(resp, login).await?;
        Ok(())
    }

    /// Uploads a sealed item of `kind`.
    ///
    /// # Errors
    /// [`RemoteError::NameTaken`] on a 409 (the `SyncEngine` swallows this
    /// one when uploading), [`RemoteError::LoginRequired`], or
    /// [`RemoteError::ServerDown`].
    pub async fn send_item(&self, kind: ItemKind, envelope: &EncryptedEnvelope) -> Result<(), RemoteError> {
        let resp =
            self.http.post(self.url(&format!("/api/{}/add", kind.table()))).json(envelope).send().await?;
        classify(resp, &envelope.name).await?;
        Ok(())
    }

    /// Fetches a single sealed item of `kind` by name.
    ///
    /// # Errors
    /// [`RemoteError::NotFound`] on a 204, [`RemoteError::LoginRequired`], or
    /// [`RemoteError::ServerDown`].
    pub async fn get_item(&self, kind: ItemKind, name: &str) -> Result<EncryptedEnvelope, RemoteError> {
        let resp = self
            .http
            .post(self.url(&format!("/api/{}/get", kind.table())))
            .json(&NameQuery { name })
            .send()
            .await?;
        let resp = classify(resp, name).await?;
        Ok(resp.json::<EncryptedEnvelope>().await?)
    }

    /// Lists all item names of `kind` visible to the authenticated user.
    ///
    /// A `204` maps to [`RemoteError::NotFound`] like every other endpoint —
    /// it is the caller's responsibility (the `SyncEngine`) to treat "no
    /// items of this kind yet" as an empty list rather than an error.
    ///
    /// # Errors
    /// [`RemoteError::NotFound`], [`RemoteError::LoginRequired`], or
    /// [`RemoteError::ServerDown`].
    pub async fn list_items(&self, kind: ItemKind) -> Result<Vec<String>, RemoteError> {
        let resp = self.http.get(self.url(&format!("/api/{}/list", kind.table()))).send().await?;
        let resp = classify(resp, kind.table()).await?;
        Ok(resp.json::<Vec<String>>().await?)
    }
}

/// Maps a response's HTTP status to the closed error set above, or returns
/// the response unconsumed on success (`200`/`202`).
async fn classify(resp: Response, subject: &str) -> Result<Response, RemoteError> {
    match resp.status().as_u16() {
        200 | 202 => Ok(resp),
        204 => Err(RemoteError::NotFound { name: subject.to_owned(), context: None }),
        400 => {
            let body = resp.text().await.unwrap_or_default();
            Err(RemoteError::BadRequest { message: body.into(), context: None })
        }
        401 => Err(RemoteError::LoginRequired { context: None }),
        409 => Err(RemoteError::NameTaken { name: subject.to_owned(), context: None }),
        500 => Err(RemoteError::ServerDown { context: None }),
        status => {
            let body = resp.text().await.unwrap_or_default();
            Err(RemoteError::Opaque { status, body: body.into(), context: None })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RemoteConfig {
        RemoteConfig { base_url: "https://127.0.0.1:4583".to_owned(), tls: None, request_timeout_seconds: 15 }
    }

    #[test]
    fn new_client_has_no_session_before_any_request() {
        let vault = RemoteVault::new(&config()).unwrap();
        assert!(!vault.has_session());
    }

    #[test]
    fn rejects_malformed_base_url() {
        let mut cfg = config();
        cfg.base_url = "not a url".to_owned();
        assert!(matches!(RemoteVault::new(&cfg), Err(RemoteError::Internal { .. })));
    }

    #[test]
    fn url_joins_path_without_duplicated_slash() {
        let vault = RemoteVault::new(&config()).unwrap();
        assert_eq!(vault.url("/api/user/login"), "https://127.0.0.1:4583/api/user/login");
    }
}
