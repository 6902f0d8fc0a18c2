use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level API configuration shared across services.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfigInner {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub database: DatabaseConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(flatten, default)]
    inner: Arc<ApiConfigInner>,
}

impl Deref for ApiConfig {
    type Target = ApiConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ApiConfig {
    fn deref_mut(&mut self) -> &mut ApiConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
}

/// TLS certificate/key paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// `SurrealDB` connection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub credentials: Option<DatabaseCredentials>,
}

/// `SurrealDB` root credentials (optional when using unauthenticated engines like mem://).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
}

/// Optional API security knobs.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub identity: IdentityConfig,
}

/// Identity/session security configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub session_cache_capacity: u64,
    pub jwt: JwtConfig,
}

/// Settings for the `gophkeeper-auth` session cookie (HMAC-SHA256 JWT).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: Option<String>,
    pub ttl_seconds: u64,
    pub clock_skew_seconds: u64,
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 4583, ssl: None }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self { cert: PathBuf::from("cert.pem"), key: PathBuf::from("key.pem") }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "mem://".to_owned(),
            namespace: "keeper".to_owned(),
            database: "core".to_owned(),
            credentials: Some(DatabaseCredentials::default()),
        }
    }
}

impl Default for DatabaseCredentials {
    fn default() -> Self {
        Self { username: "root".to_owned(), password: "root".to_owned() }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self { session_cache_capacity: 10_000, jwt: JwtConfig::default() }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "dev-only-change-me".to_owned(),
            issuer: "keeper".to_owned(),
            audience: None,
            ttl_seconds: 8 * 3600,
            clock_skew_seconds: 60,
        }
    }
}

// --- Client configuration ---

/// Thin Arc-wrapped configuration for the `keeper-shell` client binary.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(flatten, default)]
    inner: Arc<ClientConfigInner>,
}

impl Deref for ClientConfig {
    type Target = ClientConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ClientConfig {
    fn deref_mut(&mut self) -> &mut ClientConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfigInner {
    pub remote: RemoteConfig,
    pub storage: LocalStorageConfig,
    pub sync: SyncConfig,
}

/// Addressing and transport security for the remote server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub tls: Option<ClientTlsConfig>,
    pub request_timeout_seconds: u64,
}

/// Client-side TLS material: an optional trust bundle (CA) plus an optional
/// client certificate/key pair for mutual TLS.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientTlsConfig {
    pub trust_bundle: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
}

/// Where the client keeps its local vault files and the credentials file,
/// plus the folders the shell reads/writes binaries from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalStorageConfig {
    pub root: PathBuf,
    pub binaries_in: PathBuf,
    pub binaries_out: PathBuf,
    pub credentials_file: PathBuf,
}

/// `SyncEngine` timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub check_interval_seconds: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://127.0.0.1:4583".to_owned(),
            tls: None,
            request_timeout_seconds: 15,
        }
    }
}

impl Default for ClientTlsConfig {
    fn default() -> Self {
        Self { trust_bundle: None, client_cert: None, client_key: None }
    }
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./vault"),
            binaries_in: PathBuf::from("./send"),
            binaries_out: PathBuf::from("./receive"),
            credentials_file: PathBuf::from("./credentials.json"),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { check_interval_seconds: 60 }
    }
}
