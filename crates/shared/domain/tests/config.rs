use keeper_domain::config::{ApiConfig, ClientConfig, DatabaseConfig, ServerConfig};
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 4583);
    assert!(server.ssl.is_none());

    let db = DatabaseConfig::default();
    assert_eq!(db.url, "mem://");
    assert_eq!(db.namespace, "keeper");
    assert_eq!(db.database, "core");
    assert!(db.credentials.is_some());
}

#[test]
fn api_config_deserializes() {
    let raw = json!({
        "server": { "address": "::", "port": 8080, "security": {} },
        "database": { "url": "mem://", "namespace": "n", "database": "d", "credentials": null },
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.database.namespace, "n");
}

#[test]
fn client_config_defaults_are_sane() {
    let cfg = ClientConfig::default();
    assert_eq!(cfg.remote.base_url, "https://127.0.0.1:4583");
    assert_eq!(cfg.sync.check_interval_seconds, 60);
    assert_eq!(cfg.remote.request_timeout_seconds, 15);
}

#[test]
fn client_config_deserializes_overrides() {
    let raw = json!({
        "remote": { "base_url": "https://vault.example.com", "request_timeout_seconds": 30 },
        "storage": { "root": "/data/vault" },
        "sync": { "check_interval_seconds": 15 }
    });

    let cfg: ClientConfig = serde_json::from_value(raw).expect("client config deserialize");
    assert_eq!(cfg.remote.base_url, "https://vault.example.com");
    assert_eq!(cfg.remote.request_timeout_seconds, 30);
    assert_eq!(cfg.storage.root, std::path::PathBuf::from("/data/vault"));
    assert_eq!(cfg.sync.check_interval_seconds, 15);
}
