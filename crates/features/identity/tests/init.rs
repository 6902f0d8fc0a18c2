#![cfg(feature = "server")]

use keeper_database::Database;
use keeper_domain::config::ApiConfig;
use keeper_identity::init;

#[tokio::test]
async fn init_creates_slice() {
    let database = Database::builder()
        .url("mem://")
        .session("test_ns", "test_db")
        .init()
        .await
        .expect("connect to mem://");

    let config = ApiConfig::default();

    let slice = init(&config, &database).expect("init should succeed");
    assert_eq!(slice.id, std::any::TypeId::of::<keeper_identity::Identity>());
}
