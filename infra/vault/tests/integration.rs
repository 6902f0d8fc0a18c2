pub mod fixtures;

use fixtures::*;
use keeper_vault::VaultError;
use keeper_vault::prelude::*;

#[test]
fn test_vault_ext_roundtrip() {
    let vault = setup_vault();
    let config = SecureConfig { db_password: "super-secret".into(), api_key: "abc-123".into() };

    let sealed = config.seal(&vault).expect("Sealing failed");
    let unsealed: SecureConfig = vault.unseal(&sealed).expect("Unsealing failed");
    assert_eq!(config, unsealed);
}

#[test]
fn test_context_binding_security() {
    let vault = setup_vault();
    let data = "bound-data".to_owned();
    let context = b"right-context";

    let sealed = vault.seal_bytes(data.as_bytes(), context).unwrap();

    // Attempt to unseal with the wrong context
    let result = vault.unseal_bytes(&sealed, b"wrong-context");

    assert!(
        matches!(result, Err(VaultError::Decryption { .. })),
        "Must fail with Decryption when context is wrong"
    );
}

#[test]
fn test_algorithm_agility_cha_cha() {
    let vault =
        Vault::<ChaCha>::builder().derived_keys("alice", "key", "salt").unwrap().build().unwrap();

    let data = vec![1, 2, 3, 4, 5];
    let sealed = vault.seal_bytes(data.clone(), b"test").unwrap();
    let unsealed = vault.unseal_bytes(&sealed, b"test").unwrap();

    assert_eq!(data, unsealed);
}

#[test]
fn test_different_passwords_yield_different_keys() {
    let vault_a =
        Vault::<ChaCha>::builder().derived_keys("alice", "pw-one", "salt").unwrap().build().unwrap();
    let vault_b =
        Vault::<ChaCha>::builder().derived_keys("alice", "pw-two", "salt").unwrap().build().unwrap();

    let sealed = vault_a.seal_bytes(b"top secret", b"ctx").unwrap();
    let result = vault_b.unseal_bytes(&sealed, b"ctx");

    assert!(matches!(result, Err(VaultError::Decryption { .. })));
}
