use keeper_vault::prelude::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn roundtrip_arbitrary_bytes(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let vault = Vault::<ChaCha>::builder()
            .derived_keys("alice", "ikm", "salt")
            .unwrap()
            .build()
            .unwrap();

        let sealed = vault.seal_bytes(&data, b"ctx").unwrap();
        let unsealed = vault.unseal_bytes(&sealed, b"ctx").unwrap();
        prop_assert_eq!(data, unsealed);
    }
}
