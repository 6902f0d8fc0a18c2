use keeper_domain::items::{Card, EncryptedEnvelope, ItemKind, LoginCred, Note};

#[test]
fn item_kind_table_names_match_constants() {
    assert_eq!(ItemKind::Card.table(), "cards");
    assert_eq!(ItemKind::LoginCred.table(), "logincreds");
    assert_eq!(ItemKind::Note.table(), "notes");
    assert_eq!(ItemKind::Binary.table(), "binaries");
}

#[test]
fn card_round_trips_through_json() {
    let card = Card {
        name: "visa".into(),
        number: "4111111111111111".into(),
        cardholder_name: "Alice".into(),
        cardholder_surname: "Wonder".into(),
        valid_till: "12:2030".into(),
        cvv: "123".into(),
    };
    let json = serde_json::to_string(&card).unwrap();
    let back: Card = serde_json::from_str(&json).unwrap();
    assert_eq!(card, back);
}

#[test]
fn login_cred_and_note_are_plain_data() {
    let login = LoginCred {
        name: "github".into(),
        site: "github.com".into(),
        login: "alice".into(),
        password: "s3cret".into(),
    };
    assert_eq!(login.site, "github.com");

    let note = Note { name: "todo".into(), text: "buy milk, eggs".into() };
    assert!(note.text.contains(','));
}

#[test]
fn envelope_carries_name_and_opaque_data_only() {
    let env = EncryptedEnvelope::new("visa".into(), "base64ciphertext==".into());
    assert_eq!(env.name, "visa");
    assert_eq!(env.data, "base64ciphertext==");
}
