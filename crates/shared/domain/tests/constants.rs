use keeper_domain::constants::{BINARIES, CARDS, LOGINCREDS, NOTES, PASSWORDS, USERS};

#[test]
fn constants_match_table_names() {
    assert_eq!(CARDS, "cards");
    assert_eq!(LOGINCREDS, "logincreds");
    assert_eq!(NOTES, "notes");
    assert_eq!(BINARIES, "binaries");
    assert_eq!(USERS, "users");
    assert_eq!(PASSWORDS, "passwords");
}
