//! # Codec
//!
//! Bidirectional, pure mapping between a typed item and the plaintext the
//! vault encrypts. No I/O, no encryption — [`keeper_vault`](../keeper_vault)
//! seals and unseals the bytes this crate produces.
//!
//! Each kind has a canonical comma-joined field order (see each `encode_*`
//! function). Fields are rendered verbatim, with no escaping: round-trip
//! equality only holds for field values that contain no commas, with one
//! deliberate exception — [`Note::text`](keeper_domain::items::Note::text)
//! is split on the *first* comma only, so its text may contain commas
//! freely while `name` still cannot.

mod error;

pub use error::{CodecError, CodecErrorExt};

use keeper_domain::items::{Card, LoginCred, Note};

const CARD_FIELDS: usize = 6;
const LOGIN_CRED_FIELDS: usize = 4;
const NOTE_FIELDS: usize = 2;

/// Joins a [`Card`]'s fields in canonical order: name, number, cardholder
/// name, cardholder surname, valid-till, CVV.
#[must_use]
pub fn encode_card(card: &Card) -> String {
    [
        card.name.as_str(),
        card.number.as_str(),
        card.cardholder_name.as_str(),
        card.cardholder_surname.as_str(),
        card.valid_till.as_str(),
        card.cvv.as_str(),
    ]
    .join(",")
}

/// Splits canonical card plaintext back into a [`Card`].
///
/// # Errors
/// Returns [`CodecError::Malformed`] if the plaintext does not contain
/// exactly [`CARD_FIELDS`] comma-separated parts.
pub fn decode_card(plaintext: &str) -> Result<Card, CodecError> {
    let parts = split_exact(plaintext, CARD_FIELDS, "card")?;
    Ok(Card {
        name: parts[0].to_owned(),
        number: parts[1].to_owned(),
        cardholder_name: parts[2].to_owned(),
        cardholder_surname: parts[3].to_owned(),
        valid_till: parts[4].to_owned(),
        cvv: parts[5].to_owned(),
    })
}

/// Joins a [`LoginCred`]'s fields in canonical order: name, site, login, password.
#[must_use]
pub fn encode_login_cred(cred: &LoginCred) -> String {
    [cred.name.as_str(), cred.site.as_str(), cred.login.as_str(), cred.password.as_str()].join(",")
}

/// Splits canonical login-credential plaintext back into a [`LoginCred`].
///
/// # Errors
/// Returns [`CodecError::Malformed`] if the plaintext does not contain
/// exactly [`LOGIN_CRED_FIELDS`] comma-separated parts.
pub fn decode_login_cred(plaintext: &str) -> Result<LoginCred, CodecError> {
    let parts = split_exact(plaintext, LOGIN_CRED_FIELDS, "logincred")?;
    Ok(LoginCred {
        name: parts[0].to_owned(),
        site: parts[1].to_owned(),
        login: parts[2].to_owned(),
        password: parts[3].to_owned(),
    })
}

/// Joins a [`Note`]'s fields as `name,text` — `text` is never escaped and may
/// itself contain commas, since decoding only ever splits on the first one.
#[must_use]
pub fn encode_note(note: &Note) -> String {
    format!("{},{}", note.name, note.text)
}

/// Splits canonical note plaintext on the first comma only, so `text` may
/// contain arbitrary commas.
///
/// # Errors
/// Returns [`CodecError::Malformed`] if the plaintext has no comma at all
/// (meaning even `name` is missing).
pub fn decode_note(plaintext: &str) -> Result<Note, CodecError> {
    let parts = split_exact(plaintext, NOTE_FIELDS, "note")?;
    Ok(Note { name: parts[0].to_owned(), text: parts[1].to_owned() })
}

fn split_exact<'a>(
    plaintext: &'a str,
    fields: usize,
    kind: &'static str,
) -> Result<Vec<&'a str>, CodecError> {
    let parts: Vec<&str> = plaintext.splitn(fields, ',').collect();
    if parts.len() != fields {
        return Err(CodecError::Malformed {
            message: format!(
                "expected {fields} comma-separated fields for {kind}, found {}",
                parts.len()
            )
            .into(),
            context: None,
        });
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_round_trips_without_commas() {
        let card = Card {
            name: "visa".into(),
            number: "4111111111111111".into(),
            cardholder_name: "Alice".into(),
            cardholder_surname: "Wonder".into(),
            valid_till: "12:2030".into(),
            cvv: "123".into(),
        };
        let plaintext = encode_card(&card);
        assert_eq!(decode_card(&plaintext).unwrap(), card);
    }

    #[test]
    fn login_cred_round_trips_without_commas() {
        let cred = LoginCred {
            name: "github".into(),
            site: "github.com".into(),
            login: "alice".into(),
            password: "hunter2".into(),
        };
        let plaintext = encode_login_cred(&cred);
        assert_eq!(decode_login_cred(&plaintext).unwrap(), cred);
    }

    #[test]
    fn note_round_trips_with_commas_in_text() {
        let note = Note { name: "todo".into(), text: "buy milk, eggs".into() };
        let plaintext = encode_note(&note);
        assert_eq!(plaintext, "todo,buy milk, eggs");
        assert_eq!(decode_note(&plaintext).unwrap(), note);
    }

    #[test]
    fn note_name_cannot_contain_a_comma_but_text_can_have_several() {
        let note = Note { name: "n".into(), text: "a,b,c".into() };
        let plaintext = encode_note(&note);
        let decoded = decode_note(&plaintext).unwrap();
        assert_eq!(decoded.text, "a,b,c");
    }

    #[test]
    fn malformed_card_plaintext_is_rejected() {
        assert!(decode_card("too,few,fields").is_err());
    }

    #[test]
    fn malformed_note_plaintext_is_rejected() {
        assert!(decode_note("no-comma-at-all").is_err());
    }

    proptest::proptest! {
        #[test]
        fn card_round_trips_for_any_comma_free_fields(
            name in "[^,]{0,20}", number in "[^,]{0,20}",
            cname in "[^,]{0,20}", csurname in "[^,]{0,20}",
            till in "[^,]{0,20}", cvv in "[^,]{0,20}",
        ) {
            let card = Card {
                name, number, cardholder_name: cname, cardholder_surname: csurname,
                valid_till: till, cvv,
            };
            let plaintext = encode_card(&card);
            let decoded = decode_card(&plaintext).unwrap();
            assert_eq!(decoded, card);
        }
    }
}
