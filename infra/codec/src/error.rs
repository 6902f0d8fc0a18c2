use std::borrow::Cow;

/// Errors raised while mapping between a typed item and its canonical
/// plaintext encoding.
#[keeper_derive::keeper_error]
pub enum CodecError {
    /// The plaintext did not split into the number of fields the kind expects.
    #[error("Malformed plaintext{}: {message}", format_context(.context))]
    Malformed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
