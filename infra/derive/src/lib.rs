#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the infrastructure.
//! This crate provides attribute macros to simplify boilerplate associated with
//! infrastructure components like the specialized async runtime, error enums,
//! vault-aware serialization, and feature-slice wiring.
//!
//! ## Usage
//! Add the crate under `dev-dependencies` for proc-macro consumers inside the workspace:
//! ```toml
//! [dev-dependencies]
//! keeper-derive = { path = "../infra/derive" }
//! ```
//!
//! See each macro's docstring for examples; they are `ignore`d to avoid compiling in this crate,
//! but should be copied into consuming crates' tests/examples as needed.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, ItemStruct, parse_macro_input};

/// Attribute macro to bootstrap the specialized Tokio runtime.
///
/// This macro transforms an `async fn main` into a standard `fn main` that initializes
/// a pre-configured Tokio runtime based on the specified performance profile.
///
/// # Arguments
///
/// * `high_performance` - Optimized for high-throughput server environments.
/// * `memory_efficient` - Optimized for low-footprint client or edge environments.
/// * `default` - Uses the default configuration (worker threads auto-detected based on available parallelism).
///
/// # Examples
///
/// ```rust,ignore
/// #[keeper_runtime::main(high_performance)]
/// async fn main() -> Result<(), ()> {
/// # Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Attribute macro to generate vault-aware Serde behavior for structs.
///
/// This macro generates `Serialize` and `Deserialize` impls that preserve field
/// behavior and serde attributes. It also implements `keeper_vault::Tagged` using
/// the optional `tag = "..."` argument or the struct name, marks the type as
/// `keeper_vault::VaultSerde`, and provides `Debug`, `PartialEq`, `Eq`, and `Hash`.
///
/// # Results
/// Expands to `Serialize`/`Deserialize` impls for the annotated struct.
///
/// # Errors
/// Emits a compile-time error if the macro is applied to a non-struct or
/// a struct without named fields.
///
/// # Example
/// ```rust,ignore
/// use keeper_vault::prelude::*;
///
/// #[vault_model(tag = "v1.login_cred")]
/// struct LoginCredRecord {
///     site: String,
///     login: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn vault_model(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::vault::expand_derive(args.into(), input).into()
}

/// A high-level attribute macro for defining domain-specific error enums.
///
/// This macro reduces boilerplate by transforming a standard enum into a fully-featured
/// error type integrated with the workspace's infrastructure.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]`.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a `#[source]` field,
///   enabling the use of the `?` operator for upstream errors.
/// * **Internal Fallback**: Provides specialized `From<&str>` and `From<String>` implementations
///   if an `Internal` variant is present.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum**.
/// 2. Variants that support context must include a `context: Option<Cow<'static, str>>` field.
/// 3. Variants wrapping external errors must include a `source: T` field or a field marked
///    with `#[source]`/`#[from]` (compatible with `thiserror`).
/// 4. Tuple or unit variants are rejected to keep error wiring explicit and reliable.
///
/// # Example
///
/// ```rust,ignore
/// use keeper_derive::keeper_error;
/// use std::borrow::Cow;
///
/// #[keeper_error]
/// pub enum VaultError {
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io {
///         #[source]
///         source: std::io::Error,
///         context: Option<Cow<'static, str>>,
///     },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn keeper_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}

/// Attribute macro to define a Vertical Slice handle.
///
/// This macro transforms a struct into a full Slice pattern:
/// 1. Generates a thread-safe `Arc` wrapper.
/// 2. Implements `Deref` for transparent access to the inner state.
/// 3. Implements `FeatureSlice` for registration in the Kernel.
///
/// # Example
/// ```rust,ignore
/// #[keeper_derive::keeper_slice]
/// pub struct Identity {
///     pub jwt_secret: Vec<u8>,
/// }
///
/// fn init() -> Identity {
///     let inner = IdentityInner { jwt_secret: vec![] };
///     Identity::new(inner)
/// }
/// ```
#[proc_macro_attribute]
pub fn keeper_slice(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as ItemStruct);
    macros::slice::expand_slice(input).into()
}
