#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the iaflat crates.
//!
//! * [`macro@iaflat_error`] turns a plain enum into a context-carrying error type.
//! * [`macro@main`] bootstraps a Tokio runtime profile from `iaflat-runtime`.
//!
//! The snippets below are `ignore`d because a proc-macro crate cannot use its own
//! macros; the consuming crates exercise them in their tests.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, parse_macro_input};

/// Attribute macro that bootstraps an `iaflat-runtime` profile around `async fn main`.
///
/// The annotated function must be `async` and return a `Result`. The generated
/// synchronous `main` builds the runtime, propagates a build failure through `?`
/// and blocks on the function body.
///
/// # Profiles
///
/// * `default` - multi-threaded scheduler sized to the machine.
/// * `parallel` - multi-threaded scheduler with a wide blocking pool for file moves.
///
/// # Examples
///
/// ```rust,ignore
/// #[iaflat_runtime::main(parallel)]
/// async fn main() -> anyhow::Result<()> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Attribute macro for defining crate error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` whose error is this enum or one of its wrapped source errors.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a `source`
///   field (or a field marked `#[source]`/`#[from]`), so `?` works on upstream errors.
/// * **Internal Fallback**: Implements `From<&'static str>` and `From<String>` when an
///   `Internal` variant is present.
/// * **Formatting helper**: Emits a private `format_context` function for use inside
///   `#[error(...)]` strings.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants only.
/// 2. A context field must be typed `Option<Cow<'static, str>>`.
/// 3. Every variant with a source field must also have a context field.
///
/// # Example
///
/// ```rust,ignore
/// use iaflat_derive::iaflat_error;
/// use std::borrow::Cow;
///
/// #[iaflat_error]
/// pub enum EngineError {
///     #[error("I/O failure{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read_manifest(path: &std::path::Path) -> Result<String, EngineError> {
///     std::fs::read_to_string(path).context("Reading sound registry")
/// }
/// ```
#[proc_macro_attribute]
pub fn iaflat_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
