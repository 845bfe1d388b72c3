#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the container infrastructure.
//! The only macro exported today is [`keystone_error`], which every crate in the workspace
//! uses to declare its error enum.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! keystone-derive = { path = "../infra/derive" }
//! thiserror = "2"
//! ```

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for declaring context-carrying error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` when missing.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type. Contexts carry the
///   scope/service/client names an operation was working on.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a `source` field,
///   enabling the use of the `?` operator for collaborator errors.
/// * **Internal Fallback**: Provides `From<&str>` and `From<String>` when an `Internal`
///   variant is present.
/// * **Severity Hints**: Variants annotated with `#[severity(warning | error | fatal)]` make
///   the macro emit `severity() -> Severity`. `Severity` must be in scope at the declaration
///   site; variants without a hint report `Severity::Error`.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum**.
/// 2. Variants that support context must include a `context: Option<Cow<'static, str>>` field.
/// 3. Variants wrapping collaborator errors must include a `source: T` field or a field marked
///    with `#[source]`/`#[from]`, together with a `context` field.
/// 4. Tuple or unit variants are rejected.
/// 5. One annotated enum per module (the macro emits a module-local `format_context` helper).
///
/// # Example
///
/// ```rust,ignore
/// use keystone_derive::keystone_error;
/// use keystone_domain::Severity;
/// use std::borrow::Cow;
///
/// #[keystone_error]
/// pub enum ProxyError {
///     #[severity(warning)]
///     #[error("Client not found{}: {message}", format_context(.context))]
///     ClientNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
///
///     #[error("Connector failure{}: {source}", format_context(.context))]
///     Connector { source: ConnectorError, context: Option<Cow<'static, str>> },
///
///     #[severity(fatal)]
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn connect(connector: &mut dyn Connector) -> Result<(), ProxyError> {
///     connector.client_mut().connect().context("client 'primary'")?;
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn keystone_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
