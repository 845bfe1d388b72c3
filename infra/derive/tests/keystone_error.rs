use keystone_derive::keystone_error;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

#[keystone_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[severity(warning)]
    #[error("Client not found{}: {message}", format_context(.context))]
    ClientNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[severity(fatal)]
    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn failing_io() -> Result<(), std::io::Error> {
    Err(std::io::Error::other("disk on fire"))
}

#[test]
fn source_errors_convert_with_context() {
    let err = failing_io().context("service 'storage'").unwrap_err();
    assert!(matches!(err, DemoError::Io { .. }));
    assert_eq!(err.to_string(), "IO error (service 'storage'): disk on fire");
}

#[test]
fn question_mark_uses_generated_from() {
    fn run() -> Result<(), DemoError> {
        failing_io()?;
        Ok(())
    }

    let err = run().unwrap_err();
    assert_eq!(err.to_string(), "IO error: disk on fire");
}

#[test]
fn context_is_attached_to_own_results() {
    let result: Result<(), DemoError> =
        Err(DemoError::ClientNotFound { message: "primary".into(), context: None });
    let err = result.context("proxy 'files'").unwrap_err();
    assert_eq!(err.to_string(), "Client not found (proxy 'files'): primary");
}

#[test]
fn internal_variant_accepts_plain_strings() {
    let from_str: DemoError = "boom".into();
    let from_string: DemoError = String::from("bang").into();
    assert_eq!(from_str.to_string(), "Internal error: boom");
    assert_eq!(from_string.to_string(), "Internal error: bang");
}

#[test]
fn severity_hints_default_to_error() {
    let io: DemoError = std::io::Error::other("x").into();
    let missing = DemoError::ClientNotFound { message: "a".into(), context: None };
    let internal: DemoError = "x".into();

    assert_eq!(io.severity(), Severity::Error);
    assert_eq!(missing.severity(), Severity::Warning);
    assert_eq!(internal.severity(), Severity::Fatal);
}
