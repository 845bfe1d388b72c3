use keystone_domain::Severity;
use keystone_kernel::config::ConfigError;
use keystone_logger::LoggerError;
use keystone_scope::ScopeError;
use std::borrow::Cow;

#[keystone_derive::keystone_error]
pub enum KeystoneError {
    #[error("Configuration failure{}: {source}", format_context(.context))]
    Config { source: ConfigError, context: Option<Cow<'static, str>> },

    #[error("Scope failure{}: {source}", format_context(.context))]
    Scope { source: ScopeError, context: Option<Cow<'static, str>> },

    #[error("Logger failure{}: {source}", format_context(.context))]
    Logger { source: LoggerError, context: Option<Cow<'static, str>> },

    #[severity(fatal)]
    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
