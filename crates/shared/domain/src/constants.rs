//! Well-known parameter keys understood by the container itself.

/// Parameter carrying a pre-built configuration object for a Service.
pub const CONFIG_TARGET: &str = "config-target";
/// Parameter naming the Loader that produces a Service's configuration object.
pub const CONFIG_CLASS: &str = "config-class";
/// `CONFIG_TARGET` value meaning "the record itself is the configuration object".
pub const SELF_TARGET: &str = "$self";
/// Client parameter requesting an immediate connect after creation.
pub const CONNECT_ON_CREATE: &str = "connect-on-create";
/// Parameter naming the file read by the file-backed Loader.
pub const CONFIG_PATH: &str = "config-path";
