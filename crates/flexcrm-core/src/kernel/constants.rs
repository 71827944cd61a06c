/// Application name
pub const APP_NAME: &str = "FlexCRM";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "flexcrm.toml";
