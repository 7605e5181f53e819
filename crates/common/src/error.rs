//! Common error types

use thiserror::Error;

/// Errors shared across the workspace (configuration loading and IO).
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = Error::Config("listen_addr missing".into());
        assert_eq!(err.to_string(), "Configuration error: listen_addr missing");

        let io = Error::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "tokens.json",
        ));
        assert!(io.to_string().starts_with("I/O error:"), "got: {io}");
    }

    #[test]
    fn debug_includes_variant() {
        let err = Error::Config("bad value".into());
        assert!(format!("{err:?}").contains("Config"));
    }
}
