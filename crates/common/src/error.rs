//! Configuration error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("client secret missing: set KEEPER_CLIENT_SECRET or client.client_secret_file")]
    MissingSecret,

    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Wrap an I/O failure with the path that caused it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias using the configuration Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_the_problem() {
        let err = Error::Config("client_id must not be empty".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: client_id must not be empty"
        );
    }

    #[test]
    fn io_error_includes_path() {
        let err = Error::io(
            "/etc/keeper.toml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("reading /etc/keeper.toml:"), "got: {msg}");
        assert!(msg.contains("no such file"), "got: {msg}");
    }

    #[test]
    fn missing_secret_points_at_both_sources() {
        let msg = Error::MissingSecret.to_string();
        assert!(msg.contains("KEEPER_CLIENT_SECRET"));
        assert!(msg.contains("client_secret_file"));
    }
}
