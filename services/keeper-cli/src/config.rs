//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The client secret is loaded from KEEPER_CLIENT_SECRET or client_secret_file,
//! never stored in the TOML directly to avoid leaking secrets.

use common::Secret;
use keeper_auth::{ClientOptions, DEFAULT_ENDPOINT};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const SECRET_ENV: &str = "KEEPER_CLIENT_SECRET";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Log at debug level unless LOG_LEVEL / RUST_LOG say otherwise
    #[serde(default)]
    pub debug: bool,
    /// Where credentials are loaded from and persisted to
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
    pub client: ClientConfig,
}

/// OAuth client registration
#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    pub client_id: String,
    #[serde(default = "default_offline")]
    pub offline: bool,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    /// Path to a file containing the secret (alternative to KEEPER_CLIENT_SECRET)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    pub redirect_uri: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_owned()
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("keeper-credentials.json")
}

fn default_offline() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Client secret resolution order:
    /// 1. KEEPER_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let mut config = Self::load_endpoint_only(path)?;

        if config.client.client_id.trim().is_empty() {
            return Err(common::Error::Config("client.client_id must not be empty".into()));
        }

        if let Ok(secret) = std::env::var(SECRET_ENV) {
            config.client.client_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.client.client_secret_file {
            let secret = std::fs::read_to_string(secret_file)
                .map_err(|e| common::Error::io(secret_file, e))?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.client.client_secret = Some(Secret::new(secret));
            }
        }

        match config.client.client_secret {
            Some(ref secret) if !secret.is_blank() => Ok(config),
            _ => Err(common::Error::MissingSecret),
        }
    }

    /// Parse and validate the endpoint only. Client registration and secret
    /// are left unchecked, for commands that never authenticate.
    pub fn load_endpoint_only(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| common::Error::io(path, e))?;
        let config: Config = toml::from_str(&contents)?;

        if !config.endpoint.starts_with("http://") && !config.endpoint.starts_with("https://") {
            return Err(common::Error::Config(format!(
                "endpoint must start with http:// or https://, got: {}",
                config.endpoint
            )));
        }
        Ok(config)
    }

    /// Resolve config file path from CLI arg or KEEPER_CONFIG env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("KEEPER_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("keeper.toml")
    }

    /// SDK client options. `load` guarantees the secret is present.
    pub fn client_options(&self) -> ClientOptions {
        let secret = self.client.client_secret.clone().unwrap_or_else(|| Secret::new(String::new()));
        ClientOptions::new(self.client.client_id.clone(), secret).offline(self.client.offline)
    }
}
