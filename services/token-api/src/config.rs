//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The registry section maps project names to the packages tokens may
//! be scoped to; deployments fronting a real registry replace
//! `PackageDirectory` behind the `PackageLookup` seam instead.

use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// Token persistence settings
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub tokens_file: PathBuf,
}

/// Known projects and their packages, for package-scoped tokens.
#[derive(Debug, Default, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub projects: HashMap<String, Vec<String>>,
}

fn default_max_connections() -> usize {
    1000
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        if config.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        if config.storage.tokens_file.parent().is_none() {
            return Err(common::Error::Config(
                "tokens_file must have a parent directory".into(),
            ));
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("token-api.toml")
    }
}
