//! Configuration loading for the pgusers CLI
//!
//! Priority order (highest to lowest):
//! 1. Command-line flags
//! 2. Environment variables (DATABASE_HOST, DATABASE_PORT, ...), including
//!    those loaded from ./.env
//! 3. ./pgusers.toml `[database]` section
//! 4. Built-in defaults
//!
//! The password is only ever read from DATABASE_PASSWORD.
//! ./.env is loaded by `main` before flags are parsed.

use std::path::Path;

use anyhow::{bail, Result};
use clap::Args;
use pgusers_db::ConnectionConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Environment variable holding the database password
pub const PASSWORD_VAR: &str = "DATABASE_PASSWORD";

/// Project-local config file
pub const LOCAL_CONFIG: &str = "pgusers.toml";

/// Database password from the environment.
pub fn database_password() -> Result<String> {
    match std::env::var(PASSWORD_VAR) {
        Ok(password) if !password.is_empty() => Ok(password),
        _ => bail!("You need to set the {} environment variable.", PASSWORD_VAR),
    }
}

/// Connection flags; each falls back to its environment variable
#[derive(Args, Debug, Clone, Default)]
pub struct DbArgs {
    /// Database server host
    #[arg(long, env = "DATABASE_HOST")]
    pub host: Option<String>,

    /// Database server port
    #[arg(long, env = "DATABASE_PORT")]
    pub port: Option<String>,

    /// Database user
    #[arg(long, env = "DATABASE_USER")]
    pub user: Option<String>,

    /// Database name
    #[arg(long = "database", env = "DATABASE_NAME")]
    pub database: Option<String>,
}

// ============================================================================
// TOML Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PgusersConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            name: default_name(),
        }
    }
}

// Default value functions for serde
fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_name() -> String {
    "postgres".to_string()
}

impl PgusersConfig {
    /// Load ./pgusers.toml, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(Path::new(LOCAL_CONFIG))
    }

    /// Load config from `path`. Missing or unparsable files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<PgusersConfig>(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                debug!("Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Assemble connection settings, letting `args` override the file.
    pub fn connection(&self, args: &DbArgs, password: String) -> ConnectionConfig {
        let db = &self.database;
        ConnectionConfig::new(
            args.host.clone().unwrap_or_else(|| db.host.clone()),
            args.port.clone().unwrap_or_else(|| db.port.to_string()),
            args.user.clone().unwrap_or_else(|| db.user.clone()),
            password,
            args.database.clone().unwrap_or_else(|| db.name.clone()),
        )
    }
}
