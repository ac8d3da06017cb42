//! CLI configuration
//!
//! Settings are resolved once at start-up: built-in defaults, then the TOML
//! config file, then flags and environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};
use tidemark_storage::PostgresSettings;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "tidemark.toml";

/// Resolved configuration for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the migration files
    pub dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub sslmode: String,
    /// Use this SQLite file instead of PostgreSQL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqlite: Option<PathBuf>,
    /// External highlighter command for echoed SQL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            host: "localhost".to_string(),
            port: 5432,
            database: "postgres".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            sslmode: "disable".to_string(),
            sqlite: None,
            highlight: None,
        }
    }
}

impl Settings {
    /// Load the config file (explicit path, or `tidemark.toml` if present)
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        let settings = toml::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)
            .with_context(|| format!("Cannot write config file {}", path.display()))?;
        Ok(())
    }

    /// PostgreSQL connection parameters
    pub fn postgres(&self) -> PostgresSettings {
        PostgresSettings {
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            ssl_mode: self.sslmode.clone(),
        }
    }

    /// Key/value pairs for display, with the password masked
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let password = if self.password.is_empty() {
            "(not set)".to_string()
        } else {
            "********".to_string()
        };
        let optional = |value: Option<String>| value.unwrap_or_else(|| "(not set)".to_string());

        vec![
            ("dir", self.dir.display().to_string()),
            ("host", self.host.clone()),
            ("port", self.port.to_string()),
            ("database", self.database.clone()),
            ("user", self.user.clone()),
            ("password", password),
            ("sslmode", self.sslmode.clone()),
            ("sqlite", optional(self.sqlite.as_ref().map(|p| p.display().to_string()))),
            ("highlight", optional(self.highlight.clone())),
        ]
    }
}

/// Flag/environment overrides for [`Settings`]
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Directory where migration files are located (default: current directory)
    #[arg(short, long, global = true, env = "TIDEMARK_DIR")]
    pub dir: Option<PathBuf>,

    /// Server address
    #[arg(long, global = true, env = "TIDEMARK_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, global = true, env = "TIDEMARK_PORT")]
    pub port: Option<u16>,

    /// Database name
    #[arg(long = "db", global = true, env = "TIDEMARK_DB")]
    pub database: Option<String>,

    /// User
    #[arg(long, global = true, env = "TIDEMARK_USER")]
    pub user: Option<String>,

    /// Password
    #[arg(long, global = true, env = "TIDEMARK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// TLS mode: disable, allow, prefer, require, verify-ca, verify-full
    #[arg(long, global = true, env = "TIDEMARK_SSLMODE")]
    pub sslmode: Option<String>,

    /// Use a SQLite database file instead of PostgreSQL
    #[arg(long, global = true, env = "TIDEMARK_SQLITE")]
    pub sqlite: Option<PathBuf>,

    /// Pipe echoed SQL through this command, e.g. "pygmentize -l sql"
    #[arg(long, global = true, env = "TIDEMARK_HIGHLIGHT")]
    pub highlight: Option<String>,
}

impl SettingsArgs {
    /// Apply every provided override on top of `settings`
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(dir) = &self.dir {
            settings.dir = dir.clone();
        }
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(database) = &self.database {
            settings.database = database.clone();
        }
        if let Some(user) = &self.user {
            settings.user = user.clone();
        }
        if let Some(password) = &self.password {
            settings.password = password.clone();
        }
        if let Some(sslmode) = &self.sslmode {
            settings.sslmode = sslmode.clone();
        }
        if let Some(sqlite) = &self.sqlite {
            settings.sqlite = Some(sqlite.clone());
        }
        if let Some(highlight) = &self.highlight {
            settings.highlight = Some(highlight.clone());
        }
        settings
    }
}
