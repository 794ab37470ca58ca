use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CoreError;

/// Load a .env file (silently ignores if missing).
///
/// Variables already present in the process environment win over the file.
pub fn load_dotenv(path: &Path) {
    match dotenvy::from_path(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "loaded env file"),
        Err(e) => tracing::debug!(path = %path.display(), error = %e, "env file not loaded"),
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Present keys are taken as-is, empty values included.
fn env_required(key: &str) -> Result<String, CoreError> {
    env::var(key).map_err(|_| CoreError::MissingConfig(key.to_string()))
}

// ── Top-level config ──────────────────────────────────────────

/// Everything a run needs, built once at startup and passed down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseSettings,
    pub source: SourceConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Config with default source and output settings.
    pub fn new(database: DatabaseSettings) -> Self {
        Self {
            database,
            source: SourceConfig::default(),
            output: OutputConfig::default(),
        }
    }

    /// Database credentials from the environment (call `load_dotenv()` first),
    /// defaults for the rest.
    pub fn from_env() -> Result<Self, CoreError> {
        Ok(Self::new(DatabaseSettings::from_env()?))
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  database:  {}", self.database.redacted_url());
        tracing::info!(
            "  source:    url={}, results={}, timeout={}",
            self.source.api_url,
            self.source.results,
            self.source
                .timeout
                .map(|t| format!("{}s", t.as_secs()))
                .unwrap_or_else(|| "none".to_string())
        );
        tracing::info!(
            "  output:    prefix={}, dir={}, top_n={}",
            self.output.table_prefix,
            self.output.output_dir.display(),
            self.output.top_n
        );
    }
}

/// Where the tables live: credentials from the settings file, or a complete
/// sqlx URL given explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DatabaseSettings {
    Credentials(DatabaseConfig),
    Url(String),
}

impl DatabaseSettings {
    pub fn from_env() -> Result<Self, CoreError> {
        Ok(Self::Credentials(DatabaseConfig::from_env()?))
    }

    pub fn connection_url(&self) -> Result<String, CoreError> {
        match self {
            Self::Credentials(cfg) => cfg.connection_url(),
            Self::Url(url) => Ok(url.clone()),
        }
    }

    pub fn redacted_url(&self) -> String {
        match self {
            Self::Credentials(cfg) => cfg.redacted_url(),
            Self::Url(url) => redact_url(url),
        }
    }
}

/// Mask the password of a URL, if it has one.
pub fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            if url.set_password(Some("***")).is_ok() {
                url.to_string()
            } else {
                raw.to_string()
            }
        }
        _ => raw.to_string(),
    }
}

// ── Database ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// URL scheme of the sqlx driver ("mysql").
    pub driver: String,
    pub user: String,
    pub password: String,
    /// Host, optionally with `:port`.
    pub host: String,
    pub database: String,
    pub charset: String,
}

impl DatabaseConfig {
    /// Read `user`, `password`, `host` and `database` (all required, content
    /// unchecked) plus the optional `driver` and `charset` keys.
    pub fn from_env() -> Result<Self, CoreError> {
        Ok(Self {
            driver: env_opt("driver").unwrap_or_else(|| "mysql".to_string()),
            user: env_required("user")?,
            password: env_required("password")?,
            host: env_required("host")?,
            database: env_required("database")?,
            charset: env_opt("charset").unwrap_or_else(|| "utf8".to_string()),
        })
    }

    /// `{driver}://{user}:{password}@{host}/{database}?charset={charset}` with
    /// user and password percent-encoded.
    pub fn connection_url(&self) -> Result<String, CoreError> {
        Ok(self.build_url(&self.password)?.to_string())
    }

    /// Same as [`connection_url`](Self::connection_url) with the password masked.
    pub fn redacted_url(&self) -> String {
        match self.build_url("***") {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}://{}@{}/{}", self.driver, self.user, self.host, self.database),
        }
    }

    fn build_url(&self, password: &str) -> Result<Url, CoreError> {
        let base = format!("{}://{}/{}", self.driver, self.host, self.database);
        let mut url = Url::parse(&base)
            .map_err(|e| CoreError::InvalidConfig(format!("database url '{}': {}", base, e)))?;
        url.set_username(&self.user)
            .map_err(|_| CoreError::InvalidConfig(format!("cannot set user on '{}'", base)))?;
        url.set_password(Some(password))
            .map_err(|_| CoreError::InvalidConfig(format!("cannot set password on '{}'", base)))?;
        url.query_pairs_mut().append_pair("charset", &self.charset);
        Ok(url)
    }
}

// ── Source API ────────────────────────────────────────────────

pub const DEFAULT_API_URL: &str = "https://randomuser.me/api/";
pub const DEFAULT_RESULTS: usize = 4500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub api_url: String,
    /// Number of records requested.
    pub results: usize,
    /// HTTP timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            results: DEFAULT_RESULTS,
            timeout: None,
        }
    }
}

// ── Output ────────────────────────────────────────────────────

pub const DEFAULT_TABLE_PREFIX: &str = "usersplit_test";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub table_prefix: String,
    /// Directory receiving `first.json` and `second.json`.
    pub output_dir: PathBuf,
    /// Rows taken per gender for the top table.
    pub top_n: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
            output_dir: PathBuf::from("."),
            top_n: 20,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
