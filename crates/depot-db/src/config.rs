//! # Ledger Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     DEPOT_DB_PATH=/var/lib/depot/depot.db                              │
//! │     DEPOT_MAX_CONNECTIONS=8                                            │
//! │     DEPOT_BUSY_TIMEOUT_MS=5000                                         │
//! │     DEPOT_LOCK_TIMEOUT_MS=10000                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/depot/depot.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.depot.ledger/depot.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # depot.toml
//! [database]
//! path = "/var/lib/depot/depot.db"
//! max_connections = 5
//! busy_timeout_ms = 5000
//!
//! [ledger]
//! lock_timeout_ms = 10000
//!
//! [codes]
//! inbound = "IN"
//! outbound = "OUT"
//! mutation = "MUT"
//! opname = "OPN"
//! ```

use depot_core::validation::validate_code_prefix;
use depot_core::DocumentKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::pool::DbConfig;
use crate::workflow::LedgerSettings;

// =============================================================================
// Config Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits on SQLite's write lock.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "depot", "ledger")
        .map(|dirs| dirs.data_dir().join("depot.db"))
        .unwrap_or_else(|| PathBuf::from("depot.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5_000
}

impl Default for DatabaseSection {
    fn default() -> Self {
        DatabaseSection {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

/// `[ledger]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSection {
    /// Upper bound on waiting for a stock line lock before a workflow fails
    /// with a concurrency conflict.
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_ms: u64,
}

fn default_lock_timeout() -> u64 {
    10_000
}

impl Default for LedgerSection {
    fn default() -> Self {
        LedgerSection {
            lock_timeout_ms: default_lock_timeout(),
        }
    }
}

/// `[codes]`: document code prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePrefixes {
    #[serde(default = "default_inbound_prefix")]
    pub inbound: String,
    #[serde(default = "default_outbound_prefix")]
    pub outbound: String,
    #[serde(default = "default_mutation_prefix")]
    pub mutation: String,
    #[serde(default = "default_opname_prefix")]
    pub opname: String,
}

fn default_inbound_prefix() -> String {
    DocumentKind::Inbound.default_prefix().to_string()
}

fn default_outbound_prefix() -> String {
    DocumentKind::Outbound.default_prefix().to_string()
}

fn default_mutation_prefix() -> String {
    DocumentKind::Mutation.default_prefix().to_string()
}

fn default_opname_prefix() -> String {
    DocumentKind::Opname.default_prefix().to_string()
}

impl Default for CodePrefixes {
    fn default() -> Self {
        CodePrefixes {
            inbound: default_inbound_prefix(),
            outbound: default_outbound_prefix(),
            mutation: default_mutation_prefix(),
            opname: default_opname_prefix(),
        }
    }
}

impl CodePrefixes {
    pub fn prefix(&self, kind: DocumentKind) -> &str {
        match kind {
            DocumentKind::Inbound => &self.inbound,
            DocumentKind::Outbound => &self.outbound,
            DocumentKind::Mutation => &self.mutation,
            DocumentKind::Opname => &self.opname,
        }
    }
}

// =============================================================================
// LedgerConfig
// =============================================================================

/// Complete configuration for a ledger process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub database: DatabaseSection,

    #[serde(default)]
    pub ledger: LedgerSection,

    #[serde(default)]
    pub codes: CodePrefixes,
}

impl LedgerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (depot.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading ledger config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.ledger.lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "ledger.lock_timeout_ms must be greater than 0".into(),
            ));
        }

        for (field, prefix) in [
            ("codes.inbound", &self.codes.inbound),
            ("codes.outbound", &self.codes.outbound),
            ("codes.mutation", &self.codes.mutation),
            ("codes.opname", &self.codes.opname),
        ] {
            validate_code_prefix(field, prefix)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }

        Ok(())
    }

    /// Applies `DEPOT_*` overrides from `lookup` (the process environment
    /// in [`LedgerConfig::load`]).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("DEPOT_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(value) = lookup("DEPOT_MAX_CONNECTIONS") {
            match value.parse::<u32>() {
                Ok(max) => self.database.max_connections = max,
                Err(_) => warn!(value = %value, "Ignoring invalid DEPOT_MAX_CONNECTIONS"),
            }
        }

        if let Some(value) = lookup("DEPOT_BUSY_TIMEOUT_MS") {
            match value.parse::<u64>() {
                Ok(ms) => self.database.busy_timeout_ms = ms,
                Err(_) => warn!(value = %value, "Ignoring invalid DEPOT_BUSY_TIMEOUT_MS"),
            }
        }

        if let Some(value) = lookup("DEPOT_LOCK_TIMEOUT_MS") {
            match value.parse::<u64>() {
                Ok(ms) => self.ledger.lock_timeout_ms = ms,
                Err(_) => warn!(value = %value, "Ignoring invalid DEPOT_LOCK_TIMEOUT_MS"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "depot", "ledger")
            .map(|dirs| dirs.config_dir().join("depot.toml"))
    }

    // =========================================================================
    // Derived settings
    // =========================================================================

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
    }

    pub fn ledger_settings(&self) -> LedgerSettings {
        LedgerSettings {
            lock_timeout: Duration::from_millis(self.ledger.lock_timeout_ms),
            prefixes: self.codes.clone(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
