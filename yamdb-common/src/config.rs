//! Bootstrap configuration and root folder resolution
//!
//! The TOML file holds what is needed before the database opens (paths,
//! listen address, logging, locale, mail). Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `YAMDB_ROOT_FOLDER` environment variable
//! 3. `root_folder` in the TOML config file
//! 4. OS-dependent default (fallback)

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::db::settings::RuntimeSettings;
use crate::mail::MailBackend;
use crate::messages::{Locale, Messages};
use crate::{Error, Result};

pub const ROOT_FOLDER_ENV: &str = "YAMDB_ROOT_FOLDER";
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
const DATABASE_FILE_NAME: &str = "yamdb.db";
const OUTBOX_DIR_NAME: &str = "outbox";

/// Contents of `config.toml`; every field is optional
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,

    /// SQLite file; relative paths are taken from the root folder
    pub database_path: Option<PathBuf>,

    pub bind: String,
    pub port: u16,
    pub locale: Locale,
    pub logging: LoggingConfig,
    pub mail: MailConfig,

    /// Overrides the `access_token_lifetime_secs` setting
    pub access_token_lifetime_secs: Option<i64>,

    /// Overrides the `default_page_limit` setting
    pub default_page_limit: Option<i64>,

    /// Per-key message overrides, e.g. `wrong_code = "..."`
    pub messages: HashMap<String, String>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            database_path: None,
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            locale: Locale::default(),
            logging: LoggingConfig::default(),
            mail: MailConfig::default(),
            access_token_lifetime_secs: None,
            default_page_limit: None,
            messages: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub backend: MailBackend,
    pub from: String,
    /// Outbox for the `file` backend; defaults to `<root>/outbox`
    pub outbox_dir: Option<PathBuf>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            backend: MailBackend::default(),
            from: "noreply@yamdb.local".to_string(),
            outbox_dir: None,
        }
    }
}

impl TomlConfig {
    /// Parse a config file that must exist
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load an explicitly requested file, or the platform default file if
    /// it exists. A missing default file is not an error.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                warn!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        match &self.database_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => root_folder.join(path),
            None => root_folder.join(DATABASE_FILE_NAME),
        }
    }

    pub fn outbox_dir(&self, root_folder: &Path) -> PathBuf {
        match &self.mail.outbox_dir {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => root_folder.join(path),
            None => root_folder.join(OUTBOX_DIR_NAME),
        }
    }

    /// Message table for the configured locale with overrides applied
    pub fn messages(&self) -> Result<Messages> {
        Messages::new(self.locale).with_overrides(&self.messages)
    }

    /// Apply file overrides on top of the database settings
    pub fn apply_to(&self, mut settings: RuntimeSettings) -> Result<RuntimeSettings> {
        if let Some(lifetime) = self.access_token_lifetime_secs {
            if lifetime <= 0 {
                return Err(Error::Config(
                    "access_token_lifetime_secs must be positive".to_string(),
                ));
            }
            settings.access_token_lifetime_secs = lifetime;
        }
        if let Some(limit) = self.default_page_limit {
            if limit <= 0 {
                return Err(Error::Config("default_page_limit must be positive".to_string()));
            }
            settings.default_page_limit = limit;
        }
        Ok(settings)
    }
}

/// Resolve the root folder following the priority order in the module docs
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// `<config dir>/yamdb/config.toml`, e.g. `~/.config/yamdb/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("yamdb").join("config.toml"))
}

/// OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/yamdb (or /var/lib/yamdb for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("yamdb"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/yamdb"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("yamdb"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/yamdb"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("yamdb"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\yamdb"))
    } else {
        PathBuf::from("./yamdb_data")
    }
}
