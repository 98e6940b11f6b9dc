//! Configuration loading, role resolution, and layered merging for vimai.
//!
//! Settings load from `~/.config/vimai/config.toml` with environment
//! variable overrides. Each editor command reads its defaults as
//! `built-in defaults <- [<command>] table of the settings file`.

pub mod defaults;
pub mod ini;
pub mod options;
pub mod roles;
pub mod value;

pub use defaults::builtin_defaults;
pub use options::make_options;
pub use roles::{DEFAULT_ROLE_NAME, RoleConfig, RoleGenerator, RoleStore};
pub use value::{ConfigMap, ConfigValue, merge_deep};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use vimai_core::CommandType;

/// The root settings structure.
///
/// Maps directly to `~/.config/vimai/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// User role file, read after the bundled roles
    #[serde(default = "default_roles_config_file")]
    pub roles_config_file: PathBuf,

    /// Write debug logs to `debug_log_file`
    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_debug_log_file")]
    pub debug_log_file: PathBuf,

    /// Overrides for the chat command
    #[serde(default)]
    pub chat: ConfigMap,

    /// Overrides for the complete command
    #[serde(default)]
    pub complete: ConfigMap,

    /// Overrides for the edit command
    #[serde(default)]
    pub edit: ConfigMap,

    /// Overrides for the image command
    #[serde(default)]
    pub image: ConfigMap,
}

fn default_roles_config_file() -> PathBuf {
    Settings::config_dir().join("roles.ini")
}
fn default_debug_log_file() -> PathBuf {
    std::env::temp_dir().join("vimai_debug.log")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            roles_config_file: default_roles_config_file(),
            debug: false,
            debug_log_file: default_debug_log_file(),
            chat: ConfigMap::new(),
            complete: ConfigMap::new(),
            edit: ConfigMap::new(),
            image: ConfigMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from the default path (or `VIMAI_CONFIG`).
    ///
    /// `VIMAI_ROLES_CONFIG_FILE` overrides the role file location.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os("VIMAI_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_path);
        let mut settings = Self::load_from(&path)?;

        if let Some(roles_file) = std::env::var_os("VIMAI_ROLES_CONFIG_FILE") {
            settings.roles_config_file = PathBuf::from(roles_file);
        }

        Ok(settings)
    }

    /// Load settings from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No settings file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            source_name: path.display().to_string(),
            line: 0,
            reason: e.to_string(),
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        match std::env::var_os("XDG_CONFIG_HOME") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir).join("vimai"),
            _ => dirs_home().join(".config").join("vimai"),
        }
    }

    /// The default settings file path.
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// The user table for one command.
    pub fn command_overrides(&self, command_type: CommandType) -> &ConfigMap {
        match command_type {
            CommandType::Chat => &self.chat,
            CommandType::Complete => &self.complete,
            CommandType::Edit => &self.edit,
            CommandType::Image => &self.image,
        }
    }

    /// Built-in defaults with the user table merged over them.
    pub fn command_defaults(&self, command_type: CommandType) -> ConfigMap {
        merge_deep([&builtin_defaults(command_type), self.command_overrides(command_type)])
    }

    /// Role store over the bundled roles and the configured role file.
    pub fn role_store(&self) -> RoleStore {
        RoleStore::new(&self.roles_config_file)
    }

    /// Validate the settings.
    fn validate(&self) -> Result<(), ConfigError> {
        for command_type in CommandType::ALL {
            let table = self.command_overrides(command_type);
            for key in ["options", "ui"] {
                if table.get(key).is_some_and(|v| !v.is_map()) {
                    return Err(ConfigError::ValidationError(format!(
                        "[{command_type}] {key} must be a table"
                    )));
                }
            }
            if table.get("prompt").is_some_and(|v| v.as_str().is_none()) {
                return Err(ConfigError::ValidationError(format!(
                    "[{command_type}] prompt must be a string"
                )));
            }
        }
        Ok(())
    }

    /// Generate a default settings TOML string.
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&Self::default())
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse {source_name} (line {line}): {reason}")]
    ParseError {
        source_name: String,
        line: usize,
        reason: String,
    },

    #[error("Unrecognized key '{key}' in role section [{section}]")]
    InvalidRoleKey { section: String, key: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Role `{0}` not found")]
    RoleNotFound(String),
}

impl From<ConfigError> for vimai_core::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::RoleNotFound(name) => vimai_core::Error::RoleNotFound(name),
            other => vimai_core::Error::Config {
                message: other.to_string(),
            },
        }
    }
}
