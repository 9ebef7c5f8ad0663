//! User settings.
//!
//! Settings live in the user's config directory (typically
//! ~/.config/shadow/config.toml) and cover where the library is stored, the
//! hotkey bindings and the auto-replay behaviour. Missing keys fall back to
//! their defaults, so a partial file is always valid.

use crate::hotkeys::{HotkeyAction, KeyMap};
use crate::session::AutoReplay;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

const APP_DIR: &str = "shadow";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to find config directory")]
    NoConfigDir,
    #[error("config I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("unknown configuration key: {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_library_dir")]
    pub library_dir: String,
    #[serde(default)]
    pub auto_replay: AutoReplay,
    /// Bindings from action name to key code. Actions left out are unbound.
    #[serde(default)]
    pub keys: KeyMap,
}

fn default_library_dir() -> String {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR).join("library"))
        .unwrap_or_else(|| PathBuf::from("~/.shadow/library"))
        .display()
        .to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    pub fn new() -> Self {
        Self {
            library_dir: default_library_dir(),
            auto_replay: AutoReplay::default(),
            keys: KeyMap::default(),
        }
    }

    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        // XDG_CONFIG_HOME wins so tests can point elsewhere
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join(APP_DIR)
        } else {
            dirs::config_dir()
                .ok_or(ConfigError::NoConfigDir)?
                .join(APP_DIR)
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Like [`load`](Self::load), but a broken file degrades to defaults.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            log::warn!("Using default settings: {e}");
            Self::default()
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        fs::write(Self::config_path()?, toml_string)?;

        Ok(())
    }

    pub fn exists() -> Result<bool, ConfigError> {
        Ok(Self::config_path()?.exists())
    }

    /// The library directory with `~` and environment variables expanded.
    pub fn library_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.library_dir).as_ref())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        match key {
            "library_dir" => {
                if value.trim().is_empty() {
                    return Err(invalid("path must not be empty"));
                }
                self.library_dir = value.to_string();
            }
            "auto_replay.count" => {
                self.auto_replay.count = value
                    .parse()
                    .map_err(|_| invalid("expected a non-negative whole number"))?;
            }
            "auto_replay.interval" => {
                let seconds: f64 = value
                    .parse()
                    .map_err(|_| invalid("expected a number of seconds"))?;
                if !seconds.is_finite() || seconds < 0.0 {
                    return Err(invalid("interval must be zero or more seconds"));
                }
                self.auto_replay.interval_seconds = seconds;
            }
            _ => {
                let Some(action) = key.strip_prefix("keys.") else {
                    return Err(ConfigError::UnknownKey(key.to_string()));
                };
                let action: HotkeyAction = action
                    .parse()
                    .map_err(|_| ConfigError::UnknownKey(key.to_string()))?;
                if value.eq_ignore_ascii_case("none") || value.is_empty() {
                    self.keys.unbind(action);
                } else {
                    self.keys.bind(action, value);
                }
            }
        }
        Ok(())
    }
}
