//! Notification configuration.
//!
//! Configuration is loaded from `~/.config/turnbell/config.toml`. Every field
//! is optional; a missing default file means built-in defaults.
//!
//! ## Example Configuration
//!
//! ```toml
//! [notification]
//! title = "pi"
//! message = "Turn complete"
//! title_max_length = 64
//! message_max_length = 180
//!
//! # Optional custom notifier; {title} and {body} are substituted per argument.
//! command = ["terminal-notifier", "-title", "{title}", "-message", "{body}"]
//! # Spawn the command without waiting for it to exit.
//! detach = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// Configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnbellConfig {
    /// Notification text and dispatch settings
    #[serde(default)]
    pub notification: NotificationSettings,
}

/// Notification text and dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Notification title (default: "turnbell")
    #[serde(default = "default_title")]
    pub title: String,

    /// Notification body (default: "Turn complete")
    #[serde(default = "default_message")]
    pub message: String,

    /// Shown when the title is empty after sanitization
    #[serde(default = "default_title")]
    pub title_fallback: String,

    /// Shown when the body is empty after sanitization
    #[serde(default = "default_message")]
    pub message_fallback: String,

    /// Maximum title length in characters (default: 64)
    #[serde(default = "default_title_max_length")]
    pub title_max_length: usize,

    /// Maximum body length in characters (default: 180)
    #[serde(default = "default_message_max_length")]
    pub message_max_length: usize,

    /// Custom notifier command, run without a shell
    #[serde(default)]
    pub command: Option<Vec<String>>,

    /// Do not wait for the custom command to exit
    #[serde(default)]
    pub detach: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            title: default_title(),
            message: default_message(),
            title_fallback: default_title(),
            message_fallback: default_message(),
            title_max_length: default_title_max_length(),
            message_max_length: default_message_max_length(),
            command: None,
            detach: false,
        }
    }
}

fn default_title() -> String {
    "turnbell".to_string()
}

fn default_message() -> String {
    "Turn complete".to_string()
}

const fn default_title_max_length() -> usize {
    64
}

const fn default_message_max_length() -> usize {
    180
}

impl TurnbellConfig {
    /// Loads configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist. The default file is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An explicit config file doesn't exist
    /// - The file cannot be read
    /// - Deserialization or validation fails
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "Configuration file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => {
                let path = Self::config_path()?;
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        Self::load_from(&path)
    }

    /// Loads and validates the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        let config: Self = toml::from_str(&contents)?;
        config.validate()?;

        Ok(config)
    }

    /// Returns the default configuration file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                CliError::Config("Failed to determine config directory".to_string())
            })?
            .join("turnbell");

        Ok(config_dir.join("config.toml"))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A max length is zero
    /// - A fallback text is empty
    /// - A custom command has no program
    pub fn validate(&self) -> Result<()> {
        let settings = &self.notification;

        if settings.title_max_length == 0 || settings.message_max_length == 0 {
            return Err(CliError::Config(
                "Notification max lengths must be greater than zero".to_string(),
            ));
        }

        if settings.title_fallback.trim().is_empty() || settings.message_fallback.trim().is_empty()
        {
            return Err(CliError::Config(
                "Notification fallback texts must not be empty".to_string(),
            ));
        }

        if let Some(command) = &settings.command
            && command.first().is_none_or(|program| program.trim().is_empty())
        {
            return Err(CliError::Config(
                "Notification command must start with a program".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use std::io::Write;

    use super::*;

    fn sample_config_toml() -> &'static str {
        r#"
[notification]
title = "pi"
message = "Ready for input"
title_max_length = 32
command = ["terminal-notifier", "-title", "{title}", "-message", "{body}"]
detach = true
        "#
    }

    #[test]
    fn test_parse_config() {
        let config: TurnbellConfig = toml::from_str(sample_config_toml()).unwrap();
        let settings = &config.notification;

        assert_eq!(settings.title, "pi");
        assert_eq!(settings.message, "Ready for input");
        assert_eq!(settings.title_max_length, 32);
        assert_eq!(settings.message_max_length, 180);
        assert_eq!(settings.title_fallback, "turnbell");
        assert_eq!(settings.command.as_ref().map(Vec::len), Some(5));
        assert!(settings.detach);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: TurnbellConfig = toml::from_str("").unwrap();

        assert_eq!(config.notification.title, "turnbell");
        assert_eq!(config.notification.message, "Turn complete");
        assert!(config.notification.command.is_none());
        assert!(!config.notification.detach);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_max_length() {
        let config: TurnbellConfig =
            toml::from_str("[notification]\nmessage_max_length = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_fallback() {
        let config: TurnbellConfig =
            toml::from_str("[notification]\ntitle_fallback = \"  \"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_command() {
        let config: TurnbellConfig = toml::from_str("[notification]\ncommand = []").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_config_toml().as_bytes()).unwrap();

        let config = TurnbellConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.notification.title, "pi");
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("config.toml");

        let result = TurnbellConfig::load(Some(&missing));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[notification\ntitle = ").unwrap();

        let result = TurnbellConfig::load_from(file.path());
        assert!(matches!(result, Err(CliError::Toml(_))));
    }
}
