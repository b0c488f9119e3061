//! Configuration types for the alert agent.

use crate::error::{AlfredError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level agent configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlfredConfig {
    /// Account service endpoints and session cookie lookup.
    pub service: ServiceConfig,
    /// Alarm naming.
    pub alarm: AlarmConfig,
    /// Notification text and icon.
    pub notifications: NotificationConfig,
    /// External signals that restart the agent.
    pub triggers: TriggerConfig,
    /// Log level and optional log file directory.
    pub logging: LoggingConfig,
}

/// Account service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Endpoint returning `{"user": {...}}` for the signed-in user.
    pub profile_url: String,
    /// Surface opened when the user acknowledges the login prompt.
    pub login_url: String,
    /// Surface opened when the user acknowledges an alert prompt.
    pub alert_url: String,
    /// Name of the cookie whose presence means a session exists.
    pub session_cookie: String,
    /// Cookie jar file. `None` uses [`crate::alfred_dirs::cookie_jar_file`].
    pub cookie_jar: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            profile_url: "http://localhost:8000/common/accounts/user".to_owned(),
            login_url: "http://localhost:4200".to_owned(),
            alert_url: "http://localhost:4200/alerts".to_owned(),
            session_cookie: "sessionid".to_owned(),
            cookie_jar: None,
        }
    }
}

impl ServiceConfig {
    /// Resolved cookie jar path.
    #[must_use]
    pub fn cookie_jar_path(&self) -> PathBuf {
        self.cookie_jar
            .clone()
            .unwrap_or_else(crate::alfred_dirs::cookie_jar_file)
    }
}

/// Alarm configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    /// Prefix of every alarm name this agent creates. Fired alarms without it
    /// are treated as foreign and ignored.
    pub base_name: String,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            base_name: "alfred-alert-".to_owned(),
        }
    }
}

/// Notification content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Icon attached to every notification.
    pub icon: String,
    pub login_title: String,
    pub login_message: String,
    pub alert_title: String,
    /// Alert message template. `{first_name}` is replaced with the user's
    /// first name.
    pub alert_message: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            icon: "images/alfred_w_128.png".to_owned(),
            login_title: "Alfred".to_owned(),
            login_message: "Login to Alfred".to_owned(),
            alert_title: "Alfred".to_owned(),
            alert_message: "Hi {first_name}! You have new alerts.".to_owned(),
        }
    }
}

/// Trigger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// URL patterns (with `*` wildcards) of responses that mean the user just
    /// signed in or changed their alert hours.
    pub auth_response_patterns: Vec<String>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            auth_response_patterns: vec![
                "http://localhost:4200/common/accounts/signin*".to_owned(),
                "http://localhost:8000/common/accounts/alert-time*".to_owned(),
            ],
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file here.
    pub file_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            file_dir: None,
        }
    }
}

impl AlfredConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AlfredError::Config(e.to_string()))
    }

    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::from_file(path) {
            Ok(config) => Ok(config),
            Err(AlfredError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AlfredError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path.
    ///
    /// `ALFRED_CONFIG` takes precedence over the platform config directory.
    pub fn default_config_path() -> PathBuf {
        match std::env::var_os("ALFRED_CONFIG") {
            Some(path) => PathBuf::from(path),
            None => crate::alfred_dirs::config_file(),
        }
    }

    /// Check that URLs parse and required names are non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`AlfredError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("service.profile_url", &self.service.profile_url),
            ("service.login_url", &self.service.login_url),
            ("service.alert_url", &self.service.alert_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| AlfredError::Config(format!("{field} is not a valid URL: {e}")))?;
        }

        if self.service.session_cookie.trim().is_empty() {
            return Err(AlfredError::Config(
                "service.session_cookie must not be empty".to_owned(),
            ));
        }
        if self.alarm.base_name.trim().is_empty() {
            return Err(AlfredError::Config(
                "alarm.base_name must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}
