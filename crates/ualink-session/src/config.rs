// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session configuration.
//!
//! [`SessionConfig`] collects everything the session layer needs from its
//! owner: identity, the requested lifetime, reconnection limits and
//! keep-alive settings. It can be built in code or loaded from a YAML, TOML
//! or JSON file, with `${VAR}` / `${VAR:default}` placeholders resolved from
//! the environment before parsing.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use ualink_session::config::{RepairFailurePolicy, SessionConfig};
//!
//! let config = SessionConfig::builder()
//!     .endpoint("opc.tcp://plc-01:4840")
//!     .session_timeout(Duration::from_secs(120))
//!     .max_restore_attempts(3)
//!     .on_repair_failure(RepairFailurePolicy::FailAll)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.reconnection.max_restore_attempts, 3);
//! ```

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ConfigurationError, UaError, UaResult};

// =============================================================================
// SessionConfig
// =============================================================================

/// Configuration of one client session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Server endpoint URL (e.g., "opc.tcp://localhost:4840").
    pub endpoint: String,

    /// Session name shown by the server.
    #[serde(default = "default_session_name")]
    pub session_name: String,

    /// Requested session lifetime. The server may revise it.
    #[serde(default = "default_session_timeout")]
    #[serde(with = "humantime_serde")]
    pub session_timeout: Duration,

    /// Timeout hint placed in every request header.
    #[serde(default = "default_request_timeout")]
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// User identity presented on activation and repair.
    #[serde(default)]
    pub user_identity: UserIdentity,

    /// Preferred locales.
    #[serde(default)]
    pub locale_ids: Vec<String>,

    /// Reconnection and repair limits.
    #[serde(default)]
    pub reconnection: ReconnectionSettings,

    /// Keep-alive probing.
    #[serde(default)]
    pub keep_alive: KeepAliveSettings,

    /// Capacity of the session event channel.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

fn default_session_name() -> String {
    "ualink session".to_string()
}

fn default_session_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_event_channel_capacity() -> usize {
    64
}

impl SessionConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Creates a configuration with just the endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Validates this configuration.
    pub fn validate(&self) -> UaResult<()> {
        if self.endpoint.is_empty() {
            return Err(ConfigurationError::missing_field("endpoint").into());
        }

        if !self.endpoint.starts_with("opc.tcp://") {
            return Err(ConfigurationError::invalid_value(
                "endpoint",
                "Endpoint must start with opc.tcp://",
            )
            .into());
        }

        if self.session_timeout.is_zero() {
            return Err(ConfigurationError::invalid_value(
                "session_timeout",
                "Session timeout must be greater than 0",
            )
            .into());
        }

        if self.event_channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "event_channel_capacity",
                "Event channel capacity must be greater than 0",
            )
            .into());
        }

        self.reconnection.validate()?;
        self.keep_alive.validate()?;
        Ok(())
    }

    /// Loads and validates a configuration file.
    ///
    /// The format is chosen by extension (`.yaml`/`.yml`, `.toml`, `.json`).
    pub fn from_file(path: impl AsRef<Path>) -> UaResult<Self> {
        let path = path.as_ref();
        info!("Loading session configuration from: {}", path.display());

        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            UaError::configuration(ConfigurationError::FileRead {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        })?;

        let config = Self::from_str_with_format(&content, format)?;
        debug!(endpoint = %config.endpoint, "Session configuration loaded");
        Ok(config)
    }

    /// Parses and validates configuration content.
    pub fn from_str_with_format(content: &str, format: ConfigFormat) -> UaResult<Self> {
        let content = resolve_env_placeholders(content);
        let config: Self = format.parse(&content)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            session_name: default_session_name(),
            session_timeout: default_session_timeout(),
            request_timeout: default_request_timeout(),
            user_identity: UserIdentity::default(),
            locale_ids: Vec::new(),
            reconnection: ReconnectionSettings::default(),
            keep_alive: KeepAliveSettings::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

// =============================================================================
// UserIdentity
// =============================================================================

/// The user identity a session is activated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserIdentity {
    /// Anonymous access.
    #[default]
    Anonymous,

    /// Username and password.
    UserName {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },

    /// X.509 certificate.
    Certificate {
        /// Path to the certificate file.
        certificate_path: String,
        /// Path to the private key file.
        private_key_path: String,
    },

    /// Token issued by an external authority (base64 encoded).
    IssuedToken {
        /// The token.
        token: String,
    },
}

impl UserIdentity {
    /// Returns the token type name.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Anonymous => "Anonymous",
            Self::UserName { .. } => "UserName",
            Self::Certificate { .. } => "Certificate",
            Self::IssuedToken { .. } => "IssuedToken",
        }
    }
}

// =============================================================================
// ReconnectionSettings
// =============================================================================

/// What happens to queued transactions when a session repair fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepairFailurePolicy {
    /// Queued transactions stay queued and keep draining in order.
    #[default]
    Retain,
    /// Every queued transaction fails with the repair error.
    FailAll,
}

/// Limits on waiting for and repairing a lost session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectionSettings {
    /// How many times one request may be resubmitted after the owner
    /// restores the session.
    #[serde(default = "default_max_restore_attempts")]
    pub max_restore_attempts: u32,

    /// How long one request waits for the owner to finish reconnecting.
    #[serde(default = "default_restore_wait_timeout")]
    #[serde(with = "humantime_serde")]
    pub restore_wait_timeout: Duration,

    /// Queued work handling after a failed repair.
    #[serde(default)]
    pub on_repair_failure: RepairFailurePolicy,
}

fn default_max_restore_attempts() -> u32 {
    5
}

fn default_restore_wait_timeout() -> Duration {
    Duration::from_secs(60)
}

impl ReconnectionSettings {
    /// Validates these settings.
    pub fn validate(&self) -> UaResult<()> {
        if self.max_restore_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "reconnection.max_restore_attempts",
                "At least one restore attempt is required",
            )
            .into());
        }
        if self.restore_wait_timeout.is_zero() {
            return Err(ConfigurationError::invalid_value(
                "reconnection.restore_wait_timeout",
                "Restore wait timeout must be greater than 0",
            )
            .into());
        }
        Ok(())
    }
}

impl Default for ReconnectionSettings {
    fn default() -> Self {
        Self {
            max_restore_attempts: default_max_restore_attempts(),
            restore_wait_timeout: default_restore_wait_timeout(),
            on_repair_failure: RepairFailurePolicy::default(),
        }
    }
}

// =============================================================================
// KeepAliveSettings
// =============================================================================

/// Keep-alive probing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeepAliveSettings {
    /// Start the prober when the session is created.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Interval between probes.
    #[serde(default = "default_keep_alive_interval")]
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Consecutive failed probes before `KeepAliveFailure` is emitted.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
}

fn default_true() -> bool {
    true
}

fn default_keep_alive_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_failure_threshold() -> u32 {
    1
}

impl KeepAliveSettings {
    /// Disabled keep-alive.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Validates these settings.
    pub fn validate(&self) -> UaResult<()> {
        if self.enabled && self.interval.is_zero() {
            return Err(ConfigurationError::invalid_value(
                "keep_alive.interval",
                "Keep-alive interval must be greater than 0",
            )
            .into());
        }
        if self.failure_threshold == 0 {
            return Err(ConfigurationError::invalid_value(
                "keep_alive.failure_threshold",
                "Failure threshold must be at least 1",
            )
            .into());
        }
        Ok(())
    }
}

impl Default for KeepAliveSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: default_keep_alive_interval(),
            failure_threshold: default_failure_threshold(),
        }
    }
}

// =============================================================================
// SessionConfigBuilder
// =============================================================================

/// Builder for [`SessionConfig`].
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Sets the server endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Sets the session name.
    pub fn session_name(mut self, name: impl Into<String>) -> Self {
        self.config.session_name = name.into();
        self
    }

    /// Sets the requested session lifetime.
    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.config.session_timeout = timeout;
        self
    }

    /// Sets the request timeout hint.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Sets username/password authentication.
    pub fn username(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.user_identity = UserIdentity::UserName {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Sets the user identity.
    pub fn user_identity(mut self, identity: UserIdentity) -> Self {
        self.config.user_identity = identity;
        self
    }

    /// Adds a preferred locale.
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.config.locale_ids.push(locale.into());
        self
    }

    /// Sets the restore attempt limit.
    pub fn max_restore_attempts(mut self, attempts: u32) -> Self {
        self.config.reconnection.max_restore_attempts = attempts;
        self
    }

    /// Sets the restore wait timeout.
    pub fn restore_wait_timeout(mut self, timeout: Duration) -> Self {
        self.config.reconnection.restore_wait_timeout = timeout;
        self
    }

    /// Sets the repair failure policy.
    pub fn on_repair_failure(mut self, policy: RepairFailurePolicy) -> Self {
        self.config.reconnection.on_repair_failure = policy;
        self
    }

    /// Sets the keep-alive settings.
    pub fn keep_alive(mut self, settings: KeepAliveSettings) -> Self {
        self.config.keep_alive = settings;
        self
    }

    /// Sets the event channel capacity.
    pub fn event_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.event_channel_capacity = capacity;
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> UaResult<SessionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> UaResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            Some(other) => Err(ConfigurationError::UnsupportedFormat {
                extension: other.to_string(),
            }
            .into()),
            None => Err(ConfigurationError::UnsupportedFormat {
                extension: "(no extension)".to_string(),
            }
            .into()),
        }
    }

    /// Returns the format name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }

    fn parse<T: DeserializeOwned>(&self, content: &str) -> UaResult<T> {
        let parsed = match self {
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| {
            UaError::configuration(ConfigurationError::Parse {
                format: self.name(),
                message,
            })
        })
    }
}

/// Resolves `${VAR_NAME}` and `${VAR_NAME:default}` placeholders.
///
/// Unknown variables without a default are left in place.
pub fn resolve_env_placeholders(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' || chars.peek() != Some(&'{') {
            result.push(c);
            continue;
        }
        chars.next();

        let mut var_content = String::new();
        let mut found_close = false;
        for c in chars.by_ref() {
            if c == '}' {
                found_close = true;
                break;
            }
            var_content.push(c);
        }

        if !found_close {
            result.push_str("${");
            result.push_str(&var_content);
            continue;
        }

        let (var_name, default_value) = match var_content.split_once(':') {
            Some((name, default)) => (name, Some(default)),
            None => (var_content.as_str(), None),
        };

        match (env::var(var_name), default_value) {
            (Ok(value), _) => result.push_str(&value),
            (Err(_), Some(default)) => result.push_str(default),
            (Err(_), None) => {
                warn!("Environment variable '{}' not found", var_name);
                result.push_str(&format!("${{{}}}", var_name));
            }
        }
    }

    result
}

// =============================================================================
// humantime_serde helper
// =============================================================================

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        humantime::format_duration(*duration)
            .to_string()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================
