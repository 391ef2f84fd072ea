//! # Configuration Management
//!
//! Wire constants and runtime configuration for the packet protocol.
//!
//! The wire constants are fixed by the protocol version and never configurable.
//! Runtime settings cover the transport adapter (frame limits, timeouts) and
//! logging output.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()` / `from_toml()`
//! - Environment overrides via `from_env()`
//! - Direct instantiation with defaults

use crate::error::{ProtocolError, Result};
use crate::utils::timeout;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Current wire protocol version. Incrementing it breaks compatibility.
pub const PROTOCOL_VERSION: u32 = 1;

/// Width of the leading `total_size` field
pub const SIZE_FIELD_LEN: usize = 4;

/// Width of the packet type field
pub const TYPE_FIELD_LEN: usize = 4;

/// Width of the CRC-32C field
pub const CHECKSUM_LEN: usize = 4;

/// AES-256 key length
pub const KEY_LEN: usize = 32;

/// CBC initialization vector length (one AES block)
pub const IV_LEN: usize = 16;

/// Bytes following the size field in a plain packet, before the payload
pub const PLAIN_HEADER_LEN: usize = TYPE_FIELD_LEN + CHECKSUM_LEN;

/// Bytes following the size field in an encrypted packet, before the ciphertext
pub const ENCRYPTED_HEADER_LEN: usize = TYPE_FIELD_LEN + IV_LEN + CHECKSUM_LEN;

/// Max allowed value of `total_size` (16 MB)
pub const MAX_PACKET_SIZE: usize = 16 * 1024 * 1024;

/// Reject a peer that speaks a different wire version.
///
/// # Errors
/// Returns `ProtocolError::UnsupportedVersion` carrying the peer's version.
pub fn ensure_supported_version(version: u32) -> Result<()> {
    if version == PROTOCOL_VERSION {
        Ok(())
    } else {
        Err(ProtocolError::UnsupportedVersion(version))
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProtocolConfig {
    /// Transport adapter configuration
    #[serde(default)]
    pub transport: TransportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProtocolConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(size) = std::env::var("TRANQUILITY_MAX_PACKET_SIZE") {
            config.transport.max_packet_size = size.parse::<usize>().map_err(|e| {
                ProtocolError::ConfigError(format!("Invalid TRANQUILITY_MAX_PACKET_SIZE: {e}"))
            })?;
        }

        if let Ok(ms) = std::env::var("TRANQUILITY_SEND_TIMEOUT_MS") {
            let val = ms.parse::<u64>().map_err(|e| {
                ProtocolError::ConfigError(format!("Invalid TRANQUILITY_SEND_TIMEOUT_MS: {e}"))
            })?;
            config.transport.send_timeout = Duration::from_millis(val);
        }

        if let Ok(ms) = std::env::var("TRANQUILITY_RECV_TIMEOUT_MS") {
            let val = ms.parse::<u64>().map_err(|e| {
                ProtocolError::ConfigError(format!("Invalid TRANQUILITY_RECV_TIMEOUT_MS: {e}"))
            })?;
            config.transport.recv_timeout = Duration::from_millis(val);
        }

        if let Ok(level) = std::env::var("TRANQUILITY_LOG_LEVEL") {
            config.logging.log_level = level.parse::<Level>().map_err(|_| {
                ProtocolError::ConfigError(format!("Invalid TRANQUILITY_LOG_LEVEL: {level}"))
            })?;
        }

        Ok(config)
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration.
    ///
    /// Returns a list of problems. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.transport.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Transport adapter configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
    /// Largest `total_size` the frame codec will accept
    pub max_packet_size: usize,

    /// Timeout for a single send
    #[serde(with = "duration_serde")]
    pub send_timeout: Duration,

    /// Timeout while waiting for the next packet
    #[serde(with = "duration_serde")]
    pub recv_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_packet_size: MAX_PACKET_SIZE,
            send_timeout: timeout::DEFAULT_TIMEOUT,
            recv_timeout: timeout::DEFAULT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Validate transport configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_packet_size < ENCRYPTED_HEADER_LEN {
            errors.push(format!(
                "Max packet size too small: {} bytes (minimum: {ENCRYPTED_HEADER_LEN})",
                self.max_packet_size
            ));
        } else if self.max_packet_size > MAX_PACKET_SIZE {
            errors.push(format!(
                "Max packet size too large: {} bytes (maximum: {MAX_PACKET_SIZE})",
                self.max_packet_size
            ));
        }

        if self.send_timeout.as_millis() < 10 {
            errors.push("Send timeout too short (minimum: 10ms)".to_string());
        } else if self.send_timeout.as_secs() > 300 {
            errors.push("Send timeout too long (maximum: 300s)".to_string());
        }

        if self.recv_timeout.as_millis() < 10 {
            errors.push("Receive timeout too short (minimum: 10ms)".to_string());
        } else if self.recv_timeout.as_secs() > 3600 {
            errors.push("Receive timeout too long (maximum: 1 hour)".to_string());
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name attached to every event
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("tranquility"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lengths() {
        assert_eq!(PLAIN_HEADER_LEN, 8);
        assert_eq!(ENCRYPTED_HEADER_LEN, 24);
    }

    #[test]
    fn test_version_check() {
        assert!(ensure_supported_version(PROTOCOL_VERSION).is_ok());
        assert!(matches!(
            ensure_supported_version(PROTOCOL_VERSION + 1),
            Err(ProtocolError::UnsupportedVersion(v)) if v == PROTOCOL_VERSION + 1
        ));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_example_config_parses_back() {
        let text = ProtocolConfig::example_config();
        let parsed = ProtocolConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.transport.max_packet_size, MAX_PACKET_SIZE);
        assert_eq!(parsed.logging.log_level, Level::INFO);
    }
}
