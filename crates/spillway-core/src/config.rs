use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::message::{DEFAULT_MESSAGE_SIZE_THRESHOLD, TRANSPORT_MAX_MESSAGE_ATTRIBUTES};

/// Offloading behavior of the extended client, deserializable from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OffloadConfig {
    /// Messages whose body plus attributes exceed this many bytes are offloaded.
    pub message_size_threshold: usize,
    /// Attribute count the queue transport accepts, marker included.
    pub max_message_attributes: usize,
    /// Delete the offloaded payload when its message is deleted.
    pub cleanup_payload: bool,
    /// Upper bound on a single payload fetch during receive.
    pub fetch_timeout_ms: Option<u64>,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            message_size_threshold: DEFAULT_MESSAGE_SIZE_THRESHOLD,
            max_message_attributes: TRANSPORT_MAX_MESSAGE_ATTRIBUTES,
            cleanup_payload: true,
            fetch_timeout_ms: None,
        }
    }
}

impl OffloadConfig {
    /// Parse and validate a TOML document. Missing keys keep their defaults;
    /// unknown keys are an error.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: OffloadConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.message_size_threshold == 0 {
            return Err(ConfigError::InvalidValue(
                "message_size_threshold must be greater than zero".to_string(),
            ));
        }
        if self.max_message_attributes == 0 {
            return Err(ConfigError::InvalidValue(
                "max_message_attributes must leave room for the payload marker".to_string(),
            ));
        }
        if self.fetch_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue(
                "fetch_timeout_ms must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Attribute count a caller may supply; one slot is reserved for the marker.
    pub fn max_caller_attributes(&self) -> usize {
        self.max_message_attributes.saturating_sub(1)
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }
}
