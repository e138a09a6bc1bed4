//! Session configuration.
//!
//! A [`ParserConfig`] can be built in code or loaded from YAML:
//!
//! ```yaml
//! output_delimiter: "\r"
//! input_delimiter: "\r\n"
//! timeout_ms: 500
//! debug: true
//! ```
//!
//! Missing fields take their defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default scratch buffer capacity in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 2048;

/// Smallest scratch buffer accepted.
pub const MIN_BUFFER_SIZE: usize = 16;

/// Default per-character timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Errors in a session configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A delimiter is empty.
    #[error("{0} delimiter must not be empty")]
    EmptyDelimiter(&'static str),

    /// The scratch buffer is below [`MIN_BUFFER_SIZE`].
    #[error("buffer too small: min {min} bytes, got {actual}")]
    BufferTooSmall { min: usize, actual: usize },

    /// The YAML document could not be parsed.
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Configuration of an [`AtParser`](crate::AtParser) session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Appended after every sent command.
    pub output_delimiter: String,
    /// Ends a line of unsolicited data during idle polling.
    pub input_delimiter: String,
    /// Per-character receive timeout in milliseconds.
    pub timeout_ms: u64,
    /// Emit matcher traces at debug level.
    pub debug: bool,
    /// Scratch buffer capacity in bytes.
    pub buffer_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            output_delimiter: "\r".to_string(),
            input_delimiter: "\r\n".to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            debug: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ParserConfig {
    /// Create a configuration with the given delimiters and timeout.
    pub fn new(
        output_delimiter: impl Into<String>,
        input_delimiter: impl Into<String>,
        timeout: Duration,
        debug: bool,
    ) -> Self {
        ParserConfig {
            output_delimiter: output_delimiter.into(),
            input_delimiter: input_delimiter.into(),
            timeout_ms: millis(timeout),
            debug,
            ..Default::default()
        }
    }

    /// Set the per-character timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = millis(timeout);
        self
    }

    /// Set the scratch buffer capacity.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Enable or disable debug traces.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The per-character timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parse and validate a YAML configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: ParserConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_delimiter.is_empty() {
            return Err(ConfigError::EmptyDelimiter("output"));
        }
        if self.input_delimiter.is_empty() {
            return Err(ConfigError::EmptyDelimiter("input"));
        }
        if self.buffer_size < MIN_BUFFER_SIZE {
            return Err(ConfigError::BufferTooSmall {
                min: MIN_BUFFER_SIZE,
                actual: self.buffer_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::default();
        assert_eq!(config.output_delimiter, "\r");
        assert_eq!(config.input_delimiter, "\r\n");
        assert_eq!(config.timeout(), Duration::from_secs(1));
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_huge_timeout_saturates() {
        let config = ParserConfig::default().with_timeout(Duration::MAX);
        assert_eq!(config.timeout_ms, u64::MAX);

        let config = ParserConfig::new("\r", "\r\n", Duration::from_secs(u64::MAX), false);
        assert_eq!(config.timeout_ms, u64::MAX);
        assert_eq!(config.timeout(), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = ParserConfig::from_yaml_str("timeout_ms: 250\ndebug: true\noutput_delimiter: \"\\r\\n\"\n").unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(250));
        assert!(config.debug);
        assert_eq!(config.output_delimiter, "\r\n");
        assert_eq!(config.input_delimiter, "\r\n");
    }

    #[test]
    fn test_validate_rejects() {
        let config = ParserConfig::default().with_buffer_size(4);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BufferTooSmall { min: MIN_BUFFER_SIZE, actual: 4 })
        ));

        let config = ParserConfig::new("", "\n", Duration::from_millis(10), false);
        assert!(matches!(config.validate(), Err(ConfigError::EmptyDelimiter("output"))));

        assert!(matches!(
            ParserConfig::from_yaml_str("input_delimiter: \"\"\n"),
            Err(ConfigError::EmptyDelimiter("input"))
        ));
        assert!(matches!(
            ParserConfig::from_yaml_str("timeout_ms: [1, 2]\n"),
            Err(ConfigError::Yaml(_))
        ));
    }
}
