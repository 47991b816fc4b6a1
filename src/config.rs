//! Runtime configuration for the input core.
//!
//! All options have defaults; a config can be built in code, deserialized
//! from TOML, or loaded from a file. Unknown keys are rejected so typos in
//! config files surface early.
//!
//! ```toml
//! max_pad_count = 4
//! check_connection_period_ms = 200
//! default_stick_deadzone = 0.15
//! hid_discovery_enabled = true
//! text_input_queue_length = 32
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Hard upper bound on the pad pool size.
pub const MAX_PAD_COUNT: usize = 10;

fn default_max_pad_count() -> usize {
    MAX_PAD_COUNT
}
fn default_check_connection_period_ms() -> u32 {
    200
}
fn default_stick_deadzone() -> f32 {
    0.15
}
fn default_hid_discovery_enabled() -> bool {
    true
}
fn default_text_input_queue_length() -> usize {
    32
}
fn default_concurrent_queue_capacity() -> usize {
    512
}

/// Options recognized by the manager and the pad layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    /// Size of the pad pool and of the rumble queue. Clamped to
    /// [`MAX_PAD_COUNT`].
    #[serde(default = "default_max_pad_count")]
    pub max_pad_count: usize,

    /// Connection probe cadence driving pad hot-plug detection.
    #[serde(default = "default_check_connection_period_ms")]
    pub check_connection_period_ms: u32,

    /// Initial per-stick dead-zone. Xbox-One-native pads override this to
    /// `0.0` because the platform already dead-zones.
    #[serde(default = "default_stick_deadzone")]
    pub default_stick_deadzone: f32,

    /// Whether the unified HID discovery loop runs. Off where a platform
    /// controller framework supersedes it.
    #[serde(default = "default_hid_discovery_enabled")]
    pub hid_discovery_enabled: bool,

    /// Per-tick cap on buffered text-input characters.
    #[serde(default = "default_text_input_queue_length")]
    pub text_input_queue_length: usize,

    /// Capacity of the cross-thread input queue.
    #[serde(default = "default_concurrent_queue_capacity")]
    pub concurrent_queue_capacity: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_pad_count: default_max_pad_count(),
            check_connection_period_ms: default_check_connection_period_ms(),
            default_stick_deadzone: default_stick_deadzone(),
            hid_discovery_enabled: default_hid_discovery_enabled(),
            text_input_queue_length: default_text_input_queue_length(),
            concurrent_queue_capacity: default_concurrent_queue_capacity(),
        }
    }
}

impl InputConfig {
    /// Parses a TOML config string.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut config: InputConfig =
            toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        config.max_pad_count = config.max_pad_count.min(MAX_PAD_COUNT);
        Ok(config)
    }

    /// Loads a TOML config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config(e.to_string()))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = InputConfig::default();
        assert_eq!(c.max_pad_count, 10);
        assert_eq!(c.check_connection_period_ms, 200);
        assert!((c.default_stick_deadzone - 0.15).abs() < 1e-6);
        assert!(c.hid_discovery_enabled);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c = InputConfig::from_toml_str("max_pad_count = 2\n").unwrap();
        assert_eq!(c.max_pad_count, 2);
        assert_eq!(c.check_connection_period_ms, 200);
    }

    #[test]
    fn pad_count_is_clamped() {
        let c = InputConfig::from_toml_str("max_pad_count = 64\n").unwrap();
        assert_eq!(c.max_pad_count, MAX_PAD_COUNT);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(InputConfig::from_toml_str("max_pads = 4\n").is_err());
    }
}
