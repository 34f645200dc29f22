//! Bridge configuration.

use crate::error::BridgeError;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;

/// Default debounce window applied to bursts of size changes.
pub const DEFAULT_DEBOUNCE_MS: u64 = 800;
pub const DEFAULT_MAXIMUM_FRAME_RATE: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Quiet period after the last raw size change before a resize is attempted.
    pub debounce_ms: u64,
    /// Upper bound on frame advances per second.
    pub maximum_frame_rate: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            maximum_frame_rate: DEFAULT_MAXIMUM_FRAME_RATE,
        }
    }
}

impl BridgeConfig {
    /// Parse from JSON. Missing fields take their defaults; an empty string
    /// yields the default config.
    pub fn from_json(json: &str) -> Result<Self, BridgeError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_json::from_str(json).map_err(|e| BridgeError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.maximum_frame_rate == 0 {
            return Err(BridgeError::InvalidConfig(
                "maximumFrameRate must be greater than zero".to_string(),
            ));
        }
        if self.debounce_ms == 0 {
            return Err(BridgeError::InvalidConfig(
                "debounceMs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn frame_rate(&self) -> Result<NonZeroU32, BridgeError> {
        NonZeroU32::new(self.maximum_frame_rate).ok_or_else(|| {
            BridgeError::InvalidConfig("maximumFrameRate must be greater than zero".to_string())
        })
    }
}
