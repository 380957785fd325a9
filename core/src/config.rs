//! Runtime configuration.

use serde::{Deserialize, Serialize};

/// Thresholds of the drag/tap state machine, in pixels and milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// A move shorter than this since the last sample...
    pub drag_min_px: f64,
    /// ...and sooner than this is dropped.
    pub drag_min_ms: f64,
    /// Total displacement above which release fires drag-done.
    pub drag_done_px: f64,
    /// Total displacement below which release fires tap.
    pub tap_max_px: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            drag_min_px: 3.0,
            drag_min_ms: 16.0,
            drag_done_px: 8.0,
            tap_max_px: 8.0,
        }
    }
}

/// Settings of one [`Runtime`](crate::Runtime).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// First segment of the first mounted root (`.top`).
    pub root_name: String,
    /// Pointer thresholds.
    pub gestures: GestureConfig,
    /// Resize batching window; `None` dispatches every resize.
    pub resize_batch_ms: Option<u32>,
    /// Delay before handlers of a two-pass mount are registered.
    pub deferral_ms: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            root_name: String::from("top"),
            gestures: GestureConfig::default(),
            resize_batch_ms: None,
            deferral_ms: 0,
        }
    }
}

impl RuntimeConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed input.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Sets the root segment name.
    #[must_use]
    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    /// Replaces the gesture thresholds.
    #[must_use]
    pub fn with_gestures(mut self, gestures: GestureConfig) -> Self {
        self.gestures = gestures;
        self
    }

    /// Enables resize coalescing with the given window.
    #[must_use]
    pub fn with_resize_batch(mut self, window_ms: u32) -> Self {
        self.resize_batch_ms = Some(window_ms);
        self
    }

    /// Sets the two-pass handler deferral delay.
    #[must_use]
    pub fn with_deferral(mut self, delay_ms: u32) -> Self {
        self.deferral_ms = delay_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            RuntimeConfig::from_json(r#"{ "resize_batch_ms": 100, "gestures": { "tap_max_px": 4 } }"#)
                .unwrap();
        assert_eq!(config.resize_batch_ms, Some(100));
        assert_eq!(config.root_name, "top");
        assert_eq!(config.gestures.tap_max_px, 4.0);
        assert_eq!(config.gestures.drag_min_ms, 16.0);
    }
}
