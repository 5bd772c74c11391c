//! Audio output configuration

use serde::{Deserialize, Serialize};

/// Largest block rendered in one mixer pass (frames)
pub const MAX_BUFFER_SIZE: usize = 4096;

/// Preferred output rate when the device supports it
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Output device selection and stream settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output device name; `None` uses the host default
    pub device: Option<String>,
    /// Requested sample rate; `None` prefers [`DEFAULT_SAMPLE_RATE`]
    pub sample_rate: Option<u32>,
    /// Requested buffer size in frames; `None` lets the host decide
    pub buffer_size: Option<u32>,
    /// Linear gain applied to every voice
    pub gain: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: None,
            buffer_size: None,
            gain: 0.8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: AudioConfig = serde_json::from_str(r#"{"device": "Speakers"}"#).unwrap();
        assert_eq!(config.device.as_deref(), Some("Speakers"));
        assert_eq!(config.gain, 0.8);
        assert_eq!(config.buffer_size, None);
    }
}
