//! Audio backend error types

use std::path::PathBuf;

use thiserror::Error;

/// Reasons the clip output stream could not be opened
///
/// Every variant leaves the explorer running silently.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The host lists no output devices at all
    #[error("no audio output device to play clips on")]
    NoOutputDevices,

    #[error("no default output device for clip playback: {0}")]
    NoDefaultOutput(String),

    /// `audio.device` names a device the host does not list
    #[error("configured output device '{0}' is not available")]
    OutputNotFound(String),

    /// Querying or choosing the mixer's stream configuration failed
    #[error("could not configure the clip output stream: {0}")]
    StreamConfig(String),

    #[error("could not build the clip mixer stream: {0}")]
    BuildStream(String),

    #[error("clip mixer stream refused to start: {0}")]
    StartStream(String),

    /// The mixer renders `f32` only
    #[error("output device has no f32 stream: {0}")]
    NoFloatOutput(String),
}

/// Result of opening the clip output
pub type AudioResult<T> = Result<T, AudioError>;

/// Failures decoding the clip bank WAV
#[derive(Error, Debug)]
pub enum AudioFileError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("Failed to decode WAV data: {0}")]
    Decode(#[from] hound::Error),

    #[error("WAV file declares zero channels")]
    NoChannels,

    #[error("Unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_clip_output() {
        assert_eq!(
            AudioError::OutputNotFound("USB DAC".to_string()).to_string(),
            "configured output device 'USB DAC' is not available"
        );
        assert_eq!(
            AudioError::NoFloatOutput("device offers no f32 output".to_string()).to_string(),
            "output device has no f32 stream: device offers no f32 output"
        );
        assert_eq!(
            AudioFileError::UnsupportedBitDepth(12).to_string(),
            "Unsupported bit depth: 12"
        );
    }
}
