//! Clip audio output
//!
//! All clips live in one combined WAV decoded into a [`ClipBank`]. Playing a
//! clip starts a voice seeked into that bank; many voices may sound at once.
//!
//! # Architecture
//!
//! - **UI Thread**: holds a [`ClipMixerHandle`], which implements
//!   [`ClipPlayer`](crate::playback::ClipPlayer) and sends commands over a
//!   lock-free ring buffer
//! - **Audio Thread**: the cpal callback owns the [`ClipMixer`] exclusively
//! - **Atomics**: voice positions are read back with relaxed loads
//!
//! # Example Usage
//!
//! ```ignore
//! use cacophony_core::audio::{load_clip_bank, start_audio_system, AudioConfig};
//!
//! let bank = Arc::new(load_clip_bank("clips.wav")?);
//! let system = start_audio_system(&AudioConfig::default(), bank)?;
//! let mut player = system.player;
//! let voice = player.start(12.5)?;
//! ```

mod clip_bank;
mod config;
mod cpal_backend;
mod error;
mod mixer;

pub use clip_bank::{decode_wav, load_clip_bank, ClipBank};
pub use config::{AudioConfig, DEFAULT_SAMPLE_RATE, MAX_BUFFER_SIZE};
pub use cpal_backend::{start_audio_system, AudioHandle, AudioSystem};
pub use error::{AudioError, AudioFileError, AudioResult};
pub use mixer::{
    mixer_channel, ClipMixer, ClipMixerHandle, MixerCommand, VoiceSlots, COMMAND_QUEUE_SIZE,
    MAX_VOICES,
};
