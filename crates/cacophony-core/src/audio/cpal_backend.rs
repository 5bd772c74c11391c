//! CPAL output stream driving the clip mixer
//!
//! ```text
//!   UI thread                         audio thread
//! ┌──────────────────┐  rtrb queue  ┌─────────────────────┐
//! │ ClipMixerHandle  │ ───────────► │ ClipMixer::process  │ ──► device
//! │  (ClipPlayer)    │ ◄─────────── │  (owned by callback)│
//! └──────────────────┘   atomics    └─────────────────────┘
//! ```

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize as CpalBufferSize, SampleFormat, Stream, StreamConfig};

use super::clip_bank::ClipBank;
use super::config::{AudioConfig, DEFAULT_SAMPLE_RATE, MAX_BUFFER_SIZE};
use super::error::{AudioError, AudioResult};
use super::mixer::{mixer_channel, ClipMixer, ClipMixerHandle};
use crate::types::StereoSample;

/// Keeps the output stream alive. Drop this to stop audio.
pub struct AudioHandle {
    _stream: Stream,
    sample_rate: u32,
    device_name: String,
}

impl AudioHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

/// A running output stream plus the handle that starts clips on it
pub struct AudioSystem {
    pub handle: AudioHandle,
    pub player: ClipMixerHandle,
}

/// Open the configured (or default) output device and start mixing `bank`
pub fn start_audio_system(config: &AudioConfig, bank: Arc<ClipBank>) -> AudioResult<AudioSystem> {
    let device = match &config.device {
        Some(name) => find_device_by_name(name)?,
        None => default_device()?,
    };

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    log::info!("Using audio device: {}", device_name);

    let supported = get_output_config(&device, config)?;
    let sample_rate = supported.sample_rate().0;

    let stream_config = StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: match config.buffer_size {
            Some(frames) => CpalBufferSize::Fixed(frames.clamp(64, MAX_BUFFER_SIZE as u32)),
            None => CpalBufferSize::Default,
        },
    };

    log::info!(
        "Audio config: {} channels, {}Hz, buffer {:?} (bank at {}Hz)",
        stream_config.channels,
        sample_rate,
        stream_config.buffer_size,
        bank.sample_rate()
    );

    let (player, mixer) = mixer_channel(bank, sample_rate, config.gain);
    let stream = build_output_stream(&device, &stream_config, mixer)?;
    stream
        .play()
        .map_err(|e| AudioError::StartStream(e.to_string()))?;

    log::info!("Audio stream started");

    Ok(AudioSystem {
        handle: AudioHandle {
            _stream: stream,
            sample_rate,
            device_name,
        },
        player,
    })
}

fn default_device() -> AudioResult<cpal::Device> {
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| AudioError::NoDefaultOutput("host reports no default output".to_string()))
}

fn find_device_by_name(name: &str) -> AudioResult<cpal::Device> {
    let devices: Vec<_> = cpal::default_host()
        .output_devices()
        .map_err(|e| AudioError::StreamConfig(e.to_string()))?
        .collect();

    if devices.is_empty() {
        return Err(AudioError::NoOutputDevices);
    }

    devices
        .into_iter()
        .find(|d| d.name().is_ok_and(|n| n == name))
        .ok_or_else(|| AudioError::OutputNotFound(name.to_string()))
}

/// Pick an f32 stereo config, at the requested rate when the device allows it
fn get_output_config(
    device: &cpal::Device,
    config: &AudioConfig,
) -> AudioResult<cpal::SupportedStreamConfig> {
    let supported_configs: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| AudioError::StreamConfig(e.to_string()))?
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .collect();

    let target_sample_rate = config.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);
    let in_range = |c: &&cpal::SupportedStreamConfigRange| {
        target_sample_rate >= c.min_sample_rate().0 && target_sample_rate <= c.max_sample_rate().0
    };

    let best_config = supported_configs
        .iter()
        .filter(|c| c.channels() >= 2)
        .find(in_range)
        .or_else(|| supported_configs.iter().find(|c| c.channels() >= 2))
        .or_else(|| supported_configs.first())
        .ok_or_else(|| AudioError::NoFloatOutput("device offers no f32 output".to_string()))?;

    let sample_rate = if in_range(&best_config) {
        cpal::SampleRate(target_sample_rate)
    } else {
        let fallback = best_config.max_sample_rate();
        log::warn!(
            "Audio device doesn't support {}Hz, falling back to {}Hz",
            target_sample_rate,
            fallback.0
        );
        fallback
    };

    Ok(best_config.clone().with_sample_rate(sample_rate))
}

fn build_output_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    mut mixer: ClipMixer,
) -> AudioResult<Stream> {
    let channels = config.channels as usize;
    if channels == 0 {
        return Err(AudioError::StreamConfig("stream has no channels".to_string()));
    }
    let mut scratch = vec![StereoSample::silence(); MAX_BUFFER_SIZE];

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                render_interleaved(&mut mixer, &mut scratch, data, channels);
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::BuildStream(e.to_string()))?;

    Ok(stream)
}

/// Mix into an interleaved device buffer
///
/// Stereo buffers are mixed in place; other layouts go through `scratch`,
/// with channels past the second zeroed.
fn render_interleaved(
    mixer: &mut ClipMixer,
    scratch: &mut [StereoSample],
    data: &mut [f32],
    channels: usize,
) {
    if channels == 2 {
        if let Some(frames) = StereoSample::frames_mut(data) {
            for block in frames.chunks_mut(scratch.len().max(1)) {
                mixer.process(block);
            }
            return;
        }
    }

    for chunk in data.chunks_mut(channels * scratch.len().max(1)) {
        let frames = chunk.len() / channels;
        let block = &mut scratch[..frames];
        mixer.process(block);

        for (frame, sample) in chunk.chunks_mut(channels).zip(block.iter()) {
            frame[0] = sample.left;
            if channels > 1 {
                frame[1] = sample.right;
            }
            for ch in frame.iter_mut().skip(2) {
                *ch = 0.0;
            }
        }
    }
}
