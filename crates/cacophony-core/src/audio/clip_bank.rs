//! The combined clip recording, decoded into memory
//!
//! Every clip in the dataset is a `[start_time, end_time)` window into one
//! long WAV file. The bank holds that file as stereo `f32` frames so voices
//! can seek anywhere without touching the disk.

use std::io::Read;
use std::path::Path;

use hound::{SampleFormat, WavReader};

use super::error::AudioFileError;
use crate::types::StereoSample;

/// Decoded stereo audio with its native sample rate
#[derive(Debug, Clone)]
pub struct ClipBank {
    samples: Vec<StereoSample>,
    sample_rate: u32,
}

impl ClipBank {
    pub fn new(samples: Vec<StereoSample>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length in frames
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn samples(&self) -> &[StereoSample] {
        &self.samples
    }

    /// Linearly interpolated frame at a fractional position, `None` past the end
    #[inline]
    pub fn sample_at(&self, position: f64) -> Option<StereoSample> {
        if position < 0.0 {
            return None;
        }
        let index = position as usize;
        let current = *self.samples.get(index)?;
        let frac = (position - index as f64) as f32;
        if frac == 0.0 {
            return Some(current);
        }
        let next = self.samples.get(index + 1).copied().unwrap_or(current);
        Some(StereoSample::new(
            current.left + (next.left - current.left) * frac,
            current.right + (next.right - current.right) * frac,
        ))
    }
}

/// Decode the combined clip WAV
pub fn load_clip_bank(path: impl AsRef<Path>) -> Result<ClipBank, AudioFileError> {
    let path = path.as_ref();
    let reader = WavReader::open(path).map_err(|source| AudioFileError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let bank = decode_wav(reader)?;
    log::info!(
        "Loaded clip bank {:?}: {:.1}s at {}Hz",
        path,
        bank.duration_secs(),
        bank.sample_rate()
    );
    Ok(bank)
}

/// Decode any WAV stream into stereo frames
///
/// Mono is duplicated to both channels; extra channels past the second are
/// dropped.
pub fn decode_wav<R: Read>(mut reader: WavReader<R>) -> Result<ClipBank, AudioFileError> {
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(AudioFileError::NoChannels);
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(AudioFileError::UnsupportedBitDepth(spec.bits_per_sample));
            }
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    let samples = interleaved
        .chunks_exact(channels)
        .map(|frame| match frame {
            [mono] => StereoSample::mono(*mono),
            [left, right, ..] => StereoSample::new(*left, *right),
            [] => StereoSample::silence(),
        })
        .collect();

    Ok(ClipBank::new(samples, spec.sample_rate))
}
