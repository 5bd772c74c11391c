//! Lock-free clip mixer
//!
//! The audio callback owns a [`ClipMixer`] exclusively. The UI side holds the
//! matching [`ClipMixerHandle`] and talks to it two ways:
//!
//! - **Commands** go over an `rtrb` SPSC ring buffer (start, stop, stop all)
//! - **State** comes back through [`VoiceSlots`]: one pair of relaxed atomics
//!   per voice holding the owning voice id and its source position
//!
//! Slot ownership is split by side. Only the handle claims a free slot
//! (`0 -> id`); releasing it (`id -> 0`) happens wherever the voice ends. A
//! voice whose slot no longer carries its id is dropped by the mixer on the
//! next block.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rtrb::{Consumer, Producer, PushError, RingBuffer};

use super::clip_bank::ClipBank;
use crate::playback::{ClipPlayer, PlaybackError, VoiceId};
use crate::types::StereoSample;

/// Maximum number of simultaneously sounding clips
pub const MAX_VOICES: usize = 16;

/// Command queue capacity (UI to audio)
pub const COMMAND_QUEUE_SIZE: usize = 64;

/// Slot value meaning "free"
const NO_VOICE: u64 = 0;

/// Commands sent from the UI thread to the mixer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MixerCommand {
    /// Begin playing `voice` in `slot` from `start_seconds` into the bank
    Start {
        slot: usize,
        voice: VoiceId,
        start_seconds: f64,
    },
    Stop(VoiceId),
}

/// Per-voice state shared between the mixer and its handle
#[derive(Debug, Default)]
struct VoiceSlot {
    voice: AtomicU64,
    /// Source position in seconds, stored as `f64` bits
    position: AtomicU64,
}

/// Fixed table of voice slots, read with relaxed ordering
#[derive(Debug)]
pub struct VoiceSlots {
    slots: [VoiceSlot; MAX_VOICES],
}

impl VoiceSlots {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| VoiceSlot::default()),
        }
    }

    /// Take the first free slot for `voice`, publishing its start position
    fn claim(&self, voice: VoiceId, start_seconds: f64) -> Option<usize> {
        self.slots.iter().position(|slot| {
            if slot.voice.load(Ordering::Relaxed) != NO_VOICE {
                return false;
            }
            slot.position
                .store(start_seconds.to_bits(), Ordering::Relaxed);
            slot.voice
                .compare_exchange(NO_VOICE, voice, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
        })
    }

    /// Free `slot` if it still belongs to `voice`
    fn release(&self, slot: usize, voice: VoiceId) -> bool {
        self.slots.get(slot).is_some_and(|s| {
            s.voice
                .compare_exchange(voice, NO_VOICE, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
        })
    }

    fn release_voice(&self, voice: VoiceId) -> bool {
        self.slot_of(voice)
            .is_some_and(|slot| self.release(slot, voice))
    }

    #[inline]
    fn owns(&self, slot: usize, voice: VoiceId) -> bool {
        self.slots[slot].voice.load(Ordering::Relaxed) == voice
    }

    #[inline]
    fn set_position(&self, slot: usize, seconds: f64) {
        self.slots[slot]
            .position
            .store(seconds.to_bits(), Ordering::Relaxed);
    }

    fn slot_of(&self, voice: VoiceId) -> Option<usize> {
        if voice == NO_VOICE {
            return None;
        }
        self.slots
            .iter()
            .position(|s| s.voice.load(Ordering::Relaxed) == voice)
    }

    /// Source position of a live voice in seconds
    pub fn position(&self, voice: VoiceId) -> Option<f64> {
        self.slot_of(voice)
            .map(|slot| f64::from_bits(self.slots[slot].position.load(Ordering::Relaxed)))
    }

    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.voice.load(Ordering::Relaxed) != NO_VOICE)
            .count()
    }
}

impl Default for VoiceSlots {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
struct Voice {
    id: VoiceId,
    slot: usize,
    /// Read position in bank frames
    cursor: f64,
}

/// Audio-thread side: sums every live voice into the output block
pub struct ClipMixer {
    bank: Arc<ClipBank>,
    voices: [Option<Voice>; MAX_VOICES],
    commands: Consumer<MixerCommand>,
    slots: Arc<VoiceSlots>,
    /// Bank frames advanced per output frame
    step: f64,
    gain: f32,
}

impl ClipMixer {
    /// Drain pending commands, then render one block
    ///
    /// Real-time safe: no allocation, no locks.
    pub fn process(&mut self, out: &mut [StereoSample]) {
        self.drain_commands();
        out.fill(StereoSample::silence());

        let bank_rate = self.bank.sample_rate() as f64;
        for entry in self.voices.iter_mut() {
            let Some(voice) = entry else {
                continue;
            };
            if !self.slots.owns(voice.slot, voice.id) {
                *entry = None;
                continue;
            }

            let mut ended = false;
            for frame in out.iter_mut() {
                match self.bank.sample_at(voice.cursor) {
                    Some(sample) => *frame += sample * self.gain,
                    None => {
                        ended = true;
                        break;
                    }
                }
                voice.cursor += self.step;
            }

            if ended {
                self.slots.release(voice.slot, voice.id);
                *entry = None;
            } else {
                self.slots.set_position(voice.slot, voice.cursor / bank_rate);
            }
        }

        for frame in out.iter_mut() {
            frame.left = frame.left.clamp(-1.0, 1.0);
            frame.right = frame.right.clamp(-1.0, 1.0);
        }
    }

    fn drain_commands(&mut self) {
        while let Ok(cmd) = self.commands.pop() {
            match cmd {
                MixerCommand::Start {
                    slot,
                    voice,
                    start_seconds,
                } => {
                    if slot < MAX_VOICES {
                        self.voices[slot] = Some(Voice {
                            id: voice,
                            slot,
                            cursor: start_seconds * self.bank.sample_rate() as f64,
                        });
                    }
                }
                MixerCommand::Stop(id) => {
                    if let Some(entry) = self
                        .voices
                        .iter_mut()
                        .find(|v| v.is_some_and(|v| v.id == id))
                    {
                        if let Some(voice) = entry.take() {
                            self.slots.release(voice.slot, voice.id);
                        }
                    }
                }
            }
        }
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_some()).count()
    }
}

/// UI-thread side of the mixer; the host audio primitive
pub struct ClipMixerHandle {
    producer: Producer<MixerCommand>,
    slots: Arc<VoiceSlots>,
    next_voice: VoiceId,
}

impl ClipMixerHandle {
    pub fn active_voices(&self) -> usize {
        self.slots.active_count()
    }

    fn allocate_id(&mut self) -> VoiceId {
        let id = self.next_voice;
        self.next_voice = self.next_voice.wrapping_add(1).max(1);
        id
    }
}

impl ClipPlayer for ClipMixerHandle {
    fn start(&mut self, start_seconds: f64) -> Result<VoiceId, PlaybackError> {
        if self.producer.is_abandoned() {
            return Err(PlaybackError::Disconnected);
        }
        let voice = self.allocate_id();
        let slot = self
            .slots
            .claim(voice, start_seconds)
            .ok_or(PlaybackError::NoFreeVoice(MAX_VOICES))?;

        match self.producer.push(MixerCommand::Start {
            slot,
            voice,
            start_seconds,
        }) {
            Ok(()) => Ok(voice),
            Err(PushError::Full(_)) => {
                self.slots.release(slot, voice);
                Err(PlaybackError::QueueFull)
            }
        }
    }

    fn position(&self, voice: VoiceId) -> Option<f64> {
        self.slots.position(voice)
    }

    fn stop(&mut self, voice: VoiceId) {
        if self.slots.slot_of(voice).is_none() {
            return;
        }
        if self.producer.push(MixerCommand::Stop(voice)).is_err() {
            // Revoking the slot silences the voice on the mixer's next block
            self.slots.release_voice(voice);
        }
    }
}

/// Create a connected mixer/handle pair
///
/// `output_rate` is the device rate; the bank is resampled on the fly by
/// stepping `bank_rate / output_rate` frames per output frame.
pub fn mixer_channel(
    bank: Arc<ClipBank>,
    output_rate: u32,
    gain: f32,
) -> (ClipMixerHandle, ClipMixer) {
    let (producer, consumer) = RingBuffer::new(COMMAND_QUEUE_SIZE);
    let slots = Arc::new(VoiceSlots::new());
    let step = if output_rate == 0 {
        1.0
    } else {
        bank.sample_rate() as f64 / output_rate as f64
    };

    let handle = ClipMixerHandle {
        producer,
        slots: Arc::clone(&slots),
        next_voice: 1,
    };
    let mixer = ClipMixer {
        bank,
        voices: [None; MAX_VOICES],
        commands: consumer,
        slots,
        step,
        gain,
    };
    (handle, mixer)
}
