//! Throttled, time-bounded clip playback
//!
//! Every clip lives in one shared audio resource; playing a clip means
//! starting an independent voice seeked to the record's start time. Each
//! voice is stopped by whichever fires first:
//!
//! - a periodic stop poll once the reported position reaches
//!   `end_time - stop_margin`
//! - a one-shot fallback after the clip's duration plus a grace period
//!
//! Start failures are swallowed; the UI never reports playback errors.

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::EngineConfig;
use crate::dataset::ClipRecord;
use crate::runtime::{Schedule, TaskHandle, TaskKind, TaskScheduler};

/// Identifier of one playing voice
pub type VoiceId = u64;

/// Errors that can occur when starting a voice
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("No audio output is connected")]
    Disconnected,

    #[error("Mixer command queue is full")]
    QueueFull,

    #[error("All {0} voices are busy")]
    NoFreeVoice(usize),
}

/// The host's audio primitive
pub trait ClipPlayer {
    /// Start a new voice at `start_seconds` into the shared resource
    fn start(&mut self, start_seconds: f64) -> Result<VoiceId, PlaybackError>;

    /// Current source position of a voice, `None` once it has ended
    fn position(&self, voice: VoiceId) -> Option<f64>;

    /// Stop a voice (no-op if it already ended)
    fn stop(&mut self, voice: VoiceId);
}

/// Player used when no audio device or clip bank is available
#[derive(Debug, Default, Clone, Copy)]
pub struct DisconnectedPlayer;

impl ClipPlayer for DisconnectedPlayer {
    fn start(&mut self, _start_seconds: f64) -> Result<VoiceId, PlaybackError> {
        Err(PlaybackError::Disconnected)
    }

    fn position(&self, _voice: VoiceId) -> Option<f64> {
        None
    }

    fn stop(&mut self, _voice: VoiceId) {}
}

#[derive(Debug)]
struct ActiveClip {
    voice: VoiceId,
    stop_at: f64,
    poll: TaskHandle,
    fallback: TaskHandle,
}

/// Starts voices on selection change and stops them on time
pub struct PlaybackScheduler {
    player: Box<dyn ClipPlayer + Send>,
    last_start: Option<Instant>,
    min_interval: Duration,
    stop_margin: f64,
    fallback_grace: Duration,
    stop_poll: Duration,
    active: Vec<ActiveClip>,
}

impl PlaybackScheduler {
    pub fn new(player: Box<dyn ClipPlayer + Send>, config: &EngineConfig) -> Self {
        Self {
            player,
            last_start: None,
            min_interval: config.min_play_interval(),
            stop_margin: config.stop_margin_s,
            fallback_grace: config.fallback_grace(),
            stop_poll: config.stop_poll(),
            active: Vec::new(),
        }
    }

    /// Whether the throttle allows a start at `now`
    pub fn can_start(&self, now: Instant) -> bool {
        self.last_start
            .map_or(true, |last| now.saturating_duration_since(last) >= self.min_interval)
    }

    /// Start the record's clip unless throttled
    ///
    /// The throttle window restarts even when the voice fails to start.
    pub fn play(
        &mut self,
        record: &ClipRecord,
        now: Instant,
        tasks: &mut TaskScheduler,
    ) -> Option<VoiceId> {
        if !self.can_start(now) {
            log::trace!("Playback of {} throttled", record.id);
            return None;
        }
        self.last_start = Some(now);

        let voice = match self.player.start(record.start_time) {
            Ok(voice) => voice,
            Err(e) => {
                log::debug!("Playback of {} failed to start: {}", record.id, e);
                return None;
            }
        };

        let clip_length = Duration::try_from_secs_f64(record.duration()).unwrap_or(Duration::ZERO);
        let fallback_after = clip_length + self.fallback_grace;
        let poll = tasks.schedule(TaskKind::ClipStopPoll(voice), Schedule::Every(self.stop_poll), now);
        let fallback = tasks.schedule(TaskKind::ClipFallback(voice), Schedule::After(fallback_after), now);

        self.active.push(ActiveClip {
            voice,
            stop_at: record.end_time - self.stop_margin,
            poll,
            fallback,
        });
        log::debug!(
            "Playing {} ({:.2}s-{:.2}s) on voice {}",
            record.id,
            record.start_time,
            record.end_time,
            voice
        );
        Some(voice)
    }

    /// Stop-poll tick: stop the voice once it reaches its stop time
    pub fn on_stop_poll(&mut self, voice: VoiceId, tasks: &mut TaskScheduler) {
        let Some(clip) = self.active.iter().find(|c| c.voice == voice) else {
            return;
        };
        let finished = match self.player.position(voice) {
            Some(position) => position >= clip.stop_at,
            None => true,
        };
        if finished {
            self.finish(voice, tasks);
        }
    }

    /// Fallback timer: force-stop the voice
    pub fn on_fallback(&mut self, voice: VoiceId, tasks: &mut TaskScheduler) {
        if self.active.iter().any(|c| c.voice == voice) {
            log::debug!("Voice {} stopped by fallback timer", voice);
            self.finish(voice, tasks);
        }
    }

    fn finish(&mut self, voice: VoiceId, tasks: &mut TaskScheduler) {
        if let Some(idx) = self.active.iter().position(|c| c.voice == voice) {
            let clip = self.active.swap_remove(idx);
            tasks.cancel(clip.poll);
            tasks.cancel(clip.fallback);
            self.player.stop(voice);
        }
    }

    /// Stop every live voice and cancel its timers
    pub fn stop_all(&mut self, tasks: &mut TaskScheduler) {
        let voices: Vec<VoiceId> = self.active.iter().map(|c| c.voice).collect();
        for voice in voices {
            self.finish(voice, tasks);
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

impl std::fmt::Debug for PlaybackScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackScheduler")
            .field("last_start", &self.last_start)
            .field("min_interval", &self.min_interval)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dataset::tests::record;
    use crate::dataset::{Gender, SoundType};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// What a [`RecordingPlayer`] has been asked to do
    #[derive(Debug, Default)]
    pub(crate) struct PlayerLog {
        pub starts: Vec<f64>,
        pub stops: Vec<VoiceId>,
        pub positions: HashMap<VoiceId, f64>,
        pub fail_starts: bool,
    }

    /// Fake audio primitive recording every call
    #[derive(Debug, Clone, Default)]
    pub(crate) struct RecordingPlayer {
        pub log: Arc<Mutex<PlayerLog>>,
    }

    impl ClipPlayer for RecordingPlayer {
        fn start(&mut self, start_seconds: f64) -> Result<VoiceId, PlaybackError> {
            let mut log = self.log.lock().unwrap();
            if log.fail_starts {
                return Err(PlaybackError::Disconnected);
            }
            log.starts.push(start_seconds);
            let voice = log.starts.len() as VoiceId;
            log.positions.insert(voice, start_seconds);
            Ok(voice)
        }

        fn position(&self, voice: VoiceId) -> Option<f64> {
            self.log.lock().unwrap().positions.get(&voice).copied()
        }

        fn stop(&mut self, voice: VoiceId) {
            let mut log = self.log.lock().unwrap();
            log.positions.remove(&voice);
            log.stops.push(voice);
        }
    }

    fn setup() -> (PlaybackScheduler, RecordingPlayer, TaskScheduler) {
        let player = RecordingPlayer::default();
        let playback = PlaybackScheduler::new(Box::new(player.clone()), &EngineConfig::default());
        (playback, player, TaskScheduler::new())
    }

    fn clip() -> ClipRecord {
        record("a", 30.0, Gender::Male, SoundType::Cough)
    }

    #[test]
    fn test_throttle_allows_one_start_per_interval() {
        let (mut playback, player, mut tasks) = setup();
        let t0 = Instant::now();

        assert!(playback.play(&clip(), t0, &mut tasks).is_some());
        assert!(playback.play(&clip(), t0 + Duration::from_millis(124), &mut tasks).is_none());
        assert_eq!(player.log.lock().unwrap().starts.len(), 1);

        assert!(playback.play(&clip(), t0 + Duration::from_millis(125), &mut tasks).is_some());
        assert_eq!(player.log.lock().unwrap().starts, vec![1.0, 1.0]);
    }

    #[test]
    fn test_stop_poll_stops_at_margin() {
        let (mut playback, player, mut tasks) = setup();
        let t0 = Instant::now();
        let voice = playback.play(&clip(), t0, &mut tasks).unwrap();

        player.log.lock().unwrap().positions.insert(voice, 2.41);
        playback.on_stop_poll(voice, &mut tasks);
        assert_eq!(playback.active_count(), 1);

        // Past end_time 2.5 - 0.08
        player.log.lock().unwrap().positions.insert(voice, 2.43);
        playback.on_stop_poll(voice, &mut tasks);
        assert_eq!(playback.active_count(), 0);
        assert_eq!(player.log.lock().unwrap().stops, vec![voice]);
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_fallback_timer_fires_after_duration_plus_grace() {
        let (mut playback, player, mut tasks) = setup();
        let t0 = Instant::now();
        let voice = playback.play(&clip(), t0, &mut tasks).unwrap();

        // Clip is 1.5 s long; position reporting is stalled
        let due = tasks.due(t0 + Duration::from_millis(1599), false);
        assert!(!due.iter().any(|(_, k)| *k == TaskKind::ClipFallback(voice)));

        let due = tasks.due(t0 + Duration::from_millis(1600), false);
        assert!(due.iter().any(|(_, k)| *k == TaskKind::ClipFallback(voice)));
        playback.on_fallback(voice, &mut tasks);

        assert_eq!(player.log.lock().unwrap().stops, vec![voice]);
        assert!(!tasks.is_scheduled(TaskKind::ClipStopPoll(voice)));
    }

    #[test]
    fn test_failed_start_is_swallowed_but_throttles() {
        let (mut playback, player, mut tasks) = setup();
        player.log.lock().unwrap().fail_starts = true;
        let t0 = Instant::now();

        assert!(playback.play(&clip(), t0, &mut tasks).is_none());
        assert!(tasks.is_empty());
        assert!(!playback.can_start(t0 + Duration::from_millis(50)));
    }

    #[test]
    fn test_stop_all_releases_every_voice() {
        let (mut playback, player, mut tasks) = setup();
        let t0 = Instant::now();
        playback.play(&clip(), t0, &mut tasks);
        playback.play(&clip(), t0 + Duration::from_millis(200), &mut tasks);
        assert_eq!(tasks.len(), 4);

        playback.stop_all(&mut tasks);
        assert_eq!(playback.active_count(), 0);
        assert_eq!(player.log.lock().unwrap().stops.len(), 2);
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_disconnected_player_never_starts() {
        let mut playback =
            PlaybackScheduler::new(Box::new(DisconnectedPlayer), &EngineConfig::default());
        let mut tasks = TaskScheduler::new();
        assert!(playback.play(&clip(), Instant::now(), &mut tasks).is_none());
    }
}
