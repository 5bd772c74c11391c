//! Cooperative task scheduler
//!
//! Every recurring or delayed piece of engine work (render pass, pan loop,
//! zoom tick, recenter tick, per-clip stop poll and fallback) is a task with
//! an explicit handle. The host calls [`TaskScheduler::due`] on each
//! animation frame and timer tick and dispatches what it returns; nothing in
//! here knows about a UI framework or reads the clock itself.
//!
//! Ordering is deterministic: frame tasks run in registration order, then
//! timed tasks by `(deadline, registration order)`.

use std::time::{Duration, Instant};

use crate::playback::VoiceId;

/// What a task does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Per-frame draw
    Render,
    /// Per-frame pan step while the pointer presses against an edge
    PanLoop,
    /// Hold-to-zoom tick
    ZoomTick,
    /// Smooth recentering step at minimum scale
    RecenterTick,
    /// Compare a live clip's position with its stop time
    ClipStopPoll(VoiceId),
    /// Force-stop a clip whose stop poll never fired
    ClipFallback(VoiceId),
}

/// When a task fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    EveryFrame,
    Every(Duration),
    After(Duration),
}

/// Cancellation token for a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct Task {
    handle: TaskHandle,
    kind: TaskKind,
    schedule: Schedule,
    /// Next deadline for timed tasks
    next_due: Option<Instant>,
    /// One-shot that fired in the latest batch (reaped on the next `due`)
    fired: bool,
}

/// Registry of live tasks
#[derive(Debug, Default)]
pub struct TaskScheduler {
    next_id: u64,
    tasks: Vec<Task>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task; timed schedules count from `now`
    pub fn schedule(&mut self, kind: TaskKind, schedule: Schedule, now: Instant) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        let next_due = match schedule {
            Schedule::EveryFrame => None,
            Schedule::Every(period) | Schedule::After(period) => Some(now + period),
        };
        self.tasks.push(Task {
            handle,
            kind,
            schedule,
            next_due,
            fired: false,
        });
        handle
    }

    /// Cancel a task; returns false if it was not live
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.handle != handle);
        self.tasks.len() != before
    }

    /// Cancel every task of a kind
    pub fn cancel_kind(&mut self, kind: TaskKind) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.kind != kind);
        before - self.tasks.len()
    }

    pub fn cancel_all(&mut self) {
        if !self.tasks.is_empty() {
            log::debug!("Cancelling {} scheduled tasks", self.tasks.len());
        }
        self.tasks.clear();
    }

    /// Whether a handle may still run
    ///
    /// A one-shot returned by the latest [`due`](Self::due) batch stays live
    /// until that batch is over, so cancelling it from an earlier task in the
    /// same batch suppresses it.
    pub fn is_live(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|t| t.handle == handle)
    }

    /// Whether a pending task of this kind exists
    pub fn is_scheduled(&self, kind: TaskKind) -> bool {
        self.tasks.iter().any(|t| t.kind == kind && !t.fired)
    }

    /// Collect the tasks due at `now`
    ///
    /// `is_frame` selects whether per-frame tasks run. Periodic tasks fire at
    /// most once per call; one that fell behind resumes one period from `now`.
    pub fn due(&mut self, now: Instant, is_frame: bool) -> Vec<(TaskHandle, TaskKind)> {
        self.tasks.retain(|t| !t.fired);

        let mut frame_tasks = Vec::new();
        let mut timed: Vec<(Instant, TaskHandle, TaskKind)> = Vec::new();

        for task in &mut self.tasks {
            match (task.schedule, task.next_due) {
                (Schedule::EveryFrame, _) => {
                    if is_frame {
                        frame_tasks.push((task.handle, task.kind));
                    }
                }
                (Schedule::Every(period), Some(deadline)) if deadline <= now => {
                    timed.push((deadline, task.handle, task.kind));
                    let next = deadline + period;
                    task.next_due = Some(if next <= now { now + period } else { next });
                }
                (Schedule::After(_), Some(deadline)) if deadline <= now => {
                    timed.push((deadline, task.handle, task.kind));
                    task.fired = true;
                }
                _ => {}
            }
        }

        timed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        frame_tasks.extend(timed.into_iter().map(|(_, handle, kind)| (handle, kind)));
        frame_tasks
    }

    /// Earliest pending deadline among timed tasks
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks
            .iter()
            .filter(|t| !t.fired)
            .filter_map(|t| t.next_due)
            .min()
    }

    pub fn has_timed_tasks(&self) -> bool {
        self.next_deadline().is_some()
    }

    /// Number of pending tasks
    pub fn len(&self) -> usize {
        self.tasks.iter().filter(|t| !t.fired).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
