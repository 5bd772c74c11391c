//! Fading marks on recently visited cells

use std::time::{Duration, Instant};

use crate::types::Cell;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailMark {
    pub cell: Cell,
    pub timestamp: Instant,
}

/// Short-lived marks, expired lazily once per frame
#[derive(Debug, Clone)]
pub struct TrailTracker {
    marks: Vec<TrailMark>,
    fade: Duration,
}

impl TrailTracker {
    pub fn new(fade: Duration) -> Self {
        Self {
            marks: Vec::new(),
            fade,
        }
    }

    pub fn push(&mut self, cell: Cell, now: Instant) {
        self.marks.push(TrailMark { cell, timestamp: now });
    }

    /// Drop expired marks and return the survivors with their opacity
    ///
    /// A mark survives while `now - timestamp < fade`, at
    /// `alpha = 1 - elapsed / fade`.
    pub fn prune(&mut self, now: Instant) -> Vec<(Cell, f32)> {
        let fade = self.fade;
        self.marks
            .retain(|m| now.saturating_duration_since(m.timestamp) < fade);
        self.marks
            .iter()
            .map(|m| {
                let elapsed = now.saturating_duration_since(m.timestamp);
                let alpha = 1.0 - elapsed.as_secs_f32() / fade.as_secs_f32();
                (m.cell, alpha)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }
}
