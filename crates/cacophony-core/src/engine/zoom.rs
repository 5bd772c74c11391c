//! Zoom controller
//!
//! Zooming keeps the selected cell's center fixed on screen. Zooming out at
//! the minimum scale does not clamp silently: it starts a recentering
//! transition that eases the grid back to its centered position.

use crate::runtime::TaskHandle;
use crate::transform::Transform;
use crate::types::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Observable zoom state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomPhase {
    Idle,
    ZoomingIn,
    ZoomingOut,
    Recentering,
}

/// Result of one zoom step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomOutcome {
    /// Scale already at its bound
    Unchanged,
    Scaled(Transform),
    /// Zoom-out at the floor: ease back to center instead
    Recenter,
}

/// One zoom step by `factor` around the center of `focus`
pub fn apply_zoom(
    transform: &Transform,
    direction: ZoomDirection,
    factor: f32,
    focus: Cell,
    min_scale: f32,
    max_scale: f32,
) -> ZoomOutcome {
    let old = transform.scale;
    let new = match direction {
        ZoomDirection::Out if old <= min_scale => return ZoomOutcome::Recenter,
        ZoomDirection::Out => (old / factor).max(min_scale),
        ZoomDirection::In => (old * factor).min(max_scale),
    };

    if new == old {
        ZoomOutcome::Unchanged
    } else {
        ZoomOutcome::Scaled(transform.focal_zoom(new, focus))
    }
}

/// Result of one recentering tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecenterStep {
    Continue(Transform),
    /// Within 1 px on both axes; snapped exactly onto the target
    Done(Transform),
}

/// Move `smoothing` of the remaining distance toward `target`'s translation
pub fn recenter_step(current: &Transform, target: &Transform, smoothing: f32) -> RecenterStep {
    let dx = target.translate_x - current.translate_x;
    let dy = target.translate_y - current.translate_y;

    if dx.abs() < 1.0 && dy.abs() < 1.0 {
        return RecenterStep::Done(Transform::new(
            current.scale,
            target.translate_x,
            target.translate_y,
        ));
    }
    RecenterStep::Continue(Transform::new(
        current.scale,
        current.translate_x + dx * smoothing,
        current.translate_y + dy * smoothing,
    ))
}

/// Hold and recenter task bookkeeping
#[derive(Debug, Default)]
pub struct ZoomController {
    hold: Option<(ZoomDirection, TaskHandle)>,
    recenter: Option<TaskHandle>,
}

impl ZoomController {
    pub fn phase(&self) -> ZoomPhase {
        match (self.recenter, self.hold) {
            (Some(_), _) => ZoomPhase::Recentering,
            (None, Some((ZoomDirection::In, _))) => ZoomPhase::ZoomingIn,
            (None, Some((ZoomDirection::Out, _))) => ZoomPhase::ZoomingOut,
            (None, None) => ZoomPhase::Idle,
        }
    }

    pub fn hold_direction(&self) -> Option<ZoomDirection> {
        self.hold.map(|(dir, _)| dir)
    }

    pub fn begin_hold(&mut self, direction: ZoomDirection, task: TaskHandle) -> Option<TaskHandle> {
        self.hold.replace((direction, task)).map(|(_, t)| t)
    }

    pub fn end_hold(&mut self) -> Option<TaskHandle> {
        self.hold.take().map(|(_, t)| t)
    }

    pub fn is_recentering(&self) -> bool {
        self.recenter.is_some()
    }

    /// Track the pending recenter tick, returning the one it replaces
    pub fn set_recenter(&mut self, task: TaskHandle) -> Option<TaskHandle> {
        self.recenter.replace(task)
    }

    pub fn end_recenter(&mut self) -> Option<TaskHandle> {
        self.recenter.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MAX_SCALE, MIN_SCALE};
    use crate::transform::center_transform;
    use crate::types::Viewport;

    fn zoom(t: &Transform, dir: ZoomDirection) -> ZoomOutcome {
        apply_zoom(t, dir, 1.03, Cell::new(10, 10), MIN_SCALE, MAX_SCALE)
    }

    #[test]
    fn test_zoom_in_never_exceeds_max() {
        let mut t = Transform::new(0.5, 0.0, 0.0);
        for _ in 0..500 {
            if let ZoomOutcome::Scaled(next) = zoom(&t, ZoomDirection::In) {
                t = next;
            }
            assert!(t.scale <= MAX_SCALE);
        }
        assert_eq!(t.scale, MAX_SCALE);
        assert_eq!(zoom(&t, ZoomDirection::In), ZoomOutcome::Unchanged);
    }

    #[test]
    fn test_zoom_out_floors_then_recenters() {
        let mut t = Transform::new(0.5, 0.0, 0.0);
        let mut recentered = false;
        for _ in 0..500 {
            match zoom(&t, ZoomDirection::Out) {
                ZoomOutcome::Scaled(next) => t = next,
                ZoomOutcome::Recenter => {
                    recentered = true;
                    break;
                }
                ZoomOutcome::Unchanged => panic!("zoom-out stalled above floor"),
            }
            assert!(t.scale >= MIN_SCALE);
        }
        assert!(recentered);
        assert_eq!(t.scale, MIN_SCALE);
    }

    #[test]
    fn test_zoom_keeps_focus_fixed() {
        let t = Transform::new(0.8, -100.0, 50.0);
        let focus = Cell::new(10, 10);
        let before = t.cell_to_screen_center(focus);
        let ZoomOutcome::Scaled(next) = zoom(&t, ZoomDirection::In) else {
            panic!("expected a scale change");
        };
        let after = next.cell_to_screen_center(focus);
        assert!((before.x - after.x).abs() < 1e-2 && (before.y - after.y).abs() < 1e-2);
    }

    #[test]
    fn test_recentering_terminates() {
        let viewport = Viewport::new(1280.0, 720.0);
        let target = center_transform(MIN_SCALE, Cell::center(), viewport);
        let mut t = Transform::new(MIN_SCALE, -3000.0, 2500.0);

        let mut ticks = 0;
        loop {
            ticks += 1;
            assert!(ticks < 200, "recentering did not converge");
            match recenter_step(&t, &target, 0.08) {
                RecenterStep::Continue(next) => t = next,
                RecenterStep::Done(done) => {
                    t = done;
                    break;
                }
            }
        }
        assert_eq!(t, target);
    }

    #[test]
    fn test_controller_phases() {
        use crate::runtime::{Schedule, TaskKind, TaskScheduler};
        let now = std::time::Instant::now();
        let mut sched = TaskScheduler::new();
        let mut zoom = ZoomController::default();
        assert_eq!(zoom.phase(), ZoomPhase::Idle);

        let tick = sched.schedule(TaskKind::ZoomTick, Schedule::EveryFrame, now);
        assert_eq!(zoom.begin_hold(ZoomDirection::Out, tick), None);
        assert_eq!(zoom.phase(), ZoomPhase::ZoomingOut);

        let recenter = sched.schedule(TaskKind::RecenterTick, Schedule::EveryFrame, now);
        zoom.set_recenter(recenter);
        assert_eq!(zoom.phase(), ZoomPhase::Recentering);

        assert_eq!(zoom.end_hold(), Some(tick));
        assert_eq!(zoom.end_recenter(), Some(recenter));
        assert_eq!(zoom.phase(), ZoomPhase::Idle);
    }
}
