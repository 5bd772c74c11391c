//! Grid explorer engine
//!
//! [`Explorer`] owns every piece of mutable view state (transform, selection,
//! filters, colour mode, published grid, trail marks) together with the task
//! scheduler and the playback scheduler. Each host callback is a method taking
//! the event and the current time, so the whole interaction model runs
//! without a UI framework:
//!
//! - pointer and wheel input: [`Explorer::pointer_down`],
//!   [`Explorer::pointer_move`], [`Explorer::pointer_up`], [`Explorer::wheel`]
//! - zoom buttons: [`Explorer::start_zoom`], [`Explorer::stop_zoom`]
//! - animation frames and timers: [`Explorer::on_frame`],
//!   [`Explorer::on_timer`]
//! - grid rebuilds: [`Explorer::take_rebuild_request`],
//!   [`Explorer::publish_grid`]

pub mod pan;
pub mod scene;
pub mod selection;
pub mod trail;
pub mod zoom;

pub use pan::{clamp_pan_to_grid, pan_intent, PanVector};
pub use scene::{build_frame, GridLayer, RenderFrame, SceneInput, Spotlight, TrailOutline};
pub use selection::find_nearest_valid_cell;
pub use trail::TrailTracker;
pub use zoom::{apply_zoom, recenter_step, RecenterStep, ZoomDirection, ZoomOutcome, ZoomPhase};

use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;

use crate::compositor::{spotlight_tile, CompositedGrid, RebuildRequest};
use crate::config::EngineConfig;
use crate::dataset::{ClipRecord, Dataset};
use crate::filter::{CompiledFilters, FilterSet};
use crate::palette::ColorMode;
use crate::playback::{ClipPlayer, PlaybackScheduler};
use crate::runtime::{Schedule, TaskKind, TaskScheduler};
use crate::transform::{center_transform, Transform};
use crate::types::{Cell, ScreenPoint, Viewport};
use zoom::ZoomController;

/// Pointer hold and pan state
#[derive(Debug, Default, Clone, Copy)]
struct PointerState {
    down: bool,
    last: Option<ScreenPoint>,
    pan: PanVector,
    panning: bool,
}

/// The grid explorer's state and reducers
pub struct Explorer {
    config: EngineConfig,
    dataset: Arc<Dataset>,
    sprite: Option<Arc<RgbaImage>>,
    filters: FilterSet,
    compiled: CompiledFilters,
    color_mode: ColorMode,

    transform: Transform,
    viewport: Viewport,
    centered: bool,
    selected: Cell,
    pointer: PointerState,
    zoom: ZoomController,
    trail: TrailTracker,

    tasks: TaskScheduler,
    playback: PlaybackScheduler,

    grid: Option<CompositedGrid>,
    requested_generation: u64,
    pending_rebuild: Option<RebuildRequest>,
    spotlight_cache: Option<(Cell, Arc<RgbaImage>)>,
    label_anchor: Option<ScreenPoint>,
    torn_down: bool,
}

impl Explorer {
    /// Mount the engine: registers the pan loop and render pass and queues
    /// the first grid rebuild
    pub fn new(
        dataset: Arc<Dataset>,
        player: Box<dyn ClipPlayer + Send>,
        mut config: EngineConfig,
        now: Instant,
    ) -> Self {
        config.validate();
        let mut tasks = TaskScheduler::new();
        tasks.schedule(TaskKind::PanLoop, Schedule::EveryFrame, now);
        tasks.schedule(TaskKind::Render, Schedule::EveryFrame, now);

        let mut explorer = Self {
            playback: PlaybackScheduler::new(player, &config),
            trail: TrailTracker::new(config.trail_fade()),
            transform: Transform::new(config.min_scale, 0.0, 0.0),
            config,
            dataset,
            sprite: None,
            filters: FilterSet::new(),
            compiled: CompiledFilters::default(),
            color_mode: ColorMode::None,
            viewport: Viewport::default(),
            centered: false,
            selected: Cell::center(),
            pointer: PointerState::default(),
            zoom: ZoomController::default(),
            tasks,
            grid: None,
            requested_generation: 0,
            pending_rebuild: None,
            spotlight_cache: None,
            label_anchor: None,
            torn_down: false,
        };
        explorer.queue_rebuild();
        explorer
    }

    // ── Assets ─────────────────────────────────────────────────────────────

    /// Sprite sheet used for the spotlight (the compositor keeps its own)
    pub fn set_sprite(&mut self, sprite: Option<Arc<RgbaImage>>) {
        self.sprite = sprite;
        self.spotlight_cache = None;
    }

    // ── Filters and colour mode ────────────────────────────────────────────

    pub fn set_filters(&mut self, filters: FilterSet) {
        if filters == self.filters {
            return;
        }
        self.compiled = filters.compile();
        self.filters = filters;
        self.queue_rebuild();
    }

    pub fn set_color_mode(&mut self, mode: ColorMode) {
        if mode == self.color_mode {
            return;
        }
        self.color_mode = mode;
        self.queue_rebuild();
    }

    fn queue_rebuild(&mut self) {
        self.requested_generation += 1;
        self.pending_rebuild = Some(RebuildRequest {
            generation: self.requested_generation,
            filters: self.filters.clone(),
            mode: self.color_mode,
        });
    }

    /// Rebuild the host should hand to the compositor worker
    pub fn take_rebuild_request(&mut self) -> Option<RebuildRequest> {
        self.pending_rebuild.take()
    }

    /// Publish a finished grid; older generations than the current one are
    /// ignored
    pub fn publish_grid(&mut self, grid: CompositedGrid) -> bool {
        if self
            .grid
            .as_ref()
            .is_some_and(|g| g.generation >= grid.generation)
        {
            log::debug!("Discarding stale grid generation {}", grid.generation);
            return false;
        }
        log::debug!("Published grid generation {}", grid.generation);
        self.grid = Some(grid);
        true
    }

    /// Whether a composited grid has been published
    pub fn grid_ready(&self) -> bool {
        self.grid.is_some()
    }

    /// Whether the newest requested rebuild is on screen
    pub fn grid_current(&self) -> bool {
        self.grid
            .as_ref()
            .is_some_and(|g| g.generation == self.requested_generation)
    }

    // ── Viewport ───────────────────────────────────────────────────────────

    /// Viewport size changed; the first known size centers the grid
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if !self.centered && viewport.is_known() {
            self.transform = center_transform(self.config.initial_scale, Cell::center(), viewport);
            self.centered = true;
            log::debug!("Initial centering at scale {}", self.config.initial_scale);
        }
    }

    // ── Pointer ────────────────────────────────────────────────────────────

    pub fn pointer_down(&mut self, p: ScreenPoint, now: Instant) {
        self.pointer.down = true;
        self.pointer_move(p, now);
    }

    /// Pointer moved; ignored unless the pointer is held
    pub fn pointer_move(&mut self, p: ScreenPoint, now: Instant) {
        if !self.pointer.down {
            return;
        }
        self.pointer.last = Some(p);
        self.pointer.pan = pan_intent(p, self.viewport, self.transform.scale);
        self.pointer.panning = !self.pointer.pan.is_zero();
        self.select_at(p, now);
    }

    /// Global pointer release (fires even outside the canvas)
    pub fn pointer_up(&mut self) {
        self.pointer.down = false;
        self.pointer.panning = false;
        self.pointer.pan = PanVector::ZERO;
    }

    pub fn is_pointer_down(&self) -> bool {
        self.pointer.down
    }

    pub fn is_panning(&self) -> bool {
        self.pointer.panning
    }

    /// Resolve the cell under `p` and select it (or its nearest valid neighbour)
    fn select_at(&mut self, p: ScreenPoint, now: Instant) {
        let cell = self.transform.screen_to_cell(p);
        let Some(target) = find_nearest_valid_cell(cell, &self.dataset, &self.compiled) else {
            return;
        };
        self.select(target, now);
    }

    fn select(&mut self, target: Cell, now: Instant) {
        if target == self.selected {
            return;
        }
        if self.dataset.contains(self.selected) {
            self.trail.push(self.selected, now);
        }
        self.selected = target;

        let dataset = Arc::clone(&self.dataset);
        if let Some(record) = dataset.get(target) {
            self.playback.play(record, now, &mut self.tasks);
        }
    }

    // ── Zoom ───────────────────────────────────────────────────────────────

    /// Wheel zoom; negative `delta_y` zooms in. Ignored until the grid is ready.
    pub fn wheel(&mut self, delta_y: f32, now: Instant) {
        if !self.grid_ready() {
            return;
        }
        let direction = if delta_y < 0.0 {
            ZoomDirection::In
        } else {
            ZoomDirection::Out
        };
        self.zoom_step(direction, self.config.wheel_zoom_factor, now);
    }

    /// Begin press-and-hold zoom (first step after one tick)
    pub fn start_zoom(&mut self, direction: ZoomDirection, now: Instant) {
        let task = self
            .tasks
            .schedule(TaskKind::ZoomTick, Schedule::Every(self.config.zoom_tick()), now);
        if let Some(previous) = self.zoom.begin_hold(direction, task) {
            self.tasks.cancel(previous);
        }
    }

    pub fn stop_zoom(&mut self) {
        if let Some(task) = self.zoom.end_hold() {
            self.tasks.cancel(task);
        }
    }

    fn zoom_step(&mut self, direction: ZoomDirection, factor: f32, now: Instant) {
        let outcome = apply_zoom(
            &self.transform,
            direction,
            factor,
            self.selected,
            self.config.min_scale,
            self.config.max_scale,
        );

        match outcome {
            // A transition already under way keeps easing
            ZoomOutcome::Recenter if self.zoom.is_recentering() => {}
            ZoomOutcome::Recenter => {
                let task = self.tasks.schedule(
                    TaskKind::RecenterTick,
                    Schedule::After(self.config.recenter_start()),
                    now,
                );
                self.zoom.set_recenter(task);
            }
            ZoomOutcome::Scaled(next) => {
                self.cancel_recenter();
                self.transform = next;
            }
            ZoomOutcome::Unchanged => self.cancel_recenter(),
        }
    }

    fn cancel_recenter(&mut self) {
        if let Some(task) = self.zoom.end_recenter() {
            self.tasks.cancel(task);
        }
    }

    /// Centered transform at minimum scale (zoom-out snap target)
    pub fn home_transform(&self) -> Transform {
        center_transform(self.config.min_scale, Cell::center(), self.viewport)
    }

    fn recenter_tick(&mut self, now: Instant) {
        self.zoom.end_recenter();
        let target = self.home_transform();
        match recenter_step(&self.transform, &target, self.config.center_smoothing_factor) {
            RecenterStep::Continue(next) => {
                self.transform = next;
                let task = self.tasks.schedule(
                    TaskKind::RecenterTick,
                    Schedule::After(self.config.recenter_tick()),
                    now,
                );
                self.zoom.set_recenter(task);
            }
            RecenterStep::Done(done) => {
                self.transform = done;
                log::debug!("Recentering complete");
            }
        }
    }

    // ── Ticks ──────────────────────────────────────────────────────────────

    /// Animation frame: runs per-frame tasks plus any due timers and returns
    /// the frame to paint
    pub fn on_frame(&mut self, now: Instant) -> Option<RenderFrame> {
        self.run_due(now, true)
    }

    /// Timer tick between frames
    pub fn on_timer(&mut self, now: Instant) {
        self.run_due(now, false);
    }

    fn run_due(&mut self, now: Instant, is_frame: bool) -> Option<RenderFrame> {
        let mut frame = None;
        for (handle, kind) in self.tasks.due(now, is_frame) {
            if !self.tasks.is_live(handle) {
                continue;
            }
            match kind {
                TaskKind::Render => frame = Some(self.render(now)),
                TaskKind::PanLoop => self.pan_step(now),
                TaskKind::ZoomTick => {
                    if let Some(direction) = self.zoom.hold_direction() {
                        self.zoom_step(direction, self.config.zoom_factor, now);
                    }
                }
                TaskKind::RecenterTick => self.recenter_tick(now),
                TaskKind::ClipStopPoll(voice) => self.playback.on_stop_poll(voice, &mut self.tasks),
                TaskKind::ClipFallback(voice) => self.playback.on_fallback(voice, &mut self.tasks),
            }
        }
        frame
    }

    fn pan_step(&mut self, now: Instant) {
        if !self.pointer.panning {
            return;
        }
        let step = clamp_pan_to_grid(self.pointer.pan, self.selected);
        if step.is_zero() {
            self.pointer.panning = false;
            return;
        }
        self.transform.translate_x -= step.x * self.config.pan_speed;
        self.transform.translate_y -= step.y * self.config.pan_speed;
        if let Some(p) = self.pointer.last {
            self.select_at(p, now);
        }
    }

    fn spotlight_image(&mut self) -> Option<Arc<RgbaImage>> {
        let sprite = self.sprite.as_ref()?;
        if let Some((cell, image)) = &self.spotlight_cache {
            if *cell == self.selected {
                return Some(Arc::clone(image));
            }
        }
        let size = scene::SPOTLIGHT_SIZE as u32;
        let image = Arc::new(spotlight_tile(
            sprite,
            self.selected,
            size,
            self.config.spotlight_gamma,
        )?);
        self.spotlight_cache = Some((self.selected, Arc::clone(&image)));
        Some(image)
    }

    fn render(&mut self, now: Instant) -> RenderFrame {
        let trails = self.trail.prune(now);
        let has_record = self.dataset.contains(self.selected);
        let spotlight_image = if has_record {
            self.spotlight_image()
        } else {
            None
        };

        let frame = build_frame(SceneInput {
            viewport: self.viewport,
            transform: self.transform,
            grid: self.grid.as_ref(),
            trails: &trails,
            selected: self.selected,
            selected_record: self.dataset.get(self.selected),
            color_mode: self.color_mode,
            spotlight_image,
        });
        self.label_anchor = frame.label_anchor;
        frame
    }

    // ── Queries ────────────────────────────────────────────────────────────

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn selected(&self) -> Cell {
        self.selected
    }

    /// Record under the selection, for the metadata readout
    pub fn selected_record(&self) -> Option<&ClipRecord> {
        self.dataset.get(self.selected)
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn zoom_phase(&self) -> ZoomPhase {
        self.zoom.phase()
    }

    /// Where the render pass last anchored the metadata label
    pub fn label_anchor(&self) -> Option<ScreenPoint> {
        self.label_anchor
    }

    pub fn can_zoom_in(&self) -> bool {
        self.transform.scale < self.config.max_scale
    }

    /// At minimum scale and within 1 px of the centered transform
    pub fn is_perfectly_centered(&self) -> bool {
        self.transform.scale == self.config.min_scale
            && self.transform.translate_near(&self.home_transform(), 1.0)
    }

    pub fn can_zoom_out(&self) -> bool {
        !self.is_perfectly_centered()
    }

    pub fn active_voices(&self) -> usize {
        self.playback.active_count()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.next_deadline()
    }

    /// Whether the host needs to deliver timer ticks
    pub fn has_timed_tasks(&self) -> bool {
        self.tasks.has_timed_tasks()
    }

    // ── Teardown ───────────────────────────────────────────────────────────

    /// Cancel every task, release the pointer and stop every voice
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.playback.stop_all(&mut self.tasks);
        self.zoom.end_hold();
        self.zoom.end_recenter();
        self.pointer_up();
        self.trail.clear();
        self.tasks.cancel_all();
        log::debug!("Explorer torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl Drop for Explorer {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Explorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Explorer")
            .field("transform", &self.transform)
            .field("viewport", &self.viewport)
            .field("selected", &self.selected)
            .field("color_mode", &self.color_mode)
            .field("filters", &self.filters)
            .field("zoom", &self.zoom.phase())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::record;
    use crate::dataset::{Gender, SoundType};
    use crate::playback::tests::RecordingPlayer;
    use crate::types::GRID_SIZE;
    use std::time::Duration;

    const VIEW: Viewport = Viewport::new(1000.0, 800.0);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Every cell has a record; odd columns are coughs, even columns sighs
    fn full_dataset() -> Arc<Dataset> {
        let cells = (0..GRID_SIZE).flat_map(|x| (0..GRID_SIZE).map(move |y| Cell::new(x, y)));
        Arc::new(Dataset::from_records(cells.map(|c| {
            let sound = if c.x % 2 == 1 { SoundType::Cough } else { SoundType::Sigh };
            (c, record(&c.dataset_key(), 30.0, Gender::Male, sound))
        })))
    }

    fn setup(dataset: Arc<Dataset>) -> (Explorer, RecordingPlayer, Instant) {
        let player = RecordingPlayer::default();
        let now = Instant::now();
        let mut explorer = Explorer::new(
            dataset,
            Box::new(player.clone()),
            EngineConfig::default(),
            now,
        );
        explorer.resize(VIEW);
        (explorer, player, now)
    }

    fn ready_grid(generation: u64) -> CompositedGrid {
        CompositedGrid {
            image: Arc::new(RgbaImage::new(1, 1)),
            generation,
        }
    }

    fn point_at(explorer: &Explorer, cell: Cell) -> ScreenPoint {
        explorer.transform().cell_to_screen_center(cell)
    }

    #[test]
    fn test_initial_centering() {
        let (explorer, _, _) = setup(full_dataset());
        let expected = center_transform(crate::config::INITIAL_SCALE, Cell::center(), VIEW);
        assert_eq!(explorer.transform(), expected);
        assert_eq!(explorer.selected(), Cell::center());
        let p = explorer.transform().cell_to_screen_center(Cell::center());
        assert_eq!(p, VIEW.center());
    }

    #[test]
    fn test_selection_plays_once_per_throttle_window() {
        let (mut explorer, player, t0) = setup(full_dataset());
        let a = Cell::new(74, 72);
        let b = Cell::new(75, 72);

        explorer.pointer_down(point_at(&explorer, a), t0);
        assert_eq!(explorer.selected(), a);
        explorer.pointer_move(point_at(&explorer, b), t0 + ms(50));
        assert_eq!(explorer.selected(), b);
        assert_eq!(player.log.lock().unwrap().starts.len(), 1);

        // Two marks: the initial center cell and `a`
        let frame = explorer.on_frame(t0 + ms(60)).unwrap();
        assert_eq!(frame.trails.len(), 2);

        // Re-selecting the same cell is not a change
        explorer.pointer_move(point_at(&explorer, b), t0 + ms(300));
        assert_eq!(player.log.lock().unwrap().starts.len(), 1);

        explorer.pointer_move(point_at(&explorer, a), t0 + ms(400));
        assert_eq!(player.log.lock().unwrap().starts.len(), 2);
    }

    #[test]
    fn test_moves_without_press_are_ignored() {
        let (mut explorer, player, t0) = setup(full_dataset());
        explorer.pointer_move(point_at(&explorer, Cell::new(70, 70)), t0);
        assert_eq!(explorer.selected(), Cell::center());
        assert!(player.log.lock().unwrap().starts.is_empty());
    }

    #[test]
    fn test_filtered_selection_snaps_to_nearest_valid() {
        let (mut explorer, _, t0) = setup(full_dataset());
        let mut filters = FilterSet::new();
        filters.add("Cough");
        explorer.set_filters(filters);

        // Column 74 is sighs; ring 1 scans column 73 first
        explorer.pointer_down(point_at(&explorer, Cell::new(74, 70)), t0);
        assert_eq!(explorer.selected(), Cell::new(73, 69));
    }

    #[test]
    fn test_failed_search_keeps_selection() {
        let dataset = Arc::new(Dataset::from_records([(
            Cell::new(0, 0),
            record("only", 30.0, Gender::Male, SoundType::Cough),
        )]));
        let (mut explorer, player, t0) = setup(dataset);
        explorer.pointer_down(VIEW.center(), t0);
        assert_eq!(explorer.selected(), Cell::center());
        assert!(player.log.lock().unwrap().starts.is_empty());
    }

    #[test]
    fn test_edge_press_pans_every_frame() {
        let (mut explorer, _, t0) = setup(full_dataset());
        let before = explorer.transform();

        explorer.pointer_down(ScreenPoint::new(995.0, 400.0), t0);
        assert!(explorer.is_panning());
        explorer.on_frame(t0 + ms(16));
        explorer.on_frame(t0 + ms(32));

        let after = explorer.transform();
        assert!((after.translate_x - (before.translate_x - 10.0)).abs() < 1e-3);
        assert_eq!(after.translate_y, before.translate_y);

        explorer.pointer_up();
        explorer.on_frame(t0 + ms(48));
        assert_eq!(explorer.transform(), after);
    }

    #[test]
    fn test_pan_stops_at_grid_boundary() {
        let (mut explorer, _, t0) = setup(full_dataset());
        // Pan left until the selection reaches column 0
        explorer.pointer_down(ScreenPoint::new(2.0, 400.0), t0);
        let mut now = t0;
        for _ in 0..5000 {
            now += ms(16);
            explorer.on_frame(now);
            if !explorer.is_panning() {
                break;
            }
        }
        assert!(!explorer.is_panning());
        assert_eq!(explorer.selected().x, 0);
    }

    #[test]
    fn test_hold_zoom_ticks_until_released() {
        let (mut explorer, _, t0) = setup(full_dataset());
        let start = explorer.transform().scale;

        explorer.start_zoom(ZoomDirection::In, t0);
        assert_eq!(explorer.zoom_phase(), ZoomPhase::ZoomingIn);
        explorer.on_timer(t0 + ms(5));
        assert_eq!(explorer.transform().scale, start);
        explorer.on_timer(t0 + ms(10));
        assert!((explorer.transform().scale - start * 1.03).abs() < 1e-5);

        explorer.stop_zoom();
        assert!(!explorer.has_timed_tasks());
        explorer.on_timer(t0 + ms(40));
        assert!((explorer.transform().scale - start * 1.03).abs() < 1e-5);
    }

    #[test]
    fn test_zoom_in_stops_at_max() {
        let (mut explorer, _, t0) = setup(full_dataset());
        explorer.publish_grid(ready_grid(1));
        for i in 0..200 {
            explorer.wheel(-1.0, t0 + ms(i));
        }
        assert_eq!(explorer.transform().scale, crate::config::MAX_SCALE);
        assert!(!explorer.can_zoom_in());
    }

    #[test]
    fn test_wheel_ignored_until_grid_ready() {
        let (mut explorer, _, t0) = setup(full_dataset());
        let before = explorer.transform();
        explorer.wheel(-1.0, t0);
        assert_eq!(explorer.transform(), before);
    }

    #[test]
    fn test_zoom_out_at_floor_recenters() {
        let (mut explorer, _, t0) = setup(full_dataset());
        explorer.publish_grid(ready_grid(1));
        // Drift away from center, then zoom all the way out
        explorer.pointer_down(ScreenPoint::new(995.0, 795.0), t0);
        for i in 1..40 {
            explorer.on_frame(t0 + ms(16 * i));
        }
        explorer.pointer_up();

        let mut now = t0 + ms(1000);
        while explorer.transform().scale > crate::config::MIN_SCALE {
            explorer.wheel(1.0, now);
        }
        assert!(!explorer.is_perfectly_centered());

        explorer.wheel(1.0, now);
        assert_eq!(explorer.zoom_phase(), ZoomPhase::Recentering);
        let mut ticks = 0;
        while explorer.zoom_phase() == ZoomPhase::Recentering {
            now += ms(16);
            explorer.on_timer(now);
            ticks += 1;
            assert!(ticks < 500, "recentering never finished");
        }
        assert!(explorer.is_perfectly_centered());
        assert!(!explorer.can_zoom_out());
    }

    #[test]
    fn test_rebuild_generations() {
        let (mut explorer, _, _) = setup(full_dataset());
        let first = explorer.take_rebuild_request().unwrap();
        assert_eq!(first.generation, 1);
        assert!(explorer.take_rebuild_request().is_none());

        explorer.set_color_mode(ColorMode::Age);
        explorer.set_color_mode(ColorMode::Age);
        let second = explorer.take_rebuild_request().unwrap();
        assert_eq!(second.generation, 2);
        assert_eq!(second.mode, ColorMode::Age);

        assert!(explorer.publish_grid(ready_grid(2)));
        assert!(!explorer.publish_grid(ready_grid(1)));
        assert!(explorer.grid_current());
    }

    #[test]
    fn test_view_changes_never_request_rebuild() {
        let (mut explorer, _, t0) = setup(full_dataset());
        explorer.take_rebuild_request().unwrap();
        explorer.publish_grid(ready_grid(1));
        let start = explorer.transform();

        explorer.pointer_down(point_at(&explorer, Cell::new(74, 72)), t0);
        explorer.wheel(-1.0, t0 + ms(5));

        explorer.start_zoom(ZoomDirection::In, t0 + ms(10));
        explorer.on_timer(t0 + ms(25));
        explorer.stop_zoom();

        // Hold near the right edge so the pan loop moves the grid
        explorer.pointer_move(ScreenPoint::new(VIEW.width - 5.0, VIEW.height / 2.0), t0 + ms(30));
        explorer.on_frame(t0 + ms(40));
        explorer.on_frame(t0 + ms(56));
        explorer.pointer_up();

        assert_ne!(explorer.transform(), start);
        assert_ne!(explorer.selected(), Cell::center());
        assert!(explorer.take_rebuild_request().is_none());
        assert!(explorer.grid_current());
    }

    #[test]
    fn test_render_frame_contents() {
        let (mut explorer, _, t0) = setup(full_dataset());
        assert!(explorer.on_frame(t0).unwrap().grid.is_none());

        explorer.publish_grid(ready_grid(1));
        let frame = explorer.on_frame(t0 + ms(16)).unwrap();
        assert_eq!(frame.grid.unwrap().generation, 1);
        assert!(frame.spotlight.is_some());
        assert_eq!(explorer.label_anchor(), frame.label_anchor);
        // No timers fire on frames alone
        assert!(explorer.on_frame(t0 + ms(32)).is_some());
    }

    #[test]
    fn test_clip_stops_via_fallback_when_position_stalls() {
        let (mut explorer, player, t0) = setup(full_dataset());
        explorer.pointer_down(point_at(&explorer, Cell::new(74, 72)), t0);
        assert_eq!(explorer.active_voices(), 1);

        // Record spans 1.0..2.5 s; the fake never advances its position
        explorer.on_timer(t0 + ms(1599));
        assert_eq!(explorer.active_voices(), 1);
        explorer.on_timer(t0 + ms(1600));
        assert_eq!(explorer.active_voices(), 0);
        assert_eq!(player.log.lock().unwrap().stops.len(), 1);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let (mut explorer, player, t0) = setup(full_dataset());
        explorer.pointer_down(point_at(&explorer, Cell::new(74, 72)), t0);
        explorer.start_zoom(ZoomDirection::Out, t0);
        assert!(!explorer.trail.is_empty());

        explorer.teardown();
        assert!(explorer.is_torn_down());
        assert!(!explorer.is_pointer_down());
        assert_eq!(explorer.active_voices(), 0);
        assert_eq!(player.log.lock().unwrap().stops.len(), 1);
        assert!(explorer.on_frame(t0 + ms(16)).is_none());
        assert!(!explorer.has_timed_tasks());
        assert!(explorer.trail.is_empty());
    }

    #[test]
    fn test_drop_stops_voices() {
        let (mut explorer, player, t0) = setup(full_dataset());
        explorer.pointer_down(point_at(&explorer, Cell::new(74, 72)), t0);
        drop(explorer);
        assert_eq!(player.log.lock().unwrap().stops.len(), 1);
    }
}
