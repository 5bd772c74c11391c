//! Main iced application for cacophony
//!
//! Owns the [`Explorer`] once both the dataset and the sprite sheet have
//! loaded, forwards window events to it and paints whatever render frame it
//! returns. The compositor worker runs beside it and is polled every frame.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cacophony_core::compositor::{CompositorWorker, RgbaImage};
use cacophony_core::config::EngineConfig;
use cacophony_core::dataset::Dataset;
use cacophony_core::engine::{Explorer, RenderFrame};
use cacophony_core::playback::{ClipPlayer, DisconnectedPlayer};
use cacophony_core::types::{Cell, Viewport};
use cacophony_widgets::{grid_view, GridEvent, GridImages, MetadataLabel};
use iced::widget::{container, opaque, stack};
use iced::{event, mouse, time, touch, window, Element, Event, Length, Subscription, Task, Theme};

use super::controls::{self, FilterCategory};
use super::message::Message;
use crate::config::AssetPaths;
use crate::loader;

/// Timer resolution for playback polls and zoom/recenter steps
const TIMER_INTERVAL: Duration = Duration::from_millis(5);

/// Application state
pub struct CacophonyApp {
    engine_config: EngineConfig,
    /// Handed to the explorer when it is created
    player: Option<Box<dyn ClipPlayer + Send>>,
    explorer: Option<Explorer>,
    worker: Option<CompositorWorker>,

    /// Loaded assets waiting for their counterpart
    dataset: Option<Arc<Dataset>>,
    /// Outer `None` while loading, inner `None` when the sheet failed
    sprites: Option<Option<Arc<RgbaImage>>>,
    /// Last canvas size, replayed into a late-created explorer
    viewport: Option<Viewport>,

    frame: Option<RenderFrame>,
    images: GridImages,
    label: Option<(Cell, MetadataLabel)>,

    filter_query: String,
    browsing: Option<FilterCategory>,
    panel_minimized: bool,
    status: Option<String>,
}

impl CacophonyApp {
    /// Create the app and start loading the dataset and sprite sheet
    pub fn new(
        assets: &AssetPaths,
        engine_config: EngineConfig,
        player: Box<dyn ClipPlayer + Send>,
    ) -> (Self, Task<Message>) {
        let app = Self {
            engine_config,
            player: Some(player),
            explorer: None,
            worker: None,
            dataset: None,
            sprites: None,
            viewport: None,
            frame: None,
            images: GridImages::new(),
            label: None,
            filter_query: String::new(),
            browsing: None,
            panel_minimized: false,
            status: Some("Loading clip metadata and thumbnails".to_string()),
        };

        let tasks = Task::batch([
            Task::perform(
                loader::load_dataset(assets.dataset.clone()),
                Message::DatasetLoaded,
            ),
            Task::perform(
                loader::load_sprites(assets.sprites.clone()),
                Message::SpritesLoaded,
            ),
        ]);

        (app, tasks)
    }

    /// Update application state
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::DatasetLoaded(result) => {
                let dataset = result.unwrap_or_else(|e| {
                    log::error!("{}", e);
                    self.status = Some(format!("Dataset unavailable: {}", e));
                    Arc::new(Dataset::empty())
                });
                self.dataset = Some(dataset);
                self.try_start();
            }

            Message::SpritesLoaded(result) => {
                let sprites = match result {
                    Ok(sheet) => Some(sheet),
                    Err(e) => {
                        log::error!("{}", e);
                        None
                    }
                };
                self.sprites = Some(sprites);
                self.try_start();
            }

            Message::Frame(now) => self.on_frame(now),

            Message::Timer(now) => {
                if let Some(explorer) = self.explorer.as_mut() {
                    explorer.on_timer(now);
                }
            }

            Message::Grid(event) => self.on_grid_event(event),

            Message::ZoomPressed(direction) => {
                if let Some(explorer) = self.explorer.as_mut() {
                    explorer.start_zoom(direction, Instant::now());
                }
            }

            Message::ZoomReleased => {
                if let Some(explorer) = self.explorer.as_mut() {
                    explorer.stop_zoom();
                }
            }

            Message::SetColorMode(mode) => {
                if let Some(explorer) = self.explorer.as_mut() {
                    log::info!("Color mode: {}", mode);
                    explorer.set_color_mode(mode);
                }
            }

            Message::TogglePanel => self.panel_minimized = !self.panel_minimized,

            Message::FilterQuery(query) => {
                self.filter_query = query;
                self.browsing = None;
            }

            Message::SubmitFilter => {
                let first = self.explorer.as_ref().and_then(|explorer| {
                    controls::suggestions_for(&self.filter_query, explorer.filters())
                        .into_iter()
                        .next()
                });
                if let Some(name) = first {
                    self.edit_filters(|filters| {
                        filters.add(name);
                    });
                }
            }

            Message::BrowseCategory(category) => self.browsing = category,

            Message::AddFilter(name) => {
                self.edit_filters(|filters| {
                    filters.add(name);
                });
            }

            Message::ToggleFilter(name) => {
                self.edit_filters(|filters| {
                    filters.toggle(&name);
                });
            }

            Message::RemoveFilter(name) => {
                self.edit_filters(|filters| {
                    filters.remove(&name);
                });
            }
        }
        Task::none()
    }

    /// Create the explorer and compositor once both assets have resolved
    fn try_start(&mut self) {
        if self.explorer.is_some() || self.dataset.is_none() || self.sprites.is_none() {
            return;
        }
        let (Some(dataset), Some(sprites)) = (self.dataset.take(), self.sprites.take()) else {
            return;
        };

        let player = self
            .player
            .take()
            .unwrap_or_else(|| Box::new(DisconnectedPlayer));
        let mut explorer = Explorer::new(
            Arc::clone(&dataset),
            player,
            self.engine_config.clone(),
            Instant::now(),
        );
        explorer.set_sprite(sprites.clone());
        if let Some(viewport) = self.viewport {
            explorer.resize(viewport);
        }

        match CompositorWorker::spawn(dataset, sprites) {
            Ok(worker) => {
                self.worker = Some(worker);
                self.status = Some("Compositing grid".to_string());
            }
            Err(e) => {
                log::error!("Failed to start compositor thread: {}", e);
                self.status = Some(format!("Compositor unavailable: {}", e));
            }
        }

        log::info!("Explorer ready");
        self.explorer = Some(explorer);
    }

    fn on_frame(&mut self, now: Instant) {
        let Some(explorer) = self.explorer.as_mut() else {
            return;
        };

        if let Some(worker) = &self.worker {
            if let Some(grid) = worker.latest() {
                if explorer.publish_grid(grid) {
                    self.status = None;
                }
            }
            if let Some(request) = explorer.take_rebuild_request() {
                if let Err(e) = worker.request(request) {
                    log::error!("Grid rebuild request failed: {}", e);
                }
            }
        }

        if let Some(frame) = explorer.on_frame(now) {
            self.images.sync(&frame);
            self.frame = Some(frame);
        }

        if !explorer.grid_ready() {
            return;
        }
        let selected = explorer.selected();
        if self.label.as_ref().map(|(cell, _)| *cell) != Some(selected) {
            self.label = explorer
                .selected_record()
                .map(|record| (selected, MetadataLabel::for_record(record)));
        }
    }

    fn on_grid_event(&mut self, event: GridEvent) {
        if let GridEvent::Resized(viewport) = event {
            self.viewport = Some(viewport);
        }
        let Some(explorer) = self.explorer.as_mut() else {
            return;
        };
        let now = Instant::now();
        match event {
            GridEvent::Pressed(p) => explorer.pointer_down(p, now),
            GridEvent::Moved(p) => explorer.pointer_move(p, now),
            GridEvent::Released => explorer.pointer_up(),
            GridEvent::Wheel(delta_y) => explorer.wheel(delta_y, now),
            GridEvent::Resized(viewport) => explorer.resize(viewport),
        }
    }

    /// Apply an edit to a copy of the filter set and hand it back
    fn edit_filters(&mut self, edit: impl FnOnce(&mut cacophony_core::filter::FilterSet)) {
        let Some(explorer) = self.explorer.as_mut() else {
            return;
        };
        let mut filters = explorer.filters().clone();
        edit(&mut filters);
        log::debug!("Filters: {:?}", filters.active_names().collect::<Vec<_>>());
        explorer.set_filters(filters);
        self.filter_query.clear();
        self.browsing = None;
    }

    /// Frames and window-wide releases always; the short timer only while
    /// timed tasks are pending
    pub fn subscription(&self) -> Subscription<Message> {
        let frames = window::frames().map(Message::Frame);
        let releases = event::listen_with(pointer_release);
        let timed = self
            .explorer
            .as_ref()
            .is_some_and(|explorer| explorer.has_timed_tasks());

        if timed {
            Subscription::batch([
                frames,
                releases,
                time::every(TIMER_INTERVAL).map(Message::Timer),
            ])
        } else {
            Subscription::batch([frames, releases])
        }
    }

    /// Build the view
    pub fn view(&self) -> Element<'_, Message> {
        let label = self.label.as_ref().map(|(_, label)| label);
        let held = self
            .explorer
            .as_ref()
            .is_some_and(|explorer| explorer.is_pointer_down());
        let grid = grid_view(self.frame.as_ref(), &self.images, label, held, Message::Grid);

        let Some(explorer) = self.explorer.as_ref() else {
            return stack![grid, controls::loading_overlay(self.status.as_deref())].into();
        };

        let filter_bar = container(opaque(controls::filter_bar(
            &self.filter_query,
            self.browsing,
            explorer.filters(),
        )))
        .padding(16)
        .align_left(Length::Fill)
        .align_top(Length::Fill);

        let zoom = container(opaque(controls::zoom_buttons(
            explorer.can_zoom_in(),
            explorer.can_zoom_out(),
        )))
        .padding(16)
        .align_right(Length::Fill)
        .align_bottom(Length::Fill);

        let panel = container(opaque(controls::control_panel(
            explorer.color_mode(),
            self.panel_minimized,
        )))
        .padding(16)
        .align_left(Length::Fill)
        .align_bottom(Length::Fill);

        let mut layers = stack![grid, panel, zoom, filter_bar];
        if !explorer.grid_ready() {
            layers = layers.push(controls::loading_overlay(self.status.as_deref()));
        }
        layers.into()
    }

    /// Get the theme
    pub fn theme(&self) -> Theme {
        Theme::Light
    }
}

/// Left-button or finger release anywhere in the window, captured or not
///
/// Overlays capture the releases that land on them, so the canvas alone
/// would miss them.
fn pointer_release(event: Event, _status: event::Status, _window: window::Id) -> Option<Message> {
    match event {
        Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
        | Event::Touch(touch::Event::FingerLifted { .. })
        | Event::Touch(touch::Event::FingerLost { .. }) => Some(Message::Grid(GridEvent::Released)),
        _ => None,
    }
}
