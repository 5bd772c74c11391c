//! Message types for the cacophony UI

use std::sync::Arc;
use std::time::Instant;

use cacophony_core::compositor::RgbaImage;
use cacophony_core::dataset::Dataset;
use cacophony_core::engine::ZoomDirection;
use cacophony_core::palette::ColorMode;
use cacophony_widgets::GridEvent;

use super::controls::FilterCategory;

/// Messages that can be sent to the application
#[derive(Debug, Clone)]
pub enum Message {
    // Asset loading
    DatasetLoaded(Result<Arc<Dataset>, String>),
    SpritesLoaded(Result<Arc<RgbaImage>, String>),

    /// Animation frame (vsync)
    Frame(Instant),
    /// Short-interval tick while timed tasks are pending
    Timer(Instant),

    /// Pointer, wheel or resize on the grid canvas
    Grid(GridEvent),
    /// Zoom button held down
    ZoomPressed(ZoomDirection),
    /// Zoom button released or left
    ZoomReleased,

    SetColorMode(ColorMode),
    TogglePanel,

    // Filter bar
    FilterQuery(String),
    /// Enter in the filter input: add the first suggestion
    SubmitFilter,
    /// Open a category menu, `None` closes it
    BrowseCategory(Option<FilterCategory>),
    AddFilter(String),
    ToggleFilter(String),
    RemoveFilter(String),
}
