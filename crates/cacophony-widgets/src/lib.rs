//! iced widgets for the cacophony clip explorer
//!
//! ## Architecture (iced 0.14 patterns)
//!
//! - **Engine state** lives in `cacophony-core`; widgets never mutate it
//! - **View functions** take a render frame plus callbacks and return
//!   `Element<Message>`
//! - **Canvas Programs** handle custom rendering and event-to-callback
//!   translation

pub mod grid;
pub mod theme;

pub use grid::{format_age, grid_view, GridEvent, GridImages, LabelSpan, MetadataLabel};
pub use theme::to_color;
