//! UI module for cacophony
//!
//! Built with iced. The grid itself is a canvas from `cacophony-widgets`;
//! this module layers the filter bar, zoom buttons and colour panel on top
//! and routes every event into the engine.

pub mod app;
pub mod controls;
pub mod message;

pub use app::CacophonyApp;
pub use message::Message;
