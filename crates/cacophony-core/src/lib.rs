//! Cacophony Core - grid engine, compositor and clip playback for the sound explorer

pub mod audio;
pub mod compositor;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod filter;
pub mod palette;
pub mod playback;
pub mod runtime;
pub mod transform;
pub mod types;

pub use types::*;
