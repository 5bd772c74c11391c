//! Cacophony - explore thousands of short vocal clips on a pan/zoom grid
//!
//! This is the main entry point for the GUI application. It:
//! 1. Loads the YAML config (writing defaults on first run)
//! 2. Decodes the clip bank and starts the cpal output stream
//! 3. Launches the iced GUI, which loads the dataset and sprite sheet
//!
//! ## Command line flags
//!
//! - `--config <path>`: Use a config file other than the default location

mod config;
mod loader;
mod ui;

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cacophony_core::audio::{load_clip_bank, start_audio_system, AudioConfig, AudioHandle};
use cacophony_core::playback::{ClipPlayer, DisconnectedPlayer};
use iced::{Size, Task};

use ui::{CacophonyApp, Message};

fn main() -> iced::Result {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("cacophony starting up");

    let config_path = config_path_from_args().unwrap_or_else(config::default_config_path);
    let player_config = config::load_config(&config_path);
    if !config_path.exists() {
        if let Err(e) = config::save_config(&player_config, &config_path) {
            log::warn!("Could not write default config: {:#}", e);
        }
    }

    let (audio_handle, player) = start_audio(&player_config.assets.audio, &player_config.audio);

    // Wrap resources in cells so the boot closure can be Fn (required by iced)
    let player_cell = RefCell::new(Some(player));
    let assets = player_config.assets.clone();
    let engine_config = player_config.engine.clone();

    let result = iced::application(
        move || -> (CacophonyApp, Task<Message>) {
            let player = player_cell
                .borrow_mut()
                .take()
                .unwrap_or_else(|| Box::new(DisconnectedPlayer));
            CacophonyApp::new(&assets, engine_config.clone(), player)
        },
        update,
        view,
    )
    .subscription(subscription)
    .theme(theme)
    .title("Cacophony")
    .window_size(Size::new(
        player_config.window.width,
        player_config.window.height,
    ))
    .run();

    // Keep the output stream alive until the window closes
    drop(audio_handle);
    log::info!("cacophony stopped");

    result
}

/// `--config <path>` if given
fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

/// Decode the clip bank and open the output device
///
/// Any failure leaves the explorer silent rather than refusing to start.
fn start_audio(
    bank_path: &Path,
    audio_config: &AudioConfig,
) -> (Option<AudioHandle>, Box<dyn ClipPlayer + Send>) {
    let bank = match load_clip_bank(bank_path) {
        Ok(bank) => Arc::new(bank),
        Err(e) => {
            log::warn!("Running without audio: {}", e);
            return (None, Box::new(DisconnectedPlayer));
        }
    };

    match start_audio_system(audio_config, bank) {
        Ok(system) => {
            log::info!(
                "Audio output on '{}' at {} Hz",
                system.handle.device_name(),
                system.handle.sample_rate()
            );
            (Some(system.handle), Box::new(system.player))
        }
        Err(e) => {
            log::warn!("Running without audio: {}", e);
            (None, Box::new(DisconnectedPlayer))
        }
    }
}

/// Update function for iced
fn update(app: &mut CacophonyApp, message: Message) -> Task<Message> {
    app.update(message)
}

/// View function for iced
fn view(app: &CacophonyApp) -> iced::Element<'_, Message> {
    app.view()
}

/// Subscription function for iced
fn subscription(app: &CacophonyApp) -> iced::Subscription<Message> {
    app.subscription()
}

/// Theme function for iced
fn theme(app: &CacophonyApp) -> iced::Theme {
    app.theme()
}
