//! Player configuration for cacophony
//!
//! Configuration is stored as YAML in the user's config directory.
//! Default location: ~/.config/cacophony/config.yaml

use anyhow::{Context, Result};
use cacophony_core::audio::AudioConfig;
use cacophony_core::config::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Dataset, sprite sheet and clip audio locations
    pub assets: AssetPaths,
    /// Interaction and playback tunables
    pub engine: EngineConfig,
    /// Output device settings
    pub audio: AudioConfig,
    pub window: WindowConfig,
}

/// Where the three assets live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    /// Cell key to clip metadata (JSON)
    pub dataset: PathBuf,
    /// 144x144 grid of 32px thumbnails (PNG)
    pub sprites: PathBuf,
    /// Every clip concatenated into one recording (WAV)
    pub audio: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        let dir = default_asset_dir();
        Self {
            dataset: dir.join("dataset.json"),
            sprites: dir.join("spritesheet.png"),
            audio: dir.join("clips.wav"),
        }
    }
}

/// Initial window size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

/// Get the default asset directory
///
/// Returns: ~/.local/share/cacophony
pub fn default_asset_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("cacophony")
}

/// Get the default config file path
///
/// Returns: ~/.config/cacophony/config.yaml
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("cacophony")
        .join("config.yaml")
}

/// Load configuration from a YAML file
///
/// If the file doesn't exist, returns default config.
/// If the file exists but is invalid, logs a warning and returns default config.
pub fn load_config(path: &Path) -> PlayerConfig {
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, using defaults");
        return PlayerConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<PlayerConfig>(&contents) {
            Ok(mut config) => {
                config.engine.validate();
                log::info!(
                    "load_config: Loaded config - dataset: {:?}, initial scale: {}",
                    config.assets.dataset,
                    config.engine.initial_scale
                );
                config
            }
            Err(e) => {
                log::warn!("load_config: Failed to parse config: {}, using defaults", e);
                PlayerConfig::default()
            }
        },
        Err(e) => {
            log::warn!(
                "load_config: Failed to read config file: {}, using defaults",
                e
            );
            PlayerConfig::default()
        }
    }
}

/// Save configuration to a YAML file
///
/// Creates the parent directory if it doesn't exist.
pub fn save_config(config: &PlayerConfig, path: &Path) -> Result<()> {
    log::info!("save_config: Saving to {:?}", path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    log::info!("save_config: Config saved successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cacophony_core::config::{INITIAL_SCALE, MAX_SCALE};

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();
        assert_eq!(config.engine.initial_scale, INITIAL_SCALE);
        assert_eq!(config.window.width, 1280.0);
        assert!(config.assets.dataset.ends_with("cacophony/dataset.json"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.yaml"));
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_invalid_yaml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "engine: [not, a, map").unwrap();
        let config = load_config(&path);
        assert_eq!(config.assets, AssetPaths::default());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "assets:\n  dataset: /data/clips.json\nengine:\n  pan_speed: 8.0\n",
        )
        .unwrap();

        let config = load_config(&path);
        assert_eq!(config.assets.dataset, PathBuf::from("/data/clips.json"));
        assert_eq!(config.assets.sprites, AssetPaths::default().sprites);
        assert_eq!(config.engine.pan_speed, 8.0);
        assert_eq!(config.engine.max_scale, MAX_SCALE);
    }

    #[test]
    fn test_loaded_engine_config_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "engine:\n  initial_scale: 50.0\n  zoom_factor: 0.5\n").unwrap();

        let config = load_config(&path);
        assert_eq!(config.engine.initial_scale, MAX_SCALE);
        assert!(config.engine.zoom_factor > 1.0);
    }

    #[test]
    fn test_save_creates_directories_and_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = PlayerConfig::default();
        config.window.width = 900.0;
        config.audio.device = Some("Speakers".to_string());
        save_config(&config, &path).unwrap();

        let loaded = load_config(&path);
        assert_eq!(loaded.window.width, 900.0);
        assert_eq!(loaded.audio.device.as_deref(), Some("Speakers"));
    }
}
