//! Game configuration loaded from JSON, with every field defaulted.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub type Rgba = [f32; 4];

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    /// Size of one world tile in surface units. The actor is one tile square.
    pub tile_size: f32,
    pub surface_width: f32,
    pub surface_height: f32,
    /// Surface units moved per tick for each held arrow.
    pub move_speed: f32,
    /// Ticks spent on each animation frame.
    pub animation_cadence: u32,
    /// Window pixels per surface unit.
    pub window_scale: u32,
    pub background_color: Rgba,
    pub placeholder_color: Rgba,
    pub asset_root: PathBuf,
    pub manifest_path: PathBuf,
    pub debug: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tile_size: 32.0,
            surface_width: 512.0,
            surface_height: 288.0,
            move_speed: 1.0,
            animation_cadence: 8,
            window_scale: 2,
            background_color: [0.5, 0.5, 0.5, 1.0],
            placeholder_color: [0.0, 0.5, 0.0, 1.0],
            asset_root: PathBuf::from("assets"),
            manifest_path: PathBuf::from("assets/sprites/manifest.json"),
            debug: false,
        }
    }
}

impl GameConfig {
    /// Session-start position of the actor: tile (5, 3).
    pub fn spawn_point(&self) -> (f32, f32) {
        (self.tile_size * 5.0, self.tile_size * 3.0)
    }

    pub fn window_size(&self) -> (u32, u32) {
        let scale = self.window_scale.max(1) as f32;
        (
            (self.surface_width * scale) as u32,
            (self.surface_height * scale) as u32,
        )
    }
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    validate_config(&config).map_err(|e| format!("{} ({})", e, path.display()))?;
    Ok(config)
}

pub fn validate_config(config: &GameConfig) -> Result<(), String> {
    if config.animation_cadence == 0 {
        return Err("Config validation failed: animation_cadence must be > 0".to_string());
    }
    if config.move_speed.is_nan() || config.move_speed < 0.0 {
        return Err("Config validation failed: move_speed must be >= 0".to_string());
    }
    if config.tile_size.is_nan() || config.tile_size <= 0.0 {
        return Err("Config validation failed: tile_size must be > 0".to_string());
    }
    if config.surface_width < config.tile_size || config.surface_height < config.tile_size {
        return Err(format!(
            "Config validation failed: surface {}x{} cannot hold a {} unit actor",
            config.surface_width, config.surface_height, config.tile_size
        ));
    }
    let (spawn_x, spawn_y) = config.spawn_point();
    if spawn_x + config.tile_size > config.surface_width
        || spawn_y + config.tile_size > config.surface_height
    {
        log::warn!(
            "Spawn point ({spawn_x}, {spawn_y}) lies outside the surface; the actor will be clamped"
        );
    }
    Ok(())
}
