//! Tick-counted animation cursor and the sprite manifest format.
//!
//! Animation timing is counted in loop ticks, not wall-clock time: one tick per
//! display refresh, and a frame advances every `cadence` ticks. Integer counters
//! keep the cycle exact no matter how long the session runs.
//!
//! The manifest maps logical asset keys to either a single image path or an
//! ordered list of frame paths:
//!
//! ```json
//! {
//!   "version": "0.1",
//!   "manifest_id": "hero",
//!   "sprites": {
//!     "idle_down": "sprites/link-sprite1.png",
//!     "walk_down": ["sprites/link-sprite2.png", "sprites/link-sprite3.png"]
//!   }
//! }
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Runtime cursor into one animation clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationState {
    pub clip_key: String,
    pub frame_index: usize,
    pub ticks_elapsed: u32,
}

impl AnimationState {
    pub fn new(clip_key: &str) -> Self {
        Self {
            clip_key: clip_key.to_string(),
            frame_index: 0,
            ticks_elapsed: 0,
        }
    }

    /// Point the cursor at `clip_key`. Returns true when the clip changed, in
    /// which case the cursor is rewound to frame 0.
    pub fn switch_clip(&mut self, clip_key: &str) -> bool {
        if self.clip_key == clip_key {
            return false;
        }
        self.clip_key.clear();
        self.clip_key.push_str(clip_key);
        self.rewind();
        true
    }

    pub fn rewind(&mut self) {
        self.frame_index = 0;
        self.ticks_elapsed = 0;
    }

    /// Count one tick against a clip of `frame_count` frames. Every `cadence`
    /// ticks the frame advances, wrapping at the end of the clip. Returns true
    /// when the frame changed.
    ///
    /// An empty clip only resets the tick counter.
    pub fn tick(&mut self, frame_count: usize, cadence: u32) -> bool {
        if frame_count == 0 {
            self.ticks_elapsed = 0;
            return false;
        }
        if self.frame_index >= frame_count {
            self.frame_index = 0;
        }

        self.ticks_elapsed += 1;
        if self.ticks_elapsed < cadence.max(1) {
            return false;
        }
        self.ticks_elapsed = 0;
        self.frame_index = (self.frame_index + 1) % frame_count;
        true
    }
}

/// Where one asset key's pixels come from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SpriteSource {
    Single(String),
    Clip(Vec<String>),
}

impl SpriteSource {
    pub fn paths(&self) -> &[String] {
        match self {
            SpriteSource::Single(path) => std::slice::from_ref(path),
            SpriteSource::Clip(paths) => paths,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpriteManifest {
    pub manifest_id: String,
    pub sprites: BTreeMap<String, SpriteSource>,
}

impl SpriteManifest {
    /// The idle/walk set the game ships with. Left-facing art does not exist;
    /// the renderer mirrors the right-facing clips instead.
    pub fn builtin() -> Self {
        let numbered = |prefix: &str, range: std::ops::RangeInclusive<u32>| {
            range
                .map(|n| format!("sprites/{prefix}link-sprite{n}.png"))
                .collect::<Vec<_>>()
        };

        let mut sprites = BTreeMap::new();
        sprites.insert(
            "idle_down".to_string(),
            SpriteSource::Single("sprites/link-sprite1.png".to_string()),
        );
        sprites.insert(
            "idle_right".to_string(),
            SpriteSource::Single("sprites/r-link-sprite1.png".to_string()),
        );
        sprites.insert(
            "idle_up".to_string(),
            SpriteSource::Single("sprites/u-link-sprite1.png".to_string()),
        );
        sprites.insert("walk_down".to_string(), SpriteSource::Clip(numbered("", 2..=9)));
        sprites.insert(
            "walk_right".to_string(),
            SpriteSource::Clip(numbered("r-", 1..=4)),
        );
        sprites.insert("walk_up".to_string(), SpriteSource::Clip(numbered("u-", 1..=9)));

        Self {
            manifest_id: "builtin".to_string(),
            sprites,
        }
    }

    /// Number of distinct image paths referenced by the manifest.
    pub fn distinct_path_count(&self) -> usize {
        let mut paths: Vec<&str> = self
            .sprites
            .values()
            .flat_map(|source| source.paths().iter().map(String::as_str))
            .collect();
        paths.sort_unstable();
        paths.dedup();
        paths.len()
    }
}

// --- JSON deserialization types (private) ---

#[derive(Debug, Deserialize)]
struct SpriteManifestJson {
    version: String,
    manifest_id: String,
    sprites: BTreeMap<String, SpriteSource>,
}

/// Load a sprite manifest from disk.
pub fn load_sprite_manifest(path: &Path) -> Result<SpriteManifest, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read sprite manifest {}: {e}", path.display()))?;
    parse_sprite_manifest(&raw)
        .map_err(|e| format!("Sprite manifest {}: {e}", path.display()))
}

pub fn parse_sprite_manifest(raw: &str) -> Result<SpriteManifest, String> {
    let json: SpriteManifestJson =
        serde_json::from_str(raw).map_err(|e| format!("failed to parse JSON: {e}"))?;
    validate_manifest_json(&json)?;
    Ok(SpriteManifest {
        manifest_id: json.manifest_id,
        sprites: json.sprites,
    })
}

fn validate_manifest_json(json: &SpriteManifestJson) -> Result<(), String> {
    if json.version != "0.1" {
        return Err(format!(
            "Manifest validation failed: unsupported version '{}'",
            json.version
        ));
    }
    if json.manifest_id.is_empty() {
        return Err("Manifest validation failed: manifest_id is empty".to_string());
    }
    for (key, source) in &json.sprites {
        if key.is_empty() {
            return Err("Manifest validation failed: empty sprite key".to_string());
        }
        if let SpriteSource::Clip(paths) = source {
            if paths.is_empty() {
                log::warn!("Manifest clip '{}' has no frames. It will never animate.", key);
            }
        }
        if let Some(i) = source.paths().iter().position(|p| p.is_empty()) {
            return Err(format!(
                "Manifest validation failed: sprite '{}' path {} is empty",
                key, i
            ));
        }
    }
    Ok(())
}
