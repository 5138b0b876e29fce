//! Sprite asset cache.
//!
//! Loads are memoized per path: the first request for a path starts a load
//! and stores its shared future, every later request (including concurrent
//! ones) awaits that same future. A path therefore hits the loader at most
//! once per process, and a failed load stays failed.
//!
//! Logical keys from the manifest map to either one image or an ordered clip.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use futures::future::{join_all, FutureExt, LocalBoxFuture, Shared};
use thiserror::Error;
use walker_core::animation::{SpriteManifest, SpriteSource};
use walker_render::SpriteImage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("failed to read sprite '{path}': {reason}")]
    Read { path: String, reason: String },
    #[error("failed to decode sprite '{path}': {reason}")]
    Decode { path: String, reason: String },
}

impl LoadError {
    /// The manifest path whose load failed.
    #[allow(dead_code)]
    pub fn path(&self) -> &str {
        match self {
            LoadError::Read { path, .. } | LoadError::Decode { path, .. } => path,
        }
    }
}

pub type LoadFuture = LocalBoxFuture<'static, Result<SpriteImage, LoadError>>;

type SharedLoad = Shared<LoadFuture>;

/// Produces a decoded image for a manifest path.
pub trait ImageLoader {
    fn load(&self, path: &str) -> LoadFuture;
}

/// Reads images from disk, relative to `asset_root`.
#[derive(Debug, Clone)]
pub struct FileImageLoader {
    asset_root: PathBuf,
}

impl FileImageLoader {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
        }
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self, path: &str) -> LoadFuture {
        let full_path = self.asset_root.join(path);
        let path = path.to_string();
        async move {
            let bytes = std::fs::read(&full_path).map_err(|e| LoadError::Read {
                path: path.clone(),
                reason: format!("{}: {e}", full_path.display()),
            })?;
            SpriteImage::from_encoded(&path, &bytes).map_err(|e| LoadError::Decode {
                path: path.clone(),
                reason: e.to_string(),
            })
        }
        .boxed_local()
    }
}

#[derive(Default)]
struct LoadCache {
    loads: RefCell<HashMap<String, SharedLoad>>,
}

impl LoadCache {
    fn fetch(&self, path: &str, loader: &dyn ImageLoader) -> SharedLoad {
        let mut loads = self.loads.borrow_mut();
        if let Some(load) = loads.get(path) {
            return load.clone();
        }
        log::debug!("Loading sprite '{}'", path);
        let load = loader.load(path).shared();
        loads.insert(path.to_string(), load.clone());
        load
    }

    fn len(&self) -> usize {
        self.loads.borrow().len()
    }
}

/// One registered asset key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asset {
    Single(SpriteImage),
    Clip(Vec<SpriteImage>),
}

impl Asset {
    pub fn frames(&self) -> &[SpriteImage] {
        match self {
            Asset::Single(image) => std::slice::from_ref(image),
            Asset::Clip(frames) => frames,
        }
    }
}

#[derive(Default)]
pub struct AssetCache {
    loads: LoadCache,
    assets: HashMap<String, Asset>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every path the manifest references and register its keys.
    ///
    /// All loads run concurrently. Clip frames are sorted by source path once
    /// the batch settles, so frame order never depends on completion order.
    /// When any load fails, every key that could be built is still registered
    /// (clips keep only their loaded frames) and the first failure in path
    /// order is returned.
    pub async fn load_all(
        &mut self,
        manifest: &SpriteManifest,
        loader: &dyn ImageLoader,
    ) -> Result<(), LoadError> {
        let mut requested: Vec<&str> = manifest
            .sprites
            .values()
            .flat_map(|source| source.paths().iter().map(String::as_str))
            .collect();
        requested.sort_unstable();
        requested.dedup();

        let pending: Vec<SharedLoad> = requested
            .iter()
            .map(|path| self.loads.fetch(path, loader))
            .collect();
        let results = join_all(pending).await;

        let mut first_failure = None;
        let mut resolved = HashMap::with_capacity(requested.len());
        for (path, result) in requested.iter().copied().zip(results) {
            if let Err(err) = &result {
                log::warn!("{}", err);
                first_failure.get_or_insert_with(|| err.clone());
            }
            resolved.insert(path, result);
        }

        for (key, source) in &manifest.sprites {
            match source {
                SpriteSource::Single(path) => {
                    if let Some(Ok(image)) = resolved.get(path.as_str()) {
                        self.assets
                            .insert(key.clone(), Asset::Single(image.clone()));
                    }
                }
                SpriteSource::Clip(paths) => {
                    let mut frames: Vec<SpriteImage> = paths
                        .iter()
                        .filter_map(|path| match resolved.get(path.as_str()) {
                            Some(Ok(image)) => Some(image.clone()),
                            _ => None,
                        })
                        .collect();
                    frames.sort_by(|a, b| a.source_path().cmp(b.source_path()));
                    self.assets.insert(key.clone(), Asset::Clip(frames));
                }
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => {
                log::debug!(
                    "Asset cache holds {} key(s) over {} path(s)",
                    self.assets.len(),
                    self.loads.len()
                );
                Ok(())
            }
        }
    }

    /// Image for `key`. For clips, `frame` selects a frame clamped into the
    /// clip; `None` means frame 0. Single images ignore `frame`.
    pub fn sprite(&self, key: &str, frame: Option<isize>) -> Option<&SpriteImage> {
        match self.assets.get(key)? {
            Asset::Single(image) => Some(image),
            Asset::Clip(frames) => {
                let last = frames.len().checked_sub(1)?;
                let index = frame.map_or(0, |f| f.clamp(0, last as isize) as usize);
                frames.get(index)
            }
        }
    }

    /// Frames of a non-empty clip, or `None` when `key` is unknown, empty or
    /// a single image.
    pub fn animation_frames(&self, key: &str) -> Option<&[SpriteImage]> {
        match self.assets.get(key)? {
            Asset::Clip(frames) if !frames.is_empty() => Some(frames),
            _ => None,
        }
    }

    #[allow(dead_code)]
    pub fn contains(&self, key: &str) -> bool {
        self.assets.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Every distinct registered image, each once.
    pub fn images(&self) -> impl Iterator<Item = &SpriteImage> {
        let mut seen = HashSet::new();
        self.assets
            .values()
            .flat_map(Asset::frames)
            .filter(move |image| seen.insert(image.source_path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{manifest, ScriptedLoader};
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn clip_frames_sorted_by_path_not_completion_order() {
        // c.png resolves first, b.png last.
        let loader = ScriptedLoader::new()
            .with_delay("c.png", 0)
            .with_delay("b.png", 5);
        let manifest = manifest(&[("walk_down", &["c.png", "b.png"])]);

        let mut cache = AssetCache::new();
        pollster::block_on(cache.load_all(&manifest, &loader)).expect("load");

        assert_eq!(loader.completed(), vec!["c.png", "b.png"]);
        let frames = cache.animation_frames("walk_down").expect("clip");
        let paths: Vec<&str> = frames.iter().map(SpriteImage::source_path).collect();
        assert_eq!(paths, vec!["b.png", "c.png"]);
    }

    #[test]
    fn shared_path_is_loaded_once() {
        let loader = ScriptedLoader::new();
        let manifest = manifest(&[
            ("idle_right", &["r1.png"]),
            ("walk_right", &["r1.png", "r2.png"]),
        ]);

        let mut cache = AssetCache::new();
        pollster::block_on(cache.load_all(&manifest, &loader)).expect("first load");
        pollster::block_on(cache.load_all(&manifest, &loader)).expect("second load");

        assert_eq!(loader.calls(), vec!["r1.png", "r2.png"]);
        assert_eq!(cache.sprite("idle_right", None).map(SpriteImage::source_path), Some("r1.png"));
    }

    #[test]
    fn failure_names_path_and_keeps_partial_state() {
        let loader = ScriptedLoader::new().with_failure("missing.png");
        let manifest = manifest(&[
            ("idle_down", &["a.png"]),
            ("walk_down", &["b.png", "missing.png"]),
        ]);

        let mut cache = AssetCache::new();
        let err = pollster::block_on(cache.load_all(&manifest, &loader))
            .expect_err("load must fail");
        assert_eq!(err.path(), "missing.png");
        assert!(err.to_string().contains("missing.png"));

        assert!(cache.sprite("idle_down", None).is_some());
        assert_eq!(cache.animation_frames("walk_down").map(<[_]>::len), Some(1));

        // The failed load is memoized, not retried.
        let again = pollster::block_on(cache.load_all(&manifest, &loader));
        assert_eq!(again, Err(err));
        assert_eq!(loader.calls().len(), 3);
    }

    #[test]
    fn sprite_frame_is_clamped_into_clip() {
        let loader = ScriptedLoader::new();
        let manifest = manifest(&[("walk_up", &["u1.png", "u2.png", "u3.png"])]);
        let mut cache = AssetCache::new();
        pollster::block_on(cache.load_all(&manifest, &loader)).expect("load");

        for frame in -5isize..10 {
            let clamped = frame.clamp(0, 2);
            assert_eq!(
                cache.sprite("walk_up", Some(frame)),
                cache.sprite("walk_up", Some(clamped)),
                "frame {frame}"
            );
        }
        assert_eq!(cache.sprite("walk_up", Some(-1)).map(SpriteImage::source_path), Some("u1.png"));
        assert_eq!(cache.sprite("walk_up", Some(99)).map(SpriteImage::source_path), Some("u3.png"));
        assert_eq!(cache.sprite("walk_up", None), cache.sprite("walk_up", Some(0)));
    }

    #[test]
    fn single_ignores_frame_and_unknown_key_is_none() {
        let loader = ScriptedLoader::new();
        let manifest = manifest(&[("idle_up", &["u1.png"])]);
        let mut cache = AssetCache::new();
        pollster::block_on(cache.load_all(&manifest, &loader)).expect("load");

        assert_eq!(cache.sprite("idle_up", Some(7)), cache.sprite("idle_up", None));
        assert!(cache.animation_frames("idle_up").is_none());
        assert!(cache.sprite("walk_left", None).is_none());
        assert!(cache.animation_frames("walk_left").is_none());
    }

    #[test]
    fn empty_clip_has_no_sprite_or_frames() {
        let loader = ScriptedLoader::new();
        let manifest = manifest(&[("walk_down", &[])]);
        let mut cache = AssetCache::new();
        pollster::block_on(cache.load_all(&manifest, &loader)).expect("load");

        assert!(cache.contains("walk_down"));
        assert!(cache.sprite("walk_down", Some(0)).is_none());
        assert!(cache.animation_frames("walk_down").is_none());
    }

    #[test]
    fn images_lists_each_path_once() {
        let loader = ScriptedLoader::new();
        let manifest = manifest(&[
            ("idle_right", &["r1.png"]),
            ("walk_right", &["r1.png", "r2.png"]),
        ]);
        let mut cache = AssetCache::new();
        pollster::block_on(cache.load_all(&manifest, &loader)).expect("load");

        let mut paths: Vec<&str> = cache.images().map(SpriteImage::source_path).collect();
        paths.sort_unstable();
        assert_eq!(paths, vec!["r1.png", "r2.png"]);
    }

    #[test]
    fn shipped_manifest_matches_builtin_and_loads_from_disk() {
        let shipped = walker_core::animation::parse_sprite_manifest(include_str!(
            "../../../assets/sprites/manifest.json"
        ))
        .expect("shipped manifest parses");
        assert_eq!(shipped.sprites, SpriteManifest::builtin().sprites);

        let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets");
        let mut cache = AssetCache::new();
        pollster::block_on(cache.load_all(&shipped, &FileImageLoader::new(root)))
            .expect("shipped sprites decode");
        assert_eq!(cache.animation_frames("walk_down").map(<[_]>::len), Some(8));
        assert_eq!(cache.animation_frames("walk_right").map(<[_]>::len), Some(4));
        assert_eq!(cache.animation_frames("walk_up").map(<[_]>::len), Some(9));
        assert!(cache.images().all(SpriteImage::is_decoded));
    }

    #[test]
    fn file_loader_decodes_png_and_reports_missing_file() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        let root = std::env::temp_dir().join(format!(
            "walker_assets_test_{}_{}",
            std::process::id(),
            nanos
        ));
        fs::create_dir_all(root.join("sprites")).expect("create temp dir");

        let pixels = image::RgbaImage::from_pixel(2, 3, image::Rgba([0, 128, 0, 255]));
        pixels
            .save(root.join("sprites/hero.png"))
            .expect("write png");

        let loader = FileImageLoader::new(&root);
        let image = pollster::block_on(loader.load("sprites/hero.png")).expect("decode");
        assert_eq!(image.size(), (2, 3));
        assert_eq!(image.source_path(), "sprites/hero.png");
        assert!(image.is_decoded());

        let err = pollster::block_on(loader.load("sprites/nope.png")).expect_err("missing");
        assert!(matches!(err, LoadError::Read { ref path, .. } if path == "sprites/nope.png"));

        fs::write(root.join("sprites/bad.png"), b"not a png").expect("write bad file");
        let err = pollster::block_on(loader.load("sprites/bad.png")).expect_err("corrupt");
        assert!(matches!(err, LoadError::Decode { .. }));

        let _ = fs::remove_dir_all(root);
    }
}
