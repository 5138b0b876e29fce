//! Shared fakes for the game crate's unit tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::FutureExt;
use walker_core::animation::{SpriteManifest, SpriteSource};
use walker_render::{Color, DrawSurface, Rect, SpriteImage};

use crate::assets::{ImageLoader, LoadError, LoadFuture};
use crate::game_loop::{TickHandle, TickScheduler};

pub fn image(path: &str) -> SpriteImage {
    SpriteImage::from_rgba8(path, 1, 1, vec![255; 4])
}

/// Build a manifest. `walk_*` keys and any key with other than one path
/// become clips; the rest are single images.
pub fn manifest(entries: &[(&str, &[&str])]) -> SpriteManifest {
    let sprites: BTreeMap<String, SpriteSource> = entries
        .iter()
        .map(|(key, paths)| {
            let source = if paths.len() == 1 && !key.starts_with("walk_") {
                SpriteSource::Single(paths[0].to_string())
            } else {
                SpriteSource::Clip(paths.iter().map(|p| p.to_string()).collect())
            };
            (key.to_string(), source)
        })
        .collect();
    SpriteManifest {
        manifest_id: "test".to_string(),
        sprites,
    }
}

/// Six clip and idle keys shaped like the built-in hero manifest but with
/// short clips: walk_down 3, walk_up 3, walk_right 4 frames.
pub fn hero_manifest() -> SpriteManifest {
    manifest(&[
        ("idle_down", &["d0.png"]),
        ("walk_down", &["d1.png", "d2.png", "d3.png"]),
        ("idle_up", &["u0.png"]),
        ("walk_up", &["u1.png", "u2.png", "u3.png"]),
        ("idle_right", &["r0.png"]),
        ("walk_right", &["r1.png", "r2.png", "r3.png", "r4.png"]),
    ])
}

/// Loader whose futures stay pending for a configurable number of polls.
#[derive(Default)]
pub struct ScriptedLoader {
    delays: HashMap<String, usize>,
    failures: HashSet<String>,
    calls: RefCell<Vec<String>>,
    completed: Rc<RefCell<Vec<String>>>,
}

impl ScriptedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, path: &str, polls: usize) -> Self {
        self.delays.insert(path.to_string(), polls);
        self
    }

    pub fn with_failure(mut self, path: &str) -> Self {
        self.failures.insert(path.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.borrow().clone()
    }
}

impl ImageLoader for ScriptedLoader {
    fn load(&self, path: &str) -> LoadFuture {
        self.calls.borrow_mut().push(path.to_string());
        let result = if self.failures.contains(path) {
            Err(LoadError::Read {
                path: path.to_string(),
                reason: "not found".to_string(),
            })
        } else {
            Ok(image(path))
        };
        Delayed {
            remaining: self.delays.get(path).copied().unwrap_or(0),
            path: path.to_string(),
            result: Some(result),
            completed: Rc::clone(&self.completed),
        }
        .boxed_local()
    }
}

struct Delayed {
    remaining: usize,
    path: String,
    result: Option<Result<SpriteImage, LoadError>>,
    completed: Rc<RefCell<Vec<String>>>,
}

impl Future for Delayed {
    type Output = Result<SpriteImage, LoadError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.remaining > 0 {
            this.remaining -= 1;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }
        this.completed.borrow_mut().push(this.path.clone());
        match this.result.take() {
            Some(result) => Poll::Ready(result),
            None => Poll::Pending,
        }
    }
}

/// Scheduler that only records requests. Tests deliver ticks by hand.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pub scheduled: Vec<TickHandle>,
    pub cancelled: Vec<TickHandle>,
}

impl ManualScheduler {
    /// Handles that were scheduled and not cancelled.
    pub fn live(&self) -> Vec<TickHandle> {
        self.scheduled
            .iter()
            .copied()
            .filter(|h| !self.cancelled.contains(h))
            .collect()
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule(&mut self) -> TickHandle {
        self.next_id += 1;
        let handle = TickHandle(self.next_id);
        self.scheduled.push(handle);
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.cancelled.push(handle);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear(Color),
    Fill(Rect, Color),
    Image {
        path: String,
        rect: Rect,
        mirrored: bool,
    },
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn clears(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Clear(_)))
            .count()
    }
}

impl DrawSurface for RecordingSurface {
    fn size(&self) -> (f32, f32) {
        (512.0, 288.0)
    }

    fn clear(&mut self, color: Color) {
        self.ops.push(DrawOp::Clear(color));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ops.push(DrawOp::Fill(rect, color));
    }

    fn draw_image(&mut self, image: &SpriteImage, rect: Rect, mirrored: bool) {
        self.ops.push(DrawOp::Image {
            path: image.source_path().to_string(),
            rect,
            mirrored,
        });
    }
}
