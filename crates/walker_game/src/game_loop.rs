//! Per-refresh game loop.
//!
//! The loop never owns a thread or a timer. It asks a `TickScheduler` for the
//! next display refresh and gets called back through `Game::on_tick` with the
//! handle it was given. At most one tick is pending at any time; a tick whose
//! handle is not the pending one (for example one delivered after `stop()`)
//! does nothing, so a stop/start cycle can never leave two chains running.

use walker_core::animation::SpriteManifest;
use walker_core::config::GameConfig;
use walker_core::input::InputState;
use walker_render::DrawSurface;

use crate::actor::{Actor, ActorConfig};
use crate::assets::{AssetCache, ImageLoader, LoadError};
use crate::renderer::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(pub u64);

pub trait TickScheduler {
    /// Request one `on_tick` call on the next display refresh.
    fn schedule(&mut self) -> TickHandle;
    fn cancel(&mut self, handle: TickHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

pub struct Game<S: TickScheduler> {
    state: LoopState,
    initialized: bool,
    pending_tick: Option<TickHandle>,
    tick_count: u64,
    scheduler: S,
    input: InputState,
    assets: AssetCache,
    actor: Actor,
    renderer: Renderer,
}

impl<S: TickScheduler> Game<S> {
    pub fn new(config: &GameConfig, scheduler: S) -> Self {
        Self {
            state: LoopState::Idle,
            initialized: false,
            pending_tick: None,
            tick_count: 0,
            scheduler,
            input: InputState::new(),
            assets: AssetCache::new(),
            actor: Actor::new(ActorConfig::from_game_config(config)),
            renderer: Renderer::from_config(config),
        }
    }

    /// Load every manifest asset. On failure the loop stays uninitialized
    /// and `start()` refuses to run.
    pub async fn init(
        &mut self,
        manifest: &SpriteManifest,
        loader: &dyn ImageLoader,
    ) -> Result<(), LoadError> {
        log::info!(
            "Loading {} sprite image(s) for manifest '{}'",
            manifest.distinct_path_count(),
            manifest.manifest_id
        );
        self.assets.load_all(manifest, loader).await?;
        self.initialized = true;
        log::info!("Assets ready: {} key(s)", self.assets.len());
        Ok(())
    }

    pub fn start(&mut self) {
        if self.state == LoopState::Running {
            log::warn!("Game loop is already running");
            return;
        }
        if !self.initialized {
            log::warn!("Game loop cannot start before assets are loaded");
            return;
        }
        self.state = LoopState::Running;
        self.pending_tick = Some(self.scheduler.schedule());
        log::info!("Game loop started");
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.pending_tick.take() {
            self.scheduler.cancel(handle);
        }
        if self.state == LoopState::Running {
            self.state = LoopState::Stopped;
            log::info!("Game loop stopped after {} tick(s)", self.tick_count);
        }
    }

    /// Put the actor back at spawn. Assets and loop state are untouched.
    pub fn reset(&mut self) {
        self.actor.reset();
        log::info!("Actor reset to spawn");
    }

    /// Key-up events for keys held while unfocused never arrive.
    pub fn focus_lost(&mut self) {
        self.input.clear();
    }

    /// Run one tick if `handle` is the pending one: update, render, then
    /// schedule the next tick. Returns whether a frame was rendered.
    pub fn on_tick(&mut self, handle: TickHandle, surface: &mut dyn DrawSurface) -> bool {
        if self.state != LoopState::Running || self.pending_tick != Some(handle) {
            log::trace!("Ignoring stale tick {:?}", handle);
            return false;
        }
        self.pending_tick = None;

        self.update();
        self.renderer.render(surface, &self.actor, &self.assets);
        self.tick_count += 1;

        self.pending_tick = Some(self.scheduler.schedule());
        true
    }

    fn update(&mut self) {
        self.actor.advance(&self.input);
        let frames = self.assets.animation_frames(self.actor.clip_key());
        self.actor.tick_animation(frames);
    }

    #[allow(dead_code)]
    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    #[allow(dead_code)]
    pub fn pending_tick(&self) -> Option<TickHandle> {
        self.pending_tick
    }

    #[allow(dead_code)]
    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn assets(&self) -> &AssetCache {
        &self.assets
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    #[allow(dead_code)]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}
