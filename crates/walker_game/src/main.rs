//! Sprite Walker: a top-down character walking a fixed surface.
//!
//! Startup loads the config and sprite manifest and awaits every sprite before
//! the event loop opens a window. Each display refresh is one loop tick:
//! `RedrawScheduler` turns the game's tick requests into `request_redraw()`
//! calls, and the Fifo surface paces those redraws to the refresh rate.
//!
//! Keys: arrows walk, `R` resets the actor, `P` pauses/resumes, `Escape` quits.

mod actor;
mod assets;
mod game_loop;
mod renderer;
#[cfg(test)]
mod replay;
#[cfg(test)]
mod test_support;

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;
use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::error::EventLoopError;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use assets::{FileImageLoader, LoadError};
use game_loop::{Game, TickHandle, TickScheduler};
use walker_core::animation::{load_sprite_manifest, SpriteManifest};
use walker_core::config::{load_config_from_path, GameConfig};
use walker_core::input::Key;
use walker_core::time::FrameTimer;
use walker_platform::keymap::map_key;
use walker_platform::window::{create_window, PlatformConfig};
use walker_render::{
    Camera2D, GpuContext, GpuError, SpriteBatch, SpritePipeline, SpriteVertex, Texture,
    WHITE_TEXTURE_KEY,
};

const DEFAULT_CONFIG_PATH: &str = "assets/walker.json";
const CONFIG_ENV_VAR: &str = "WALKER_CONFIG";

#[derive(Debug, Error)]
enum AppError {
    #[error("{0}")]
    Config(String),
    #[error("{0}")]
    Manifest(String),
    #[error("asset loading failed: {0}")]
    Assets(#[from] LoadError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("GPU setup failed: {0}")]
    Gpu(#[from] GpuError),
    #[error("event loop error: {0}")]
    EventLoop(#[from] EventLoopError),
}

/// Ticks ride on window redraws. At most one is outstanding.
#[derive(Default)]
struct RedrawScheduler {
    window: Option<Arc<Window>>,
    next_id: u64,
    pending: Option<TickHandle>,
}

impl RedrawScheduler {
    fn attach(&mut self, window: Arc<Window>) {
        if self.pending.is_some() {
            window.request_redraw();
        }
        self.window = Some(window);
    }

    /// The tick this redraw delivers, if one was requested.
    fn take_due(&mut self) -> Option<TickHandle> {
        self.pending.take()
    }
}

impl TickScheduler for RedrawScheduler {
    fn schedule(&mut self) -> TickHandle {
        self.next_id += 1;
        let handle = TickHandle(self.next_id);
        self.pending = Some(handle);
        if let Some(window) = &self.window {
            window.request_redraw();
        }
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

struct GpuSpriteTexture {
    _texture: Texture,
    bind_group: wgpu::BindGroup,
}

struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    sprite_pipeline: SpritePipeline,
    camera_bind_group: wgpu::BindGroup,
    textures: HashMap<Arc<str>, GpuSpriteTexture>,
    batch: SpriteBatch,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
}

impl EngineState {
    fn new(
        window: Arc<Window>,
        config: &GameConfig,
        game: &Game<RedrawScheduler>,
    ) -> Result<Self, GpuError> {
        let gpu = GpuContext::new(window.clone())?;
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);

        let camera = Camera2D::new(config.surface_width, config.surface_height);
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);

        let mut textures = HashMap::new();
        let white = Texture::from_rgba8(
            &gpu.device,
            &gpu.queue,
            &[255, 255, 255, 255],
            1,
            1,
            WHITE_TEXTURE_KEY,
        );
        let bind_group = sprite_pipeline.create_texture_bind_group(&gpu.device, &white);
        textures.insert(
            Arc::from(WHITE_TEXTURE_KEY),
            GpuSpriteTexture {
                _texture: white,
                bind_group,
            },
        );
        for image in game.assets().images() {
            if let Some(texture) = Texture::from_sprite_image(&gpu.device, &gpu.queue, image) {
                let bind_group = sprite_pipeline.create_texture_bind_group(&gpu.device, &texture);
                textures.insert(
                    image.texture_key(),
                    GpuSpriteTexture {
                        _texture: texture,
                        bind_group,
                    },
                );
            }
        }
        log::info!("Uploaded {} texture(s)", textures.len());

        let mesh_vertex_capacity = 16;
        let mesh_index_capacity = 32;
        let vertex_buffer = create_vertex_buffer(&gpu.device, mesh_vertex_capacity);
        let index_buffer = create_index_buffer(&gpu.device, mesh_index_capacity);

        Ok(Self {
            window,
            gpu,
            sprite_pipeline,
            camera_bind_group,
            textures,
            batch: SpriteBatch::new(config.surface_width, config.surface_height),
            vertex_buffer,
            index_buffer,
            mesh_vertex_capacity,
            mesh_index_capacity,
        })
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    /// Submit whatever the batch last recorded. Redraws with no tick due
    /// (expose, resize, paused loop) repaint the previous frame.
    fn present(&mut self) {
        if self.gpu.size.0 == 0 || self.gpu.size.1 == 0 {
            return;
        }
        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        self.ensure_mesh_capacity(self.batch.vertices().len(), self.batch.indices().len());
        if !self.batch.indices().is_empty() {
            self.gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(self.batch.vertices()),
            );
            self.gpu
                .queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(self.batch.indices()));
        }

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let [r, g, b, a] = self.batch.clear_color();
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sprite Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            if !self.batch.indices().is_empty() {
                render_pass.set_pipeline(&self.sprite_pipeline.render_pipeline);
                render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                render_pass
                    .set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

                for draw in self.batch.draw_calls() {
                    let Some(texture) = self.textures.get(&draw.texture_key) else {
                        log::trace!("No texture for '{}', skipping draw", draw.texture_key);
                        continue;
                    };
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    render_pass.draw_indexed(
                        draw.index_start..(draw.index_start + draw.index_count),
                        0,
                        0..1,
                    );
                }
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

struct App {
    config: GameConfig,
    platform: PlatformConfig,
    game: Game<RedrawScheduler>,
    timer: FrameTimer,
    state: Option<EngineState>,
    fatal: Option<AppError>,
}

impl App {
    fn new(config: GameConfig, game: Game<RedrawScheduler>) -> Self {
        let (width, height) = config.window_size();
        Self {
            platform: PlatformConfig {
                width,
                height,
                ..PlatformConfig::default()
            },
            config,
            game,
            timer: FrameTimer::new(),
            state: None,
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AppError) {
        self.game.stop();
        self.fatal = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = match create_window(event_loop, &self.platform) {
            Ok(window) => window,
            Err(e) => return self.fail(event_loop, e.into()),
        };
        let state = match EngineState::new(window.clone(), &self.config, &self.game) {
            Ok(state) => state,
            Err(e) => return self.fail(event_loop, e.into()),
        };
        self.state = Some(state);
        self.game.scheduler_mut().attach(window);
        self.timer.resume();
        self.game.start();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                self.game.stop();
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                state.gpu.resize(physical_size.width, physical_size.height);
                state.window.request_redraw();
            }

            WindowEvent::Focused(false) => {
                log::debug!("Focus lost, releasing held keys");
                self.game.focus_lost();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => self.game.input_mut().key_down(key),
                            ElementState::Released => self.game.input_mut().key_up(key),
                        }
                    }
                }
                handle_commands(&mut self.game, &mut self.timer, event_loop);
            }

            WindowEvent::RedrawRequested => {
                if let Some(handle) = self.game.scheduler_mut().take_due() {
                    self.timer.begin_frame();
                    let rendered = self.game.on_tick(handle, &mut state.batch);
                    if rendered && self.config.debug && self.timer.sample_window_complete() {
                        log::debug!(
                            "{:.1} fps ({:.2} ms/frame), {} tick(s)",
                            self.timer.smoothed_fps,
                            self.timer.smoothed_frame_time_ms,
                            self.game.tick_count()
                        );
                    }
                }
                state.present();
            }

            _ => {}
        }
    }
}

/// Engine keys fire on the press edge only, so OS key repeat never
/// retriggers them.
fn handle_commands(
    game: &mut Game<RedrawScheduler>,
    timer: &mut FrameTimer,
    event_loop: &ActiveEventLoop,
) {
    let input = game.input();
    let quit = input.is_just_pressed(Key::Escape);
    let reset = input.is_just_pressed(Key::R);
    let toggle_pause = input.is_just_pressed(Key::P);
    game.input_mut().end_frame();

    if quit {
        log::info!("Escape pressed, exiting.");
        game.stop();
        event_loop.exit();
        return;
    }
    if reset {
        game.reset();
    }
    if toggle_pause {
        if game.is_running() {
            game.stop();
        } else {
            timer.resume();
            game.start();
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// First CLI argument, then `WALKER_CONFIG`, then the default file if present.
fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
        .or_else(|| {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            default.exists().then_some(default)
        })
}

fn load_config() -> Result<GameConfig, AppError> {
    match config_path() {
        Some(path) => load_config_from_path(&path).map_err(AppError::Config),
        None => Ok(GameConfig::default()),
    }
}

fn load_manifest(config: &GameConfig) -> Result<SpriteManifest, AppError> {
    if !config.manifest_path.exists() {
        log::info!(
            "No sprite manifest at {}, using the built-in set",
            config.manifest_path.display()
        );
        return Ok(SpriteManifest::builtin());
    }
    load_sprite_manifest(&config.manifest_path).map_err(AppError::Manifest)
}

fn run(config: GameConfig) -> Result<(), AppError> {
    let manifest = load_manifest(&config)?;
    let loader = FileImageLoader::new(&config.asset_root);

    let mut game = Game::new(&config, RedrawScheduler::default());
    pollster::block_on(game.init(&manifest, &loader))?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config, game);
    event_loop.run_app(&mut app)?;
    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    let config = load_config();
    let default_filter = match &config {
        Ok(config) if config.debug => "debug",
        _ => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    log::info!("Sprite Walker starting...");

    match config.and_then(run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
