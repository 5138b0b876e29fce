use walker_core::animation::AnimationState;
use walker_core::config::GameConfig;
use walker_core::input::{InputState, Key};
use walker_render::Rect;

const SPAWN_CLIP: &str = "idle_down";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Up,
    Down,
    Left,
    Right,
}

impl Facing {
    fn from_arrow(key: Key) -> Option<Self> {
        match key {
            Key::Left => Some(Facing::Left),
            Key::Right => Some(Facing::Right),
            Key::Up => Some(Facing::Up),
            Key::Down => Some(Facing::Down),
            _ => None,
        }
    }

    /// Unit step on the y-down surface.
    fn step(self) -> (f32, f32) {
        match self {
            Facing::Left => (-1.0, 0.0),
            Facing::Right => (1.0, 0.0),
            Facing::Up => (0.0, -1.0),
            Facing::Down => (0.0, 1.0),
        }
    }

    /// Left-facing frames are the right-facing art drawn mirrored.
    pub fn is_mirrored(self) -> bool {
        self == Facing::Left
    }
}

fn target_clip(moving: bool, facing: Facing) -> &'static str {
    match (moving, facing) {
        (true, Facing::Up) => "walk_up",
        (true, Facing::Down) => "walk_down",
        (true, Facing::Left | Facing::Right) => "walk_right",
        (false, Facing::Up) => "idle_up",
        (false, Facing::Down) => "idle_down",
        (false, Facing::Left | Facing::Right) => "idle_right",
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorConfig {
    pub spawn: (f32, f32),
    pub size: (f32, f32),
    /// Surface the actor must stay inside.
    pub bounds: (f32, f32),
    pub move_speed: f32,
    pub animation_cadence: u32,
}

impl ActorConfig {
    pub fn from_game_config(config: &GameConfig) -> Self {
        Self {
            spawn: config.spawn_point(),
            size: (config.tile_size, config.tile_size),
            bounds: (config.surface_width, config.surface_height),
            move_speed: config.move_speed,
            animation_cadence: config.animation_cadence,
        }
    }
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self::from_game_config(&GameConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub facing: Facing,
    pub is_moving: bool,
    pub animation: AnimationState,
    pub config: ActorConfig,
}

impl Actor {
    pub fn new(config: ActorConfig) -> Self {
        Self {
            x: config.spawn.0,
            y: config.spawn.1,
            width: config.size.0,
            height: config.size.1,
            facing: Facing::Down,
            is_moving: false,
            animation: AnimationState::new(SPAWN_CLIP),
            config,
        }
    }

    /// One tick of movement from the held arrows.
    ///
    /// Arrows are read left, right, up, down. Each sets the velocity on its
    /// own axis, so opposing keys resolve to the later one, and the last held
    /// arrow decides facing. Movement is clamped to the surface, and the clip
    /// follows the moving/facing pair.
    pub fn advance(&mut self, input: &InputState) {
        let speed = self.config.move_speed;
        let (mut vx, mut vy) = (0.0, 0.0);
        let mut moved = false;

        for key in Key::ARROWS {
            if !input.is_held(key) {
                continue;
            }
            let Some(facing) = Facing::from_arrow(key) else {
                continue;
            };
            let (dx, dy) = facing.step();
            if dx != 0.0 {
                vx = dx * speed;
            }
            if dy != 0.0 {
                vy = dy * speed;
            }
            self.facing = facing;
            moved = true;
        }

        self.x += vx;
        self.y += vy;
        self.clamp_to_bounds();
        self.is_moving = moved;

        let clip = target_clip(moved, self.facing);
        if self.animation.switch_clip(clip) {
            log::trace!("Actor clip -> {}", clip);
        }
        if !moved {
            self.animation.rewind();
        }
    }

    /// Count one tick against the current clip's frames. Only a moving actor
    /// with a non-empty clip advances; otherwise the tick counter resets.
    pub fn tick_animation<T>(&mut self, frames: Option<&[T]>) {
        match frames {
            Some(frames) if self.is_moving && !frames.is_empty() => {
                self.animation
                    .tick(frames.len(), self.config.animation_cadence);
            }
            _ => self.animation.ticks_elapsed = 0,
        }
    }

    /// Back to spawn, facing down, idle.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    pub fn clip_key(&self) -> &str {
        &self.animation.clip_key
    }

    pub fn frame_index(&self) -> usize {
        self.animation.frame_index
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    fn clamp_to_bounds(&mut self) {
        let max_x = (self.config.bounds.0 - self.width).max(0.0);
        let max_y = (self.config.bounds.1 - self.height).max(0.0);
        self.x = self.x.clamp(0.0, max_x);
        self.y = self.y.clamp(0.0, max_y);
    }
}
