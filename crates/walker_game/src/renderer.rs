use walker_core::config::GameConfig;
use walker_render::{Color, DrawSurface};

use crate::actor::Actor;
use crate::assets::AssetCache;

/// Draws one frame: background, then the actor's current sprite.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    background: Color,
    placeholder: Color,
}

impl Renderer {
    pub fn new(background: Color, placeholder: Color) -> Self {
        Self {
            background,
            placeholder,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.background_color, config.placeholder_color)
    }

    pub fn clear(&self, surface: &mut dyn DrawSurface) {
        surface.clear(self.background);
    }

    /// Idle clips are always drawn at frame 0. When no decoded image exists
    /// for the clip the actor's box is filled with the placeholder color.
    pub fn draw_actor(&self, surface: &mut dyn DrawSurface, actor: &Actor, assets: &AssetCache) {
        let frame = actor.is_moving.then(|| actor.frame_index() as isize);
        let bounds = actor.bounds();
        match assets.sprite(actor.clip_key(), frame) {
            Some(image) if image.is_decoded() => {
                surface.draw_image(image, bounds, actor.facing.is_mirrored());
            }
            _ => {
                log::trace!("No sprite for '{}', drawing placeholder", actor.clip_key());
                surface.fill_rect(bounds, self.placeholder);
            }
        }
    }

    pub fn render(&self, surface: &mut dyn DrawSurface, actor: &Actor, assets: &AssetCache) {
        self.clear(surface);
        self.draw_actor(surface, actor, assets);
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}
