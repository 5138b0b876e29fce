//! The drawing surface the game renders into.
//!
//! Coordinates are logical surface units with the origin at the top-left
//! corner and y growing downwards. Implementations decide how that maps to
//! pixels: `SpriteBatch` builds a quad mesh for wgpu, tests record calls.

use crate::sprite_image::SpriteImage;

pub type Color = [f32; 4];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

pub trait DrawSurface {
    /// Logical `(width, height)`.
    fn size(&self) -> (f32, f32);

    /// Discard everything drawn so far and fill the whole surface with `color`.
    fn clear(&mut self, color: Color);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Draw `image` stretched over `rect`. `mirrored` flips it horizontally
    /// in place: the left edge of the image lands on `rect.right()`.
    fn draw_image(&mut self, image: &SpriteImage, rect: Rect, mirrored: bool);
}
