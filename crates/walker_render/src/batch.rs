//! CPU-side quad batch implementing `DrawSurface`.
//!
//! Every draw becomes one textured quad. Fills use a 1x1 white texture tinted
//! by the vertex color, so the whole frame goes through a single pipeline. The
//! app uploads `vertices()`/`indices()` once per frame and replays
//! `draw_calls()` inside a render pass that clears to `clear_color()`.

use std::sync::Arc;

use crate::sprite_image::SpriteImage;
use crate::sprite_pipeline::SpriteVertex;
use crate::surface::{Color, DrawSurface, Rect};

/// Texture key of the 1x1 white texture used for solid fills.
pub const WHITE_TEXTURE_KEY: &str = "__white";

const UNTINTED: Color = [1.0, 1.0, 1.0, 1.0];

/// A contiguous run of indices that share the same texture binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub texture_key: Arc<str>,
    pub index_start: u32,
    pub index_count: u32,
}

#[derive(Debug)]
pub struct SpriteBatch {
    size: (f32, f32),
    clear_color: Color,
    white_key: Arc<str>,
    vertices: Vec<SpriteVertex>,
    indices: Vec<u32>,
    draw_calls: Vec<DrawCall>,
}

impl SpriteBatch {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: (width, height),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            white_key: Arc::from(WHITE_TEXTURE_KEY),
            vertices: Vec::with_capacity(64),
            indices: Vec::with_capacity(96),
            draw_calls: Vec::with_capacity(4),
        }
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn vertices(&self) -> &[SpriteVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    fn push_quad(&mut self, texture_key: Arc<str>, rect: Rect, uv: [f32; 4], color: Color) {
        let [u0, v0, u1, v1] = uv;
        let base_index = self.vertices.len() as u32;

        self.vertices.push(SpriteVertex {
            position: [rect.x, rect.y],
            tex_coords: [u0, v0],
            color,
        });
        self.vertices.push(SpriteVertex {
            position: [rect.right(), rect.y],
            tex_coords: [u1, v0],
            color,
        });
        self.vertices.push(SpriteVertex {
            position: [rect.right(), rect.bottom()],
            tex_coords: [u1, v1],
            color,
        });
        self.vertices.push(SpriteVertex {
            position: [rect.x, rect.bottom()],
            tex_coords: [u0, v1],
            color,
        });

        let draw_start = self.indices.len() as u32;
        self.indices.extend_from_slice(&[
            base_index,
            base_index + 1,
            base_index + 2,
            base_index,
            base_index + 2,
            base_index + 3,
        ]);

        push_draw_call(&mut self.draw_calls, texture_key, draw_start, 6);
    }
}

impl DrawSurface for SpriteBatch {
    fn size(&self) -> (f32, f32) {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.vertices.clear();
        self.indices.clear();
        self.draw_calls.clear();
        self.clear_color = color;
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let key = self.white_key.clone();
        self.push_quad(key, rect, [0.0, 0.0, 1.0, 1.0], color);
    }

    fn draw_image(&mut self, image: &SpriteImage, rect: Rect, mirrored: bool) {
        let uv = if mirrored {
            [1.0, 0.0, 0.0, 1.0]
        } else {
            [0.0, 0.0, 1.0, 1.0]
        };
        self.push_quad(image.texture_key(), rect, uv, UNTINTED);
    }
}

/// Append a draw call, merging with the previous one when the texture matches
/// and indices are contiguous.
fn push_draw_call(
    draw_calls: &mut Vec<DrawCall>,
    texture_key: Arc<str>,
    index_start: u32,
    index_count: u32,
) {
    if let Some(last) = draw_calls.last_mut() {
        let contiguous = last.index_start + last.index_count == index_start;
        if *last.texture_key == *texture_key && contiguous {
            last.index_count += index_count;
            return;
        }
    }
    draw_calls.push(DrawCall {
        texture_key,
        index_start,
        index_count,
    });
}
