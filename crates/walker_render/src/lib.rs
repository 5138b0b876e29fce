pub mod batch;
pub mod camera;
pub mod gpu_context;
pub mod sprite_image;
pub mod sprite_pipeline;
pub mod surface;
pub mod texture;

pub use batch::{DrawCall, SpriteBatch, WHITE_TEXTURE_KEY};
pub use camera::{Camera2D, CameraUniform};
pub use gpu_context::{GpuContext, GpuError};
pub use sprite_image::SpriteImage;
pub use sprite_pipeline::{SpritePipeline, SpriteVertex};
pub use surface::{Color, DrawSurface, Rect};
pub use texture::Texture;
