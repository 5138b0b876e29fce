use std::fmt;
use std::sync::Arc;

/// A decoded RGBA8 image plus the path it was loaded from.
///
/// Cloning shares the pixel buffer. The source path doubles as the texture key
/// on the GPU side, so two handles for the same path draw the same texture.
#[derive(Clone, PartialEq, Eq)]
pub struct SpriteImage {
    source_path: Arc<str>,
    width: u32,
    height: u32,
    rgba: Arc<[u8]>,
}

impl SpriteImage {
    pub fn from_rgba8(source_path: &str, width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            source_path: Arc::from(source_path),
            width,
            height,
            rgba: Arc::from(rgba),
        }
    }

    /// Decode PNG (or any enabled `image` format) bytes.
    pub fn from_encoded(source_path: &str, bytes: &[u8]) -> Result<Self, image::ImageError> {
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = decoded.dimensions();
        Ok(Self::from_rgba8(source_path, width, height, decoded.into_raw()))
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn texture_key(&self) -> Arc<str> {
        self.source_path.clone()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Whether the pixel data is complete and drawable.
    pub fn is_decoded(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.rgba.len() == self.width as usize * self.height as usize * 4
    }
}

impl fmt::Debug for SpriteImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpriteImage")
            .field("source_path", &self.source_path)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
