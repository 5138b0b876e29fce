use crate::sprite_image::SpriteImage;

pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub size: (u32, u32),
}

impl Texture {
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &[u8],
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            extent,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            size: (width, height),
        }
    }

    /// Upload a decoded sprite. Returns `None` for images that are not fully
    /// decoded; callers keep drawing their placeholder for those.
    pub fn from_sprite_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &SpriteImage,
    ) -> Option<Self> {
        if !image.is_decoded() {
            log::warn!(
                "Skipping texture upload for '{}': image is not fully decoded",
                image.source_path()
            );
            return None;
        }
        let (width, height) = image.size();
        Some(Self::from_rgba8(
            device,
            queue,
            image.rgba(),
            width,
            height,
            image.source_path(),
        ))
    }
}
