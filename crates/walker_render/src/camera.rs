use glam::Mat4;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Fixed camera showing the whole logical surface.
///
/// Surface coordinates put the origin at the top-left with y pointing down,
/// so the projection flips y. The window may be any pixel size; the surface
/// is stretched to fill it.
pub struct Camera2D {
    pub surface: (f32, f32),
}

impl Camera2D {
    pub fn new(surface_width: f32, surface_height: f32) -> Self {
        Self {
            surface: (surface_width, surface_height),
        }
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::orthographic_rh(0.0, self.surface.0, self.surface.1, 0.0, -1.0, 1.0)
    }

    pub fn build_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.projection().to_cols_array_2d(),
        }
    }
}
