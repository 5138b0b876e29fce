use std::sync::Arc;
use winit::error::OsError;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Sprite Walker".to_string(),
            width: 1024,
            height: 576,
        }
    }
}

pub fn create_window(
    event_loop: &ActiveEventLoop,
    config: &PlatformConfig,
) -> Result<Arc<Window>, OsError> {
    let attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height))
        .with_resizable(false);

    let window = event_loop.create_window(attrs)?;
    log::info!("Window created: {}x{}", config.width, config.height);
    Ok(Arc::new(window))
}
