use std::sync::Arc;

use easel_core::EngineConfig;
use winit::error::OsError;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

#[derive(Debug, Clone, PartialEq)]
pub struct PlatformConfig {
    pub title: String,
    /// Window size in logical pixels: the surface size times its render scale.
    pub width: u32,
    pub height: u32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for PlatformConfig {
    fn from(config: &EngineConfig) -> Self {
        let surface = &config.surface;
        Self {
            title: config.title.clone(),
            width: (surface.width as f32 * surface.scale).round() as u32,
            height: (surface.height as f32 * surface.scale).round() as u32,
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
    log::info!(
        "Window '{}' created at {}x{}",
        config.title,
        config.width,
        config.height
    );
    Ok(Arc::new(window))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_size_is_surface_size_times_scale() {
        let mut config = EngineConfig::default();
        config.title = "Sandbox".into();
        config.surface.width = 480;
        config.surface.height = 320;
        config.surface.scale = 2.0;
        let platform = PlatformConfig::from(&config);
        assert_eq!(platform.title, "Sandbox");
        assert_eq!((platform.width, platform.height), (960, 640));
    }

    #[test]
    fn fractional_scale_rounds() {
        let mut config = EngineConfig::default();
        config.surface.width = 101;
        config.surface.height = 50;
        config.surface.scale = 1.5;
        let platform = PlatformConfig::from(&config);
        assert_eq!((platform.width, platform.height), (152, 75));
    }
}
