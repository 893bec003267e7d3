//! `DrawSurface`: scoped styling and camera-relative drawing.
//!
//! Every primitive runs inside [`DrawSurface::with_style_and_position`]:
//!
//!   1. the primitive's defaults are merged under the caller's style
//!      (caller values always win),
//!   2. the current paint state is pushed and only the set options applied,
//!   3. the position goes through the attached camera unless the style is
//!      an overlay,
//!   4. the command is recorded with the resolved paint values,
//!   5. the paint state is popped.
//!
//! Style therefore never leaks from one call into the next. The surface owns
//! its camera; the scene reaches it through `camera_mut`.

use easel_core::config::SurfaceConfig;
use easel_core::{Camera, EaselError, Vector2};

use crate::draw_list::{DrawCommand, DrawList, Font, Stroke};
use crate::image::ImageHandle;
use crate::line::{shape_segment, LineOptions};
use crate::style::{Color, DrawStyle, PaintState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceOptions {
    /// Logical width; the viewport the camera centres on.
    pub width: u32,
    pub height: u32,
    /// Physical pixels per logical unit. Affects presentation only.
    pub scale: f32,
    pub background: Color,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self::from(&SurfaceConfig::default())
    }
}

impl From<&SurfaceConfig> for SurfaceOptions {
    fn from(config: &SurfaceConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            scale: config.scale,
            background: Color::from_array(config.background),
        }
    }
}

impl SurfaceOptions {
    pub fn logical_size(&self) -> Vector2 {
        Vector2::new(self.width as f32, self.height as f32)
    }
}

pub struct DrawSurface {
    options: SurfaceOptions,
    camera: Option<Camera>,
    state: PaintState,
    saved: Vec<PaintState>,
    list: DrawList,
}

impl DrawSurface {
    pub fn new(options: SurfaceOptions) -> Self {
        Self {
            options,
            camera: None,
            state: PaintState::default(),
            saved: Vec::new(),
            list: DrawList::new(),
        }
    }

    pub fn options(&self) -> &SurfaceOptions {
        &self.options
    }

    /// Resize / rescale. An attached camera's viewport follows the logical size.
    pub fn set_options(&mut self, options: SurfaceOptions) {
        if options != self.options {
            log::info!(
                "Surface options: {}x{} @ {}x",
                options.width,
                options.height,
                options.scale
            );
        }
        self.options = options;
        if let Some(camera) = self.camera.as_mut() {
            camera.viewport_size = options.logical_size();
        }
    }

    /// Size of the physical buffer in pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        let scale = self.options.scale;
        (
            (self.options.width as f32 * scale).round() as u32,
            (self.options.height as f32 * scale).round() as u32,
        )
    }

    pub fn attach_camera(&mut self, mut camera: Camera) {
        camera.viewport_size = self.options.logical_size();
        self.camera = Some(camera);
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera.as_mut()
    }

    pub fn paint_state(&self) -> &PaintState {
        &self.state
    }

    pub fn draw_list(&self) -> &DrawList {
        &self.list
    }

    /// Number of saved states on the stack. Pair with `restore_to` to repair
    /// the stack after a body bailed out part-way.
    pub fn state_depth(&self) -> usize {
        self.saved.len()
    }

    pub fn restore_to(&mut self, depth: usize) {
        if self.saved.len() > depth {
            log::warn!(
                "Restoring paint state from depth {} to {}",
                self.saved.len(),
                depth
            );
            self.saved.truncate(depth + 1);
            if let Some(state) = self.saved.pop() {
                self.state = state;
            }
        }
    }

    fn save(&mut self) {
        self.saved.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    /// Run `body` with `style` applied on top of the current paint state.
    /// The prior state is back in place when this returns, whatever `body`
    /// returned.
    pub fn with_style<R>(&mut self, style: &DrawStyle, body: impl FnOnce(&mut Self) -> R) -> R {
        self.save();
        self.state.apply(style);
        let result = body(self);
        self.restore();
        result
    }

    /// `with_style` plus the world→surface transform for `pos`.
    pub fn with_style_and_position<R>(
        &mut self,
        style: &DrawStyle,
        pos: Vector2,
        body: impl FnOnce(&mut Self, Vector2) -> R,
    ) -> R {
        let overlay = style.overlay;
        self.with_style(style, |surface| {
            let pos = surface.project(pos, overlay);
            body(surface, pos)
        })
    }

    /// Surface position for a world position (or unchanged for overlays).
    pub fn project(&self, pos: Vector2, overlay: bool) -> Vector2 {
        match (&self.camera, overlay) {
            (Some(camera), false) => camera.to_surface_position(pos),
            _ => pos,
        }
    }

    /// Wipe the whole physical buffer.
    pub fn clear(&mut self) {
        self.list.clear();
    }

    pub fn draw_rect(&mut self, pos: Vector2, size: Vector2, style: &DrawStyle) {
        let stroke_requested = style.stroke_color.is_some();
        let style = style.or_defaults(&DrawStyle::rect_defaults());
        self.with_style_and_position(&style, pos, |s, pos| {
            let stroke = stroke_requested.then(|| s.current_stroke());
            s.list.push(DrawCommand::Rect {
                pos,
                size,
                fill: Some(s.state.fill_color),
                stroke,
            });
        });
    }

    pub fn draw_circle(&mut self, radius: f32, pos: Vector2, style: &DrawStyle) {
        let stroke_requested = style.stroke_color.is_some();
        let style = style.or_defaults(&DrawStyle::circle_defaults());
        self.with_style_and_position(&style, pos, |s, center| {
            let stroke = stroke_requested.then(|| s.current_stroke());
            s.list.push(DrawCommand::Circle {
                center,
                radius,
                fill: Some(s.state.fill_color),
                stroke,
            });
        });
    }

    /// Connect `points` with straight segments. An empty list is a caller
    /// error; a single point records a degenerate path.
    pub fn draw_path(&mut self, points: &[Vector2], style: &DrawStyle) -> Result<(), EaselError> {
        let Some(&first) = points.first() else {
            return Err(EaselError::invalid_input("draw_path needs at least one point"));
        };
        let style = style.or_defaults(&DrawStyle::path_defaults());
        self.with_style_and_position(&style, first, |s, first| {
            let mut projected = Vec::with_capacity(points.len());
            projected.push(first);
            projected.extend(points[1..].iter().map(|&p| s.project(p, style.overlay)));
            s.list.push(DrawCommand::Path {
                points: projected,
                stroke: s.current_stroke(),
            });
        });
        Ok(())
    }

    /// Draw a shaped segment from `a` to `b`; see [`LineOptions`].
    pub fn draw_line(&mut self, a: Vector2, b: Vector2, options: &LineOptions, style: &DrawStyle) {
        let (start, end) = shape_segment(a, b, options);
        if let Err(err) = self.draw_path(&[start, end], style) {
            // Two points are always present.
            log::error!("draw_line: {err}");
        }
    }

    pub fn draw_text(&mut self, text: &str, pos: Vector2, style: &DrawStyle) {
        let style = style.or_defaults(&DrawStyle::text_defaults());
        self.with_style_and_position(&style, pos, |s, pos| {
            s.list.push(DrawCommand::Text {
                text: text.to_string(),
                pos,
                color: s.state.fill_color,
                font: Font {
                    family: s.state.font_family.clone(),
                    size: s.state.font_size,
                },
            });
        });
    }

    /// Draw `image` with its top-left at `pos`, sized `scale` × its pixel size.
    /// No-op while the image is still loading.
    pub fn draw_image(&mut self, image: &ImageHandle, pos: Vector2, scale: f32, style: &DrawStyle) {
        let Some(data) = image.data() else {
            log::trace!("draw_image: '{}' not loaded yet, skipping", image.name());
            return;
        };
        let size = Vector2::new(data.width as f32 * scale, data.height as f32 * scale);
        let style = style.or_defaults(&DrawStyle::image_defaults());
        self.with_style_and_position(&style, pos, |s, pos| {
            s.list.push(DrawCommand::Image {
                image: image.clone(),
                pos,
                size,
                smoothing: s.state.image_smoothing,
            });
        });
    }

    fn current_stroke(&self) -> Stroke {
        Stroke {
            color: self.state.stroke_color,
            width: self.state.line_width,
        }
    }
}
