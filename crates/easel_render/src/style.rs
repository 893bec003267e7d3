//! Paint state and per-call draw styles.
//!
//! [`PaintState`] is the surface's current state (what a 2D canvas context
//! would hold). [`DrawStyle`] is a partial override: every option is optional
//! and only the ones that are set touch the state, for the duration of one
//! scoped call.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_array([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }
}

impl From<Color> for egui::Color32 {
    fn from(c: Color) -> Self {
        egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
    }
}

impl From<Color> for wgpu::Color {
    fn from(c: Color) -> Self {
        let f = |v: u8| f64::from(v) / 255.0;
        wgpu::Color {
            r: f(c.r),
            g: f(c.g),
            b: f(c.b),
            a: f(c.a),
        }
    }
}

/// Neutral foreground used when a primitive's colour is not given.
pub const FOREGROUND: Color = Color::WHITE;
pub const DEFAULT_FONT_FAMILY: &str = "monospace";
pub const DEFAULT_FONT_SIZE: f32 = 8.0;
pub const DEFAULT_LINE_WIDTH: f32 = 1.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawStyle {
    pub stroke_color: Option<Color>,
    pub line_width: Option<f32>,
    pub fill_color: Option<Color>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    /// Overlay ("gui") draws skip the camera transform.
    pub overlay: bool,
    pub image_smoothing: Option<bool>,
}

impl DrawStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill(mut self, color: Color) -> Self {
        self.fill_color = Some(color);
        self
    }

    pub fn stroke(mut self, color: Color) -> Self {
        self.stroke_color = Some(color);
        self
    }

    pub fn line_width(mut self, width: f32) -> Self {
        self.line_width = Some(width);
        self
    }

    pub fn font(mut self, family: impl Into<String>, size: f32) -> Self {
        self.font_family = Some(family.into());
        self.font_size = Some(size);
        self
    }

    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn overlay(mut self) -> Self {
        self.overlay = true;
        self
    }

    pub fn image_smoothing(mut self, enabled: bool) -> Self {
        self.image_smoothing = Some(enabled);
        self
    }

    /// Field-by-field merge: options set on `self` win, unset ones fall back
    /// to `defaults`.
    pub fn or_defaults(&self, defaults: &DrawStyle) -> DrawStyle {
        DrawStyle {
            stroke_color: self.stroke_color.or(defaults.stroke_color),
            line_width: self.line_width.or(defaults.line_width),
            fill_color: self.fill_color.or(defaults.fill_color),
            font_family: self
                .font_family
                .clone()
                .or_else(|| defaults.font_family.clone()),
            font_size: self.font_size.or(defaults.font_size),
            overlay: self.overlay || defaults.overlay,
            image_smoothing: self.image_smoothing.or(defaults.image_smoothing),
        }
    }

    pub(crate) fn rect_defaults() -> Self {
        Self::new().fill(FOREGROUND)
    }

    pub(crate) fn circle_defaults() -> Self {
        Self::new().fill(FOREGROUND)
    }

    pub(crate) fn path_defaults() -> Self {
        Self::new().stroke(FOREGROUND).line_width(DEFAULT_LINE_WIDTH)
    }

    pub(crate) fn text_defaults() -> Self {
        Self::new()
            .fill(FOREGROUND)
            .font(DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE)
    }

    pub(crate) fn image_defaults() -> Self {
        Self::new().image_smoothing(false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaintState {
    pub stroke_color: Color,
    pub line_width: f32,
    pub fill_color: Color,
    pub font_family: String,
    pub font_size: f32,
    pub image_smoothing: bool,
}

impl Default for PaintState {
    fn default() -> Self {
        Self {
            stroke_color: Color::BLACK,
            line_width: DEFAULT_LINE_WIDTH,
            fill_color: Color::BLACK,
            font_family: "sans-serif".to_string(),
            font_size: 10.0,
            image_smoothing: true,
        }
    }
}

impl PaintState {
    /// Overwrite only what `style` sets.
    pub fn apply(&mut self, style: &DrawStyle) {
        if let Some(c) = style.stroke_color {
            self.stroke_color = c;
        }
        if let Some(w) = style.line_width {
            self.line_width = w;
        }
        if let Some(c) = style.fill_color {
            self.fill_color = c;
        }
        if let Some(family) = &style.font_family {
            self.font_family.clone_from(family);
        }
        if let Some(size) = style.font_size {
            self.font_size = size;
        }
        if let Some(smooth) = style.image_smoothing {
            self.image_smoothing = smooth;
        }
    }
}
