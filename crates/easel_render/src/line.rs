//! Line segment shaping for `DrawSurface::draw_line`.

use easel_core::Vector2;

/// Extra shaping for a line between two points.
///
/// Offsets push the endpoints outward along the a→b direction: a positive
/// `start_offset` moves the start back behind `a`, a positive `end_offset`
/// extends past `b`. Negative values pull the endpoints inward.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LineOptions {
    pub start_offset: f32,
    pub end_offset: f32,
    pub max_length: Option<f32>,
    pub min_length: Option<f32>,
}

impl LineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offsets(mut self, start: f32, end: f32) -> Self {
        self.start_offset = start;
        self.end_offset = end;
        self
    }

    pub fn max_length(mut self, len: f32) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn min_length(mut self, len: f32) -> Self {
        self.min_length = Some(len);
        self
    }
}

/// Apply offsets, then clamp the length. Only one clamp applies, `max_length`
/// first. The clamp keeps the offset start fixed and moves the end along the
/// original a→b angle.
pub fn shape_segment(a: Vector2, b: Vector2, options: &LineOptions) -> (Vector2, Vector2) {
    let dir = Vector2::from_angle(a.angle_to(b));
    let start = a - dir * options.start_offset;
    let mut end = b + dir * options.end_offset;

    let len = start.distance_to(end);
    if let Some(max) = options.max_length.filter(|&max| len > max) {
        end = start + dir * max;
    } else if let Some(min) = options.min_length.filter(|&min| len < min) {
        end = start + dir * min;
    }
    (start, end)
}
