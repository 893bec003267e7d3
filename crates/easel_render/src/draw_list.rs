//! The surface's physical buffer: a list of fully resolved draw commands.
//!
//! Every command is already in surface space (camera applied) and carries
//! the paint values it was recorded with, so presentation never consults the
//! style stack. Render scale is applied at presentation time.

use easel_core::Vector2;

use crate::image::ImageHandle;
use crate::style::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family: String,
    pub size: f32,
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    Rect {
        /// Top-left corner.
        pos: Vector2,
        size: Vector2,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Circle {
        center: Vector2,
        radius: f32,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Path {
        points: Vec<Vector2>,
        stroke: Stroke,
    },
    Text {
        text: String,
        /// Top-left of the text block.
        pos: Vector2,
        color: Color,
        font: Font,
    },
    Image {
        image: ImageHandle,
        pos: Vector2,
        size: Vector2,
        smoothing: bool,
    },
}

#[derive(Debug, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn last(&self) -> Option<&DrawCommand> {
        self.commands.last()
    }
}
