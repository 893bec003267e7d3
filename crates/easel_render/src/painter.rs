//! Turns a recorded [`DrawList`] into egui shapes.
//!
//! Coordinates are multiplied by the surface render scale here and only
//! here. Image textures are uploaded once per (image, sampling) pair and
//! evicted when a frame no longer draws them.

use std::collections::{HashMap, HashSet};

use egui::{pos2, Align2, Color32, FontFamily, FontId, Pos2, Rect, Shape};

use easel_core::Vector2;

use crate::draw_list::{DrawCommand, DrawList, Font, Stroke};
use crate::image::ImageHandle;

type TextureKey = (u64, bool);

#[derive(Default)]
pub struct TextureCache {
    textures: HashMap<TextureKey, egui::TextureHandle>,
    used_this_frame: HashSet<TextureKey>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    fn texture_for(
        &mut self,
        ctx: &egui::Context,
        image: &ImageHandle,
        smoothing: bool,
    ) -> Option<egui::TextureId> {
        let data = image.data()?;
        let key = (image.id(), smoothing);
        self.used_this_frame.insert(key);
        let handle = self.textures.entry(key).or_insert_with(|| {
            let color_image = egui::ColorImage::from_rgba_unmultiplied(
                [data.width as usize, data.height as usize],
                &data.rgba,
            );
            let options = if smoothing {
                egui::TextureOptions::LINEAR
            } else {
                egui::TextureOptions::NEAREST
            };
            log::debug!(
                "Uploading texture '{}' ({}x{}, smoothing {})",
                image.name(),
                data.width,
                data.height,
                smoothing
            );
            ctx.load_texture(image.name(), color_image, options)
        });
        Some(handle.id())
    }

    /// Drop textures the last frame did not draw.
    pub fn end_frame(&mut self) {
        let used = std::mem::take(&mut self.used_this_frame);
        self.textures.retain(|key, _| used.contains(key));
    }
}

pub fn paint_draw_list(
    ctx: &egui::Context,
    painter: &egui::Painter,
    list: &DrawList,
    scale: f32,
    textures: &mut TextureCache,
) {
    let to_pos = |v: Vector2| pos2(v.x * scale, v.y * scale);
    let to_stroke = |s: &Stroke| egui::Stroke::new(s.width * scale, Color32::from(s.color));

    for command in list.commands() {
        match command {
            DrawCommand::Rect {
                pos,
                size,
                fill,
                stroke,
            } => {
                let min = to_pos(*pos);
                let max = to_pos(*pos + *size);
                let corners = vec![min, pos2(max.x, min.y), max, pos2(min.x, max.y)];
                if let Some(fill) = fill {
                    painter.add(Shape::convex_polygon(
                        corners.clone(),
                        Color32::from(*fill),
                        egui::Stroke::NONE,
                    ));
                }
                if let Some(stroke) = stroke {
                    painter.add(Shape::closed_line(corners, to_stroke(stroke)));
                }
            }
            DrawCommand::Circle {
                center,
                radius,
                fill,
                stroke,
            } => {
                let center = to_pos(*center);
                let radius = radius * scale;
                if let Some(fill) = fill {
                    painter.circle_filled(center, radius, Color32::from(*fill));
                }
                if let Some(stroke) = stroke {
                    painter.circle_stroke(center, radius, to_stroke(stroke));
                }
            }
            DrawCommand::Path { points, stroke } => {
                let points: Vec<Pos2> = points.iter().copied().map(to_pos).collect();
                painter.add(Shape::line(points, to_stroke(stroke)));
            }
            DrawCommand::Text {
                text,
                pos,
                color,
                font,
            } => {
                painter.text(
                    to_pos(*pos),
                    Align2::LEFT_TOP,
                    text,
                    font_id(font, scale),
                    Color32::from(*color),
                );
            }
            DrawCommand::Image {
                image,
                pos,
                size,
                smoothing,
            } => {
                let Some(texture_id) = textures.texture_for(ctx, image, *smoothing) else {
                    continue;
                };
                let rect = Rect::from_min_max(to_pos(*pos), to_pos(*pos + *size));
                let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
                painter.image(texture_id, rect, uv, Color32::WHITE);
            }
        }
    }
}

fn font_id(font: &Font, scale: f32) -> FontId {
    let family = match font.family.to_ascii_lowercase().as_str() {
        "monospace" | "mono" | "courier" => FontFamily::Monospace,
        _ => FontFamily::Proportional,
    };
    FontId::new(font.size * scale, family)
}
