use std::sync::Arc;

use eframe::egui::{Color32, ColorImage, Pos2};

use super::types::LineStyle;

/// Text placed under a node, already measured against its radius.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun<'a> {
    pub text: &'a str,
    pub center: Pos2,
    pub font_size: f32,
    pub wrap_width: f32,
    pub color: Color32,
}

/// The drawing collaborator. Coordinates are screen space.
pub trait Surface {
    fn fill_circle(&mut self, center: Pos2, radius: f32, fill: Color32);

    /// Draws `image` clipped to a circle and multiplied by `tint`. `key`
    /// identifies the image for backends that cache uploads.
    fn image_circle(&mut self, center: Pos2, radius: f32, key: &str, image: &Arc<ColorImage>, tint: Color32);

    fn stroke_line(&mut self, from: Pos2, to: Pos2, width: f32, color: Color32, pattern: LineStyle);

    fn draw_text(&mut self, run: TextRun<'_>);
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    pub enum DrawCall {
        Circle { center: Pos2, radius: f32, fill: Color32 },
        Image { center: Pos2, radius: f32, key: String, tint: Color32 },
        Line { from: Pos2, to: Pos2, width: f32, color: Color32, pattern: LineStyle },
        Text { text: String, center: Pos2, font_size: f32, color: Color32 },
    }

    #[derive(Default)]
    pub struct RecordingSurface {
        pub calls: Vec<DrawCall>,
    }

    impl RecordingSurface {
        pub fn circles(&self) -> usize {
            self.calls
                .iter()
                .filter(|call| matches!(call, DrawCall::Circle { .. } | DrawCall::Image { .. }))
                .count()
        }

        pub fn lines(&self) -> usize {
            self.calls.iter().filter(|call| matches!(call, DrawCall::Line { .. })).count()
        }

        pub fn texts(&self) -> Vec<&str> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    DrawCall::Text { text, .. } => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        }
    }

    impl Surface for RecordingSurface {
        fn fill_circle(&mut self, center: Pos2, radius: f32, fill: Color32) {
            self.calls.push(DrawCall::Circle { center, radius, fill });
        }

        fn image_circle(&mut self, center: Pos2, radius: f32, key: &str, _image: &Arc<ColorImage>, tint: Color32) {
            self.calls.push(DrawCall::Image {
                center,
                radius,
                key: key.to_owned(),
                tint,
            });
        }

        fn stroke_line(&mut self, from: Pos2, to: Pos2, width: f32, color: Color32, pattern: LineStyle) {
            self.calls.push(DrawCall::Line {
                from,
                to,
                width,
                color,
                pattern,
            });
        }

        fn draw_text(&mut self, run: TextRun<'_>) {
            self.calls.push(DrawCall::Text {
                text: run.text.to_owned(),
                center: run.center,
                font_size: run.font_size,
                color: run.color,
            });
        }
    }
}
