use std::collections::HashMap;
use std::f32::consts::TAU;
use std::sync::Arc;

use eframe::egui::epaint::Vertex;
use eframe::egui::{
    Color32, ColorImage, FontId, Mesh, Painter, Pos2, Rect, Shape, Stroke, TextureHandle,
    TextureOptions, Vec2, pos2,
};

use crate::network::surface::{Surface, TextRun};
use crate::network::LineStyle;

const BACKGROUND_DARK: Color32 = Color32::from_rgb(0x11, 0x11, 0x11);
const BACKGROUND_GOLD: Color32 = Color32::from_rgb(0xF3, 0xC6, 0x23);
const GRID_DOT: Color32 = Color32::from_rgb(0x55, 0x55, 0x55);
const GRID_SPACING: f32 = 20.0;
const CIRCLE_SEGMENTS: usize = 48;

/// Vertical gradient backdrop with a fixed dot grid on top.
pub(super) fn draw_background(painter: &Painter, rect: Rect) {
    let stops = [
        (0.0, BACKGROUND_DARK),
        (0.3, BACKGROUND_DARK),
        (1.0, BACKGROUND_GOLD),
    ];

    let mut mesh = Mesh::default();
    for pair in stops.windows(2) {
        let (from_t, from_color) = pair[0];
        let (to_t, to_color) = pair[1];
        let top = rect.top() + rect.height() * from_t;
        let bottom = rect.top() + rect.height() * to_t;

        let base = mesh.vertices.len() as u32;
        mesh.colored_vertex(pos2(rect.left(), top), from_color);
        mesh.colored_vertex(pos2(rect.right(), top), from_color);
        mesh.colored_vertex(pos2(rect.right(), bottom), to_color);
        mesh.colored_vertex(pos2(rect.left(), bottom), to_color);
        mesh.add_triangle(base, base + 1, base + 2);
        mesh.add_triangle(base, base + 2, base + 3);
    }
    painter.add(Shape::mesh(mesh));

    let mut x = rect.left();
    while x < rect.right() {
        let mut y = rect.top();
        while y < rect.bottom() {
            painter.circle_filled(pos2(x, y), GRID_SPACING / 15.0, GRID_DOT);
            y += GRID_SPACING;
        }
        x += GRID_SPACING;
    }
}

/// [`Surface`] backed by an egui painter. Network screen coordinates are
/// relative to the graph rect, so everything is shifted by `offset`.
pub(super) struct EguiSurface<'a> {
    painter: &'a Painter,
    offset: Vec2,
    textures: &'a mut HashMap<String, TextureHandle>,
}

impl<'a> EguiSurface<'a> {
    pub(super) fn new(
        painter: &'a Painter,
        offset: Vec2,
        textures: &'a mut HashMap<String, TextureHandle>,
    ) -> Self {
        Self {
            painter,
            offset,
            textures,
        }
    }

    fn place(&self, point: Pos2) -> Pos2 {
        point + self.offset
    }
}

impl Surface for EguiSurface<'_> {
    fn fill_circle(&mut self, center: Pos2, radius: f32, fill: Color32) {
        self.painter.circle_filled(self.place(center), radius, fill);
    }

    fn image_circle(
        &mut self,
        center: Pos2,
        radius: f32,
        key: &str,
        image: &Arc<ColorImage>,
        tint: Color32,
    ) {
        let ctx = self.painter.ctx().clone();
        let texture_id = self
            .textures
            .entry(key.to_owned())
            .or_insert_with(|| {
                ctx.load_texture(
                    format!("portrait-{key}"),
                    ColorImage::clone(image),
                    TextureOptions::LINEAR,
                )
            })
            .id();

        let center = self.place(center);
        let mut mesh = Mesh::with_texture(texture_id);
        mesh.vertices.push(Vertex {
            pos: center,
            uv: pos2(0.5, 0.5),
            color: tint,
        });
        for segment in 0..=CIRCLE_SEGMENTS {
            let angle = segment as f32 / CIRCLE_SEGMENTS as f32 * TAU;
            let direction = Vec2::angled(angle);
            mesh.vertices.push(Vertex {
                pos: center + direction * radius,
                uv: pos2(0.5 + direction.x * 0.5, 0.5 + direction.y * 0.5),
                color: tint,
            });
        }
        for segment in 1..=CIRCLE_SEGMENTS as u32 {
            mesh.add_triangle(0, segment, segment + 1);
        }
        self.painter.add(Shape::mesh(mesh));
    }

    fn stroke_line(&mut self, from: Pos2, to: Pos2, width: f32, color: Color32, pattern: LineStyle) {
        let points = [self.place(from), self.place(to)];
        let stroke = Stroke::new(width, color);
        match pattern {
            LineStyle::Solid => {
                self.painter.line_segment(points, stroke);
            }
            LineStyle::Dashed => {
                let dash = (width * 3.0).max(4.0);
                self.painter
                    .extend(Shape::dashed_line(&points, stroke, dash, dash * 0.75));
            }
            LineStyle::Dotted => {
                let radius = (width * 0.5).max(1.0);
                self.painter
                    .extend(Shape::dotted_line(&points, color, radius * 4.0, radius));
            }
        }
    }

    fn draw_text(&mut self, run: TextRun<'_>) {
        if run.font_size < 1.0 {
            return;
        }
        let galley = self.painter.layout(
            run.text.to_owned(),
            FontId::proportional(run.font_size),
            run.color,
            run.wrap_width.max(1.0),
        );
        let top_left = self.place(run.center) - galley.size() * 0.5;
        self.painter.galley(top_left, galley, run.color);
    }
}
