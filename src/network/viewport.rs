use eframe::egui::{Rect, Vec2, vec2};

use super::animation::Transformable;

pub const MIN_SCALE: f32 = 0.05;
pub const MAX_SCALE: f32 = 2.0;
pub const INITIAL_SCALE: f32 = 0.7;
pub const CULL_PADDING: f32 = 0.25;
const WHEEL_STEP: f32 = 0.1;

/// Pan/zoom state of the network container.
///
/// World space is the space nodes and bodies live in; screen space is the
/// drawing surface. `screen = offset + world * scale`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    screen: Vec2,
    origin: Vec2,
    scale: f32,
    offset: Vec2,
}

impl Viewport {
    pub fn new(screen: Vec2, origin: Vec2) -> Self {
        Self::with_scale(screen, origin, INITIAL_SCALE)
    }

    pub fn with_scale(screen: Vec2, origin: Vec2, scale: f32) -> Self {
        let scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        Self {
            screen,
            origin,
            scale,
            offset: origin * (1.0 - scale),
        }
    }

    pub fn screen_size(&self) -> Vec2 {
        self.screen
    }

    /// Resizes the surface. The origin is scaled along with it, so zoom keeps
    /// anchoring at the same relative screen point.
    pub fn set_screen_size(&mut self, screen: Vec2) {
        if screen == self.screen {
            return;
        }
        if self.screen.x > 0.0 && self.screen.y > 0.0 {
            self.origin = self.origin * screen / self.screen;
        }
        self.screen = screen;
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// World units per screen pixel; grows as the view zooms out.
    pub fn screen_space_scale(&self) -> f32 {
        1.0 / self.scale
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        self.offset + world * self.scale
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.offset) / self.scale
    }

    /// Exponential wheel zoom around the configured origin. `delta_y`
    /// follows DOM sign conventions: positive scrolls down and zooms out.
    pub fn zoom_by_wheel(&mut self, delta_y: f32) {
        let direction = if delta_y > 0.0 {
            1.0
        } else if delta_y < 0.0 {
            -1.0
        } else {
            0.0
        };
        self.zoom_to(self.scale * (-WHEEL_STEP * direction).exp());
    }

    /// Sets the scale, keeping the world point under `origin` fixed on
    /// screen.
    pub fn zoom_to(&mut self, scale: f32) {
        let scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        let anchored = self.screen_to_world(self.origin);
        self.scale = scale;
        self.offset = self.origin - anchored * scale;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    pub fn world_center(&self) -> Vec2 {
        self.screen_to_world(self.screen * 0.5)
    }

    /// The visible world rectangle grown by the cull padding.
    pub fn expanded_world_rect(&self) -> Rect {
        let half = self.screen * 0.5 * (1.0 + CULL_PADDING) * self.screen_space_scale();
        Rect::from_center_size(self.world_center().to_pos2(), half * 2.0)
    }

    /// Circular visibility test: the point is in view when it lies within the
    /// padded half-diagonal of the screen (in world units) plus `radius`.
    pub fn contains_point(&self, point: Vec2, radius: f32) -> bool {
        let half_diagonal = self.screen.length() * 0.5;
        let reach = half_diagonal * (1.0 + CULL_PADDING) * self.screen_space_scale() + radius.max(0.0);
        (point - self.world_center()).length_sq() <= reach * reach
    }

    /// Whether the segment `a`-`b` crosses the padded view rectangle. Only
    /// meaningful when both ends are already out of view.
    pub fn segment_crosses(&self, a: Vec2, b: Vec2) -> bool {
        segment_crosses_rect(self.expanded_world_rect(), a, b)
    }
}

/// The viewport's position is its pan offset.
impl Transformable for Viewport {
    fn position(&self) -> Vec2 {
        self.offset
    }

    fn move_to(&mut self, position: Vec2) {
        self.offset = position;
    }

    fn delta(&mut self, delta: Vec2) {
        self.pan_by(delta);
    }
}

/// Cheap crossing test for a segment whose ends are both outside `rect`.
///
/// The segment crosses when its ends sit in opposite corner regions, or in
/// the same horizontal or vertical band on opposite sides of the rectangle.
/// Anything else is treated as outside.
pub fn segment_crosses_rect(rect: Rect, a: Vec2, b: Vec2) -> bool {
    let min_x = a.x.min(b.x);
    let max_x = a.x.max(b.x);
    let min_y = a.y.min(b.y);
    let max_y = a.y.max(b.y);

    if max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom() {
        return false;
    }

    let left = |p: Vec2| p.x < rect.left();
    let right = |p: Vec2| p.x > rect.right();
    let above = |p: Vec2| p.y < rect.top();
    let below = |p: Vec2| p.y > rect.bottom();
    let in_columns = |p: Vec2| !left(p) && !right(p);
    let in_rows = |p: Vec2| !above(p) && !below(p);

    let corner_to_corner = (left(a) && above(a) && right(b) && below(b))
        || (right(a) && below(a) && left(b) && above(b))
        || (right(a) && above(a) && left(b) && below(b))
        || (left(a) && below(a) && right(b) && above(b));

    let across_rows = in_rows(a) && in_rows(b) && ((left(a) && right(b)) || (right(a) && left(b)));
    let across_columns =
        in_columns(a) && in_columns(b) && ((above(a) && below(b)) || (below(a) && above(b)));

    corner_to_corner || across_rows || across_columns
}

impl Default for Viewport {
    fn default() -> Self {
        let screen = vec2(800.0, 600.0);
        Self::new(screen, screen * 0.5)
    }
}
