use eframe::egui::{Color32, Vec2};

use crate::position::PositionCell;
use crate::util::approach;

use super::animation::Destroyable;
use super::color::{color_or_fallback, with_alpha};
use super::surface::Surface;
use super::types::{ConnectionType, EdgeStyle, LineStyle};
use super::viewport::Viewport;

const FADE_RATE: f32 = 0.05;
const FADE_TOLERANCE: f32 = 0.01;

/// A relationship line. The endpoints are shared cells, so moving either
/// node moves the segment.
pub struct Edge {
    id: String,
    source: String,
    target: String,
    connection_type: ConnectionType,
    position_a: PositionCell,
    position_b: PositionCell,
    color: Color32,
    width: f32,
    pattern: LineStyle,
    alpha: f32,
    visible: bool,
    destroyed: bool,
}

impl Edge {
    pub fn new(
        id: &str,
        source: &str,
        target: &str,
        connection_type: ConnectionType,
        position_a: PositionCell,
        position_b: PositionCell,
        style: &EdgeStyle,
    ) -> Self {
        Self {
            id: id.to_owned(),
            source: source.to_owned(),
            target: target.to_owned(),
            connection_type,
            position_a,
            position_b,
            color: color_or_fallback(&style.color),
            width: style.width,
            pattern: style.line_style,
            alpha: 0.0,
            visible: false,
            destroyed: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn connection_type(&self) -> &ConnectionType {
        &self.connection_type
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    pub fn endpoints(&self) -> (Vec2, Vec2) {
        (self.position_a.get(), self.position_b.get())
    }

    pub fn position_refs(&self) -> (&PositionCell, &PositionCell) {
        (&self.position_a, &self.position_b)
    }

    pub fn bind_positions(&mut self, position_a: PositionCell, position_b: PositionCell) {
        self.position_a = position_a;
        self.position_b = position_b;
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Culls and fades. An edge is culled only when both ends are out of view
    /// and the segment does not pass through the view either.
    pub fn update(&mut self, viewport: &Viewport) -> bool {
        if self.destroyed {
            return false;
        }

        let (a, b) = self.endpoints();
        let culled = !viewport.contains_point(a, 0.0)
            && !viewport.contains_point(b, 0.0)
            && !viewport.segment_crosses(a, b);

        if culled {
            self.alpha = 0.0;
            self.visible = false;
            return false;
        }

        self.visible = true;
        self.alpha = approach(self.alpha, 1.0, FADE_RATE, FADE_TOLERANCE);
        true
    }

    pub fn draw(&self, surface: &mut dyn Surface, viewport: &Viewport) {
        if !self.visible || self.destroyed || self.alpha <= 0.0 || self.width <= 0.0 {
            return;
        }

        let (a, b) = self.endpoints();
        surface.stroke_line(
            viewport.world_to_screen(a).to_pos2(),
            viewport.world_to_screen(b).to_pos2(),
            self.width * viewport.scale(),
            with_alpha(self.color, self.alpha),
            self.pattern,
        );
    }
}

impl Destroyable for Edge {
    fn destroy(&mut self) {
        self.destroyed = true;
        self.visible = false;
        self.alpha = 0.0;
        self.position_a = self.position_a.detached();
        self.position_b = self.position_b.detached();
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::network::surface::recording::{DrawCall, RecordingSurface};
    use crate::physics::ConstraintParams;

    fn style() -> EdgeStyle {
        EdgeStyle {
            color: "#fd85ff".to_owned(),
            width: 3.0,
            line_style: LineStyle::Dashed,
            show_arrow: false,
            show_counters: false,
            counter_color: None,
            distance_factor: None,
            physics: ConstraintParams::default(),
        }
    }

    fn edge_between(a: Vec2, b: Vec2) -> Edge {
        Edge::new(
            "1",
            "1",
            "2",
            ConnectionType::Family,
            PositionCell::new(a),
            PositionCell::new(b),
            &style(),
        )
    }

    fn view() -> Viewport {
        let screen = vec2(800.0, 600.0);
        Viewport::with_scale(screen, screen * 0.5, 1.0)
    }

    #[test]
    fn crossing_edge_is_not_culled() {
        let mut edge = edge_between(vec2(-500.0, -500.0), vec2(2000.0, 2000.0));
        assert!(edge.update(&view()));
        assert!(edge.alpha() > 0.0);
    }

    #[test]
    fn off_screen_edge_is_culled_to_zero_alpha() {
        let mut edge = edge_between(vec2(400.0, 300.0), vec2(500.0, 300.0));
        edge.update(&view());
        assert!(edge.alpha() > 0.0);

        edge.bind_positions(
            PositionCell::new(vec2(-5000.0, -5000.0)),
            PositionCell::new(vec2(-4000.0, -5000.0)),
        );
        assert!(!edge.update(&view()));
        assert_eq!(edge.alpha(), 0.0);
    }

    #[test]
    fn fade_in_is_monotonic_and_exact() {
        let mut edge = edge_between(vec2(400.0, 300.0), vec2(500.0, 300.0));
        let mut previous = edge.alpha();
        for _ in 0..1000 {
            edge.update(&view());
            assert!(edge.alpha() >= previous);
            previous = edge.alpha();
        }
        assert_eq!(edge.alpha(), 1.0);
    }

    #[test]
    fn follows_shared_endpoints() {
        let a = PositionCell::new(vec2(0.0, 0.0));
        let b = PositionCell::new(vec2(10.0, 0.0));
        let edge = Edge::new("1", "1", "2", ConnectionType::Family, a.clone(), b.clone(), &style());
        a.set(vec2(5.0, 5.0));
        assert_eq!(edge.endpoints(), (vec2(5.0, 5.0), vec2(10.0, 0.0)));
    }

    #[test]
    fn draws_with_pattern_and_scaled_width() {
        let mut viewport = view();
        viewport.zoom_to(0.5);
        let mut edge = edge_between(viewport.world_center(), viewport.world_center() + vec2(50.0, 0.0));
        edge.update(&viewport);

        let mut surface = RecordingSurface::default();
        edge.draw(&mut surface, &viewport);
        match surface.calls.as_slice() {
            [DrawCall::Line { width, pattern, .. }] => {
                assert_eq!(*width, 1.5);
                assert_eq!(*pattern, LineStyle::Dashed);
            }
            other => panic!("unexpected draw calls {other:?}"),
        }
    }
}
