use eframe::egui::{Color32, Vec2};

use crate::position::PositionCell;
use crate::util::approach;

use super::animation::{Destroyable, PositionBindable, Scalable, Transformable};
use super::color::{color_or_fallback, gray_tint, label_color_for, multiply};
use super::portrait::{PortraitLoader, PortraitState};
use super::surface::{Surface, TextRun};
use super::types::{ConnectionType, NodeStyle};
use super::viewport::Viewport;

/// Radius at which label metrics are used unscaled.
pub const REFERENCE_RADIUS: f32 = 40.0;
const OFFSET_BLEND: f32 = 0.1;
const OFFSET_TOLERANCE: f32 = 0.1;

const DEFAULT_HOVER_SCALE: f32 = 1.8;
const DEFAULT_TEXT_VISIBLE_RADIUS: f32 = 40.0;
const DEFAULT_FONT_SIZE: f32 = 18.0;
const DEFAULT_HOVER_TINT: f32 = 0.9;
const DEFAULT_TEXTURE_TINT: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeSettings {
    pub hover_scale: f32,
    pub text_visible_radius: f32,
    pub font_size: f32,
    pub hover_tint: f32,
    pub texture_tint: f32,
}

impl NodeSettings {
    pub fn from_style(style: &NodeStyle) -> Self {
        Self {
            hover_scale: style.hover_scale.unwrap_or(DEFAULT_HOVER_SCALE),
            text_visible_radius: style.text_visible_radius.unwrap_or(DEFAULT_TEXT_VISIBLE_RADIUS),
            font_size: style.font_size.unwrap_or(DEFAULT_FONT_SIZE),
            hover_tint: style.hover_tint.unwrap_or(DEFAULT_HOVER_TINT),
            texture_tint: style.texture_tint.unwrap_or(DEFAULT_TEXTURE_TINT),
        }
    }
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            hover_scale: DEFAULT_HOVER_SCALE,
            text_visible_radius: DEFAULT_TEXT_VISIBLE_RADIUS,
            font_size: DEFAULT_FONT_SIZE,
            hover_tint: DEFAULT_HOVER_TINT,
            texture_tint: DEFAULT_TEXTURE_TINT,
        }
    }
}

/// Animation offsets. Both start at 0, meaning "no effect yet".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Offsets {
    pub scale: f32,
    pub tint: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelLayout {
    pub font_size: f32,
    pub line_height: f32,
    pub wrap_width: f32,
}

/// Geometry computed on the last transformed update: what gets drawn and
/// what pointer hits are tested against.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeShape {
    pub center: Vec2,
    pub radius: f32,
    pub label: Option<LabelLayout>,
}

/// A person in the network.
pub struct Node {
    id: String,
    label: String,
    connection_type: ConnectionType,
    position: PositionCell,
    bound: bool,
    radius: f32,
    target_radius: f32,
    color: Color32,
    label_color: Color32,
    settings: NodeSettings,
    hovered: bool,
    emphasized: bool,
    drag_offset: Option<Vec2>,
    offsets: Offsets,
    transformed: bool,
    drawn_position: Vec2,
    visible: bool,
    portrait: PortraitState,
    shape: NodeShape,
    destroyed: bool,
}

impl Node {
    pub fn new(
        id: &str,
        label: &str,
        connection_type: ConnectionType,
        position: Vec2,
        radius: f32,
        style: &NodeStyle,
    ) -> Self {
        let color = color_or_fallback(&style.color);
        Self {
            id: id.to_owned(),
            label: label.to_owned(),
            connection_type,
            position: PositionCell::new(position),
            bound: false,
            radius,
            target_radius: style.radius,
            color,
            label_color: label_color_for(color),
            settings: NodeSettings::from_style(style),
            hovered: false,
            emphasized: false,
            drag_offset: None,
            offsets: Offsets::default(),
            transformed: true,
            drawn_position: position,
            visible: false,
            portrait: PortraitState::Unloaded,
            shape: NodeShape {
                center: position,
                ..NodeShape::default()
            },
            destroyed: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn connection_type(&self) -> &ConnectionType {
        &self.connection_type
    }

    pub fn is_origin(&self) -> bool {
        self.connection_type.is_origin()
    }

    /// Radius from the connection style; the grow-in animation ends here.
    pub fn target_radius(&self) -> f32 {
        self.target_radius
    }

    pub fn label_color(&self) -> Color32 {
        self.label_color
    }

    pub fn settings(&self) -> &NodeSettings {
        &self.settings
    }

    pub fn offsets(&self) -> Offsets {
        self.offsets
    }

    pub fn shape(&self) -> &NodeShape {
        &self.shape
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[cfg(test)]
    pub(crate) fn is_transformed(&self) -> bool {
        self.transformed
    }

    pub fn portrait(&self) -> &PortraitState {
        &self.portrait
    }

    /// The cell backing this node's position. Edges hold clones of it.
    pub fn position_cell(&self) -> &PositionCell {
        &self.position
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    /// Search emphasis; animates like a hover without owning the pointer.
    pub fn set_emphasized(&mut self, emphasized: bool) {
        self.emphasized = emphasized;
    }

    pub fn is_emphasized(&self) -> bool {
        self.emphasized
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_offset.is_some()
    }

    pub fn begin_drag(&mut self, pointer: Vec2) {
        self.drag_offset = Some(pointer - self.position.get());
    }

    /// Moves the node under the pointer. Returns the new position when a drag
    /// is active.
    pub fn drag_to(&mut self, pointer: Vec2) -> Option<Vec2> {
        let offset = self.drag_offset?;
        let target = pointer - offset;
        self.move_to(target);
        Some(target)
    }

    pub fn end_drag(&mut self) {
        self.drag_offset = None;
    }

    /// Hit test against the last computed shape, in world space.
    pub fn contains(&self, point: Vec2) -> bool {
        self.visible && (point - self.shape.center).length() <= self.shape.radius
    }

    pub fn set_portrait(&mut self, portrait: PortraitState) {
        self.portrait = portrait;
        self.transformed = true;
    }

    /// Per-frame update. Returns `false` when the node is culled.
    pub fn update(&mut self, viewport: &Viewport, portraits: &mut PortraitLoader) -> bool {
        if self.destroyed {
            return false;
        }

        let position = self.position.get();
        if !viewport.contains_point(position, self.radius) {
            self.visible = false;
            return false;
        }
        self.visible = true;

        if matches!(self.portrait, PortraitState::Unloaded) {
            self.portrait = PortraitState::Loading;
            portraits.request(&self.id, &self.label);
        }

        let lifted = self.is_hovered() || self.is_emphasized();
        let scale_target = if lifted { self.settings.hover_scale } else { 1.0 };
        let tint_target = if lifted {
            self.settings.hover_tint
        } else {
            self.settings.texture_tint
        };
        let offsets = Offsets {
            scale: approach(self.offsets.scale, scale_target, OFFSET_BLEND, OFFSET_TOLERANCE),
            tint: approach(self.offsets.tint, tint_target, OFFSET_BLEND, OFFSET_TOLERANCE),
        };

        if offsets != self.offsets || position != self.drawn_position {
            self.transformed = true;
        }
        self.offsets = offsets;

        if self.transformed {
            self.reshape(position);
            self.transformed = false;
        }
        true
    }

    fn reshape(&mut self, position: Vec2) {
        let radius = self.radius * self.offsets.scale;
        let label = (radius > self.settings.text_visible_radius).then(|| {
            let factor = radius / REFERENCE_RADIUS;
            LabelLayout {
                font_size: self.settings.font_size * factor,
                line_height: self.settings.font_size * factor,
                wrap_width: radius * 2.0,
            }
        });
        self.shape = NodeShape {
            center: position,
            radius,
            label,
        };
        self.drawn_position = position;
    }

    pub fn tint(&self) -> Color32 {
        gray_tint(self.offsets.tint)
    }

    pub fn draw(&self, surface: &mut dyn Surface, viewport: &Viewport) {
        if !self.visible || self.destroyed || self.shape.radius <= 0.0 {
            return;
        }

        let center = viewport.world_to_screen(self.shape.center).to_pos2();
        let radius = self.shape.radius * viewport.scale();
        match self.portrait.image() {
            Some(image) => surface.image_circle(center, radius, &self.id, image, self.tint()),
            None => surface.fill_circle(center, radius, multiply(self.color, self.tint())),
        }

        if let Some(layout) = self.shape.label {
            surface.draw_text(TextRun {
                text: &self.label,
                center,
                font_size: layout.font_size * viewport.scale(),
                wrap_width: layout.wrap_width * viewport.scale(),
                color: self.label_color,
            });
        }
    }
}

impl Scalable for Node {
    fn scale(&self) -> f32 {
        self.radius
    }

    fn scale_to(&mut self, scale: f32) {
        self.transformed = true;
        self.radius = scale;
    }
}

impl Transformable for Node {
    fn position(&self) -> Vec2 {
        self.position.get()
    }

    fn move_to(&mut self, position: Vec2) {
        self.transformed = true;
        self.position.set(position);
    }

    fn delta(&mut self, delta: Vec2) {
        self.transformed = true;
        self.position.set(self.position.get() + delta);
    }
}

impl PositionBindable for Node {
    fn bind_position(&mut self, cell: PositionCell) {
        self.position = cell;
        self.bound = true;
        self.transformed = true;
    }

    fn unbind_position(&mut self) {
        self.position = self.position.detached();
        self.bound = false;
    }

    fn is_position_bound(&self) -> bool {
        self.bound
    }
}

impl Destroyable for Node {
    fn destroy(&mut self) {
        self.destroyed = true;
        self.visible = false;
        self.drag_offset = None;
        self.portrait = PortraitState::Failed;
        self.unbind_position();
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::network::surface::recording::RecordingSurface;
    use crate::physics::BodyParams;

    fn style(radius: f32) -> NodeStyle {
        NodeStyle {
            color: "#ffffff".to_owned(),
            radius,
            hover_scale: None,
            hover_tint: None,
            texture_tint: None,
            text_visible_radius: None,
            font_size: None,
            physics: BodyParams::default(),
        }
    }

    fn node_at(position: Vec2, radius: f32) -> Node {
        Node::new("2", "Bob", ConnectionType::Family, position, radius, &style(radius))
    }

    fn view() -> Viewport {
        let screen = vec2(800.0, 600.0);
        Viewport::with_scale(screen, screen * 0.5, 1.0)
    }

    fn settle(node: &mut Node, viewport: &Viewport, loader: &mut PortraitLoader) -> usize {
        for frame in 1..1000 {
            let before = node.offsets();
            node.update(viewport, loader);
            if node.offsets() == before {
                return frame;
            }
        }
        panic!("offsets never settled");
    }

    #[test]
    fn defaults_apply_to_missing_style_fields() {
        let node = node_at(Vec2::ZERO, 40.0);
        assert_eq!(*node.settings(), NodeSettings::default());
        assert_eq!(node.label_color(), Color32::from_rgb(0x34, 0x34, 0x34));
    }

    #[test]
    fn culled_node_skips_all_work() {
        let mut loader = PortraitLoader::default();
        let mut node = node_at(vec2(10_000.0, 0.0), 40.0);
        assert!(!node.update(&view(), &mut loader));
        assert!(!node.is_visible());
        assert_eq!(node.offsets(), Offsets::default());
        assert!(matches!(node.portrait(), PortraitState::Unloaded));
        assert_eq!(loader.in_flight(), 0);
    }

    #[test]
    fn portrait_is_requested_once() {
        let mut loader = PortraitLoader::default();
        let mut node = node_at(vec2(400.0, 300.0), 40.0);
        node.update(&view(), &mut loader);
        node.update(&view(), &mut loader);
        assert!(matches!(node.portrait(), PortraitState::Loading));
        assert_eq!(loader.in_flight(), 1);
    }

    #[test]
    fn hover_drives_scale_offset_to_exact_target() {
        let mut loader = PortraitLoader::default();
        let viewport = view();
        let mut node = node_at(vec2(400.0, 300.0), 40.0);

        settle(&mut node, &viewport, &mut loader);
        assert_eq!(node.offsets().scale, 1.0);
        assert_eq!(node.offsets().tint, DEFAULT_TEXTURE_TINT);
        assert_eq!(node.shape().radius, 40.0);

        node.set_hovered(true);
        settle(&mut node, &viewport, &mut loader);
        assert_eq!(node.offsets().scale, DEFAULT_HOVER_SCALE);
        assert_eq!(node.offsets().tint, DEFAULT_HOVER_TINT);
        assert_eq!(node.shape().radius, 40.0 * DEFAULT_HOVER_SCALE);
    }

    #[test]
    fn label_hidden_below_threshold_and_scaled_above() {
        let mut loader = PortraitLoader::default();
        let viewport = view();

        let mut small = node_at(vec2(400.0, 300.0), 30.0);
        settle(&mut small, &viewport, &mut loader);
        assert!(small.shape().label.is_none());

        let mut large = node_at(vec2(400.0, 300.0), 80.0);
        settle(&mut large, &viewport, &mut loader);
        let layout = large.shape().label.expect("label shown");
        assert_eq!(layout.font_size, DEFAULT_FONT_SIZE * 2.0);
        assert_eq!(layout.wrap_width, 160.0);
    }

    #[test]
    fn drag_keeps_grab_offset() {
        let mut node = node_at(vec2(100.0, 100.0), 40.0);
        node.begin_drag(vec2(110.0, 95.0));
        assert_eq!(node.drag_to(vec2(210.0, 195.0)), Some(vec2(200.0, 200.0)));
        node.end_drag();
        assert_eq!(node.drag_to(vec2(0.0, 0.0)), None);
        assert_eq!(node.position(), vec2(200.0, 200.0));
    }

    #[test]
    fn setters_mark_transformed() {
        let mut loader = PortraitLoader::default();
        let viewport = view();
        let mut node = node_at(vec2(400.0, 300.0), 40.0);
        settle(&mut node, &viewport, &mut loader);
        assert!(!node.is_transformed());

        node.delta(vec2(1.0, 0.0));
        assert!(node.is_transformed());
        node.update(&viewport, &mut loader);
        assert!(!node.is_transformed());
        assert_eq!(node.shape().center, vec2(401.0, 300.0));

        node.scale_to(20.0);
        assert!(node.is_transformed());
    }

    #[test]
    fn shared_position_writes_are_redrawn() {
        let mut loader = PortraitLoader::default();
        let viewport = view();
        let mut node = node_at(vec2(400.0, 300.0), 40.0);
        settle(&mut node, &viewport, &mut loader);

        let body_side = PositionCell::new(vec2(420.0, 310.0));
        node.bind_position(body_side.clone());
        assert!(node.is_position_bound());
        node.update(&viewport, &mut loader);

        body_side.set(vec2(430.0, 320.0));
        node.update(&viewport, &mut loader);
        assert_eq!(node.shape().center, vec2(430.0, 320.0));

        node.unbind_position();
        body_side.set(Vec2::ZERO);
        assert_eq!(node.position(), vec2(430.0, 320.0));
        assert!(!node.is_position_bound());
    }

    #[test]
    fn draws_circle_then_label() {
        let mut loader = PortraitLoader::default();
        let viewport = view();
        let mut node = node_at(vec2(400.0, 300.0), 80.0);
        settle(&mut node, &viewport, &mut loader);

        let mut surface = RecordingSurface::default();
        node.draw(&mut surface, &viewport);
        assert_eq!(surface.circles(), 1);
        assert_eq!(surface.texts(), vec!["Bob"]);
    }
}
