use std::collections::BTreeMap;
use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use super::animation::{
    AnimationSettings, Destroyable, Scalable, Transformable, animate_delta_position, animate_position,
    animate_scale,
};
use super::edge::Edge;
use super::error::{NetworkError, Result};
use super::node::Node;
use super::portrait::{PortraitLoader, PortraitState};
use super::surface::Surface;
use super::types::{ConnectionStyle, EdgeRef, EdgeStyle, NodeRef, SpawnStyle};
use super::viewport::Viewport;

pub const ORIGIN_LABEL: &str = "You";

/// How node radii reach their style radius.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Growth {
    /// Nodes stay at radius 0 until growth is chosen.
    #[default]
    Pending,
    /// Nodes grow a step per frame.
    Animated,
    /// Nodes snap straight to their full radius, including ones added later.
    Immediate,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameCounts {
    pub visible_nodes: usize,
    pub visible_edges: usize,
}

/// Owns the drawn entities and the viewport.
pub struct NetworkGraphics {
    nodes: BTreeMap<String, Node>,
    edges: BTreeMap<String, Edge>,
    center: Option<String>,
    /// World point new nodes spawn around; the origin as first laid out.
    spawn_center: Vec2,
    viewport: Viewport,
    pan_anchor: Option<Vec2>,
    /// Set while the view glides to put the center node on the origin.
    focusing: bool,
    portraits: PortraitLoader,
    rng: StdRng,
}

impl NetworkGraphics {
    /// `origin` is the screen-space focal point; new nodes spawn around it.
    pub fn new(screen: Vec2, origin: Vec2, portraits: PortraitLoader, seed: u64) -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            center: None,
            spawn_center: origin,
            viewport: Viewport::new(screen, origin),
            pan_anchor: None,
            focusing: false,
            portraits,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Spawn point for a new node: the origin itself for the Origin node,
    /// otherwise a random direction at up to `spawn_radius`.
    fn spawn_position(&mut self, is_origin: bool, spawn: &SpawnStyle) -> Vec2 {
        let factor = if is_origin {
            0.0
        } else if spawn.randomize_spawn_radius {
            self.rng.random::<f32>()
        } else {
            1.0
        };
        let angle = self.rng.random_range(0.0..TAU);
        self.spawn_center + factor * vec2(angle.sin(), angle.cos()) * spawn.spawn_radius * factor
    }

    pub fn initialize_node(&mut self, node: &NodeRef, style: &ConnectionStyle, spawn: &SpawnStyle) -> Result<&Node> {
        if self.nodes.contains_key(&node.id) {
            return Err(NetworkError::DuplicateNode(node.id.clone()));
        }
        if node.is_origin()
            && let Some(first) = &self.center
        {
            return Err(NetworkError::MultipleOrigins {
                first: first.clone(),
                second: node.id.clone(),
            });
        }

        let position = self.spawn_position(node.is_origin(), spawn);
        let label = if node.is_origin() { ORIGIN_LABEL } else { node.label.as_str() };
        let entity = Node::new(
            &node.id,
            label,
            node.connection_type.clone(),
            position,
            0.0,
            &style.node_style,
        );

        if node.is_origin() {
            self.center = Some(node.id.clone());
        }
        debug!(node = %node.id, x = position.x, y = position.y, "node spawned");
        Ok(self.nodes.entry(node.id.clone()).or_insert(entity))
    }

    pub fn initialize_edge(&mut self, edge: &EdgeRef, style: &EdgeStyle) -> Result<&Edge> {
        if self.edges.contains_key(&edge.id) {
            return Err(NetworkError::DuplicateEdge(edge.id.clone()));
        }
        let cell_of = |id: &str| {
            self.nodes
                .get(id)
                .map(|node| node.position_cell().clone())
                .ok_or_else(|| NetworkError::InvalidEdge {
                    edge: edge.id.clone(),
                    node: id.to_owned(),
                })
        };
        let position_a = cell_of(&edge.source)?;
        let position_b = cell_of(&edge.target)?;

        let entity = Edge::new(
            &edge.id,
            &edge.source,
            &edge.target,
            edge.connection_type.clone(),
            position_a,
            position_b,
            style,
        );
        Ok(self.edges.entry(edge.id.clone()).or_insert(entity))
    }

    /// Removes the node and every edge touching it. Returns the removed edge
    /// ids.
    pub fn remove_node(&mut self, node_id: &str) -> Result<Vec<String>> {
        let mut node = self
            .nodes
            .remove(node_id)
            .ok_or_else(|| NetworkError::UnknownNode(node_id.to_owned()))?;
        node.destroy();
        if self.center.as_deref() == Some(node_id) {
            self.center = None;
        }

        let incident: Vec<String> = self
            .edges
            .values()
            .filter(|edge| edge.touches(node_id))
            .map(|edge| edge.id().to_owned())
            .collect();
        for edge_id in &incident {
            if let Some(mut edge) = self.edges.remove(edge_id) {
                edge.destroy();
            }
        }
        Ok(incident)
    }

    pub fn remove_edge(&mut self, edge_id: &str) -> bool {
        match self.edges.remove(edge_id) {
            Some(mut edge) => {
                edge.destroy();
                true
            }
            None => false,
        }
    }

    pub fn check_center_node_exists(&self) -> Result<()> {
        match &self.center {
            Some(id) if self.nodes.contains_key(id) => Ok(()),
            _ => Err(NetworkError::MissingCenterNode),
        }
    }

    /// Points each edge back at its endpoints' current node positions.
    pub fn relink_edges(&mut self) {
        for edge in self.edges.values_mut() {
            let (Some(a), Some(b)) = (self.nodes.get(edge.source()), self.nodes.get(edge.target())) else {
                continue;
            };
            let (current_a, current_b) = edge.position_refs();
            if !current_a.shares_storage_with(a.position_cell())
                || !current_b.shares_storage_with(b.position_cell())
            {
                edge.bind_positions(a.position_cell().clone(), b.position_cell().clone());
            }
        }
    }

    /// Grows every node one step toward its style radius.
    pub fn animate_in(&mut self, settings: AnimationSettings) {
        for node in self.nodes.values_mut() {
            let target = node.target_radius();
            animate_scale(node, target, settings);
        }
    }

    /// Puts every node at its style radius at once.
    pub fn show_full_size(&mut self) {
        for node in self.nodes.values_mut() {
            let target = node.target_radius();
            if node.scale() != target {
                node.scale_to(target);
            }
        }
    }

    fn receive_portraits(&mut self) {
        for loaded in self.portraits.drain() {
            let Some(node) = self.nodes.get_mut(&loaded.node_id) else {
                continue;
            };
            match loaded.result {
                Ok(image) => node.set_portrait(PortraitState::Ready(std::sync::Arc::new(image))),
                Err(err) => {
                    warn!(node = %loaded.node_id, %err, "portrait unavailable, keeping solid fill");
                    node.set_portrait(PortraitState::Failed);
                }
            }
        }
    }

    pub fn update(&mut self, growth: Growth) -> FrameCounts {
        match growth {
            Growth::Pending => {}
            Growth::Animated => self.animate_in(AnimationSettings::default()),
            Growth::Immediate => self.show_full_size(),
        }
        if self.focusing {
            self.step_focus();
        }
        self.receive_portraits();

        let mut counts = FrameCounts::default();
        for node in self.nodes.values_mut() {
            if node.update(&self.viewport, &mut self.portraits) {
                counts.visible_nodes += 1;
            }
        }
        for edge in self.edges.values_mut() {
            if edge.update(&self.viewport) {
                counts.visible_edges += 1;
            }
        }
        counts
    }

    /// Edges first so nodes sit on top of them.
    pub fn draw(&self, surface: &mut dyn Surface) {
        for edge in self.edges.values() {
            edge.draw(surface, &self.viewport);
        }
        for node in self.nodes.values() {
            node.draw(surface, &self.viewport);
        }
    }

    pub fn destroy(&mut self) {
        for node in self.nodes.values_mut() {
            node.destroy();
        }
        for edge in self.edges.values_mut() {
            edge.destroy();
        }
        self.nodes.clear();
        self.edges.clear();
        self.center = None;
        self.pan_anchor = None;
        self.focusing = false;
    }

    pub fn zoom_by_wheel(&mut self, delta_y: f32) {
        self.viewport.zoom_by_wheel(delta_y);
    }

    pub fn begin_pan(&mut self, pointer: Vec2) {
        self.focusing = false;
        self.pan_anchor = Some(pointer);
    }

    /// Starts gliding the view until the center node sits on the origin.
    pub fn focus_center(&mut self) {
        self.focusing = self.center_node().is_some();
    }

    pub fn is_focusing(&self) -> bool {
        self.focusing
    }

    fn step_focus(&mut self) {
        let Some(center) = self.center_node().map(Node::position) else {
            self.focusing = false;
            return;
        };
        let target = self.viewport.origin() - center * self.viewport.scale();
        if animate_position(&mut self.viewport, target, AnimationSettings::default()) {
            self.focusing = false;
        }
    }

    /// Smoothly pans one step of the way toward `offset + delta`.
    pub fn nudge_view(&mut self, delta: Vec2) {
        self.focusing = false;
        animate_delta_position(&mut self.viewport, delta, AnimationSettings::default());
    }

    /// Pans by the raw pointer movement since the last call.
    pub fn pan_to(&mut self, pointer: Vec2) -> bool {
        let Some(anchor) = self.pan_anchor else {
            return false;
        };
        self.viewport.pan_by(pointer - anchor);
        self.pan_anchor = Some(pointer);
        true
    }

    pub fn end_pan(&mut self) {
        self.pan_anchor = None;
    }

    pub fn is_panning(&self) -> bool {
        self.pan_anchor.is_some()
    }

    /// Topmost node under a screen-space point.
    pub fn node_at(&self, screen: Vec2) -> Option<&str> {
        let world = self.viewport.screen_to_world(screen);
        self.nodes
            .values()
            .rev()
            .find(|node| node.contains(world))
            .map(Node::id)
    }

    /// Resizes the view; the origin keeps its relative place on screen.
    pub fn set_screen_size(&mut self, screen: Vec2) {
        self.viewport.set_screen_size(screen);
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn origin(&self) -> Vec2 {
        self.viewport.origin()
    }

    pub fn center_node(&self) -> Option<&Node> {
        self.nodes.get(self.center.as_deref()?)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn edge_mut(&mut self, id: &str) -> Option<&mut Edge> {
        self.edges.get_mut(id)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    pub fn edge_ids(&self) -> Vec<String> {
        self.edges.keys().cloned().collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::defaults::example_network;
    use crate::network::surface::recording::RecordingSurface;
    use crate::network::types::{ConnectionType, NetworkData};

    fn graphics() -> NetworkGraphics {
        let screen = vec2(800.0, 600.0);
        NetworkGraphics::new(screen, screen * 0.5, PortraitLoader::default(), 7)
    }

    fn populate(graphics: &mut NetworkGraphics, data: &NetworkData) {
        for node in &data.nodes {
            let style = data.style.connection(&node.connection_type).expect("style");
            graphics
                .initialize_node(node, style, &data.style.network)
                .expect("node");
        }
        for edge in &data.edges {
            let style = data.style.connection(&edge.connection_type).expect("style");
            graphics.initialize_edge(edge, &style.edge_style).expect("edge");
        }
    }

    #[test]
    fn origin_spawns_on_origin_and_is_labelled_you() {
        let data = example_network();
        let mut graphics = graphics();
        populate(&mut graphics, &data);

        let center = graphics.center_node().expect("center");
        assert_eq!(center.position(), graphics.origin());
        assert_eq!(center.label(), ORIGIN_LABEL);
        assert!(graphics.check_center_node_exists().is_ok());
    }

    #[test]
    fn fixed_spawn_radius_places_nodes_on_the_ring() {
        let mut data = example_network();
        data.style.network.randomize_spawn_radius = false;
        let mut graphics = graphics();
        populate(&mut graphics, &data);

        for node in graphics.nodes().filter(|node| !node.is_origin()) {
            let distance = (node.position() - graphics.origin()).length();
            assert!((distance - data.style.network.spawn_radius).abs() < 1e-2);
        }
    }

    #[test]
    fn focus_glides_the_center_node_onto_the_origin() {
        let data = example_network();
        let mut graphics = graphics();
        populate(&mut graphics, &data);
        let shifted = graphics.origin() + vec2(120.0, -60.0);
        graphics.node_mut("1").expect("center").move_to(shifted);

        graphics.focus_center();
        let mut frames = 0;
        while graphics.is_focusing() {
            graphics.update(Growth::Pending);
            frames += 1;
            assert!(frames < 500);
        }
        let on_screen = graphics.viewport().world_to_screen(shifted);
        assert!((on_screen - graphics.origin()).length() < 0.5);

        graphics.focus_center();
        graphics.begin_pan(Vec2::ZERO);
        assert!(!graphics.is_focusing());
    }

    #[test]
    fn nudge_moves_a_tenth_of_the_way() {
        let mut graphics = graphics();
        let before = graphics.viewport().offset();
        graphics.nudge_view(vec2(20.0, 0.0));
        assert!((graphics.viewport().offset() - (before + vec2(2.0, 0.0))).length() < 1e-3);
    }

    #[test]
    fn second_origin_is_rejected() {
        let data = example_network();
        let mut graphics = graphics();
        populate(&mut graphics, &data);

        let impostor = NodeRef::new("99", "Mallory", ConnectionType::Origin);
        let style = data.style.connection(&ConnectionType::Origin).expect("style");
        let result = graphics.initialize_node(&impostor, style, &data.style.network);
        assert!(matches!(result, Err(NetworkError::MultipleOrigins { .. })));
        assert!(graphics.node("99").is_none());
    }

    #[test]
    fn edge_with_missing_endpoint_fails() {
        let data = example_network();
        let mut graphics = graphics();
        populate(&mut graphics, &data);

        let edge = EdgeRef::new("77", "1", "404", ConnectionType::Friend);
        let style = &data.style.connection(&ConnectionType::Friend).expect("style").edge_style;
        assert!(matches!(
            graphics.initialize_edge(&edge, style),
            Err(NetworkError::InvalidEdge { .. })
        ));
    }

    #[test]
    fn removing_a_node_removes_exactly_its_edges() {
        let data = example_network();
        let mut graphics = graphics();
        populate(&mut graphics, &data);

        let mut removed = graphics.remove_node("6").expect("removed");
        removed.sort();
        assert_eq!(removed, vec!["11", "12", "13", "14", "15"]);
        assert_eq!(graphics.node_count(), data.nodes.len() - 1);
        assert_eq!(graphics.edge_count(), data.edges.len() - 5);
        assert!(graphics.edges().all(|edge| !edge.touches("6")));
    }

    #[test]
    fn grow_in_reaches_style_radius() {
        let data = example_network();
        let mut graphics = graphics();
        populate(&mut graphics, &data);

        for _ in 0..500 {
            graphics.update(Growth::Animated);
        }
        for node in graphics.nodes() {
            assert_eq!(node.scale(), node.target_radius());
        }
    }

    #[test]
    fn immediate_growth_covers_late_nodes() {
        let data = example_network();
        let mut graphics = graphics();
        populate(&mut graphics, &data);
        graphics.update(Growth::Immediate);
        assert!(graphics.nodes().all(|node| node.scale() == node.target_radius()));

        let late = NodeRef::new("42", "Late", ConnectionType::Friend);
        let style = data.style.connection(&ConnectionType::Friend).expect("style");
        graphics.initialize_node(&late, style, &data.style.network).expect("node");
        assert_eq!(graphics.node("42").expect("late").scale(), 0.0);
        graphics.update(Growth::Immediate);
        let late = graphics.node("42").expect("late");
        assert_eq!(late.scale(), late.target_radius());
    }

    #[test]
    fn resize_keeps_the_origin_centered() {
        let mut graphics = graphics();
        graphics.set_screen_size(vec2(1200.0, 900.0));
        assert_eq!(graphics.origin(), vec2(600.0, 450.0));
        assert_eq!(graphics.viewport().screen_size(), vec2(1200.0, 900.0));
    }

    #[test]
    fn draws_edges_below_nodes() {
        let data = example_network();
        let mut graphics = graphics();
        populate(&mut graphics, &data);
        for _ in 0..200 {
            graphics.update(Growth::Animated);
        }

        let mut surface = RecordingSurface::default();
        graphics.draw(&mut surface);
        let first_circle = surface
            .calls
            .iter()
            .position(|call| !matches!(call, crate::network::surface::recording::DrawCall::Line { .. }))
            .expect("node drawn");
        assert!(surface.lines() > 0);
        assert!(surface.calls[..first_circle]
            .iter()
            .all(|call| matches!(call, crate::network::surface::recording::DrawCall::Line { .. })));
    }

    #[test]
    fn pan_follows_pointer_deltas() {
        let mut graphics = graphics();
        let before = graphics.viewport().offset();
        assert!(!graphics.pan_to(vec2(10.0, 10.0)));
        graphics.begin_pan(vec2(10.0, 10.0));
        graphics.pan_to(vec2(25.0, 5.0));
        graphics.pan_to(vec2(30.0, 5.0));
        graphics.end_pan();
        assert_eq!(graphics.viewport().offset(), before + vec2(20.0, -5.0));
    }
}
