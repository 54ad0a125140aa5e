//! The people network: a force-directed graph of a person and the people
//! around them, grown from the origin and kept in sync with a physics world.

pub mod animation;
pub mod attach;
pub mod color;
pub mod defaults;
pub mod dynamics;
pub mod edge;
pub mod error;
pub mod graphics;
pub mod node;
pub mod portrait;
pub mod surface;
pub mod types;
pub mod viewport;

use std::time::{Duration, Instant};

use eframe::egui::Vec2;
use tracing::{debug, error, info, warn};

use crate::physics::PhysicsWorld;

use self::animation::Transformable;
use self::attach::{AttachPoll, AttachTarget, DEFAULT_ATTACH_DELAY, IncrementalAttach};
use self::dynamics::NetworkDynamics;
use self::graphics::{FrameCounts, Growth, NetworkGraphics};
use self::portrait::PortraitLoader;
use self::surface::Surface;

pub use self::error::{NetworkError, Result};
pub use self::types::{ConnectionType, EdgeRef, LineStyle, NetworkData, NetworkStyle, NodeRef};

/// Construction flags.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NetworkSettings {
    /// Reveal the network edge by edge instead of all at once.
    pub incremental_attach: bool,
    /// Bind each entity as soon as it is attached rather than in one pass at
    /// the end. Only meaningful together with `bind_physics`.
    pub incremental_bind: bool,
    /// Share position storage between entities and bodies instead of copying
    /// body positions every frame.
    pub bind_physics: bool,
    pub attach_delay: Duration,
    /// Spawn RNG seed; random when unset.
    pub seed: Option<u64>,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            incremental_attach: false,
            incremental_bind: false,
            bind_physics: false,
            attach_delay: DEFAULT_ATTACH_DELAY,
            seed: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Constructed,
    /// Incremental attachment in progress.
    Awakening,
    Running,
    Destroyed,
}

pub struct PeopleNetwork {
    data: NetworkData,
    settings: NetworkSettings,
    lifecycle: Lifecycle,
    growth: Growth,
    graphics: NetworkGraphics,
    dynamics: NetworkDynamics,
    attach: Option<IncrementalAttach>,
    attach_error: Option<NetworkError>,
    dragging: Option<String>,
    hovered: Option<String>,
}

/// Adapter the attach controller writes through: graphics first, then the
/// body, undoing the graphics side if the body cannot be made.
struct Attacher<'a> {
    style: &'a NetworkStyle,
    graphics: &'a mut NetworkGraphics,
    dynamics: &'a mut NetworkDynamics,
}

impl Attacher<'_> {
    fn add_node(&mut self, node: &NodeRef) -> Result<()> {
        let style = self.style.connection(&node.connection_type)?;
        let position = self
            .graphics
            .initialize_node(node, style, &self.style.network)?
            .position();
        if let Err(err) = self.dynamics.create_node(node, position, style) {
            self.graphics.remove_node(&node.id)?;
            return Err(err);
        }
        Ok(())
    }

    fn add_edge(&mut self, edge: &EdgeRef) -> Result<()> {
        let style = &self.style.connection(&edge.connection_type)?.edge_style;
        self.graphics.initialize_edge(edge, style)?;
        if let Err(err) = self.dynamics.create_edge_constraint(edge, style) {
            self.graphics.remove_edge(&edge.id);
            return Err(err);
        }
        Ok(())
    }
}

impl AttachTarget for Attacher<'_> {
    fn attach_node(&mut self, node: &NodeRef) -> Result<()> {
        self.add_node(node)
    }

    fn attach_edge(&mut self, edge: &EdgeRef) -> Result<()> {
        self.add_edge(edge)
    }

    fn bind_node(&mut self, node_id: &str) -> Result<()> {
        self.dynamics.bind_node(self.graphics, node_id)
    }

    fn bind_edge(&mut self, edge_id: &str) -> Result<()> {
        self.dynamics.bind_edge(self.graphics, edge_id)
    }

    fn check_center(&self) -> Result<()> {
        self.graphics.check_center_node_exists()
    }
}

impl PeopleNetwork {
    /// `screen` is the drawing surface size and `origin` the screen point the
    /// network grows from and zooms around.
    pub fn new(
        data: NetworkData,
        screen: Vec2,
        origin: Vec2,
        world: Box<dyn PhysicsWorld>,
        portraits: PortraitLoader,
        settings: NetworkSettings,
    ) -> Self {
        let seed = settings.seed.unwrap_or_else(rand::random);
        Self {
            data,
            settings,
            lifecycle: Lifecycle::Constructed,
            growth: Growth::Pending,
            graphics: NetworkGraphics::new(screen, origin, portraits, seed),
            dynamics: NetworkDynamics::new(world),
            attach: None,
            attach_error: None,
            dragging: None,
            hovered: None,
        }
    }

    fn attacher(&mut self) -> (Attacher<'_>, &mut Option<IncrementalAttach>) {
        (
            Attacher {
                style: &self.data.style,
                graphics: &mut self.graphics,
                dynamics: &mut self.dynamics,
            },
            &mut self.attach,
        )
    }

    /// Starts the physics runner and builds the network, either all at once
    /// or by handing off to the incremental controller. Fatal data problems
    /// are returned here.
    pub fn awake(&mut self, now: Instant) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Constructed => {}
            Lifecycle::Destroyed => return Err(NetworkError::Destroyed),
            _ => return Ok(()),
        }
        self.dynamics.awake(true);

        if self.settings.incremental_attach {
            let bind_incrementally = self.settings.bind_physics && self.settings.incremental_bind;
            self.attach = Some(IncrementalAttach::new(
                &self.data,
                self.settings.attach_delay,
                bind_incrementally,
            )?);
            self.lifecycle = Lifecycle::Awakening;
            info!(nodes = self.data.nodes.len(), "incremental attach started");
            self.poll_attach(now)?;
            return Ok(());
        }

        self.initialize_eagerly()?;
        if self.settings.bind_physics {
            self.dynamics.bind_all(&mut self.graphics);
        }
        self.lifecycle = Lifecycle::Running;
        info!(
            nodes = self.graphics.node_count(),
            edges = self.graphics.edge_count(),
            "network initialized"
        );
        Ok(())
    }

    fn initialize_eagerly(&mut self) -> Result<()> {
        let style = &self.data.style;
        for node in &self.data.nodes {
            let connection = style.connection(&node.connection_type)?;
            self.graphics.initialize_node(node, connection, &style.network)?;
        }
        for edge in &self.data.edges {
            let connection = style.connection(&edge.connection_type)?;
            self.graphics.initialize_edge(edge, &connection.edge_style)?;
        }
        self.graphics.check_center_node_exists()?;

        for node in &self.data.nodes {
            let connection = style.connection(&node.connection_type)?;
            let position = self
                .graphics
                .node(&node.id)
                .map(|entity| entity.position())
                .ok_or_else(|| NetworkError::UnknownNode(node.id.clone()))?;
            self.dynamics.create_node(node, position, connection)?;
        }
        for edge in &self.data.edges {
            let connection = style.connection(&edge.connection_type)?;
            self.dynamics.create_edge_constraint(edge, &connection.edge_style)?;
        }
        Ok(())
    }

    fn poll_attach(&mut self, now: Instant) -> Result<()> {
        let (mut attacher, attach) = self.attacher();
        let Some(controller) = attach.as_mut() else {
            return Ok(());
        };

        match controller.poll(&mut attacher, now)? {
            AttachPoll::Pending => return Ok(()),
            AttachPoll::Complete { .. } => {}
            AttachPoll::Incomplete(err) => self.attach_error = Some(err),
        }

        if self.settings.bind_physics && !self.settings.incremental_bind {
            self.dynamics.bind_all(&mut self.graphics);
        }
        self.attach = None;
        self.lifecycle = Lifecycle::Running;
        Ok(())
    }

    /// Enables the grow-in animation.
    pub fn setup(&mut self) {
        self.growth = Growth::Animated;
    }

    /// Skips the grow-in: nodes are drawn at full size from the next frame.
    pub fn show_full_size(&mut self) {
        self.growth = Growth::Immediate;
    }

    /// One frame: advance the attach controller and the physics runner, sync
    /// positions, then update every node and edge.
    pub fn update(&mut self, frame_ms: f32, now: Instant) -> Result<FrameCounts> {
        if self.lifecycle == Lifecycle::Destroyed {
            return Ok(FrameCounts::default());
        }
        if self.lifecycle == Lifecycle::Awakening {
            self.poll_attach(now)?;
        }

        self.dynamics.advance(frame_ms);
        if !self.is_fully_bound() {
            self.dynamics.pull(&mut self.graphics);
        }
        Ok(self.graphics.update(self.growth))
    }

    /// Whether entities currently alias body storage. In bind mode with a
    /// batch bind this is false until attachment finishes.
    fn is_fully_bound(&self) -> bool {
        self.settings.bind_physics && (self.settings.incremental_bind || self.attach.is_none())
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        if self.lifecycle != Lifecycle::Destroyed {
            self.graphics.draw(surface);
        }
    }

    /// Adds a node to the data and materializes it. Nothing changes on error.
    pub fn add_node(&mut self, node: NodeRef) -> Result<()> {
        self.ensure_alive()?;
        if node.is_origin()
            && let Some(existing) = self.data.nodes.iter().find(|known| known.is_origin())
        {
            return Err(NetworkError::MultipleOrigins {
                first: existing.id.clone(),
                second: node.id,
            });
        }

        let bind = self.is_fully_bound();
        let (mut attacher, _) = self.attacher();
        attacher.add_node(&node)?;
        if bind && let Err(err) = attacher.bind_node(&node.id) {
            warn!(node = %node.id, %err, "new node left unbound");
        }

        if self.data.node(&node.id).is_none() {
            self.data.nodes.push(node);
        }
        Ok(())
    }

    /// Adds an edge between two materialized nodes. Nothing changes on error.
    pub fn add_edge(&mut self, edge: EdgeRef) -> Result<()> {
        self.ensure_alive()?;
        let bind = self.is_fully_bound();
        let (mut attacher, _) = self.attacher();
        attacher.add_edge(&edge)?;
        if bind && let Err(err) = attacher.bind_edge(&edge.id) {
            warn!(edge = %edge.id, %err, "new edge left unbound");
        }

        if !self.data.edges.iter().any(|known| known.id == edge.id) {
            self.data.edges.push(edge);
        }
        Ok(())
    }

    /// Removes a node, its incident edges, its constraints and its body.
    /// Aborts without changes when the node has no body.
    pub fn remove_node(&mut self, node_id: &str) -> Result<()> {
        self.ensure_alive()?;
        if self.graphics.node(node_id).is_none() {
            return Err(NetworkError::UnknownNode(node_id.to_owned()));
        }
        if self.dynamics.body_of(node_id).is_none() {
            error!(node = node_id, "body not found for node");
            return Err(NetworkError::MissingBody(node_id.to_owned()));
        }

        let constraints = self.dynamics.remove_node(node_id)?;
        let edges = self.graphics.remove_node(node_id)?;
        for edge_id in &edges {
            self.dynamics.remove_edge_constraint(edge_id);
        }

        self.data.nodes.retain(|node| node.id != node_id);
        self.data.edges.retain(|edge| !edge.touches(node_id));
        if self.dragging.as_deref() == Some(node_id) {
            self.dragging = None;
        }
        if self.hovered.as_deref() == Some(node_id) {
            self.hovered = None;
        }
        debug!(node = node_id, edges = edges.len(), constraints, "node removed");
        Ok(())
    }

    pub fn destroy(&mut self) {
        if self.lifecycle == Lifecycle::Destroyed {
            return;
        }
        self.graphics.destroy();
        self.dynamics.destroy();
        self.attach = None;
        self.dragging = None;
        self.hovered = None;
        self.lifecycle = Lifecycle::Destroyed;
        info!("network destroyed");
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.lifecycle == Lifecycle::Destroyed {
            Err(NetworkError::Destroyed)
        } else {
            Ok(())
        }
    }

    pub fn check_center_node_exists(&self) -> Result<()> {
        self.graphics.check_center_node_exists()
    }

    /// Topmost node under a screen point.
    pub fn node_at(&self, screen: Vec2) -> Option<String> {
        self.graphics.node_at(screen).map(str::to_owned)
    }

    /// Moves the hover to the node under `screen`. Returns whether any node
    /// is hovered.
    pub fn hover_at(&mut self, screen: Option<Vec2>) -> bool {
        let target = screen.and_then(|point| self.node_at(point));
        if target != self.hovered {
            if let Some(previous) = self.hovered.take()
                && let Some(node) = self.graphics.node_mut(&previous)
            {
                node.set_hovered(false);
            }
            if let Some(id) = &target
                && let Some(node) = self.graphics.node_mut(id)
            {
                node.set_hovered(true);
            }
            self.hovered = target;
        }
        self.hovered.is_some()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Grabs the node under `screen`, if any.
    pub fn begin_drag(&mut self, screen: Vec2) -> bool {
        let Some(id) = self.node_at(screen) else {
            return false;
        };
        let world = self.graphics.viewport().screen_to_world(screen);
        if let Some(node) = self.graphics.node_mut(&id) {
            node.begin_drag(world);
            self.dragging = Some(id);
            return true;
        }
        false
    }

    /// Moves the dragged node and mirrors it into its body.
    pub fn drag_to(&mut self, screen: Vec2) {
        let Some(id) = self.dragging.clone() else {
            return;
        };
        let world = self.graphics.viewport().screen_to_world(screen);
        let Some(position) = self.graphics.node_mut(&id).and_then(|node| node.drag_to(world)) else {
            return;
        };
        if let Err(err) = self.dynamics.mirror_node_position(&id, position) {
            warn!(node = %id, %err, "drag not mirrored into physics");
        }
    }

    pub fn end_drag(&mut self) {
        if let Some(id) = self.dragging.take()
            && let Some(node) = self.graphics.node_mut(&id)
        {
            node.end_drag();
        }
    }

    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    pub fn zoom_by_wheel(&mut self, delta_y: f32) {
        self.graphics.zoom_by_wheel(delta_y);
    }

    pub fn begin_pan(&mut self, screen: Vec2) {
        self.graphics.begin_pan(screen);
    }

    pub fn pan_to(&mut self, screen: Vec2) -> bool {
        self.graphics.pan_to(screen)
    }

    pub fn end_pan(&mut self) {
        self.graphics.end_pan();
    }

    pub fn is_panning(&self) -> bool {
        self.graphics.is_panning()
    }

    /// Glides the view back so the center node sits on the origin.
    pub fn focus_center_node(&mut self) {
        self.graphics.focus_center();
    }

    pub fn is_focusing(&self) -> bool {
        self.graphics.is_focusing()
    }

    pub fn nudge_view(&mut self, delta: Vec2) {
        self.graphics.nudge_view(delta);
    }

    /// Emphasizes the given nodes, clearing everyone else.
    pub fn set_emphasized<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        let ids: std::collections::HashSet<&str> = ids.into_iter().collect();
        for node in self.graphics.nodes_mut() {
            let emphasized = ids.contains(node.id());
            node.set_emphasized(emphasized);
        }
    }

    /// Freezes the simulation; nodes keep drawing where they are.
    pub fn pause_physics(&mut self) {
        self.dynamics.stop();
    }

    pub fn resume_physics(&mut self) {
        if self.lifecycle != Lifecycle::Destroyed {
            self.dynamics.run();
        }
    }

    pub fn is_physics_running(&self) -> bool {
        self.dynamics.is_running()
    }

    /// Steps the simulation once by `delta_ms`, paused or not, and syncs the
    /// drawn positions.
    pub fn step_physics(&mut self, delta_ms: f32) {
        if self.lifecycle == Lifecycle::Destroyed {
            return;
        }
        self.dynamics.tick(delta_ms);
        if !self.is_fully_bound() {
            self.dynamics.pull(&mut self.graphics);
        }
    }

    pub fn set_screen_size(&mut self, screen: Vec2) {
        self.graphics.set_screen_size(screen);
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_network_setup(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    pub fn has_animation_started(&self) -> bool {
        self.growth == Growth::Animated
    }

    /// Nodes and edges attached so far while incremental attachment runs.
    pub fn attach_progress(&self) -> Option<(usize, usize)> {
        self.attach
            .as_ref()
            .filter(|attach| !attach.is_done())
            .map(|attach| (attach.attached_nodes(), attach.attached_edges()))
    }

    /// The last incremental-attach failure, if any.
    pub fn attach_error(&self) -> Option<&NetworkError> {
        self.attach_error.as_ref()
    }

    pub fn data(&self) -> &NetworkData {
        &self.data
    }

    pub fn graphics(&self) -> &NetworkGraphics {
        &self.graphics
    }

    pub fn dynamics(&self) -> &NetworkDynamics {
        &self.dynamics
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::network::animation::{PositionBindable, Scalable};
    use crate::network::defaults::{example_network, simple_network};
    use crate::network::surface::recording::RecordingSurface;
    use crate::physics::SpringWorld;

    const SCREEN: Vec2 = Vec2::new(800.0, 600.0);

    fn network(data: NetworkData, settings: NetworkSettings) -> PeopleNetwork {
        PeopleNetwork::new(
            data,
            SCREEN,
            SCREEN * 0.5,
            Box::new(SpringWorld::default()),
            PortraitLoader::default(),
            NetworkSettings {
                seed: Some(11),
                ..settings
            },
        )
    }

    fn eager(data: NetworkData) -> PeopleNetwork {
        let mut network = network(data, NetworkSettings::default());
        network.awake(Instant::now()).expect("awake");
        network
    }

    fn incremental(data: NetworkData, bind_physics: bool, incremental_bind: bool) -> PeopleNetwork {
        network(
            data,
            NetworkSettings {
                incremental_attach: true,
                bind_physics,
                incremental_bind,
                attach_delay: Duration::from_millis(100),
                seed: None,
            },
        )
    }

    fn run_frames(network: &mut PeopleNetwork, start: Instant, frames: usize) -> Instant {
        let mut now = start;
        for _ in 0..frames {
            now += Duration::from_millis(16);
            network.update(16.0, now).expect("update");
        }
        now
    }

    #[test]
    fn eager_two_node_network_matches_style() {
        let data = simple_network();
        let family = data.style.connection(&ConnectionType::Family).expect("family").clone();
        let network = eager(data);

        assert_eq!(network.lifecycle(), Lifecycle::Running);
        assert_eq!(network.dynamics().body_count(), 2);
        assert_eq!(network.dynamics().constraint_count(), 1);
        assert!(network.dynamics().body_state("1").expect("origin").is_static);
        assert!(!network.dynamics().body_state("2").expect("family").is_static);

        let constraint = network.dynamics().constraint_state("1").expect("constraint");
        assert_eq!(
            constraint.params.length,
            family.edge_style.distance_factor.unwrap_or(1.0) * family.edge_style.physics.length
        );
        assert!(network.check_center_node_exists().is_ok());
    }

    #[test]
    fn second_origin_is_fatal() {
        let mut data = simple_network();
        data.nodes.push(NodeRef::new("3", "Alice again", ConnectionType::Origin));
        let mut network = network(data, NetworkSettings::default());
        let err = network.awake(Instant::now()).expect_err("fatal");
        assert!(matches!(err, NetworkError::MultipleOrigins { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn missing_origin_is_fatal_for_incremental_attach() {
        let mut data = simple_network();
        data.nodes.retain(|node| !node.is_origin());
        data.edges.clear();
        let mut network = incremental(data, false, false);
        assert!(matches!(network.awake(Instant::now()), Err(NetworkError::MissingOrigin)));
    }

    #[test]
    fn incremental_attach_reaches_the_full_network() {
        let data = example_network();
        let (nodes, edges) = (data.nodes.len(), data.edges.len());
        let mut network = incremental(data, false, false);
        let start = Instant::now();
        network.awake(start).expect("awake");
        assert_eq!(network.lifecycle(), Lifecycle::Awakening);
        assert!(!network.is_network_setup());
        assert_eq!(network.graphics().edge_count(), 1);
        assert_eq!(network.attach_progress(), Some((2, 1)));

        run_frames(&mut network, start, 200);
        assert_eq!(network.lifecycle(), Lifecycle::Running);
        assert!(network.is_network_setup());
        assert_eq!(network.attach_progress(), None);
        assert_eq!(network.graphics().node_count(), nodes);
        assert_eq!(network.graphics().edge_count(), edges);
        assert_eq!(network.dynamics().body_count(), nodes);
        assert_eq!(network.dynamics().constraint_count(), edges);
        assert_eq!(network.data().nodes.len(), nodes);
        assert!(network.attach_error().is_none());
    }

    #[test]
    fn incremental_attach_reports_unreachable_nodes() {
        let mut data = example_network();
        data.nodes.push(NodeRef::new("11", "Hermit", ConnectionType::Stranger));
        let mut network = incremental(data, false, false);
        let start = Instant::now();
        network.awake(start).expect("awake");
        run_frames(&mut network, start, 200);

        assert_eq!(network.lifecycle(), Lifecycle::Running);
        assert!(network.graphics().node("11").is_none());
        assert!(matches!(
            network.attach_error(),
            Some(NetworkError::IncompleteAttachment { attached: 10, total: 11, .. })
        ));
    }

    #[test]
    fn batch_bind_after_attach_aliases_bodies() {
        let mut network = incremental(simple_network(), true, false);
        let start = Instant::now();
        network.awake(start).expect("awake");
        assert!(!network.graphics().node("2").expect("node").is_position_bound());

        run_frames(&mut network, start, 20);
        let node = network.graphics().node("2").expect("node");
        assert!(node.is_position_bound());
        let body = network.dynamics().body_of("2").expect("body");
        let cell = network.dynamics().world().position_cell(body).expect("cell");
        assert!(cell.shares_storage_with(node.position_cell()));
    }

    fn body_cell(network: &PeopleNetwork, node_id: &str) -> crate::position::PositionCell {
        let body = network.dynamics().body_of(node_id).expect("body");
        network.dynamics().world().position_cell(body).expect("cell")
    }

    fn assert_aliases_bodies(network: &PeopleNetwork) {
        for node in network.graphics().nodes() {
            assert!(node.is_position_bound(), "node {} unbound", node.id());
            assert!(body_cell(network, node.id()).shares_storage_with(node.position_cell()));
        }
        for edge in network.graphics().edges() {
            let (a, b) = edge.position_refs();
            assert!(a.shares_storage_with(&body_cell(network, edge.source())));
            assert!(b.shares_storage_with(&body_cell(network, edge.target())));
        }
    }

    #[test]
    fn eager_bind_aliases_nodes_and_edges() {
        let mut network = network(
            example_network(),
            NetworkSettings {
                bind_physics: true,
                ..NetworkSettings::default()
            },
        );
        network.awake(Instant::now()).expect("awake");
        assert!(network.is_fully_bound());
        assert_aliases_bodies(&network);

        run_frames(&mut network, Instant::now(), 30);
        assert_aliases_bodies(&network);
        for node in network.graphics().nodes() {
            let body = network.dynamics().body_state(node.id()).expect("body");
            assert_eq!(node.position(), body.position);
        }
    }

    #[test]
    fn incremental_bind_aliases_as_it_attaches() {
        let data = example_network();
        let nodes = data.nodes.len();
        let mut network = incremental(data, true, true);
        let start = Instant::now();
        network.awake(start).expect("awake");
        assert_eq!(network.lifecycle(), Lifecycle::Awakening);
        assert!(network.is_fully_bound());
        assert_aliases_bodies(&network);

        run_frames(&mut network, start, 200);
        assert_eq!(network.lifecycle(), Lifecycle::Running);
        assert_eq!(network.graphics().node_count(), nodes);
        assert_aliases_bodies(&network);
    }

    #[test]
    fn drag_in_bind_mode_keeps_body_and_node_together() {
        let mut network = network(
            simple_network(),
            NetworkSettings {
                bind_physics: true,
                ..NetworkSettings::default()
            },
        );
        network.awake(Instant::now()).expect("awake");
        network.setup();
        let start = Instant::now();
        run_frames(&mut network, start, 120);

        let node = network.graphics().node("2").expect("node");
        let grab = network.graphics().viewport().world_to_screen(node.position());
        assert!(network.begin_drag(grab));
        network.drag_to(grab + vec2(0.0, 40.0));
        let moved = network.graphics().node("2").expect("node").position();
        let body = network.dynamics().body_state("2").expect("body");
        assert_eq!(body.position, moved);
        assert_eq!(body.velocity, Vec2::ZERO);
        network.end_drag();
        assert_aliases_bodies(&network);
    }

    #[test]
    fn paused_physics_only_moves_on_explicit_steps() {
        let mut network = eager(simple_network());
        let start = Instant::now();
        run_frames(&mut network, start, 5);
        assert!(network.is_physics_running());

        network.pause_physics();
        assert!(!network.is_physics_running());
        let frozen = network.graphics().node("2").expect("node").position();
        let now = run_frames(&mut network, start, 30);
        assert_eq!(network.graphics().node("2").expect("node").position(), frozen);

        network.step_physics(16.0);
        let stepped = network.graphics().node("2").expect("node").position();
        assert_ne!(stepped, frozen);
        assert_eq!(network.dynamics().body_state("2").expect("body").position, stepped);

        network.resume_physics();
        run_frames(&mut network, now, 5);
        assert_ne!(network.graphics().node("2").expect("node").position(), stepped);
    }

    #[test]
    fn pull_mode_copies_body_positions() {
        let mut network = eager(simple_network());
        let start = Instant::now();
        run_frames(&mut network, start, 30);

        let body = network.dynamics().body_state("2").expect("body").position;
        let node = network.graphics().node("2").expect("node");
        assert_eq!(node.position(), body);
        assert!(!node.is_position_bound());
        let edge = network.graphics().edge("1").expect("edge");
        assert_eq!(edge.endpoints().1, body);
    }

    #[test]
    fn removing_a_node_cascades_and_spares_the_rest() {
        let data = example_network();
        let mut network = eager(data.clone());
        network.remove_node("6").expect("removed");

        assert!(network.graphics().node("6").is_none());
        assert!(network.dynamics().body_of("6").is_none());
        assert_eq!(network.graphics().edge_count(), data.edges.len() - 5);
        assert_eq!(network.dynamics().constraint_count(), data.edges.len() - 5);
        assert_eq!(network.dynamics().body_count(), data.nodes.len() - 1);
        for id in ["7", "8", "9", "10"] {
            assert!(network.graphics().node(id).is_some());
            assert!(network.dynamics().body_of(id).is_some());
        }
        assert!(network.data().edges.iter().all(|edge| !edge.touches("6")));
    }

    #[test]
    fn test_hooks_add_and_remove_a_node() {
        let mut network = eager(example_network());
        network
            .add_node(NodeRef::new("212", "Test", ConnectionType::Family))
            .expect("node added");
        network
            .add_edge(EdgeRef::new("212", "1", "212", ConnectionType::Family))
            .expect("edge added");
        assert!(network.dynamics().body_of("212").is_some());
        assert!(network.dynamics().constraint_state("212").is_some());

        assert!(matches!(
            network.add_node(NodeRef::new("212", "Test", ConnectionType::Family)),
            Err(NetworkError::DuplicateNode(_))
        ));

        network.remove_node("212").expect("removed");
        assert!(network.graphics().edge("212").is_none());
        assert!(network.dynamics().constraint_state("212").is_none());
        assert!(matches!(network.remove_node("212"), Err(NetworkError::UnknownNode(_))));
    }

    #[test]
    fn failed_add_leaves_no_trace() {
        let mut network = eager(simple_network());
        let result = network.add_node(NodeRef::new("5", "Rival", ConnectionType::Other("Rival".into())));
        assert!(matches!(result, Err(NetworkError::MissingStyle(_))));
        assert!(network.graphics().node("5").is_none());
        assert!(network.dynamics().body_of("5").is_none());
        assert!(network.data().node("5").is_none());

        let result = network.add_edge(EdgeRef::new("9", "1", "404", ConnectionType::Family));
        assert!(matches!(result, Err(NetworkError::InvalidEdge { .. })));
        assert!(network.graphics().edge("9").is_none());
    }

    #[test]
    fn drag_mirrors_into_body() {
        let mut network = eager(simple_network());
        network.setup();
        let start = Instant::now();
        run_frames(&mut network, start, 120);

        let node = network.graphics().node("2").expect("node");
        let grab = network.graphics().viewport().world_to_screen(node.position());
        assert!(network.begin_drag(grab));
        assert!(network.graphics().node("2").expect("node").is_dragging());
        network.drag_to(grab + vec2(35.0, 0.0));
        let moved = network.graphics().node("2").expect("node").position();
        assert_eq!(network.dynamics().body_state("2").expect("body").position, moved);
        network.end_drag();
        assert!(network.dragging().is_none());
    }

    #[test]
    fn destroy_releases_everything() {
        let mut network = eager(example_network());
        network.destroy();
        assert_eq!(network.lifecycle(), Lifecycle::Destroyed);
        assert_eq!(network.graphics().node_count(), 0);
        assert_eq!(network.dynamics().body_count(), 0);
        assert_eq!(network.dynamics().world().body_count(), 0);
        assert_eq!(network.update(16.0, Instant::now()).expect("no-op"), FrameCounts::default());
        assert!(matches!(
            network.add_node(NodeRef::new("3", "Late", ConnectionType::Friend)),
            Err(NetworkError::Destroyed)
        ));

        let mut surface = RecordingSurface::default();
        network.draw(&mut surface);
        assert!(surface.calls.is_empty());
    }

    #[test]
    fn full_size_without_grow_in_draws_nodes() {
        let mut network = eager(example_network());
        run_frames(&mut network, Instant::now(), 10);
        let mut surface = RecordingSurface::default();
        network.draw(&mut surface);
        assert_eq!(surface.circles(), 0);

        network.show_full_size();
        assert!(!network.has_animation_started());
        run_frames(&mut network, Instant::now(), 1);
        let mut surface = RecordingSurface::default();
        network.draw(&mut surface);
        let visible = network.graphics().nodes().filter(|node| node.is_visible()).count();
        assert!(visible > 0);
        assert_eq!(surface.circles(), visible);
        let origin = network.graphics().node("1").expect("origin");
        assert_eq!(origin.scale(), origin.target_radius());
    }

    #[test]
    fn grown_network_draws_every_node() {
        let mut network = eager(example_network());
        assert!(!network.has_animation_started());
        network.setup();
        assert!(network.has_animation_started());
        run_frames(&mut network, Instant::now(), 200);

        let mut surface = RecordingSurface::default();
        network.draw(&mut surface);
        let visible = network.graphics().nodes().filter(|node| node.is_visible()).count();
        assert_eq!(surface.circles(), visible);
        assert!(visible > 0);
    }
}
