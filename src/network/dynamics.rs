use std::collections::HashMap;

use eframe::egui::Vec2;
use tracing::{debug, error};

use crate::physics::{
    BodyId, BodyParams, BodyState, ConstraintId, ConstraintParams, ConstraintState, PhysicsWorld,
    Runner,
};

use super::animation::{PositionBindable, Transformable};
use super::error::{NetworkError, Result};
use super::graphics::NetworkGraphics;
use super::types::{ConnectionStyle, EdgeRef, EdgeStyle, NodeRef};

/// Keeps one simulated body per node and one constraint per edge, and moves
/// positions between the simulation and the drawn entities.
pub struct NetworkDynamics {
    world: Box<dyn PhysicsWorld>,
    runner: Runner,
    bodies: HashMap<String, BodyId>,
    constraints: HashMap<String, ConstraintId>,
}

impl NetworkDynamics {
    pub fn new(world: Box<dyn PhysicsWorld>) -> Self {
        Self {
            world,
            runner: Runner::default(),
            bodies: HashMap::new(),
            constraints: HashMap::new(),
        }
    }

    pub fn awake(&mut self, run: bool) {
        self.world.set_gravity(Vec2::ZERO);
        if run {
            self.runner.run();
        }
    }

    pub fn run(&mut self) {
        self.runner.run();
    }

    pub fn stop(&mut self) {
        self.runner.stop();
    }

    pub fn is_running(&self) -> bool {
        self.runner.is_running()
    }

    pub fn tick(&mut self, delta_ms: f32) {
        self.runner.tick(self.world.as_mut(), delta_ms);
    }

    /// Feeds a frame duration to the fixed-step runner.
    pub fn advance(&mut self, frame_ms: f32) -> usize {
        self.runner.advance(self.world.as_mut(), frame_ms)
    }

    /// Creates the body for `node` at `position`. Origin bodies are static
    /// unless the style says otherwise.
    pub fn create_node(&mut self, node: &NodeRef, position: Vec2, style: &ConnectionStyle) -> Result<BodyId> {
        if self.bodies.contains_key(&node.id) {
            return Err(NetworkError::DuplicateNode(node.id.clone()));
        }

        let physics = style.node_style.physics;
        let params = BodyParams {
            is_static: Some(physics.is_static.unwrap_or(node.is_origin())),
            ..physics
        };
        let body = self.world.add_circle(position, style.node_style.radius, params);
        self.bodies.insert(node.id.clone(), body);
        debug!(node = %node.id, "body created");
        Ok(body)
    }

    pub fn create_edge_constraint(&mut self, edge: &EdgeRef, style: &EdgeStyle) -> Result<ConstraintId> {
        if self.constraints.contains_key(&edge.id) {
            return Err(NetworkError::DuplicateEdge(edge.id.clone()));
        }

        let body_a = self.body_or_invalid(edge, &edge.source)?;
        let body_b = self.body_or_invalid(edge, &edge.target)?;
        let params = ConstraintParams {
            length: style.rest_length(),
            ..style.physics
        };
        let constraint = self
            .world
            .add_constraint(body_a, body_b, params)
            .ok_or_else(|| NetworkError::InvalidEdge {
                edge: edge.id.clone(),
                node: edge.source.clone(),
            })?;
        self.constraints.insert(edge.id.clone(), constraint);
        Ok(constraint)
    }

    fn body_or_invalid(&self, edge: &EdgeRef, node_id: &str) -> Result<BodyId> {
        self.bodies
            .get(node_id)
            .copied()
            .ok_or_else(|| NetworkError::InvalidEdge {
                edge: edge.id.clone(),
                node: node_id.to_owned(),
            })
    }

    /// Removes every constraint touching the node's body, then the body.
    /// Returns the number of constraints removed.
    pub fn remove_node(&mut self, node_id: &str) -> Result<usize> {
        let Some(&body) = self.bodies.get(node_id) else {
            error!(node = node_id, "body not found for node");
            return Err(NetworkError::MissingBody(node_id.to_owned()));
        };

        let incident = self.world.constraints_of(body);
        for constraint in &incident {
            self.world.remove_constraint(*constraint);
        }
        self.constraints.retain(|_, constraint| !incident.contains(constraint));

        self.world.remove_body(body);
        self.bodies.remove(node_id);
        Ok(incident.len())
    }

    pub fn remove_edge_constraint(&mut self, edge_id: &str) -> bool {
        match self.constraints.remove(edge_id) {
            Some(constraint) => self.world.remove_constraint(constraint),
            None => false,
        }
    }

    /// Pull mode: copies body positions into nodes, and points edges back at
    /// their nodes' positions.
    pub fn pull(&self, graphics: &mut NetworkGraphics) {
        for (id, body) in &self.bodies {
            let Some(state) = self.world.body(*body) else {
                continue;
            };
            if let Some(node) = graphics.node_mut(id)
                && node.position() != state.position
            {
                node.move_to(state.position);
            }
        }
        graphics.relink_edges();
    }

    pub fn bind_node(&self, graphics: &mut NetworkGraphics, node_id: &str) -> Result<()> {
        let cell = self
            .bodies
            .get(node_id)
            .and_then(|body| self.world.position_cell(*body))
            .ok_or_else(|| NetworkError::MissingBody(node_id.to_owned()))?;
        let node = graphics
            .node_mut(node_id)
            .ok_or_else(|| NetworkError::UnknownNode(node_id.to_owned()))?;
        node.bind_position(cell);
        debug!(node = node_id, holders = node.position_cell().holders(), "node bound to body");
        Ok(())
    }

    pub fn bind_edge(&self, graphics: &mut NetworkGraphics, edge_id: &str) -> Result<()> {
        let (source, target) = graphics
            .edge(edge_id)
            .map(|edge| (edge.source().to_owned(), edge.target().to_owned()))
            .ok_or_else(|| NetworkError::UnknownNode(edge_id.to_owned()))?;
        let cell_a = self.cell_of(&source)?;
        let cell_b = self.cell_of(&target)?;
        if let Some(edge) = graphics.edge_mut(edge_id) {
            edge.bind_positions(cell_a, cell_b);
        }
        Ok(())
    }

    fn cell_of(&self, node_id: &str) -> Result<crate::position::PositionCell> {
        self.bodies
            .get(node_id)
            .and_then(|body| self.world.position_cell(*body))
            .ok_or_else(|| NetworkError::MissingBody(node_id.to_owned()))
    }

    /// Binds every node and edge that has a body. Failures are logged and
    /// skipped.
    pub fn bind_all(&self, graphics: &mut NetworkGraphics) {
        for node_id in graphics.node_ids() {
            if let Err(err) = self.bind_node(graphics, &node_id) {
                error!(node = %node_id, %err, "failed to bind node");
            }
        }
        for edge_id in graphics.edge_ids() {
            if let Err(err) = self.bind_edge(graphics, &edge_id) {
                error!(edge = %edge_id, %err, "failed to bind edge");
            }
        }
    }

    /// Writes a node-side position into its body. Required in bind mode as
    /// well, since it also cancels the body's velocity.
    pub fn mirror_node_position(&mut self, node_id: &str, position: Vec2) -> Result<()> {
        let body = self
            .bodies
            .get(node_id)
            .copied()
            .ok_or_else(|| NetworkError::MissingBody(node_id.to_owned()))?;
        self.world.set_position(body, position);
        Ok(())
    }

    pub fn destroy(&mut self) {
        self.runner.stop();
        self.world.clear();
        self.bodies.clear();
        self.constraints.clear();
    }

    pub fn body_of(&self, node_id: &str) -> Option<BodyId> {
        self.bodies.get(node_id).copied()
    }

    pub fn body_state(&self, node_id: &str) -> Option<BodyState> {
        self.world.body(self.body_of(node_id)?)
    }

    pub fn constraint_state(&self, edge_id: &str) -> Option<ConstraintState> {
        self.world.constraint(*self.constraints.get(edge_id)?)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn world(&self) -> &dyn PhysicsWorld {
        self.world.as_ref()
    }
}
