//! Physics collaborator: circle bodies joined by distance constraints.
//!
//! The network layer only talks to [`PhysicsWorld`]; [`SpringWorld`] is the
//! in-crate implementation used by the app and the tests.

mod collisions;
mod quadtree;
mod runner;
mod world;

use eframe::egui::Vec2;
use serde::{Deserialize, Serialize};

use crate::position::PositionCell;

pub use runner::{DEFAULT_STEP_MS, Runner};
pub use world::SpringWorld;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub(crate) u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(pub(crate) u64);

/// Per-body overrides; unset fields take the world defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BodyParams {
    pub mass: Option<f32>,
    pub density: Option<f32>,
    pub friction: Option<f32>,
    pub friction_air: Option<f32>,
    pub restitution: Option<f32>,
    pub is_static: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConstraintParams {
    pub length: f32,
    pub stiffness: f32,
    pub damping: f32,
}

impl Default for ConstraintParams {
    fn default() -> Self {
        Self {
            length: 300.0,
            stiffness: 0.01,
            damping: 0.01,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub is_static: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstraintState {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub params: ConstraintParams,
}

pub trait PhysicsWorld {
    fn set_gravity(&mut self, gravity: Vec2);

    fn add_circle(&mut self, position: Vec2, radius: f32, params: BodyParams) -> BodyId;

    /// Returns `None` when either body is not in the world.
    fn add_constraint(
        &mut self,
        body_a: BodyId,
        body_b: BodyId,
        params: ConstraintParams,
    ) -> Option<ConstraintId>;

    fn remove_body(&mut self, body: BodyId) -> bool;

    fn remove_constraint(&mut self, constraint: ConstraintId) -> bool;

    fn constraints_of(&self, body: BodyId) -> Vec<ConstraintId>;

    fn body(&self, body: BodyId) -> Option<BodyState>;

    fn constraint(&self, constraint: ConstraintId) -> Option<ConstraintState>;

    /// The live storage the world integrates into. Writes through the cell
    /// are seen by the next step.
    fn position_cell(&self, body: BodyId) -> Option<PositionCell>;

    /// Teleports a body and cancels its velocity.
    fn set_position(&mut self, body: BodyId, position: Vec2) -> bool;

    fn step(&mut self, delta_ms: f32);

    fn clear(&mut self);

    fn body_count(&self) -> usize;

    fn constraint_count(&self) -> usize;
}
