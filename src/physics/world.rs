use std::collections::{BTreeMap, HashMap};
use std::f32::consts::PI;

use eframe::egui::Vec2;

use super::collisions::{ContactBodies, ContactParams, accumulate_contacts};
use super::quadtree::QuadNode;
use super::{
    BodyId, BodyParams, BodyState, ConstraintId, ConstraintParams, ConstraintState, PhysicsWorld,
    DEFAULT_STEP_MS,
};
use crate::position::PositionCell;

const DEFAULT_DENSITY: f32 = 0.001;
const DEFAULT_FRICTION: f32 = 0.1;
const DEFAULT_FRICTION_AIR: f32 = 0.02;
const CONTACT_STIFFNESS: f32 = 0.2;
const MAX_SPEED: f32 = 40.0;

struct Body {
    position: PositionCell,
    velocity: Vec2,
    radius: f32,
    inverse_mass: f32,
    friction: f32,
    friction_air: f32,
    restitution: f32,
}

impl Body {
    fn is_static(&self) -> bool {
        self.inverse_mass <= 0.0
    }
}

#[derive(Default)]
struct StepScratch {
    slot_by_body: HashMap<BodyId, usize>,
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    radii: Vec<f32>,
    inverse_masses: Vec<f32>,
    frictions: Vec<f32>,
    restitutions: Vec<f32>,
    impulses: Vec<Vec2>,
}

/// Zero-gravity world of circles held together by spring constraints.
///
/// Integration is semi-implicit Euler with per-body air friction; overlapping
/// circles are separated through a quadtree broadphase.
#[derive(Default)]
pub struct SpringWorld {
    bodies: BTreeMap<BodyId, Body>,
    constraints: BTreeMap<ConstraintId, ConstraintState>,
    gravity: Vec2,
    next_id: u64,
    scratch: StepScratch,
}

impl SpringWorld {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn fill_scratch(&mut self) {
        let scratch = &mut self.scratch;
        scratch.slot_by_body.clear();
        scratch.positions.clear();
        scratch.velocities.clear();
        scratch.radii.clear();
        scratch.inverse_masses.clear();
        scratch.frictions.clear();
        scratch.restitutions.clear();

        for (slot, (id, body)) in self.bodies.iter().enumerate() {
            scratch.slot_by_body.insert(*id, slot);
            scratch.positions.push(body.position.get());
            scratch.velocities.push(body.velocity);
            scratch.radii.push(body.radius);
            scratch.inverse_masses.push(body.inverse_mass);
            scratch.frictions.push(body.friction);
            scratch.restitutions.push(body.restitution);
        }

        scratch.impulses.clear();
        scratch.impulses.resize(self.bodies.len(), Vec2::ZERO);
    }

    fn accumulate_constraints(&mut self, time_scale: f32) {
        let scratch = &mut self.scratch;
        for constraint in self.constraints.values() {
            let (Some(&a), Some(&b)) = (
                scratch.slot_by_body.get(&constraint.body_a),
                scratch.slot_by_body.get(&constraint.body_b),
            ) else {
                continue;
            };

            let total_inverse = scratch.inverse_masses[a] + scratch.inverse_masses[b];
            if a == b || total_inverse <= 0.0 {
                continue;
            }

            let delta = scratch.positions[b] - scratch.positions[a];
            let distance = delta.length();
            if distance <= 0.0001 {
                continue;
            }
            let direction = delta / distance;

            let params = constraint.params;
            let stretch = distance - params.length;
            let relative_speed = (scratch.velocities[b] - scratch.velocities[a]).dot(direction);
            let correction =
                direction * (stretch * params.stiffness + relative_speed * params.damping) * time_scale;

            scratch.impulses[a] += correction * (scratch.inverse_masses[a] / total_inverse);
            scratch.impulses[b] -= correction * (scratch.inverse_masses[b] / total_inverse);
        }
    }

    fn accumulate_contacts(&mut self) {
        let scratch = &mut self.scratch;
        let max_radius = scratch.radii.iter().copied().fold(0.0_f32, f32::max);
        if max_radius <= 0.0 || scratch.positions.len() < 2 {
            return;
        }

        let Some(tree) = QuadNode::build(&scratch.positions, max_radius) else {
            return;
        };

        let bodies = ContactBodies {
            positions: &scratch.positions,
            velocities: &scratch.velocities,
            radii: &scratch.radii,
            inverse_masses: &scratch.inverse_masses,
            frictions: &scratch.frictions,
            restitutions: &scratch.restitutions,
        };
        let reach = max_radius * 2.0;
        accumulate_contacts(
            &tree,
            &tree,
            true,
            &bodies,
            ContactParams {
                stiffness: CONTACT_STIFFNESS,
                max_reach_sq: reach * reach,
            },
            &mut scratch.impulses,
        );
    }

    fn integrate(&mut self, time_scale: f32) {
        let gravity = self.gravity;
        let max_speed_sq = MAX_SPEED * MAX_SPEED;

        for (slot, body) in self.bodies.values_mut().enumerate() {
            if body.is_static() {
                body.velocity = Vec2::ZERO;
                continue;
            }

            let keep = (1.0 - body.friction_air).clamp(0.0, 1.0).powf(time_scale);
            let mut velocity =
                (body.velocity + self.scratch.impulses[slot] + gravity * time_scale) * keep;
            let speed_sq = velocity.length_sq();
            if speed_sq > max_speed_sq {
                velocity *= MAX_SPEED / speed_sq.sqrt();
            }

            body.velocity = velocity;
            body.position.set(body.position.get() + velocity * time_scale);
        }
    }
}

impl PhysicsWorld for SpringWorld {
    fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    fn add_circle(&mut self, position: Vec2, radius: f32, params: BodyParams) -> BodyId {
        let id = BodyId(self.allocate_id());
        let radius = radius.max(0.0);
        let is_static = params.is_static.unwrap_or(false);
        let mass = params.mass.unwrap_or_else(|| {
            params.density.unwrap_or(DEFAULT_DENSITY) * PI * radius * radius
        });
        let inverse_mass = if is_static || mass <= 0.0 {
            0.0
        } else {
            1.0 / mass
        };

        self.bodies.insert(
            id,
            Body {
                position: PositionCell::new(position),
                velocity: Vec2::ZERO,
                radius,
                inverse_mass,
                friction: params.friction.unwrap_or(DEFAULT_FRICTION),
                friction_air: params.friction_air.unwrap_or(DEFAULT_FRICTION_AIR),
                restitution: params.restitution.unwrap_or(0.0),
            },
        );
        id
    }

    fn add_constraint(
        &mut self,
        body_a: BodyId,
        body_b: BodyId,
        params: ConstraintParams,
    ) -> Option<ConstraintId> {
        if !self.bodies.contains_key(&body_a) || !self.bodies.contains_key(&body_b) {
            return None;
        }

        let id = ConstraintId(self.allocate_id());
        self.constraints.insert(
            id,
            ConstraintState {
                body_a,
                body_b,
                params,
            },
        );
        Some(id)
    }

    fn remove_body(&mut self, body: BodyId) -> bool {
        self.bodies.remove(&body).is_some()
    }

    fn remove_constraint(&mut self, constraint: ConstraintId) -> bool {
        self.constraints.remove(&constraint).is_some()
    }

    fn constraints_of(&self, body: BodyId) -> Vec<ConstraintId> {
        self.constraints
            .iter()
            .filter(|(_, constraint)| constraint.body_a == body || constraint.body_b == body)
            .map(|(id, _)| *id)
            .collect()
    }

    fn body(&self, body: BodyId) -> Option<BodyState> {
        self.bodies.get(&body).map(|record| BodyState {
            position: record.position.get(),
            velocity: record.velocity,
            radius: record.radius,
            is_static: record.is_static(),
        })
    }

    fn constraint(&self, constraint: ConstraintId) -> Option<ConstraintState> {
        self.constraints.get(&constraint).copied()
    }

    fn position_cell(&self, body: BodyId) -> Option<PositionCell> {
        self.bodies.get(&body).map(|record| record.position.clone())
    }

    fn set_position(&mut self, body: BodyId, position: Vec2) -> bool {
        let Some(record) = self.bodies.get_mut(&body) else {
            return false;
        };
        record.position.set(position);
        record.velocity = Vec2::ZERO;
        true
    }

    fn step(&mut self, delta_ms: f32) {
        if self.bodies.is_empty() || !delta_ms.is_finite() || delta_ms <= 0.0 {
            return;
        }

        let time_scale = (delta_ms / DEFAULT_STEP_MS).clamp(0.25, 3.0);
        self.fill_scratch();
        self.accumulate_constraints(time_scale);
        self.accumulate_contacts();
        self.integrate(time_scale);
    }

    fn clear(&mut self) {
        self.bodies.clear();
        self.constraints.clear();
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}
