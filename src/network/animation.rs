//! Small capability traits for animated entities and the frame-by-frame
//! helpers that drive them. Each helper moves its target one step and returns
//! `true` once the value sits exactly on the target.

use eframe::egui::Vec2;

use crate::position::PositionCell;
use crate::util::{approach, approach_point};

const BLEND: f32 = 0.1;
const SCALE_TOLERANCE: f32 = 0.1;
const POSITION_TOLERANCE: f32 = 0.2;

pub trait Scalable {
    fn scale(&self) -> f32;
    fn scale_to(&mut self, scale: f32);
}

pub trait Transformable {
    fn position(&self) -> Vec2;
    fn move_to(&mut self, position: Vec2);
    fn delta(&mut self, delta: Vec2);
}

/// Entities whose position can be pointed at shared storage.
pub trait PositionBindable {
    fn bind_position(&mut self, cell: PositionCell);

    /// Gives the entity private storage again, holding the last shared value.
    fn unbind_position(&mut self);

    fn is_position_bound(&self) -> bool;
}

pub trait Destroyable {
    fn destroy(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationSettings {
    pub speed: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self { speed: 1.0 }
    }
}

pub fn animate_scale(instance: &mut impl Scalable, target: f32, settings: AnimationSettings) -> bool {
    let current = instance.scale();
    let next = approach(current, target, (BLEND * settings.speed).clamp(f32::MIN_POSITIVE, 1.0), SCALE_TOLERANCE);
    if next != current {
        instance.scale_to(next);
    }
    next == target
}

pub fn animate_position(instance: &mut impl Transformable, target: Vec2, settings: AnimationSettings) -> bool {
    let current = instance.position();
    let tolerance = POSITION_TOLERANCE * settings.speed.max(f32::MIN_POSITIVE);
    let next = approach_point(current, target, BLEND, tolerance);
    if next != current {
        instance.move_to(next);
    }
    next == target
}

/// Moves toward `position + delta` as seen at call time. Called every frame
/// with the same delta this keeps drifting; callers pass the remaining delta.
pub fn animate_delta_position(
    instance: &mut impl Transformable,
    delta: Vec2,
    settings: AnimationSettings,
) -> bool {
    let target = instance.position() + delta;
    animate_position(instance, target, settings)
}
