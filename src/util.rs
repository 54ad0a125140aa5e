use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use eframe::egui::{Vec2, vec2};

pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Snaps `value` onto `target` once it is closer than `tolerance`.
pub fn approx_to(value: f32, target: f32, tolerance: f32) -> f32 {
    if (value - target).abs() < tolerance {
        target
    } else {
        value
    }
}

/// One critically damped step of `value` toward `target`.
///
/// Repeated calls reach `target` exactly in a finite number of steps for any
/// `rate` in `(0, 1]` and positive `tolerance`. A step that makes no progress
/// in `f32` precision snaps as well, so tiny rates cannot stall forever.
pub fn approach(value: f32, target: f32, rate: f32, tolerance: f32) -> f32 {
    let next = lerp(value, target, rate);
    if next == value {
        return target;
    }
    approx_to(next, target, tolerance)
}

pub fn approach_point(value: Vec2, target: Vec2, rate: f32, tolerance: f32) -> Vec2 {
    vec2(
        approach(value.x, target.x, rate, tolerance),
        approach(value.y, target.y, rate, tolerance),
    )
}

pub fn stable_hash(key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}
