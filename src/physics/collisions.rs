use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

#[derive(Clone, Copy)]
pub(super) struct ContactParams {
    pub(super) stiffness: f32,
    pub(super) max_reach_sq: f32,
}

/// Per-step snapshot of every body, indexed by slot.
pub(super) struct ContactBodies<'a> {
    pub(super) positions: &'a [Vec2],
    pub(super) velocities: &'a [Vec2],
    pub(super) radii: &'a [f32],
    pub(super) inverse_masses: &'a [f32],
    pub(super) frictions: &'a [f32],
    pub(super) restitutions: &'a [f32],
}

fn resolve_pair(
    bodies: &ContactBodies<'_>,
    from: usize,
    to: usize,
    params: ContactParams,
    impulses: &mut [Vec2],
) {
    let total_inverse = bodies.inverse_masses[from] + bodies.inverse_masses[to];
    if total_inverse <= 0.0 {
        return;
    }

    let delta = bodies.positions[from] - bodies.positions[to];
    let distance = delta.length();
    let min_distance = bodies.radii[from] + bodies.radii[to];
    if distance >= min_distance {
        return;
    }

    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
        vec2(angle.cos(), angle.sin())
    };

    let relative = bodies.velocities[from] - bodies.velocities[to];
    let normal_speed = relative.dot(direction);
    let mut push = (min_distance - distance) * params.stiffness;
    if normal_speed < 0.0 {
        let restitution = bodies.restitutions[from].max(bodies.restitutions[to]);
        push -= normal_speed * (1.0 + restitution) * 0.5;
    }

    let tangent = relative - direction * normal_speed;
    let friction = (bodies.frictions[from] + bodies.frictions[to]) * 0.5;
    let impulse = direction * push - tangent * (friction * 0.5);

    impulses[from] += impulse * (bodies.inverse_masses[from] / total_inverse);
    impulses[to] -= impulse * (bodies.inverse_masses[to] / total_inverse);
}

/// Walks two subtrees and resolves every overlapping circle pair once.
pub(super) fn accumulate_contacts(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    bodies: &ContactBodies<'_>,
    params: ContactParams,
    impulses: &mut [Vec2],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.max_reach_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.slots.iter().enumerate() {
                for &to in &node_a.slots[offset + 1..] {
                    resolve_pair(bodies, from, to, params, impulses);
                }
            }
        } else {
            for &from in &node_a.slots {
                for &to in &node_b.slots {
                    resolve_pair(bodies, from, to, params, impulses);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_ref() else {
                continue;
            };

            accumulate_contacts(child_a, child_a, true, bodies, params, impulses);

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_ref() else {
                    continue;
                };
                accumulate_contacts(child_a, child_b, false, bodies, params, impulses);
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_contacts(child, node_b, false, bodies, params, impulses);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_contacts(node_a, child, false, bodies, params, impulses);
        }
    }
}
