//! Collision detection and response for round bodies in a box
//!
//! Every item is a circle; the container is two vertical walls and a floor.
//! Normals point toward the body being tested so that `pos += normal * penetration`
//! separates it.

use glam::Vec2;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point (if hit)
    pub point: Vec2,
    /// Surface normal at contact, pointing toward the tested body
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check collision between circle `a` and circle `b`
///
/// `slop` widens the test so resting bodies keep registering contact.
/// The normal points from `b` toward `a`.
pub fn circle_circle_collision(
    a_pos: Vec2,
    a_radius: f32,
    b_pos: Vec2,
    b_radius: f32,
    slop: f32,
) -> CollisionResult {
    let delta = a_pos - b_pos;
    let dist_sq = delta.length_squared();
    let reach = a_radius + b_radius + slop;

    if dist_sq >= reach * reach {
        return CollisionResult::miss();
    }

    let dist = dist_sq.sqrt();
    // Coincident centers: push straight up
    let normal = if dist > 1e-6 { delta / dist } else { Vec2::Y };

    CollisionResult {
        hit: true,
        point: b_pos + normal * b_radius,
        normal,
        penetration: (a_radius + b_radius - dist).max(0.0),
    }
}

/// Check collision with the container floor
pub fn circle_floor_collision(pos: Vec2, radius: f32, floor_y: f32, slop: f32) -> CollisionResult {
    let bottom = pos.y - radius;
    if bottom >= floor_y + slop {
        return CollisionResult::miss();
    }
    CollisionResult {
        hit: true,
        point: Vec2::new(pos.x, floor_y),
        normal: Vec2::Y,
        penetration: (floor_y - bottom).max(0.0),
    }
}

/// Check collision with either side wall
pub fn circle_wall_collision(pos: Vec2, radius: f32, left: f32, right: f32) -> CollisionResult {
    if pos.x - radius < left {
        return CollisionResult {
            hit: true,
            point: Vec2::new(left, pos.y),
            normal: Vec2::X,
            penetration: left - (pos.x - radius),
        };
    }
    if pos.x + radius > right {
        return CollisionResult {
            hit: true,
            point: Vec2::new(right, pos.y),
            normal: Vec2::NEG_X,
            penetration: pos.x + radius - right,
        };
    }
    CollisionResult::miss()
}

/// Whether two circles overlap, allowing `slop` of separation
#[inline]
pub fn circles_overlap(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32, slop: f32) -> bool {
    let reach = a_radius + b_radius + slop;
    a_pos.distance_squared(b_pos) < reach * reach
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Bounce off a surface, keeping `restitution` of the normal component
///
/// Only the approaching part of the velocity is changed; a body already moving
/// away from the surface is left alone.
pub fn bounce_velocity(velocity: Vec2, normal: Vec2, restitution: f32) -> Vec2 {
    let vn = velocity.dot(normal);
    if vn >= 0.0 {
        return velocity;
    }
    let tangential = velocity - vn * normal;
    let reflected = reflect_velocity(velocity, normal);
    let normal_out = reflected - tangential;
    tangential + normal_out * restitution
}
