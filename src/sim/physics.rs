//! Minimal 2D rigid-body step for round items in an open-top box
//!
//! Stands in for a real physics engine: gravity, linear damping, a few
//! position/velocity solver passes, and wall/floor clamping. What the rest of
//! the simulation needs from it is the contact stream: each step reports only
//! the contacts that *began* during that step (collision-enter), in a stable
//! order, once per participant.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{
    bounce_velocity, circle_circle_collision, circle_floor_collision, circle_wall_collision,
};
use super::food::ItemKind;
use super::item::{Item, ItemId};
use crate::tuning::{ContainerTuning, PhysicsTuning};

/// How a body takes part in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyMode {
    /// Moved by code only; invisible to contacts (spawn slot, dragging)
    Kinematic,
    /// Fully simulated
    Dynamic,
    /// Immovable but still solid (after the loss sequence)
    Frozen,
}

/// Rigid-body state of one item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub mass: f32,
    pub damping: f32,
    pub mode: BodyMode,
}

impl Body {
    pub fn new(kind: ItemKind, pos: Vec2, mode: BodyMode) -> Self {
        let profile = kind.body_profile();
        Self {
            pos,
            vel: Vec2::ZERO,
            radius: kind.radius(),
            mass: profile.mass,
            damping: profile.damping,
            mode,
        }
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        match self.mode {
            BodyMode::Dynamic if self.mass > 0.0 => 1.0 / self.mass,
            _ => 0.0,
        }
    }

    /// Instant velocity change; ignored unless dynamic
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        if self.mode == BodyMode::Dynamic {
            self.vel += impulse * self.inv_mass();
        }
    }
}

/// What an item touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContactPartner {
    Item(ItemId),
    Floor,
}

/// A contact as seen from `item`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub item: ItemId,
    pub partner: ContactPartner,
    pub point: Vec2,
    /// Velocity of `item` relative to the partner at first touch
    pub relative_velocity: Vec2,
}

impl Contact {
    #[inline]
    pub fn impact_speed(&self) -> f32 {
        self.relative_velocity.length()
    }
}

/// Keyed by (lower id, partner) so each touching pair appears once
type ContactKey = (ItemId, ContactPartner);

/// Contact bookkeeping across steps
#[derive(Debug, Clone, Default)]
pub struct PhysicsWorld {
    touching: BTreeMap<ContactKey, Vec2>,
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all contacts (field cleared)
    pub fn clear(&mut self) {
        self.touching.clear();
    }

    /// Every contact currently held, in both directions, with zero relative velocity
    pub fn resting_contacts(&self) -> Vec<Contact> {
        let mut out = Vec::with_capacity(self.touching.len() * 2);
        for (&(item, partner), &point) in &self.touching {
            push_both(&mut out, item, partner, point, Vec2::ZERO);
        }
        out
    }

    /// Advance one fixed step and return the contacts that began during it
    pub fn step(
        &mut self,
        items: &mut [Item],
        dt: f32,
        physics: &PhysicsTuning,
        container: &ContainerTuning,
    ) -> Vec<Contact> {
        let active: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, it)| it.is_alive() && it.body.mode != BodyMode::Kinematic)
            .map(|(i, _)| i)
            .collect();

        // Integrate
        for &i in &active {
            let body = &mut items[i].body;
            if body.mode != BodyMode::Dynamic {
                continue;
            }
            body.vel.y += physics.gravity * dt;
            body.vel /= 1.0 + body.damping * dt;
            body.pos += body.vel * dt;
        }

        // Detect (before solving, so approach velocities are intact)
        let mut current: BTreeMap<ContactKey, (Vec2, Vec2)> = BTreeMap::new();
        for (n, &i) in active.iter().enumerate() {
            for &j in &active[n + 1..] {
                let (a, b) = (&items[i], &items[j]);
                if a.body.mode != BodyMode::Dynamic && b.body.mode != BodyMode::Dynamic {
                    continue;
                }
                let hit = circle_circle_collision(
                    a.body.pos,
                    a.body.radius,
                    b.body.pos,
                    b.body.radius,
                    physics.contact_slop,
                );
                if !hit.hit {
                    continue;
                }
                let (lo, hi, rel) = if a.id < b.id {
                    (a.id, b.id, a.body.vel - b.body.vel)
                } else {
                    (b.id, a.id, b.body.vel - a.body.vel)
                };
                current.insert((lo, ContactPartner::Item(hi)), (hit.point, rel));
            }

            let it = &items[i];
            if it.body.mode == BodyMode::Dynamic {
                let hit = circle_floor_collision(
                    it.body.pos,
                    it.body.radius,
                    container.floor,
                    physics.contact_slop,
                );
                if hit.hit {
                    current.insert((it.id, ContactPartner::Floor), (hit.point, it.body.vel));
                }
            }
        }

        // Solve
        for _ in 0..physics.solver_iterations.max(1) {
            for (n, &i) in active.iter().enumerate() {
                for &j in &active[n + 1..] {
                    let (a, b) = pair_mut(items, i, j);
                    solve_pair(&mut a.body, &mut b.body, physics.restitution);
                }
            }
            for &i in &active {
                let body = &mut items[i].body;
                if body.mode == BodyMode::Dynamic {
                    solve_container(body, physics, container);
                }
            }
        }

        // Diff against last step: only new contacts are reported
        let mut entered = Vec::new();
        for (&(item, partner), &(point, rel)) in &current {
            if !self.touching.contains_key(&(item, partner)) {
                push_both(&mut entered, item, partner, point, rel);
            }
        }
        self.touching = current
            .into_iter()
            .map(|(key, (point, _))| (key, point))
            .collect();

        entered
    }
}

fn push_both(out: &mut Vec<Contact>, item: ItemId, partner: ContactPartner, point: Vec2, rel: Vec2) {
    out.push(Contact {
        item,
        partner,
        point,
        relative_velocity: rel,
    });
    if let ContactPartner::Item(other) = partner {
        out.push(Contact {
            item: other,
            partner: ContactPartner::Item(item),
            point,
            relative_velocity: -rel,
        });
    }
}

/// Two distinct mutable borrows out of one slice
fn pair_mut(items: &mut [Item], i: usize, j: usize) -> (&mut Item, &mut Item) {
    debug_assert!(i < j);
    let (head, tail) = items.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

fn solve_pair(a: &mut Body, b: &mut Body, restitution: f32) {
    let hit = circle_circle_collision(a.pos, a.radius, b.pos, b.radius, 0.0);
    if !hit.hit || hit.penetration <= 0.0 {
        return;
    }
    let (ia, ib) = (a.inv_mass(), b.inv_mass());
    let total = ia + ib;
    if total <= 0.0 {
        return;
    }

    let correction = hit.normal * (hit.penetration / total);
    a.pos += correction * ia;
    b.pos -= correction * ib;

    let rel = a.vel - b.vel;
    let vn = rel.dot(hit.normal);
    if vn < 0.0 {
        let j = -(1.0 + restitution) * vn / total;
        a.vel += hit.normal * (j * ia);
        b.vel -= hit.normal * (j * ib);
    }
}

fn solve_container(body: &mut Body, physics: &PhysicsTuning, container: &ContainerTuning) {
    let wall = circle_wall_collision(body.pos, body.radius, container.left, container.right);
    if wall.hit {
        body.pos += wall.normal * wall.penetration;
        body.vel = bounce_velocity(body.vel, wall.normal, physics.restitution);
    }

    let floor = circle_floor_collision(body.pos, body.radius, container.floor, 0.0);
    if floor.hit && floor.penetration > 0.0 {
        body.pos += floor.normal * floor.penetration;
        body.vel = bounce_velocity(body.vel, floor.normal, physics.restitution);
        body.vel.x *= physics.floor_friction;
    }
}
