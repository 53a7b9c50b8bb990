//! Item lifecycle state machine
//!
//! ```text
//! AtSpawn ──drag start──▶ Dragging ──drag end──▶ Falling ──contact──▶ Settled
//!    └──────────────tap──────────────────────────▲
//! any ──merge / booster / field clear──▶ Destroyed
//! ```
//!
//! The state is a single tag, so contradictory flag combinations cannot exist.
//! Transitions return `false` instead of panicking when called from the wrong
//! state; collision and input callbacks routinely arrive late.

use std::collections::BTreeSet;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::food::ItemKind;
use super::physics::{Body, BodyMode};
use crate::clamp_to_span;

/// Stable entity handle; never reused within a [`GameState`](super::GameState)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of an item; exactly one holds at any time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Waiting in the spawn slot (kinematic)
    AtSpawn,
    /// Being moved horizontally by the player
    Dragging,
    /// Released, falling under gravity
    Falling,
    /// Came to rest against another item or the floor
    Settled,
    /// Removed from play
    Destroyed,
}

/// A food (or bomb) entity in the field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub body: Body,
    state: LifecycleState,
    /// Set while settled above the loss line (presentation only)
    warning: bool,
    /// One-shot guard: a landing requests at most one spawn
    spawn_triggered: bool,
}

impl Item {
    /// New item waiting in the spawn slot
    pub fn at_spawn(id: ItemId, kind: ItemKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            body: Body::new(kind, pos, BodyMode::Kinematic),
            state: LifecycleState::AtSpawn,
            warning: false,
            spawn_triggered: false,
        }
    }

    /// New item already at rest in the field (merge results, scenario setup)
    pub fn settled(id: ItemId, kind: ItemKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            body: Body::new(kind, pos, BodyMode::Dynamic),
            state: LifecycleState::Settled,
            warning: false,
            // Never came from the slot, so it must not trigger a spawn
            spawn_triggered: true,
        }
    }

    #[inline]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.state == LifecycleState::Settled
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.state != LifecycleState::Destroyed
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.body.pos
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.body.radius
    }

    #[inline]
    pub fn warning(&self) -> bool {
        self.warning
    }

    /// Update the warning flag; returns true if it changed
    pub fn set_warning(&mut self, on: bool) -> bool {
        let changed = self.warning != on;
        self.warning = on;
        changed
    }

    /// AtSpawn → Dragging
    pub fn begin_drag(&mut self) -> bool {
        if self.state != LifecycleState::AtSpawn {
            return false;
        }
        self.state = LifecycleState::Dragging;
        true
    }

    /// Follow the pointer horizontally while dragging; height is held
    pub fn drag_to(&mut self, x: f32, left: f32, right: f32) -> bool {
        if self.state != LifecycleState::Dragging {
            return false;
        }
        let r = self.body.radius;
        self.body.pos.x = clamp_to_span(x, left + r, right - r);
        true
    }

    /// AtSpawn | Dragging → Falling
    pub fn release(&mut self, drop_speed: f32) -> bool {
        match self.state {
            LifecycleState::AtSpawn | LifecycleState::Dragging => {
                self.state = LifecycleState::Falling;
                self.body.mode = BodyMode::Dynamic;
                self.body.vel = Vec2::new(0.0, -drop_speed);
                true
            }
            _ => false,
        }
    }

    /// Falling → Settled
    pub fn settle(&mut self) -> bool {
        if self.state != LifecycleState::Falling {
            return false;
        }
        self.state = LifecycleState::Settled;
        true
    }

    /// Any → Destroyed; false if it already was
    pub fn destroy(&mut self) -> bool {
        if self.state == LifecycleState::Destroyed {
            return false;
        }
        self.state = LifecycleState::Destroyed;
        self.body.vel = Vec2::ZERO;
        true
    }

    /// Claim the landing's spawn request; true only the first time
    pub fn take_spawn_trigger(&mut self) -> bool {
        if self.spawn_triggered {
            return false;
        }
        self.spawn_triggered = true;
        true
    }

    /// Make immovable, keeping the warning flag
    pub fn freeze(&mut self) {
        self.body.mode = BodyMode::Frozen;
        self.body.vel = Vec2::ZERO;
    }
}

/// Merge eligibility: both settled, same kind, kind has a next tier, neither
/// locked by an in-flight merge. Symmetric in `a` and `b`.
pub fn can_merge(a: &Item, b: &Item, locked: &BTreeSet<ItemId>) -> bool {
    a.id != b.id
        && a.is_settled()
        && b.is_settled()
        && a.kind == b.kind
        && a.kind.merge_target().is_some()
        && b.kind.merge_target().is_some()
        && !locked.contains(&a.id)
        && !locked.contains(&b.id)
}
