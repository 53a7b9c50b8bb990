//! Boosters: bomb, paw and cat
//!
//! At most one booster is active at a time. Activation spends one unit up
//! front; an activation that is refused changes nothing. Every sweep skips
//! items locked by an in-flight merge so an item is never destroyed twice.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collision::circles_overlap;
use super::food::FoodKind;
use super::item::{Item, ItemId};
use super::scheduler::TimerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BoosterKind {
    /// Area destroyer
    Bomb,
    /// Type eraser
    Paw,
    /// Clear-all
    Cat,
}

impl BoosterKind {
    pub const ALL: [BoosterKind; 3] = [BoosterKind::Bomb, BoosterKind::Paw, BoosterKind::Cat];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BoosterKind::Bomb => "bomb",
            BoosterKind::Paw => "paw",
            BoosterKind::Cat => "cat",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bomb" => Some(BoosterKind::Bomb),
            "paw" => Some(BoosterKind::Paw),
            "cat" => Some(BoosterKind::Cat),
            _ => None,
        }
    }

    /// Boosters that take over the spawn slot while active
    pub fn reserves_spawn_slot(self) -> bool {
        matches!(self, BoosterKind::Bomb | BoosterKind::Cat)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoosterError {
    #[error("no game in progress")]
    GameInactive,
    #[error("{0:?} booster is already active")]
    AlreadyActive(BoosterKind),
    #[error("no {} boosters left", .0.as_str())]
    NoUnits(BoosterKind),
}

/// Paw reticle progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PawPhase {
    /// Following the pointer
    Aiming,
    /// Released over an item; the strike lands when the timer fires
    Striking { kind: FoodKind, timer: TimerId },
}

/// State of the one active booster
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveBooster {
    Bomb {
        item: ItemId,
        /// Set on first contact with a settled item (floor-only contact leaves it false)
        hit_item: bool,
        fuse: Option<TimerId>,
    },
    Paw {
        reticle: Vec2,
        phase: PawPhase,
    },
    Cat {
        timer: TimerId,
    },
}

impl ActiveBooster {
    pub fn kind(&self) -> BoosterKind {
        match self {
            ActiveBooster::Bomb { .. } => BoosterKind::Bomb,
            ActiveBooster::Paw { .. } => BoosterKind::Paw,
            ActiveBooster::Cat { .. } => BoosterKind::Cat,
        }
    }
}

/// Single-active-booster lock
#[derive(Debug, Clone, Default)]
pub struct BoosterLock {
    active: Option<ActiveBooster>,
}

impl BoosterLock {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&ActiveBooster> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut ActiveBooster> {
        self.active.as_mut()
    }

    pub fn kind(&self) -> Option<BoosterKind> {
        self.active.as_ref().map(ActiveBooster::kind)
    }

    /// Refuse if another booster holds the lock
    pub fn check_free(&self) -> Result<(), BoosterError> {
        match self.kind() {
            Some(kind) => Err(BoosterError::AlreadyActive(kind)),
            None => Ok(()),
        }
    }

    pub fn acquire(&mut self, booster: ActiveBooster) -> Result<(), BoosterError> {
        self.check_free()?;
        self.active = Some(booster);
        Ok(())
    }

    pub fn release(&mut self) -> Option<ActiveBooster> {
        self.active.take()
    }

    /// Whether the spawner must hold off
    pub fn reserves_spawn_slot(&self) -> bool {
        self.kind().is_some_and(BoosterKind::reserves_spawn_slot)
    }
}

/// Settled food the bomb overlaps, nearest first, capped at `max`
pub fn bomb_targets(
    bomb: &Item,
    items: &[Item],
    locked: &BTreeSet<ItemId>,
    max: usize,
    slop: f32,
) -> Vec<ItemId> {
    let mut hits: Vec<(f32, ItemId)> = items
        .iter()
        .filter(|it| {
            it.id != bomb.id
                && it.is_settled()
                && it.kind.food().is_some()
                && !locked.contains(&it.id)
                && circles_overlap(bomb.pos(), bomb.radius(), it.pos(), it.radius(), slop)
        })
        .map(|it| (bomb.pos().distance_squared(it.pos()), it.id))
        .collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    hits.into_iter().take(max).map(|(_, id)| id).collect()
}

/// Settled food under the paw reticle, nearest to its centre
pub fn paw_target(reticle: Vec2, radius: f32, items: &[Item]) -> Option<&Item> {
    items
        .iter()
        .filter(|it| {
            it.is_settled()
                && it.kind.food().is_some()
                && circles_overlap(reticle, radius, it.pos(), it.radius(), 0.0)
        })
        .min_by(|a, b| {
            reticle
                .distance_squared(a.pos())
                .total_cmp(&reticle.distance_squared(b.pos()))
                .then(a.id.cmp(&b.id))
        })
}

/// Every settled, unlocked item of `kind`
pub fn kind_sweep(kind: FoodKind, items: &[Item], locked: &BTreeSet<ItemId>) -> Vec<ItemId> {
    items
        .iter()
        .filter(|it| it.is_settled() && it.kind.food() == Some(kind) && !locked.contains(&it.id))
        .map(|it| it.id)
        .collect()
}

/// Every settled, unlocked food item
pub fn field_sweep(items: &[Item], locked: &BTreeSet<ItemId>) -> Vec<ItemId> {
    items
        .iter()
        .filter(|it| it.is_settled() && it.kind.food().is_some() && !locked.contains(&it.id))
        .map(|it| it.id)
        .collect()
}
