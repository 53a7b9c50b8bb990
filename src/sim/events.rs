//! Outbound notifications
//!
//! The simulation never calls UI, audio or VFX code directly. It appends
//! [`GameEvent`]s which the host drains after each tick. Ledger-side changes
//! (coins, experience, booster counts) come from [`crate::LedgerEvent`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::booster::BoosterKind;
use super::food::{FoodKind, ItemKind};
use super::item::ItemId;
use super::progression::SatisfactionLevel;

/// Why an item left the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestroyCause {
    /// Consumed as a merge operand
    Merge,
    /// Swept by a booster
    Booster(BoosterKind),
    /// Spawn-slot occupant displaced by a booster
    Displaced,
    /// Bomb body self-destructing
    Detonated,
    /// Loss sequence or reset
    FieldClear,
}

/// Presentation-only effect requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    Spawn,
    Merge,
    Destroy,
    Explosion,
    PawStrike,
    Devour,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    SessionStarted,
    SessionReset,
    ItemSpawned { id: ItemId, kind: ItemKind, pos: Vec2 },
    ItemDropped { id: ItemId },
    ItemSettled { id: ItemId },
    ItemMerged { consumed: [ItemId; 2], result: ItemId, kind: FoodKind, pos: Vec2 },
    ItemDestroyed { id: ItemId, kind: ItemKind, cause: DestroyCause },
    Effect { effect: EffectKind, pos: Vec2 },
    WarningChanged { id: ItemId, on: bool },
    LossTriggered,
    GameOver,
    GoalCompleted { kind: FoodKind, reward: u32 },
    GoalChanged { kind: FoodKind },
    SatisfactionChanged { level: SatisfactionLevel },
    KindUnlocked { kind: FoodKind },
    BoosterActivated { kind: BoosterKind },
    BoosterFinished { kind: BoosterKind },
}
