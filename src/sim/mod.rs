//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod booster;
pub mod boundary;
pub mod collision;
pub mod events;
pub mod food;
pub mod item;
pub mod merge;
pub mod physics;
pub mod progression;
pub mod scheduler;
pub mod spawner;
pub mod state;
pub mod tick;

pub use booster::{ActiveBooster, BoosterError, BoosterKind, BoosterLock, PawPhase};
pub use boundary::LossMonitor;
pub use collision::CollisionResult;
pub use events::{DestroyCause, EffectKind, GameEvent};
pub use food::{FoodCategory, FoodKind, ItemKind};
pub use item::{Item, ItemId, LifecycleState};
pub use merge::MergeResolver;
pub use physics::{Body, BodyMode, Contact, ContactPartner, PhysicsWorld};
pub use progression::{MergeReward, Progression, SatisfactionLevel};
pub use scheduler::{Scheduler, TimerId};
pub use spawner::Spawner;
pub use state::{GamePhase, GameState, Timer};
pub use tick::{TickInput, tick};
