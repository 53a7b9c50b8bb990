//! Feed The Cat - merge-and-spawn simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (item lifecycle, spawning, merging, boosters, loss)
//! - `ledger`: Economy ledger (coins, experience, boosters, collection, goal)
//! - `persistence`: Key-value storage backends for the ledger
//! - `tuning`: Data-driven game balance

pub mod ledger;
pub mod persistence;
pub mod sim;
pub mod tuning;

pub use ledger::{EconomyLedger, LedgerEvent};
pub use tuning::Tuning;

/// Game configuration constants (defaults for [`Tuning`])
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Container walls (x) and floor (y), world units
    pub const CONTAINER_LEFT: f32 = -1.7;
    pub const CONTAINER_RIGHT: f32 = 1.7;
    pub const CONTAINER_FLOOR: f32 = -3.0;
    /// Where new items appear, above the container
    pub const SPAWN_POINT: (f32, f32) = (0.0, 3.3);
    /// Settled items at or above this height lose the game
    pub const LOSS_LINE: f32 = 2.5;

    /// Paw reticle may roam the whole field
    pub const PAW_MIN: (f32, f32) = (-1.7, -2.7);
    pub const PAW_MAX: (f32, f32) = (1.7, 2.1);
    pub const PAW_RADIUS: f32 = 0.3;

    /// Delays (seconds)
    pub const SPAWN_DELAY: f32 = 0.1;
    pub const MERGE_DELAY: f32 = 0.1;
    pub const BOUNDARY_POLL_INTERVAL: f32 = 0.1;
    pub const GAME_OVER_DELAY: f32 = 3.0;
    pub const BOMB_FUSE: f32 = 0.5;
    pub const CAT_DEVOUR_DELAY: f32 = 0.5;
    pub const PAW_STRIKE_DELAY: f32 = 0.5;
    pub const PAW_MERGE_SPACING: f32 = 0.1;

    /// Physics stand-in
    pub const GRAVITY: f32 = -9.81;
    pub const RESTITUTION: f32 = 0.1;
    pub const FLOOR_FRICTION: f32 = 0.9;
    pub const DROP_SPEED: f32 = 2.0;
    pub const CONTACT_SLOP: f32 = 0.01;
    pub const SOLVER_ITERATIONS: u32 = 4;

    /// Soft landing: impacts above this speed get a counter impulse
    pub const SOFT_LANDING_THRESHOLD: f32 = 3.0;
    pub const SOFT_LANDING_FACTOR: f32 = 0.1;
    /// Impacts above this speed push neighbours outward
    pub const CHAIN_REACTION_THRESHOLD: f32 = 5.0;
    pub const CHAIN_REACTION_RADIUS: f32 = 1.0;
    pub const CHAIN_REACTION_IMPULSE: (f32, f32) = (0.2, 0.6);

    /// Merge pop and the outward push around a merge
    pub const MERGE_POP_X: (f32, f32) = (-0.5, 0.5);
    pub const MERGE_POP_Y: (f32, f32) = (0.5, 1.5);
    pub const MERGE_CHAIN_RADIUS: f32 = 1.2;
    pub const MERGE_CHAIN_IMPULSE: (f32, f32) = (0.3, 0.8);

    /// Bomb booster
    pub const BOMB_RADIUS: f32 = 0.3;
    pub const BOMB_MAX_DESTROYED: usize = 3;
    pub const BOMB_OVERLAP_SLOP: f32 = 0.05;

    /// Spawn policy
    pub const GUARANTEED_BASE_SPAWNS: u32 = 2;
    pub const MID_TIER_EXPERIENCE_THRESHOLD: u64 = 1000;
    pub const BASIC_SPAWN_WEIGHT: u32 = 2;
    pub const MID_TIER_SPAWN_WEIGHT: u32 = 1;
}

/// Clamp `value` into `[lo, hi]`, collapsing to the midpoint when the span is inverted
/// (an item wider than the container).
#[inline]
pub fn clamp_to_span(value: f32, lo: f32, hi: f32) -> f32 {
    if lo > hi {
        (lo + hi) * 0.5
    } else {
        value.clamp(lo, hi)
    }
}

/// Seconds to a virtual-clock duration; negative or NaN is zero, overflow saturates
#[inline]
pub fn secs(value: f32) -> std::time::Duration {
    std::time::Duration::try_from_secs_f32(value.max(0.0)).unwrap_or(std::time::Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_to_span_handles_inverted_range() {
        assert_eq!(clamp_to_span(5.0, -1.0, 1.0), 1.0);
        assert_eq!(clamp_to_span(-5.0, -1.0, 1.0), -1.0);
        assert_eq!(clamp_to_span(0.3, 1.0, -1.0), 0.0);
    }

    #[test]
    fn secs_never_negative() {
        assert_eq!(secs(-1.0), std::time::Duration::ZERO);
        assert_eq!(secs(0.5), std::time::Duration::from_millis(500));
    }

    #[test]
    fn secs_saturates_huge_values() {
        assert_eq!(secs(1e30), std::time::Duration::MAX);
        assert_eq!(secs(f32::INFINITY), std::time::Duration::MAX);
        assert_eq!(secs(f32::NAN), std::time::Duration::ZERO);
    }
}
