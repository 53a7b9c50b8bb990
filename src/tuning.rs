//! Game balance and layout
//!
//! Every number the simulation uses lives here, defaulted from [`crate::consts`].
//! Loaded from JSON so balance passes do not need a rebuild; any field left
//! out of the file keeps its default.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts;
use crate::sim::booster::BoosterKind;
use crate::sim::food::FoodKind;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// Container geometry and the spawn/loss/paw regions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerTuning {
    pub left: f32,
    pub right: f32,
    pub floor: f32,
    pub spawn_point: Vec2,
    pub loss_line: f32,
    pub paw_min: Vec2,
    pub paw_max: Vec2,
    pub paw_radius: f32,
}

impl Default for ContainerTuning {
    fn default() -> Self {
        Self {
            left: consts::CONTAINER_LEFT,
            right: consts::CONTAINER_RIGHT,
            floor: consts::CONTAINER_FLOOR,
            spawn_point: Vec2::from(consts::SPAWN_POINT),
            loss_line: consts::LOSS_LINE,
            paw_min: Vec2::from(consts::PAW_MIN),
            paw_max: Vec2::from(consts::PAW_MAX),
            paw_radius: consts::PAW_RADIUS,
        }
    }
}

/// Longest delay a tuning file may ask for (one day)
const MAX_DELAY_SECS: f32 = 86_400.0;

/// Fixed delays, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingTuning {
    pub spawn_delay: f32,
    pub merge_delay: f32,
    pub boundary_poll_interval: f32,
    pub game_over_delay: f32,
    pub bomb_fuse: f32,
    pub cat_devour_delay: f32,
    pub paw_strike_delay: f32,
    pub paw_merge_spacing: f32,
}

impl Default for TimingTuning {
    fn default() -> Self {
        Self {
            spawn_delay: consts::SPAWN_DELAY,
            merge_delay: consts::MERGE_DELAY,
            boundary_poll_interval: consts::BOUNDARY_POLL_INTERVAL,
            game_over_delay: consts::GAME_OVER_DELAY,
            bomb_fuse: consts::BOMB_FUSE,
            cat_devour_delay: consts::CAT_DEVOUR_DELAY,
            paw_strike_delay: consts::PAW_STRIKE_DELAY,
            paw_merge_spacing: consts::PAW_MERGE_SPACING,
        }
    }
}

impl TimingTuning {
    fn delays(&self) -> [(&'static str, f32); 8] {
        [
            ("spawn_delay", self.spawn_delay),
            ("merge_delay", self.merge_delay),
            ("boundary_poll_interval", self.boundary_poll_interval),
            ("game_over_delay", self.game_over_delay),
            ("bomb_fuse", self.bomb_fuse),
            ("cat_devour_delay", self.cat_devour_delay),
            ("paw_strike_delay", self.paw_strike_delay),
            ("paw_merge_spacing", self.paw_merge_spacing),
        ]
    }
}

/// Physics stand-in and the impulse flavour effects
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    pub gravity: f32,
    pub restitution: f32,
    pub floor_friction: f32,
    pub drop_speed: f32,
    pub contact_slop: f32,
    pub solver_iterations: u32,
    pub soft_landing_threshold: f32,
    pub soft_landing_factor: f32,
    pub chain_reaction_threshold: f32,
    pub chain_reaction_radius: f32,
    /// Impulse magnitude range (min, max)
    pub chain_reaction_impulse: (f32, f32),
    pub merge_pop_x: (f32, f32),
    pub merge_pop_y: (f32, f32),
    pub merge_chain_radius: f32,
    pub merge_chain_impulse: (f32, f32),
    pub bomb_max_destroyed: usize,
    pub bomb_overlap_slop: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: consts::GRAVITY,
            restitution: consts::RESTITUTION,
            floor_friction: consts::FLOOR_FRICTION,
            drop_speed: consts::DROP_SPEED,
            contact_slop: consts::CONTACT_SLOP,
            solver_iterations: consts::SOLVER_ITERATIONS,
            soft_landing_threshold: consts::SOFT_LANDING_THRESHOLD,
            soft_landing_factor: consts::SOFT_LANDING_FACTOR,
            chain_reaction_threshold: consts::CHAIN_REACTION_THRESHOLD,
            chain_reaction_radius: consts::CHAIN_REACTION_RADIUS,
            chain_reaction_impulse: consts::CHAIN_REACTION_IMPULSE,
            merge_pop_x: consts::MERGE_POP_X,
            merge_pop_y: consts::MERGE_POP_Y,
            merge_chain_radius: consts::MERGE_CHAIN_RADIUS,
            merge_chain_impulse: consts::MERGE_CHAIN_IMPULSE,
            bomb_max_destroyed: consts::BOMB_MAX_DESTROYED,
            bomb_overlap_slop: consts::BOMB_OVERLAP_SLOP,
        }
    }
}

/// Coin prices per booster; `None` means not sold for coins
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoosterPrices {
    pub bomb: Option<u32>,
    pub paw: Option<u32>,
    pub cat: Option<u32>,
}

impl Default for BoosterPrices {
    fn default() -> Self {
        Self {
            bomb: None,
            paw: Some(75),
            cat: Some(150),
        }
    }
}

/// Rewards, thresholds and spawn weights
///
/// Per-kind tables are indexed by [`FoodKind::tier`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyTuning {
    pub experience: [u32; 11],
    pub goal_reward: [u32; 11],
    pub discovery_bonus: [u32; 11],
    pub guaranteed_base_spawns: u32,
    pub mid_tier_experience_threshold: u64,
    pub basic_spawn_weight: u32,
    pub mid_tier_spawn_weight: u32,
    /// Session experience needed for each satisfaction level
    pub satisfaction_thresholds: [u64; 8],
    /// Coin reward for first reaching each satisfaction level
    pub satisfaction_rewards: [u32; 8],
    pub booster_prices: BoosterPrices,
}

impl Default for EconomyTuning {
    fn default() -> Self {
        Self {
            experience: [1, 10, 25, 40, 70, 90, 150, 240, 400, 650, 1050],
            goal_reward: [0, 10, 15, 25, 40, 65, 105, 170, 275, 445, 715],
            discovery_bonus: [0, 50, 80, 120, 200, 320, 520, 840, 1360, 2200, 3560],
            guaranteed_base_spawns: consts::GUARANTEED_BASE_SPAWNS,
            mid_tier_experience_threshold: consts::MID_TIER_EXPERIENCE_THRESHOLD,
            basic_spawn_weight: consts::BASIC_SPAWN_WEIGHT,
            mid_tier_spawn_weight: consts::MID_TIER_SPAWN_WEIGHT,
            satisfaction_thresholds: [0, 200, 500, 1000, 2000, 4000, 8000, 15000],
            satisfaction_rewards: [0, 50, 100, 200, 400, 600, 850, 1400],
            booster_prices: BoosterPrices::default(),
        }
    }
}

impl EconomyTuning {
    pub fn experience_for(&self, kind: FoodKind) -> u32 {
        self.experience[kind.tier()]
    }

    pub fn goal_reward_for(&self, kind: FoodKind) -> u32 {
        self.goal_reward[kind.tier()]
    }

    pub fn discovery_bonus_for(&self, kind: FoodKind) -> u32 {
        self.discovery_bonus[kind.tier()]
    }

    pub fn booster_price(&self, kind: BoosterKind) -> Option<u32> {
        match kind {
            BoosterKind::Bomb => self.booster_prices.bomb,
            BoosterKind::Paw => self.booster_prices.paw,
            BoosterKind::Cat => self.booster_prices.cat,
        }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub container: ContainerTuning,
    pub timing: TimingTuning,
    pub physics: PhysicsTuning,
    pub economy: EconomyTuning,
}

impl Tuning {
    pub fn from_json_str(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json_str(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    pub fn to_json_string(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would stall or break the simulation
    pub fn validate(&self) -> Result<(), TuningError> {
        let c = &self.container;
        if c.left >= c.right {
            return Err(TuningError::Invalid(format!(
                "container left ({}) must be less than right ({})",
                c.left, c.right
            )));
        }
        if c.loss_line <= c.floor {
            return Err(TuningError::Invalid(
                "loss line must be above the floor".to_string(),
            ));
        }
        for (name, value) in self.timing.delays() {
            if !value.is_finite() || !(0.0..=MAX_DELAY_SECS).contains(&value) {
                return Err(TuningError::Invalid(format!(
                    "{} must be between 0 and {} seconds, got {}",
                    name, MAX_DELAY_SECS, value
                )));
            }
        }
        if self.timing.boundary_poll_interval <= 0.0 {
            return Err(TuningError::Invalid(
                "boundary poll interval must be positive".to_string(),
            ));
        }
        if self.timing.paw_merge_spacing <= 0.0 {
            return Err(TuningError::Invalid(
                "paw merge spacing must be positive".to_string(),
            ));
        }
        let t = &self.economy.satisfaction_thresholds;
        if t.windows(2).any(|w| w[0] > w[1]) {
            return Err(TuningError::Invalid(
                "satisfaction thresholds must be ascending".to_string(),
            ));
        }
        Ok(())
    }
}
