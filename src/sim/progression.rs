//! Rewards, collection, goals and cat satisfaction
//!
//! Everything that happens to the ledger when a merge lands. The order inside
//! [`Progression::on_merge_completed`] matters: first-discovery is decided
//! before anything is written, and the goal only advances on a first discovery.

use std::collections::BTreeSet;

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::GameEvent;
use super::food::FoodKind;
use super::spawner::Spawner;
use crate::ledger::EconomyLedger;
use crate::tuning::EconomyTuning;

/// How fed the cat is, driven by session experience
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum SatisfactionLevel {
    #[default]
    Hungry,
    Worms,
    Better,
    Tasty,
    Satisfied,
    Full,
    Happy,
    Royal,
}

impl SatisfactionLevel {
    pub const ALL: [SatisfactionLevel; 8] = [
        SatisfactionLevel::Hungry,
        SatisfactionLevel::Worms,
        SatisfactionLevel::Better,
        SatisfactionLevel::Tasty,
        SatisfactionLevel::Satisfied,
        SatisfactionLevel::Full,
        SatisfactionLevel::Happy,
        SatisfactionLevel::Royal,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Highest level whose threshold `experience` meets
    pub fn for_experience(experience: u64, thresholds: &[u64; 8]) -> Self {
        Self::ALL
            .iter()
            .rev()
            .find(|level| experience >= thresholds[level.index()])
            .copied()
            .unwrap_or_default()
    }
}

/// Progressive chain of goals; the base tier is never a goal
const GOAL_CHAIN: [FoodKind; 10] = [
    FoodKind::Eggs,
    FoodKind::Sandwich,
    FoodKind::Meatball,
    FoodKind::Soup,
    FoodKind::Chicken,
    FoodKind::Salmon,
    FoodKind::Shrimp,
    FoodKind::Caviar,
    FoodKind::Oyster,
    FoodKind::Lobster,
];

fn goal_weight(kind: FoodKind) -> u32 {
    if kind.tier() <= FoodKind::Chicken.tier() { 2 } else { 1 }
}

/// Pick the next goal from the collection
///
/// Until the terminal tier is discovered this is the first undiscovered kind in
/// chain order. Afterwards it is a weighted draw over discovered non-base kinds.
pub fn next_goal(discovered: &BTreeSet<FoodKind>, rng: &mut Pcg32) -> FoodKind {
    if !discovered.contains(&FoodKind::TERMINAL) {
        return GOAL_CHAIN
            .iter()
            .copied()
            .find(|k| !discovered.contains(k))
            .unwrap_or(FoodKind::TERMINAL);
    }

    let pool: Vec<FoodKind> = discovered
        .iter()
        .copied()
        .filter(|&k| k != FoodKind::BASE)
        .collect();
    if pool.len() == 1 {
        return pool[0];
    }
    let total: u32 = pool.iter().map(|&k| goal_weight(k)).sum();
    let mut roll = rng.random_range(0..total);
    for &kind in &pool {
        let w = goal_weight(kind);
        if roll < w {
            return kind;
        }
        roll -= w;
    }
    FoodKind::TERMINAL
}

/// What a completed merge paid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeReward {
    pub experience: u32,
    pub first_discovery: bool,
    pub discovery_bonus: u32,
    pub goal_reward: Option<u32>,
    pub goal_advanced: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Progression {
    level: SatisfactionLevel,
}

impl Progression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> SatisfactionLevel {
        self.level
    }

    /// Re-evaluate the goal; the ledger only changes if the pick differs
    pub fn refresh_goal(&self, ledger: &mut EconomyLedger, rng: &mut Pcg32, events: &mut Vec<GameEvent>) {
        let goal = next_goal(ledger.discovered(), rng);
        if ledger.set_current_goal(goal) {
            log::info!("New goal: {}", goal.as_str());
            events.push(GameEvent::GoalChanged { kind: goal });
        }
    }

    /// Credit the ledger for a merge that produced `result`
    pub fn on_merge_completed(
        &mut self,
        result: FoodKind,
        ledger: &mut EconomyLedger,
        spawner: &mut Spawner,
        economy: &EconomyTuning,
        rng: &mut Pcg32,
        events: &mut Vec<GameEvent>,
    ) -> MergeReward {
        let first_discovery = !ledger.is_discovered(result);
        let mut reward = MergeReward {
            experience: economy.experience_for(result),
            first_discovery,
            ..Default::default()
        };

        // Experience for the result, always
        ledger.add_experience(reward.experience as u64);
        ledger.add_session_experience(reward.experience as u64);
        self.update_satisfaction(ledger, economy, events);

        let mid = FoodKind::MID_TIER_SPAWN;
        if ledger.session_experience() >= economy.mid_tier_experience_threshold {
            unlock_kind(mid, ledger, spawner, events);
        }

        if first_discovery {
            ledger.mark_discovered(result);
            unlock_kind(result, ledger, spawner, events);
            reward.discovery_bonus = economy.discovery_bonus_for(result);
            ledger.add_coins(reward.discovery_bonus as u64);
            log::info!(
                "Discovered {} (+{} coins)",
                result.as_str(),
                reward.discovery_bonus
            );
        }

        if result == ledger.current_goal() {
            let goal_reward = economy.goal_reward_for(result);
            ledger.add_coins(goal_reward as u64);
            reward.goal_reward = Some(goal_reward);
            events.push(GameEvent::GoalCompleted {
                kind: result,
                reward: goal_reward,
            });
            log::info!("Goal {} completed (+{} coins)", result.as_str(), goal_reward);

            if first_discovery {
                self.refresh_goal(ledger, rng, events);
                reward.goal_advanced = true;
            }
        }

        reward
    }

    fn update_satisfaction(
        &mut self,
        ledger: &mut EconomyLedger,
        economy: &EconomyTuning,
        events: &mut Vec<GameEvent>,
    ) {
        let level = SatisfactionLevel::for_experience(
            ledger.session_experience(),
            &economy.satisfaction_thresholds,
        );
        if level == self.level {
            return;
        }
        self.level = level;

        let full = economy.satisfaction_rewards[level.index()];
        if ledger.record_satisfaction(level.index() as u8) {
            ledger.add_coins(full as u64);
            log::info!("New best satisfaction {:?} (+{} coins)", level, full);
        }
        let change = (full as f32 * 0.1).round() as u64;
        ledger.add_coins(change);
        events.push(GameEvent::SatisfactionChanged { level });
    }

    /// Back to hungry for a new session; returns true if the level changed
    pub fn reset_session(&mut self) -> bool {
        let changed = self.level != SatisfactionLevel::Hungry;
        self.level = SatisfactionLevel::Hungry;
        changed
    }
}

fn unlock_kind(
    kind: FoodKind,
    ledger: &mut EconomyLedger,
    spawner: &mut Spawner,
    events: &mut Vec<GameEvent>,
) {
    if spawner.unlock(kind) {
        events.push(GameEvent::KindUnlocked { kind });
        if ledger.record_unlock(kind) {
            log::info!("Unlocked {} for spawning", kind.as_str());
        }
    }
}
