//! Spawn slot ownership and next-kind selection
//!
//! The slot holds at most one item. A spawn request is debounced through the
//! scheduler; while it is pending (`in_flight`) further requests are dropped,
//! which closes the window between "slot empty" and "new item materialised".

use std::collections::BTreeSet;

use rand::Rng;
use rand_pcg::Pcg32;

use super::food::FoodKind;
use super::item::ItemId;
use super::scheduler::TimerId;
use crate::tuning::EconomyTuning;

#[derive(Debug, Clone)]
pub struct Spawner {
    occupant: Option<ItemId>,
    in_flight: Option<TimerId>,
    unlocked: BTreeSet<FoodKind>,
    spawn_count: u32,
}

impl Spawner {
    /// Seed the unlocked set with the base tier plus everything already discovered
    pub fn new(discovered: impl IntoIterator<Item = FoodKind>) -> Self {
        let mut unlocked: BTreeSet<FoodKind> = discovered.into_iter().collect();
        unlocked.insert(FoodKind::BASE);
        Self {
            occupant: None,
            in_flight: None,
            unlocked,
            spawn_count: 0,
        }
    }

    #[inline]
    pub fn occupant(&self) -> Option<ItemId> {
        self.occupant
    }

    #[inline]
    pub fn is_occupant(&self, id: ItemId) -> bool {
        self.occupant == Some(id)
    }

    pub fn set_occupant(&mut self, id: ItemId) {
        self.occupant = Some(id);
    }

    /// Empty the slot; returns the previous occupant
    pub fn take_occupant(&mut self) -> Option<ItemId> {
        self.occupant.take()
    }

    /// Release the slot if `id` holds it
    pub fn release_if_occupant(&mut self, id: ItemId) -> bool {
        if self.is_occupant(id) {
            self.occupant = None;
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn is_spawn_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// A new request may start: slot empty and nothing pending
    #[inline]
    pub fn can_request(&self) -> bool {
        self.occupant.is_none() && self.in_flight.is_none()
    }

    pub fn mark_in_flight(&mut self, timer: TimerId) {
        self.in_flight = Some(timer);
    }

    /// Clear the in-flight guard when the debounced spawn fires (or aborts)
    pub fn finish_in_flight(&mut self) {
        self.in_flight = None;
    }

    /// Drop the pending request; the caller cancels the returned timer
    pub fn cancel(&mut self) -> Option<TimerId> {
        self.in_flight.take()
    }

    pub fn spawn_count(&self) -> u32 {
        self.spawn_count
    }

    pub fn unlocked(&self) -> &BTreeSet<FoodKind> {
        &self.unlocked
    }

    pub fn is_unlocked(&self, kind: FoodKind) -> bool {
        self.unlocked.contains(&kind)
    }

    /// Add a kind to the spawn pool; true only the first time
    pub fn unlock(&mut self, kind: FoodKind) -> bool {
        self.unlocked.insert(kind)
    }

    /// New game session: empty slot, nothing pending, guaranteed spawns again
    pub fn reset_session(&mut self) {
        self.occupant = None;
        self.in_flight = None;
        self.spawn_count = 0;
    }

    /// Candidate list with weights for the current unlock state
    pub fn candidates(&self, session_experience: u64, economy: &EconomyTuning) -> Vec<(FoodKind, u32)> {
        let mut out: Vec<(FoodKind, u32)> = self
            .unlocked
            .iter()
            .filter(|k| k.is_basic())
            .map(|&k| (k, economy.basic_spawn_weight))
            .collect();

        let mid = FoodKind::MID_TIER_SPAWN;
        if self.is_unlocked(mid) && session_experience >= economy.mid_tier_experience_threshold {
            out.push((mid, economy.mid_tier_spawn_weight));
        }
        out.retain(|&(_, w)| w > 0);
        out
    }

    /// Pick the kind for the next spawn and count it
    pub fn select_next_kind(
        &mut self,
        rng: &mut Pcg32,
        session_experience: u64,
        economy: &EconomyTuning,
    ) -> FoodKind {
        self.spawn_count += 1;
        if self.spawn_count <= economy.guaranteed_base_spawns {
            return FoodKind::BASE;
        }

        let candidates = self.candidates(session_experience, economy);
        let total: u32 = candidates.iter().map(|&(_, w)| w).sum();
        if total == 0 {
            return FoodKind::BASE;
        }

        let mut roll = rng.random_range(0..total);
        for &(kind, weight) in &candidates {
            if roll < weight {
                return kind;
            }
            roll -= weight;
        }
        FoodKind::BASE
    }
}
