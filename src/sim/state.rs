//! Game state and session control
//!
//! One [`GameState`] owns the item collection and every component's state.
//! The economy ledger is not owned here; it is passed in by reference to the
//! operations that touch it.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::booster::{ActiveBooster, BoosterError, BoosterKind, BoosterLock, PawPhase};
use super::boundary::LossMonitor;
use super::events::{DestroyCause, EffectKind, GameEvent};
use super::food::ItemKind;
use super::item::{Item, ItemId};
use super::merge::MergeResolver;
use super::physics::PhysicsWorld;
use super::progression::{Progression, SatisfactionLevel};
use super::scheduler::Scheduler;
use super::spawner::Spawner;
use crate::ledger::EconomyLedger;
use crate::tuning::Tuning;
use crate::secs;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No session running
    Idle,
    /// Active gameplay
    Playing,
    /// Loss fired; waiting for the field to clear
    GameOver,
}

/// Delayed continuations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// Debounced spawn request
    MaterializeSpawn,
    /// Settle beat before a merge lands; never cancelled
    CompleteMerge { a: ItemId, b: ItemId },
    BombDetonate,
    PawStrike,
    PawMergeSweep,
    CatDevour,
    /// End of the game-over pause
    LossClear,
}

/// Live item by id in an id-sorted slice
pub fn find_item(items: &[Item], id: ItemId) -> Option<&Item> {
    items
        .binary_search_by_key(&id, |it| it.id)
        .ok()
        .map(|i| &items[i])
        .filter(|it| it.is_alive())
}

/// Complete simulation state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub tuning: Tuning,
    /// Items in play (sorted by id for determinism)
    pub items: Vec<Item>,
    pub spawner: Spawner,
    pub merges: MergeResolver,
    pub monitor: LossMonitor,
    pub booster: BoosterLock,
    pub progression: Progression,
    pub world: PhysicsWorld,
    pub scheduler: Scheduler<Timer>,
    pub(crate) rng: Pcg32,
    pub(crate) events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create an idle state; the spawn pool starts from the ledger's collection
    pub fn new(tuning: Tuning, seed: u64, ledger: &EconomyLedger) -> Self {
        Self {
            seed,
            phase: GamePhase::Idle,
            time_ticks: 0,
            spawner: Spawner::new(ledger.discovered().iter().copied()),
            tuning,
            items: Vec::new(),
            merges: MergeResolver::new(),
            monitor: LossMonitor::new(),
            booster: BoosterLock::new(),
            progression: Progression::new(),
            world: PhysicsWorld::new(),
            scheduler: Scheduler::new(),
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        id
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Live item by id
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        find_item(&self.items, id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        let i = self.items.binary_search_by_key(&id, |it| it.id).ok()?;
        Some(&mut self.items[i]).filter(|it| it.is_alive())
    }

    /// Live items in id order
    pub fn live_items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|it| it.is_alive())
    }

    /// The item waiting in the spawn slot
    pub fn occupant(&self) -> Option<&Item> {
        self.spawner.occupant().and_then(|id| self.item(id))
    }

    /// Take pending notifications
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Add an item already at rest (merge results, scenario setup)
    pub fn insert_settled_item(&mut self, kind: ItemKind, pos: Vec2) -> ItemId {
        let id = self.next_entity_id();
        let mut item = Item::settled(id, kind, pos);
        if self.phase == GamePhase::GameOver {
            item.freeze();
        }
        self.items.push(item);
        id
    }

    /// Remove an item from play; false if it was already gone
    pub fn destroy_item(&mut self, id: ItemId, cause: DestroyCause) -> bool {
        let Some(item) = self.item_mut(id) else {
            log::debug!("Ignoring destroy of stale item {}", id);
            return false;
        };
        let (kind, pos) = (item.kind, item.pos());
        item.destroy();
        self.spawner.release_if_occupant(id);
        self.events.push(GameEvent::ItemDestroyed { id, kind, cause });
        self.events.push(GameEvent::Effect {
            effect: EffectKind::Destroy,
            pos,
        });
        true
    }

    /// Drop destroyed items and keep id order
    pub fn normalize_order(&mut self) {
        self.items.retain(Item::is_alive);
        self.items.sort_by_key(|it| it.id);
    }

    // === Session control ===

    pub fn start_game(&mut self, ledger: &mut EconomyLedger) {
        if self.phase == GamePhase::Playing {
            return;
        }
        if self.phase == GamePhase::GameOver {
            log::debug!("start_game during game over; resetting instead");
            self.reset_game(ledger);
            return;
        }
        self.phase = GamePhase::Playing;
        self.progression.refresh_goal(ledger, &mut self.rng, &mut self.events);
        self.events.push(GameEvent::SessionStarted);
        log::info!("Session started (seed {})", self.seed);
        self.request_spawn();
    }

    /// Pause the session: no spawns, no loss checks. Pending merges still land.
    pub fn stop_game(&mut self) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.phase = GamePhase::Idle;
        self.cancel_pending_spawn();
        log::info!("Session stopped");
    }

    /// Start a fresh session: empty field, session experience and satisfaction
    /// back to zero, no booster, loss latch cleared
    pub fn reset_game(&mut self, ledger: &mut EconomyLedger) {
        ledger.reset_session_experience();
        if self.progression.reset_session() {
            self.events.push(GameEvent::SatisfactionChanged {
                level: SatisfactionLevel::Hungry,
            });
        }
        self.monitor.reset();
        self.deactivate_booster();

        let ids: Vec<ItemId> = self.live_items().map(|it| it.id).collect();
        for id in ids {
            self.destroy_item(id, DestroyCause::FieldClear);
        }
        self.normalize_order();
        self.world.clear();
        // Field is empty, so any pending merge would abort anyway
        self.scheduler.clear();
        self.merges.reset();
        self.spawner.reset_session();

        self.phase = GamePhase::Playing;
        self.events.push(GameEvent::SessionReset);
        log::info!("Session reset");
        self.progression.refresh_goal(ledger, &mut self.rng, &mut self.events);
        self.request_spawn();
    }

    // === Spawning ===

    /// Ask for a new item in the slot after the debounce delay
    pub fn request_spawn(&mut self) {
        if !self.is_active() {
            log::debug!("Spawn request ignored: game not active");
            return;
        }
        if self.booster.reserves_spawn_slot() {
            log::debug!("Spawn request ignored: slot reserved by booster");
            return;
        }
        if !self.spawner.can_request() {
            log::debug!("Spawn request ignored: slot occupied or spawn pending");
            return;
        }
        let timer = self
            .scheduler
            .schedule_after(secs(self.tuning.timing.spawn_delay), Timer::MaterializeSpawn);
        self.spawner.mark_in_flight(timer);
    }

    /// Debounced spawn fires: re-check everything, then create the item
    pub(crate) fn materialize_spawn(&mut self, ledger: &EconomyLedger) {
        self.spawner.finish_in_flight();
        if !self.is_active() || self.booster.reserves_spawn_slot() {
            log::debug!("Spawn aborted: game inactive or slot reserved");
            return;
        }
        if self.spawner.occupant().is_some() {
            log::debug!("Spawn aborted: slot already occupied");
            return;
        }

        let kind = self.spawner.select_next_kind(
            &mut self.rng,
            ledger.session_experience(),
            &self.tuning.economy,
        );
        let pos = self.tuning.container.spawn_point;
        let id = self.next_entity_id();
        self.items.push(Item::at_spawn(id, kind.into(), pos));
        self.spawner.set_occupant(id);
        self.events.push(GameEvent::ItemSpawned {
            id,
            kind: kind.into(),
            pos,
        });
        self.events.push(GameEvent::Effect {
            effect: EffectKind::Spawn,
            pos,
        });
    }

    pub(crate) fn cancel_pending_spawn(&mut self) {
        if let Some(timer) = self.spawner.cancel() {
            self.scheduler.cancel(timer);
        }
    }

    /// Clear the slot: cancel any pending spawn and destroy the occupant
    pub(crate) fn displace_occupant(&mut self) {
        self.cancel_pending_spawn();
        if let Some(id) = self.spawner.take_occupant() {
            self.destroy_item(id, DestroyCause::Displaced);
        }
    }

    // === Player input ===

    /// Start dragging the slot item; cancels an aiming paw
    pub fn begin_drag(&mut self) -> bool {
        let Some(id) = self.spawner.occupant() else {
            return false;
        };
        if self.item(id).is_some_and(|it| it.kind.food().is_some()) {
            self.cancel_paw_aim();
        }
        self.item_mut(id).is_some_and(Item::begin_drag)
    }

    pub fn drag_to(&mut self, x: f32) -> bool {
        let (left, right) = (self.tuning.container.left, self.tuning.container.right);
        let Some(id) = self.spawner.occupant() else {
            return false;
        };
        self.item_mut(id).is_some_and(|it| it.drag_to(x, left, right))
    }

    /// Drop the slot item (drag end or tap)
    pub fn drop_occupant(&mut self) -> bool {
        match self.spawner.occupant() {
            Some(id) => self.drop_item(id),
            None => false,
        }
    }

    /// Release `id` into the field; only the slot occupant may drop
    pub fn drop_item(&mut self, id: ItemId) -> bool {
        if !self.is_active() {
            return false;
        }
        if !self.spawner.is_occupant(id) {
            log::debug!("Refusing to drop non-occupant {}", id);
            return false;
        }
        if self.item(id).is_some_and(|it| it.kind.food().is_some()) {
            self.cancel_paw_aim();
        }
        let drop_speed = self.tuning.physics.drop_speed;
        let dropped = self.item_mut(id).is_some_and(|it| it.release(drop_speed));
        if dropped {
            // Ownership passes to the field; the landing asks for the next spawn
            self.spawner.release_if_occupant(id);
            self.events.push(GameEvent::ItemDropped { id });
        }
        dropped
    }

    // === Boosters ===

    /// Spend one unit and start a booster
    pub fn activate_booster(
        &mut self,
        kind: BoosterKind,
        ledger: &mut EconomyLedger,
    ) -> Result<(), BoosterError> {
        if !self.is_active() {
            return Err(BoosterError::GameInactive);
        }
        self.booster.check_free()?;
        if !ledger.spend_boosters(kind, 1) {
            log::debug!("Booster {} refused: no units", kind.as_str());
            return Err(BoosterError::NoUnits(kind));
        }

        let active = match kind {
            BoosterKind::Bomb => {
                self.displace_occupant();
                let pos = self.tuning.container.spawn_point;
                let id = self.next_entity_id();
                self.items.push(Item::at_spawn(id, ItemKind::Bomb, pos));
                self.spawner.set_occupant(id);
                self.events.push(GameEvent::ItemSpawned {
                    id,
                    kind: ItemKind::Bomb,
                    pos,
                });
                ActiveBooster::Bomb {
                    item: id,
                    hit_item: false,
                    fuse: None,
                }
            }
            BoosterKind::Paw => {
                let c = &self.tuning.container;
                ActiveBooster::Paw {
                    reticle: (c.paw_min + c.paw_max) * 0.5,
                    phase: PawPhase::Aiming,
                }
            }
            BoosterKind::Cat => {
                self.displace_occupant();
                let timer = self
                    .scheduler
                    .schedule_after(secs(self.tuning.timing.cat_devour_delay), Timer::CatDevour);
                ActiveBooster::Cat { timer }
            }
        };
        self.booster.acquire(active)?;
        self.events.push(GameEvent::BoosterActivated { kind });
        log::info!("Booster {} activated", kind.as_str());
        Ok(())
    }

    /// Move the paw reticle (clamped to the paw region)
    pub fn set_paw_target(&mut self, pos: Vec2) {
        let (min, max) = (self.tuning.container.paw_min, self.tuning.container.paw_max);
        if let Some(ActiveBooster::Paw {
            reticle,
            phase: PawPhase::Aiming,
        }) = self.booster.active_mut()
        {
            *reticle = pos.clamp(min, max);
        }
    }

    /// Let go of the paw: strike the kind under the reticle, or fizzle
    pub fn release_paw(&mut self) {
        let Some(&ActiveBooster::Paw {
            reticle,
            phase: PawPhase::Aiming,
        }) = self.booster.active()
        else {
            return;
        };

        let radius = self.tuning.container.paw_radius;
        let target = super::booster::paw_target(reticle, radius, &self.items)
            .and_then(|it| it.kind.food());
        let Some(kind) = target else {
            // Unit stays spent
            log::debug!("Paw released over nothing");
            self.finish_booster();
            return;
        };

        let timer = self
            .scheduler
            .schedule_after(secs(self.tuning.timing.paw_strike_delay), Timer::PawStrike);
        if let Some(ActiveBooster::Paw { phase, .. }) = self.booster.active_mut() {
            *phase = PawPhase::Striking { kind, timer };
        }
        self.events.push(GameEvent::Effect {
            effect: EffectKind::PawStrike,
            pos: reticle,
        });
    }

    /// Drop an aiming paw without striking (the unit stays spent)
    pub(crate) fn cancel_paw_aim(&mut self) {
        if matches!(
            self.booster.active(),
            Some(ActiveBooster::Paw {
                phase: PawPhase::Aiming,
                ..
            })
        ) {
            log::debug!("Paw aim cancelled by food input");
            self.finish_booster();
        }
    }

    /// Release the booster lock and notify
    pub(crate) fn finish_booster(&mut self) {
        if let Some(active) = self.booster.release() {
            self.events.push(GameEvent::BoosterFinished {
                kind: active.kind(),
            });
        }
    }

    /// Tear down whatever booster is running (loss, reset)
    pub(crate) fn deactivate_booster(&mut self) {
        let Some(active) = self.booster.release() else {
            return;
        };
        match active {
            ActiveBooster::Bomb { item, fuse, .. } => {
                if let Some(fuse) = fuse {
                    self.scheduler.cancel(fuse);
                }
                self.destroy_item(item, DestroyCause::Detonated);
            }
            ActiveBooster::Paw {
                phase: PawPhase::Striking { timer, .. },
                ..
            } => {
                self.scheduler.cancel(timer);
            }
            ActiveBooster::Paw { .. } => {}
            ActiveBooster::Cat { timer } => {
                self.scheduler.cancel(timer);
            }
        }
        self.events.push(GameEvent::BoosterFinished {
            kind: active.kind(),
        });
        log::debug!("Booster {} deactivated", active.kind().as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::food::FoodKind;

    fn playing() -> (GameState, EconomyLedger) {
        let mut ledger = EconomyLedger::in_memory();
        let mut state = GameState::new(Tuning::default(), 42, &ledger);
        state.start_game(&mut ledger);
        (state, ledger)
    }

    fn fire_due(state: &mut GameState, ledger: &mut EconomyLedger) {
        state.scheduler.advance(secs(1.0));
        while let Some((_, timer)) = state.scheduler.pop_due() {
            if timer == Timer::MaterializeSpawn {
                state.materialize_spawn(ledger);
            }
        }
    }

    #[test]
    fn test_new_state_is_idle() {
        let ledger = EconomyLedger::in_memory();
        let state = GameState::new(Tuning::default(), 1, &ledger);
        assert_eq!(state.phase, GamePhase::Idle);
        assert!(state.items.is_empty());
        assert!(state.spawner.is_unlocked(FoodKind::Sausage));
    }

    #[test]
    fn test_double_request_spawns_once() {
        let (mut state, mut ledger) = playing();
        // start_game already requested one
        state.request_spawn();
        state.request_spawn();
        assert_eq!(state.scheduler.len(), 1);
        fire_due(&mut state, &mut ledger);
        assert_eq!(state.items.len(), 1);
        assert!(state.occupant().is_some());

        state.request_spawn();
        assert!(state.scheduler.is_empty());
    }

    #[test]
    fn test_spawn_rechecks_game_active() {
        let (mut state, mut ledger) = playing();
        // Clear the guard out from under the pending request
        state.phase = GamePhase::Idle;
        fire_due(&mut state, &mut ledger);
        assert!(state.items.is_empty());
        assert!(!state.spawner.is_spawn_in_flight());
    }

    #[test]
    fn test_stop_cancels_pending_spawn() {
        let (mut state, mut ledger) = playing();
        state.stop_game();
        assert!(state.scheduler.is_empty());
        fire_due(&mut state, &mut ledger);
        assert!(state.items.is_empty());
    }

    #[test]
    fn test_only_occupant_can_drop() {
        let (mut state, mut ledger) = playing();
        fire_due(&mut state, &mut ledger);
        let stray = state.insert_settled_item(FoodKind::Eggs.into(), Vec2::ZERO);
        assert!(!state.drop_item(stray));

        let occupant = state.spawner.occupant().unwrap();
        assert!(state.drop_item(occupant));
        assert_eq!(state.spawner.occupant(), None);
        assert!(!state.drop_item(occupant));
    }

    #[test]
    fn test_destroy_is_exactly_once() {
        let (mut state, _ledger) = playing();
        let id = state.insert_settled_item(FoodKind::Eggs.into(), Vec2::ZERO);
        assert!(state.destroy_item(id, DestroyCause::Merge));
        assert!(!state.destroy_item(id, DestroyCause::Booster(BoosterKind::Cat)));
        let destroyed = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::ItemDestroyed { .. }))
            .count();
        assert_eq!(destroyed, 1);
    }

    #[test]
    fn test_booster_refused_without_units() {
        let (mut state, mut ledger) = playing();
        assert_eq!(
            state.activate_booster(BoosterKind::Paw, &mut ledger),
            Err(BoosterError::NoUnits(BoosterKind::Paw))
        );
        assert!(!state.booster.is_active());
    }

    #[test]
    fn test_booster_refused_when_idle() {
        let mut ledger = EconomyLedger::in_memory();
        ledger.add_boosters(BoosterKind::Cat, 1);
        let mut state = GameState::new(Tuning::default(), 1, &ledger);
        assert_eq!(
            state.activate_booster(BoosterKind::Cat, &mut ledger),
            Err(BoosterError::GameInactive)
        );
        assert_eq!(ledger.booster_count(BoosterKind::Cat), 1);
    }

    #[test]
    fn test_second_booster_refused_without_spending() {
        let (mut state, mut ledger) = playing();
        ledger.add_boosters(BoosterKind::Paw, 1);
        ledger.add_boosters(BoosterKind::Cat, 1);
        state.activate_booster(BoosterKind::Paw, &mut ledger).unwrap();
        assert_eq!(
            state.activate_booster(BoosterKind::Cat, &mut ledger),
            Err(BoosterError::AlreadyActive(BoosterKind::Paw))
        );
        assert_eq!(ledger.booster_count(BoosterKind::Cat), 1);
    }

    #[test]
    fn test_bomb_takes_the_slot() {
        let (mut state, mut ledger) = playing();
        fire_due(&mut state, &mut ledger);
        let food = state.spawner.occupant().unwrap();
        ledger.add_boosters(BoosterKind::Bomb, 1);

        state.activate_booster(BoosterKind::Bomb, &mut ledger).unwrap();
        assert!(state.item(food).is_none());
        let bomb = state.occupant().unwrap();
        assert_eq!(bomb.kind, ItemKind::Bomb);

        // No food while the bomb holds the slot
        state.request_spawn();
        assert!(!state.spawner.is_spawn_in_flight());
    }

    #[test]
    fn test_dragging_food_cancels_paw_aim() {
        let (mut state, mut ledger) = playing();
        fire_due(&mut state, &mut ledger);
        ledger.add_boosters(BoosterKind::Paw, 1);
        state.activate_booster(BoosterKind::Paw, &mut ledger).unwrap();

        assert!(state.begin_drag());
        assert!(!state.booster.is_active());
        assert_eq!(ledger.booster_count(BoosterKind::Paw), 0);
    }

    #[test]
    fn test_paw_reticle_is_clamped() {
        let (mut state, mut ledger) = playing();
        ledger.add_boosters(BoosterKind::Paw, 1);
        state.activate_booster(BoosterKind::Paw, &mut ledger).unwrap();
        state.set_paw_target(Vec2::new(10.0, 10.0));
        let max = state.tuning.container.paw_max;
        assert!(matches!(
            state.booster.active(),
            Some(ActiveBooster::Paw { reticle, .. }) if *reticle == max
        ));
    }

    #[test]
    fn test_reset_clears_field_and_session() {
        let (mut state, mut ledger) = playing();
        fire_due(&mut state, &mut ledger);
        state.insert_settled_item(FoodKind::Soup.into(), Vec2::ZERO);
        ledger.add_session_experience(300);
        state.monitor.trigger();

        state.reset_game(&mut ledger);
        assert!(state.items.is_empty());
        assert_eq!(ledger.session_experience(), 0);
        assert!(!state.monitor.is_triggered());
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.spawner.spawn_count(), 0);
        assert!(state.spawner.is_spawn_in_flight());
    }
}
