//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. One call:
//! applies input, fires due timers, steps physics, dispatches contacts,
//! polls the loss line, then drops destroyed items.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::booster::{
    ActiveBooster, BoosterKind, PawPhase, bomb_targets, field_sweep, kind_sweep,
};
use super::boundary;
use super::events::{DestroyCause, EffectKind, GameEvent};
use super::food::{FoodKind, ItemKind};
use super::item::{Item, ItemId, LifecycleState};
use super::merge::{find_adjacent_pair, merge_position};
use super::physics::{Contact, ContactPartner};
use super::state::{GamePhase, GameState, Timer, find_item};
use crate::ledger::EconomyLedger;
use crate::secs;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pick up the item in the spawn slot
    pub drag_start: bool,
    /// Pointer x while dragging
    pub drag_x: Option<f32>,
    /// Let go of a dragged item
    pub drag_end: bool,
    /// Drop the slot item straight down
    pub tap: bool,
    pub activate_booster: Option<BoosterKind>,
    /// Paw reticle position (world space)
    pub paw_target: Option<Vec2>,
    pub paw_release: bool,
    /// AI plays the game
    pub autoplay: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, ledger: &mut EconomyLedger, input: &TickInput, dt: f32) {
    let mut input = input.clone();
    if input.autoplay {
        autoplay(state, ledger, &mut input);
    }

    if let Some(kind) = input.activate_booster {
        if let Err(err) = state.activate_booster(kind, ledger) {
            log::debug!("Booster {} refused: {}", kind.as_str(), err);
        }
    }
    if input.drag_start {
        state.begin_drag();
    }
    if let Some(x) = input.drag_x {
        state.drag_to(x);
    }
    if input.drag_end || input.tap {
        state.drop_occupant();
    }
    if let Some(target) = input.paw_target {
        state.set_paw_target(target);
    }
    if input.paw_release {
        state.release_paw();
    }

    // Delayed continuations
    state.scheduler.advance(secs(dt));
    while let Some((_, timer)) = state.scheduler.pop_due() {
        fire_timer(state, ledger, timer);
    }

    if state.phase == GamePhase::Playing {
        let contacts = state.world.step(
            &mut state.items,
            dt,
            &state.tuning.physics,
            &state.tuning.container,
        );
        for contact in contacts {
            handle_contact(state, contact);
        }

        // Items resting on something that settled after first touch
        for contact in state.world.resting_contacts() {
            let falling = find_item(&state.items, contact.item)
                .is_some_and(|it| it.state() == LifecycleState::Falling);
            if falling {
                handle_contact(state, contact);
            }
        }
        retry_held_merges(state);

        let interval = state.tuning.timing.boundary_poll_interval;
        if !state.monitor.is_triggered() && state.monitor.poll_due(dt, interval) {
            poll_boundary(state);
        }
    }

    state.normalize_order();
    state.time_ticks += 1;
}

fn fire_timer(state: &mut GameState, ledger: &mut EconomyLedger, timer: Timer) {
    match timer {
        Timer::MaterializeSpawn => state.materialize_spawn(ledger),
        Timer::CompleteMerge { a, b } => complete_merge(state, ledger, a, b),
        Timer::BombDetonate => detonate_bomb(state),
        Timer::PawStrike => paw_strike(state),
        Timer::PawMergeSweep => paw_merge_sweep(state),
        Timer::CatDevour => cat_devour(state),
        Timer::LossClear => clear_field_after_loss(state),
    }
}

/// Uniform draw in `[lo, hi)`, or `lo` for an empty range
fn roll(rng: &mut Pcg32, (lo, hi): (f32, f32)) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

// === Contacts ===

fn handle_contact(state: &mut GameState, contact: Contact) {
    let Some(item) = state.item(contact.item) else {
        return;
    };
    if item.kind == ItemKind::Bomb {
        bomb_contact(state, contact);
        return;
    }

    let partner_at_rest = match contact.partner {
        ContactPartner::Floor => true,
        ContactPartner::Item(other) => state.item(other).is_some_and(Item::is_settled),
    };
    if item.state() == LifecycleState::Falling && partner_at_rest {
        land_item(state, contact);
    }
    if let ContactPartner::Item(other) = contact.partner {
        try_merge(state, contact.item, other);
    }
}

/// Falling → Settled, with landing impulses and the one spawn request
fn land_item(state: &mut GameState, contact: Contact) {
    let id = contact.item;
    let physics = &state.tuning.physics;
    let (soft_threshold, soft_factor) = (physics.soft_landing_threshold, physics.soft_landing_factor);
    let (chain_threshold, chain_radius, chain_range) = (
        physics.chain_reaction_threshold,
        physics.chain_reaction_radius,
        physics.chain_reaction_impulse,
    );

    let Some(item) = state.item_mut(id) else {
        return;
    };
    if !item.settle() {
        return;
    }
    let wants_spawn = item.take_spawn_trigger();
    let impact = contact.impact_speed();
    if impact > soft_threshold {
        let mass = item.body.mass;
        item.body.apply_impulse(-contact.relative_velocity * mass * soft_factor);
    }
    state.events.push(GameEvent::ItemSettled { id });

    if impact > chain_threshold {
        push_neighbours(state, id, contact.point, chain_radius, chain_range);
    }
    if wants_spawn {
        state.spawner.release_if_occupant(id);
        state.request_spawn();
    }
}

/// Nudge settled items near `center` outward
fn push_neighbours(state: &mut GameState, origin: ItemId, center: Vec2, radius: f32, range: (f32, f32)) {
    let targets: Vec<(ItemId, Vec2)> = state
        .live_items()
        .filter(|it| it.id != origin && it.is_settled() && it.pos().distance(center) < radius)
        .map(|it| (it.id, it.pos()))
        .collect();
    for (id, pos) in targets {
        let dir = (pos - center).normalize_or(Vec2::Y);
        let magnitude = roll(&mut state.rng, range);
        if let Some(item) = state.item_mut(id) {
            item.body.apply_impulse(dir * magnitude);
        }
    }
}

// === Merging ===

/// Claim the merge gate for `a` and `b` and schedule the completion
pub(crate) fn try_merge(state: &mut GameState, a: ItemId, b: ItemId) -> bool {
    let (Some(ia), Some(ib)) = (find_item(&state.items, a), find_item(&state.items, b)) else {
        return false;
    };
    if !state.merges.try_lock(ia, ib) {
        return false;
    }
    for id in [a, b] {
        if let Some(item) = state.item_mut(id) {
            item.body.vel = Vec2::ZERO;
        }
    }
    let delay = secs(state.tuning.timing.merge_delay);
    state.scheduler.schedule_after(delay, Timer::CompleteMerge { a, b });
    log::debug!("Merge {} + {} scheduled", a, b);
    true
}

/// Contacts only report when they begin, so a settled pair that touched
/// while the gate was busy gets its merge attempt here once the gate frees
fn retry_held_merges(state: &mut GameState) {
    if state.merges.is_busy() {
        return;
    }
    for contact in state.world.resting_contacts() {
        let ContactPartner::Item(other) = contact.partner else {
            continue;
        };
        let both_settled = [contact.item, other]
            .iter()
            .all(|&id| find_item(&state.items, id).is_some_and(Item::is_settled));
        if both_settled && try_merge(state, contact.item, other) {
            break;
        }
    }
}

/// Land a scheduled merge; aborts cleanly if an operand is gone
fn complete_merge(state: &mut GameState, ledger: &mut EconomyLedger, a: ItemId, b: ItemId) {
    let operands = match (find_item(&state.items, a), find_item(&state.items, b)) {
        (Some(ia), Some(ib)) if ia.is_settled() && ib.is_settled() => {
            ia.kind.food().and_then(FoodKind::merge_target).map(|r| (r, ia.pos(), ib.pos()))
        }
        _ => None,
    };
    let Some((result, pa, pb)) = operands else {
        state.merges.release(a, b);
        log::debug!("Merge {} + {} aborted: operand gone", a, b);
        return;
    };

    let pos = merge_position(pa, pb, result.radius(), &state.tuning.container);
    let id = state.insert_settled_item(result.into(), pos);

    if state.phase != GamePhase::GameOver {
        let physics = &state.tuning.physics;
        let (pop_x, pop_y) = (physics.merge_pop_x, physics.merge_pop_y);
        let (chain_radius, chain_range) = (physics.merge_chain_radius, physics.merge_chain_impulse);
        let pop = Vec2::new(roll(&mut state.rng, pop_x), roll(&mut state.rng, pop_y));
        if let Some(item) = state.item_mut(id) {
            item.body.apply_impulse(pop);
        }
        push_neighbours(state, id, pos, chain_radius, chain_range);
    }

    state.destroy_item(a, DestroyCause::Merge);
    state.destroy_item(b, DestroyCause::Merge);
    state.merges.release(a, b);
    state.events.push(GameEvent::ItemMerged {
        consumed: [a, b],
        result: id,
        kind: result,
        pos,
    });
    state.events.push(GameEvent::Effect {
        effect: EffectKind::Merge,
        pos,
    });

    let reward = state.progression.on_merge_completed(
        result,
        ledger,
        &mut state.spawner,
        &state.tuning.economy,
        &mut state.rng,
        &mut state.events,
    );
    log::debug!(
        "Merged {} + {} into {} {} (+{} xp)",
        a,
        b,
        result.as_str(),
        id,
        reward.experience
    );
}

// === Boosters ===

/// Arm the bomb on its first resting contact
fn bomb_contact(state: &mut GameState, contact: Contact) {
    let partner_item = match contact.partner {
        ContactPartner::Floor => None,
        ContactPartner::Item(other) => Some(other),
    };
    let partner_at_rest = partner_item.is_none_or(|other| {
        find_item(&state.items, other).is_some_and(|it| it.is_settled() && it.kind.food().is_some())
    });
    if !partner_at_rest {
        return;
    }

    let fuse_delay = secs(state.tuning.timing.bomb_fuse);
    let armed = match state.booster.active_mut() {
        Some(ActiveBooster::Bomb {
            item,
            hit_item,
            fuse,
        }) if *item == contact.item => {
            if partner_item.is_some() {
                *hit_item = true;
            }
            if fuse.is_none() {
                *fuse = Some(state.scheduler.schedule_after(fuse_delay, Timer::BombDetonate));
                true
            } else {
                false
            }
        }
        _ => false,
    };
    if armed && state.item_mut(contact.item).is_some_and(Item::settle) {
        state.events.push(GameEvent::ItemSettled { id: contact.item });
    }
}

/// Destroy what the bomb overlaps (nothing on a floor-only landing), then the bomb
pub(crate) fn detonate_bomb(state: &mut GameState) {
    let Some(&ActiveBooster::Bomb { item, hit_item, .. }) = state.booster.active() else {
        return;
    };
    let physics = &state.tuning.physics;
    let (max, slop) = (physics.bomb_max_destroyed, physics.bomb_overlap_slop);
    let (targets, pos) = match find_item(&state.items, item) {
        Some(bomb) if hit_item => (
            bomb_targets(bomb, &state.items, state.merges.locked(), max, slop),
            bomb.pos(),
        ),
        Some(bomb) => (Vec::new(), bomb.pos()),
        None => (Vec::new(), state.tuning.container.spawn_point),
    };

    log::debug!("Bomb detonated, {} items caught", targets.len());
    for id in targets {
        state.destroy_item(id, DestroyCause::Booster(BoosterKind::Bomb));
    }
    state.events.push(GameEvent::Effect {
        effect: EffectKind::Explosion,
        pos,
    });
    state.destroy_item(item, DestroyCause::Detonated);
    state.finish_booster();
    state.request_spawn();
}

/// Erase every settled item of the struck kind
pub(crate) fn paw_strike(state: &mut GameState) {
    let Some(&ActiveBooster::Paw {
        phase: PawPhase::Striking { kind, .. },
        ..
    }) = state.booster.active()
    else {
        return;
    };
    let victims = kind_sweep(kind, &state.items, state.merges.locked());
    log::debug!("Paw struck {} x{}", kind.as_str(), victims.len());
    for id in victims {
        state.destroy_item(id, DestroyCause::Booster(BoosterKind::Paw));
    }
    state.finish_booster();

    let spacing = secs(state.tuning.timing.paw_merge_spacing);
    state.scheduler.schedule_after(spacing, Timer::PawMergeSweep);
}

/// Merge newly adjacent pairs one at a time after a paw strike
pub(crate) fn paw_merge_sweep(state: &mut GameState) {
    if !state.is_active() {
        return;
    }
    let spacing = secs(state.tuning.timing.paw_merge_spacing);
    if state.merges.is_busy() {
        state.scheduler.schedule_after(spacing, Timer::PawMergeSweep);
        return;
    }
    let slop = state.tuning.physics.contact_slop;
    match find_adjacent_pair(&state.items, state.merges.locked(), slop) {
        Some((a, b)) => {
            if try_merge(state, a, b) {
                state.scheduler.schedule_after(spacing, Timer::PawMergeSweep);
            }
        }
        None => log::debug!("Paw merge sweep finished"),
    }
}

/// The cat eats every settled item not locked by a merge
pub(crate) fn cat_devour(state: &mut GameState) {
    if !matches!(state.booster.active(), Some(ActiveBooster::Cat { .. })) {
        return;
    }
    let victims = field_sweep(&state.items, state.merges.locked());
    log::debug!("Cat devoured {} items", victims.len());
    for id in victims {
        state.destroy_item(id, DestroyCause::Booster(BoosterKind::Cat));
    }
    let c = &state.tuning.container;
    let pos = Vec2::new((c.left + c.right) * 0.5, c.floor);
    state.events.push(GameEvent::Effect {
        effect: EffectKind::Devour,
        pos,
    });
    state.finish_booster();
    state.request_spawn();
}

// === Loss ===

/// Scan, apply warnings, then fire the loss if anything breached
fn poll_boundary(state: &mut GameState) {
    let scan = boundary::scan(&state.items, state.tuning.container.loss_line);
    for (id, on) in scan.warnings {
        if state.item_mut(id).is_some_and(|it| it.set_warning(on)) {
            state.events.push(GameEvent::WarningChanged { id, on });
        }
    }
    if scan.breached {
        trigger_loss(state);
    }
}

fn trigger_loss(state: &mut GameState) {
    if !state.monitor.trigger() {
        return;
    }
    state.phase = GamePhase::GameOver;
    state.events.push(GameEvent::LossTriggered);
    log::info!(
        "Loss line crossed; clearing field in {:.1}s",
        state.tuning.timing.game_over_delay
    );

    state.cancel_pending_spawn();
    if let Some(id) = state.spawner.take_occupant() {
        state.destroy_item(id, DestroyCause::Displaced);
    }
    state.deactivate_booster();
    for item in state.items.iter_mut().filter(|it| it.is_alive()) {
        item.freeze();
    }

    let delay = secs(state.tuning.timing.game_over_delay);
    state.scheduler.schedule_after(delay, Timer::LossClear);
}

fn clear_field_after_loss(state: &mut GameState) {
    if state.phase != GamePhase::GameOver {
        return;
    }
    let ids: Vec<ItemId> = state.live_items().map(|it| it.id).collect();
    for id in ids {
        state.destroy_item(id, DestroyCause::FieldClear);
    }
    state.world.clear();
    state.events.push(GameEvent::GameOver);
    log::info!("Game over");
}

// === Autoplay ===

/// Simple AI: drop on the highest matching item, use a cat when the stack
/// reaches the warning zone
fn autoplay(state: &GameState, ledger: &EconomyLedger, input: &mut TickInput) {
    if !state.is_active() {
        return;
    }
    if !state.booster.is_active()
        && ledger.booster_count(BoosterKind::Cat) > 0
        && state.live_items().any(Item::warning)
    {
        input.activate_booster = Some(BoosterKind::Cat);
        return;
    }

    let Some(occupant) = state.occupant() else {
        return;
    };
    if occupant.state() != LifecycleState::AtSpawn {
        return;
    }
    if state.live_items().any(|it| it.state() == LifecycleState::Falling) {
        return;
    }

    let c = &state.tuning.container;
    let x = state
        .live_items()
        .filter(|it| it.is_settled() && it.kind == occupant.kind)
        .max_by(|a, b| a.pos().y.total_cmp(&b.pos().y).then(b.id.cmp(&a.id)))
        .map(|it| it.pos().x)
        .unwrap_or_else(|| {
            // Spread blind drops across the box
            let t = (state.spawner.spawn_count() as f32 * 0.618_034).fract();
            c.left + (c.right - c.left) * t
        });

    input.drag_start = true;
    input.drag_x = Some(x);
    input.drag_end = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::physics::BodyMode;
    use crate::tuning::Tuning;

    fn playing(seed: u64) -> (GameState, EconomyLedger) {
        let mut ledger = EconomyLedger::in_memory();
        let mut state = GameState::new(Tuning::default(), seed, &ledger);
        state.start_game(&mut ledger);
        (state, ledger)
    }

    fn run(state: &mut GameState, ledger: &mut EconomyLedger, ticks: usize) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            tick(state, ledger, &TickInput::default(), SIM_DT);
            events.extend(state.drain_events());
        }
        events
    }

    fn on_floor(state: &GameState, kind: FoodKind, x: f32) -> Vec2 {
        Vec2::new(x, state.tuning.container.floor + kind.radius())
    }

    #[test]
    fn test_tick_spawns_after_start() {
        let (mut state, mut ledger) = playing(7);
        assert!(state.occupant().is_none());
        let events = run(&mut state, &mut ledger, 10);
        let occupant = state.occupant().unwrap();
        assert_eq!(occupant.kind, ItemKind::Food(FoodKind::Sausage));
        assert_eq!(occupant.state(), LifecycleState::AtSpawn);
        assert!(events.iter().any(|e| matches!(e, GameEvent::ItemSpawned { .. })));
    }

    #[test]
    fn test_tick_drop_lands_and_respawns_once() {
        let (mut state, mut ledger) = playing(7);
        let mut events = run(&mut state, &mut ledger, 10);
        let first = state.spawner.occupant().unwrap();

        let input = TickInput {
            tap: true,
            ..Default::default()
        };
        tick(&mut state, &mut ledger, &input, SIM_DT);
        events.extend(state.drain_events());
        events.extend(run(&mut state, &mut ledger, 300));

        assert!(state.item(first).unwrap().is_settled());
        let spawned = events
            .iter()
            .filter(|e| matches!(e, GameEvent::ItemSpawned { .. }))
            .count();
        assert_eq!(spawned, 2);
        assert!(state.occupant().is_some_and(|it| it.id != first));
    }

    #[test]
    fn test_tick_merge_awards_progression() {
        let (mut state, mut ledger) = playing(11);
        let r = FoodKind::Sausage.radius();
        let a = state.insert_settled_item(FoodKind::Sausage.into(), on_floor(&state, FoodKind::Sausage, -r + 0.005));
        let b = state.insert_settled_item(FoodKind::Sausage.into(), on_floor(&state, FoodKind::Sausage, r - 0.005));
        assert_eq!(ledger.current_goal(), FoodKind::Eggs);

        let events = run(&mut state, &mut ledger, 30);

        assert!(state.item(a).is_none() && state.item(b).is_none());
        let eggs = state
            .live_items()
            .filter(|it| it.kind == ItemKind::Food(FoodKind::Eggs))
            .count();
        assert_eq!(eggs, 1);
        assert_eq!(ledger.experience(), 10);
        assert_eq!(ledger.session_experience(), 10);
        // Discovery bonus plus goal reward
        assert_eq!(ledger.coins(), 60);
        assert!(ledger.is_discovered(FoodKind::Eggs));
        assert_eq!(ledger.current_goal(), FoodKind::Sandwich);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::GoalCompleted { kind: FoodKind::Eggs, reward: 10 }
        )));
        assert!(!state.merges.is_busy());
    }

    #[test]
    fn test_tick_two_drops_merge() {
        let (mut state, mut ledger) = playing(11);
        let tap = TickInput {
            tap: true,
            ..Default::default()
        };
        let mut events = Vec::new();
        for _ in 0..2 {
            events.extend(run(&mut state, &mut ledger, 10));
            assert!(state.occupant().is_some_and(|it| it.kind == ItemKind::Food(FoodKind::Sausage)));
            tick(&mut state, &mut ledger, &tap, SIM_DT);
            events.extend(state.drain_events());
            events.extend(run(&mut state, &mut ledger, 240));
        }

        let merged = events
            .iter()
            .filter(|e| matches!(e, GameEvent::ItemMerged { .. }))
            .count();
        assert_eq!(merged, 1);
        let eggs = state
            .live_items()
            .filter(|it| it.is_settled() && it.kind == ItemKind::Food(FoodKind::Eggs))
            .count();
        assert_eq!(eggs, 1);
        assert_eq!(ledger.experience(), 10);
        assert_eq!(ledger.coins(), 60);
        assert_eq!(ledger.current_goal(), FoodKind::Sandwich);
    }

    #[test]
    fn test_pairs_touching_in_same_step_both_merge() {
        let (mut state, mut ledger) = playing(17);
        let (rs, re) = (FoodKind::Sausage.radius(), FoodKind::Eggs.radius());
        state.insert_settled_item(FoodKind::Eggs.into(), on_floor(&state, FoodKind::Eggs, -1.0));
        state.insert_settled_item(FoodKind::Eggs.into(), on_floor(&state, FoodKind::Eggs, -1.0 + 2.0 * re));
        state.insert_settled_item(FoodKind::Sausage.into(), on_floor(&state, FoodKind::Sausage, 1.48));
        state.insert_settled_item(FoodKind::Sausage.into(), on_floor(&state, FoodKind::Sausage, 1.48 - 2.0 * rs));

        let events = run(&mut state, &mut ledger, 120);

        let merged = events
            .iter()
            .filter(|e| matches!(e, GameEvent::ItemMerged { .. }))
            .count();
        assert_eq!(merged, 2);
        let count = |kind: FoodKind| {
            state
                .live_items()
                .filter(|it| it.is_settled() && it.kind == ItemKind::Food(kind))
                .count()
        };
        assert_eq!(count(FoodKind::Sausage), 0);
        assert_eq!(count(FoodKind::Eggs), 1);
        assert_eq!(count(FoodKind::Sandwich), 1);
        assert!(!state.merges.is_busy());
    }

    #[test]
    fn test_hard_landing_pushes_away_from_contact_point() {
        let (mut state, _ledger) = playing(3);
        let neighbour = state.insert_settled_item(FoodKind::Eggs.into(), Vec2::new(0.5, -2.0));
        let id = state.next_entity_id();
        let mut falling = Item::at_spawn(id, FoodKind::Sausage.into(), Vec2::new(0.0, -2.0));
        falling.release(2.0);
        state.items.push(falling);

        // Contact to the right of the neighbour: pushed left, toward the landing item
        let contact = Contact {
            item: id,
            partner: ContactPartner::Floor,
            point: Vec2::new(1.0, -2.0),
            relative_velocity: Vec2::new(0.0, -8.0),
        };
        land_item(&mut state, contact);

        assert!(state.item(id).unwrap().is_settled());
        assert!(state.item(neighbour).unwrap().body.vel.x < 0.0);
    }

    #[test]
    fn test_tick_paw_without_units_changes_nothing() {
        let (mut state, mut ledger) = playing(3);
        run(&mut state, &mut ledger, 10);
        state.insert_settled_item(FoodKind::Eggs.into(), on_floor(&state, FoodKind::Eggs, 0.0));
        let before = state.live_items().count();

        let input = TickInput {
            activate_booster: Some(BoosterKind::Paw),
            ..Default::default()
        };
        tick(&mut state, &mut ledger, &input, SIM_DT);

        assert!(!state.booster.is_active());
        assert_eq!(state.live_items().count(), before);
        assert_eq!(ledger.booster_count(BoosterKind::Paw), 0);
        assert!(
            !state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::ItemDestroyed { .. }))
        );
    }

    #[test]
    fn test_bomb_destroys_at_most_three() {
        let (mut state, mut ledger) = playing(5);
        ledger.add_boosters(BoosterKind::Bomb, 1);

        // Five overlapping items of different kinds around a pocket under the slot
        let pocket = Vec2::new(0.0, -2.0);
        let bomb_r = ItemKind::Bomb.radius();
        let pile: Vec<ItemId> = [
            (FoodKind::Sausage, Vec2::NEG_Y),
            (FoodKind::Eggs, Vec2::NEG_X),
            (FoodKind::Sandwich, Vec2::X),
            (FoodKind::Meatball, Vec2::new(-1.0, -1.0).normalize()),
            (FoodKind::Soup, Vec2::new(1.0, -1.0).normalize()),
        ]
        .into_iter()
        .map(|(kind, dir)| {
            let id = state.insert_settled_item(kind.into(), pocket + dir * (bomb_r + kind.radius()));
            state.item_mut(id).unwrap().freeze();
            id
        })
        .collect();

        state.activate_booster(BoosterKind::Bomb, &mut ledger).unwrap();
        let bomb = state.spawner.occupant().unwrap();
        let tap = TickInput {
            tap: true,
            ..Default::default()
        };
        tick(&mut state, &mut ledger, &tap, SIM_DT);
        let mut events = state.drain_events();

        // Armed by the first contact, nothing destroyed until the fuse runs out
        let mut armed = false;
        for _ in 0..200 {
            events.extend(run(&mut state, &mut ledger, 1));
            if matches!(
                state.booster.active(),
                Some(ActiveBooster::Bomb { fuse: Some(_), .. })
            ) {
                armed = true;
                break;
            }
        }
        assert!(armed);
        assert!(matches!(
            state.booster.active(),
            Some(ActiveBooster::Bomb { hit_item: true, .. })
        ));
        assert!(pile.iter().all(|&id| state.item(id).is_some()));
        assert!(state.scheduler.pending().any(|t| *t == Timer::BombDetonate));

        events.extend(run(&mut state, &mut ledger, 60));

        let by_bomb = events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    GameEvent::ItemDestroyed {
                        cause: DestroyCause::Booster(BoosterKind::Bomb),
                        ..
                    }
                )
            })
            .count();
        assert_eq!(by_bomb, 3);
        let survivors = pile.iter().filter(|&&id| state.item(id).is_some()).count();
        assert_eq!(survivors, 2);
        assert!(state.item(bomb).is_none());
        assert!(!state.booster.is_active());
        assert!(events.contains(&GameEvent::BoosterFinished {
            kind: BoosterKind::Bomb
        }));
    }

    #[test]
    fn test_bomb_on_bare_floor_only_removes_itself() {
        let (mut state, mut ledger) = playing(5);
        ledger.add_boosters(BoosterKind::Bomb, 1);
        state.insert_settled_item(FoodKind::Eggs.into(), on_floor(&state, FoodKind::Eggs, -1.3));
        state.activate_booster(BoosterKind::Bomb, &mut ledger).unwrap();
        let bomb = state.spawner.occupant().unwrap();

        let input = TickInput {
            tap: true,
            ..Default::default()
        };
        tick(&mut state, &mut ledger, &input, SIM_DT);
        let events = run(&mut state, &mut ledger, 200);

        assert!(state.item(bomb).is_none());
        assert!(!state.booster.is_active());
        assert!(events.contains(&GameEvent::BoosterFinished {
            kind: BoosterKind::Bomb
        }));
        assert!(!events.iter().any(|e| matches!(
            e,
            GameEvent::ItemDestroyed {
                cause: DestroyCause::Booster(BoosterKind::Bomb),
                ..
            }
        )));
        // Normal spawning resumed
        assert!(state.occupant().is_some_and(|it| it.kind.food().is_some()));
    }

    #[test]
    fn test_paw_strike_erases_kind() {
        let (mut state, mut ledger) = playing(9);
        ledger.add_boosters(BoosterKind::Paw, 1);
        let left = on_floor(&state, FoodKind::Soup, -1.2);
        let right = on_floor(&state, FoodKind::Soup, 1.2);
        state.insert_settled_item(FoodKind::Soup.into(), left);
        state.insert_settled_item(FoodKind::Soup.into(), right);
        let eggs = state.insert_settled_item(FoodKind::Eggs.into(), on_floor(&state, FoodKind::Eggs, 0.0));

        let activate = TickInput {
            activate_booster: Some(BoosterKind::Paw),
            ..Default::default()
        };
        tick(&mut state, &mut ledger, &activate, SIM_DT);
        let strike = TickInput {
            paw_target: Some(left),
            paw_release: true,
            ..Default::default()
        };
        tick(&mut state, &mut ledger, &strike, SIM_DT);
        run(&mut state, &mut ledger, 60);

        let soups = state
            .live_items()
            .filter(|it| it.kind == ItemKind::Food(FoodKind::Soup))
            .count();
        assert_eq!(soups, 0);
        assert!(state.item(eggs).is_some());
        assert!(!state.booster.is_active());
        assert_eq!(ledger.booster_count(BoosterKind::Paw), 0);
    }

    #[test]
    fn test_paw_sweep_merges_adjacent_pair() {
        let (mut state, _ledger) = playing(9);
        let r = FoodKind::Eggs.radius();
        state.insert_settled_item(FoodKind::Eggs.into(), Vec2::new(-r, -2.0));
        state.insert_settled_item(FoodKind::Eggs.into(), Vec2::new(r, -2.0));
        paw_merge_sweep(&mut state);
        assert!(state.merges.is_busy());
        assert!(
            state
                .scheduler
                .pending()
                .any(|t| *t == Timer::PawMergeSweep)
        );
    }

    #[test]
    fn test_cat_skips_items_locked_by_merge() {
        let (mut state, mut ledger) = playing(13);
        ledger.add_boosters(BoosterKind::Cat, 1);
        let e1 = state.insert_settled_item(FoodKind::Eggs.into(), on_floor(&state, FoodKind::Eggs, -1.0));
        let e2 = state.insert_settled_item(FoodKind::Eggs.into(), on_floor(&state, FoodKind::Eggs, 1.0));
        let soup = state.insert_settled_item(FoodKind::Soup.into(), on_floor(&state, FoodKind::Soup, 0.0));

        assert!(try_merge(&mut state, e1, e2));
        state.activate_booster(BoosterKind::Cat, &mut ledger).unwrap();
        cat_devour(&mut state);
        assert!(state.item(soup).is_none());
        assert!(state.item(e1).is_some() && state.item(e2).is_some());

        let mut events = state.drain_events();
        events.extend(run(&mut state, &mut ledger, 20));

        let sandwiches = state
            .live_items()
            .filter(|it| it.kind == ItemKind::Food(FoodKind::Sandwich))
            .count();
        assert_eq!(sandwiches, 1);
        for id in [e1, e2, soup] {
            let destroyed = events
                .iter()
                .filter(|e| matches!(e, GameEvent::ItemDestroyed { id: d, .. } if *d == id))
                .count();
            assert_eq!(destroyed, 1, "item {} destroyed {} times", id, destroyed);
        }
    }

    #[test]
    fn test_loss_fires_once_then_clears() {
        let (mut state, mut ledger) = playing(21);
        let high = state.insert_settled_item(FoodKind::Eggs.into(), Vec2::new(0.0, 2.9));

        let mut events = run(&mut state, &mut ledger, 12);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(events.contains(&GameEvent::WarningChanged { id: high, on: true }));
        assert!(state.live_items().all(|it| it.body.mode == BodyMode::Frozen));
        assert!(state.occupant().is_none());

        // Another breach during the pause does not fire again
        state.insert_settled_item(FoodKind::Soup.into(), Vec2::new(0.5, 2.9));
        events.extend(run(&mut state, &mut ledger, 200));

        let losses = events.iter().filter(|e| **e == GameEvent::LossTriggered).count();
        assert_eq!(losses, 1);
        assert!(events.contains(&GameEvent::GameOver));
        assert_eq!(state.live_items().count(), 0);
        assert!(!state.spawner.is_spawn_in_flight());
    }

    #[test]
    fn test_autoplay_keeps_dropping() {
        let (mut state, mut ledger) = playing(1234);
        let input = TickInput {
            autoplay: true,
            ..Default::default()
        };
        for _ in 0..1200 {
            tick(&mut state, &mut ledger, &input, SIM_DT);
        }
        assert!(state.spawner.spawn_count() > 3);
        assert!(ledger.experience() > 0 || state.live_items().count() > 3);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let (mut state1, mut ledger1) = playing(99999);
        let (mut state2, mut ledger2) = playing(99999);
        let input = TickInput {
            autoplay: true,
            ..Default::default()
        };

        for _ in 0..600 {
            tick(&mut state1, &mut ledger1, &input, SIM_DT);
            tick(&mut state2, &mut ledger2, &input, SIM_DT);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.items.len(), state2.items.len());
        for (a, b) in state1.items.iter().zip(&state2.items) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.pos(), b.pos());
        }
        assert_eq!(ledger1.coins(), ledger2.coins());
        assert_eq!(ledger1.experience(), ledger2.experience());
    }
}
