//! Economy ledger
//!
//! Coins, experience, booster stock, the collection and the current goal.
//! Backed by an injected [`KvStore`]; every mutation is written through and
//! flushed. A failed flush is logged and the in-memory value stands, so the
//! simulation never stalls on storage.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::persistence::{KvStore, MemoryStore, StoreValue};
use crate::sim::booster::BoosterKind;
use crate::sim::food::FoodKind;

const KEY_COINS: &str = "coins";
const KEY_EXPERIENCE: &str = "experience";
const KEY_DISCOVERED: &str = "discovered";
const KEY_UNLOCKED: &str = "unlocked";
const KEY_GOAL: &str = "goal";
const KEY_BEST_SATISFACTION: &str = "satisfaction.best";

fn booster_key(kind: BoosterKind) -> String {
    format!("booster.{}", kind.as_str())
}

/// Change notifications for UI refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    CoinsChanged { coins: u64 },
    ExperienceChanged { total: u64, session: u64 },
    BoosterCountChanged { kind: BoosterKind, count: u32 },
    Discovered { kind: FoodKind },
    /// A kind joined the spawn pool for the first time ever
    NewUnlock { kind: FoodKind },
    GoalChanged { kind: FoodKind },
    BestSatisfactionChanged { level: u8 },
}

#[derive(Debug)]
pub struct EconomyLedger {
    store: Box<dyn KvStore>,
    coins: u64,
    experience: u64,
    session_experience: u64,
    boosters: [u32; 3],
    discovered: BTreeSet<FoodKind>,
    unlocked: BTreeSet<FoodKind>,
    goal: FoodKind,
    best_satisfaction: u8,
    events: Vec<LedgerEvent>,
}

impl EconomyLedger {
    /// Load balances from `store`; missing keys start at zero
    pub fn new(store: Box<dyn KvStore>) -> Self {
        let int = |key: &str| store.get(key).and_then(|v| v.as_int()).unwrap_or(0).max(0);
        let kinds = |key: &str| -> BTreeSet<FoodKind> {
            store
                .get(key)
                .and_then(|v| v.as_set().map(|s| s.to_vec()))
                .unwrap_or_default()
                .into_iter()
                .filter_map(|t| FoodKind::from_tier(t as usize))
                .collect()
        };

        let mut discovered = kinds(KEY_DISCOVERED);
        discovered.insert(FoodKind::BASE);

        let goal = store
            .get(KEY_GOAL)
            .and_then(|v| v.as_int())
            .and_then(|t| FoodKind::from_tier(t as usize))
            .filter(|&k| k != FoodKind::BASE)
            .unwrap_or(FoodKind::Eggs);

        let mut boosters = [0u32; 3];
        for kind in BoosterKind::ALL {
            boosters[kind.index()] = int(&booster_key(kind)).min(u32::MAX as i64) as u32;
        }

        let coins = int(KEY_COINS) as u64;
        let experience = int(KEY_EXPERIENCE) as u64;
        let unlocked = kinds(KEY_UNLOCKED);
        let best_satisfaction = int(KEY_BEST_SATISFACTION).min(u8::MAX as i64) as u8;

        let ledger = Self {
            store,
            coins,
            experience,
            session_experience: 0,
            boosters,
            discovered,
            unlocked,
            goal,
            best_satisfaction,
            events: Vec::new(),
        };
        log::info!(
            "Ledger loaded: {} coins, {} xp, {} kinds discovered",
            ledger.coins,
            ledger.experience,
            ledger.discovered.len()
        );
        ledger
    }

    /// Ledger over a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    fn write(&mut self, key: &str, value: StoreValue) {
        self.store.put(key, value);
        if let Err(err) = self.store.flush() {
            log::warn!("Failed to persist '{}': {}", key, err);
        }
    }

    fn write_set(&mut self, key: &str, kinds: &BTreeSet<FoodKind>) {
        let tiers = kinds.iter().map(|k| k.tier() as u32).collect();
        self.write(key, StoreValue::Set(tiers));
    }

    /// Take pending change notifications
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    // === Coins ===

    pub fn coins(&self) -> u64 {
        self.coins
    }

    pub fn add_coins(&mut self, amount: u64) {
        if amount == 0 {
            return;
        }
        self.coins = self.coins.saturating_add(amount);
        self.write(KEY_COINS, StoreValue::Int(self.coins as i64));
        self.events.push(LedgerEvent::CoinsChanged { coins: self.coins });
    }

    pub fn can_afford(&self, amount: u64) -> bool {
        self.coins >= amount
    }

    /// All or nothing
    pub fn spend_coins(&mut self, amount: u64) -> bool {
        if !self.can_afford(amount) {
            return false;
        }
        if amount > 0 {
            self.coins -= amount;
            self.write(KEY_COINS, StoreValue::Int(self.coins as i64));
            self.events.push(LedgerEvent::CoinsChanged { coins: self.coins });
        }
        true
    }

    // === Experience ===

    /// Lifetime experience
    pub fn experience(&self) -> u64 {
        self.experience
    }

    pub fn add_experience(&mut self, amount: u64) {
        if amount == 0 {
            return;
        }
        self.experience = self.experience.saturating_add(amount);
        self.write(KEY_EXPERIENCE, StoreValue::Int(self.experience as i64));
        self.push_experience_changed();
    }

    /// Experience earned in the current game session (not persisted)
    pub fn session_experience(&self) -> u64 {
        self.session_experience
    }

    pub fn add_session_experience(&mut self, amount: u64) {
        if amount == 0 {
            return;
        }
        self.session_experience = self.session_experience.saturating_add(amount);
        self.push_experience_changed();
    }

    pub fn reset_session_experience(&mut self) {
        self.session_experience = 0;
        self.push_experience_changed();
    }

    fn push_experience_changed(&mut self) {
        self.events.push(LedgerEvent::ExperienceChanged {
            total: self.experience,
            session: self.session_experience,
        });
    }

    // === Boosters ===

    pub fn booster_count(&self, kind: BoosterKind) -> u32 {
        self.boosters[kind.index()]
    }

    pub fn add_boosters(&mut self, kind: BoosterKind, amount: u32) {
        if amount == 0 {
            return;
        }
        let slot = &mut self.boosters[kind.index()];
        *slot = slot.saturating_add(amount);
        self.booster_changed(kind);
    }

    /// All or nothing
    pub fn spend_boosters(&mut self, kind: BoosterKind, amount: u32) -> bool {
        let slot = &mut self.boosters[kind.index()];
        if *slot < amount {
            return false;
        }
        *slot -= amount;
        if amount > 0 {
            self.booster_changed(kind);
        }
        true
    }

    /// Buy `quantity` boosters at `unit_price` coins each; fails without effect
    /// if the total is unaffordable
    pub fn purchase_boosters(&mut self, kind: BoosterKind, quantity: u32, unit_price: u32) -> bool {
        if quantity == 0 {
            return false;
        }
        let total = quantity as u64 * unit_price as u64;
        if !self.spend_coins(total) {
            log::debug!("Cannot afford {} x {} ({} coins)", quantity, kind.as_str(), total);
            return false;
        }
        self.add_boosters(kind, quantity);
        log::info!("Purchased {} x {} for {} coins", quantity, kind.as_str(), total);
        true
    }

    fn booster_changed(&mut self, kind: BoosterKind) {
        let count = self.boosters[kind.index()];
        self.write(&booster_key(kind), StoreValue::Int(count as i64));
        self.events.push(LedgerEvent::BoosterCountChanged { kind, count });
    }

    // === Collection ===

    pub fn is_discovered(&self, kind: FoodKind) -> bool {
        self.discovered.contains(&kind)
    }

    pub fn discovered(&self) -> &BTreeSet<FoodKind> {
        &self.discovered
    }

    /// Add to the collection; true only the first time
    pub fn mark_discovered(&mut self, kind: FoodKind) -> bool {
        if !self.discovered.insert(kind) {
            return false;
        }
        let discovered = self.discovered.clone();
        self.write_set(KEY_DISCOVERED, &discovered);
        self.events.push(LedgerEvent::Discovered { kind });
        true
    }

    /// "New unlock" hook; fires once per kind over the save's lifetime
    pub fn record_unlock(&mut self, kind: FoodKind) -> bool {
        if !self.unlocked.insert(kind) {
            return false;
        }
        let unlocked = self.unlocked.clone();
        self.write_set(KEY_UNLOCKED, &unlocked);
        self.events.push(LedgerEvent::NewUnlock { kind });
        true
    }

    // === Goal ===

    pub fn current_goal(&self) -> FoodKind {
        self.goal
    }

    /// Set the goal; the base tier is never a goal. Returns true if it changed.
    pub fn set_current_goal(&mut self, kind: FoodKind) -> bool {
        if kind == FoodKind::BASE || kind == self.goal {
            return false;
        }
        self.goal = kind;
        self.write(KEY_GOAL, StoreValue::Int(kind.tier() as i64));
        self.events.push(LedgerEvent::GoalChanged { kind });
        true
    }

    // === Satisfaction ===

    pub fn best_satisfaction(&self) -> u8 {
        self.best_satisfaction
    }

    /// Record a satisfaction level; true if it beats the stored best
    pub fn record_satisfaction(&mut self, level: u8) -> bool {
        if level <= self.best_satisfaction {
            return false;
        }
        self.best_satisfaction = level;
        self.write(KEY_BEST_SATISFACTION, StoreValue::Int(level as i64));
        self.events.push(LedgerEvent::BestSatisfactionChanged { level });
        true
    }

    /// Wipe all progress (keeps the store, clears its keys)
    pub fn reset_all(&mut self) {
        for key in [
            KEY_COINS,
            KEY_EXPERIENCE,
            KEY_DISCOVERED,
            KEY_UNLOCKED,
            KEY_GOAL,
            KEY_BEST_SATISFACTION,
        ] {
            self.store.remove(key);
        }
        for kind in BoosterKind::ALL {
            self.store.remove(&booster_key(kind));
        }
        if let Err(err) = self.store.flush() {
            log::warn!("Failed to persist reset: {}", err);
        }

        self.coins = 0;
        self.experience = 0;
        self.session_experience = 0;
        self.boosters = [0; 3];
        self.discovered = BTreeSet::from([FoodKind::BASE]);
        self.unlocked.clear();
        self.goal = FoodKind::Eggs;
        self.best_satisfaction = 0;
        self.events.push(LedgerEvent::CoinsChanged { coins: 0 });
        self.push_experience_changed();
        log::info!("Ledger reset");
    }
}
