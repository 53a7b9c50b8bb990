//! Merge arbitration
//!
//! One merge may be in flight across the whole field. `try_lock` either claims
//! the gate and both operands or does nothing; a request that loses is dropped,
//! not queued. The delayed completion always runs and always releases.

use std::collections::BTreeSet;

use glam::Vec2;

use super::collision::circles_overlap;
use super::item::{Item, ItemId, can_merge};
use crate::clamp_to_span;
use crate::tuning::ContainerTuning;

#[derive(Debug, Clone, Default)]
pub struct MergeResolver {
    busy: bool,
    in_flight: BTreeSet<ItemId>,
}

impl MergeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    #[inline]
    pub fn is_locked(&self, id: ItemId) -> bool {
        self.in_flight.contains(&id)
    }

    pub fn locked(&self) -> &BTreeSet<ItemId> {
        &self.in_flight
    }

    /// Claim the global gate and both operands if the pair may merge
    pub fn try_lock(&mut self, a: &Item, b: &Item) -> bool {
        if self.busy || !can_merge(a, b, &self.in_flight) {
            return false;
        }
        self.busy = true;
        self.in_flight.insert(a.id);
        self.in_flight.insert(b.id);
        true
    }

    /// Release the gate and both operands
    pub fn release(&mut self, a: ItemId, b: ItemId) {
        self.in_flight.remove(&a);
        self.in_flight.remove(&b);
        self.busy = !self.in_flight.is_empty();
    }

    pub fn reset(&mut self) {
        self.busy = false;
        self.in_flight.clear();
    }
}

/// Midpoint of the operands, pulled inside the container by the result's footprint
pub fn merge_position(a: Vec2, b: Vec2, result_radius: f32, container: &ContainerTuning) -> Vec2 {
    let mid = (a + b) * 0.5;
    Vec2::new(
        clamp_to_span(
            mid.x,
            container.left + result_radius,
            container.right - result_radius,
        ),
        mid.y.max(container.floor + result_radius),
    )
}

/// First touching pair that may merge, scanning by id and pairing each item
/// with its nearest eligible neighbour
pub fn find_adjacent_pair(items: &[Item], locked: &BTreeSet<ItemId>, slop: f32) -> Option<(ItemId, ItemId)> {
    items.iter().filter(|a| a.is_settled()).find_map(|a| {
        items
            .iter()
            .filter(|b| {
                can_merge(a, b, locked)
                    && circles_overlap(a.pos(), a.radius(), b.pos(), b.radius(), slop)
            })
            .min_by(|b1, b2| {
                a.pos()
                    .distance_squared(b1.pos())
                    .total_cmp(&a.pos().distance_squared(b2.pos()))
                    .then(b1.id.cmp(&b2.id))
            })
            .map(|b| (a.id, b.id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::food::FoodKind;

    fn settled(id: u32, kind: FoodKind) -> Item {
        Item::settled(ItemId(id), kind.into(), Vec2::ZERO)
    }

    #[test]
    fn test_single_flight_gate() {
        let mut resolver = MergeResolver::new();
        let (a, b) = (settled(1, FoodKind::Sausage), settled(2, FoodKind::Sausage));
        let (c, d) = (settled(3, FoodKind::Eggs), settled(4, FoodKind::Eggs));

        assert!(resolver.try_lock(&a, &b));
        assert!(resolver.is_busy());
        assert!(resolver.is_locked(a.id) && resolver.is_locked(b.id));

        // Unrelated eligible pair is dropped while the gate is held
        assert!(!resolver.try_lock(&c, &d));
        assert!(!resolver.is_locked(c.id));

        resolver.release(a.id, b.id);
        assert!(!resolver.is_busy());
        assert!(resolver.try_lock(&c, &d));
    }

    #[test]
    fn test_ineligible_pair_leaves_gate_free() {
        let mut resolver = MergeResolver::new();
        let (a, b) = (settled(1, FoodKind::Sausage), settled(2, FoodKind::Eggs));
        assert!(!resolver.try_lock(&a, &b));
        assert!(!resolver.is_busy());
        assert!(resolver.locked().is_empty());
    }

    #[test]
    fn test_find_adjacent_pair_prefers_nearest() {
        let items = vec![
            Item::settled(ItemId(1), FoodKind::Eggs.into(), Vec2::new(0.0, 0.0)),
            Item::settled(ItemId(2), FoodKind::Eggs.into(), Vec2::new(0.55, 0.0)),
            Item::settled(ItemId(3), FoodKind::Eggs.into(), Vec2::new(-0.5, 0.0)),
            Item::settled(ItemId(4), FoodKind::Soup.into(), Vec2::new(0.0, 0.5)),
        ];
        let none = BTreeSet::new();
        assert_eq!(find_adjacent_pair(&items, &none, 0.05), Some((ItemId(1), ItemId(3))));

        let locked: BTreeSet<_> = [ItemId(1)].into_iter().collect();
        assert_eq!(find_adjacent_pair(&items, &locked, 0.05), None);
    }

    #[test]
    fn test_find_adjacent_pair_needs_contact() {
        let items = vec![
            Item::settled(ItemId(1), FoodKind::Eggs.into(), Vec2::new(-1.0, 0.0)),
            Item::settled(ItemId(2), FoodKind::Eggs.into(), Vec2::new(1.0, 0.0)),
        ];
        assert_eq!(find_adjacent_pair(&items, &BTreeSet::new(), 0.05), None);
    }

    #[test]
    fn test_merge_position_is_clamped_midpoint() {
        let container = ContainerTuning::default();
        let p = merge_position(Vec2::new(-0.2, -2.0), Vec2::new(0.4, -2.4), 0.3, &container);
        assert!((p.x - 0.1).abs() < 1e-5);
        assert!((p.y + 2.2).abs() < 1e-5);

        // Against the right wall the result is pulled in by its own radius
        let p = merge_position(Vec2::new(1.5, 0.0), Vec2::new(1.6, 0.0), 0.5, &container);
        assert!((p.x - (container.right - 0.5)).abs() < 1e-5);

        // Never below the floor
        let p = merge_position(Vec2::new(0.0, -2.9), Vec2::new(0.0, -2.9), 0.5, &container);
        assert!((p.y - (container.floor + 0.5)).abs() < 1e-5);
    }
}
