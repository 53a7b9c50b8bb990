//! Loss line monitor
//!
//! Polls on a fixed interval rather than every step. Each poll first scans
//! every settled food item, then the caller applies the result, so nothing
//! mutates the collection mid-scan. The loss fires once per session.

use super::item::{Item, ItemId};

/// Outcome of one poll
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryScan {
    /// Desired warning flag for every settled food item
    pub warnings: Vec<(ItemId, bool)>,
    /// At least one item is at or above the line
    pub breached: bool,
}

/// Settled food at or above `loss_line` is in breach
pub fn scan(items: &[Item], loss_line: f32) -> BoundaryScan {
    let warnings: Vec<(ItemId, bool)> = items
        .iter()
        .filter(|it| it.is_settled() && it.kind.food().is_some())
        .map(|it| (it.id, it.pos().y >= loss_line))
        .collect();
    let breached = warnings.iter().any(|&(_, on)| on);
    BoundaryScan { warnings, breached }
}

#[derive(Debug, Clone, Default)]
pub struct LossMonitor {
    accumulator: f32,
    triggered: bool,
}

impl LossMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Advance the poll clock; true when a poll is due this step
    pub fn poll_due(&mut self, dt: f32, interval: f32) -> bool {
        self.accumulator += dt;
        if self.accumulator + 1e-6 < interval {
            return false;
        }
        // One poll per step; a long stall does not queue a burst
        self.accumulator = (self.accumulator - interval).min(interval);
        true
    }

    /// Latch the loss; false if it already fired this session
    pub fn trigger(&mut self) -> bool {
        if self.triggered {
            return false;
        }
        self.triggered = true;
        true
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.triggered = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::food::{FoodKind, ItemKind};
    use glam::Vec2;

    #[test]
    fn test_scan_flags_settled_items_only() {
        let mut falling = Item::at_spawn(ItemId(3), FoodKind::Sausage.into(), Vec2::new(0.0, 3.0));
        falling.release(2.0);
        let items = vec![
            Item::settled(ItemId(1), FoodKind::Eggs.into(), Vec2::new(0.0, 2.5)),
            Item::settled(ItemId(2), FoodKind::Eggs.into(), Vec2::new(0.5, 1.0)),
            falling,
            Item::settled(ItemId(4), ItemKind::Bomb, Vec2::new(0.0, 2.8)),
        ];
        let result = scan(&items, 2.5);
        assert!(result.breached);
        assert_eq!(result.warnings, vec![(ItemId(1), true), (ItemId(2), false)]);
    }

    #[test]
    fn test_scan_clear_field() {
        let items = vec![Item::settled(ItemId(1), FoodKind::Eggs.into(), Vec2::new(0.0, 2.49))];
        assert!(!scan(&items, 2.5).breached);
    }

    #[test]
    fn test_poll_interval() {
        let mut monitor = LossMonitor::new();
        let dt = 1.0 / 60.0;
        let polls = (0..60).filter(|_| monitor.poll_due(dt, 0.1)).count();
        assert_eq!(polls, 10);
    }

    #[test]
    fn test_trigger_is_one_shot() {
        let mut monitor = LossMonitor::new();
        assert!(monitor.trigger());
        assert!(!monitor.trigger());
        monitor.reset();
        assert!(!monitor.is_triggered());
        assert!(monitor.trigger());
    }
}
