//! Food tiers and item kinds
//!
//! The merge chain is a fixed ladder of 11 tiers. Two settled items of the same
//! tier merge into the next one; the top tier (lobster) is terminal.

use serde::{Deserialize, Serialize};

/// Food tier, ordered base → epic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FoodKind {
    Sausage,
    Eggs,
    Sandwich,
    Meatball,
    Soup,
    Chicken,
    Salmon,
    Shrimp,
    Caviar,
    Oyster,
    Lobster,
}

/// Rarity bracket of a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoodCategory {
    Basic,
    Medium,
    Rare,
    Epic,
}

/// Rigid-body parameters for a kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyProfile {
    pub mass: f32,
    pub damping: f32,
}

impl FoodKind {
    /// All tiers in merge order
    pub const ALL: [FoodKind; 11] = [
        FoodKind::Sausage,
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

    /// The base tier, always discovered and never a goal
    pub const BASE: FoodKind = FoodKind::Sausage;
    /// The terminal tier
    pub const TERMINAL: FoodKind = FoodKind::Lobster;
    /// Mid-tier kind that may join the spawn pool once enough experience is earned
    pub const MID_TIER_SPAWN: FoodKind = FoodKind::Meatball;

    /// Zero-based position in the merge chain
    #[inline]
    pub fn tier(self) -> usize {
        self as usize
    }

    pub fn from_tier(tier: usize) -> Option<Self> {
        Self::ALL.get(tier).copied()
    }

    /// Kind produced by merging two of this kind (None for the terminal tier)
    pub fn merge_target(self) -> Option<Self> {
        Self::from_tier(self.tier() + 1)
    }

    pub fn category(self) -> FoodCategory {
        match self.tier() {
            0..=2 => FoodCategory::Basic,
            3..=5 => FoodCategory::Medium,
            6..=7 => FoodCategory::Rare,
            _ => FoodCategory::Epic,
        }
    }

    /// Basic kinds are the only ones the spawner hands out unconditionally
    pub fn is_basic(self) -> bool {
        self.category() == FoodCategory::Basic
    }

    /// Collision radius; each tier is a bit larger than the last
    pub fn radius(self) -> f32 {
        0.22 + 0.06 * self.tier() as f32
    }

    pub fn body_profile(self) -> BodyProfile {
        match self {
            FoodKind::Sausage => BodyProfile { mass: 0.8, damping: 0.5 },
            FoodKind::Eggs => BodyProfile { mass: 0.6, damping: 0.3 },
            FoodKind::Sandwich => BodyProfile { mass: 1.0, damping: 0.7 },
            FoodKind::Meatball => BodyProfile { mass: 1.2, damping: 0.8 },
            _ => BodyProfile { mass: 1.0, damping: 0.5 },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FoodKind::Sausage => "sausage",
            FoodKind::Eggs => "eggs",
            FoodKind::Sandwich => "sandwich",
            FoodKind::Meatball => "meatball",
            FoodKind::Soup => "soup",
            FoodKind::Chicken => "chicken",
            FoodKind::Salmon => "salmon",
            FoodKind::Shrimp => "shrimp",
            FoodKind::Caviar => "caviar",
            FoodKind::Oyster => "oyster",
            FoodKind::Lobster => "lobster",
        }
    }
}

/// What an item in the field is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Food(FoodKind),
    /// Bomb booster body; falls like food but never merges
    Bomb,
}

impl ItemKind {
    pub fn food(self) -> Option<FoodKind> {
        match self {
            ItemKind::Food(kind) => Some(kind),
            ItemKind::Bomb => None,
        }
    }

    pub fn merge_target(self) -> Option<ItemKind> {
        self.food().and_then(FoodKind::merge_target).map(ItemKind::Food)
    }

    pub fn radius(self) -> f32 {
        match self {
            ItemKind::Food(kind) => kind.radius(),
            ItemKind::Bomb => crate::consts::BOMB_RADIUS,
        }
    }

    pub fn body_profile(self) -> BodyProfile {
        match self {
            ItemKind::Food(kind) => kind.body_profile(),
            ItemKind::Bomb => BodyProfile { mass: 1.0, damping: 0.5 },
        }
    }
}

impl From<FoodKind> for ItemKind {
    fn from(kind: FoodKind) -> Self {
        ItemKind::Food(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_chain_is_linear_and_terminates() {
        let mut kind = FoodKind::BASE;
        let mut steps = 0;
        while let Some(next) = kind.merge_target() {
            assert_eq!(next.tier(), kind.tier() + 1);
            kind = next;
            steps += 1;
        }
        assert_eq!(kind, FoodKind::TERMINAL);
        assert_eq!(steps, 10);
    }

    #[test]
    fn only_bottom_three_are_basic() {
        let basic: Vec<_> = FoodKind::ALL.iter().filter(|k| k.is_basic()).collect();
        assert_eq!(
            basic,
            vec![&FoodKind::Sausage, &FoodKind::Eggs, &FoodKind::Sandwich]
        );
    }

    #[test]
    fn bomb_never_merges() {
        assert_eq!(ItemKind::Bomb.merge_target(), None);
        assert_eq!(
            ItemKind::Food(FoodKind::Oyster).merge_target(),
            Some(ItemKind::Food(FoodKind::Lobster))
        );
        assert_eq!(ItemKind::Food(FoodKind::Lobster).merge_target(), None);
    }

    #[test]
    fn terminal_tier_fits_container() {
        let width = crate::consts::CONTAINER_RIGHT - crate::consts::CONTAINER_LEFT;
        assert!(FoodKind::TERMINAL.radius() * 2.0 < width);
    }
}
