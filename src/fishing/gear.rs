//! Rods and bait.

use serde::{Deserialize, Serialize};

use crate::shared::Currency;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RodTier {
    #[default]
    Bamboo,
    Spiritwood,
    Jade,
    Dragonbone,
}

impl RodTier {
    /// 0 for the starting rod.
    pub fn index(self) -> u32 {
        match self {
            RodTier::Bamboo => 0,
            RodTier::Spiritwood => 1,
            RodTier::Jade => 2,
            RodTier::Dragonbone => 3,
        }
    }

    pub fn next(self) -> Option<RodTier> {
        match self {
            RodTier::Bamboo => Some(RodTier::Spiritwood),
            RodTier::Spiritwood => Some(RodTier::Jade),
            RodTier::Jade => Some(RodTier::Dragonbone),
            RodTier::Dragonbone => None,
        }
    }

    /// Coins to upgrade from this tier to the next.
    pub fn upgrade_cost(self) -> Option<u64> {
        match self {
            RodTier::Bamboo => Some(500),
            RodTier::Spiritwood => Some(2_000),
            RodTier::Jade => Some(8_000),
            RodTier::Dragonbone => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaitKind {
    #[default]
    Worm,
    SpiritShrimp,
    GoldenLure,
}

impl BaitKind {
    pub fn label(self) -> &'static str {
        match self {
            BaitKind::Worm => "worm",
            BaitKind::SpiritShrimp => "spirit shrimp",
            BaitKind::GoldenLure => "golden lure",
        }
    }

    /// Unit price and the currency it is paid in.
    pub fn price(self) -> (Currency, u64) {
        match self {
            BaitKind::Worm => (Currency::Coins, 10),
            BaitKind::SpiritShrimp => (Currency::Coins, 50),
            BaitKind::GoldenLure => (Currency::Pearls, 5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BaitStock {
    pub worm: u32,
    pub spirit_shrimp: u32,
    pub golden_lure: u32,
}

impl Default for BaitStock {
    fn default() -> Self {
        Self {
            worm: 10,
            spirit_shrimp: 0,
            golden_lure: 0,
        }
    }
}

impl BaitStock {
    pub fn get(&self, kind: BaitKind) -> u32 {
        match kind {
            BaitKind::Worm => self.worm,
            BaitKind::SpiritShrimp => self.spirit_shrimp,
            BaitKind::GoldenLure => self.golden_lure,
        }
    }

    pub fn get_mut(&mut self, kind: BaitKind) -> &mut u32 {
        match kind {
            BaitKind::Worm => &mut self.worm,
            BaitKind::SpiritShrimp => &mut self.spirit_shrimp,
            BaitKind::GoldenLure => &mut self.golden_lure,
        }
    }
}
