//! Species table and the weighted pick made on every cast.
//!
//! Better rods and bait shift weight away from common fish; nothing ever
//! drops a rarity's weight below its base.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::gear::{BaitKind, RodTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FishSpecies {
    pub id: &'static str,
    pub name: &'static str,
    pub rarity: Rarity,
    /// Coins paid per fish before the weight bonus.
    pub base_price: u64,
    /// Fishing exp per catch.
    pub exp: u64,
    pub min_grams: u32,
    pub max_grams: u32,
}

const fn species(
    id: &'static str,
    name: &'static str,
    rarity: Rarity,
    base_price: u64,
    exp: u64,
    min_grams: u32,
    max_grams: u32,
) -> FishSpecies {
    FishSpecies {
        id,
        name,
        rarity,
        base_price,
        exp,
        min_grams,
        max_grams,
    }
}

pub static SPECIES: [FishSpecies; 10] = [
    species("silver_carp", "Silver Carp", Rarity::Common, 8, 5, 300, 1_200),
    species("mud_loach", "Mud Loach", Rarity::Common, 5, 4, 50, 200),
    species("reed_perch", "Reed Perch", Rarity::Common, 10, 6, 200, 800),
    species("jade_koi", "Jade Koi", Rarity::Uncommon, 30, 15, 500, 2_000),
    species("cloud_trout", "Cloud Trout", Rarity::Uncommon, 35, 18, 400, 1_500),
    species("lantern_eel", "Lantern Eel", Rarity::Uncommon, 40, 20, 600, 2_500),
    species("frost_sturgeon", "Frost Sturgeon", Rarity::Rare, 120, 45, 2_000, 9_000),
    species("thunder_pike", "Thunder Pike", Rarity::Rare, 150, 50, 1_500, 6_000),
    species("golden_dragon_carp", "Golden Dragon Carp", Rarity::Legendary, 1_000, 200, 5_000, 20_000),
    species("azure_leviathan", "Azure Leviathan", Rarity::Legendary, 2_500, 300, 30_000, 90_000),
];

// ─── Rarity weights ──────────────────────────────────────────────────────────

fn base_weight(rarity: Rarity) -> u32 {
    match rarity {
        Rarity::Common => 60,
        Rarity::Uncommon => 25,
        Rarity::Rare => 12,
        Rarity::Legendary => 1,
    }
}

/// Relative weight of a whole rarity tier under the given gear.
pub fn rarity_weight(rarity: Rarity, rod: RodTier, bait: BaitKind) -> u32 {
    let tier = rod.index();
    let rod_bonus = match rarity {
        Rarity::Common => 0,
        Rarity::Uncommon => 5 * tier,
        Rarity::Rare => 4 * tier,
        Rarity::Legendary => tier,
    };
    let bait_bonus = match (bait, rarity) {
        (BaitKind::SpiritShrimp, Rarity::Uncommon) => 10,
        (BaitKind::SpiritShrimp, Rarity::Rare) => 6,
        (BaitKind::GoldenLure, Rarity::Rare) => 8,
        (BaitKind::GoldenLure, Rarity::Legendary) => 4,
        _ => 0,
    };
    base_weight(rarity) + rod_bonus + bait_bonus
}

// ─── Selection ───────────────────────────────────────────────────────────────

/// Pick a species for one cast.
///
/// A rarity tier's weight is shared evenly among its species.
pub fn select_species<R: Rng + ?Sized>(rng: &mut R, rod: RodTier, bait: BaitKind) -> &'static FishSpecies {
    let per_tier = |rarity: Rarity| SPECIES.iter().filter(|s| s.rarity == rarity).count() as u32;
    let weighted: Vec<(&'static FishSpecies, u32)> = SPECIES
        .iter()
        .map(|s| {
            let share = rarity_weight(s.rarity, rod, bait) * 12 / per_tier(s.rarity).max(1);
            (s, share.max(1))
        })
        .collect();
    weighted_pick(rng, &weighted).unwrap_or(&SPECIES[0])
}

/// Weighted random pick from a slice of (item, weight) pairs.
fn weighted_pick<R: Rng + ?Sized>(
    rng: &mut R,
    items: &[(&'static FishSpecies, u32)],
) -> Option<&'static FishSpecies> {
    let total: u32 = items.iter().map(|(_, w)| w).sum();
    if total == 0 {
        return None;
    }

    let mut roll = rng.gen_range(0..total);
    for (fish, weight) in items {
        if roll < *weight {
            return Some(*fish);
        }
        roll -= weight;
    }

    items.last().map(|(f, _)| *f)
}

/// Weight in grams for a fresh catch of `species`.
pub fn roll_weight<R: Rng + ?Sized>(rng: &mut R, species: &FishSpecies) -> u32 {
    rng.gen_range(species.min_grams..=species.max_grams.max(species.min_grams))
}

/// Sale price: base price plus one coin per full 100 g.
pub fn sale_price(species: &FishSpecies, grams: u32) -> u64 {
    species.base_price + grams as u64 / 100
}
