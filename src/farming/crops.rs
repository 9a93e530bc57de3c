//! Spirit-herb catalog.

/// Static definition of a plantable crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropDef {
    pub id: &'static str,
    pub name: &'static str,
    pub growth_minutes: u32,
    pub base_yield: u32,
}

pub static CROPS: [CropDef; 6] = [
    CropDef {
        id: "spirit_rice",
        name: "Spirit Rice",
        growth_minutes: 30,
        base_yield: 10,
    },
    CropDef {
        id: "frost_grass",
        name: "Frost Grass",
        growth_minutes: 45,
        base_yield: 12,
    },
    CropDef {
        id: "moonlight_herb",
        name: "Moonlight Herb",
        growth_minutes: 60,
        base_yield: 15,
    },
    CropDef {
        id: "jade_ginseng",
        name: "Jade Ginseng",
        growth_minutes: 120,
        base_yield: 25,
    },
    CropDef {
        id: "thunder_bamboo",
        name: "Thunder Bamboo",
        growth_minutes: 180,
        base_yield: 30,
    },
    CropDef {
        id: "fire_lotus",
        name: "Fire Lotus",
        growth_minutes: 240,
        base_yield: 40,
    },
];

pub fn crop(id: &str) -> Option<&'static CropDef> {
    CROPS.iter().find(|c| c.id == id)
}

/// Milliseconds from planting until a crop of `growth_minutes` is ripe.
pub fn growth_millis(growth_minutes: u32) -> i64 {
    growth_minutes as i64 * 60_000
}

/// Whole minutes left until ripe, rounded up. Zero once ripe.
pub fn remaining_minutes(planted_at: i64, growth_minutes: u32, now: i64) -> u64 {
    let left = growth_millis(growth_minutes).saturating_sub(now.saturating_sub(planted_at));
    if left <= 0 {
        0
    } else {
        ((left + 59_999) / 60_000) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_are_unique() {
        let ids: std::collections::HashSet<_> = CROPS.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), CROPS.len());
        assert!(crop("spirit_rice").is_some());
        assert!(crop("weeds").is_none());
    }

    #[test]
    fn test_remaining_minutes_rounds_up() {
        assert_eq!(remaining_minutes(0, 30, 0), 30);
        assert_eq!(remaining_minutes(0, 30, 29 * 60_000), 1);
        assert_eq!(remaining_minutes(0, 30, 29 * 60_000 + 1), 1);
        assert_eq!(remaining_minutes(0, 30, 30 * 60_000), 0);
        assert_eq!(remaining_minutes(0, 30, 90 * 60_000), 0);
    }

    #[test]
    fn test_remaining_minutes_with_extreme_timestamps() {
        assert_eq!(remaining_minutes(i64::MIN, 30, 0), 0);
        assert_eq!(remaining_minutes(i64::MAX, 30, 0), 30);
        assert_eq!(remaining_minutes(i64::MAX, 30, i64::MIN), 30);
    }
}
