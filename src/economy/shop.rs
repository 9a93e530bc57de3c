//! The sect market catalog.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopCategory {
    Pill,
    Equipment,
    Material,
    Talisman,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopItem {
    pub id: String,
    pub name: String,
    pub category: ShopCategory,
    /// Silver.
    pub price: u64,
    pub quantity: u32,
    /// Seeded sales figure for the listing.
    pub revenue: u64,
}

fn item(
    id: &str,
    name: &str,
    category: ShopCategory,
    price: u64,
    quantity: u32,
    revenue: u64,
) -> ShopItem {
    ShopItem {
        id: id.to_string(),
        name: name.to_string(),
        category,
        price,
        quantity,
        revenue,
    }
}

/// The catalog a fresh shop starts with.
pub fn default_catalog() -> Vec<ShopItem> {
    use ShopCategory::*;
    vec![
        item("foundation_pill", "Foundation Establishment Pill", Pill, 500, 120, 62_000),
        item("qi_gathering_pill", "Qi Gathering Pill", Pill, 80, 940, 71_500),
        item("marrow_cleansing_pill", "Marrow Cleansing Pill", Pill, 1_200, 8, 38_400),
        item("azure_flying_sword", "Azure Flying Sword", Equipment, 3_800, 5, 45_600),
        item("cloud_silk_robe", "Cloud Silk Robe", Equipment, 2_200, 14, 30_800),
        item("star_iron", "Star Iron Ingot", Material, 150, 300, 22_500),
        item("spirit_jade", "Spirit Jade Shard", Material, 60, 3, 9_000),
        item("thunder_talisman", "Five Thunders Talisman", Talisman, 420, 45, 16_800),
        item("warding_talisman", "Golden Bell Warding Talisman", Talisman, 300, 0, 12_000),
    ]
}

/// Format an amount with thousands separators (e.g. "1,234").
pub fn format_amount(amount: u64) -> String {
    let digits: Vec<char> = amount.to_string().chars().collect();
    let mut result = String::new();
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*ch);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(500), "500");
        assert_eq!(format_amount(1234), "1,234");
        assert_eq!(format_amount(1_000_000), "1,000,000");
    }

    #[test]
    fn test_catalog_ids_are_unique() {
        let catalog = default_catalog();
        let ids: std::collections::HashSet<_> = catalog.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.len());
    }
}
