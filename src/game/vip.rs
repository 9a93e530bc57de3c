//! VIP tiers, unlocked by cumulative real-money recharge.

/// Cumulative recharge needed for VIP 1..=10.
pub const VIP_THRESHOLDS: [u64; 10] = [6, 30, 98, 198, 328, 648, 1_000, 2_000, 5_000, 10_000];

/// Recharge spirit stones credited per currency unit recharged.
pub const RECHARGE_STONES_PER_UNIT: u64 = 10;

pub fn vip_level_for(total_recharge: u64) -> u32 {
    VIP_THRESHOLDS
        .iter()
        .take_while(|&&threshold| total_recharge >= threshold)
        .count() as u32
}

/// Passive bonuses granted by a VIP level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VipBenefits {
    pub daily_silver: u64,
    pub cultivation_speed_percent: u32,
    pub extra_farm_plots: u32,
}

pub fn benefits(level: u32) -> VipBenefits {
    let level = level.min(VIP_THRESHOLDS.len() as u32);
    VipBenefits {
        daily_silver: level as u64 * 500,
        cultivation_speed_percent: level * 5,
        extra_farm_plots: level / 3,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VipChange {
    pub previous_level: u32,
    pub new_level: u32,
    pub stones_credited: u64,
}
