//! Leveling rule shared by cultivation and fishing progression.
//!
//! Experience is added to the current pool, then every full `max_exp` is
//! traded for a level. Each level raises the requirement by the curve's
//! growth factor (rounded down) and adds the curve's power bonus. The loop
//! only depends on the resulting pool, so splitting a gain across several
//! calls lands on the same state as a single call with the sum.

use serde::{Deserialize, Serialize};

/// Level state a curve operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub level: u32,
    pub exp: u64,
    pub max_exp: u64,
    pub power: u64,
}

/// How the exp requirement and the power bonus scale per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelCurve {
    pub growth_numerator: u64,
    pub growth_denominator: u64,
    pub power_per_level: u64,
}

impl LevelCurve {
    /// Player cultivation: requirement ×1.2, +15 combat power per level.
    pub const CULTIVATION: LevelCurve = LevelCurve {
        growth_numerator: 6,
        growth_denominator: 5,
        power_per_level: 15,
    };

    /// Fishing mastery: requirement ×1.5, no power bonus.
    pub const FISHING: LevelCurve = LevelCurve {
        growth_numerator: 3,
        growth_denominator: 2,
        power_per_level: 0,
    };

    /// Requirement for the level after one with requirement `max_exp`.
    /// Always grows by at least one, so a gain settles in a bounded number
    /// of levels even from a tiny requirement.
    pub fn next_max_exp(&self, max_exp: u64) -> u64 {
        let grown = u128::from(max_exp) * u128::from(self.growth_numerator)
            / u128::from(self.growth_denominator.max(1));
        u64::try_from(grown)
            .unwrap_or(u64::MAX)
            .max(max_exp.saturating_add(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelOutcome {
    pub progress: Progress,
    pub levels_gained: u32,
}

/// Apply `gain` experience under `curve`.
///
/// Postcondition: `0 <= exp < max_exp` and `max_exp > 0`.
pub fn apply_exp_gain(progress: Progress, gain: u64, curve: &LevelCurve) -> LevelOutcome {
    let mut next = Progress {
        exp: progress.exp.saturating_add(gain),
        max_exp: progress.max_exp.max(1),
        ..progress
    };
    let mut levels_gained = 0;

    while next.exp >= next.max_exp {
        next.exp -= next.max_exp;
        next.level = next.level.saturating_add(1);
        next.max_exp = curve.next_max_exp(next.max_exp);
        next.power = next.power.saturating_add(curve.power_per_level);
        levels_gained += 1;
    }

    LevelOutcome {
        progress: next,
        levels_gained,
    }
}
