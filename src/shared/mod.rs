//! Shared resource kinds, sects, rejection reasons and events.
//!
//! This is the type contract. Every store module imports from here.
//! No store imports from another store directly.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod clock;

pub use clock::{calendar_date, Clock, ManualClock, SharedClock, SystemClock};

pub use crate::notifications::Severity;

// ═══════════════════════════════════════════════════════════════════════
// RESOURCES (currencies and experience)
// ═══════════════════════════════════════════════════════════════════════

/// A balance on the player profile that rewards can be credited to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Silver,
    GoldIngots,
    SpiritStones,
    RechargeSpiritStones,
    Exp,
}

impl ResourceKind {
    /// Human-readable name used in notifications.
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Silver => "silver",
            ResourceKind::GoldIngots => "gold ingots",
            ResourceKind::SpiritStones => "spirit stones",
            ResourceKind::RechargeSpiritStones => "recharge spirit stones",
            ResourceKind::Exp => "experience",
        }
    }
}

impl FromStr for ResourceKind {
    type Err = Rejection;

    /// Accepts the reward keys used by quest and event data, including the
    /// `gold`/`diamonds` names of the alternate currency layout.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "silver" | "gold" => Ok(ResourceKind::Silver),
            "goldIngots" | "gold_ingots" | "diamonds" => Ok(ResourceKind::GoldIngots),
            "spiritStones" | "spirit_stones" => Ok(ResourceKind::SpiritStones),
            "rechargeSpiritStones" | "recharge_spirit_stones" => {
                Ok(ResourceKind::RechargeSpiritStones)
            }
            "exp" | "experience" => Ok(ResourceKind::Exp),
            other => Err(Rejection::UnknownResource(other.to_string())),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SECTS
// ═══════════════════════════════════════════════════════════════════════

/// The eight mutually exclusive factions offered during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectId {
    AzureCloud,
    BlazingSun,
    FrostPeak,
    ThunderValley,
    JadeLotus,
    IronMountain,
    ShadowMoon,
    HeavenlySword,
}

impl SectId {
    pub const ALL: [SectId; 8] = [
        SectId::AzureCloud,
        SectId::BlazingSun,
        SectId::FrostPeak,
        SectId::ThunderValley,
        SectId::JadeLotus,
        SectId::IronMountain,
        SectId::ShadowMoon,
        SectId::HeavenlySword,
    ];

    pub fn id(self) -> &'static str {
        match self {
            SectId::AzureCloud => "azure_cloud",
            SectId::BlazingSun => "blazing_sun",
            SectId::FrostPeak => "frost_peak",
            SectId::ThunderValley => "thunder_valley",
            SectId::JadeLotus => "jade_lotus",
            SectId::IronMountain => "iron_mountain",
            SectId::ShadowMoon => "shadow_moon",
            SectId::HeavenlySword => "heavenly_sword",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SectId::AzureCloud => "Azure Cloud Sect",
            SectId::BlazingSun => "Blazing Sun Sect",
            SectId::FrostPeak => "Frost Peak Sect",
            SectId::ThunderValley => "Thunder Valley Sect",
            SectId::JadeLotus => "Jade Lotus Sect",
            SectId::IronMountain => "Iron Mountain Sect",
            SectId::ShadowMoon => "Shadow Moon Sect",
            SectId::HeavenlySword => "Heavenly Sword Sect",
        }
    }
}

impl FromStr for SectId {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectId::ALL
            .into_iter()
            .find(|sect| sect.id() == s.trim())
            .ok_or_else(|| Rejection::UnknownSect(s.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// CURRENCIES (fishing)
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Coins,
    Pearls,
}

impl Currency {
    pub fn label(self) -> &'static str {
        match self {
            Currency::Coins => "coins",
            Currency::Pearls => "pearls",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// REJECTIONS
// ═══════════════════════════════════════════════════════════════════════

/// Why a store operation was not applied.
///
/// Operations validate before they mutate, so a rejection means the store
/// was left untouched. The one documented exception is
/// [`Rejection::UnknownResource`] from the string-keyed reward path, which
/// still records its notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("unknown resource kind '{0}'")]
    UnknownResource(String),

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("unknown sect '{0}'")]
    UnknownSect(String),

    #[error("player name must not be empty")]
    EmptyName,

    #[error("already logged in on {0}")]
    AlreadyLoggedIn(String),

    #[error("event '{0}' is already active")]
    DuplicateEvent(String),

    #[error("unknown event reward '{0}'")]
    UnknownReward(String),

    #[error("event reward '{0}' was already claimed")]
    AlreadyClaimed(String),

    #[error("event '{0}' has ended")]
    EventEnded(String),

    #[error("unknown plot {0}")]
    UnknownPlot(u32),

    #[error("unknown crop '{0}'")]
    UnknownCrop(String),

    #[error("plot {0} is already planted")]
    PlotOccupied(u32),

    #[error("plot {0} is empty")]
    PlotEmpty(u32),

    #[error("plot {plot} needs {remaining_minutes} more minute(s)")]
    NotReady { plot: u32, remaining_minutes: u64 },

    #[error("all plots are already unlocked")]
    NoLockedPlots,

    #[error("need {needed} {currency}, have {available}")]
    InsufficientFunds {
        currency: &'static str,
        needed: u64,
        available: u64,
    },

    #[error("no fish with id {0}")]
    UnknownFish(u64),

    #[error("fish tank is full ({0} fish)")]
    TankFull(usize),

    #[error("rod is already at the highest tier")]
    MaxRodTier,

    #[error("no {0} bait in stock")]
    OutOfBait(String),

    #[error("unknown shop item '{0}'")]
    UnknownItem(String),
}

impl Rejection {
    pub(crate) fn insufficient(currency: &'static str, needed: u64, available: u64) -> Self {
        Rejection::InsufficientFunds {
            currency,
            needed,
            available,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════

/// A new notification for the presentation layer to pop up.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ToastEvent {
    pub message: String,
    pub severity: Severity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_kind_aliases() {
        assert_eq!("gold".parse::<ResourceKind>(), Ok(ResourceKind::Silver));
        assert_eq!("silver".parse::<ResourceKind>(), Ok(ResourceKind::Silver));
        assert_eq!("diamonds".parse::<ResourceKind>(), Ok(ResourceKind::GoldIngots));
        assert_eq!("goldIngots".parse::<ResourceKind>(), Ok(ResourceKind::GoldIngots));
        assert_eq!(
            "rechargeSpiritStones".parse::<ResourceKind>(),
            Ok(ResourceKind::RechargeSpiritStones)
        );
        assert_eq!("exp".parse::<ResourceKind>(), Ok(ResourceKind::Exp));
    }

    #[test]
    fn test_unknown_resource_kind() {
        assert_eq!(
            "jade".parse::<ResourceKind>(),
            Err(Rejection::UnknownResource("jade".to_string()))
        );
    }

    #[test]
    fn test_eight_distinct_sects() {
        let ids: std::collections::HashSet<_> = SectId::ALL.iter().map(|s| s.id()).collect();
        assert_eq!(ids.len(), 8);
        for sect in SectId::ALL {
            assert_eq!(sect.id().parse::<SectId>(), Ok(sect));
        }
        assert!("demonic_cult".parse::<SectId>().is_err());
    }

    #[test]
    fn test_resource_kind_serializes_camel_case() {
        let json = serde_json::to_string(&ResourceKind::RechargeSpiritStones).unwrap();
        assert_eq!(json, "\"rechargeSpiritStones\"");
    }

    #[test]
    fn test_currency_display_matches_label() {
        assert_eq!(Currency::Coins.label(), "coins");
        assert_eq!(Currency::Pearls.to_string(), Currency::Pearls.label());
        assert_eq!(
            Rejection::insufficient(Currency::Pearls.label(), 5, 0).to_string(),
            "need 5 pearls, have 0"
        );
    }
}
