use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Subscription plan a user is on. Ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Plus,
    Pro,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Plus => "plus",
            Tier::Pro => "pro",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tier::Free => "Free",
            Tier::Plus => "Plus",
            Tier::Pro => "Pro",
        }
    }

    /// The next tier up, if any.
    pub fn upgrade(&self) -> Option<Tier> {
        match self {
            Tier::Free => Some(Tier::Plus),
            Tier::Plus => Some(Tier::Pro),
            Tier::Pro => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "plus" => Ok(Tier::Plus),
            "pro" => Ok(Tier::Pro),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}

/// Class of assistant action that shares one daily counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Barista,
    Image,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Barista => "barista",
            ActionKind::Image => "image",
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            ActionKind::Barista => "writing assists",
            ActionKind::Image => "image generations",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writing-assistant operations. All of them draw from the `barista` counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BaristaAction {
    Draft,
    Outline,
    Polish,
    Idea,
}

impl BaristaAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaristaAction::Draft => "draft",
            BaristaAction::Outline => "outline",
            BaristaAction::Polish => "polish",
            BaristaAction::Idea => "idea",
        }
    }
}

impl FromStr for BaristaAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(BaristaAction::Draft),
            "outline" => Ok(BaristaAction::Outline),
            "polish" => Ok(BaristaAction::Polish),
            "idea" => Ok(BaristaAction::Idea),
            other => Err(format!("unknown barista action: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    pub barista_daily: i64,
    pub image_daily: i64,
}

impl TierLimits {
    pub fn daily_limit(&self, kind: ActionKind) -> i64 {
        match kind {
            ActionKind::Barista => self.barista_daily,
            ActionKind::Image => self.image_daily,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable {
    pub free: TierLimits,
    pub plus: TierLimits,
    pub pro: TierLimits,
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            free: TierLimits {
                barista_daily: 20,
                image_daily: 3,
            },
            plus: TierLimits {
                barista_daily: 100,
                image_daily: 20,
            },
            pro: TierLimits {
                barista_daily: 500,
                image_daily: 100,
            },
        }
    }
}

impl TierTable {
    pub fn limits(&self, tier: Tier) -> &TierLimits {
        match tier {
            Tier::Free => &self.free,
            Tier::Plus => &self.plus,
            Tier::Pro => &self.pro,
        }
    }

    pub fn daily_limit(&self, tier: Tier, kind: ActionKind) -> i64 {
        self.limits(tier).daily_limit(kind)
    }

    /// Suggests the nearest higher tier that actually raises the limit for `kind`.
    pub fn upgrade_hint(&self, tier: Tier, kind: ActionKind) -> Option<String> {
        let current = self.daily_limit(tier, kind);
        let mut candidate = tier.upgrade();

        while let Some(next) = candidate {
            let next_limit = self.daily_limit(next, kind);
            if next_limit > current {
                return Some(format!(
                    "Upgrade to {} for {} {} per day",
                    next.display_name(),
                    next_limit,
                    kind.noun()
                ));
            }
            candidate = next.upgrade();
        }

        None
    }

    pub fn validate(&self) -> Result<(), String> {
        for tier in [Tier::Free, Tier::Plus, Tier::Pro] {
            let limits = self.limits(tier);
            if limits.barista_daily < 0 || limits.image_daily < 0 {
                return Err(format!("daily limits for tier {tier} must not be negative"));
            }
        }
        Ok(())
    }
}
