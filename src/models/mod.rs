pub mod price_field;
pub mod trade;

pub use price_field::PriceField;
pub use trade::{NewTrade, TradeFilter, TradeRecord};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// TradeStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    Active,
    Winner,
    Loser,
    Breakeven,
    Cancelled,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Active => "active",
            TradeStatus::Winner => "winner",
            TradeStatus::Loser => "loser",
            TradeStatus::Breakeven => "breakeven",
            TradeStatus::Cancelled => "cancelled",
        }
    }

    /// Every state other than `active` is terminal and carries a `closed_at`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TradeStatus::Active)
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TradeStatus::Active),
            "winner" => Ok(TradeStatus::Winner),
            "loser" => Ok(TradeStatus::Loser),
            "breakeven" => Ok(TradeStatus::Breakeven),
            "cancelled" => Ok(TradeStatus::Cancelled),
            other => Err(format!("unknown trade status '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// ExitReason
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    TargetHit,
    StopLoss,
    ManualExit,
    TimeBased,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::TargetHit => "target_hit",
            ExitReason::StopLoss => "stop_loss",
            ExitReason::ManualExit => "manual_exit",
            ExitReason::TimeBased => "time_based",
        }
    }
}

impl FromStr for ExitReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "target_hit" => Ok(ExitReason::TargetHit),
            "stop_loss" => Ok(ExitReason::StopLoss),
            "manual_exit" => Ok(ExitReason::ManualExit),
            "time_based" => Ok(ExitReason::TimeBased),
            other => Err(format!("unknown exit reason '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// IdeaType: where the tracked trade came from
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdeaType {
    /// A saved idea from the daily oracle feed.
    DailyOracle,
    /// A saved custom symbol analysis.
    CustomAnalysis,
}

impl IdeaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaType::DailyOracle => "daily_oracle",
            IdeaType::CustomAnalysis => "custom_analysis",
        }
    }
}

impl FromStr for IdeaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily_oracle" => Ok(IdeaType::DailyOracle),
            "custom_analysis" => Ok(IdeaType::CustomAnalysis),
            other => Err(format!("unknown idea type '{other}'")),
        }
    }
}
