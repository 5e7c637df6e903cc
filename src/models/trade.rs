use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ExitReason, IdeaType, TradeStatus};

/// One user's tracked trade, from the idea it was based on to its outcome.
///
/// The derived fields (`profit_loss`, `profit_loss_percentage`,
/// `risk_reward_ratio`, `duration_days`) are computed once when the trade is
/// closed and stored as-is afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: i64,
    pub user_email: String,
    pub idea_type: IdeaType,
    pub saved_idea_id: Option<i64>,
    pub saved_analysis_id: Option<i64>,
    pub symbol: String,

    pub entry_price: Option<Decimal>,
    pub entry_date: Option<DateTime<Utc>>,
    pub position_size: Option<Decimal>,
    pub position_value: Option<Decimal>,

    pub exit_price: Option<Decimal>,
    pub exit_date: Option<DateTime<Utc>>,
    pub exit_reason: Option<ExitReason>,

    pub original_target: Option<Decimal>,
    pub original_stop_loss: Option<Decimal>,

    pub profit_loss: Option<Decimal>,
    pub profit_loss_percentage: Option<Decimal>,
    pub risk_reward_ratio: Option<Decimal>,
    pub duration_days: Option<i32>,

    pub status: TradeStatus,
    pub notes: Option<String>,
    pub lessons_learned: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl TradeRecord {
    pub fn is_closed(&self) -> bool {
        matches!(
            self.status,
            TradeStatus::Winner | TradeStatus::Loser | TradeStatus::Breakeven
        )
    }
}

/// Input for opening a trade. Identity fields stay optional here so the
/// lifecycle can reject incomplete requests with a validation error.
#[derive(Debug, Clone, Default)]
pub struct NewTrade {
    pub user_email: Option<String>,
    pub symbol: Option<String>,
    pub idea_type: Option<IdeaType>,
    pub saved_idea_id: Option<i64>,
    pub saved_analysis_id: Option<i64>,
    pub entry_price: Option<Decimal>,
    pub entry_date: Option<DateTime<Utc>>,
    pub position_size: Option<Decimal>,
    pub position_value: Option<Decimal>,
    pub original_target: Option<Decimal>,
    pub original_stop_loss: Option<Decimal>,
    pub notes: Option<String>,
}

/// Exact-match filters for listing a user's trades. All set filters must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TradeFilter {
    pub symbol: Option<String>,
    pub status: Option<TradeStatus>,
    pub idea_type: Option<IdeaType>,
}

impl TradeFilter {
    pub fn matches(&self, record: &TradeRecord) -> bool {
        self.symbol.as_deref().map_or(true, |s| record.symbol == s)
            && self.status.map_or(true, |s| record.status == s)
            && self.idea_type.map_or(true, |t| record.idea_type == t)
    }
}

/// Lenient timestamp decoding for request bodies: accepts RFC 3339,
/// a naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC) or a bare `YYYY-MM-DD`
/// (midnight UTC).
pub mod flexible_date {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{s}'"))),
        }
    }
}
