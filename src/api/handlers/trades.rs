use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::trade::flexible_date;
use crate::models::{
    ExitReason, IdeaType, NewTrade, PriceField, TradeFilter, TradeRecord, TradeStatus,
};
use crate::performance::lifecycle::{self, CloseMode, ExitFields};
use crate::AppState;

use super::required;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Body of `POST /api/performance`. Without `id` it opens a trade; with `id`
/// it closes or amends that trade.
#[derive(Debug, Default, Deserialize)]
pub struct UpsertTradeRequest {
    pub id: Option<i64>,
    pub user_email: Option<String>,
    pub idea_type: Option<IdeaType>,
    pub saved_idea_id: Option<i64>,
    pub saved_analysis_id: Option<i64>,
    pub symbol: Option<String>,

    #[serde(default)]
    pub entry_price: Option<PriceField>,
    #[serde(default, deserialize_with = "flexible_date::deserialize")]
    pub entry_date: Option<DateTime<Utc>>,
    pub position_size: Option<Decimal>,
    pub position_value: Option<Decimal>,

    pub exit_price: Option<Decimal>,
    #[serde(default, deserialize_with = "flexible_date::deserialize")]
    pub exit_date: Option<DateTime<Utc>>,
    pub exit_reason: Option<ExitReason>,

    #[serde(default)]
    pub original_target: Option<PriceField>,
    #[serde(default)]
    pub original_stop_loss: Option<PriceField>,

    pub status: Option<TradeStatus>,
    pub notes: Option<String>,
    pub lessons_learned: Option<String>,
}

impl UpsertTradeRequest {
    fn has_exit_data(&self) -> bool {
        self.exit_price.is_some() || self.exit_date.is_some() || self.exit_reason.is_some()
    }

    fn exit_fields(&self) -> ExitFields {
        ExitFields {
            exit_price: self.exit_price,
            exit_date: self.exit_date,
            exit_reason: self.exit_reason,
            notes: self.notes.clone(),
            lessons_learned: self.lessons_learned.clone(),
        }
    }

    fn into_new_trade(self) -> Result<NewTrade, AppError> {
        Ok(NewTrade {
            entry_price: price_point(self.entry_price, "entry_price")?,
            original_target: price_point(self.original_target, "original_target")?,
            original_stop_loss: price_point(self.original_stop_loss, "original_stop_loss")?,
            user_email: self.user_email,
            symbol: self.symbol,
            idea_type: self.idea_type,
            saved_idea_id: self.saved_idea_id,
            saved_analysis_id: self.saved_analysis_id,
            entry_date: self.entry_date,
            position_size: self.position_size,
            position_value: self.position_value,
            notes: self.notes,
        })
    }
}

/// Resolve a decoded price to a single value; unreadable text and ranges
/// whose midpoint overflows are rejected.
fn price_point(field: Option<PriceField>, name: &str) -> Result<Option<Decimal>, AppError> {
    match field {
        None => Ok(None),
        Some(PriceField::Raw(raw)) if raw.trim().is_empty() => Ok(None),
        Some(field) => field
            .point()
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("{name} is not a readable price"))),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub user_email: Option<String>,
    pub symbol: Option<String>,
    pub status: Option<String>,
    pub idea_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub id: Option<i64>,
    pub user_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub records: Vec<TradeRecord>,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/performance: open, close or amend a tracked trade
pub async fn upsert(
    State(state): State<AppState>,
    payload: Result<Json<UpsertTradeRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = payload?;
    let store = state.store.as_ref();

    let Some(id) = body.id else {
        let mode = match (body.status, body.has_exit_data()) {
            (None, false) | (Some(TradeStatus::Active), false) => None,
            (Some(status), _) => Some(CloseMode::WithStatus(status)),
            (None, true) => Some(CloseMode::Classify),
        };
        let exit = body.exit_fields();
        let new = body.into_new_trade()?;

        let id = match mode {
            None => lifecycle::open(store, new).await?,
            Some(mode) => lifecycle::open_backfilled(store, new, exit, mode).await?,
        };

        return Ok(Json(json!({ "success": true, "id": id, "created": true })));
    };

    let user_email = required(body.user_email.clone(), "user_email")?;

    if let Some(status) = body.status {
        lifecycle::close_with_status(store, id, &user_email, body.exit_fields(), status).await?;
    } else if body.has_exit_data() {
        lifecycle::close_and_classify(store, id, &user_email, body.exit_fields()).await?;
    } else {
        lifecycle::amend(store, id, &user_email, body.notes, body.lessons_learned).await?;
    }

    Ok(Json(json!({ "success": true, "id": id, "updated": true })))
}

/// GET /api/performance: a user's tracked trades, optionally filtered
pub async fn list(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ListResponse>, AppError> {
    let Query(params) = params?;
    let user_email = required(params.user_email, "user_email")?;

    let filter = TradeFilter {
        symbol: params
            .symbol
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().to_uppercase()),
        status: parse_opt(params.status, "status")?,
        idea_type: parse_opt(params.idea_type, "idea_type")?,
    };

    let records = state.store.find_trades_by_user(&user_email, &filter).await?;
    let count = records.len();

    Ok(Json(ListResponse {
        success: true,
        records,
        count,
    }))
}

/// DELETE /api/performance: remove one of the caller's trades
pub async fn remove(
    State(state): State<AppState>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params?;
    let id = params
        .id
        .ok_or_else(|| AppError::BadRequest("id is required".into()))?;
    let user_email = required(params.user_email, "user_email")?;

    // A miss is reported as success so ids of other users cannot be probed.
    lifecycle::delete(state.store.as_ref(), id, &user_email).await?;

    Ok(Json(json!({ "success": true })))
}

fn parse_opt<T>(raw: Option<String>, field: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr<Err = String>,
{
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|e| AppError::BadRequest(format!("invalid {field}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upsert_body_decodes_idea_prices() {
        let body: UpsertTradeRequest = serde_json::from_value(json!({
            "user_email": "a@example.com",
            "symbol": "eth",
            "idea_type": "daily_oracle",
            "entry_price": { "type": "range", "value": "3000-3100" },
            "original_stop_loss": "$2,900",
            "original_target": 3400,
            "entry_date": "2025-02-01"
        }))
        .unwrap();

        let new = body.into_new_trade().unwrap();
        assert_eq!(new.entry_price, Some(Decimal::from(3050)));
        assert_eq!(new.original_stop_loss, Some(Decimal::from(2900)));
        assert_eq!(new.original_target, Some(Decimal::from(3400)));
        assert!(new.entry_date.is_some());
    }

    #[test]
    fn test_unreadable_price_is_rejected() {
        let body: UpsertTradeRequest = serde_json::from_value(json!({
            "entry_price": "around the lows"
        }))
        .unwrap();
        assert!(matches!(body.into_new_trade(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_overflowing_range_is_rejected() {
        let body: UpsertTradeRequest = serde_json::from_value(json!({
            "entry_price": "79228162514264337593543950335-79228162514264337593543950335"
        }))
        .unwrap();
        match body.into_new_trade() {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("entry_price")),
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[test]
    fn test_exit_data_detection() {
        let amend: UpsertTradeRequest =
            serde_json::from_value(json!({ "id": 1, "notes": "watching" })).unwrap();
        assert!(!amend.has_exit_data());

        let close: UpsertTradeRequest =
            serde_json::from_value(json!({ "id": 1, "exit_reason": "manual_exit" })).unwrap();
        assert!(close.has_exit_data());
    }

    #[test]
    fn test_parse_opt() {
        let status: Option<TradeStatus> = parse_opt(Some("winner".into()), "status").unwrap();
        assert_eq!(status, Some(TradeStatus::Winner));
        let none: Option<TradeStatus> = parse_opt(Some(" ".into()), "status").unwrap();
        assert!(none.is_none());
        assert!(parse_opt::<IdeaType>(Some("hunch".into()), "idea_type").is_err());
    }
}
