//! Lifecycle of a tracked trade: `active` until it is closed into one of the
//! terminal states (`winner`, `loser`, `breakeven`, `cancelled`).
//!
//! The manager holds no state of its own. Every operation reads through and
//! writes to the injected [`TradeStore`], and every write is scoped to the
//! owning user.

use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;

use super::price_math::{
    classify_outcome, compute_duration_days, compute_profit_loss, compute_risk_reward_ratio,
    ProfitLoss,
};
use super::PerformanceError;
use crate::db::{ClosePatch, TradePatch, TradeStore};
use crate::models::{ExitReason, NewTrade, TradeRecord, TradeStatus};

/// Fields supplied when a trade is closed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExitFields {
    pub exit_price: Option<Decimal>,
    pub exit_date: Option<DateTime<Utc>>,
    pub exit_reason: Option<ExitReason>,
    pub notes: Option<String>,
    pub lessons_learned: Option<String>,
}

/// How the terminal status of a close is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseMode {
    /// Derive the status from the realised percentage move.
    Classify,
    /// Use the caller's status as-is.
    WithStatus(TradeStatus),
}

// ---------------------------------------------------------------------------
// Open
// ---------------------------------------------------------------------------

/// Open a new `active` trade and return its id.
pub async fn open(store: &dyn TradeStore, new: NewTrade) -> Result<i64, PerformanceError> {
    let record = build_record(new, Utc::now())?;
    let id = store.insert_trade(&record).await?;

    counter!("trades_opened_total").increment(1);
    tracing::info!(
        id,
        user = %record.user_email,
        symbol = %record.symbol,
        idea_type = record.idea_type.as_str(),
        "Trade opened"
    );

    Ok(id)
}

/// Record a trade that already happened: opened and closed in one step.
pub async fn open_backfilled(
    store: &dyn TradeStore,
    new: NewTrade,
    exit: ExitFields,
    mode: CloseMode,
) -> Result<i64, PerformanceError> {
    let now = Utc::now();
    let mut record = build_record(new, now)?;
    let patch = build_close(&record, &exit, mode, now)?;
    patch.apply_to(&mut record);

    let id = store.insert_trade(&record).await?;

    counter!("trades_opened_total").increment(1);
    counter!("trades_closed_total", "status" => record.status.as_str()).increment(1);
    tracing::info!(
        id,
        user = %record.user_email,
        symbol = %record.symbol,
        status = %record.status,
        "Back-filled closed trade"
    );

    Ok(id)
}

fn build_record(new: NewTrade, now: DateTime<Utc>) -> Result<TradeRecord, PerformanceError> {
    let user_email = required_text(new.user_email, "user_email")?;
    let symbol = required_text(new.symbol, "symbol")?.to_uppercase();
    let idea_type = new
        .idea_type
        .ok_or_else(|| PerformanceError::Validation("idea_type is required".into()))?;

    if let Some(entry) = new.entry_price {
        if entry <= Decimal::ZERO {
            return Err(PerformanceError::Validation(
                "entry_price must be greater than zero".into(),
            ));
        }
    }

    if new.saved_idea_id.is_some() && new.saved_analysis_id.is_some() {
        // Both provenance keys set. Accepted, but worth seeing in the logs.
        tracing::warn!(
            user = %user_email,
            symbol = %symbol,
            "Trade references both a saved idea and a saved analysis"
        );
    }

    Ok(TradeRecord {
        id: 0,
        user_email,
        idea_type,
        saved_idea_id: new.saved_idea_id,
        saved_analysis_id: new.saved_analysis_id,
        symbol,
        entry_price: new.entry_price,
        entry_date: new.entry_date,
        position_size: new.position_size,
        position_value: new.position_value,
        exit_price: None,
        exit_date: None,
        exit_reason: None,
        original_target: new.original_target,
        original_stop_loss: new.original_stop_loss,
        profit_loss: None,
        profit_loss_percentage: None,
        risk_reward_ratio: None,
        duration_days: None,
        status: TradeStatus::Active,
        notes: new.notes,
        lessons_learned: None,
        created_at: now,
        updated_at: now,
        closed_at: None,
    })
}

fn required_text(value: Option<String>, field: &str) -> Result<String, PerformanceError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(PerformanceError::Validation(format!("{field} is required"))),
    }
}

// ---------------------------------------------------------------------------
// Close
// ---------------------------------------------------------------------------

/// Close a trade and derive its status from the realised move.
pub async fn close_and_classify(
    store: &dyn TradeStore,
    id: i64,
    user_email: &str,
    exit: ExitFields,
) -> Result<TradeRecord, PerformanceError> {
    close(store, id, user_email, exit, CloseMode::Classify).await
}

/// Close a trade into the given status. The status is stored as supplied.
pub async fn close_with_status(
    store: &dyn TradeStore,
    id: i64,
    user_email: &str,
    exit: ExitFields,
    status: TradeStatus,
) -> Result<TradeRecord, PerformanceError> {
    close(store, id, user_email, exit, CloseMode::WithStatus(status)).await
}

async fn close(
    store: &dyn TradeStore,
    id: i64,
    user_email: &str,
    exit: ExitFields,
    mode: CloseMode,
) -> Result<TradeRecord, PerformanceError> {
    let mut record = store
        .find_trade_by_id(id, user_email)
        .await?
        .ok_or(PerformanceError::NotFound { id })?;

    if record.status.is_terminal() {
        return Err(PerformanceError::Conflict { id });
    }

    let patch = build_close(&record, &exit, mode, Utc::now())?;

    let rows = store
        .update_trade(id, user_email, &TradePatch::Close(patch.clone()))
        .await?;
    if rows == 0 {
        // Closed (or deleted) by a concurrent request between read and write.
        return Err(PerformanceError::Conflict { id });
    }

    patch.apply_to(&mut record);

    if record.status.is_terminal() {
        counter!("trades_closed_total", "status" => record.status.as_str()).increment(1);
    }
    tracing::info!(
        id,
        user = %user_email,
        symbol = %record.symbol,
        status = %record.status,
        profit_loss = ?record.profit_loss,
        "Trade closed"
    );

    Ok(record)
}

/// Compute the closing patch for `record`. Pure; `now` is passed in.
pub fn build_close(
    record: &TradeRecord,
    exit: &ExitFields,
    mode: CloseMode,
    now: DateTime<Utc>,
) -> Result<ClosePatch, PerformanceError> {
    // 1. Profit / loss
    let pl: Option<ProfitLoss> = match (record.entry_price, exit.exit_price) {
        (Some(entry), Some(exit_price)) if !entry.is_zero() => Some(
            compute_profit_loss(
                entry,
                exit_price,
                record.position_size.unwrap_or(Decimal::ONE),
            )
            .ok_or_else(out_of_range)?,
        ),
        _ => None,
    };

    // 2. Risk / reward against the stop captured at entry
    let risk_reward_ratio = match (record.entry_price, exit.exit_price, record.original_stop_loss) {
        (Some(entry), Some(exit_price), Some(stop)) => Some(
            compute_risk_reward_ratio(entry, exit_price, stop).ok_or_else(out_of_range)?,
        ),
        _ => None,
    };

    // 3. Status
    let status = match mode {
        CloseMode::WithStatus(status) => status,
        CloseMode::Classify => match pl {
            Some(pl) => classify_outcome(pl.profit_loss_percentage).into(),
            None => {
                return Err(PerformanceError::Validation(
                    "entry_price and exit_price are required to classify a trade; \
                     supply an explicit status instead"
                        .into(),
                ))
            }
        },
    };

    // 4. Holding period, only alongside a realised P/L
    let duration_days = match (pl, record.entry_date, exit.exit_date) {
        (Some(_), Some(entry_date), Some(exit_date)) => Some(
            i32::try_from(compute_duration_days(entry_date, exit_date)).unwrap_or(i32::MAX),
        ),
        _ => None,
    };

    // 5. closed_at is only ever set on entering a terminal state
    let closed_at = status
        .is_terminal()
        .then(|| exit.exit_date.unwrap_or(now));

    Ok(ClosePatch {
        exit_price: exit.exit_price,
        exit_date: exit.exit_date,
        exit_reason: exit.exit_reason,
        profit_loss: pl.map(|p| p.profit_loss),
        profit_loss_percentage: pl.map(|p| p.profit_loss_percentage),
        risk_reward_ratio,
        duration_days,
        status,
        closed_at,
        notes: exit.notes.clone(),
        lessons_learned: exit.lessons_learned.clone(),
        updated_at: now,
    })
}

fn out_of_range() -> PerformanceError {
    PerformanceError::Validation("prices are out of range for profit/loss calculation".into())
}

// ---------------------------------------------------------------------------
// Amend / delete
// ---------------------------------------------------------------------------

/// Update free-text fields only. Status, exit and derived fields are untouched.
pub async fn amend(
    store: &dyn TradeStore,
    id: i64,
    user_email: &str,
    notes: Option<String>,
    lessons_learned: Option<String>,
) -> Result<(), PerformanceError> {
    let patch = TradePatch::Amend {
        notes,
        lessons_learned,
        updated_at: Utc::now(),
    };

    let rows = store.update_trade(id, user_email, &patch).await?;
    if rows == 0 {
        return Err(PerformanceError::NotFound { id });
    }

    counter!("trades_amended_total").increment(1);
    tracing::debug!(id, user = %user_email, "Trade notes amended");

    Ok(())
}

/// Delete a trade owned by `user_email`. Returns whether a row was removed;
/// callers do not distinguish the two outcomes to the client.
pub async fn delete(
    store: &dyn TradeStore,
    id: i64,
    user_email: &str,
) -> Result<bool, PerformanceError> {
    let rows = store.delete_trade(id, user_email).await?;

    if rows > 0 {
        counter!("trades_deleted_total").increment(1);
        tracing::info!(id, user = %user_email, "Trade deleted");
    } else {
        tracing::debug!(id, user = %user_email, "Delete matched no trade");
    }

    Ok(rows > 0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryTradeStore;
    use crate::models::IdeaType;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn new_trade(user: &str) -> NewTrade {
        NewTrade {
            user_email: Some(user.into()),
            symbol: Some("nvda".into()),
            idea_type: Some(IdeaType::DailyOracle),
            saved_idea_id: Some(7),
            entry_price: Some(Decimal::from(100)),
            entry_date: Some(day(2025, 1, 1)),
            position_size: Some(Decimal::ONE),
            original_target: Some(Decimal::from(120)),
            original_stop_loss: Some(Decimal::from(95)),
            ..NewTrade::default()
        }
    }

    fn exit_at(price: i64, date: DateTime<Utc>) -> ExitFields {
        ExitFields {
            exit_price: Some(Decimal::from(price)),
            exit_date: Some(date),
            ..ExitFields::default()
        }
    }

    #[tokio::test]
    async fn test_open_creates_active_trade() {
        let store = InMemoryTradeStore::new();
        let id = open(&store, new_trade("a@example.com")).await.unwrap();

        let record = store.find_trade_by_id(id, "a@example.com").await.unwrap().unwrap();
        assert_eq!(record.status, TradeStatus::Active);
        assert_eq!(record.symbol, "NVDA");
        assert!(record.closed_at.is_none());
        assert!(record.profit_loss.is_none());
        assert!(record.risk_reward_ratio.is_none());
        assert_eq!(record.created_at, record.updated_at);
    }

    #[tokio::test]
    async fn test_open_requires_identity_fields() {
        let store = InMemoryTradeStore::new();

        let missing_user = NewTrade {
            user_email: None,
            ..new_trade("x")
        };
        let missing_symbol = NewTrade {
            symbol: Some("  ".into()),
            ..new_trade("a@example.com")
        };
        let missing_type = NewTrade {
            idea_type: None,
            ..new_trade("a@example.com")
        };

        for input in [missing_user, missing_symbol, missing_type] {
            let err = open(&store, input).await.unwrap_err();
            assert!(matches!(err, PerformanceError::Validation(_)));
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_open_rejects_non_positive_entry() {
        let store = InMemoryTradeStore::new();
        let input = NewTrade {
            entry_price: Some(Decimal::ZERO),
            ..new_trade("a@example.com")
        };
        assert!(matches!(
            open(&store, input).await,
            Err(PerformanceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_close_and_classify_winner() {
        let store = InMemoryTradeStore::new();
        let id = open(&store, new_trade("a@example.com")).await.unwrap();

        let closed = close_and_classify(&store, id, "a@example.com", exit_at(110, day(2025, 1, 15)))
            .await
            .unwrap();

        assert_eq!(closed.profit_loss, Some(Decimal::from(10)));
        assert_eq!(closed.profit_loss_percentage, Some(Decimal::from(10)));
        assert_eq!(closed.risk_reward_ratio, Some(Decimal::TWO));
        assert_eq!(closed.duration_days, Some(14));
        assert_eq!(closed.status, TradeStatus::Winner);
        assert_eq!(closed.closed_at, Some(day(2025, 1, 15)));

        let stored = store.find_trade_by_id(id, "a@example.com").await.unwrap().unwrap();
        assert_eq!(stored, closed);
    }

    #[tokio::test]
    async fn test_close_with_status_is_not_reclassified() {
        let store = InMemoryTradeStore::new();
        let id = open(&store, new_trade("a@example.com")).await.unwrap();

        // +10% move, but the caller says it was a loser.
        let closed = close_with_status(
            &store,
            id,
            "a@example.com",
            exit_at(110, day(2025, 1, 15)),
            TradeStatus::Loser,
        )
        .await
        .unwrap();

        assert_eq!(closed.status, TradeStatus::Loser);
        assert_eq!(closed.profit_loss, Some(Decimal::from(10)));
    }

    #[tokio::test]
    async fn test_cancel_without_exit_uses_now() {
        let store = InMemoryTradeStore::new();
        let id = open(&store, new_trade("a@example.com")).await.unwrap();
        let before = Utc::now();

        let closed = close_with_status(
            &store,
            id,
            "a@example.com",
            ExitFields::default(),
            TradeStatus::Cancelled,
        )
        .await
        .unwrap();

        assert_eq!(closed.status, TradeStatus::Cancelled);
        assert!(closed.closed_at.unwrap() >= before);
        assert!(closed.profit_loss.is_none());
        assert!(closed.risk_reward_ratio.is_none());
        assert!(closed.duration_days.is_none());
    }

    #[tokio::test]
    async fn test_classify_without_prices_is_rejected() {
        let store = InMemoryTradeStore::new();
        let id = open(
            &store,
            NewTrade {
                entry_price: None,
                ..new_trade("a@example.com")
            },
        )
        .await
        .unwrap();

        let err = close_and_classify(&store, id, "a@example.com", exit_at(110, day(2025, 2, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, PerformanceError::Validation(_)));

        let stored = store.find_trade_by_id(id, "a@example.com").await.unwrap().unwrap();
        assert_eq!(stored.status, TradeStatus::Active);
    }

    #[tokio::test]
    async fn test_second_close_conflicts() {
        let store = InMemoryTradeStore::new();
        let id = open(&store, new_trade("a@example.com")).await.unwrap();

        close_and_classify(&store, id, "a@example.com", exit_at(90, day(2025, 1, 10)))
            .await
            .unwrap();
        let err = close_and_classify(&store, id, "a@example.com", exit_at(130, day(2025, 1, 20)))
            .await
            .unwrap_err();
        assert!(matches!(err, PerformanceError::Conflict { .. }));

        let stored = store.find_trade_by_id(id, "a@example.com").await.unwrap().unwrap();
        assert_eq!(stored.status, TradeStatus::Loser);
        assert_eq!(stored.exit_price, Some(Decimal::from(90)));
    }

    #[tokio::test]
    async fn test_concurrent_closes_have_one_winner() {
        let store = InMemoryTradeStore::new();
        let id = open(&store, new_trade("a@example.com")).await.unwrap();

        let (first, second) = tokio::join!(
            close_and_classify(&store, id, "a@example.com", exit_at(110, day(2025, 1, 15))),
            close_and_classify(&store, id, "a@example.com", exit_at(90, day(2025, 1, 20))),
        );

        let winner = match (first, second) {
            (Ok(record), Err(PerformanceError::Conflict { id: lost })) => {
                assert_eq!(lost, id);
                record
            }
            (Err(PerformanceError::Conflict { id: lost }), Ok(record)) => {
                assert_eq!(lost, id);
                record
            }
            other => panic!("expected exactly one successful close, got {other:?}"),
        };

        let stored = store.find_trade_by_id(id, "a@example.com").await.unwrap().unwrap();
        assert_eq!(stored.exit_price, winner.exit_price);
        assert_eq!(stored.exit_date, winner.exit_date);
        assert_eq!(stored.status, winner.status);
    }

    /// Serves a snapshot taken before another request closed the trade, so the
    /// lifecycle's pre-check passes and only the guarded write can refuse.
    struct StaleReads {
        inner: InMemoryTradeStore,
        snapshot: TradeRecord,
    }

    #[async_trait::async_trait]
    impl TradeStore for StaleReads {
        async fn find_trades_by_user(
            &self,
            user_email: &str,
            filter: &crate::models::TradeFilter,
        ) -> anyhow::Result<Vec<TradeRecord>> {
            self.inner.find_trades_by_user(user_email, filter).await
        }

        async fn find_trade_by_id(
            &self,
            _id: i64,
            _user_email: &str,
        ) -> anyhow::Result<Option<TradeRecord>> {
            Ok(Some(self.snapshot.clone()))
        }

        async fn insert_trade(&self, record: &TradeRecord) -> anyhow::Result<i64> {
            self.inner.insert_trade(record).await
        }

        async fn update_trade(
            &self,
            id: i64,
            user_email: &str,
            patch: &TradePatch,
        ) -> anyhow::Result<u64> {
            self.inner.update_trade(id, user_email, patch).await
        }

        async fn delete_trade(&self, id: i64, user_email: &str) -> anyhow::Result<u64> {
            self.inner.delete_trade(id, user_email).await
        }

        async fn ping(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_close_losing_the_race_conflicts() {
        let inner = InMemoryTradeStore::new();
        let id = open(&inner, new_trade("a@example.com")).await.unwrap();
        let snapshot = inner.find_trade_by_id(id, "a@example.com").await.unwrap().unwrap();

        close_and_classify(&inner, id, "a@example.com", exit_at(110, day(2025, 1, 15)))
            .await
            .unwrap();

        let store = StaleReads { inner, snapshot };
        let err = close_and_classify(&store, id, "a@example.com", exit_at(80, day(2025, 1, 30)))
            .await
            .unwrap_err();
        assert!(matches!(err, PerformanceError::Conflict { id: lost } if lost == id));

        let stored = store
            .inner
            .find_trade_by_id(id, "a@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, TradeStatus::Winner);
        assert_eq!(stored.exit_price, Some(Decimal::from(110)));
        assert_eq!(stored.closed_at, Some(day(2025, 1, 15)));
    }

    #[tokio::test]
    async fn test_close_overflow_is_validation_error() {
        let store = InMemoryTradeStore::new();
        let id = open(
            &store,
            NewTrade {
                entry_price: Some(Decimal::from_i128_with_scale(1, 19)),
                original_stop_loss: None,
                ..new_trade("a@example.com")
            },
        )
        .await
        .unwrap();

        let err = close_and_classify(
            &store,
            id,
            "a@example.com",
            ExitFields {
                exit_price: Some(Decimal::from(1_000_000_000_000i64)),
                ..ExitFields::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PerformanceError::Validation(_)));

        let stored = store.find_trade_by_id(id, "a@example.com").await.unwrap().unwrap();
        assert_eq!(stored.status, TradeStatus::Active);
    }

    #[tokio::test]
    async fn test_cancel_with_exit_date_only_has_no_duration() {
        let store = InMemoryTradeStore::new();
        let id = open(&store, new_trade("a@example.com")).await.unwrap();

        let closed = close_with_status(
            &store,
            id,
            "a@example.com",
            ExitFields {
                exit_date: Some(day(2025, 1, 9)),
                ..ExitFields::default()
            },
            TradeStatus::Cancelled,
        )
        .await
        .unwrap();

        assert!(closed.profit_loss.is_none());
        assert!(closed.duration_days.is_none());
        assert_eq!(closed.closed_at, Some(day(2025, 1, 9)));
    }

    #[tokio::test]
    async fn test_close_other_users_trade_is_not_found() {
        let store = InMemoryTradeStore::new();
        let id = open(&store, new_trade("a@example.com")).await.unwrap();

        let err = close_and_classify(&store, id, "b@example.com", exit_at(110, day(2025, 1, 15)))
            .await
            .unwrap_err();
        assert!(matches!(err, PerformanceError::NotFound { .. }));

        let stored = store.find_trade_by_id(id, "a@example.com").await.unwrap().unwrap();
        assert_eq!(stored.status, TradeStatus::Active);
    }

    #[tokio::test]
    async fn test_amend_only_touches_text() {
        let store = InMemoryTradeStore::new();
        let id = open(&store, new_trade("a@example.com")).await.unwrap();
        let closed = close_and_classify(&store, id, "a@example.com", exit_at(110, day(2025, 1, 15)))
            .await
            .unwrap();

        amend(
            &store,
            id,
            "a@example.com",
            None,
            Some("Took profit too early".into()),
        )
        .await
        .unwrap();

        let stored = store.find_trade_by_id(id, "a@example.com").await.unwrap().unwrap();
        assert_eq!(stored.lessons_learned.as_deref(), Some("Took profit too early"));
        assert_eq!(stored.status, closed.status);
        assert_eq!(stored.profit_loss, closed.profit_loss);
        assert_eq!(stored.closed_at, closed.closed_at);
        assert!(stored.updated_at >= closed.updated_at);
    }

    #[tokio::test]
    async fn test_amend_missing_trade() {
        let store = InMemoryTradeStore::new();
        let err = amend(&store, 42, "a@example.com", Some("x".into()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PerformanceError::NotFound { id: 42 }));
    }

    #[tokio::test]
    async fn test_delete_is_ownership_scoped() {
        let store = InMemoryTradeStore::new();
        let id = open(&store, new_trade("a@example.com")).await.unwrap();

        assert!(!delete(&store, id, "b@example.com").await.unwrap());
        assert!(store.find_trade_by_id(id, "a@example.com").await.unwrap().is_some());

        assert!(delete(&store, id, "a@example.com").await.unwrap());
        assert!(store.find_trade_by_id(id, "a@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_backfill_creates_closed_trade() {
        let store = InMemoryTradeStore::new();
        let id = open_backfilled(
            &store,
            new_trade("a@example.com"),
            ExitFields {
                exit_reason: Some(ExitReason::StopLoss),
                ..exit_at(95, day(2025, 1, 3))
            },
            CloseMode::Classify,
        )
        .await
        .unwrap();

        let stored = store.find_trade_by_id(id, "a@example.com").await.unwrap().unwrap();
        assert_eq!(stored.status, TradeStatus::Loser);
        assert_eq!(stored.profit_loss, Some(Decimal::from(-5)));
        assert_eq!(stored.risk_reward_ratio, Some(Decimal::ONE));
        assert_eq!(stored.duration_days, Some(2));
        assert_eq!(stored.exit_reason, Some(ExitReason::StopLoss));
        assert_eq!(stored.closed_at, Some(day(2025, 1, 3)));
    }

    #[test]
    fn test_build_close_small_move_is_breakeven() {
        let now = Utc::now();
        let record = build_record(new_trade("a@example.com"), now).unwrap();
        let exit = ExitFields {
            exit_price: Some(Decimal::new(10040, 2)), // +0.4%
            ..ExitFields::default()
        };

        let patch = build_close(&record, &exit, CloseMode::Classify, now).unwrap();
        assert_eq!(patch.status, TradeStatus::Breakeven);
        assert_eq!(patch.closed_at, Some(now));
        assert!(patch.duration_days.is_none());
    }

    #[test]
    fn test_build_close_without_stop_has_no_ratio() {
        let now = Utc::now();
        let mut record = build_record(new_trade("a@example.com"), now).unwrap();
        record.original_stop_loss = None;

        let patch = build_close(&record, &exit_at(110, now), CloseMode::Classify, now).unwrap();
        assert!(patch.risk_reward_ratio.is_none());
        assert_eq!(patch.status, TradeStatus::Winner);
    }

    #[test]
    fn test_position_size_scales_profit_loss() {
        let now = Utc::now();
        let mut record = build_record(new_trade("a@example.com"), now).unwrap();
        record.position_size = Some(Decimal::from(25));

        let patch = build_close(&record, &exit_at(110, now), CloseMode::Classify, now).unwrap();
        assert_eq!(patch.profit_loss, Some(Decimal::from(250)));
        assert_eq!(patch.profit_loss_percentage, Some(Decimal::from(10)));
    }
}
