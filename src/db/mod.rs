pub mod memory;
pub mod trade_repo;

pub use memory::InMemoryTradeStore;
pub use trade_repo::PgTradeStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::models::{ExitReason, TradeFilter, TradeRecord, TradeStatus};

pub async fn init_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    // Verify connectivity
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Mutation applied to a stored trade, always scoped to `(id, user_email)`.
#[derive(Debug, Clone, PartialEq)]
pub enum TradePatch {
    /// Free-text update. `None` leaves the stored value untouched.
    Amend {
        notes: Option<String>,
        lessons_learned: Option<String>,
        updated_at: DateTime<Utc>,
    },
    /// Closing transition. Only applies while the stored trade is still `active`.
    Close(ClosePatch),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosePatch {
    pub exit_price: Option<Decimal>,
    pub exit_date: Option<DateTime<Utc>>,
    pub exit_reason: Option<ExitReason>,
    pub profit_loss: Option<Decimal>,
    pub profit_loss_percentage: Option<Decimal>,
    pub risk_reward_ratio: Option<Decimal>,
    pub duration_days: Option<i32>,
    pub status: TradeStatus,
    pub closed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub lessons_learned: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ClosePatch {
    pub fn apply_to(&self, record: &mut TradeRecord) {
        record.exit_price = self.exit_price;
        record.exit_date = self.exit_date;
        record.exit_reason = self.exit_reason;
        record.profit_loss = self.profit_loss;
        record.profit_loss_percentage = self.profit_loss_percentage;
        record.risk_reward_ratio = self.risk_reward_ratio;
        record.duration_days = self.duration_days;
        record.status = self.status;
        record.closed_at = self.closed_at;
        if self.notes.is_some() {
            record.notes = self.notes.clone();
        }
        if self.lessons_learned.is_some() {
            record.lessons_learned = self.lessons_learned.clone();
        }
        record.updated_at = self.updated_at;
    }
}

/// Storage contract for tracked trades.
///
/// Every keyed operation is scoped by the owning user; a mismatched owner
/// behaves exactly like a missing id (no rows).
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// A user's trades matching `filter`, newest first.
    async fn find_trades_by_user(
        &self,
        user_email: &str,
        filter: &TradeFilter,
    ) -> anyhow::Result<Vec<TradeRecord>>;

    async fn find_trade_by_id(&self, id: i64, user_email: &str)
        -> anyhow::Result<Option<TradeRecord>>;

    /// Persist a new trade; the store assigns and returns the id.
    async fn insert_trade(&self, record: &TradeRecord) -> anyhow::Result<i64>;

    /// Returns rows affected (0 or 1).
    async fn update_trade(&self, id: i64, user_email: &str, patch: &TradePatch)
        -> anyhow::Result<u64>;

    /// Returns rows affected (0 or 1).
    async fn delete_trade(&self, id: i64, user_email: &str) -> anyhow::Result<u64>;

    async fn ping(&self) -> anyhow::Result<()>;
}
