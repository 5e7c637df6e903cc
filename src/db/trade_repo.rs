use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use super::{TradePatch, TradeStore};
use crate::models::{TradeFilter, TradeRecord};

/// Database row for the trade_performance table.
#[derive(Debug, Clone, FromRow)]
pub struct TradeRow {
    pub id: i64,
    pub user_email: String,
    pub idea_type: String,
    pub saved_idea_id: Option<i64>,
    pub saved_analysis_id: Option<i64>,
    pub symbol: String,
    pub entry_price: Option<Decimal>,
    pub entry_date: Option<DateTime<Utc>>,
    pub position_size: Option<Decimal>,
    pub position_value: Option<Decimal>,
    pub exit_price: Option<Decimal>,
    pub exit_date: Option<DateTime<Utc>>,
    pub exit_reason: Option<String>,
    pub original_target: Option<Decimal>,
    pub original_stop_loss: Option<Decimal>,
    pub profit_loss: Option<Decimal>,
    pub profit_loss_percentage: Option<Decimal>,
    pub risk_reward_ratio: Option<Decimal>,
    pub duration_days: Option<i32>,
    pub status: String,
    pub notes: Option<String>,
    pub lessons_learned: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl TryFrom<TradeRow> for TradeRecord {
    type Error = anyhow::Error;

    fn try_from(row: TradeRow) -> Result<Self, Self::Error> {
        Ok(TradeRecord {
            id: row.id,
            idea_type: row.idea_type.parse().map_err(anyhow::Error::msg)?,
            user_email: row.user_email,
            saved_idea_id: row.saved_idea_id,
            saved_analysis_id: row.saved_analysis_id,
            symbol: row.symbol,
            entry_price: row.entry_price,
            entry_date: row.entry_date,
            position_size: row.position_size,
            position_value: row.position_value,
            exit_price: row.exit_price,
            exit_date: row.exit_date,
            exit_reason: row
                .exit_reason
                .as_deref()
                .map(str::parse)
                .transpose()
                .map_err(anyhow::Error::msg)?,
            original_target: row.original_target,
            original_stop_loss: row.original_stop_loss,
            profit_loss: row.profit_loss,
            profit_loss_percentage: row.profit_loss_percentage,
            risk_reward_ratio: row.risk_reward_ratio,
            duration_days: row.duration_days,
            status: row.status.parse().map_err(anyhow::Error::msg)?,
            notes: row.notes,
            lessons_learned: row.lessons_learned,
            created_at: row.created_at,
            updated_at: row.updated_at,
            closed_at: row.closed_at,
        })
    }
}

/// PostgreSQL-backed trade store.
#[derive(Debug, Clone)]
pub struct PgTradeStore {
    pool: PgPool,
}

impl PgTradeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TradeStore for PgTradeStore {
    async fn find_trades_by_user(
        &self,
        user_email: &str,
        filter: &TradeFilter,
    ) -> anyhow::Result<Vec<TradeRecord>> {
        let rows = sqlx::query_as::<_, TradeRow>(
            r#"
            SELECT * FROM trade_performance
            WHERE user_email = $1
              AND ($2::text IS NULL OR symbol = $2)
              AND ($3::text IS NULL OR status = $3)
              AND ($4::text IS NULL OR idea_type = $4)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_email)
        .bind(filter.symbol.as_deref())
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.idea_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TradeRecord::try_from).collect()
    }

    async fn find_trade_by_id(
        &self,
        id: i64,
        user_email: &str,
    ) -> anyhow::Result<Option<TradeRecord>> {
        let row = sqlx::query_as::<_, TradeRow>(
            "SELECT * FROM trade_performance WHERE id = $1 AND user_email = $2",
        )
        .bind(id)
        .bind(user_email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TradeRecord::try_from).transpose()
    }

    async fn insert_trade(&self, record: &TradeRecord) -> anyhow::Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO trade_performance (
                user_email, idea_type, saved_idea_id, saved_analysis_id, symbol,
                entry_price, entry_date, position_size, position_value,
                exit_price, exit_date, exit_reason,
                original_target, original_stop_loss,
                profit_loss, profit_loss_percentage, risk_reward_ratio, duration_days,
                status, notes, lessons_learned,
                created_at, updated_at, closed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)
            RETURNING id
            "#,
        )
        .bind(&record.user_email)
        .bind(record.idea_type.as_str())
        .bind(record.saved_idea_id)
        .bind(record.saved_analysis_id)
        .bind(&record.symbol)
        .bind(record.entry_price)
        .bind(record.entry_date)
        .bind(record.position_size)
        .bind(record.position_value)
        .bind(record.exit_price)
        .bind(record.exit_date)
        .bind(record.exit_reason.map(|r| r.as_str()))
        .bind(record.original_target)
        .bind(record.original_stop_loss)
        .bind(record.profit_loss)
        .bind(record.profit_loss_percentage)
        .bind(record.risk_reward_ratio)
        .bind(record.duration_days)
        .bind(record.status.as_str())
        .bind(&record.notes)
        .bind(&record.lessons_learned)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(record.closed_at)
        .fetch_one(&self.pool)
        .await
        .context("insert trade_performance")?;

        Ok(row.0)
    }

    async fn update_trade(
        &self,
        id: i64,
        user_email: &str,
        patch: &TradePatch,
    ) -> anyhow::Result<u64> {
        let result = match patch {
            TradePatch::Amend {
                notes,
                lessons_learned,
                updated_at,
            } => {
                sqlx::query(
                    r#"
                    UPDATE trade_performance
                    SET notes = COALESCE($3, notes),
                        lessons_learned = COALESCE($4, lessons_learned),
                        updated_at = $5
                    WHERE id = $1 AND user_email = $2
                    "#,
                )
                .bind(id)
                .bind(user_email)
                .bind(notes)
                .bind(lessons_learned)
                .bind(updated_at)
                .execute(&self.pool)
                .await?
            }
            TradePatch::Close(close) => {
                // The status guard makes the close a single compare-and-set.
                sqlx::query(
                    r#"
                    UPDATE trade_performance
                    SET exit_price = $3,
                        exit_date = $4,
                        exit_reason = $5,
                        profit_loss = $6,
                        profit_loss_percentage = $7,
                        risk_reward_ratio = $8,
                        duration_days = $9,
                        status = $10,
                        closed_at = $11,
                        notes = COALESCE($12, notes),
                        lessons_learned = COALESCE($13, lessons_learned),
                        updated_at = $14
                    WHERE id = $1 AND user_email = $2 AND status = 'active'
                    "#,
                )
                .bind(id)
                .bind(user_email)
                .bind(close.exit_price)
                .bind(close.exit_date)
                .bind(close.exit_reason.map(|r| r.as_str()))
                .bind(close.profit_loss)
                .bind(close.profit_loss_percentage)
                .bind(close.risk_reward_ratio)
                .bind(close.duration_days)
                .bind(close.status.as_str())
                .bind(close.closed_at)
                .bind(&close.notes)
                .bind(&close.lessons_learned)
                .bind(close.updated_at)
                .execute(&self.pool)
                .await?
            }
        };

        Ok(result.rows_affected())
    }

    async fn delete_trade(&self, id: i64, user_email: &str) -> anyhow::Result<u64> {
        let result =
            sqlx::query("DELETE FROM trade_performance WHERE id = $1 AND user_email = $2")
                .bind(id)
                .bind(user_email)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
