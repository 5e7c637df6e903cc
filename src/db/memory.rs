use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{TradePatch, TradeStore};
use crate::models::{TradeFilter, TradeRecord, TradeStatus};

/// In-process trade store. Used by tests and local runs without a database.
#[derive(Debug, Default)]
pub struct InMemoryTradeStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    trades: Vec<TradeRecord>,
}

impl InMemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.trades.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TradeStore for InMemoryTradeStore {
    async fn find_trades_by_user(
        &self,
        user_email: &str,
        filter: &TradeFilter,
    ) -> anyhow::Result<Vec<TradeRecord>> {
        let inner = self.inner.read().await;
        let mut trades: Vec<TradeRecord> = inner
            .trades
            .iter()
            .filter(|t| t.user_email == user_email && filter.matches(t))
            .cloned()
            .collect();
        trades.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(trades)
    }

    async fn find_trade_by_id(
        &self,
        id: i64,
        user_email: &str,
    ) -> anyhow::Result<Option<TradeRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .trades
            .iter()
            .find(|t| t.id == id && t.user_email == user_email)
            .cloned())
    }

    async fn insert_trade(&self, record: &TradeRecord) -> anyhow::Result<i64> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = inner.next_id;
        let mut stored = record.clone();
        stored.id = id;
        inner.trades.push(stored);
        Ok(id)
    }

    async fn update_trade(
        &self,
        id: i64,
        user_email: &str,
        patch: &TradePatch,
    ) -> anyhow::Result<u64> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner
            .trades
            .iter_mut()
            .find(|t| t.id == id && t.user_email == user_email)
        else {
            return Ok(0);
        };

        match patch {
            TradePatch::Amend {
                notes,
                lessons_learned,
                updated_at,
            } => {
                if notes.is_some() {
                    record.notes = notes.clone();
                }
                if lessons_learned.is_some() {
                    record.lessons_learned = lessons_learned.clone();
                }
                record.updated_at = *updated_at;
            }
            TradePatch::Close(close) => {
                if record.status != TradeStatus::Active {
                    return Ok(0);
                }
                close.apply_to(record);
            }
        }

        Ok(1)
    }

    async fn delete_trade(&self, id: i64, user_email: &str) -> anyhow::Result<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.trades.len();
        inner
            .trades
            .retain(|t| !(t.id == id && t.user_email == user_email));
        Ok((before - inner.trades.len()) as u64)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
