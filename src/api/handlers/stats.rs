use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::TradeFilter;
use crate::performance::{compute_stats, PerformanceStats};
use crate::AppState;

use super::required;

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub user_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: PerformanceStats,
}

/// GET /api/performance/stats: portfolio statistics for one user
pub async fn summary(
    State(state): State<AppState>,
    params: Result<Query<StatsParams>, QueryRejection>,
) -> Result<Json<StatsResponse>, AppError> {
    let Query(params) = params?;
    let user_email = required(params.user_email, "user_email")?;

    let trades = state
        .store
        .find_trades_by_user(&user_email, &TradeFilter::default())
        .await?;
    let stats = compute_stats(&trades);

    counter!("stats_requests_total").increment(1);
    tracing::debug!(
        user = %user_email,
        trades = trades.len(),
        closed = stats.closed_trades,
        "Computed performance stats"
    );

    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}
