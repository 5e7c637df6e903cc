pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod performance;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::TradeStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TradeStore>,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
