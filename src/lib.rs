pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod round;
pub mod services;
pub mod trajectory;
pub mod viewer;

use tokio::sync::broadcast;

use crate::api::ws_types::WsMessage;
use crate::config::AppConfig;
use crate::round::{RoundService, ServerClock};

#[derive(Clone)]
pub struct AppState {
    pub rounds: RoundService,
    pub clock: ServerClock,
    pub config: AppConfig,
    pub ws_tx: broadcast::Sender<WsMessage>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
