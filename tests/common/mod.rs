use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::broadcast;

use crashgraph::api::router::create_router;
use crashgraph::api::ws_types::WsMessage;
use crashgraph::config::AppConfig;
use crashgraph::db::memory_kv::MemoryKv;
use crashgraph::db::KvStore;
use crashgraph::round::{RoundService, ServerClock};
use crashgraph::AppState;

/// Fixed start instant for manual clocks.
#[allow(dead_code)]
pub const T0: i64 = 1_700_000_000_000;

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub clock: ServerClock,
    pub store: MemoryKv,
    pub rounds: RoundService,
    pub ws_tx: broadcast::Sender<WsMessage>,
}

/// In-memory store plus a manual clock starting at [`T0`].
#[allow(dead_code)]
pub fn memory_service(config: &AppConfig) -> (RoundService, MemoryKv) {
    let store = MemoryKv::new();
    let rounds = RoundService::new(
        KvStore::Memory(store.clone()),
        config.store_keys(),
        config.machine_config(),
    );
    (rounds, store)
}

/// Build the full router over an in-memory store and a manual clock.
#[allow(dead_code)]
pub fn build_test_app(config: AppConfig) -> TestApp {
    build_test_app_with_metrics(config, crashgraph::metrics::detached_handle())
}

/// Same as [`build_test_app`], with `/metrics` rendering from `metrics_handle`.
#[allow(dead_code)]
pub fn build_test_app_with_metrics(config: AppConfig, metrics_handle: PrometheusHandle) -> TestApp {
    let (rounds, store) = memory_service(&config);
    let clock = ServerClock::manual(T0);
    let (ws_tx, _) = broadcast::channel::<WsMessage>(16);

    let state = AppState {
        rounds: rounds.clone(),
        clock: clock.clone(),
        config,
        ws_tx: ws_tx.clone(),
        metrics_handle,
    };

    TestApp {
        router: create_router(state),
        clock,
        store,
        rounds,
        ws_tx,
    }
}
