use tokio::sync::broadcast;

use crashgraph::api::router::create_router;
use crashgraph::api::ws_types::WsMessage;
use crashgraph::config::AppConfig;
use crashgraph::round::{RoundService, ServerClock};
use crashgraph::services::round_driver::run_round_driver;
use crashgraph::{db, metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);
    let metrics_handle = metrics::init_metrics()?;

    tracing::info!("Connecting to store...");
    let store = db::connect(&config).await?;
    tracing::info!(backend = store.backend_name(), "Store connected");

    let rounds = RoundService::new(store, config.store_keys(), config.machine_config());
    let clock = ServerClock::System;

    // Fail fast if the store cannot hold a round
    let snapshot = rounds.reconcile(clock.now_ms()).await?;
    tracing::info!(
        round_id = %snapshot.round.round_id,
        phase = %snapshot.round.phase,
        betting_ms = config.betting_duration_ms,
        revealing_ms = config.revealing_duration_ms,
        settled_ms = config.settled_duration_ms,
        "Round state ready"
    );

    // --- WebSocket broadcast channel for round updates ---
    let (ws_tx, _) = broadcast::channel::<WsMessage>(64);

    if config.round_driver_enabled {
        let driver_rounds = rounds.clone();
        let driver_clock = clock.clone();
        let driver_tx = ws_tx.clone();
        let interval_ms = config.round_driver_interval_ms;
        tokio::spawn(async move {
            run_round_driver(driver_rounds, driver_clock, driver_tx, interval_ms).await;
        });
        tracing::info!(interval_ms, "Round driver spawned");
    } else {
        tracing::info!("Round driver disabled (ROUND_DRIVER_ENABLED=false)");
    }

    let state = AppState {
        rounds,
        clock,
        config,
        ws_tx,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();
}
