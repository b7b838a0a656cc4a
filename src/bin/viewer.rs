use crashgraph::config::ViewerConfig;
use crashgraph::viewer::{run_viewer, LogRenderer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ViewerConfig::from_env()?;
    let renderer = LogRenderer::new(config.log_every_frames, config.plot_rows);
    run_viewer(config, renderer).await
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();
}
