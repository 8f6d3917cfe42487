use std::path::PathBuf;

use clap::Parser;
use ferrex_web_server::{
    config::{ConfigLoad, ConfigLoader},
    create_app,
    probe::{PROBE_INTERVAL, spawn_probe},
    state::AppState,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "ferrex-web-server")]
#[command(about = "Server-side rendering host for the Ferrex web client")]
struct Cli {
    /// Path to ferrex-web.toml (overrides FERREX_WEB_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a .env file
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long, env = "FERREX_WEB_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "FERREX_WEB_HOST")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = cli.config.clone() {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = cli.env_file.clone() {
        loader = loader.with_env_file(path);
    }
    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load()?;

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host.clone() {
        config.server.host = host;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ferrex_web=debug,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "configuration file loaded");
    }
    warnings.log();

    info!(
        api.internal = %config.api.internal_url,
        api.public = %config.api.public_url,
        api.timeout = ?config.api.request_timeout,
        "Ferrex API endpoints"
    );

    let bind_addr = config.server.bind_addr();
    let state = AppState::from_config(config)?;

    let _probe = spawn_probe(
        state.http.clone(),
        state.config.api.internal_url.clone(),
        state.connection.clone(),
        PROBE_INTERVAL,
    );

    let app = create_app(state);
    info!("Starting Ferrex web server on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
