use anyhow::Context;
use backend_lib::{
    config::Settings,
    directory::FlatFileDirectory,
    ws_router, AppState,
};
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// MeetLink signaling server
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the config file
    #[arg(long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Settings::load_from(&args.config)
        .with_context(|| format!("loading config from {}", args.config))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    // The meeting directory is maintained by the scheduling/REST side of
    // the system; the signaling core only reads it.
    let directory = Arc::new(FlatFileDirectory::new(&config.data_dir));

    let state = Arc::new(AppState::new(directory, config));

    // browser clients connect cross-origin
    let app = ws_router::create_router(state.clone())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&state.settings.bind_addr).await?;
    info!(addr = %state.settings.bind_addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
