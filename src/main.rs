mod api;
mod cli;
mod config;
mod deploy;
mod github;
mod infrastructure;
mod server;
mod state;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use deploy::ScriptRunner;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    if cli.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting hookdeploy v{}", env!("CARGO_PKG_VERSION"));

    // Configuration must be complete before anything listens
    let store = config::load(cli.config_string.as_deref(), cli.config.as_deref())
        .context("Failed to load configuration")?;
    info!("Monitoring {} repository entries", store.len());

    if cli.secret.is_empty() {
        info!("No secret configured, webhook signatures will not be checked");
    }

    let tls = match cli.tls_files() {
        Some((cert, key)) => Some(
            infrastructure::tls::load_server_config(cert, key)
                .context("Failed to load TLS certificate/key")?,
        ),
        None => None,
    };

    let state = AppState::new(
        store,
        cli.secret.clone(),
        ScriptRunner::new(cli.max_concurrent_scripts),
    );

    let path = cli.route_path();
    let app = api::router(&path, state);
    info!("Webhook path: {}", path);

    let addr = cli.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    match tls {
        Some(tls) => server::serve_https(listener, app, tls).await?,
        None => server::serve_http(listener, app).await?,
    }

    info!("Shutting down...");

    Ok(())
}
