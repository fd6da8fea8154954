use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use narnia_api::config;
use narnia_api::database::{DatabaseManager, MySqlDatabase};
use narnia_api::is_production;
use narnia_api::table::{TableOptions, TableRegistry};

#[derive(Parser)]
#[command(name = "narnia-api")]
#[command(about = "Expose every table of a MySQL database as a REST API")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on (overrides PORT)")]
    port: Option<u16>,

    #[arg(long, value_name = "PATH", help = "Load environment from this file instead of .env")]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Environment must be loaded before the config singleton is first read
    match &args.env_file {
        Some(path) => {
            dotenvy::from_path(path).with_context(|| format!("failed to load {}", path.display()))?;
        }
        None => {
            let _ = dotenvy::dotenv();
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    info!("Starting {} in {:?} mode", config.server.project_name, config.environment);
    if is_production!() && config.api.enable_dump_route {
        warn!("/<table>/all is enabled in production");
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("Error connecting to database")?;
    let db = Arc::new(MySqlDatabase::new(pool.clone(), &config.database));

    let tables = TableRegistry::discover(db.as_ref(), TableOptions::from_config(config), config.api.tables.as_deref())
        .await
        .context("Unable to list database tables")?;
    if tables.is_empty() {
        warn!("No tables exposed");
    }

    let app = narnia_api::app(db, tables, config);

    let port = args.port.unwrap_or(config.server.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Server running on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("HTTP server closed");
    DatabaseManager::close(pool).await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Unable to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Unable to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
