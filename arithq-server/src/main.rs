//! arithq-server - HTTP service for the arithmetic question bank
//!
//! Resolves configuration (CLI > environment > TOML > OS default), opens the
//! SQLite database, optionally imports a questions file and then serves the
//! HTTP API until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use arithq_common::config::{resolve_database_path, resolve_root_folder, TomlConfig};
use arithq_common::db::init_database;
use arithq_common::import::Importer;
use arithq_common::question::validator::Validator;
use arithq_server::api::import::ImportSources;
use arithq_server::{build_router, AppState};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for arithq-server
#[derive(Parser, Debug)]
#[command(name = "arithq-server")]
#[command(about = "HTTP service for the arithmetic question bank")]
#[command(version)]
struct Args {
    /// TOML config file (defaults to the platform config location)
    #[arg(short, long, env = "ARITHQ_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "ARITHQ_PORT")]
    port: Option<u16>,

    /// Root folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// SQLite database file (defaults to <root_folder>/arithq.db)
    #[arg(short, long, env = "ARITHQ_DATABASE")]
    database: Option<PathBuf>,

    /// Questions file to import before serving
    #[arg(short, long)]
    import_file: Option<PathBuf>,
}

fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!(
        "arithq_server={level},arithq_common={level},tower_http={level}"
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG wins; otherwise the level from the config file is applied below
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter_layer, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| log_filter("info")));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting arithq-server v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    if !from_env {
        if let Err(e) = filter_handle.reload(log_filter(&config.logging.level)) {
            warn!("Could not apply log level {:?}: {}", config.logging.level, e);
        }
    }

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), config.root_folder.as_deref());
    let explicit_db = args.database.as_deref().or(config.database_path.as_deref());
    let db_path = resolve_database_path(explicit_db, &root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let validator = Validator::new(config.answer_rule);
    info!("Answer rule: {:?}", config.answer_rule);
    let import_file = args.import_file.or(config.import_file);
    let state = AppState::new(pool, validator)
        .with_import_sources(ImportSources::new(root_folder, import_file.clone()));

    if let Some(import_file) = &import_file {
        let importer = Importer::new(state.store.clone(), validator);
        if let Err(e) = importer.import_file(import_file).await {
            error!("Start-up import of {} failed: {}", import_file.display(), e);
        }
    }

    let app = build_router(state);

    let port = args.port.unwrap_or(config.port);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("arithq-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("arithq-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
