//! tagstack-api - HTTP API server for tagstack

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tagstack_api::{build_router, ApiConfig, AppState, LogConfig, StorageBackend};
use tagstack_db::Database;

/// Initialize tracing with configurable output.
///
/// `RUST_LOG` is the standard env filter (default:
/// `tagstack_api=debug,tagstack_db=info,tower_http=debug`). The returned
/// guard must be held for the life of the process when logging to a file.
fn init_logging(log: &LogConfig) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tagstack_api=debug,tagstack_db=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(ref path) = log.file {
        let path = std::path::Path::new(path);
        let file_dir = path.parent().unwrap_or(std::path::Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("tagstack-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log.json {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            // No ANSI in files unless asked for.
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log.ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log.json {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log.ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env()?;
    let _file_guard = init_logging(&config.log);

    info!(
        log_format = if config.log.json { "json" } else { "text" },
        log_file = config.log.file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let state = match config.storage {
        StorageBackend::Memory => {
            info!(storage = "memory", "Using in-memory store; data is lost on exit");
            AppState::in_memory()
        }
        StorageBackend::Postgres => {
            info!("Connecting to database...");
            let db = Database::connect_with_config(&config.database_url, config.pool.clone()).await?;
            info!("Database connected");

            if config.run_migrations {
                info!("Running database migrations...");
                db.migrate().await?;
                info!("Database migrations complete");
            }
            AppState::from_database(db)
        }
    };

    let app = build_router(state);

    let addr = config.socket_addr()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
