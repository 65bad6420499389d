//! # pgboot
//!
//! Opens a PostgreSQL connection pool, applies the `.sql` migrations found in
//! the configured directory and then holds the ready pool until shutdown.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/app MIGRATIONS_DIR=./migrations cargo run -p pgboot-cli
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON log lines and `RUST_LOG` to adjust levels.

use pgboot_shared::config::DatabaseConfig;
use pgboot_shared::db::bootstrap::bootstrap;
use pgboot_shared::db::pool::{close_pool, get_pool_stats, spawn_health_monitor};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loads `.env` too, so LOG_FORMAT set there is seen by init_tracing
    let config = DatabaseConfig::from_env()?;
    init_tracing();

    tracing::info!("pgboot v{} starting...", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        migrations_dir = %config.migrations_dir.display(),
        migration_order = ?config.migration_order,
        "Configuration loaded"
    );

    let pool = bootstrap(&config).await?;
    let monitor = spawn_health_monitor(pool.clone(), config.health_check_period());

    let stats = get_pool_stats(&pool);
    tracing::info!(
        total_connections = stats.total_connections,
        idle_connections = stats.idle_connections,
        "Database is migrated and ready"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, exiting...");

    monitor.stop();
    close_pool(pool).await;
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pgboot=debug,pgboot_shared=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
