/// Startup sequence: provision the pool, then migrate it
///
/// # Example
///
/// ```no_run
/// use pgboot_shared::config::DatabaseConfig;
/// use pgboot_shared::db::bootstrap::bootstrap;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = DatabaseConfig::from_env()?;
/// let pool = bootstrap(&config).await?;
/// # Ok(())
/// # }
/// ```

use crate::config::DatabaseConfig;
use crate::db::migrations::{run_migrations_with_order, MigrationError};
use crate::db::pool::{close_pool, create_pool, PoolError};
use sqlx::postgres::PgPool;
use thiserror::Error;
use tracing::{info, warn};

/// Startup errors
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("database pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("migration error: {0}")]
    Migration(#[from] MigrationError),
}

/// Opens the pool described by `config` and applies the migrations in
/// `config.migrations_dir`
///
/// On success the pool is live, pinged and migrated; the caller owns it.
/// If a migration fails the pool is closed before the error is returned.
///
/// # Errors
///
/// Returns `BootstrapError::Pool` if provisioning fails and
/// `BootstrapError::Migration` if any migration step fails.
pub async fn bootstrap(config: &DatabaseConfig) -> Result<PgPool, BootstrapError> {
    let pool = create_pool(config).await?;

    match run_migrations_with_order(&pool, &config.migrations_dir, config.migration_order).await {
        Ok(applied) => {
            info!(applied, "Database ready");
            Ok(pool)
        }
        Err(e) => {
            warn!(
                error = %e,
                migration = e.migration_name().unwrap_or("-"),
                "Database startup aborted"
            );
            close_pool(pool).await;
            Err(e.into())
        }
    }
}
