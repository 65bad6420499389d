/// Database layer for pgboot
///
/// This module provides connection pool provisioning, the SQL migration
/// runner and the startup sequence that chains the two.
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool provisioning with a reachability ping
/// - `migrations`: Directory-based SQL migration runner
/// - `bootstrap`: Provision a pool, then migrate it
///
/// # Example
///
/// ```no_run
/// use pgboot_shared::config::DatabaseConfig;
/// use pgboot_shared::db::bootstrap::bootstrap;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = bootstrap(&config).await?;
///     pool.close().await;
///     Ok(())
/// }
/// ```

pub mod bootstrap;
pub mod migrations;
pub mod pool;
