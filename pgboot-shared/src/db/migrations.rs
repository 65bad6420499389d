/// Directory-based SQL migration runner
///
/// This module applies every `.sql` file found in a directory, one after
/// the other, against the database.
///
/// # Migration Files
///
/// - Only regular entries whose name ends in `.sql` are considered; other
///   files and subdirectories are skipped.
/// - Files are ordered by filename, byte by byte. `10_users.sql` therefore
///   runs before `2_accounts.sql`; zero-pad the prefixes or switch to
///   [`MigrationOrder::NumericPrefix`].
/// - Each file's full text is sent as one batch with no parameters and no
///   surrounding transaction, so a file may hold several statements.
/// - Nothing records which files already ran. Every run executes every file,
///   so migrations must be written to be re-runnable
///   (`CREATE TABLE IF NOT EXISTS`, ...).
///
/// The run stops at the first file that fails to read or execute. Files
/// executed before it stay applied.
///
/// # Example
///
/// ```no_run
/// use pgboot_shared::config::DatabaseConfig;
/// use pgboot_shared::db::pool::create_pool;
/// use pgboot_shared::db::migrations::run_migrations;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// };
/// let pool = create_pool(&config).await?;
///
/// let applied = run_migrations(&pool, "./migrations").await?;
/// println!("Executed {} migration files", applied);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Executor;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Filename suffix that marks a migration file
pub const MIGRATION_EXTENSION: &str = ".sql";

/// Migration runner errors
#[derive(Error, Debug)]
pub enum MigrationError {
    /// The migrations directory could not be listed
    #[error("cannot read migrations directory {}: {source}", .path.display())]
    DirectoryRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A migration file could not be read as text
    #[error("failed reading {name}: {source}")]
    FileRead {
        name: String,
        source: std::io::Error,
    },

    /// The database rejected a migration
    #[error("migration {name} failed: {source}")]
    Execution { name: String, source: sqlx::Error },

    /// Numeric ordering was requested but the filename has no leading number
    #[error("migration {name} does not start with a numeric prefix")]
    InvalidPrefix { name: String },

    /// Numeric ordering was requested and two files share a number
    #[error("migrations {first} and {second} share numeric prefix {prefix}")]
    DuplicatePrefix {
        prefix: String,
        first: String,
        second: String,
    },
}

impl MigrationError {
    /// Name of the file the run stopped at, if the error concerns one file
    pub fn migration_name(&self) -> Option<&str> {
        match self {
            MigrationError::FileRead { name, .. }
            | MigrationError::Execution { name, .. }
            | MigrationError::InvalidPrefix { name } => Some(name),
            MigrationError::DuplicatePrefix { second, .. } => Some(second),
            MigrationError::DirectoryRead { .. } => None,
        }
    }
}

/// How migration files are ordered before they run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MigrationOrder {
    /// Byte-wise filename comparison (`10.sql` before `2.sql`)
    #[default]
    Lexicographic,

    /// Leading decimal number of the filename (`2.sql` before `10.sql`)
    ///
    /// Every file must carry a prefix and no two files may share one.
    NumericPrefix,
}

impl FromStr for MigrationOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lexicographic" | "lexical" => Ok(MigrationOrder::Lexicographic),
            "numeric" | "numeric_prefix" => Ok(MigrationOrder::NumericPrefix),
            other => Err(format!(
                "unknown migration order '{}', expected 'lexicographic' or 'numeric'",
                other
            )),
        }
    }
}

/// A migration file found on disk
///
/// Only the location is kept; the content is read right before execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// Filename, used in logs and errors
    pub name: String,

    /// Full path to the file
    pub path: PathBuf,
}

/// Something that can run a raw SQL batch
///
/// Implemented for `PgPool`; the runner only needs this one operation.
#[async_trait]
pub trait MigrationExecutor: Send + Sync {
    /// Executes `sql` verbatim as a single batch
    async fn execute_batch(&self, sql: &str) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl MigrationExecutor for PgPool {
    async fn execute_batch(&self, sql: &str) -> Result<(), sqlx::Error> {
        // Unbound queries go through the simple query protocol, which
        // accepts several statements in one string.
        let result = self.execute(sql).await?;
        debug!(rows_affected = result.rows_affected(), "Batch executed");
        Ok(())
    }
}

/// Runs every migration in `dir` in byte-wise filename order
///
/// Returns the number of files executed.
///
/// # Errors
///
/// Returns an error if:
/// - The directory does not exist or cannot be listed
/// - A migration file cannot be read
/// - A migration fails to execute (the remaining files are not attempted)
pub async fn run_migrations<E>(executor: &E, dir: impl AsRef<Path>) -> Result<usize, MigrationError>
where
    E: MigrationExecutor + ?Sized,
{
    run_migrations_with_order(executor, dir, MigrationOrder::default()).await
}

/// Runs every migration in `dir` using the given ordering policy
///
/// With [`MigrationOrder::NumericPrefix`] the whole directory is validated
/// before the first file executes.
pub async fn run_migrations_with_order<E>(
    executor: &E,
    dir: impl AsRef<Path>,
    order: MigrationOrder,
) -> Result<usize, MigrationError>
where
    E: MigrationExecutor + ?Sized,
{
    let dir = dir.as_ref();
    info!(dir = %dir.display(), ?order, "Starting database migrations");

    let files = discover_migrations(dir, order).await?;

    for file in &files {
        apply_migration(executor, file).await?;
    }

    info!(
        applied = files.len(),
        "All database migrations completed successfully"
    );
    Ok(files.len())
}

/// Lists the migration files in `dir` in execution order
///
/// # Errors
///
/// Returns `MigrationError::DirectoryRead` if the directory cannot be
/// listed, and the prefix errors when `order` is numeric.
pub async fn discover_migrations(
    dir: &Path,
    order: MigrationOrder,
) -> Result<Vec<MigrationFile>, MigrationError> {
    let dir_error = |source: std::io::Error| MigrationError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(dir_error)?;
    let mut names: Vec<OsString> = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(dir_error)? {
        let file_name = entry.file_name();

        if !has_migration_extension(&file_name) {
            debug!(file = %file_name.to_string_lossy(), "Skipping non-migration file");
            continue;
        }

        let file_type = entry.file_type().await.map_err(dir_error)?;
        if file_type.is_dir() {
            debug!(file = %file_name.to_string_lossy(), "Skipping directory");
            continue;
        }

        names.push(file_name);
    }

    // OsString ordering is byte-wise
    names.sort();

    let mut files: Vec<MigrationFile> = names
        .into_iter()
        .map(|file_name| MigrationFile {
            name: file_name.to_string_lossy().into_owned(),
            path: dir.join(&file_name),
        })
        .collect();

    if order == MigrationOrder::NumericPrefix {
        sort_by_numeric_prefix(&mut files)?;
    }

    debug!(count = files.len(), "Discovered migration files");
    Ok(files)
}

async fn apply_migration<E>(executor: &E, file: &MigrationFile) -> Result<(), MigrationError>
where
    E: MigrationExecutor + ?Sized,
{
    let sql = tokio::fs::read_to_string(&file.path)
        .await
        .map_err(|source| MigrationError::FileRead {
            name: file.name.clone(),
            source,
        })?;

    info!(migration = %file.name, "Running migration");

    executor.execute_batch(&sql).await.map_err(|source| {
        warn!(migration = %file.name, error = %source, "Migration failed");
        MigrationError::Execution {
            name: file.name.clone(),
            source,
        }
    })
}

fn has_migration_extension(file_name: &OsStr) -> bool {
    file_name
        .as_encoded_bytes()
        .ends_with(MIGRATION_EXTENSION.as_bytes())
}

/// Leading run of ASCII digits with leading zeros removed
///
/// Kept as text so prefixes of any length (timestamps, ...) compare without
/// overflowing. All-zero prefixes normalise to `"0"`.
fn numeric_prefix(name: &str) -> Option<&str> {
    let end = name
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(name.len());
    if end == 0 {
        return None;
    }
    let digits = name[..end].trim_start_matches('0');
    Some(if digits.is_empty() { "0" } else { digits })
}

fn sort_by_numeric_prefix(files: &mut Vec<MigrationFile>) -> Result<(), MigrationError> {
    let mut keyed = Vec::with_capacity(files.len());
    for file in files.drain(..) {
        let prefix = numeric_prefix(&file.name).ok_or_else(|| MigrationError::InvalidPrefix {
            name: file.name.clone(),
        })?;
        keyed.push((prefix.to_string(), file));
    }

    // Without leading zeros, a shorter digit string is the smaller number.
    // Stable, so equal prefixes keep filename order for the error message.
    keyed.sort_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

    for pair in keyed.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(MigrationError::DuplicatePrefix {
                prefix: pair[0].0.clone(),
                first: pair[0].1.name.clone(),
                second: pair[1].1.name.clone(),
            });
        }
    }

    files.extend(keyed.into_iter().map(|(_, file)| file));
    Ok(())
}
