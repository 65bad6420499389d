//! # pgboot Shared Library
//!
//! Database startup plumbing used by the `pgboot` binary and by any service
//! that wants a migrated PostgreSQL pool before it starts serving.
//!
//! ## Module Organization
//!
//! - `config`: Database configuration loaded from the environment
//! - `db`: Connection pool provisioning, the SQL migration runner and the
//!   startup sequence that chains them

pub mod config;
pub mod db;

/// Current version of the pgboot shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
