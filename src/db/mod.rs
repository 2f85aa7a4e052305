//! Database layer
//!
//! Database abstraction for the Vitrine portfolio system:
//! - SQLite (default, for single-binary deployment)
//! - MySQL (for larger deployments)
//!
//! The driver is selected from configuration. Repositories are written
//! against the `DatabasePool` trait and dispatch per driver internally.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
