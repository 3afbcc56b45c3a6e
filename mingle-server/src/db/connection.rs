use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

use super::schema::SCHEMA;

/// SQLite in-memory database identifier
const MEMORY_DB_PATH: &str = ":memory:";

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling support
#[derive(Clone)]
pub struct Database {
    pub pool: DbPool,
}

impl Database {
    /// Create a new database connection pool
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let manager = Self::create_connection_manager(path);
        let pool = Pool::new(manager).context("Failed to create database connection pool")?;
        Ok(Self { pool })
    }

    /// Create a connection manager for a file path or ":memory:"
    ///
    /// Foreign keys are enabled on every pooled connection so that deleting a
    /// profile cascades to its like edges.
    fn create_connection_manager<P: AsRef<Path>>(path: P) -> SqliteConnectionManager {
        let path_str = path.as_ref().to_string_lossy();
        let trimmed_path = path_str.trim();

        let manager = if trimmed_path.eq_ignore_ascii_case(MEMORY_DB_PATH) {
            SqliteConnectionManager::memory()
        } else {
            SqliteConnectionManager::file(path)
        };

        manager.with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"))
    }

    /// Create an in-memory database pool (useful for testing)
    ///
    /// Uses a uniquely named shared-cache URI so every pooled connection sees
    /// the same database; a plain ":memory:" opens a private database per
    /// connection.
    pub fn in_memory() -> Result<Self> {
        let uri = format!(
            "file:mingle-{}?mode=memory&cache=shared",
            uuid::Uuid::new_v4()
        );
        Self::new(uri)
    }

    /// Initialize the database schema
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .context("Failed to get database connection from pool")
    }
}
