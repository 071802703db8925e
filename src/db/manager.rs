//! Database manager implementation
//!
//! This module provides database connection management with:
//! - SQLite connection pool using r2d2
//! - Async wrapper for database operations
//! - Write-locked transactions for read-modify-write sequences
//! - Error handling integration with ShopError

use crate::core::error::{Result, ShopError};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task;

/// Database manager with connection pool
#[derive(Clone)]
pub struct DatabaseManager {
    pool: Pool<SqliteConnectionManager>,
    db_path: PathBuf,
}

impl DatabaseManager {
    /// Create a new DatabaseManager with the specified database path and pool size
    pub fn new(db_path: &Path, pool_size: u32, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(db_path)
            .with_init(move |conn| {
                conn.execute_batch("PRAGMA foreign_keys = ON;")?;
                conn.busy_timeout(busy_timeout)?;
                // WAL lets readers proceed while a purchase holds the write lock
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
                Ok(())
            });

        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_timeout(Duration::from_secs(30))
            .build(manager)?;

        let manager = Self {
            pool,
            db_path: db_path.to_path_buf(),
        };

        manager.migrate()?;

        Ok(manager)
    }

    /// Create a new DatabaseManager with an in-memory database for testing
    pub fn new_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| {
                conn.execute_batch("PRAGMA foreign_keys = ON;")?;
                Ok(())
            });

        // Every in-memory connection is its own database, so keep exactly one
        let pool = Pool::builder()
            .max_size(1)
            .connection_timeout(Duration::from_secs(30))
            .build(manager)?;

        let manager = Self {
            pool,
            db_path: PathBuf::from(":memory:"),
        };

        manager.migrate()?;

        Ok(manager)
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Execute a database operation asynchronously
    ///
    /// This wraps synchronous database operations in tokio::task::spawn_blocking
    /// to avoid blocking the async runtime.
    pub async fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();

        task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        })
        .await
        .map_err(|e| ShopError::TaskError(format!("Database task panicked: {}", e)))?
    }

    /// Execute a database operation within a transaction
    ///
    /// The transaction is opened IMMEDIATE, so the write lock is held from the
    /// first statement. It is committed if the closure returns Ok and rolled
    /// back otherwise.
    pub async fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();

        task::spawn_blocking(move || {
            let mut conn = pool.get()?;

            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let result = f(&tx)?;
            tx.commit()?;

            Ok(result)
        })
        .await
        .map_err(|e| ShopError::TaskError(format!("Transaction task panicked: {}", e)))?
    }

    /// Execute database migrations
    pub fn migrate(&self) -> Result<()> {
        let mut conn = self.get_connection()?;
        crate::db::migrations::run_migrations(&mut conn)
    }

    /// Get the database file path
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Get the current pool size
    pub fn pool_size(&self) -> u32 {
        self.pool.max_size()
    }

    /// Get the number of idle connections in the pool
    pub fn idle_connections(&self) -> u32 {
        self.pool.state().idle_connections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_db() -> (DatabaseManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");
        let manager = DatabaseManager::new(&db_path, 5, Duration::from_secs(5)).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_database_manager_creation() {
        let (manager, temp_dir) = create_test_db();
        assert_eq!(manager.pool_size(), 5);
        assert!(temp_dir.path().join("nested").join("test.db").exists());
    }

    #[tokio::test]
    async fn test_execute_async() {
        let (manager, _temp_dir) = create_test_db();

        let tables: i64 = manager.execute(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'sweets')",
                [],
                |row| row.get(0),
            )?)
        }).await.unwrap();

        assert_eq!(tables, 2);
    }

    #[tokio::test]
    async fn test_transaction_commit() {
        let manager = DatabaseManager::new_in_memory().unwrap();

        manager.transaction(|tx| {
            tx.execute(
                "INSERT INTO sweets (name, price, quantity) VALUES ('Barfi', 4.5, 3)",
                [],
            )?;
            Ok(())
        }).await.unwrap();

        let count: i64 = manager.execute(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM sweets", [], |row| row.get(0))?)
        }).await.unwrap();

        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_transaction_rollback() {
        let manager = DatabaseManager::new_in_memory().unwrap();

        let result: Result<()> = manager.transaction(|tx| {
            tx.execute(
                "INSERT INTO sweets (name, price, quantity) VALUES ('Barfi', 4.5, 3)",
                [],
            )?;
            Err(ShopError::ValidationError("test error".into()))
        }).await;

        assert!(result.is_err());

        let count: i64 = manager.execute(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM sweets", [], |row| row.get(0))?)
        }).await.unwrap();

        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_negative_quantity_rejected_by_schema() {
        let manager = DatabaseManager::new_in_memory().unwrap();

        let result = manager.execute(|conn| {
            conn.execute(
                "INSERT INTO sweets (name, price, quantity) VALUES ('Jalebi', 2.0, -1)",
                [],
            )?;
            Ok(())
        }).await;

        assert!(matches!(result, Err(ShopError::DatabaseError(_))));
    }
}
