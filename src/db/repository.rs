//! Repository pattern implementation for data access layer
//!
//! This module provides the Repository pattern for abstracting database operations.

use crate::core::error::{Result, ShopError};
use crate::db::manager::DatabaseManager;
use crate::db::models::{Role, Sweet, SweetDraft, User, MAX_QUANTITY};
use async_trait::async_trait;
use rusqlite::{ErrorCode, OptionalExtension, Row};
use std::sync::Arc;

/// Generic repository trait for the operations every store supports
#[async_trait]
pub trait Repository<T>: Send + Sync {
    /// Insert payload; the store assigns the identity
    type Draft: Send + Sync;

    /// Find an entity by its ID
    async fn find_by_id(&self, id: i64) -> Result<Option<T>>;

    /// Find all entities
    async fn find_all(&self) -> Result<Vec<T>>;

    /// Persist a new entity and return it with its assigned ID
    async fn create(&self, draft: &Self::Draft) -> Result<T>;
}

const SWEET_COLUMNS: &str = "id, name, description, price, quantity, image_url";

fn sweet_from_row(row: &Row<'_>) -> rusqlite::Result<Sweet> {
    Ok(Sweet {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        quantity: row.get(4)?,
        image_url: row.get(5)?,
    })
}

fn select_sweet(conn: &rusqlite::Connection, id: i64) -> Result<Option<Sweet>> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM sweets WHERE id = ?", SWEET_COLUMNS),
            [id],
            sweet_from_row,
        )
        .optional()?)
}

/// Outcome of a guarded stock decrement
#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseOutcome {
    Purchased(Sweet),
    OutOfStock,
    NotFound,
}

/// Outcome of a bounded stock increment
#[derive(Debug, Clone, PartialEq)]
pub enum RestockOutcome {
    Restocked(Sweet),
    /// Unchanged sweet; the increment would pass [`MAX_QUANTITY`]
    ExceedsLimit(Sweet),
    NotFound,
}

/// Repository for Sweet entities
pub struct SweetRepository {
    db: Arc<DatabaseManager>,
}

impl SweetRepository {
    /// Create a new SweetRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Sweets whose name or description contains `query`, ignoring case
    pub async fn search(&self, query: &str) -> Result<Vec<Sweet>> {
        let query = query.to_string();
        self.db.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM sweets \
                 WHERE instr(lower(name), lower(?1)) > 0 \
                    OR instr(lower(COALESCE(description, '')), lower(?1)) > 0 \
                 ORDER BY id",
                SWEET_COLUMNS
            ))?;

            let sweets = stmt
                .query_map([&query], sweet_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(sweets)
        }).await
    }

    /// Replace every mutable field; `None` when the id does not exist
    pub async fn update(&self, id: i64, draft: &SweetDraft) -> Result<Option<Sweet>> {
        let draft = draft.clone();
        self.db.execute(move |conn| {
            let changed = conn.execute(
                "UPDATE sweets SET name = ?, description = ?, price = ?, quantity = ?, image_url = ? \
                 WHERE id = ?",
                rusqlite::params![
                    &draft.name,
                    &draft.description,
                    draft.price,
                    draft.quantity,
                    &draft.image_url,
                    id,
                ],
            )?;

            if changed == 0 {
                return Ok(None);
            }
            Ok(Some(draft.into_sweet(id)))
        }).await
    }

    /// Delete by id; returns whether a row was removed
    pub async fn delete(&self, id: i64) -> Result<bool> {
        self.db.execute(move |conn| {
            let deleted = conn.execute("DELETE FROM sweets WHERE id = ?", [id])?;
            Ok(deleted > 0)
        }).await
    }

    /// Decrement quantity by one unless it is already zero
    ///
    /// The guard lives in the UPDATE itself, so two concurrent purchases of the
    /// last unit cannot both succeed.
    pub async fn purchase(&self, id: i64) -> Result<PurchaseOutcome> {
        self.db.transaction(move |tx| {
            let changed = tx.execute(
                "UPDATE sweets SET quantity = quantity - 1 WHERE id = ? AND quantity > 0",
                [id],
            )?;

            match select_sweet(tx, id)? {
                None => Ok(PurchaseOutcome::NotFound),
                Some(_) if changed == 0 => Ok(PurchaseOutcome::OutOfStock),
                Some(sweet) => Ok(PurchaseOutcome::Purchased(sweet)),
            }
        }).await
    }

    /// Add `amount` units in a single statement
    ///
    /// The UPDATE only applies while the result stays within [`MAX_QUANTITY`].
    pub async fn restock(&self, id: i64, amount: i32) -> Result<RestockOutcome> {
        self.db.transaction(move |tx| {
            let changed = tx.execute(
                "UPDATE sweets SET quantity = quantity + ?1 WHERE id = ?2 AND quantity <= ?3 - ?1",
                [i64::from(amount), id, MAX_QUANTITY],
            )?;

            match select_sweet(tx, id)? {
                None => Ok(RestockOutcome::NotFound),
                Some(sweet) if changed == 0 => Ok(RestockOutcome::ExceedsLimit(sweet)),
                Some(sweet) => Ok(RestockOutcome::Restocked(sweet)),
            }
        }).await
    }
}

#[async_trait]
impl Repository<Sweet> for SweetRepository {
    type Draft = SweetDraft;

    async fn find_by_id(&self, id: i64) -> Result<Option<Sweet>> {
        self.db.execute(move |conn| select_sweet(conn, id)).await
    }

    async fn find_all(&self) -> Result<Vec<Sweet>> {
        self.db.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM sweets ORDER BY id",
                SWEET_COLUMNS
            ))?;

            let sweets = stmt
                .query_map([], sweet_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(sweets)
        }).await
    }

    async fn create(&self, draft: &SweetDraft) -> Result<Sweet> {
        let draft = draft.clone();
        self.db.execute(move |conn| {
            conn.execute(
                "INSERT INTO sweets (name, description, price, quantity, image_url) \
                 VALUES (?, ?, ?, ?, ?)",
                rusqlite::params![
                    &draft.name,
                    &draft.description,
                    draft.price,
                    draft.quantity,
                    &draft.image_url,
                ],
            )?;
            Ok(draft.into_sweet(conn.last_insert_rowid()))
        }).await
    }
}

/// Insert payload for a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

const USER_COLUMNS: &str = "id, username, password_hash, role, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        role: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
            && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Repository for User entities
pub struct UserRepository {
    db: Arc<DatabaseManager>,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.to_string();
        self.db.execute(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS),
                    [&username],
                    user_from_row,
                )
                .optional()?)
        }).await
    }

    /// Count total users
    pub async fn count(&self) -> Result<i64> {
        self.db.execute(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
        }).await
    }
}

#[async_trait]
impl Repository<User> for UserRepository {
    type Draft = NewUser;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        self.db.execute(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                    [id],
                    user_from_row,
                )
                .optional()?)
        }).await
    }

    async fn find_all(&self) -> Result<Vec<User>> {
        self.db.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM users ORDER BY id",
                USER_COLUMNS
            ))?;

            let users = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(users)
        }).await
    }

    /// Fails with `Conflict` when the username is taken
    async fn create(&self, new_user: &NewUser) -> Result<User> {
        let new_user = new_user.clone();
        self.db.execute(move |conn| {
            conn.execute(
                "INSERT INTO users (username, password_hash, role) VALUES (?, ?, ?)",
                rusqlite::params![&new_user.username, &new_user.password_hash, new_user.role],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ShopError::Conflict(format!("Username '{}' already exists", new_user.username))
                } else {
                    ShopError::DatabaseError(e)
                }
            })?;

            let id = conn.last_insert_rowid();
            Ok(conn.query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                [id],
                user_from_row,
            )?)
        }).await
    }
}
