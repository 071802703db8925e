//! Business logic services
//!
//! This module implements the Application Layer services that coordinate between
//! the REST API Layer and the Infrastructure Layer (database, token issuer).

use crate::api::models::SweetRequest;
use crate::auth::jwt::generate_token;
use crate::auth::models::{LoginResponse, UserInfo};
use crate::auth::password::{hash_password, verify_password};
use crate::core::error::{Result, ShopError};
use crate::db::models::{Role, Sweet, SweetDraft, User, MAX_QUANTITY};
use crate::db::repository::{
    NewUser, PurchaseOutcome, Repository, RestockOutcome, SweetRepository, UserRepository,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

/// Authentication service: registration and credential checks
pub struct AuthService {
    user_repo: Arc<UserRepository>,
    jwt_secret: String,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        user_repo: Arc<UserRepository>,
        jwt_secret: impl Into<String>,
        token_ttl: Duration,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            user_repo,
            jwt_secret: jwt_secret.into(),
            token_ttl,
            bcrypt_cost,
        }
    }

    /// Register a new user
    ///
    /// `role` is case-insensitive; absent or blank means USER. A taken
    /// username fails with `Conflict` from the store.
    pub async fn register(&self, username: &str, password: &str, role: Option<&str>) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ShopError::ValidationError(
                "Username is required and cannot be empty".to_string()
            ));
        }

        if password.is_empty() {
            return Err(ShopError::ValidationError(
                "Password is required and cannot be empty".to_string()
            ));
        }

        let role = match role.map(str::trim).filter(|r| !r.is_empty()) {
            Some(r) => r.parse::<Role>()?,
            None => Role::User,
        };

        let password_hash = self.hash(password).await?;

        self.user_repo.create(&NewUser {
            username: username.to_string(),
            password_hash,
            role,
        }).await
    }

    /// Verify credentials and issue a session token
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let invalid = || ShopError::AuthenticationError("Invalid username or password".to_string());

        let user = self.user_repo.find_by_username(username.trim()).await?
            .ok_or_else(invalid)?;

        let candidate = password.to_string();
        let hash = user.password_hash.clone();
        let is_valid = task::spawn_blocking(move || verify_password(&candidate, &hash))
            .await
            .map_err(|e| ShopError::TaskError(format!("Password check panicked: {}", e)))??;

        if !is_valid {
            tracing::warn!(username = %user.username, "Invalid password");
            return Err(invalid());
        }

        let token = generate_token(&user.username, user.role, &self.jwt_secret, self.token_ttl)?;

        Ok(LoginResponse {
            token,
            user: UserInfo::from(user),
        })
    }

    /// Create an ADMIN account when no users exist yet
    ///
    /// Returns the created user, or `None` if the store was already populated.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<Option<User>> {
        if self.user_repo.count().await? > 0 {
            return Ok(None);
        }

        let admin = self.register(username, password, Some(Role::Admin.as_str())).await?;
        Ok(Some(admin))
    }

    async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;
        task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| ShopError::TaskError(format!("Password hashing panicked: {}", e)))?
    }
}

/// Sweet service for managing inventory business logic
pub struct SweetService {
    sweet_repo: Arc<SweetRepository>,
}

impl SweetService {
    /// Create a new SweetService
    pub fn new(sweet_repo: Arc<SweetRepository>) -> Self {
        Self { sweet_repo }
    }

    /// Get all sweets
    pub async fn list(&self) -> Result<Vec<Sweet>> {
        self.sweet_repo.find_all().await
    }

    /// Substring search over name and description; blank queries list everything
    pub async fn search(&self, query: Option<&str>) -> Result<Vec<Sweet>> {
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => self.sweet_repo.search(q).await,
            None => self.list().await,
        }
    }

    /// Create a new sweet
    pub async fn add(&self, request: SweetRequest) -> Result<Sweet> {
        let draft = self.validate_request(request)?;
        self.sweet_repo.create(&draft).await
    }

    /// Replace every field of an existing sweet
    pub async fn update(&self, id: i64, request: SweetRequest) -> Result<Sweet> {
        let draft = self.validate_request(request)?;
        self.sweet_repo.update(id, &draft).await?
            .ok_or_else(|| not_found(id))
    }

    /// Delete a sweet
    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.sweet_repo.delete(id).await? {
            return Err(not_found(id));
        }
        Ok(())
    }

    /// Sell one unit
    pub async fn purchase(&self, id: i64) -> Result<Sweet> {
        match self.sweet_repo.purchase(id).await? {
            PurchaseOutcome::Purchased(sweet) => Ok(sweet),
            PurchaseOutcome::OutOfStock => Err(ShopError::OutOfStock(format!(
                "Sweet with ID {} is out of stock",
                id
            ))),
            PurchaseOutcome::NotFound => Err(not_found(id)),
        }
    }

    /// Add stock; a non-positive amount leaves the sweet unchanged
    pub async fn restock(&self, id: i64, amount: i32) -> Result<Sweet> {
        if amount <= 0 {
            return self.sweet_repo.find_by_id(id).await?
                .ok_or_else(|| not_found(id));
        }

        match self.sweet_repo.restock(id, amount).await? {
            RestockOutcome::Restocked(sweet) => Ok(sweet),
            RestockOutcome::ExceedsLimit(sweet) => Err(ShopError::ValidationError(format!(
                "Restocking {} units would raise quantity {} above {}",
                amount, sweet.quantity, MAX_QUANTITY
            ))),
            RestockOutcome::NotFound => Err(not_found(id)),
        }
    }

    /// Validate a create/update request into a complete field set
    fn validate_request(&self, request: SweetRequest) -> Result<SweetDraft> {
        let name = request.name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ShopError::ValidationError(
                "Name is required and cannot be empty".to_string()
            ))?;

        let price = request.price.ok_or_else(|| ShopError::ValidationError(
            "Price is required".to_string()
        ))?;
        if !price.is_finite() || price < 0.0 {
            return Err(ShopError::ValidationError(
                "Price must be a non-negative number".to_string()
            ));
        }

        let quantity = request.quantity.ok_or_else(|| ShopError::ValidationError(
            "Quantity is required".to_string()
        ))?;
        if quantity < 0 {
            return Err(ShopError::ValidationError(
                "Quantity cannot be negative".to_string()
            ));
        }

        if quantity > MAX_QUANTITY {
            return Err(ShopError::ValidationError(
                format!("Quantity cannot exceed {}", MAX_QUANTITY)
            ));
        }

        Ok(SweetDraft {
            name,
            description: request.description,
            price,
            quantity,
            image_url: request.image_url,
        })
    }
}

fn not_found(id: i64) -> ShopError {
    ShopError::NotFound(format!("Sweet with ID {} not found", id))
}
