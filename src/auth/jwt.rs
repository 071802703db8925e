//! JWT token generation and validation

use crate::core::error::{Result, ShopError};
use crate::db::models::Role;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the token holder
    pub sub: String,
    /// Role authority, e.g. `ROLE_ADMIN`
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Role carried by the token; `None` for an unrecognised authority
    pub fn role(&self) -> Option<Role> {
        Role::from_authority(&self.role)
    }
}

/// Generate a signed token for `username` that expires after `ttl`
pub fn generate_token(username: &str, role: Role, secret: &str, ttl: Duration) -> Result<String> {
    let ttl = chrono::Duration::from_std(ttl)
        .map_err(|e| ShopError::AuthenticationError(format!("Invalid token lifetime: {}", e)))?;

    let issued_at = chrono::Utc::now();
    let expiration = issued_at
        .checked_add_signed(ttl)
        .ok_or_else(|| ShopError::AuthenticationError("Failed to calculate expiration".to_string()))?;

    let claims = Claims {
        sub: username.to_string(),
        role: role.authority(),
        iat: issued_at.timestamp(),
        exp: expiration.timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ShopError::AuthenticationError(format!("Failed to generate token: {}", e)))
}

/// Validate signature and expiry, returning the embedded claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| ShopError::AuthenticationError(format!("Invalid token: {}", e)))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_carries_username_and_role() {
        let token = generate_token("alice", Role::Admin, SECRET, Duration::from_secs(3600)).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, "ROLE_ADMIN");
        assert_eq!(claims.role(), Some(Role::Admin));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = generate_token("alice", Role::User, SECRET, Duration::from_secs(3600)).unwrap();
        assert!(matches!(
            validate_token(&token, "other-secret"),
            Err(ShopError::AuthenticationError(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "alice".to_string(),
            role: Role::User.authority(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(validate_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(validate_token("not.a.token", SECRET).is_err());
    }
}
