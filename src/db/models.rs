//! Database models
//!
//! Data structures representing database tables

use crate::core::error::ShopError;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse permission tag carried by every user and every session token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Prefix used for the role claim inside session tokens
    pub const AUTHORITY_PREFIX: &'static str = "ROLE_";

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    /// Role claim as embedded in a token, e.g. `ROLE_ADMIN`
    pub fn authority(&self) -> String {
        format!("{}{}", Self::AUTHORITY_PREFIX, self.as_str())
    }

    /// Parse a token role claim produced by [`Role::authority`]
    pub fn from_authority(authority: &str) -> Option<Self> {
        authority
            .strip_prefix(Self::AUTHORITY_PREFIX)
            .and_then(|role| role.parse().ok())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ShopError;

    /// Case-insensitive; anything outside {USER, ADMIN} is rejected
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(ShopError::ValidationError(format!(
                "Unknown role '{}', expected USER or ADMIN",
                other
            ))),
        }
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        text.parse().map_err(|e: ShopError| FromSqlError::Other(Box::new(e)))
    }
}

/// User record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: String,
}

/// Largest stock level a sweet may hold
pub const MAX_QUANTITY: i64 = i32::MAX as i64;

/// Sweet record in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sweet {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub quantity: i64,
    pub image_url: Option<String>,
}

/// Validated field set for inserting or fully replacing a sweet
#[derive(Debug, Clone, PartialEq)]
pub struct SweetDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub quantity: i64,
    pub image_url: Option<String>,
}

impl SweetDraft {
    /// Attach a store-assigned id
    pub fn into_sweet(self, id: i64) -> Sweet {
        Sweet {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            quantity: self.quantity,
            image_url: self.image_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_is_case_insensitive() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" User ".parse::<Role>().unwrap(), Role::User);
        assert!(matches!(
            "superuser".parse::<Role>(),
            Err(ShopError::ValidationError(_))
        ));
    }

    #[test]
    fn test_role_authority_round_trip() {
        assert_eq!(Role::Admin.authority(), "ROLE_ADMIN");
        assert_eq!(Role::from_authority("ROLE_USER"), Some(Role::User));
        assert_eq!(Role::from_authority("ADMIN"), None);
        assert_eq!(Role::from_authority("ROLE_ROOT"), None);
    }

    #[test]
    fn test_sweet_json_uses_camel_case() {
        let sweet = SweetDraft {
            name: "Ladoo".to_string(),
            description: None,
            price: 10.0,
            quantity: 5,
            image_url: Some("https://img.example/ladoo.png".to_string()),
        }
        .into_sweet(1);

        let json = serde_json::to_value(&sweet).unwrap();
        assert_eq!(json["imageUrl"], "https://img.example/ladoo.png");
        assert_eq!(json["quantity"], 5);
        assert!(json.get("image_url").is_none());
    }
}
