//! Route access policy
//!
//! One table decides what every request needs before it reaches a handler.
//! Rules are evaluated top to bottom and the first match wins:
//!
//! | Method             | Path (below `/api`)        | Access        |
//! |--------------------|----------------------------|---------------|
//! | `OPTIONS`          | any                        | public        |
//! | `POST`             | `/auth/register`, `/auth/login` | public   |
//! | `GET HEAD`         | `/sweets*`                 | public        |
//! | `POST`             | `/sweets/{id}/purchase`    | authenticated |
//! | `POST PUT DELETE`  | `/sweets*`                 | `ADMIN`       |
//! | `GET HEAD`         | `/health`                  | public        |
//! | any                | anything else              | authenticated |

use crate::auth::middleware::AuthUser;
use crate::core::error::{Result, ShopError};
use crate::db::models::Role;
use axum::http::Method;

const API_PREFIX: &str = "/api";

/// What a request must present to pass the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Role(Role),
}

impl Access {
    /// Decide whether `identity` satisfies this requirement
    pub fn check(&self, identity: Option<&AuthUser>) -> Result<()> {
        match (self, identity) {
            (Access::Public, _) => Ok(()),
            (_, None) => Err(ShopError::AuthenticationError(
                "Authentication required".to_string(),
            )),
            (Access::Authenticated, Some(_)) => Ok(()),
            (Access::Role(required), Some(user)) if user.role == *required => Ok(()),
            (Access::Role(required), Some(_)) => Err(ShopError::PermissionDenied(format!(
                "Role {} required",
                required
            ))),
        }
    }
}

/// Look up the access requirement for a request line
pub fn required_access(method: &Method, path: &str) -> Access {
    if method == Method::OPTIONS {
        return Access::Public;
    }

    let path = normalize(path);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method, segments.as_slice()) {
        (&Method::POST, ["auth", "register" | "login"]) => Access::Public,
        (&Method::GET | &Method::HEAD, ["sweets", ..]) => Access::Public,
        (&Method::POST, ["sweets", _, "purchase"]) => Access::Authenticated,
        (&Method::POST | &Method::PUT | &Method::DELETE, ["sweets", ..]) => Access::Role(Role::Admin),
        (&Method::GET | &Method::HEAD, ["health"]) => Access::Public,
        _ => Access::Authenticated,
    }
}

/// Strip the `/api` prefix and any trailing slash
fn normalize(path: &str) -> &str {
    let relative = match path.strip_prefix(API_PREFIX) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    };
    relative.trim_end_matches('/')
}
