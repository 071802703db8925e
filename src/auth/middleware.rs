//! Access control gate
//!
//! Resolves the caller's identity from a bearer token and enforces the
//! route policy before any handler runs.

use crate::api::handlers::AppState;
use crate::auth::jwt::validate_token;
use crate::auth::policy::required_access;
use crate::core::error::ShopError;
use crate::db::models::Role;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Identity bound to a request that carried a valid token
#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser {
    pub username: String,
    pub role: Role,
}

/// Access control middleware
///
/// A missing or invalid token leaves the request unauthenticated; the route
/// policy then decides whether that is acceptable.
pub async fn access_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = identify(request.headers(), &state.jwt_secret);
    let access = required_access(request.method(), request.uri().path());

    if let Err(e) = access.check(identity.as_ref()) {
        tracing::debug!(
            method = %request.method(),
            path = %request.uri().path(),
            required = ?access,
            "Request rejected by access gate"
        );
        return e.into_response();
    }

    if let Some(user) = identity {
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}

/// Resolve the bearer token in `headers`, if any, to an identity
fn identify(headers: &HeaderMap, secret: &str) -> Option<AuthUser> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))?;

    let claims = match validate_token(token.trim(), secret) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid bearer token");
            return None;
        }
    };

    match claims.role() {
        Some(role) => Some(AuthUser {
            username: claims.sub,
            role,
        }),
        None => {
            tracing::debug!(role = %claims.role, "Ignoring token with unknown role claim");
            None
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ShopError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ShopError::AuthenticationError("User not authenticated".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_token;
    use axum::http::HeaderValue;
    use std::time::Duration;

    const SECRET: &str = "gate-secret";

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_valid_token_yields_identity() {
        let token = generate_token("alice", Role::User, SECRET, Duration::from_secs(60)).unwrap();

        let user = identify(&bearer(&token), SECRET).unwrap();
        assert_eq!(user, AuthUser { username: "alice".to_string(), role: Role::User });
    }

    #[test]
    fn test_bad_credentials_stay_anonymous() {
        assert!(identify(&HeaderMap::new(), SECRET).is_none());
        assert!(identify(&bearer("garbage"), SECRET).is_none());

        let foreign = generate_token("alice", Role::Admin, "other", Duration::from_secs(60)).unwrap();
        assert!(identify(&bearer(&foreign), SECRET).is_none());

        let mut basic = HeaderMap::new();
        basic.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic YWxpY2U6cHc="));
        assert!(identify(&basic, SECRET).is_none());
    }
}
