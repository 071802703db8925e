//! Request extractors whose rejections are reported as `ShopError`
//!
//! Drop-in replacements for axum's `Json`, `Query` and `Path`: a malformed
//! body, query string or path segment becomes a JSON `ValidationError`
//! instead of axum's plain-text rejection.

use crate::core::error::ShopError;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// JSON body extractor and response
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ShopError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query string extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ShopError))]
pub struct Query<T>(pub T);

/// Path parameter extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ShopError))]
pub struct Path<T>(pub T);

impl From<JsonRejection> for ShopError {
    fn from(rejection: JsonRejection) -> Self {
        ShopError::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for ShopError {
    fn from(rejection: QueryRejection) -> Self {
        ShopError::ValidationError(rejection.body_text())
    }
}

impl From<PathRejection> for ShopError {
    fn from(rejection: PathRejection) -> Self {
        ShopError::ValidationError(rejection.body_text())
    }
}
