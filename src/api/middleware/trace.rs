use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// HTTP header name for trace ID
pub const TRACE_ID_HEADER: &str = "X-Trace-Id";

const MAX_TRACE_ID_LEN: usize = 128;

tokio::task_local! {
    static CURRENT_TRACE_ID: String;
}

/// Trace ID of the request being handled on this task, if any
pub fn current_trace_id() -> Option<String> {
    CURRENT_TRACE_ID.try_with(Clone::clone).ok()
}

/// Middleware that attaches a trace ID to each request and echoes it back.
///
/// A well-formed `X-Trace-Id` sent by the client is reused so that logs can be
/// correlated across services; otherwise a UUID v4 is generated. The ID is
/// stored in request extensions, recorded on the request span, and visible to
/// error bodies through [`current_trace_id`] while the request runs.
pub async fn trace_id_middleware(mut request: Request, next: Next) -> Response {
    let trace_id = request
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| is_acceptable_trace_id(value))
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %request.method(),
        uri = %request.uri(),
        version = ?request.version(),
    );

    tracing::info!(parent: &span, "Request started");

    request.extensions_mut().insert(TraceId(trace_id.clone()));

    let handled = async move {
        let response = next.run(request).await;
        tracing::info!(status = %response.status(), "Request completed");
        response
    }
    .instrument(span);

    let mut response = CURRENT_TRACE_ID.scope(trace_id.clone(), handled).await;

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }

    response
}

fn is_acceptable_trace_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_TRACE_ID_LEN
        && value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Extension type for storing trace ID in request extensions
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ErrorResponse, ShopError};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        response::IntoResponse,
        routing::get,
        Router,
    };
    use tower::util::ServiceExt;

    async fn echo_trace_id(request: Request<Body>) -> impl IntoResponse {
        let trace_id = request
            .extensions()
            .get::<TraceId>()
            .map(|t| t.as_str().to_string())
            .unwrap_or_else(|| "no-trace-id".to_string());

        (StatusCode::OK, trace_id)
    }

    fn app() -> Router {
        Router::new()
            .route("/test", get(echo_trace_id))
            .layer(middleware::from_fn(trace_id_middleware))
    }

    async fn header_and_body(request: Request<Body>) -> (String, String) {
        let response = app().oneshot(request).await.unwrap();
        let header = response
            .headers()
            .get(TRACE_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (header, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_generates_uuid_when_absent() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let (header, body) = header_and_body(request).await;
        assert!(Uuid::parse_str(&header).is_ok());
        assert_eq!(header, body);
    }

    #[tokio::test]
    async fn test_propagates_client_trace_id() {
        let request = Request::builder()
            .uri("/test")
            .header(TRACE_ID_HEADER, "frontend-42")
            .body(Body::empty())
            .unwrap();

        let (header, body) = header_and_body(request).await;
        assert_eq!(header, "frontend-42");
        assert_eq!(body, "frontend-42");
    }

    #[tokio::test]
    async fn test_error_body_carries_request_trace_id() {
        let app = Router::new()
            .route(
                "/missing",
                get(|| async { ShopError::NotFound("Sweet 7 not found".to_string()) }),
            )
            .layer(middleware::from_fn(trace_id_middleware));

        let request = Request::builder()
            .uri("/missing")
            .header(TRACE_ID_HEADER, "checkout-9")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.trace_id, "checkout-9");
    }

    #[test]
    fn test_no_trace_id_outside_a_request() {
        assert!(current_trace_id().is_none());
    }

    #[tokio::test]
    async fn test_replaces_malformed_trace_id() {
        let request = Request::builder()
            .uri("/test")
            .header(TRACE_ID_HEADER, "has spaces; and=junk")
            .body(Body::empty())
            .unwrap();

        let (header, _) = header_and_body(request).await;
        assert!(Uuid::parse_str(&header).is_ok());
    }
}
