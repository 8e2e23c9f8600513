//! Per-request ambient context.
//!
//! # Responsibilities
//! - Buffer the request body (bounded) so the request id can be read from it
//! - Start every request with an empty ambient context
//! - Bind `request_id` from the JSON body, falling back to the
//!   `x-request-id` header set by the request-id layer
//!
//! # Design Decisions
//! - The context lives in a task-local scope, so it cannot leak between
//!   requests handled on the same worker thread

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::context;
use crate::event::{Fields, Value};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Middleware state: the maximum body size to buffer.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit(pub usize);

/// Run the rest of the request inside a fresh ambient context holding the
/// request id.
pub async fn bind_request_context(
    State(BodyLimit(limit)): State<BodyLimit>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, limit, "Rejected request body");
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    let mut ambient = Fields::new();
    ambient.insert("request_id".to_string(), extract_request_id(&parts.headers, &bytes));

    let request = Request::from_parts(parts, Body::from(bytes));
    context::scope(ambient, next.run(request)).await
}

/// `request_id` from a JSON object body, else the request-id header, else null.
pub fn extract_request_id(headers: &HeaderMap, body: &Bytes) -> Value {
    let from_body = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|payload| payload.get("request_id").cloned())
        .filter(|id| !id.is_null())
        .map(Value::from);

    from_body
        .or_else(|| {
            headers
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .map(Value::from)
        })
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_body_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("from-header"));
        let body = Bytes::from_static(br#"{"request_id": "from-body"}"#);
        assert_eq!(extract_request_id(&headers, &body), Value::from("from-body"));
    }

    #[test]
    fn test_header_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("from-header"));
        let body = Bytes::from_static(br#"{"request_id": null}"#);
        assert_eq!(extract_request_id(&headers, &body), Value::from("from-header"));
    }

    #[test]
    fn test_numeric_id_and_missing() {
        let body = Bytes::from_static(br#"{"request_id": 7}"#);
        assert_eq!(extract_request_id(&HeaderMap::new(), &body), Value::Int(7));
        assert_eq!(
            extract_request_id(&HeaderMap::new(), &Bytes::from_static(b"not json")),
            Value::Null
        );
    }
}
