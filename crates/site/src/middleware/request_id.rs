//! Request ID middleware.
//!
//! Every request gets an id, either the one an upstream proxy sent in
//! `x-request-id` or a fresh UUID v4. The id is tagged on the Sentry scope,
//! stored in the request extensions as [`RequestId`] (where [`request_span`]
//! picks it up for the `TraceLayer` span) and echoed back in the response.
//!
//! The middleware must sit outside `TraceLayer` so the extension exists
//! when the span is created.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream id accepted as-is.
const MAX_UPSTREAM_ID_LEN: usize = 64;

/// The current request's id, available as an extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    /// The id assigned to `request`, empty before the middleware ran.
    #[must_use]
    pub fn of(request: &Request) -> &str {
        request
            .extensions()
            .get::<Self>()
            .map_or("", |id| id.0.as_str())
    }
}

/// Span for `TraceLayer::make_span_with`, carrying the request id.
pub fn request_span(request: &Request) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = RequestId::of(request),
    )
}

/// Accept an upstream id only if it is short, printable ASCII.
fn upstream_id(request: &Request) -> Option<String> {
    let value = request.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?;
    let valid = !value.is_empty()
        && value.len() <= MAX_UPSTREAM_ID_LEN
        && value.bytes().all(|b| b.is_ascii_graphic());
    valid.then(|| value.to_string())
}

/// Assign the request id and propagate it to logs, Sentry and the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = upstream_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request_with(id: &str) -> Request {
        Request::builder()
            .header(REQUEST_ID_HEADER, id)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_upstream_id_kept() {
        assert_eq!(
            upstream_id(&request_with("cf-1234abcd")).as_deref(),
            Some("cf-1234abcd")
        );
    }

    #[test]
    fn test_upstream_id_rejected_when_unreasonable() {
        assert!(upstream_id(&request_with(&"x".repeat(65))).is_none());
        assert!(upstream_id(&request_with("has space")).is_none());
        assert!(upstream_id(&Request::new(Body::empty())).is_none());
    }

    #[tokio::test]
    async fn test_id_reaches_extensions_and_response() {
        use axum::{Router, middleware::from_fn, routing::get};
        use tower::ServiceExt;

        async fn echo(request: Request) -> String {
            RequestId::of(&request).to_string()
        }

        let app = Router::new()
            .route("/", get(echo))
            .layer(from_fn(request_id_middleware));

        let response = app.oneshot(request_with("edge-42")).await.unwrap();
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "edge-42");

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"edge-42");
    }

    #[test]
    fn test_missing_id_is_empty() {
        assert_eq!(RequestId::of(&Request::new(Body::empty())), "");
    }
}
