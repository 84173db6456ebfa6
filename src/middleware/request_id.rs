use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::future::Future;
use tracing::Instrument;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
static X_CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");

/// Per-request values visible to everything running inside the handler
#[derive(Debug, Clone)]
struct RequestScope {
    id: String,
    debug: bool,
}

tokio::task_local! {
    static REQUEST_SCOPE: RequestScope;
}

/// Request id of the request currently being handled
pub fn current() -> Option<String> {
    REQUEST_SCOPE.try_with(|scope| scope.id.clone()).ok()
}

/// Whether the current request may receive debug error details
pub fn debug_enabled() -> bool {
    REQUEST_SCOPE.try_with(|scope| scope.debug).unwrap_or(false)
}

/// Run `fut` with `id` as the current request id
pub async fn scope<F: Future>(id: String, debug: bool, fut: F) -> F::Output {
    REQUEST_SCOPE.scope(RequestScope { id, debug }, fut).await
}

/// Reuse an inbound `X-Request-ID`/`X-Correlation-ID` or mint a UUID, then
/// echo it back on the response.
pub async fn request_id(State(debug): State<bool>, mut req: Request, next: Next) -> Response {
    let id = [&X_REQUEST_ID, &X_CORRELATION_ID]
        .into_iter()
        .find_map(|name| req.headers().get(name))
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= 128)
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), ToString::to_string);

    let header = HeaderValue::from_str(&id).ok();
    if let Some(ref value) = header {
        req.headers_mut().insert(X_REQUEST_ID.clone(), value.clone());
    }

    let span = tracing::info_span!("request", request_id = %id);
    tracing::debug!(parent: &span, method = %req.method(), path = %req.uri().path(), "Incoming request");
    let mut response = scope(id, debug, next.run(req)).instrument(span).await;

    if let Some(value) = header {
        response.headers_mut().insert(X_REQUEST_ID.clone(), value);
    }
    response
}
