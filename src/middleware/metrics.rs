use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::services::RequestMetrics;

/// Count every finished request by status class
pub async fn track_requests(
    State(metrics): State<Arc<RequestMetrics>>,
    req: Request,
    next: Next,
) -> Response {
    let response = next.run(req).await;
    metrics.record(response.status().as_u16());
    response
}
