use axum::{
    extract::State,
    http::Uri,
    response::{IntoResponse, Redirect},
};

use crate::{Ctx, error::GatewayError};

pub mod api;

#[cfg(test)]
mod tests;

/// `/` points at the service description
pub async fn root(State(ctx): State<Ctx>) -> Redirect {
    Redirect::temporary(&format!("{}/info", ctx.config.server.api_prefix))
}

/// Envelope for unmatched routes
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    GatewayError::NotFound(format!("Route {} not found", uri.path()))
}
