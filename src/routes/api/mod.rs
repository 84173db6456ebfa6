use axum::Router;

use crate::Ctx;

pub mod ai;
pub mod downloader;
pub mod health;
pub mod info;
pub mod tools;

/// Mount all API routes
pub fn mount() -> Router<Ctx> {
    Router::new()
        .merge(health::mount())
        .merge(info::mount())
        .merge(ai::mount())
        .merge(downloader::mount())
        .merge(tools::mount())
}
