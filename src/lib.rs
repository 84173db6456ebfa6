//! HTTP gateway in front of media downloaders, AI generation services and
//! web tools, with a uniform JSON envelope, rate limiting and response caching.

pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod services;
pub mod validate;

pub use app::{Ctx, build_router};
pub use error::GatewayError;
pub use response::{ApiResponse, ApiResult};
