pub mod metrics;
pub mod rate_limit;
pub mod request_id;
pub mod security;

pub use metrics::track_requests;
pub use rate_limit::{RateLimiter, rate_limit};
pub use request_id::request_id;
pub use security::{cors_layer, security_headers};
