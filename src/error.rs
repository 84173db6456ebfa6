use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{error, warn};

use crate::jobs::JobError;
use crate::response::ApiResponse;

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors surfaced to HTTP clients
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("Job submission failed: {0}")]
    Submission(String),

    #[error("Job did not complete after {attempts} polls")]
    PollTimeout { attempts: u32 },

    #[error("Malformed job result: {0}")]
    ResultParse(String),

    #[error("{service} request failed: {message}")]
    Upstream {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("Too many requests, try again later")]
    RateLimited { retry_after: Duration },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Validation failure without per-field details
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: Value::Null,
        }
    }

    /// Upstream failure with no HTTP status (transport, decoding)
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            status: None,
            message: message.into(),
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Submission(_) | Self::ResultParse(_) | Self::Upstream { .. } => {
                StatusCode::BAD_GATEWAY
            }
            Self::PollTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Value {
        match self {
            Self::Validation { details, .. } => details.clone(),
            Self::Upstream {
                service,
                status,
                message,
            } => json!({
                "service": service,
                "upstreamStatus": status,
                "upstreamMessage": message,
            }),
            Self::PollTimeout { attempts } => json!({ "attempts": attempts }),
            Self::RateLimited { retry_after } => json!({ "retryAfter": retry_after.as_secs() }),
            _ => Value::Null,
        }
    }
}

/// Human readable label for an error status
pub fn error_type(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "Validation Error",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown Error",
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = ?self, "Server error: {message}");
        } else {
            warn!(status = status.as_u16(), "Client error: {message}");
        }

        let mut details = self.details();
        if crate::response::debug_errors() {
            let mut map = match details {
                Value::Object(map) => map,
                Value::Null => Map::new(),
                other => Map::from_iter([("info".to_string(), other)]),
            };
            map.insert("debug".to_string(), json!(format!("{self:?}")));
            details = Value::Object(map);
        }

        let retry_after = match &self {
            Self::RateLimited { retry_after } => Some(retry_after.as_secs()),
            _ => None,
        };

        let mut response = ApiResponse::<()>::error(status, message, details).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<JobError> for GatewayError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Submission(message) => Self::Submission(message),
            JobError::PollTimeout { attempts } => Self::PollTimeout { attempts },
            JobError::ResultParse(message) => Self::ResultParse(message),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream {
            service: "upstream",
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for GatewayError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details = Map::new();
        for (field, errs) in errors.field_errors() {
            let entries: Vec<Value> = errs
                .iter()
                .map(|e| {
                    json!({
                        "message": e
                            .message
                            .as_ref()
                            .map_or_else(|| e.code.to_string(), ToString::to_string),
                        "code": e.code,
                        "value": e.params.get("value"),
                    })
                })
                .collect();
            details.insert(field.to_string(), Value::Array(entries));
        }

        Self::Validation {
            message: "Validation failed".to_string(),
            details: Value::Object(details),
        }
    }
}
