use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::GatewayError;

/// JSON body that is deserialized and then validated
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| GatewayError::validation(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string that is deserialized and then validated
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| GatewayError::validation(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Require an absolute http(s) URL
pub fn http_url(value: &str) -> Result<(), validator::ValidationError> {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(validator::ValidationError::new("url")
            .with_message("URL must start with http:// or https://".into()))
    }
}

/// Character count after trimming surrounding whitespace must reach `min`
fn trimmed_len_at_least(value: &str, min: usize) -> Result<(), validator::ValidationError> {
    if value.trim().chars().count() >= min {
        return Ok(());
    }
    let mut err = validator::ValidationError::new("length");
    err.add_param("min".into(), &min);
    Err(err)
}

/// Require at least one non-whitespace character
pub fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    trimmed_len_at_least(value, 1)
}

pub fn trimmed_min_5(value: &str) -> Result<(), validator::ValidationError> {
    trimmed_len_at_least(value, 5)
}

pub fn trimmed_min_10(value: &str) -> Result<(), validator::ValidationError> {
    trimmed_len_at_least(value, 10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Prompt {
        #[validate(custom(function = "trimmed_min_5", message = "Prompt must be at least 5 characters"))]
        prompt: String,
        #[validate(custom(function = "http_url"))]
        image: Option<String>,
    }

    fn json_request(body: &str) -> Request {
        http::Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let ValidatedJson(prompt) = ValidatedJson::<Prompt>::from_request(
            json_request(r#"{"prompt":"a cat in space","image":"https://x/a.png"}"#),
            &(),
        )
        .await
        .unwrap();
        assert_eq!(prompt.prompt, "a cat in space");
    }

    #[tokio::test]
    async fn test_short_prompt_is_rejected_with_field_details() {
        let err = ValidatedJson::<Prompt>::from_request(json_request(r#"{"prompt":"cat"}"#), &())
            .await
            .unwrap_err();

        match err {
            GatewayError::Validation { details, .. } => {
                assert_eq!(
                    details["prompt"][0]["message"],
                    "Prompt must be at least 5 characters"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_validation_error() {
        let err = ValidatedJson::<Prompt>::from_request(json_request("{not json"), &())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_query_validation() {
        let (mut parts, ()) = http::Request::builder()
            .uri("/x?prompt=hello%20world&image=ftp://nope")
            .body(())
            .unwrap()
            .into_parts();

        let err = ValidatedQuery::<Prompt>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        match err {
            GatewayError::Validation { details, .. } => assert!(details.get("image").is_some()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_http_url() {
        assert!(http_url("https://example.com").is_ok());
        assert!(http_url("http://example.com/a?b=c").is_ok());
        assert!(http_url("example.com").is_err());
        assert!(http_url("javascript:alert(1)").is_err());
    }

    #[tokio::test]
    async fn test_whitespace_padding_does_not_count() {
        let err = ValidatedJson::<Prompt>::from_request(json_request(r#"{"prompt":"   cat    "}"#), &())
            .await
            .unwrap_err();
        match err {
            GatewayError::Validation { details, .. } => {
                assert_eq!(details["prompt"][0]["code"], "length");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_trimmed_lengths() {
        assert!(not_blank(" x ").is_ok());
        assert!(not_blank("").is_err());
        assert!(not_blank(" \t\n ").is_err());
        assert!(trimmed_min_5("  héllo ").is_ok());
        assert!(trimmed_min_5("     ").is_err());
        assert!(trimmed_min_10("          ").is_err());
        assert!(trimmed_min_10("  a red fox runs  ").is_ok());
    }
}
