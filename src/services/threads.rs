use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

use crate::error::{GatewayError, Result};
use crate::services::http::HttpClient;

static THREADS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?threads\.(?:net|com)/[\w/@.-]+").expect("Invalid threads url regex")
});

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapthreadsResponse {
    direct_link: Option<String>,
    url: Option<String>,
    download_url: Option<String>,
    #[serde(rename = "type")]
    media_type: Option<String>,
    caption: Option<String>,
    username: Option<String>,
    like_count: Option<Value>,
    reply_count: Option<Value>,
    success: Option<bool>,
    message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadsMedia {
    pub download_url: String,
    pub original_url: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub metadata: ThreadsMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadsMetadata {
    pub caption: Option<String>,
    pub username: Option<String>,
    pub like_count: Option<Value>,
    pub reply_count: Option<Value>,
}

/// Normalize a Threads post URL, rejecting anything else
pub fn normalize_url(url: &str) -> Result<String> {
    let url = url.trim();
    if !THREADS_URL.is_match(url) {
        return Err(GatewayError::validation("URL must point to threads.net"));
    }
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(url.to_string())
    } else {
        Ok(format!("https://{url}"))
    }
}

/// Media lookup through snapthreads
#[derive(Clone)]
pub struct Threads {
    client: HttpClient,
}

impl Threads {
    pub const fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub async fn download(&self, url: &str) -> Result<ThreadsMedia> {
        let original_url = normalize_url(url)?;
        let referer = format!("{}/id", self.client.base_url());

        let response: SnapthreadsResponse = self
            .client
            .get_with_headers(
                "/api/download",
                &[("url", original_url.as_str())],
                &[("Referer", referer.as_str()), ("X-Requested-With", "XMLHttpRequest")],
            )
            .await?;

        let download_url = [response.direct_link, response.url, response.download_url]
            .into_iter()
            .flatten()
            .find(|link| !link.is_empty());

        match download_url {
            Some(download_url) => Ok(ThreadsMedia {
                download_url,
                original_url,
                media_type: response.media_type.unwrap_or_else(|| "unknown".to_string()),
                metadata: ThreadsMetadata {
                    caption: response.caption,
                    username: response.username,
                    like_count: response.like_count,
                    reply_count: response.reply_count,
                },
            }),
            None if response.success == Some(false) => Err(GatewayError::upstream(
                "threads",
                response
                    .message
                    .unwrap_or_else(|| "Failed to fetch download link".to_string()),
            )),
            None => Err(GatewayError::upstream("threads", "Unrecognized response format")),
        }
    }
}
