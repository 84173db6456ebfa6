use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideyLink {
    pub file_url: String,
    pub video_id: String,
    pub download_url: String,
}

/// Maps videy share links onto their CDN files
#[derive(Debug, Clone)]
pub struct Videy {
    cdn_url: String,
}

impl Videy {
    pub fn new(cdn_url: impl Into<String>) -> Self {
        Self {
            cdn_url: cdn_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Derive the mp4 URL from a `...?id=<id>` share link
    pub fn resolve(&self, url: &str) -> Result<VideyLink> {
        if !url.contains("videy.co") && !url.contains('=') {
            return Err(GatewayError::validation("URL must come from videy.co"));
        }

        let url = url.trim();
        let parsed = if url.contains("://") {
            Url::parse(url)
        } else {
            Url::parse(&format!("https://{url}"))
        }
        .map_err(|_| GatewayError::validation("Invalid URL parameter"))?;

        let video_id = parsed
            .query_pairs()
            .find_map(|(key, value)| (key == "id").then(|| value.trim().to_string()))
            .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .ok_or_else(|| GatewayError::validation("Invalid URL parameter"))?;

        let file_url = format!("{}/{video_id}.mp4", self.cdn_url);
        Ok(VideyLink {
            download_url: file_url.clone(),
            file_url,
            video_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_share_link() {
        let videy = Videy::new("https://cdn.videy.co/");
        let link = videy.resolve("https://videy.co/v?id=abc123XY").unwrap();

        assert_eq!(link.video_id, "abc123XY");
        assert_eq!(link.file_url, "https://cdn.videy.co/abc123XY.mp4");
        assert_eq!(link.download_url, link.file_url);
    }

    #[test]
    fn test_trailing_params_are_dropped() {
        let videy = Videy::new("https://cdn.videy.co");
        let link = videy.resolve("https://videy.co/v?id=abc&ref=home").unwrap();
        assert_eq!(link.video_id, "abc");
    }

    #[test]
    fn test_id_is_read_by_name() {
        let videy = Videy::new("https://cdn.videy.co");
        let link = videy.resolve("https://videy.co/v?ref=home&id=abc123").unwrap();
        assert_eq!(link.video_id, "abc123");
        assert_eq!(link.file_url, "https://cdn.videy.co/abc123.mp4");

        let link = videy.resolve("videy.co/v?id=xyz#top").unwrap();
        assert_eq!(link.video_id, "xyz");
    }

    #[test]
    fn test_rejects_links_without_id() {
        let videy = Videy::new("https://cdn.videy.co");
        assert!(videy.resolve("https://videy.co/v").is_err());
        assert!(videy.resolve("https://videy.co/v?id=").is_err());
        assert!(videy.resolve("https://example.com/watch").is_err());
        assert!(videy.resolve("https://videy.co/v?id=../../etc").is_err());
        assert!(videy.resolve("https://videy.co/v?ref=home").is_err());
    }
}
