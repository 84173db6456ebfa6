use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::{GatewayError, Result};
use crate::services::{http::HttpClient, threads::Threads};

static INSTAGRAM_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?instagram\.com/(?:p|reel|tv|stories)/[\w-]+/?")
        .expect("Invalid instagram url regex")
});

/// Supported source platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Tiktok,
    Twitter,
    Youtube,
    Facebook,
    Threads,
}

impl Platform {
    pub const ALL: [Self; 6] = [
        Self::Instagram,
        Self::Tiktok,
        Self::Twitter,
        Self::Youtube,
        Self::Facebook,
        Self::Threads,
    ];

    /// Guess the platform from a URL's host
    pub fn detect(url: &str) -> Option<Self> {
        let url = url.trim();
        let parsed = if url.contains("://") {
            reqwest::Url::parse(url)
        } else {
            reqwest::Url::parse(&format!("https://{url}"))
        };
        let host = parsed.ok()?.host_str()?.to_lowercase();
        let has = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));

        if has("instagram.com") {
            Some(Self::Instagram)
        } else if has("tiktok.com") {
            Some(Self::Tiktok)
        } else if has("twitter.com") || has("x.com") {
            Some(Self::Twitter)
        } else if has("youtube.com") || has("youtu.be") {
            Some(Self::Youtube)
        } else if has("facebook.com") || has("fb.gg") {
            Some(Self::Facebook)
        } else if has("threads.net") || has("threads.com") {
            Some(Self::Threads)
        } else {
            None
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::Tiktok => "tiktok",
            Self::Twitter => "twitter",
            Self::Youtube => "youtube",
            Self::Facebook => "facebook",
            Self::Threads => "threads",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

/// Union of the fields the per-platform APIs answer with
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlatformResponse {
    url: Option<String>,
    video_url: Option<String>,
    #[serde(rename = "type")]
    media_type: Option<String>,
    thumbnail: Option<String>,
    thumb: Option<String>,
    title: Option<String>,
    duration: Option<Value>,
    music: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AioMedia {
    pub platform: Platform,
    pub download_url: String,
    #[serde(rename = "type")]
    pub media_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music: Option<String>,
}

/// Per-platform lookup endpoints
pub struct PlatformClients {
    pub instagram: HttpClient,
    pub tiktok: HttpClient,
    pub twitter: HttpClient,
    pub youtube: HttpClient,
    pub facebook: HttpClient,
}

/// Multi-platform downloader
pub struct Aio {
    clients: PlatformClients,
    threads: Threads,
}

impl Aio {
    pub const fn new(clients: PlatformClients, threads: Threads) -> Self {
        Self { clients, threads }
    }

    /// Resolve the platform from an explicit name, falling back to detection
    pub fn resolve_platform(url: &str, requested: Option<&str>) -> Result<Platform> {
        requested
            .and_then(|name| name.parse().ok())
            .or_else(|| Platform::detect(url))
            .ok_or_else(|| {
                GatewayError::validation(
                    "Unrecognized platform. Use instagram, tiktok, twitter, youtube, facebook or threads",
                )
            })
    }

    pub async fn download(&self, url: &str, requested: Option<&str>) -> Result<AioMedia> {
        let platform = Self::resolve_platform(url, requested)?;

        if platform == Platform::Threads {
            let media = self.threads.download(url).await?;
            return Ok(AioMedia {
                platform,
                download_url: media.download_url,
                media_type: media.media_type,
                thumbnail: None,
                title: media.metadata.caption,
                duration: None,
                music: None,
            });
        }

        if platform == Platform::Instagram && !INSTAGRAM_URL.is_match(url) {
            return Err(GatewayError::validation("Invalid Instagram URL"));
        }

        let client = match platform {
            Platform::Instagram => &self.clients.instagram,
            Platform::Tiktok => &self.clients.tiktok,
            Platform::Twitter => &self.clients.twitter,
            Platform::Youtube => &self.clients.youtube,
            Platform::Facebook | Platform::Threads => &self.clients.facebook,
        };
        let response: PlatformResponse = client.get("", &[("url", url)]).await?;

        into_media(platform, response)
            .ok_or_else(|| GatewayError::upstream(client.service(), format!("No media found on {platform}")))
    }
}

fn into_media(platform: Platform, response: PlatformResponse) -> Option<AioMedia> {
    let PlatformResponse {
        url,
        video_url,
        media_type,
        thumbnail,
        thumb,
        title,
        duration,
        music,
    } = response;

    let (download_url, media_type, thumbnail, title, duration, music) = match platform {
        Platform::Instagram => (url, media_type.unwrap_or_else(|| "post".into()), thumbnail, None, None, None),
        Platform::Tiktok => (video_url, "video".into(), thumbnail, None, None, music),
        Platform::Twitter => (url, media_type.unwrap_or_else(|| "image".into()), thumbnail, None, None, None),
        Platform::Youtube => (url, "video".into(), thumb, title, duration, None),
        Platform::Facebook => (video_url, "video".into(), thumbnail, title, None, None),
        Platform::Threads => return None,
    };

    Some(AioMedia {
        platform,
        download_url: download_url.filter(|u| !u.is_empty())?,
        media_type,
        thumbnail,
        title,
        duration,
        music,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_platform() {
        assert_eq!(Platform::detect("https://www.instagram.com/p/abc/"), Some(Platform::Instagram));
        assert_eq!(Platform::detect("https://vm.TikTok.com/xyz"), Some(Platform::Tiktok));
        assert_eq!(Platform::detect("https://x.com/a/status/1"), Some(Platform::Twitter));
        assert_eq!(Platform::detect("https://youtu.be/dQw4w9WgXcQ"), Some(Platform::Youtube));
        assert_eq!(Platform::detect("https://fb.gg/v/1"), Some(Platform::Facebook));
        assert_eq!(Platform::detect("https://www.threads.net/@a/post/1"), Some(Platform::Threads));
        assert_eq!(Platform::detect("instagram.com/reel/xyz"), Some(Platform::Instagram));
        assert_eq!(Platform::detect("https://example.org/video"), None);
        assert_eq!(Platform::detect("https://netflix.com/title/1"), None);
    }

    #[test]
    fn test_explicit_platform_wins_and_unknown_falls_back() {
        assert_eq!(
            Aio::resolve_platform("https://example.org/v", Some("YouTube")).unwrap(),
            Platform::Youtube
        );
        assert_eq!(
            Aio::resolve_platform("https://tiktok.com/@a/video/1", Some("auto")).unwrap(),
            Platform::Tiktok
        );
        assert!(Aio::resolve_platform("https://example.org/v", None).is_err());
    }

    #[test]
    fn test_platform_field_mapping() {
        let response = PlatformResponse {
            video_url: Some("https://cdn/t.mp4".into()),
            url: Some("https://ignored".into()),
            music: Some("https://cdn/t.mp3".into()),
            ..Default::default()
        };
        let media = into_media(Platform::Tiktok, response).unwrap();
        assert_eq!(media.download_url, "https://cdn/t.mp4");
        assert_eq!(media.media_type, "video");
        assert_eq!(media.music.as_deref(), Some("https://cdn/t.mp3"));

        let response = PlatformResponse {
            url: Some("https://cdn/y.mp4".into()),
            thumb: Some("https://cdn/y.jpg".into()),
            title: Some("Clip".into()),
            ..Default::default()
        };
        let media = into_media(Platform::Youtube, response).unwrap();
        assert_eq!(media.thumbnail.as_deref(), Some("https://cdn/y.jpg"));
        assert_eq!(media.title.as_deref(), Some("Clip"));

        assert!(into_media(Platform::Facebook, PlatformResponse::default()).is_none());
    }
}
