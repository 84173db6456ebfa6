//! Wrappers around the third-party services the gateway fronts.
//!
//! Every wrapper owns an [`HttpClient`] bound to its configured base URL and
//! reports failures as [`GatewayError::Upstream`] with the upstream status and
//! message intact.

pub mod aio;
pub mod gemini;
pub mod health;
pub mod html;
pub mod http;
pub mod link_preview;
pub mod screenshot;
pub mod sora2;
pub mod threads;
pub mod videy;
pub mod waifu2x;
pub mod wainsfw;


pub use aio::{Aio, AioMedia, Platform, PlatformClients};
pub use gemini::{Gemini, GeminiReply};
pub use health::{Health, RequestMetrics};
pub use http::HttpClient;
pub use link_preview::{LinkPreview, LinkPreviews};
pub use screenshot::{Preset, Screenshot, ScreenshotOptions, Screenshots};
pub use sora2::{Sora2, Sora2Provider};
pub use threads::{Threads, ThreadsMedia};
pub use videy::{Videy, VideyLink};
pub use waifu2x::{UpscaleOptions, Upscaled, Waifu2x};
pub use wainsfw::{Wainsfw, WainsfwProvider};

use crate::config::AppConfig;
use crate::error::{GatewayError, Result};
use crate::jobs::{JobPoller, PollOptions};

/// All upstream wrappers, built once at start-up
pub struct Services {
    pub sora2: Sora2,
    pub wainsfw: Wainsfw,
    pub waifu2x: Waifu2x,
    pub gemini: Gemini,
    pub threads: Threads,
    pub aio: Aio,
    pub videy: Videy,
    pub screenshots: Screenshots,
    pub previews: LinkPreviews,
    pub health: Health,
}

impl Services {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let upstream = &config.upstream;
        let client = http::build_client(upstream)?;
        let bind = |service: &'static str, base_url: &str| {
            HttpClient::new(service, client.clone(), base_url)
        };

        let video_poller = JobPoller::new(PollOptions::from_config(
            &config.poller,
            config.poller.video_max_attempts,
        ));
        let image_poller = JobPoller::new(PollOptions::from_config(
            &config.poller,
            config.poller.image_max_attempts,
        ));

        let threads = Threads::new(bind("threads", &upstream.snapthreads_base_url));

        Ok(Self {
            sora2: Sora2::new(
                Sora2Provider::new(bind("sora2", &upstream.sora2_base_url)),
                video_poller,
            ),
            wainsfw: Wainsfw::new(
                WainsfwProvider::new(bind("wainsfw", &upstream.wainsfw_base_url)),
                image_poller,
            ),
            waifu2x: Waifu2x::new(
                bind("waifu2x", &upstream.waifu2x_base_url),
                bind("image-source", "").with_max_body_bytes(upstream.max_download_bytes),
            ),
            gemini: Gemini::new(
                bind("gemini", &upstream.gemini_base_url),
                upstream.gemini_model.clone(),
                upstream.gemini_api_key.clone(),
            ),
            aio: Aio::new(
                PlatformClients {
                    instagram: bind("instagram", &upstream.instagram_api_url),
                    tiktok: bind("tiktok", &upstream.tiktok_api_url),
                    twitter: bind("twitter", &upstream.twitter_api_url),
                    youtube: bind("youtube", &upstream.youtube_api_url),
                    facebook: bind("facebook", &upstream.facebook_api_url),
                },
                threads.clone(),
            ),
            threads,
            videy: Videy::new(upstream.videy_cdn_url.clone()),
            screenshots: Screenshots::new(
                bind("screenshot", &upstream.imagy_base_url),
                bind("screenshot-file", "").with_max_body_bytes(upstream.max_download_bytes),
            ),
            previews: LinkPreviews::new(
                bind("preview", "").with_max_body_bytes(upstream.max_download_bytes),
            )
                .map_err(|e| GatewayError::Internal(e.to_string()))?,
            health: Health::new(),
        })
    }
}
