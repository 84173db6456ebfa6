use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};
use crate::services::http::{Fetched, HttpClient};

pub const MIN_DIMENSION: u32 = 100;
pub const MAX_DIMENSION: u32 = 4096;
pub const MAX_URL_LEN: usize = 2000;

const REFERER: &str = "https://imagy.app/full-page-screenshot-taker/";

/// Fixed viewport presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Desktop,
    Mobile,
}

impl Preset {
    pub const fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Desktop => (1280, 720),
            Self::Mobile => (720, 1280),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotOptions {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub full_page: bool,
}

impl ScreenshotOptions {
    pub fn preset(url: impl Into<String>, preset: Preset) -> Self {
        let (width, height) = preset.dimensions();
        Self {
            url: url.into(),
            width,
            height,
            full_page: false,
        }
    }

    fn check(&self) -> Result<()> {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(GatewayError::validation("URL must start with http:// or https://"));
        }
        if self.url.len() > MAX_URL_LEN {
            return Err(GatewayError::validation("URL is too long"));
        }
        for (name, value) in [("Width", self.width), ("Height", self.height)] {
            if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
                return Err(GatewayError::validation(format!(
                    "{name} must be between {MIN_DIMENSION} and {MAX_DIMENSION} pixels"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CaptureRequest<'a> {
    url: &'a str,
    browser_width: u32,
    browser_height: u32,
    full_page: bool,
    device_scale_factor: u32,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptureResponse {
    file_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screenshot {
    pub url: String,
    pub metadata: ScreenshotMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotMetadata {
    pub original_url: String,
    pub dimensions: Dimensions,
    pub full_page: bool,
    pub format: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Website screenshots through imagy
pub struct Screenshots {
    api: HttpClient,
    files: HttpClient,
}

impl Screenshots {
    /// `files` downloads the rendered image for the byte-proxy routes
    pub const fn new(api: HttpClient, files: HttpClient) -> Self {
        Self { api, files }
    }

    pub async fn capture(&self, options: &ScreenshotOptions) -> Result<Screenshot> {
        options.check()?;

        let body = CaptureRequest {
            url: &options.url,
            browser_width: options.width,
            browser_height: options.height,
            full_page: options.full_page,
            device_scale_factor: 1,
            format: "png",
        };
        let response: CaptureResponse = self
            .api
            .post_json("/screenshot/createscreenshot", &body, &[("Referer", REFERER)])
            .await?;

        let url = response
            .file_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| GatewayError::upstream("screenshot", "No screenshot URL in response"))?;

        Ok(Screenshot {
            url,
            metadata: ScreenshotMetadata {
                original_url: options.url.clone(),
                dimensions: Dimensions {
                    width: options.width,
                    height: options.height,
                },
                full_page: options.full_page,
                format: "png".to_string(),
            },
        })
    }

    /// Capture and download the PNG
    pub async fn capture_png(&self, url: &str, preset: Preset) -> Result<Fetched> {
        let shot = self.capture(&ScreenshotOptions::preset(url, preset)).await?;
        self.files.get_bytes(&shot.url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_checks() {
        let ok = ScreenshotOptions::preset("https://example.com", Preset::Mobile);
        assert_eq!((ok.width, ok.height), (720, 1280));
        assert!(ok.check().is_ok());

        let too_small = ScreenshotOptions { width: 99, ..ok.clone() };
        assert!(too_small.check().is_err());

        let too_big = ScreenshotOptions { height: 4097, ..ok.clone() };
        assert!(too_big.check().is_err());

        let bad_scheme = ScreenshotOptions {
            url: "ftp://example.com".to_string(),
            ..ok.clone()
        };
        assert!(bad_scheme.check().is_err());

        let long = ScreenshotOptions {
            url: format!("https://example.com/{}", "a".repeat(MAX_URL_LEN)),
            ..ok
        };
        assert!(long.check().is_err());
    }
}
