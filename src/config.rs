use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that points at an explicit config file
pub const CONFIG_PATH_ENV: &str = "SAWIT_CONFIG";

/// Prefix for environment overrides, e.g. `SAWIT_SERVER__PORT=8080`
const ENV_PREFIX: &str = "SAWIT";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
    pub cache: CacheSettings,
    pub poller: PollerConfig,
    pub upstream: UpstreamConfig,
}

impl AppConfig {
    /// Load configuration from defaults, an optional TOML file and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .map(PathBuf::from)
            .or_else(default_config_path);

        Self::load_from(path.as_deref())
    }

    /// Load configuration using a specific file (if it exists)
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.server.api_prefix.is_empty() && !self.server.api_prefix.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "server.api_prefix must start with '/': {}",
                self.server.api_prefix
            )));
        }
        if self.rate_limit.enabled && (self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0) {
            return Err(ConfigError::Invalid(
                "rate_limit.max_requests and rate_limit.window_secs must be positive".to_string(),
            ));
        }
        if self.poller.interval_ms == 0 {
            return Err(ConfigError::Invalid("poller.interval_ms must be positive".to_string()));
        }
        if self.poller.per_poll_timeout_ms == 0 || self.poller.submit_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "poller.per_poll_timeout_ms and poller.submit_timeout_ms must be positive".to_string(),
            ));
        }
        if self.poller.video_max_attempts == 0 || self.poller.image_max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "poller attempt budgets must be positive".to_string(),
            ));
        }
        if self.upstream.max_download_bytes == 0 {
            return Err(ConfigError::Invalid(
                "upstream.max_download_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.environment == Environment::Production
    }
}

/// Look for `./sawit.toml`, then the user config directory
fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from("sawit.toml");
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("sawit").join("config.toml"))
        .filter(|path| path.exists())
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prefix all API routes are mounted under
    pub api_prefix: String,
    pub name: String,
    pub version: String,
    pub environment: Environment,
    /// Maximum accepted request body size
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            api_prefix: "/api/v1".to_string(),
            name: "Sawit Gateway".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub window_secs: u64,
    pub max_requests: u32,
    /// Use the first `X-Forwarded-For` entry as the client key
    pub trust_proxy: bool,
    /// Upper bound on concurrently tracked client windows
    pub max_tracked_clients: u64,
}

impl RateLimitConfig {
    pub const fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 15 * 60,
            max_requests: 100,
            trust_proxy: true,
            max_tracked_clients: 100_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    /// `*` or a comma separated list of origins
    pub origins: String,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            origins: "*".to_string(),
            max_age_secs: 86_400,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub headers: bool,
    pub compression: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            headers: true,
            compression: true,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, `RUST_LOG` takes precedence
    pub level: Option<String>,
    /// Defaults to json in production, pretty otherwise
    pub format: Option<LogFormat>,
    /// Directory for a daily rolling log file
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub max_entries: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 300,
            max_entries: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    pub interval_ms: u64,
    pub per_poll_timeout_ms: u64,
    pub submit_timeout_ms: u64,
    pub video_max_attempts: u32,
    pub image_max_attempts: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            per_poll_timeout_ms: 10_000,
            submit_timeout_ms: 60_000,
            video_max_attempts: 120,
            image_max_attempts: 60,
        }
    }
}

/// Base URLs and client settings for wrapped services
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Cap on image and page bodies fetched from caller-supplied URLs
    pub max_download_bytes: usize,
    pub sora2_base_url: String,
    pub wainsfw_base_url: String,
    pub waifu2x_base_url: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    /// Used when a caller does not pass `apikey`
    pub gemini_api_key: Option<String>,
    pub snapthreads_base_url: String,
    pub imagy_base_url: String,
    pub videy_cdn_url: String,
    pub instagram_api_url: String,
    pub tiktok_api_url: String,
    pub twitter_api_url: String,
    pub youtube_api_url: String,
    pub facebook_api_url: String,
}

impl UpstreamConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Every configured upstream URL, keyed by service
    pub fn base_urls(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("sora2", self.sora2_base_url.as_str()),
            ("wainsfw", self.wainsfw_base_url.as_str()),
            ("waifu2x", self.waifu2x_base_url.as_str()),
            ("gemini", self.gemini_base_url.as_str()),
            ("snapthreads", self.snapthreads_base_url.as_str()),
            ("imagy", self.imagy_base_url.as_str()),
            ("videy", self.videy_cdn_url.as_str()),
            ("instagram", self.instagram_api_url.as_str()),
            ("tiktok", self.tiktok_api_url.as_str()),
            ("twitter", self.twitter_api_url.as_str()),
            ("youtube", self.youtube_api_url.as_str()),
            ("facebook", self.facebook_api_url.as_str()),
        ]
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.0.0 Mobile Safari/537.36".to_string(),
            timeout_secs: 30,
            max_download_bytes: 10 * 1024 * 1024,
            sora2_base_url: "https://api.bylo.ai/aimodels/api/v1/ai".to_string(),
            wainsfw_base_url: "https://nech-c-wainsfwillustrious-v140.hf.space".to_string(),
            waifu2x_base_url: "https://www.waifu2x.net".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            gemini_model: "gemini-2.5-flash-lite".to_string(),
            gemini_api_key: None,
            snapthreads_base_url: "https://snapthreads.net".to_string(),
            imagy_base_url: "https://gcp.imagy.app".to_string(),
            videy_cdn_url: "https://cdn.videy.co".to_string(),
            instagram_api_url: "https://api.downr.ccinstagram.com/api".to_string(),
            tiktok_api_url: "https://api.tikmate.app/api/quote".to_string(),
            twitter_api_url: "https://api.xvideotools.com/twitter/download".to_string(),
            youtube_api_url: "https://api.youtubemultidownloader.com/download".to_string(),
            facebook_api_url: "https://api.fbdownloader.me/api".to_string(),
        }
    }
}
