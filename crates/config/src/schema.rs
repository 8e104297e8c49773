//! Config schema types (telegram, limits, media, i18n, metrics).

use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Video hosting domains accepted for URL submissions out of the box.
pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "vimeo.com",
    "dailymotion.com",
    "facebook.com",
    "instagram.com",
];

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelsmithConfig {
    pub telegram: TelegramConfig,
    pub limits: LimitsConfig,
    pub media: MediaConfig,
    pub i18n: I18nConfig,
    pub metrics: MetricsConfig,
}

/// Bot API credentials and endpoint.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Bot API base URL. Point this at a local Bot API server to lift the
    /// 20 MB download cap of the public endpoint.
    pub api_url: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            api_url: "https://api.telegram.org".into(),
        }
    }
}

impl TelegramConfig {
    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Admission and size ceilings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Requests admitted per identity inside one trailing window.
    pub max_requests_per_window: u32,
    /// Length of the trailing quota window in seconds.
    pub window_secs: u64,
    /// Per-file ceiling for inbound artifacts, in megabytes.
    pub max_file_size_mb: u64,
    /// Privileged identities: exempt from quota and size ceilings.
    pub admin_ids: Vec<i64>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_requests_per_window: 5,
            window_secs: 60,
            max_file_size_mb: 50,
            admin_ids: Vec::new(),
        }
    }
}

impl LimitsConfig {
    #[must_use]
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

/// External tools and the temporary artifact area.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub ffmpeg_path: PathBuf,
    pub downloader_path: PathBuf,
    pub temp_dir: PathBuf,
    /// Total encoder invocations per job, first attempt included.
    pub encode_attempts: u32,
    /// Fixed pause between encoder attempts.
    pub retry_delay_ms: u64,
    /// Wall-clock cap for a single encoder or downloader invocation.
    pub encode_timeout_secs: u64,
    pub allowed_domains: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            downloader_path: PathBuf::from("yt-dlp"),
            temp_dir: PathBuf::from("./temp"),
            encode_attempts: 3,
            retry_delay_ms: 2000,
            encode_timeout_secs: 1800,
            allowed_domains: DEFAULT_ALLOWED_DOMAINS
                .iter()
                .map(|d| (*d).to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct I18nConfig {
    /// Language used when a user has no preference and as the lookup fallback.
    pub default_language: String,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_language: "ru".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Address of the Prometheus scrape listener.
    pub listen: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: "127.0.0.1:9464".into(),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = ReelsmithConfig::default();
        assert_eq!(cfg.limits.max_requests_per_window, 5);
        assert_eq!(cfg.limits.window_secs, 60);
        assert_eq!(cfg.limits.max_file_size_bytes(), 50 * 1024 * 1024);
        assert_eq!(cfg.media.encode_attempts, 3);
        assert_eq!(cfg.media.retry_delay_ms, 2000);
        assert_eq!(cfg.media.allowed_domains.len(), 6);
        assert_eq!(cfg.i18n.default_language, "ru");
        assert!(!cfg.telegram.has_token());
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = TelegramConfig {
            token: Secret::new("123:ABC".into()),
            ..Default::default()
        };
        let rendered = format!("{cfg:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("123:ABC"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: ReelsmithConfig = toml::from_str(
            r#"
            [limits]
            max_requests_per_window = 10

            [media]
            temp_dir = "/var/tmp/reelsmith"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.limits.max_requests_per_window, 10);
        assert_eq!(cfg.limits.window_secs, 60);
        assert_eq!(cfg.media.temp_dir, PathBuf::from("/var/tmp/reelsmith"));
        assert_eq!(cfg.media.ffmpeg_path, PathBuf::from("ffmpeg"));
    }
}
