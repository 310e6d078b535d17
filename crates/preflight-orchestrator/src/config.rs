//! Orchestrator configuration.
//!
//! Loaded from an optional `preflight.toml` and `PREFLIGHT__*` environment
//! variables, e.g. `PREFLIGHT__VIDEO_WEBHOOK_URL` or
//! `PREFLIGHT__INDUSTRY_BENCHMARKS__GAMES=18`.

use std::collections::HashMap;
use std::time::Duration;

use preflight_media::SceneCutConfig;
use preflight_models::{CampaignContext, ReviewFlagPolicy};
use preflight_review::ReviewClientConfig;
use preflight_scoring::BenchmarkTable;
use serde::{Deserialize, Serialize};

/// Default config file name, without extension.
pub const DEFAULT_CONFIG_FILE: &str = "preflight";

/// How policy reviews are requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewMode {
    /// One trigger raced against the soft timeout, completed by callback
    #[default]
    Hybrid,
    /// Blocking video and landing page reviews, run concurrently
    Direct,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreflightConfig {
    /// Video review workflow; also the hybrid trigger when a video is supplied
    #[serde(default)]
    pub video_webhook_url: Option<String>,
    /// Landing page review workflow
    #[serde(default)]
    pub landing_page_webhook_url: Option<String>,
    /// Public callback URL; derived from the request when unset
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default = "default_soft_timeout_secs")]
    pub soft_timeout_secs: f64,
    #[serde(default)]
    pub review_mode: ReviewMode,
    #[serde(default)]
    pub review_flag_policy: ReviewFlagPolicy,
    #[serde(default = "default_direct_check_timeout_secs")]
    pub direct_check_timeout_secs: u64,
    #[serde(default = "default_trigger_timeout_secs")]
    pub trigger_timeout_secs: u64,
    /// Average CPA overrides keyed by industry
    #[serde(default)]
    pub industry_benchmarks: HashMap<String, f64>,
    #[serde(default)]
    pub scene_cut: SceneCutConfig,
}

fn default_soft_timeout_secs() -> f64 {
    50.0
}
fn default_direct_check_timeout_secs() -> u64 {
    60
}
fn default_trigger_timeout_secs() -> u64 {
    300
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            video_webhook_url: None,
            landing_page_webhook_url: None,
            callback_url: None,
            soft_timeout_secs: default_soft_timeout_secs(),
            review_mode: ReviewMode::default(),
            review_flag_policy: ReviewFlagPolicy::default(),
            direct_check_timeout_secs: default_direct_check_timeout_secs(),
            trigger_timeout_secs: default_trigger_timeout_secs(),
            industry_benchmarks: HashMap::new(),
            scene_cut: SceneCutConfig::default(),
        }
    }
}

impl PreflightConfig {
    /// Load from `preflight.toml` (if present) and the environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from the given config file (if present) and the environment.
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("PREFLIGHT")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    pub fn video_endpoint(&self) -> Option<&str> {
        non_empty(self.video_webhook_url.as_deref())
    }

    pub fn landing_page_endpoint(&self) -> Option<&str> {
        non_empty(self.landing_page_webhook_url.as_deref())
    }

    /// Workflow a hybrid trigger goes to: the video review when a video is
    /// supplied, otherwise the landing page review.
    pub fn trigger_endpoint(&self, context: &CampaignContext) -> Option<&str> {
        if context.has_video() {
            self.video_endpoint()
        } else {
            self.landing_page_endpoint()
        }
    }

    /// Configured callback URL, or `derived` when none is set.
    pub fn callback_url_or(&self, derived: impl Into<String>) -> String {
        match non_empty(self.callback_url.as_deref()) {
            Some(url) => url.to_string(),
            None => derived.into(),
        }
    }

    /// Soft timeout; falls back to the default when the value is unusable.
    pub fn soft_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.soft_timeout_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_soft_timeout_secs()))
    }

    pub fn review_client_config(&self) -> ReviewClientConfig {
        ReviewClientConfig {
            timeout: Duration::from_secs(self.direct_check_timeout_secs),
            trigger_timeout: Duration::from_secs(self.trigger_timeout_secs),
            ..ReviewClientConfig::default()
        }
    }

    pub fn benchmark_table(&self) -> BenchmarkTable {
        BenchmarkTable::with_overrides(self.industry_benchmarks.iter().map(|(k, v)| (k, *v)))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "PREFLIGHT__VIDEO_WEBHOOK_URL",
        "PREFLIGHT__SOFT_TIMEOUT_SECS",
        "PREFLIGHT__REVIEW_MODE",
        "PREFLIGHT__REVIEW_FLAG_POLICY",
        "PREFLIGHT__INDUSTRY_BENCHMARKS__GAMES",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let config = PreflightConfig::default();
        assert_eq!(config.soft_timeout(), Duration::from_secs(50));
        assert_eq!(config.review_mode, ReviewMode::Hybrid);
        assert_eq!(config.review_flag_policy, ReviewFlagPolicy::SafeButDowngraded);
        assert!(config.video_endpoint().is_none());
        assert_eq!(config.review_client_config().trigger_timeout, Duration::from_secs(300));
    }

    #[test]
    #[serial]
    fn test_load_from_env() {
        clear_env();
        std::env::set_var("PREFLIGHT__VIDEO_WEBHOOK_URL", "https://flows.example/webhook/video");
        std::env::set_var("PREFLIGHT__SOFT_TIMEOUT_SECS", "2.5");
        std::env::set_var("PREFLIGHT__REVIEW_MODE", "direct");
        std::env::set_var("PREFLIGHT__REVIEW_FLAG_POLICY", "treat_as_unsafe");

        let config = PreflightConfig::load_from("does-not-exist").unwrap();
        clear_env();

        assert_eq!(config.video_endpoint(), Some("https://flows.example/webhook/video"));
        assert_eq!(config.soft_timeout(), Duration::from_millis(2500));
        assert_eq!(config.review_mode, ReviewMode::Direct);
        assert_eq!(config.review_flag_policy, ReviewFlagPolicy::TreatAsUnsafe);
        assert_eq!(config.direct_check_timeout_secs, 60);
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preflight.toml");
        std::fs::write(
            &path,
            r#"
landing_page_webhook_url = "https://flows.example/webhook/lp"
soft_timeout_secs = 10

[industry_benchmarks]
games = 30.0

[scene_cut]
max_samples = 20
"#,
        )
        .unwrap();

        let config = PreflightConfig::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.landing_page_endpoint(), Some("https://flows.example/webhook/lp"));
        assert_eq!(config.soft_timeout(), Duration::from_secs(10));
        assert_eq!(config.scene_cut.max_samples, 20);
        assert_eq!(config.scene_cut.resolution, 64);
        assert_eq!(config.benchmark_table().average_cpa("Games"), 30.0);
    }

    #[test]
    fn test_trigger_endpoint_selection() {
        let config = PreflightConfig {
            video_webhook_url: Some("https://flows/video".into()),
            landing_page_webhook_url: Some("  ".into()),
            ..PreflightConfig::default()
        };
        let with_video = CampaignContext::new("apps", 10.0, 100.0, "US").with_video("https://cdn/a.mp4");
        assert_eq!(config.trigger_endpoint(&with_video), Some("https://flows/video"));

        let without_video = CampaignContext::new("apps", 10.0, 100.0, "US");
        assert_eq!(config.trigger_endpoint(&without_video), None);
    }

    #[test]
    fn test_callback_url_precedence() {
        let mut config = PreflightConfig::default();
        assert_eq!(config.callback_url_or("http://derived/cb"), "http://derived/cb");
        config.callback_url = Some("https://public/cb".into());
        assert_eq!(config.callback_url_or("http://derived/cb"), "https://public/cb");
    }

    #[test]
    fn test_invalid_soft_timeout_falls_back() {
        let config = PreflightConfig {
            soft_timeout_secs: -1.0,
            ..PreflightConfig::default()
        };
        assert_eq!(config.soft_timeout(), Duration::from_secs(50));
    }
}
