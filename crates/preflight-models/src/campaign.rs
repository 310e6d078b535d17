//! Campaign context submitted with every analysis.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for campaign validation.
pub type CampaignResult<T> = Result<T, CampaignError>;

/// Reasons a campaign context is rejected before any record is written.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CampaignError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("{field} must be a positive number")]
    NotPositive { field: &'static str },

    #[error("Invalid {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },
}

/// Campaign parameters the analysis is evaluated against.
///
/// Immutable once an analysis record has been created from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignContext {
    /// Industry key into the benchmark table
    #[serde(alias = "industry_id")]
    pub industry: String,
    /// Target cost per acquisition (USD)
    pub target_cpa: f64,
    /// Campaign budget (USD)
    pub budget: f64,
    /// Target country
    #[serde(default)]
    pub country: String,
    /// Landing page to review, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landing_page_url: Option<String>,
    /// Creative video to review, if any
    #[serde(default, alias = "video_url_input", skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl CampaignContext {
    /// Create a context without optional URLs.
    pub fn new(industry: impl Into<String>, target_cpa: f64, budget: f64, country: impl Into<String>) -> Self {
        Self {
            industry: industry.into(),
            target_cpa,
            budget,
            country: country.into(),
            landing_page_url: None,
            video_url: None,
        }
    }

    pub fn with_landing_page(mut self, url: impl Into<String>) -> Self {
        self.landing_page_url = Some(url.into());
        self
    }

    pub fn with_video(mut self, url: impl Into<String>) -> Self {
        self.video_url = Some(url.into());
        self
    }

    /// Trim string fields and collapse empty URLs to `None`.
    pub fn normalized(mut self) -> Self {
        self.industry = self.industry.trim().to_string();
        self.country = self.country.trim().to_string();
        self.landing_page_url = non_empty(self.landing_page_url);
        self.video_url = non_empty(self.video_url);
        self
    }

    /// Validate the context.
    pub fn validate(&self) -> CampaignResult<()> {
        if self.industry.trim().is_empty() {
            return Err(CampaignError::MissingField("industry"));
        }
        if !(self.target_cpa.is_finite() && self.target_cpa > 0.0) {
            return Err(CampaignError::NotPositive { field: "target_cpa" });
        }
        if !(self.budget.is_finite() && self.budget > 0.0) {
            return Err(CampaignError::NotPositive { field: "budget" });
        }
        if let Some(url) = self.landing_page_url.as_deref() {
            check_http_url("landing_page_url", url)?;
        }
        if let Some(url) = self.video_url.as_deref() {
            check_http_url("video_url", url)?;
        }
        Ok(())
    }

    pub fn has_video(&self) -> bool {
        self.video_url.is_some()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_http_url(field: &'static str, raw: &str) -> CampaignResult<()> {
    let parsed = url::Url::parse(raw.trim()).map_err(|e| CampaignError::InvalidUrl {
        field,
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(CampaignError::InvalidUrl {
            field,
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}
