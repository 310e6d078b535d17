//! Review workflow request/response types.

use preflight_models::{CampaignContext, PolicyResult};
use serde::{Deserialize, Serialize};

/// Body of a hybrid review trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerPayload {
    pub analysis_id: String,
    /// Where the workflow POSTs its result
    pub callback_url: String,
    pub video_url: Option<String>,
    pub landing_page_url: Option<String>,
    pub industry: String,
    pub country: String,
}

impl TriggerPayload {
    pub fn new(analysis_id: impl Into<String>, callback_url: impl Into<String>, context: &CampaignContext) -> Self {
        Self {
            analysis_id: analysis_id.into(),
            callback_url: callback_url.into(),
            video_url: context.video_url.clone(),
            landing_page_url: context.landing_page_url.clone(),
            industry: context.industry.clone(),
            country: context.country.clone(),
        }
    }
}

/// Blocking video review request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct VideoReviewRequest {
    pub creative_videos: Vec<VideoReviewItem>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct VideoReviewItem {
    pub video_preview_url: String,
}

/// Blocking landing page review request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct LandingPageReviewRequest {
    #[serde(rename = "landingPages")]
    pub landing_pages: Vec<String>,
}

/// Reply of the video review workflow.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoReviewReply {
    #[serde(default)]
    pub creative_videos_review: Vec<VideoReview>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VideoReview {
    /// "Compliant", "Non-Compliant" or "Flagged for Review"
    pub text_analysis_result: Option<String>,
    /// e.g. "Reject Content" / "Approve Content"
    pub recommendation: Option<String>,
    pub violation_type: Option<String>,
    pub text_violation_type: Option<String>,
    pub violation_details: Option<String>,
    pub text_violation_details: Option<String>,
}

impl VideoReview {
    fn details(&self) -> Option<&str> {
        first_non_empty(&[&self.violation_details, &self.text_violation_details])
    }

    fn violation_type(&self) -> &str {
        first_non_empty(&[&self.violation_type, &self.text_violation_type]).unwrap_or("Policy Violation")
    }
}

/// Reply of the landing page review workflow.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LandingPageReviewReply {
    #[serde(default)]
    pub landing_pages_review: Vec<LandingPageReview>,
    /// Already-normalized result some workflow versions return
    #[serde(default)]
    pub policy: Option<PolicyResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LandingPageReview {
    pub analysis_result: Option<String>,
    pub violation_details: Option<String>,
    pub recommendation: Option<String>,
}

/// Map a video review reply to a policy result.
///
/// Only the first review item is considered. "Flagged for Review" is
/// reported as safe with `review_required`; the verdict aggregation decides
/// whether that counts as unsafe.
pub fn interpret_video_reply(reply: &VideoReviewReply) -> PolicyResult {
    let Some(review) = reply.creative_videos_review.first() else {
        return PolicyResult::safe("Policy check passed");
    };

    let result = review.text_analysis_result.as_deref().unwrap_or("Unknown").trim();
    let recommendation = review.recommendation.as_deref().unwrap_or("");

    if result == "Non-Compliant" || recommendation.contains("Reject") {
        let violation = review.violation_type();
        let reason = match review.details() {
            Some(details) => format!("{}: {}", violation, details),
            None => violation.to_string(),
        };
        return PolicyResult::unsafe_because(reason);
    }

    if result == "Flagged for Review" {
        let reason = match review.details() {
            Some(details) => format!("Flagged for Manual Review: {}", details),
            None => "Flagged for Manual Review".to_string(),
        };
        return PolicyResult::review(true, reason);
    }

    PolicyResult::safe("Policy check passed")
}

/// Map a landing page review reply to a policy result.
pub fn interpret_landing_page_reply(reply: &LandingPageReviewReply) -> PolicyResult {
    if let Some(review) = reply.landing_pages_review.first() {
        let status = review.analysis_result.as_deref().unwrap_or("Unknown").trim();
        if status.eq_ignore_ascii_case("compliant") {
            return PolicyResult::safe("Landing Page Compliant");
        }
        let reason = first_non_empty(&[&review.violation_details, &review.recommendation]).unwrap_or("Policy Violation");
        return PolicyResult::unsafe_because(reason);
    }

    match &reply.policy {
        Some(policy) => policy.clone(),
        None => PolicyResult::unsafe_because("Invalid response format from policy check"),
    }
}

fn first_non_empty<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(json: &str) -> PolicyResult {
        interpret_video_reply(&serde_json::from_str(json).unwrap())
    }

    fn landing_page(json: &str) -> PolicyResult {
        interpret_landing_page_reply(&serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_video_non_compliant() {
        let result = video(
            r#"{"creative_videos_review":[{"TextAnalysisResult":"Non-Compliant","ViolationType":"Medical Claims","ViolationDetails":"cures baldness"}]}"#,
        );
        assert!(!result.is_safe);
        assert_eq!(result.reason, "Medical Claims: cures baldness");
    }

    #[test]
    fn test_video_reject_recommendation_uses_text_fields() {
        let result = video(
            r#"{"creative_videos_review":[{"TextAnalysisResult":"Compliant","Recommendation":"Reject Content","TextViolationType":"Gambling"}]}"#,
        );
        assert!(!result.is_safe);
        assert_eq!(result.reason, "Gambling");
    }

    #[test]
    fn test_video_flagged() {
        let result = video(r#"{"creative_videos_review":[{"TextAnalysisResult":"Flagged for Review"}]}"#);
        assert!(result.is_safe);
        assert!(result.review_required);
        assert_eq!(result.reason, "Flagged for Manual Review");
    }

    #[test]
    fn test_video_passed_or_empty() {
        assert!(video(r#"{"creative_videos_review":[{"TextAnalysisResult":"Compliant"}]}"#).is_safe);
        let empty = video("{}");
        assert!(empty.is_safe);
        assert_eq!(empty.reason, "Policy check passed");
    }

    #[test]
    fn test_landing_page_compliant_case_insensitive() {
        let result = landing_page(r#"{"landing_pages_review":[{"AnalysisResult":"COMPLIANT"}]}"#);
        assert!(result.is_safe);
        assert_eq!(result.reason, "Landing Page Compliant");
    }

    #[test]
    fn test_landing_page_violation() {
        let result = landing_page(
            r#"{"landing_pages_review":[{"AnalysisResult":"Non-Compliant","Recommendation":"Remove pricing claims"}]}"#,
        );
        assert!(!result.is_safe);
        assert_eq!(result.reason, "Remove pricing claims");
    }

    #[test]
    fn test_landing_page_policy_passthrough_and_invalid() {
        let result = landing_page(r#"{"policy":{"is_safe":"true","reason":"fine"}}"#);
        assert!(result.is_safe);
        assert_eq!(result.reason, "fine");

        let invalid = landing_page(r#"{"unexpected":true}"#);
        assert!(!invalid.is_safe);
        assert_eq!(invalid.reason, "Invalid response format from policy check");
    }

    #[test]
    fn test_trigger_payload_from_context() {
        let context = CampaignContext::new("games", 15.0, 100.0, "VN").with_video("https://x.io/a.mp4");
        let payload = TriggerPayload::new("id-1", "https://api/cb", &context);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["analysis_id"], "id-1");
        assert_eq!(json["video_url"], "https://x.io/a.mp4");
        assert!(json["landing_page_url"].is_null());
        assert_eq!(json["country"], "VN");
    }
}
