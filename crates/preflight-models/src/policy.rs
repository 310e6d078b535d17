//! Policy review results and their aggregation into a single verdict.

use serde::{Deserialize, Deserializer, Serialize};

/// How a "flagged for manual review" outcome is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewFlagPolicy {
    /// Flagged checks stay safe but the rating is capped at Yellow.
    #[default]
    SafeButDowngraded,
    /// Flagged checks count as unsafe.
    TreatAsUnsafe,
}

/// Outcome of one policy check (video or landing page).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyResult {
    /// Accepts booleans or their string forms ("true", "False", ...).
    /// Anything else, including a missing value, reads as unsafe.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_safe: bool,
    #[serde(default, deserialize_with = "nullable_string")]
    pub reason: String,
    /// Explicit manual-review signal
    #[serde(default)]
    pub review_required: bool,
}

impl PolicyResult {
    pub fn safe(reason: impl Into<String>) -> Self {
        Self {
            is_safe: true,
            reason: reason.into(),
            review_required: false,
        }
    }

    pub fn unsafe_because(reason: impl Into<String>) -> Self {
        Self {
            is_safe: false,
            reason: reason.into(),
            review_required: false,
        }
    }

    pub fn review(is_safe: bool, reason: impl Into<String>) -> Self {
        Self {
            is_safe,
            reason: reason.into(),
            review_required: true,
        }
    }

    /// Default for a dimension that was not checked.
    pub fn skipped(dimension: &str) -> Self {
        Self::safe(format!("{} check skipped", dimension))
    }

    /// True when the check asks for manual review.
    pub fn is_review_flagged(&self) -> bool {
        self.review_required || self.reason.contains("Flagged") || self.reason.contains("Review")
    }

    /// True when the check should be mentioned in the aggregated reason.
    fn needs_mention(&self) -> bool {
        !self.is_safe || self.is_review_flagged()
    }

    fn effective_safe(&self, policy: ReviewFlagPolicy) -> bool {
        match policy {
            ReviewFlagPolicy::SafeButDowngraded => self.is_safe,
            ReviewFlagPolicy::TreatAsUnsafe => self.is_safe && !self.is_review_flagged(),
        }
    }
}

/// Aggregated verdict over the video and landing page checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyVerdict {
    pub is_safe: bool,
    /// Safe overall, but at least one check asked for manual review
    pub review_flagged: bool,
    pub reason: String,
}

impl PolicyVerdict {
    /// Verdict used when neither dimension could be checked.
    pub fn skipped() -> Self {
        Self::aggregate(
            &PolicyResult::skipped("Video"),
            &PolicyResult::skipped("Landing page"),
            ReviewFlagPolicy::default(),
        )
    }

    /// Combine both checks.
    ///
    /// Unsafe or flagged dimensions are listed as `"Video: ..."` and
    /// `"LP: ..."` joined by `"; "`; otherwise the reason is `"Policy Safe"`.
    pub fn aggregate(video: &PolicyResult, landing_page: &PolicyResult, policy: ReviewFlagPolicy) -> Self {
        let is_safe = video.effective_safe(policy) && landing_page.effective_safe(policy);
        let review_flagged = is_safe && (video.is_review_flagged() || landing_page.is_review_flagged());

        let mut reasons = Vec::new();
        if video.needs_mention() {
            reasons.push(format!("Video: {}", video.reason));
        }
        if landing_page.needs_mention() {
            reasons.push(format!("LP: {}", landing_page.reason));
        }
        let reason = if reasons.is_empty() {
            "Policy Safe".to_string()
        } else {
            reasons.join("; ")
        };

        Self {
            is_safe,
            review_flagged,
            reason,
        }
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_is_safe() {
        let r: PolicyResult = serde_json::from_str(r#"{"is_safe":"True","reason":"ok"}"#).unwrap();
        assert!(r.is_safe);
        let r: PolicyResult = serde_json::from_str(r#"{"is_safe":"false","reason":null}"#).unwrap();
        assert!(!r.is_safe);
        assert_eq!(r.reason, "");
        let r: PolicyResult = serde_json::from_str(r#"{"reason":"no flag"}"#).unwrap();
        assert!(!r.is_safe);
        let r: PolicyResult = serde_json::from_str(r#"{"is_safe":1}"#).unwrap();
        assert!(!r.is_safe);
    }

    #[test]
    fn test_review_flag_detection() {
        assert!(PolicyResult::safe("Flagged for Manual Review").is_review_flagged());
        assert!(PolicyResult::safe("Needs Review").is_review_flagged());
        assert!(PolicyResult::review(true, "x").is_review_flagged());
        assert!(!PolicyResult::safe("Policy check passed").is_review_flagged());
    }

    #[test]
    fn test_aggregate_all_safe() {
        let verdict = PolicyVerdict::aggregate(
            &PolicyResult::safe("ok"),
            &PolicyResult::skipped("Landing page"),
            ReviewFlagPolicy::SafeButDowngraded,
        );
        assert!(verdict.is_safe);
        assert!(!verdict.review_flagged);
        assert_eq!(verdict.reason, "Policy Safe");
    }

    #[test]
    fn test_aggregate_unsafe_lists_dimensions() {
        let verdict = PolicyVerdict::aggregate(
            &PolicyResult::unsafe_because("Violence: graphic content"),
            &PolicyResult::unsafe_because("Misleading claims"),
            ReviewFlagPolicy::SafeButDowngraded,
        );
        assert!(!verdict.is_safe);
        assert!(!verdict.review_flagged);
        assert_eq!(
            verdict.reason,
            "Video: Violence: graphic content; LP: Misleading claims"
        );
    }

    #[test]
    fn test_aggregate_flagged_stays_safe_by_default() {
        let video = PolicyResult::safe("Flagged for Manual Review");
        let lp = PolicyResult::safe("ok");
        let verdict = PolicyVerdict::aggregate(&video, &lp, ReviewFlagPolicy::SafeButDowngraded);
        assert!(verdict.is_safe);
        assert!(verdict.review_flagged);
        assert_eq!(verdict.reason, "Video: Flagged for Manual Review");

        let strict = PolicyVerdict::aggregate(&video, &lp, ReviewFlagPolicy::TreatAsUnsafe);
        assert!(!strict.is_safe);
        assert!(!strict.review_flagged);
    }

    #[test]
    fn test_skipped_verdict() {
        let verdict = PolicyVerdict::skipped();
        assert!(verdict.is_safe);
        assert_eq!(verdict.reason, "Policy Safe");
    }
}
