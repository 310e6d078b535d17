//! Wire format of the policy-review workflow callback.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::policy::PolicyResult;

/// Workflow status reported in a callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackStatus {
    Ok,
    Processing,
    Failed,
    /// Any other value; treated like `Ok` when policy results are present,
    /// otherwise as progress.
    Other(String),
}

impl CallbackStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CallbackStatus::Ok => "OK",
            CallbackStatus::Processing => "PROCESSING",
            CallbackStatus::Failed => "FAILED",
            CallbackStatus::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for CallbackStatus {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "OK" | "SUCCESS" | "COMPLETED" | "DONE" => CallbackStatus::Ok,
            "PROCESSING" | "RUNNING" | "IN_PROGRESS" => CallbackStatus::Processing,
            "FAILED" | "ERROR" => CallbackStatus::Failed,
            _ => CallbackStatus::Other(raw.to_string()),
        }
    }
}

impl Serialize for CallbackStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CallbackStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(CallbackStatus::from(raw.as_str()))
    }
}

/// Per-dimension policy results. A missing dimension was not checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<PolicyResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landing_page: Option<PolicyResult>,
}

/// Callback POSTed by the workflow once a review finishes.
///
/// Also used to interpret a synchronous trigger reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyCallback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_results: Option<PolicyResults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CallbackStatus>,
    /// Legacy spelling of `status`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n8n_status: Option<CallbackStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl PolicyCallback {
    /// Successful callback carrying both results.
    pub fn completed(analysis_id: impl Into<String>, results: PolicyResults) -> Self {
        Self {
            analysis_id: Some(analysis_id.into()),
            policy_results: Some(results),
            status: Some(CallbackStatus::Ok),
            ..Default::default()
        }
    }

    pub fn failed(analysis_id: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            analysis_id: Some(analysis_id.into()),
            status: Some(CallbackStatus::Failed),
            error_message: Some(error_message.into()),
            ..Default::default()
        }
    }

    /// Non-empty analysis id, if any.
    pub fn analysis_id(&self) -> Option<&str> {
        self.analysis_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Effective status, preferring `status` over `n8n_status`.
    pub fn status(&self) -> Option<&CallbackStatus> {
        self.status.as_ref().or(self.n8n_status.as_ref())
    }

    /// Non-empty error message, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    /// True when the workflow reported failure.
    pub fn is_failure(&self) -> bool {
        matches!(self.status(), Some(CallbackStatus::Failed)) || self.error_message().is_some()
    }

    /// True for a non-final acknowledgement: `PROCESSING`, or an unknown or
    /// absent status without policy results.
    pub fn is_progress(&self) -> bool {
        if self.is_failure() {
            return false;
        }
        match self.status() {
            Some(CallbackStatus::Processing) => true,
            Some(CallbackStatus::Ok) => false,
            Some(CallbackStatus::Other(_)) | None => self.policy_results.is_none(),
            Some(CallbackStatus::Failed) => false,
        }
    }

    /// True when the payload finishes the review with a verdict.
    pub fn is_completion(&self) -> bool {
        !self.is_failure() && !self.is_progress()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_callback_with_alias_status() {
        let cb: PolicyCallback = serde_json::from_str(
            r#"{
                "analysis_id": "a-1",
                "n8n_status": "failed",
                "error_message": ""
            }"#,
        )
        .unwrap();
        assert_eq!(cb.analysis_id(), Some("a-1"));
        assert_eq!(cb.status(), Some(&CallbackStatus::Failed));
        assert!(cb.is_failure());
        assert!(cb.error_message().is_none());
    }

    #[test]
    fn test_status_precedence() {
        let cb: PolicyCallback =
            serde_json::from_str(r#"{"analysis_id":"a","status":"OK","n8n_status":"FAILED"}"#).unwrap();
        assert_eq!(cb.status(), Some(&CallbackStatus::Ok));
        assert!(!cb.is_failure());
    }

    #[test]
    fn test_error_message_means_failure() {
        let cb: PolicyCallback =
            serde_json::from_str(r#"{"analysis_id":"a","error_message":"timeout in node"}"#).unwrap();
        assert!(cb.is_failure());
        assert!(!cb.is_progress());
    }

    #[test]
    fn test_processing() {
        let cb: PolicyCallback = serde_json::from_str(r#"{"analysis_id":"a","status":"Processing"}"#).unwrap();
        assert!(cb.is_progress());
    }

    #[test]
    fn test_partial_results() {
        let cb: PolicyCallback = serde_json::from_str(
            r#"{"analysis_id":"a","policy_results":{"video":{"is_safe":"true","reason":"fine"}}}"#,
        )
        .unwrap();
        let results = cb.policy_results.as_ref().unwrap();
        assert!(results.video.as_ref().unwrap().is_safe);
        assert!(results.landing_page.is_none());
        assert!(cb.is_completion());
    }

    #[test]
    fn test_blank_id_is_missing() {
        let cb: PolicyCallback = serde_json::from_str(r#"{"analysis_id":"  "}"#).unwrap();
        assert!(cb.analysis_id().is_none());
    }

    #[test]
    fn test_unknown_status_round_trips_text() {
        let status = CallbackStatus::from("queued");
        assert_eq!(status, CallbackStatus::Other("queued".to_string()));
        assert_eq!(serde_json::to_string(&status).unwrap(), r#""queued""#);
    }

    #[test]
    fn test_unknown_status_without_results_is_progress() {
        for raw in [r#"{"analysis_id":"a","status":"started"}"#, r#"{"analysis_id":"a","status":"queued"}"#, r#"{"analysis_id":"a"}"#] {
            let cb: PolicyCallback = serde_json::from_str(raw).unwrap();
            assert!(cb.is_progress(), "{}", raw);
            assert!(!cb.is_completion(), "{}", raw);
        }

        let with_results: PolicyCallback = serde_json::from_str(
            r#"{"analysis_id":"a","status":"done-ish","policy_results":{"video":{"is_safe":false,"reason":"Weapons"}}}"#,
        )
        .unwrap();
        assert!(with_results.is_completion());

        let ok_without_results: PolicyCallback = serde_json::from_str(r#"{"analysis_id":"a","status":"OK"}"#).unwrap();
        assert!(ok_without_results.is_completion());
    }
}
