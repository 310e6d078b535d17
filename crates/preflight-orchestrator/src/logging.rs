//! Structured analysis logging.

use tracing::{error, info, warn, Span};

/// Logs lifecycle events of one analysis with consistent fields.
#[derive(Debug, Clone)]
pub struct AnalysisLogger {
    analysis_id: String,
    operation: String,
}

impl AnalysisLogger {
    /// Create a logger for an analysis and operation
    /// (e.g. `"submit_analysis"`, `"policy_callback"`).
    pub fn new(analysis_id: &str, operation: &str) -> Self {
        Self {
            analysis_id: analysis_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            analysis_id = %self.analysis_id,
            operation = %self.operation,
            "Analysis started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            analysis_id = %self.analysis_id,
            operation = %self.operation,
            "Analysis progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            analysis_id = %self.analysis_id,
            operation = %self.operation,
            "Analysis warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            analysis_id = %self.analysis_id,
            operation = %self.operation,
            "Analysis error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            analysis_id = %self.analysis_id,
            operation = %self.operation,
            "Analysis completed: {}", message
        );
    }

    pub fn analysis_id(&self) -> &str {
        &self.analysis_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span carrying the analysis id, for work spread over several calls.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "analysis",
            analysis_id = %self.analysis_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_fields() {
        let logger = AnalysisLogger::new("a-1", "submit_analysis");
        assert_eq!(logger.analysis_id(), "a-1");
        assert_eq!(logger.operation(), "submit_analysis");

        logger.log_start("test");
        logger.log_progress("test");
        logger.log_completion("test");
        let _span = logger.create_span();
    }
}
