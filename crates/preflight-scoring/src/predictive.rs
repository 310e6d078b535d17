//! Predictive score and final rating.

use preflight_models::{AnalysisResults, CampaignContext, CreativeMetrics, PolicyVerdict, Rating};

use crate::benchmark::BenchmarkTable;

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `hook * 0.6 + pacing * 0.4`
pub fn dna_score(metrics: &CreativeMetrics) -> f64 {
    metrics.hook_score * 0.6 + metrics.pacing_score * 0.4
}

/// `round2(dna * 0.7 + benchmark * 0.3)` when safe, otherwise 0.
pub fn predictive_score(dna_score: f64, benchmark_score: f64, is_safe: bool) -> f64 {
    if !is_safe {
        return 0.0;
    }
    round2(dna_score * 0.7 + benchmark_score * 0.3)
}

/// Rating for a scored, policy-checked analysis.
///
/// Unsafe is always Red. A review flag on a safe result caps Green at Yellow.
pub fn classify(predictive_score: f64, is_safe: bool, review_flagged: bool) -> Rating {
    if !is_safe {
        return Rating::Red;
    }
    let rating = if predictive_score > 80.0 {
        Rating::Green
    } else if predictive_score >= 50.0 {
        Rating::Yellow
    } else {
        Rating::Red
    };
    if review_flagged && rating == Rating::Green {
        Rating::Yellow
    } else {
        rating
    }
}

/// Produces the results stored on an analysis record.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    benchmarks: BenchmarkTable,
}

impl ScoringEngine {
    pub fn new(benchmarks: BenchmarkTable) -> Self {
        Self { benchmarks }
    }

    pub fn benchmarks(&self) -> &BenchmarkTable {
        &self.benchmarks
    }

    pub fn benchmark_score(&self, context: &CampaignContext) -> f64 {
        self.benchmarks.score(context.target_cpa, &context.industry)
    }

    /// Results stored before the policy verdict is known.
    pub fn provisional(&self, context: &CampaignContext, metrics: &CreativeMetrics) -> AnalysisResults {
        AnalysisResults::provisional(self.benchmark_score(context), dna_score(metrics))
    }

    /// Final results for a policy verdict.
    pub fn score(&self, context: &CampaignContext, metrics: &CreativeMetrics, verdict: &PolicyVerdict) -> AnalysisResults {
        let benchmark_score = self.benchmark_score(context);
        let dna_score = dna_score(metrics);
        let predictive_score = predictive_score(dna_score, benchmark_score, verdict.is_safe);
        let review_flagged = verdict.is_safe && verdict.review_flagged;

        AnalysisResults {
            benchmark_score,
            dna_score,
            predictive_score,
            final_rating: classify(predictive_score, verdict.is_safe, review_flagged),
            is_safe: verdict.is_safe,
            policy_reason: verdict.reason.clone(),
            review_flagged,
        }
    }
}
