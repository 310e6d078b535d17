//! Industry CPA benchmark scoring.

use std::collections::HashMap;

/// Average CPA used for industries missing from the table.
pub const DEFAULT_INDUSTRY_CPA: f64 = 50.0;

/// Estimated industry average CPA (USD).
const INDUSTRY_CPA: &[(&str, f64)] = &[
    ("education", 85.0),
    ("vehicles & transportation", 150.0),
    ("baby & kids products", 60.0),
    ("financial services", 750.0),
    ("beauty & personal care", 350.0),
    ("tech & electronics", 500.0),
    ("appliances", 120.0),
    ("travel", 380.0),
    ("household products", 50.0),
    ("pets", 45.0),
    ("apps", 25.0),
    ("home improvement", 100.0),
    ("apparel & accessories", 80.0),
    ("news & entertainment", 30.0),
    ("business services", 200.0),
    ("games", 20.0),
    ("life services", 80.0),
    ("food & beverage", 60.0),
    ("sports & outdoors", 90.0),
    ("e-commerce (non-app)", 325.0),
];

/// Industry -> average CPA lookup.
///
/// Keys are matched trimmed and case-insensitively.
#[derive(Debug, Clone)]
pub struct BenchmarkTable {
    averages: HashMap<String, f64>,
    fallback: f64,
}

impl Default for BenchmarkTable {
    fn default() -> Self {
        Self {
            averages: INDUSTRY_CPA
                .iter()
                .map(|(industry, cpa)| (industry.to_string(), *cpa))
                .collect(),
            fallback: DEFAULT_INDUSTRY_CPA,
        }
    }
}

impl BenchmarkTable {
    /// Default table extended or overridden by `overrides`.
    pub fn with_overrides<I, K>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut table = Self::default();
        for (industry, cpa) in overrides {
            table.averages.insert(normalize_key(industry.as_ref()), cpa);
        }
        table
    }

    /// Average CPA for an industry, or the fallback when unknown.
    pub fn average_cpa(&self, industry: &str) -> f64 {
        self.averages
            .get(&normalize_key(industry))
            .copied()
            .unwrap_or(self.fallback)
    }

    /// `min(100, target_cpa / average * 100)`; 0 when the average is 0.
    pub fn score(&self, target_cpa: f64, industry: &str) -> f64 {
        let average = self.average_cpa(industry);
        if average == 0.0 {
            return 0.0;
        }
        ((target_cpa / average) * 100.0).min(100.0)
    }

    pub fn len(&self) -> usize {
        self.averages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.averages.is_empty()
    }
}

fn normalize_key(industry: &str) -> String {
    industry.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_industry_caps_at_100() {
        let table = BenchmarkTable::default();
        assert_eq!(table.score(325.0, "e-commerce (non-app)"), 100.0);
        assert_eq!(table.score(1000.0, "games"), 100.0);
    }

    #[test]
    fn test_partial_score() {
        let table = BenchmarkTable::default();
        let score = table.score(50.0, "e-commerce (non-app)");
        assert!((score - 15.3846).abs() < 0.001);
        assert_eq!(table.score(15.0, "games"), 75.0);
    }

    #[test]
    fn test_key_normalization() {
        let table = BenchmarkTable::default();
        assert_eq!(table.average_cpa("  Games "), 20.0);
        assert_eq!(table.average_cpa("FINANCIAL SERVICES"), 750.0);
    }

    #[test]
    fn test_unknown_industry_uses_fallback() {
        let table = BenchmarkTable::default();
        assert_eq!(table.average_cpa("space tourism"), DEFAULT_INDUSTRY_CPA);
        assert_eq!(table.score(25.0, "space tourism"), 50.0);
    }

    #[test]
    fn test_overrides() {
        let table = BenchmarkTable::with_overrides([("Games", 30.0), ("crypto", 0.0)]);
        assert_eq!(table.average_cpa("games"), 30.0);
        assert_eq!(table.score(10.0, "crypto"), 0.0);
        assert_eq!(table.len(), INDUSTRY_CPA.len() + 1);
    }
}
