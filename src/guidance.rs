//! Readiness categories and their training guidance
//!
//! Guidance is a fixed lookup keyed by category. The copy text may change, but
//! the set of categories and their ordering are part of the engine's contract.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Readiness category, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessCategory {
    High,
    Moderate,
    Low,
    Recovery,
    Rest,
}

impl ReadinessCategory {
    pub const ALL: [ReadinessCategory; 5] = [
        ReadinessCategory::High,
        ReadinessCategory::Moderate,
        ReadinessCategory::Low,
        ReadinessCategory::Recovery,
        ReadinessCategory::Rest,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ReadinessCategory::High => "high",
            ReadinessCategory::Moderate => "moderate",
            ReadinessCategory::Low => "low",
            ReadinessCategory::Recovery => "recovery",
            ReadinessCategory::Rest => "rest",
        }
    }

    /// Guidance entry for this category
    pub fn guidance(&self) -> Guidance {
        match self {
            ReadinessCategory::High => entry(
                "Ready to perform - High intensity training is appropriate",
                &[],
                &[
                    "All training types",
                    "Competition prep",
                    "PR attempts",
                    "Heavy lifting",
                ],
            ),
            ReadinessCategory::Moderate => entry(
                "Good readiness - Moderate training recommended",
                &["Max efforts", "Competition", "PR attempts"],
                &[
                    "Moderate intensity work",
                    "Base building",
                    "Skill practice",
                    "Tempo runs",
                ],
            ),
            ReadinessCategory::Low => entry(
                "Reduced readiness - Easy training only",
                &["High intensity", "Heavy lifting", "Long sessions", "Max efforts"],
                &[
                    "Easy cardio (Zone 1-2)",
                    "Mobility work",
                    "Light technique",
                    "Recovery activities",
                ],
            ),
            ReadinessCategory::Recovery => entry(
                "Recovery needed - Active recovery only",
                &["Structured workouts", "Any intensity", "Heavy lifting"],
                &["Light walking", "Stretching", "Mobility work", "Sleep"],
            ),
            ReadinessCategory::Rest => entry(
                "Rest day - Prioritize sleep and recovery",
                &["All training", "Any intensity", "Structured workouts"],
                &["Complete rest", "Light walking", "Sleep", "Hydration"],
            ),
        }
    }
}

fn entry(recommendation: &str, avoid: &[&str], suggested: &[&str]) -> Guidance {
    Guidance {
        recommendation: recommendation.to_string(),
        avoid: avoid.iter().map(|s| s.to_string()).collect(),
        suggested: suggested.iter().map(|s| s.to_string()).collect(),
    }
}

impl fmt::Display for ReadinessCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Inclusive lower bounds for each category except `Rest`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryThresholds {
    pub high: f64,
    pub moderate: f64,
    pub low: f64,
    pub recovery: f64,
}

impl CategoryThresholds {
    /// Current scorer thresholds
    pub fn v2() -> Self {
        CategoryThresholds {
            high: 80.0,
            moderate: 65.0,
            low: 50.0,
            recovery: 35.0,
        }
    }

    /// Legacy scorer thresholds
    pub fn v1() -> Self {
        CategoryThresholds {
            high: 85.0,
            moderate: 70.0,
            low: 55.0,
            recovery: 40.0,
        }
    }

    pub fn categorize(&self, score: f64) -> ReadinessCategory {
        if score >= self.high {
            ReadinessCategory::High
        } else if score >= self.moderate {
            ReadinessCategory::Moderate
        } else if score >= self.low {
            ReadinessCategory::Low
        } else if score >= self.recovery {
            ReadinessCategory::Recovery
        } else {
            ReadinessCategory::Rest
        }
    }

    pub fn is_descending(&self) -> bool {
        self.high > self.moderate && self.moderate > self.low && self.low > self.recovery
    }
}

/// What to do today
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guidance {
    pub recommendation: String,
    pub avoid: Vec<String>,
    pub suggested: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v2_thresholds_inclusive_lower_bound() {
        let t = CategoryThresholds::v2();
        assert_eq!(t.categorize(80.0), ReadinessCategory::High);
        assert_eq!(t.categorize(79.0), ReadinessCategory::Moderate);
        assert_eq!(t.categorize(65.0), ReadinessCategory::Moderate);
        assert_eq!(t.categorize(64.0), ReadinessCategory::Low);
        assert_eq!(t.categorize(50.0), ReadinessCategory::Low);
        assert_eq!(t.categorize(35.0), ReadinessCategory::Recovery);
        assert_eq!(t.categorize(34.0), ReadinessCategory::Rest);
        assert_eq!(t.categorize(0.0), ReadinessCategory::Rest);
    }

    #[test]
    fn test_v1_thresholds() {
        let t = CategoryThresholds::v1();
        assert_eq!(t.categorize(84.0), ReadinessCategory::Moderate);
        assert_eq!(t.categorize(85.0), ReadinessCategory::High);
        assert_eq!(t.categorize(39.0), ReadinessCategory::Rest);
    }

    #[test]
    fn test_guidance_lookup_is_deterministic() {
        for category in ReadinessCategory::ALL {
            let a = category.guidance();
            let b = category.guidance();
            assert_eq!(a, b);
            assert!(!a.recommendation.is_empty());
            assert!(!a.suggested.is_empty());
        }
        assert!(ReadinessCategory::High.guidance().avoid.is_empty());
        assert!(ReadinessCategory::Rest
            .guidance()
            .avoid
            .contains(&"All training".to_string()));
    }

    #[test]
    fn test_threshold_ordering_check() {
        assert!(CategoryThresholds::v2().is_descending());
        let broken = CategoryThresholds {
            low: 70.0,
            ..CategoryThresholds::v2()
        };
        assert!(!broken.is_descending());
    }
}
