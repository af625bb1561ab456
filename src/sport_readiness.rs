//! Go / no-go classification per sport and intensity
//!
//! Each profile carries a minimum readiness score, optional fatigue ceilings
//! per body system and an ACWR ceiling. A profile starts as ready and can only
//! be downgraded: not ready dominates caution, which dominates ready.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::ConfigError;
use crate::fatigue::FatigueLevels;
use crate::models::FatigueDimension;

/// Margin past a fatigue ceiling that turns caution into not ready
pub const FATIGUE_HARD_MARGIN: f64 = 0.1;

/// Margin past the ACWR ceiling that turns caution into not ready
pub const ACWR_HARD_MARGIN: Decimal = dec!(0.3);

/// Closed set of evaluated sport profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SportProfile {
    EasyRun,
    ModerateRun,
    HardRun,
    EasyBike,
    HyroxIntervals,
    StrengthHeavy,
    StrengthLight,
    Swim,
}

impl SportProfile {
    pub const ALL: [SportProfile; 8] = [
        SportProfile::EasyRun,
        SportProfile::ModerateRun,
        SportProfile::HardRun,
        SportProfile::EasyBike,
        SportProfile::HyroxIntervals,
        SportProfile::StrengthHeavy,
        SportProfile::StrengthLight,
        SportProfile::Swim,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SportProfile::EasyRun => "easy_run",
            SportProfile::ModerateRun => "moderate_run",
            SportProfile::HardRun => "hard_run",
            SportProfile::EasyBike => "easy_bike",
            SportProfile::HyroxIntervals => "hyrox_intervals",
            SportProfile::StrengthHeavy => "strength_heavy",
            SportProfile::StrengthLight => "strength_light",
            SportProfile::Swim => "swim",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SportProfile::EasyRun => "Easy Run",
            SportProfile::ModerateRun => "Moderate Run",
            SportProfile::HardRun => "Hard Run",
            SportProfile::EasyBike => "Easy Bike",
            SportProfile::HyroxIntervals => "Hyrox Intervals",
            SportProfile::StrengthHeavy => "Heavy Strength",
            SportProfile::StrengthLight => "Light Strength",
            SportProfile::Swim => "Swim",
        }
    }
}

impl fmt::Display for SportProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Per-dimension fatigue ceilings; `None` means the dimension is not checked
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FatigueLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cns: Option<f64>,
}

impl FatigueLimits {
    pub fn get(&self, dimension: FatigueDimension) -> Option<f64> {
        match dimension {
            FatigueDimension::Upper => self.upper,
            FatigueDimension::Lower => self.lower,
            FatigueDimension::Cardio => self.cardio,
            FatigueDimension::Cns => self.cns,
        }
    }
}

/// Requirements row for one sport profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportRequirements {
    pub sport: SportProfile,
    pub min_readiness: u8,
    #[serde(default)]
    pub fatigue_limits: FatigueLimits,
    pub acwr_max: Decimal,
}

impl SportRequirements {
    fn new(sport: SportProfile, min_readiness: u8, limits: FatigueLimits, acwr_max: Decimal) -> Self {
        SportRequirements {
            sport,
            min_readiness,
            fatigue_limits: limits,
            acwr_max,
        }
    }
}

fn limits(upper: Option<f64>, lower: Option<f64>, cardio: Option<f64>, cns: Option<f64>) -> FatigueLimits {
    FatigueLimits {
        upper,
        lower,
        cardio,
        cns,
    }
}

/// Built-in requirements table, one row per profile
pub fn default_requirements() -> Vec<SportRequirements> {
    use SportProfile::*;
    vec![
        SportRequirements::new(EasyRun, 40, limits(None, Some(0.8), Some(0.8), None), dec!(2.5)),
        SportRequirements::new(ModerateRun, 55, limits(None, Some(0.6), Some(0.7), None), dec!(1.8)),
        SportRequirements::new(HardRun, 70, limits(None, Some(0.5), Some(0.5), Some(0.6)), dec!(1.5)),
        SportRequirements::new(EasyBike, 35, limits(None, Some(0.85), Some(0.85), None), dec!(2.5)),
        SportRequirements::new(
            HyroxIntervals,
            75,
            limits(Some(0.5), Some(0.4), Some(0.5), Some(0.5)),
            dec!(1.4),
        ),
        SportRequirements::new(
            StrengthHeavy,
            65,
            limits(Some(0.5), Some(0.5), None, Some(0.4)),
            dec!(1.6),
        ),
        SportRequirements::new(
            StrengthLight,
            45,
            limits(Some(0.7), Some(0.7), None, Some(0.6)),
            dec!(2.0),
        ),
        SportRequirements::new(Swim, 40, limits(Some(0.7), None, Some(0.75), None), dec!(2.0)),
    ]
}

/// Every profile must appear exactly once with sane thresholds
pub fn validate_requirements(table: &[SportRequirements]) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for row in table {
        if !seen.insert(row.sport) {
            return Err(ConfigError::DuplicateSportProfile {
                sport: row.sport.to_string(),
            });
        }
        if row.min_readiness > 100 {
            return Err(ConfigError::InvalidValue {
                field: format!("sports.{}.min_readiness", row.sport),
                reason: "must be within 0-100".to_string(),
            });
        }
        if row.acwr_max <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: format!("sports.{}.acwr_max", row.sport),
                reason: "must be positive".to_string(),
            });
        }
        for dimension in FatigueDimension::ALL {
            if let Some(limit) = row.fatigue_limits.get(dimension) {
                if !(0.0..=1.0).contains(&limit) {
                    return Err(ConfigError::InvalidValue {
                        field: format!("sports.{}.fatigue_limits.{}", row.sport, dimension),
                        reason: "must lie in [0, 1]".to_string(),
                    });
                }
            }
        }
    }

    for sport in SportProfile::ALL {
        if !seen.contains(&sport) {
            return Err(ConfigError::MissingSportProfile {
                sport: sport.to_string(),
            });
        }
    }

    Ok(())
}

/// Status ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SportStatus {
    Ready,
    Caution,
    NotReady,
}

impl SportStatus {
    /// Combine with a newly found problem; never improves
    pub fn downgrade(self, to: SportStatus) -> SportStatus {
        self.max(to)
    }
}

impl fmt::Display for SportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SportStatus::Ready => write!(f, "ready"),
            SportStatus::Caution => write!(f, "caution"),
            SportStatus::NotReady => write!(f, "not_ready"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SportStatusReport {
    pub status: SportStatus,
    pub blockers: Vec<String>,
}

/// Profiles grouped by status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SportCategories {
    pub ready: Vec<SportProfile>,
    pub caution: Vec<SportProfile>,
    pub not_ready: Vec<SportProfile>,
}

pub struct SportReadinessEvaluator<'a> {
    requirements: &'a [SportRequirements],
}

impl<'a> SportReadinessEvaluator<'a> {
    /// `requirements` is expected to have passed [`validate_requirements`]
    pub fn new(requirements: &'a [SportRequirements]) -> Self {
        SportReadinessEvaluator { requirements }
    }

    /// Classify every profile for the given score, fatigue fractions and ACWR
    pub fn evaluate(
        &self,
        score: u8,
        fatigue: &FatigueLevels,
        acwr: Decimal,
    ) -> BTreeMap<SportProfile, SportStatusReport> {
        self.requirements
            .iter()
            .map(|req| (req.sport, Self::evaluate_one(req, score, fatigue, acwr)))
            .collect()
    }

    fn evaluate_one(
        req: &SportRequirements,
        score: u8,
        fatigue: &FatigueLevels,
        acwr: Decimal,
    ) -> SportStatusReport {
        let mut status = SportStatus::Ready;
        let mut blockers = Vec::new();

        if score < req.min_readiness {
            status = status.downgrade(SportStatus::NotReady);
            blockers.push(format!("Readiness {} < {}", score, req.min_readiness));
        }

        for dimension in FatigueDimension::ALL {
            let Some(limit) = req.fatigue_limits.get(dimension) else {
                continue;
            };
            let value = fatigue.get(dimension);
            if value > limit {
                let found = if value > limit + FATIGUE_HARD_MARGIN {
                    SportStatus::NotReady
                } else {
                    SportStatus::Caution
                };
                status = status.downgrade(found);
                blockers.push(format!(
                    "{} fatigue {:.0}% > {:.0}%",
                    dimension,
                    value * 100.0,
                    limit * 100.0
                ));
            }
        }

        if acwr > req.acwr_max {
            let found = if acwr > req.acwr_max + ACWR_HARD_MARGIN {
                SportStatus::NotReady
            } else {
                SportStatus::Caution
            };
            status = status.downgrade(found);
            blockers.push(format!("ACWR {:.2} > {}", acwr, req.acwr_max.normalize()));
        }

        SportStatusReport { status, blockers }
    }
}

/// Group evaluated profiles into ready / caution / not ready buckets
pub fn categorize(results: &BTreeMap<SportProfile, SportStatusReport>) -> SportCategories {
    let mut categories = SportCategories::default();
    for (sport, report) in results {
        match report.status {
            SportStatus::Ready => categories.ready.push(*sport),
            SportStatus::Caution => categories.caution.push(*sport),
            SportStatus::NotReady => categories.not_ready.push(*sport),
        }
    }
    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> FatigueLevels {
        FatigueLevels::default()
    }

    fn evaluate(score: u8, fatigue: FatigueLevels, acwr: Decimal) -> BTreeMap<SportProfile, SportStatusReport> {
        let table = default_requirements();
        SportReadinessEvaluator::new(&table).evaluate(score, &fatigue, acwr)
    }

    #[test]
    fn test_default_table_is_valid() {
        let table = default_requirements();
        assert_eq!(table.len(), SportProfile::ALL.len());
        assert!(validate_requirements(&table).is_ok());
    }

    #[test]
    fn test_missing_and_duplicate_profiles_rejected() {
        let mut table = default_requirements();
        table.pop();
        assert_eq!(
            validate_requirements(&table),
            Err(ConfigError::MissingSportProfile {
                sport: "swim".to_string()
            })
        );

        let mut table = default_requirements();
        table.push(table[0].clone());
        assert!(matches!(
            validate_requirements(&table),
            Err(ConfigError::DuplicateSportProfile { .. })
        ));
    }

    #[test]
    fn test_all_ready_when_fresh() {
        let results = evaluate(90, fresh(), dec!(1.0));
        assert_eq!(results.len(), 8);
        for report in results.values() {
            assert_eq!(report.status, SportStatus::Ready);
            assert!(report.blockers.is_empty());
        }
    }

    #[test]
    fn test_low_score_blocks() {
        let results = evaluate(45, fresh(), dec!(1.0));
        let hard = &results[&SportProfile::HardRun];
        assert_eq!(hard.status, SportStatus::NotReady);
        assert_eq!(hard.blockers, vec!["Readiness 45 < 70".to_string()]);

        assert_eq!(results[&SportProfile::EasyRun].status, SportStatus::Ready);
    }

    #[test]
    fn test_fatigue_margin() {
        // hard_run lower limit 0.5
        let slightly = FatigueLevels {
            lower: 0.55,
            ..fresh()
        };
        let results = evaluate(90, slightly, dec!(1.0));
        assert_eq!(results[&SportProfile::HardRun].status, SportStatus::Caution);
        assert_eq!(
            results[&SportProfile::HardRun].blockers,
            vec!["lower fatigue 55% > 50%".to_string()]
        );

        let well_over = FatigueLevels {
            lower: 0.65,
            ..fresh()
        };
        let results = evaluate(90, well_over, dec!(1.0));
        assert_eq!(results[&SportProfile::HardRun].status, SportStatus::NotReady);
    }

    #[test]
    fn test_acwr_margin() {
        // hard_run ceiling 1.5
        let results = evaluate(90, fresh(), dec!(1.7));
        assert_eq!(results[&SportProfile::HardRun].status, SportStatus::Caution);
        assert_eq!(
            results[&SportProfile::HardRun].blockers,
            vec!["ACWR 1.70 > 1.5".to_string()]
        );

        let results = evaluate(90, fresh(), dec!(2.39));
        assert_eq!(results[&SportProfile::HardRun].status, SportStatus::NotReady);
        assert_eq!(results[&SportProfile::EasyRun].status, SportStatus::Ready);
    }

    #[test]
    fn test_status_never_improves() {
        // Score blocks first, then a mild fatigue overrun must not soften it
        let fatigue = FatigueLevels {
            lower: 0.55,
            ..fresh()
        };
        let results = evaluate(50, fatigue, dec!(1.6));
        let hard = &results[&SportProfile::HardRun];
        assert_eq!(hard.status, SportStatus::NotReady);
        assert_eq!(hard.blockers.len(), 3);
    }

    #[test]
    fn test_categorize() {
        let results = evaluate(60, fresh(), dec!(1.0));
        let categories = categorize(&results);
        assert!(categories.ready.contains(&SportProfile::EasyRun));
        assert!(categories.not_ready.contains(&SportProfile::HyroxIntervals));
        assert!(categories.caution.is_empty());
        assert_eq!(
            categories.ready.len() + categories.caution.len() + categories.not_ready.len(),
            8
        );
    }

    #[test]
    fn test_display_names() {
        assert_eq!(SportProfile::StrengthHeavy.display_name(), "Heavy Strength");
        assert_eq!(SportProfile::HyroxIntervals.to_string(), "hyrox_intervals");
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_status_monotonic_in_inputs(
            score in 0u8..=100,
            lower in 0.0f64..1.0,
            cns in 0.0f64..1.0,
            acwr_hundredths in 50i64..300,
            extra in 0.0f64..0.5,
        ) {
            let acwr = Decimal::new(acwr_hundredths, 2);
            let base = FatigueLevels { lower, cns, ..FatigueLevels::default() };
            let worse = FatigueLevels { lower: (lower + extra).min(1.0), cns, ..FatigueLevels::default() };

            let a = evaluate(score, base, acwr);
            let b = evaluate(score, worse, acwr);
            for sport in SportProfile::ALL {
                prop_assert!(b[&sport].status >= a[&sport].status);
            }
        }
    }
}
