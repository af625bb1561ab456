use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;

/// ACWR configuration with customizable decay constants and penalty curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcwrConfig {
    /// Acute EWMA decay constant in days (default: 7)
    pub acute_decay_days: u16,

    /// Chronic EWMA decay constant in days (default: 28)
    pub chronic_decay_days: u16,

    /// Length of the load series in days (default: 28)
    pub window_days: u16,

    /// Days with recorded load required before the ratio is trusted
    pub min_history_days: u16,

    /// Chronic loads below this are treated as a degenerate denominator
    pub min_chronic_load: Decimal,

    /// Upper bound of the undertrained zone (exclusive)
    pub undertrained_below: Decimal,

    /// Flat penalty inside the undertrained zone
    pub undertrained_penalty: Decimal,

    /// Upper bound of the optimal zone (inclusive)
    pub optimal_max: Decimal,

    /// Upper bound of the caution zone (inclusive)
    pub caution_max: Decimal,

    /// Penalty reached at `caution_max`
    pub caution_penalty: Decimal,

    /// Upper bound of the danger zone (inclusive)
    pub danger_max: Decimal,

    /// Penalty reached at `danger_max`
    pub danger_penalty: Decimal,

    /// Penalty per ACWR unit above `danger_max`
    pub high_risk_slope: Decimal,

    /// Hard ceiling on the penalty
    pub penalty_cap: Decimal,
}

impl Default for AcwrConfig {
    fn default() -> Self {
        AcwrConfig {
            acute_decay_days: 7,
            chronic_decay_days: 28,
            window_days: 28,
            min_history_days: 7,
            min_chronic_load: dec!(1),
            undertrained_below: dec!(0.8),
            undertrained_penalty: dec!(5),
            optimal_max: dec!(1.3),
            caution_max: dec!(1.5),
            caution_penalty: dec!(10),
            danger_max: dec!(2.0),
            danger_penalty: dec!(20),
            high_risk_slope: dec!(5),
            penalty_cap: dec!(25),
        }
    }
}

impl AcwrConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.acute_decay_days == 0 || self.chronic_decay_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "acwr.decay_days".to_string(),
                reason: "decay constants must be positive".to_string(),
            });
        }

        if self.window_days == 0 || self.min_history_days > self.window_days {
            return Err(ConfigError::InvalidValue {
                field: "acwr.window_days".to_string(),
                reason: "window must be non-empty and cover min_history_days".to_string(),
            });
        }

        let bounds = [
            self.undertrained_below,
            self.optimal_max,
            self.caution_max,
            self.danger_max,
        ];
        if bounds.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ConfigError::InvalidValue {
                field: "acwr zone bounds".to_string(),
                reason: "zone bounds must be strictly increasing".to_string(),
            });
        }

        if self.caution_penalty > self.danger_penalty || self.danger_penalty > self.penalty_cap {
            return Err(ConfigError::InvalidValue {
                field: "acwr penalties".to_string(),
                reason: "penalties must be non-decreasing up to the cap".to_string(),
            });
        }

        Ok(())
    }
}

/// Injury-risk zone for an ACWR value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcwrZone {
    Undertrained,
    Optimal,
    Caution,
    Danger,
    HighRisk,
}

impl AcwrZone {
    pub fn description(&self) -> &'static str {
        match self {
            AcwrZone::Undertrained => "Load well below recent norm (deconditioning)",
            AcwrZone::Optimal => "Load in the sweet spot",
            AcwrZone::Caution => "Load ramping quickly (monitor)",
            AcwrZone::Danger => "Load spike (elevated injury risk)",
            AcwrZone::HighRisk => "Severe load spike (high injury risk)",
        }
    }
}

impl fmt::Display for AcwrZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcwrZone::Undertrained => write!(f, "undertrained"),
            AcwrZone::Optimal => write!(f, "optimal"),
            AcwrZone::Caution => write!(f, "caution"),
            AcwrZone::Danger => write!(f, "danger"),
            AcwrZone::HighRisk => write!(f, "high_risk"),
        }
    }
}

/// ACWR ratio, penalty and zone for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcwrAssessment {
    /// Acute:chronic ratio (1.0 when history is insufficient)
    pub ratio: Decimal,

    /// Readiness penalty points
    pub penalty: Decimal,

    pub zone: AcwrZone,

    /// Acute EWMA over the padded window
    pub acute_load: Decimal,

    /// Chronic EWMA over the padded window
    pub chronic_load: Decimal,

    /// False when the neutral ratio was substituted for lack of data
    pub sufficient_history: bool,
}

/// Acute:Chronic Workload Ratio engine
pub struct AcwrEngine<'a> {
    config: &'a AcwrConfig,
}

impl<'a> AcwrEngine<'a> {
    pub fn new(config: &'a AcwrConfig) -> Self {
        AcwrEngine { config }
    }

    /// Exponentially weighted moving average, seeded with the first value.
    ///
    /// EWMA_today = α × load_today + (1 - α) × EWMA_yesterday, α = 2 / (k + 1)
    pub fn ewma(loads: &[Decimal], decay_days: u16) -> Decimal {
        let Some((first, rest)) = loads.split_first() else {
            return Decimal::ZERO;
        };

        let alpha = Decimal::TWO / Decimal::from(decay_days as u32 + 1);
        let keep = Decimal::ONE - alpha;

        rest.iter()
            .fold(*first, |ewma, load| alpha * load + keep * ewma)
    }

    /// Left-pad with zeros (or keep the newest values) to exactly `window_days`
    pub fn pad_window(&self, loads: &[Decimal]) -> Vec<Decimal> {
        let window = self.config.window_days as usize;
        if loads.len() >= window {
            return loads[loads.len() - window..].to_vec();
        }

        let mut padded = vec![Decimal::ZERO; window - loads.len()];
        padded.extend_from_slice(loads);
        padded
    }

    /// Full assessment of a daily load series (oldest to newest)
    pub fn assess(&self, loads: &[Decimal]) -> AcwrAssessment {
        let window = self.pad_window(loads);
        let acute_load = Self::ewma(&window, self.config.acute_decay_days);
        let chronic_load = Self::ewma(&window, self.config.chronic_decay_days);

        let days_with_load = window.iter().filter(|l| !l.is_zero()).count();
        let sufficient_history = days_with_load >= self.config.min_history_days as usize;

        let ratio = if !sufficient_history || chronic_load < self.config.min_chronic_load {
            Decimal::ONE
        } else {
            acute_load / chronic_load
        };

        let penalty = self.penalty(ratio);
        let zone = self.zone(ratio);

        tracing::debug!(
            %ratio,
            %penalty,
            %zone,
            days_with_load,
            "acwr assessed"
        );

        AcwrAssessment {
            ratio,
            penalty,
            zone,
            acute_load,
            chronic_load,
            sufficient_history,
        }
    }

    /// EWMA ratio only
    pub fn ratio(&self, loads: &[Decimal]) -> Decimal {
        self.assess(loads).ratio
    }

    /// Piecewise penalty, continuous at every zone boundary
    pub fn penalty(&self, ratio: Decimal) -> Decimal {
        let c = self.config;
        if ratio < c.undertrained_below {
            c.undertrained_penalty
        } else if ratio <= c.optimal_max {
            Decimal::ZERO
        } else if ratio <= c.caution_max {
            (ratio - c.optimal_max) / (c.caution_max - c.optimal_max) * c.caution_penalty
        } else if ratio <= c.danger_max {
            c.caution_penalty
                + (ratio - c.caution_max) / (c.danger_max - c.caution_max)
                    * (c.danger_penalty - c.caution_penalty)
        } else {
            (c.danger_penalty + (ratio - c.danger_max) * c.high_risk_slope).min(c.penalty_cap)
        }
    }

    pub fn zone(&self, ratio: Decimal) -> AcwrZone {
        let c = self.config;
        if ratio < c.undertrained_below {
            AcwrZone::Undertrained
        } else if ratio <= c.optimal_max {
            AcwrZone::Optimal
        } else if ratio <= c.caution_max {
            AcwrZone::Caution
        } else if ratio <= c.danger_max {
            AcwrZone::Danger
        } else {
            AcwrZone::HighRisk
        }
    }

    /// Rolling-window ratio used by the V1 scorer: 7-day sum over a quarter of the 28-day sum
    pub fn rolling_ratio(&self, loads: &[Decimal]) -> Decimal {
        self.assess_rolling(loads).ratio
    }

    /// Rolling-window assessment. The V1 scorer reports it but applies no penalty.
    pub fn assess_rolling(&self, loads: &[Decimal]) -> AcwrAssessment {
        let window = self.pad_window(loads);
        let acute_load: Decimal = window.iter().rev().take(7).sum();
        let chronic_load = window.iter().sum::<Decimal>() / Decimal::from(4);

        let sufficient_history = chronic_load > Decimal::ZERO;
        let ratio = if sufficient_history {
            acute_load / chronic_load
        } else {
            Decimal::ONE
        };

        AcwrAssessment {
            ratio,
            penalty: Decimal::ZERO,
            zone: self.zone(ratio),
            acute_load,
            chronic_load,
            sufficient_history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_penalty(ratio: Decimal) -> Decimal {
        let config = AcwrConfig::default();
        AcwrEngine::new(&config).penalty(ratio)
    }

    #[test]
    fn test_ewma_basics() {
        assert_eq!(AcwrEngine::ewma(&[], 7), Decimal::ZERO);
        assert_eq!(AcwrEngine::ewma(&[dec!(10)], 7), dec!(10));

        // Weighted toward the recent increase
        let result = AcwrEngine::ewma(&[dec!(10), dec!(10), dec!(10), dec!(20)], 7);
        assert_eq!(result, dec!(12.5));
    }

    #[test]
    fn test_insufficient_history_is_neutral() {
        let config = AcwrConfig::default();
        let engine = AcwrEngine::new(&config);

        let assessment = engine.assess(&[dec!(10), dec!(20), dec!(30)]);
        assert_eq!(assessment.ratio, Decimal::ONE);
        assert!(!assessment.sufficient_history);
        assert_eq!(assessment.zone, AcwrZone::Optimal);
        assert_eq!(assessment.penalty, Decimal::ZERO);

        // 28 entries but only six days carry load
        let mut sparse = vec![Decimal::ZERO; 22];
        sparse.extend([dec!(300); 6]);
        assert_eq!(engine.ratio(&sparse), Decimal::ONE);
    }

    #[test]
    fn test_steady_load_is_optimal() {
        let config = AcwrConfig::default();
        let ratio = AcwrEngine::new(&config).ratio(&[dec!(100); 28]);
        assert!((ratio - Decimal::ONE).abs() < dec!(0.0001));
    }

    #[test]
    fn test_increasing_load_is_danger() {
        let config = AcwrConfig::default();
        let loads: Vec<Decimal> = (50..78).map(Decimal::from).collect();
        let assessment = AcwrEngine::new(&config).assess(&loads);
        assert!(assessment.ratio > Decimal::ONE);
        assert!(assessment.acute_load > assessment.chronic_load);
    }

    #[test]
    fn test_decreasing_load_lowers_ratio() {
        let config = AcwrConfig::default();
        let loads: Vec<Decimal> = (73..=100).rev().map(Decimal::from).collect();
        let ratio = AcwrEngine::new(&config).ratio(&loads);
        assert!(ratio < Decimal::ONE);
    }

    #[test]
    fn test_spike_after_quiet_block() {
        let config = AcwrConfig::default();
        let mut loads = vec![dec!(40); 21];
        loads.extend([dec!(150); 7]);
        let assessment = AcwrEngine::new(&config).assess(&loads);
        assert!(assessment.ratio > dec!(1.5));
        assert!(assessment.penalty >= dec!(10));
    }

    #[test]
    fn test_penalty_boundaries() {
        assert_eq!(engine_penalty(dec!(0.7)), dec!(5));
        assert_eq!(engine_penalty(dec!(0.8)), dec!(0));
        assert_eq!(engine_penalty(dec!(1.0)), dec!(0));
        assert_eq!(engine_penalty(dec!(1.3)), dec!(0));
        assert_eq!(engine_penalty(dec!(1.4)), dec!(5));
        assert_eq!(engine_penalty(dec!(1.5)), dec!(10));
        assert_eq!(engine_penalty(dec!(1.75)), dec!(15));
        assert_eq!(engine_penalty(dec!(2.0)), dec!(20));
        assert_eq!(engine_penalty(dec!(2.39)), dec!(21.95));
        assert_eq!(engine_penalty(dec!(2.5)), dec!(22.5));
        assert_eq!(engine_penalty(dec!(3.0)), dec!(25));
        assert_eq!(engine_penalty(dec!(4.0)), dec!(25));
    }

    #[test]
    fn test_penalty_is_continuous() {
        let epsilon = dec!(0.0000001);
        for boundary in [dec!(1.3), dec!(1.5), dec!(2.0)] {
            let below = engine_penalty(boundary);
            let above = engine_penalty(boundary + epsilon);
            assert!((above - below).abs() < dec!(0.001), "jump at {}", boundary);
        }
    }

    #[test]
    fn test_zones() {
        let config = AcwrConfig::default();
        let engine = AcwrEngine::new(&config);
        assert_eq!(engine.zone(dec!(0.7)), AcwrZone::Undertrained);
        assert_eq!(engine.zone(dec!(1.0)), AcwrZone::Optimal);
        assert_eq!(engine.zone(dec!(1.4)), AcwrZone::Caution);
        assert_eq!(engine.zone(dec!(1.8)), AcwrZone::Danger);
        assert_eq!(engine.zone(dec!(2.5)), AcwrZone::HighRisk);
        assert_eq!(AcwrZone::HighRisk.to_string(), "high_risk");
    }

    #[test]
    fn test_rolling_ratio() {
        let config = AcwrConfig::default();
        let engine = AcwrEngine::new(&config);

        assert_eq!(engine.rolling_ratio(&[]), Decimal::ONE);
        assert_eq!(engine.rolling_ratio(&[dec!(50); 28]), Decimal::ONE);

        let mut loads = vec![Decimal::ZERO; 21];
        loads.extend([dec!(100); 7]);
        // 700 / (700 / 4)
        assert_eq!(engine.rolling_ratio(&loads), dec!(4));
    }

    #[test]
    fn test_padding() {
        let config = AcwrConfig::default();
        let engine = AcwrEngine::new(&config);

        let padded = engine.pad_window(&[dec!(1), dec!(2)]);
        assert_eq!(padded.len(), 28);
        assert_eq!(padded[26], dec!(1));
        assert_eq!(padded[0], Decimal::ZERO);

        let long: Vec<Decimal> = (0..40).map(Decimal::from).collect();
        let trimmed = engine.pad_window(&long);
        assert_eq!(trimmed.len(), 28);
        assert_eq!(trimmed[27], dec!(39));
    }

    #[test]
    fn test_config_validation() {
        assert!(AcwrConfig::default().validate().is_ok());

        let bad = AcwrConfig {
            acute_decay_days: 0,
            ..AcwrConfig::default()
        };
        assert!(bad.validate().is_err());

        let inverted = AcwrConfig {
            caution_max: dec!(1.2),
            ..AcwrConfig::default()
        };
        assert!(inverted.validate().is_err());
    }
}
