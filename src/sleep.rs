//! Short-term sleep debt and surplus
//!
//! A single short night is already handled by the last-night sleep component;
//! this module looks at the accumulated balance over the last three nights.
//! Fewer than three recorded nights produce no adjustment at all.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepTrendConfig {
    /// Nights that must be present before any adjustment is made
    pub nights: usize,

    /// Score points per hour of average nightly debt or surplus
    pub points_per_hour: f64,

    /// Symmetric cap on the adjustment
    pub cap: f64,
}

impl Default for SleepTrendConfig {
    fn default() -> Self {
        SleepTrendConfig {
            nights: 3,
            points_per_hour: 10.0,
            cap: 10.0,
        }
    }
}

impl SleepTrendConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nights == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sleep_trend.nights".to_string(),
                reason: "must be at least one night".to_string(),
            });
        }
        ConfigError::require_finite(&[
            ("sleep_trend.points_per_hour", self.points_per_hour),
            ("sleep_trend.cap", self.cap),
        ])?;
        if self.cap < 0.0 || self.points_per_hour < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "sleep_trend".to_string(),
                reason: "cap and slope must be non-negative".to_string(),
            });
        }
        Ok(())
    }
}

pub struct SleepTrendEngine<'a> {
    config: &'a SleepTrendConfig,
}

impl<'a> SleepTrendEngine<'a> {
    pub fn new(config: &'a SleepTrendConfig) -> Self {
        SleepTrendEngine { config }
    }

    /// Debt (negative) or surplus (positive) in hours over the most recent nights.
    ///
    /// Returns `None` when fewer than the configured number of nights exist.
    /// With more nights than needed only the newest ones count.
    pub fn balance_hours(&self, sleep_hours: &[f64], target_hours: f64) -> Option<f64> {
        let nights = self.config.nights;
        if sleep_hours.len() < nights {
            return None;
        }

        let recent = &sleep_hours[sleep_hours.len() - nights..];
        Some(recent.iter().sum::<f64>() - target_hours * nights as f64)
    }

    /// Score adjustment in `[-cap, cap]`; zero without enough nights
    pub fn adjustment(&self, sleep_hours: &[f64], target_hours: f64) -> f64 {
        match self.balance_hours(sleep_hours, target_hours) {
            Some(balance) => {
                let per_night = balance / self.config.nights as f64;
                (per_night * self.config.points_per_hour).clamp(-self.config.cap, self.config.cap)
            }
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjustment(hours: &[f64], target: f64) -> f64 {
        let config = SleepTrendConfig::default();
        SleepTrendEngine::new(&config).adjustment(hours, target)
    }

    #[test]
    fn test_insufficient_nights() {
        assert_eq!(adjustment(&[], 7.5), 0.0);
        assert_eq!(adjustment(&[7.0, 7.0], 7.5), 0.0);
        assert_eq!(adjustment(&[4.0], 7.5), 0.0);
    }

    #[test]
    fn test_on_target_is_zero() {
        assert_eq!(adjustment(&[7.5, 7.5, 7.5], 7.5), 0.0);
    }

    #[test]
    fn test_debt_and_surplus() {
        // -7.5h / 3 * 10 = -25 -> -10
        let debt = adjustment(&[5.0, 5.0, 5.0], 7.5);
        assert!(debt < 0.0);
        assert_eq!(debt, -10.0);

        // -1.5h over three nights -> -5
        let mild = adjustment(&[7.0, 7.0, 7.0], 7.5);
        assert!((mild + 5.0).abs() < 1e-9);

        let surplus = adjustment(&[8.0, 8.0, 8.0], 7.5);
        assert!((surplus - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_capped() {
        assert_eq!(adjustment(&[3.0, 3.0, 3.0], 7.5), -10.0);
        assert_eq!(adjustment(&[10.0, 10.0, 10.0], 7.5), 10.0);
    }

    #[test]
    fn test_only_newest_nights_count() {
        let config = SleepTrendConfig::default();
        let engine = SleepTrendEngine::new(&config);
        assert_eq!(engine.balance_hours(&[2.0, 7.5, 7.5, 7.5], 7.5), Some(0.0));
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_monotonic_in_total_sleep(
            a in 0.0f64..12.0,
            b in 0.0f64..12.0,
            c in 0.0f64..12.0,
            extra in 0.0f64..6.0,
            target in 5.0f64..10.0
        ) {
            let base = adjustment(&[a, b, c], target);
            let more = adjustment(&[a, b, c + extra], target);
            prop_assert!(more >= base);
            prop_assert!((-10.0..=10.0).contains(&base));
        }
    }
}
