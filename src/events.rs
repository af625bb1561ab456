//! Event proximity: taper boost and overreach protection around key races

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::{Event, EventPriority};

/// Score modifiers applied as a priority event approaches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventProximityConfig {
    /// A-race within `taper_days`: expect freshness
    pub a_taper_days: i64,
    pub a_taper_bonus: f64,

    /// A-race within `light_taper_days`
    pub a_light_taper_days: i64,
    pub a_light_taper_bonus: f64,

    /// A-race within `protection_days`: guard against overreaching
    pub a_protection_days: i64,
    pub a_protection_penalty: f64,

    /// B-race within `b_taper_days`
    pub b_taper_days: i64,
    pub b_taper_bonus: f64,
}

impl Default for EventProximityConfig {
    fn default() -> Self {
        EventProximityConfig {
            a_taper_days: 3,
            a_taper_bonus: 10.0,
            a_light_taper_days: 7,
            a_light_taper_bonus: 5.0,
            a_protection_days: 14,
            a_protection_penalty: -5.0,
            b_taper_days: 3,
            b_taper_bonus: 5.0,
        }
    }
}

impl EventProximityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_finite(&[
            ("event_proximity.a_taper_bonus", self.a_taper_bonus),
            ("event_proximity.a_light_taper_bonus", self.a_light_taper_bonus),
            ("event_proximity.a_protection_penalty", self.a_protection_penalty),
            ("event_proximity.b_taper_bonus", self.b_taper_bonus),
        ])?;

        if !(0 <= self.a_taper_days
            && self.a_taper_days < self.a_light_taper_days
            && self.a_light_taper_days < self.a_protection_days)
        {
            return Err(ConfigError::InvalidValue {
                field: "event_proximity".to_string(),
                reason: "A-race windows must be increasing".to_string(),
            });
        }
        if self.b_taper_days < 0 {
            return Err(ConfigError::InvalidValue {
                field: "event_proximity.b_taper_days".to_string(),
                reason: "must be non-negative".to_string(),
            });
        }
        Ok(())
    }
}

pub struct EventProximityEngine<'a> {
    config: &'a EventProximityConfig,
}

impl<'a> EventProximityEngine<'a> {
    pub fn new(config: &'a EventProximityConfig) -> Self {
        EventProximityEngine { config }
    }

    /// Modifier for the next priority event. First matching rule wins.
    pub fn modifier(&self, days_to_event: Option<i64>, priority: Option<EventPriority>) -> f64 {
        let c = self.config;
        let (Some(days), Some(priority)) = (days_to_event, priority) else {
            return 0.0;
        };
        if days < 0 {
            return 0.0;
        }

        match priority {
            EventPriority::A if days <= c.a_taper_days => c.a_taper_bonus,
            EventPriority::A if days <= c.a_light_taper_days => c.a_light_taper_bonus,
            EventPriority::A if days <= c.a_protection_days => c.a_protection_penalty,
            EventPriority::B if days <= c.b_taper_days => c.b_taper_bonus,
            _ => 0.0,
        }
    }
}

/// Nearest upcoming A or B event on or after `today`.
///
/// Ties on date go to the higher priority, then to the name so the choice is stable.
pub fn next_priority_event(events: &[Event], today: NaiveDate) -> Option<&Event> {
    events
        .iter()
        .filter(|e| e.priority.is_priority() && e.date >= today)
        .min_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then(a.priority.cmp(&b.priority))
                .then_with(|| a.name.cmp(&b.name))
        })
}
