//! Macro training phase detection
//!
//! The current phase follows from how many weeks remain until the next A or B
//! event. Each event type has a template of half-open `[min_weeks, max_weeks)`
//! intervals; the last interval is open-ended. Templates are checked once at
//! startup to tile `[0, inf)` without gaps or overlaps, so detection itself is
//! a total function.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::ConfigError;
use crate::events::next_priority_event;
use crate::models::{Event, EventType};

/// Days the open-ended base block extends back from its end date
pub const BASE_BLOCK_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingPhase {
    Base,
    Build,
    Peak,
    Taper,
}

impl TrainingPhase {
    pub fn display_name(&self) -> &'static str {
        match self {
            TrainingPhase::Base => "Base Training",
            TrainingPhase::Build => "Build Phase",
            TrainingPhase::Peak => "Peak Phase",
            TrainingPhase::Taper => "Taper",
        }
    }
}

impl fmt::Display for TrainingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingPhase::Base => write!(f, "base"),
            TrainingPhase::Build => write!(f, "build"),
            TrainingPhase::Peak => write!(f, "peak"),
            TrainingPhase::Taper => write!(f, "taper"),
        }
    }
}

/// `[min_weeks, max_weeks)`; `max_weeks = None` is open-ended
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseInterval {
    pub phase: TrainingPhase,
    pub min_weeks: u32,
    #[serde(default)]
    pub max_weeks: Option<u32>,
}

impl PhaseInterval {
    pub fn contains(&self, weeks_out: f64) -> bool {
        let above_min = weeks_out >= self.min_weeks as f64;
        match self.max_weeks {
            Some(max) => above_min && weeks_out < max as f64,
            None => above_min,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTemplate {
    pub event_type: EventType,
    pub intervals: Vec<PhaseInterval>,
}

impl PhaseTemplate {
    fn standard(event_type: EventType, peak: u32, build: u32, base: u32) -> Self {
        PhaseTemplate {
            event_type,
            intervals: vec![
                PhaseInterval {
                    phase: TrainingPhase::Taper,
                    min_weeks: 0,
                    max_weeks: Some(peak),
                },
                PhaseInterval {
                    phase: TrainingPhase::Peak,
                    min_weeks: peak,
                    max_weeks: Some(build),
                },
                PhaseInterval {
                    phase: TrainingPhase::Build,
                    min_weeks: build,
                    max_weeks: Some(base),
                },
                PhaseInterval {
                    phase: TrainingPhase::Base,
                    min_weeks: base,
                    max_weeks: None,
                },
            ],
        }
    }

    /// Intervals sorted by `min_weeks`
    pub fn sorted_intervals(&self) -> Vec<PhaseInterval> {
        let mut intervals = self.intervals.clone();
        intervals.sort_by_key(|i| i.min_weeks);
        intervals
    }

    /// Phase whose interval contains `weeks_out`
    pub fn phase_at(&self, weeks_out: f64) -> Option<TrainingPhase> {
        self.intervals
            .iter()
            .find(|i| i.contains(weeks_out))
            .map(|i| i.phase)
    }

    /// Check that the intervals tile `[0, inf)` exactly once
    pub fn validate(&self) -> Result<(), ConfigError> {
        let malformed = |reason: String| ConfigError::MalformedPhaseTemplate {
            event_type: format!("{:?}", self.event_type),
            reason,
        };

        let intervals = self.sorted_intervals();
        let Some(first) = intervals.first() else {
            return Err(malformed("no intervals".to_string()));
        };
        if first.min_weeks != 0 {
            return Err(malformed(format!(
                "first interval starts at {} weeks, not 0",
                first.min_weeks
            )));
        }

        let mut expected_start = 0;
        for (index, interval) in intervals.iter().enumerate() {
            if interval.min_weeks != expected_start {
                return Err(malformed(format!(
                    "gap or overlap at {} weeks",
                    expected_start
                )));
            }
            match interval.max_weeks {
                Some(max) if max <= interval.min_weeks => {
                    return Err(malformed(format!(
                        "{} interval is empty",
                        interval.phase
                    )));
                }
                Some(max) => expected_start = max,
                None if index + 1 != intervals.len() => {
                    return Err(malformed(
                        "open-ended interval must come last".to_string(),
                    ));
                }
                None => return Ok(()),
            }
        }

        Err(malformed("no open-ended interval".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub templates: Vec<PhaseTemplate>,

    /// Template used for event types without their own entry
    pub default_event_type: EventType,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        PhaseConfig {
            templates: vec![
                PhaseTemplate::standard(EventType::Hyrox, 1, 3, 8),
                PhaseTemplate::standard(EventType::TriathlonHalf, 2, 4, 10),
                PhaseTemplate::standard(EventType::TriathlonFull, 2, 4, 12),
                PhaseTemplate::standard(EventType::Marathon, 2, 4, 10),
                PhaseTemplate::standard(EventType::Other, 1, 2, 6),
            ],
            default_event_type: EventType::Other,
        }
    }
}

impl PhaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for template in &self.templates {
            if !seen.insert(template.event_type) {
                return Err(ConfigError::MalformedPhaseTemplate {
                    event_type: format!("{:?}", template.event_type),
                    reason: "listed more than once".to_string(),
                });
            }
            template.validate()?;
        }

        if !seen.contains(&self.default_event_type) {
            return Err(ConfigError::MissingDefaultTemplate {
                event_type: format!("{:?}", self.default_event_type),
            });
        }
        Ok(())
    }

    /// Template for `event_type`, falling back to the default template
    pub fn template_for(&self, event_type: EventType) -> Option<&PhaseTemplate> {
        self.templates
            .iter()
            .find(|t| t.event_type == event_type)
            .or_else(|| {
                self.templates
                    .iter()
                    .find(|t| t.event_type == self.default_event_type)
            })
    }
}

/// Current phase relative to the next priority event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseStatus {
    pub phase: TrainingPhase,
    pub weeks_out: Option<f64>,
    pub event: Option<Event>,
}

/// One dated block of a generated training plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedPhase {
    pub name: String,
    pub phase: TrainingPhase,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub target_event_id: String,
}

pub struct PhaseDetector<'a> {
    config: &'a PhaseConfig,
}

impl<'a> PhaseDetector<'a> {
    pub fn new(config: &'a PhaseConfig) -> Self {
        PhaseDetector { config }
    }

    /// Phase for the nearest A/B event on or after `today`; base when there is none
    pub fn detect(&self, events: &[Event], today: NaiveDate) -> PhaseStatus {
        let Some(event) = next_priority_event(events, today) else {
            return PhaseStatus {
                phase: TrainingPhase::Base,
                weeks_out: None,
                event: None,
            };
        };

        let weeks_out = event.days_until(today) as f64 / 7.0;
        let phase = self
            .config
            .template_for(event.event_type)
            .and_then(|t| t.phase_at(weeks_out))
            .unwrap_or(TrainingPhase::Base);

        tracing::debug!(event = %event.name, weeks_out, %phase, "phase detected");

        PhaseStatus {
            phase,
            weeks_out: Some(weeks_out),
            event: Some(event.clone()),
        }
    }

    /// Dated phase blocks counting back from the event, earliest first
    pub fn generate_plan(&self, event: &Event) -> Vec<PlannedPhase> {
        let Some(template) = self.config.template_for(event.event_type) else {
            return Vec::new();
        };

        let mut plan: Vec<PlannedPhase> = template
            .intervals
            .iter()
            .map(|interval| {
                let end_date = event.date - Duration::weeks(interval.min_weeks as i64);
                let start_date = match interval.max_weeks {
                    Some(max) => event.date - Duration::weeks(max as i64),
                    None => end_date - Duration::days(BASE_BLOCK_DAYS),
                };
                PlannedPhase {
                    name: format!("{} - {}", interval.phase.display_name(), event.name),
                    phase: interval.phase,
                    start_date,
                    end_date,
                    target_event_id: event.id.clone(),
                }
            })
            .collect();

        plan.sort_by_key(|p| p.start_date);
        plan
    }
}
