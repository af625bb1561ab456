use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Largest training load accepted for a single session
pub const MAX_SESSION_LOAD: u32 = 10_000;

/// A single session cannot outlast a day
pub const MAX_SESSION_MINUTES: u32 = 24 * 60;

/// Training disciplines recognised by the scoring engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discipline {
    Run,
    Bike,
    Swim,
    Strength,
    Hyrox,
    Other,
}

impl Discipline {
    pub const ALL: [Discipline; 6] = [
        Discipline::Run,
        Discipline::Bike,
        Discipline::Swim,
        Discipline::Strength,
        Discipline::Hyrox,
        Discipline::Other,
    ];

    /// Default body-system loading for this discipline
    pub fn default_weights(&self) -> DimensionWeights {
        match self {
            Discipline::Strength => DimensionWeights::new(0.8, 0.8, 0.2, 0.7),
            Discipline::Hyrox => DimensionWeights::new(0.6, 0.9, 0.9, 0.6),
            Discipline::Run => DimensionWeights::new(0.1, 0.8, 0.8, 0.3),
            Discipline::Bike => DimensionWeights::new(0.1, 0.6, 0.7, 0.2),
            Discipline::Swim => DimensionWeights::new(0.7, 0.2, 0.6, 0.2),
            Discipline::Other => DimensionWeights::new(0.3, 0.3, 0.5, 0.2),
        }
    }

    /// Per-day recovery rate used by the legacy fatigue model
    pub fn recovery_rate(&self) -> f64 {
        match self {
            Discipline::Strength => 0.45,
            Discipline::Hyrox => 0.40,
            Discipline::Run => 0.55,
            Discipline::Bike => 0.60,
            Discipline::Swim => 0.65,
            Discipline::Other => 0.50,
        }
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discipline::Run => write!(f, "Run"),
            Discipline::Bike => write!(f, "Bike"),
            Discipline::Swim => write!(f, "Swim"),
            Discipline::Strength => write!(f, "Strength"),
            Discipline::Hyrox => write!(f, "Hyrox"),
            Discipline::Other => write!(f, "Other"),
        }
    }
}

/// Session intensity buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityZone {
    Easy,
    Moderate,
    Hard,
    Max,
}

impl IntensityZone {
    pub const ALL: [IntensityZone; 4] = [
        IntensityZone::Easy,
        IntensityZone::Moderate,
        IntensityZone::Hard,
        IntensityZone::Max,
    ];
}

impl fmt::Display for IntensityZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntensityZone::Easy => write!(f, "Easy"),
            IntensityZone::Moderate => write!(f, "Moderate"),
            IntensityZone::Hard => write!(f, "Hard"),
            IntensityZone::Max => write!(f, "Max"),
        }
    }
}

/// The four independently tracked body systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatigueDimension {
    Upper,
    Lower,
    Cardio,
    Cns,
}

impl FatigueDimension {
    pub const ALL: [FatigueDimension; 4] = [
        FatigueDimension::Upper,
        FatigueDimension::Lower,
        FatigueDimension::Cardio,
        FatigueDimension::Cns,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            FatigueDimension::Upper => "upper",
            FatigueDimension::Lower => "lower",
            FatigueDimension::Cardio => "cardio",
            FatigueDimension::Cns => "cns",
        }
    }
}

impl fmt::Display for FatigueDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// How strongly a session loads each body system (0.0 - 1.0 per dimension)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionWeights {
    pub upper: f64,
    pub lower: f64,
    pub cardio: f64,
    pub cns: f64,
}

impl DimensionWeights {
    pub const fn new(upper: f64, lower: f64, cardio: f64, cns: f64) -> Self {
        DimensionWeights {
            upper,
            lower,
            cardio,
            cns,
        }
    }

    pub fn get(&self, dimension: FatigueDimension) -> f64 {
        match dimension {
            FatigueDimension::Upper => self.upper,
            FatigueDimension::Lower => self.lower,
            FatigueDimension::Cardio => self.cardio,
            FatigueDimension::Cns => self.cns,
        }
    }
}

/// A completed training session as delivered by the sync layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Provider identifier
    pub id: String,

    /// Start time of the session
    pub started_at: DateTime<Utc>,

    pub discipline: Discipline,

    /// Duration in minutes
    pub duration_minutes: u32,

    pub intensity_zone: IntensityZone,

    /// Training load scalar (provider load, TRIMP, or duration-based estimate)
    pub training_load: Decimal,

    /// Explicit body-system loading; falls back to the discipline defaults
    #[serde(default)]
    pub body_regions: Option<DimensionWeights>,
}

impl ActivityRecord {
    /// Calendar day the session started on
    pub fn date(&self) -> NaiveDate {
        self.started_at.date_naive()
    }

    /// Body-system weights for this session
    pub fn weights(&self) -> DimensionWeights {
        self.body_regions
            .unwrap_or_else(|| self.discipline.default_weights())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.training_load < Decimal::ZERO || self.training_load > Decimal::from(MAX_SESSION_LOAD) {
            return Err(ValidationError::OutOfRange {
                field: "training_load".to_string(),
                value: self.training_load.to_string(),
            });
        }

        if self.duration_minutes > MAX_SESSION_MINUTES {
            return Err(ValidationError::OutOfRange {
                field: "duration_minutes".to_string(),
                value: self.duration_minutes.to_string(),
            });
        }

        if let Some(weights) = self.body_regions {
            for dimension in FatigueDimension::ALL {
                let w = weights.get(dimension);
                if !(0.0..=1.0).contains(&w) {
                    return Err(ValidationError::OutOfRange {
                        field: format!("body_regions.{}", dimension),
                        value: w.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// One calendar day of recovery measurements. `None` means "not measured".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub date: NaiveDate,

    /// Overnight HRV in milliseconds
    #[serde(default)]
    pub hrv: Option<f64>,

    /// Rolling 7-day HRV baseline in milliseconds
    #[serde(default)]
    pub hrv_baseline: Option<f64>,

    #[serde(default)]
    pub resting_hr: Option<u16>,

    #[serde(default)]
    pub sleep_hours: Option<f64>,

    /// Provider sleep quality score (0-100)
    #[serde(default)]
    pub sleep_score: Option<u8>,

    /// Morning body battery reading (0-100)
    #[serde(default)]
    pub body_battery_morning: Option<u8>,
}

impl HealthSnapshot {
    /// Snapshot with nothing measured
    pub fn empty(date: NaiveDate) -> Self {
        HealthSnapshot {
            date,
            hrv: None,
            hrv_baseline: None,
            resting_hr: None,
            sleep_hours: None,
            sleep_score: None,
            body_battery_morning: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [("hrv", self.hrv), ("hrv_baseline", self.hrv_baseline)] {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(ValidationError::OutOfRange {
                        field: field.to_string(),
                        value: v.to_string(),
                    });
                }
            }
        }

        if let Some(hours) = self.sleep_hours {
            if !hours.is_finite() || !(0.0..=24.0).contains(&hours) {
                return Err(ValidationError::OutOfRange {
                    field: "sleep_hours".to_string(),
                    value: hours.to_string(),
                });
            }
        }

        for (field, value) in [
            ("sleep_score", self.sleep_score),
            ("body_battery_morning", self.body_battery_morning),
        ] {
            if let Some(v) = value {
                if v > 100 {
                    return Err(ValidationError::OutOfRange {
                        field: field.to_string(),
                        value: v.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Event priority tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventPriority {
    /// Key race
    A,
    /// Important race
    B,
    /// Training race
    C,
}

impl EventPriority {
    /// A and B events drive tapering and phase detection
    pub fn is_priority(&self) -> bool {
        matches!(self, EventPriority::A | EventPriority::B)
    }
}

impl fmt::Display for EventPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventPriority::A => write!(f, "A"),
            EventPriority::B => write!(f, "B"),
            EventPriority::C => write!(f, "C"),
        }
    }
}

/// Event type, used to select a phase template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Hyrox,
    TriathlonHalf,
    TriathlonFull,
    Marathon,
    Other,
}

impl EventType {
    /// Lenient parse for collaborator-supplied strings; unknown types map to `Other`
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "hyrox" => EventType::Hyrox,
            "triathlon_half" | "70.3" | "half_ironman" => EventType::TriathlonHalf,
            "triathlon_full" | "ironman" => EventType::TriathlonFull,
            "marathon" => EventType::Marathon,
            _ => EventType::Other,
        }
    }
}

fn lenient_event_type<'de, D>(deserializer: D) -> Result<EventType, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(EventType::parse_lenient(&raw))
}

/// A user-entered race or key session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub date: NaiveDate,
    #[serde(deserialize_with = "lenient_event_type")]
    pub event_type: EventType,
    pub priority: EventPriority,
}

impl Event {
    pub fn new(
        name: impl Into<String>,
        date: NaiveDate,
        event_type: EventType,
        priority: EventPriority,
    ) -> Self {
        Event {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            date,
            event_type,
            priority,
        }
    }

    /// Whole days from `today` until the event (negative once it has passed)
    pub fn days_until(&self, today: NaiveDate) -> i64 {
        (self.date - today).num_days()
    }
}
