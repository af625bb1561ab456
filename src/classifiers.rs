//! Normalises raw provider activities into [`ActivityRecord`]s
//!
//! Providers report free-form activity types and names. These are mapped onto
//! the closed [`Discipline`] set once, at the boundary, so the scoring engine
//! never sees strings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::AthleteSettings;
use crate::error::ValidationError;
use crate::models::{ActivityRecord, DimensionWeights, Discipline, IntensityZone};
use crate::training_load::estimate_load;

const HYROX_KEYWORDS: [&str; 5] = ["hyrox", "roxzone", "simulation", "sim", "functional"];

/// Provider types that may hide a Hyrox session
const FUNCTIONAL_TYPES: [&str; 2] = ["functional_training", "hiit"];

/// Activity as reported by the sync layer, before classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawActivity {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub activity_type: String,
    #[serde(default)]
    pub name: Option<String>,
    pub duration_minutes: u32,
    #[serde(default)]
    pub avg_hr: Option<u16>,
    #[serde(default)]
    pub aerobic_training_effect: Option<f64>,
    /// Provider-computed training load
    #[serde(default)]
    pub training_load: Option<Decimal>,
    #[serde(default)]
    pub body_regions: Option<DimensionWeights>,
}

fn discipline_for_type(activity_type: &str) -> Option<Discipline> {
    let discipline = match activity_type {
        "running" | "treadmill_running" | "trail_running" | "track_running" => Discipline::Run,
        "cycling" | "indoor_cycling" | "mountain_biking" | "gravel_cycling" | "virtual_ride" => {
            Discipline::Bike
        }
        "swimming" | "lap_swimming" | "open_water_swimming" => Discipline::Swim,
        "strength_training" | "weight_training" | "fitness_equipment" => Discipline::Strength,
        "functional_training" | "hiit" | "crossfit" => Discipline::Hyrox,
        "cardio" | "elliptical" | "rowing" | "other" => Discipline::Other,
        _ => return None,
    };
    Some(discipline)
}

/// Name keywords, or a functional/HIIT session of typical race-sim length
pub fn is_likely_hyrox(activity: &RawActivity) -> bool {
    let name = activity.name.as_deref().unwrap_or_default().to_lowercase();
    if HYROX_KEYWORDS.iter().any(|kw| name.contains(kw)) {
        return true;
    }

    let activity_type = activity.activity_type.to_lowercase();
    FUNCTIONAL_TYPES.contains(&activity_type.as_str())
        && (30..=120).contains(&activity.duration_minutes)
}

pub fn classify_discipline(activity: &RawActivity) -> Discipline {
    let activity_type = activity.activity_type.to_lowercase();

    if FUNCTIONAL_TYPES.contains(&activity_type.as_str()) && is_likely_hyrox(activity) {
        return Discipline::Hyrox;
    }

    if let Some(discipline) = discipline_for_type(&activity_type) {
        return discipline;
    }

    if is_likely_hyrox(activity) {
        Discipline::Hyrox
    } else {
        Discipline::Other
    }
}

/// Zone from % of max heart rate, or from aerobic training effect without HR
pub fn infer_intensity_zone(activity: &RawActivity, max_hr: u16) -> IntensityZone {
    match activity.avg_hr {
        Some(hr) if hr > 0 && max_hr > 0 => {
            let hr_percent = hr as f64 / max_hr as f64;
            if hr_percent < 0.65 {
                IntensityZone::Easy
            } else if hr_percent < 0.80 {
                IntensityZone::Moderate
            } else if hr_percent < 0.90 {
                IntensityZone::Hard
            } else {
                IntensityZone::Max
            }
        }
        _ => {
            let effect = activity.aerobic_training_effect.unwrap_or(0.0);
            if effect < 2.0 {
                IntensityZone::Easy
            } else if effect < 3.5 {
                IntensityZone::Moderate
            } else if effect < 4.5 {
                IntensityZone::Hard
            } else {
                IntensityZone::Max
            }
        }
    }
}

impl RawActivity {
    /// Classify and derive load, producing a validated record
    pub fn normalize(&self, athlete: &AthleteSettings) -> Result<ActivityRecord, ValidationError> {
        if let Some(load) = self.training_load {
            if load < Decimal::ZERO {
                return Err(ValidationError::OutOfRange {
                    field: "training_load".to_string(),
                    value: load.to_string(),
                });
            }
        }

        let discipline = classify_discipline(self);
        let intensity_zone = infer_intensity_zone(self, athlete.max_hr);
        let training_load = estimate_load(
            self.training_load,
            self.duration_minutes,
            self.avg_hr,
            intensity_zone,
            athlete,
        );

        let record = ActivityRecord {
            id: self.id.clone(),
            started_at: self.started_at,
            discipline,
            duration_minutes: self.duration_minutes,
            intensity_zone,
            training_load,
            body_regions: self.body_regions,
        };
        record.validate()?;
        Ok(record)
    }
}
