use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::error::{FieldIssue, FieldProblem};
use crate::{ProviderId, TimeOfDay, ValidationError};

time::serde::format_description!(calendar_date, Date, "[year]-[month]-[day]");

/// Canonical air quality reading, whichever provider supplied it.
///
/// Concentrations are in µg/m³ as reported; a pollutant the provider did not
/// report is 0. `aqi` is the US EPA index and is absent when it could not be
/// determined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub aqi: Option<u32>,
    pub co: f64,
    pub no: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub nh3: f64,
    pub source: ProviderId,
    /// Provider's own index when it uses a different scale (OpenWeather 1..5).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_index: Option<u8>,
}

impl AirQuality {
    pub fn empty(source: ProviderId) -> Self {
        Self {
            aqi: None,
            co: 0.0,
            no: 0.0,
            no2: 0.0,
            o3: 0.0,
            so2: 0.0,
            pm2_5: 0.0,
            pm10: 0.0,
            nh3: 0.0,
            source,
            provider_index: None,
        }
    }
}

/// Nutrition facts for one food item. Missing wire fields read as 0.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionItem {
    pub name: String,
    pub calories: f64,
    pub serving_size_g: f64,
    pub fat_total_g: f64,
    pub fat_saturated_g: f64,
    pub protein_g: f64,
    pub sodium_mg: f64,
    pub potassium_mg: f64,
    pub cholesterol_mg: f64,
    pub carbohydrates_total_g: f64,
    pub fiber_g: f64,
    pub sugar_g: f64,
}

impl NutritionItem {
    /// Every quantity must be finite and non-negative; all offenders are listed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let issues = [
            ("calories", self.calories),
            ("serving_size_g", self.serving_size_g),
            ("fat_total_g", self.fat_total_g),
            ("fat_saturated_g", self.fat_saturated_g),
            ("protein_g", self.protein_g),
            ("sodium_mg", self.sodium_mg),
            ("potassium_mg", self.potassium_mg),
            ("cholesterol_mg", self.cholesterol_mg),
            ("carbohydrates_total_g", self.carbohydrates_total_g),
            ("fiber_g", self.fiber_g),
            ("sugar_g", self.sugar_g),
        ]
        .into_iter()
        .filter_map(|(field, value)| {
            non_negative_problem(value).map(|problem| FieldIssue::new(field, problem))
        })
        .collect::<Vec<_>>();

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::InvalidFields { issues })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionBatch {
    pub query: String,
    pub items: Vec<NutritionItem>,
    pub source: ProviderId,
}

/// One night of self-reported sleep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepEntry {
    #[serde(with = "calendar_date")]
    pub date: Date,
    pub bedtime: TimeOfDay,
    #[serde(alias = "wakeTime")]
    pub wake_time: TimeOfDay,
    #[serde(alias = "duration")]
    pub duration_hours: f64,
    pub quality: u8,
}

impl SleepEntry {
    pub fn new(
        date: Date,
        bedtime: TimeOfDay,
        wake_time: TimeOfDay,
        duration_hours: f64,
        quality: u8,
    ) -> Result<Self, ValidationError> {
        let entry = Self {
            date,
            bedtime,
            wake_time,
            duration_hours,
            quality,
        };
        entry.validate()?;
        Ok(entry)
    }

    /// Checks invariants on entries that arrived through deserialization.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(problem) = non_negative_problem(self.duration_hours) {
            return Err(ValidationError::InvalidFields {
                issues: vec![FieldIssue::new("duration_hours", problem)],
            });
        }
        if !(1..=5).contains(&self.quality) {
            return Err(ValidationError::InvalidSleepQuality {
                value: self.quality,
            });
        }
        Ok(())
    }
}

pub(crate) fn non_negative_problem(value: f64) -> Option<FieldProblem> {
    if !value.is_finite() {
        Some(FieldProblem::NotFinite)
    } else if value < 0.0 {
        Some(FieldProblem::Negative)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrinkKind {
    #[default]
    Water,
    Coffee,
    Tea,
    Other,
}

/// One logged drink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrationEntry {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(alias = "amount")]
    pub amount_ml: f64,
    #[serde(rename = "type", default)]
    pub drink: DrinkKind,
}

impl HydrationEntry {
    pub fn new(timestamp: OffsetDateTime, amount_ml: f64, drink: DrinkKind) -> Self {
        Self {
            timestamp,
            amount_ml,
            drink,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match non_negative_problem(self.amount_ml) {
            Some(problem) => Err(ValidationError::InvalidFields {
                issues: vec![FieldIssue::new("amount_ml", problem)],
            }),
            None => Ok(()),
        }
    }

    /// Calendar date in the entry's own offset.
    pub fn date(&self) -> Date {
        self.timestamp.date()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurement {
    #[serde(alias = "weight")]
    pub weight_kg: f64,
    #[serde(alias = "height")]
    pub height_m: f64,
}
