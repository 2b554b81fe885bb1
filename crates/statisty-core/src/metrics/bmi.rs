use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use super::stats::{round_to, ThresholdLadder};
use crate::{BodyMeasurement, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Underweight => "Underweight",
            Self::Normal => "Normal weight",
            Self::Overweight => "Overweight",
            Self::Obese => "Obese",
        }
    }

    pub fn default_ladder() -> ThresholdLadder<Self> {
        ThresholdLadder::new(
            vec![
                (18.5, Self::Underweight),
                (25.0, Self::Normal),
                (30.0, Self::Overweight),
            ],
            Self::Obese,
        )
    }
}

impl Display for BmiCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BmiResult {
    pub weight_kg: f64,
    pub height_m: f64,
    /// One decimal.
    pub bmi: f64,
    pub category: BmiCategory,
}

pub fn calculate_bmi(measurement: BodyMeasurement) -> Result<BmiResult, ValidationError> {
    calculate_bmi_with(measurement, &BmiCategory::default_ladder())
}

/// Category is taken from the unrounded value.
pub fn calculate_bmi_with(
    measurement: BodyMeasurement,
    ladder: &ThresholdLadder<BmiCategory>,
) -> Result<BmiResult, ValidationError> {
    let BodyMeasurement {
        weight_kg,
        height_m,
    } = measurement;
    for (field, value) in [("weight_kg", weight_kg), ("height_m", height_m)] {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field });
        }
        if value <= 0.0 {
            return Err(ValidationError::NonPositiveValue { field });
        }
    }

    let bmi = weight_kg / (height_m * height_m);
    Ok(BmiResult {
        weight_kg,
        height_m,
        bmi: round_to(bmi, 1),
        category: ladder.classify(bmi),
    })
}
