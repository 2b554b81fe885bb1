use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::Date;

use super::stats::{round_to, ThresholdLadder};
use crate::error::{FieldIssue, FieldProblem};
use crate::ValidationError;

time::serde::format_description!(footprint_date, Date, "[year]-[month]-[day]");

/// Daily activity quantities. Wire names are camelCase.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CarbonInputs {
    pub car_km: f64,
    pub public_transport_km: f64,
    pub bike_km: f64,
    pub walk_km: f64,
    pub electricity_kwh: f64,
    pub gas_usage: f64,
    pub heating_usage: f64,
    pub meat_servings: f64,
    pub dairy_servings: f64,
    pub vegetable_servings: f64,
    pub fish_servings: f64,
    pub grain_servings: f64,
}

const INPUT_FIELDS: [&str; 12] = [
    "carKm",
    "publicTransportKm",
    "bikeKm",
    "walkKm",
    "electricityKwh",
    "gasUsage",
    "heatingUsage",
    "meatServings",
    "dairyServings",
    "vegetableServings",
    "fishServings",
    "grainServings",
];

/// Validates raw inputs, reporting every offending field.
///
/// Absent fields count as 0. Every present field, known or not, must be a
/// non-negative finite number.
pub fn validate_carbon_inputs(raw: &Value) -> Result<CarbonInputs, ValidationError> {
    let Some(object) = raw.as_object() else {
        return Err(ValidationError::InvalidFields {
            issues: vec![FieldIssue::new("inputs", FieldProblem::NotAnObject)],
        });
    };

    let issues = object
        .iter()
        .filter_map(|(key, value)| {
            let problem = match value.as_f64() {
                None => Some(FieldProblem::NotNumeric),
                Some(number) if number < 0.0 => Some(FieldProblem::Negative),
                Some(_) => None,
            };
            problem.map(|problem| FieldIssue::new(key.as_str(), problem))
        })
        .collect::<Vec<_>>();

    if !issues.is_empty() {
        return Err(ValidationError::InvalidFields { issues });
    }

    let known = object
        .iter()
        .filter(|(key, _)| INPUT_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect::<serde_json::Map<_, _>>();

    serde_json::from_value(Value::Object(known)).map_err(|_| ValidationError::InvalidFields {
        issues: vec![FieldIssue::new("inputs", FieldProblem::NotNumeric)],
    })
}

/// Emission factors in kg CO2 per unit of activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionFactors {
    pub car_per_km: f64,
    pub public_transport_per_km: f64,
    pub bike_per_km: f64,
    pub walk_per_km: f64,
    pub electricity_per_kwh: f64,
    pub gas_per_unit: f64,
    pub heating_per_unit: f64,
    pub meat_per_serving: f64,
    pub dairy_per_serving: f64,
    pub vegetables_per_serving: f64,
    pub fish_per_serving: f64,
    pub grains_per_serving: f64,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        Self {
            car_per_km: 0.21,
            public_transport_per_km: 0.08,
            bike_per_km: 0.0,
            walk_per_km: 0.0,
            electricity_per_kwh: 0.5,
            gas_per_unit: 2.3,
            heating_per_unit: 0.3,
            meat_per_serving: 3.3,
            dairy_per_serving: 1.9,
            vegetables_per_serving: 0.4,
            fish_per_serving: 2.1,
            grains_per_serving: 0.9,
        }
    }
}

impl EmissionFactors {
    pub fn transport(&self, inputs: &CarbonInputs) -> f64 {
        inputs.car_km * self.car_per_km
            + inputs.public_transport_km * self.public_transport_per_km
            + inputs.bike_km * self.bike_per_km
            + inputs.walk_km * self.walk_per_km
    }

    pub fn energy(&self, inputs: &CarbonInputs) -> f64 {
        inputs.electricity_kwh * self.electricity_per_kwh
            + inputs.gas_usage * self.gas_per_unit
            + inputs.heating_usage * self.heating_per_unit
    }

    pub fn food(&self, inputs: &CarbonInputs) -> f64 {
        inputs.meat_servings * self.meat_per_serving
            + inputs.dairy_servings * self.dairy_per_serving
            + inputs.vegetable_servings * self.vegetables_per_serving
            + inputs.fish_servings * self.fish_per_serving
            + inputs.grain_servings * self.grains_per_serving
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarbonCategory {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl CarbonCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Impact",
            Self::Moderate => "Moderate Impact",
            Self::High => "High Impact",
            Self::VeryHigh => "Very High Impact",
        }
    }

    /// Daily kg CO2 bands.
    pub fn default_ladder() -> ThresholdLadder<Self> {
        ThresholdLadder::new(
            vec![(5.0, Self::Low), (15.0, Self::Moderate), (30.0, Self::High)],
            Self::VeryHigh,
        )
    }
}

impl Display for CarbonCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Daily footprint in kg CO2, sub-totals rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarbonFootprint {
    pub transport_kg: f64,
    pub energy_kg: f64,
    pub food_kg: f64,
    pub total_kg: f64,
    pub category: CarbonCategory,
    #[serde(with = "footprint_date")]
    pub date: Date,
}

pub fn calculate_carbon_footprint(
    inputs: &CarbonInputs,
    factors: &EmissionFactors,
    ladder: &ThresholdLadder<CarbonCategory>,
    date: Date,
) -> CarbonFootprint {
    let transport = factors.transport(inputs);
    let energy = factors.energy(inputs);
    let food = factors.food(inputs);
    let total = transport + energy + food;

    CarbonFootprint {
        transport_kg: round_to(transport, 2),
        energy_kg: round_to(energy, 2),
        food_kg: round_to(food, 2),
        total_kg: round_to(total, 2),
        category: ladder.classify(total),
        date,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CarbonTip {
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub impact: &'static str,
}

pub static CARBON_TIPS: [CarbonTip; 6] = [
    CarbonTip {
        icon: "🚌",
        title: "Use Public Transport",
        description: "Switch from car to bus/train for daily commutes",
        impact: "Save up to 2.3 kg CO₂ per day",
    },
    CarbonTip {
        icon: "🚴",
        title: "Bike or Walk",
        description: "Choose active transport for short distances",
        impact: "Zero emissions + health benefits",
    },
    CarbonTip {
        icon: "💡",
        title: "Energy Efficiency",
        description: "Use LED bulbs and unplug devices when not in use",
        impact: "Reduce energy footprint by 20%",
    },
    CarbonTip {
        icon: "🥬",
        title: "Plant-Based Meals",
        description: "Reduce meat consumption and eat more vegetables",
        impact: "Save 2.9 kg CO₂ per meat-free day",
    },
    CarbonTip {
        icon: "🏠",
        title: "Improve Insulation",
        description: "Better home insulation reduces heating/cooling needs",
        impact: "Cut energy use by 30%",
    },
    CarbonTip {
        icon: "♻️",
        title: "Reduce, Reuse, Recycle",
        description: "Minimize waste and choose sustainable products",
        impact: "Lower overall carbon footprint",
    },
];
