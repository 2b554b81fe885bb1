//! # Domain Models
//!
//! Canonical types shared by the adapters, the calculators and the service.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`AirQuality`] | Normalized pollutant reading with US EPA index |
//! | [`NutritionItem`] | Nutrition facts for one food |
//! | [`NutritionBatch`] | Items returned for one food query |
//! | [`SleepEntry`] | One night of sleep |
//! | [`HydrationEntry`] | One logged drink |
//! | [`BodyMeasurement`] | Weight and height for BMI |
//! | [`TimeOfDay`] | Validated `HH:MM` wall-clock time |

mod models;
mod time_of_day;

pub use models::{
    AirQuality, BodyMeasurement, DrinkKind, HydrationEntry, NutritionBatch, NutritionItem,
    SleepEntry,
};
pub use time_of_day::TimeOfDay;
