//! Pure calculators for user-entered metrics.
//!
//! Every function here is deterministic and side-effect free. Thresholds and
//! factor tables are passed in by reference so a computation always sees one
//! fixed table. Empty input produces a zero result rather than an error.

pub mod bmi;
pub mod carbon;
pub mod hydration;
pub mod nutrition;
pub mod sleep;
pub mod stats;

pub use bmi::{calculate_bmi, calculate_bmi_with, BmiCategory, BmiResult};
pub use carbon::{
    calculate_carbon_footprint, validate_carbon_inputs, CarbonCategory, CarbonFootprint,
    CarbonInputs, CarbonTip, EmissionFactors, CARBON_TIPS,
};
pub use hydration::{
    daily_hydration, daily_totals, hydration_recommendation, weekly_hydration_stats,
    HydrationSummary, HydrationTargets, WeeklyHydrationStats,
};
pub use nutrition::{
    daily_nutrition_summary, nutrition_recommendations, NutritionProgress, NutritionSummary,
    NutritionTargets,
};
pub use sleep::{
    sleep_debt, sleep_metrics, sleep_recommendation, sleep_trend, SleepMetrics, SleepTargets,
    SleepTrend,
};
pub use stats::ThresholdLadder;
