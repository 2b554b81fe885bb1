use serde::{Deserialize, Serialize};

use super::stats::capped_percentage;
use crate::NutritionItem;

/// Daily targets used for recommendations. Defaults are generic adult values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionTargets {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    pub sugar_limit_g: f64,
}

impl Default for NutritionTargets {
    fn default() -> Self {
        Self {
            calories: 2000.0,
            protein_g: 150.0,
            carbs_g: 250.0,
            fat_g: 65.0,
            fiber_g: 25.0,
            sugar_limit_g: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutritionSummary {
    pub total_calories: f64,
    pub total_protein_g: f64,
    pub total_carbs_g: f64,
    pub total_fat_g: f64,
    pub total_fiber_g: f64,
    pub total_sugar_g: f64,
}

impl NutritionSummary {
    /// Percent of each target reached, capped at 100.
    pub fn progress(&self, targets: &NutritionTargets) -> NutritionProgress {
        NutritionProgress {
            calories: capped_percentage(self.total_calories, targets.calories),
            protein: capped_percentage(self.total_protein_g, targets.protein_g),
            carbs: capped_percentage(self.total_carbs_g, targets.carbs_g),
            fat: capped_percentage(self.total_fat_g, targets.fat_g),
            fiber: capped_percentage(self.total_fiber_g, targets.fiber_g),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutritionProgress {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
}

pub fn daily_nutrition_summary(items: &[NutritionItem]) -> NutritionSummary {
    items
        .iter()
        .fold(NutritionSummary::default(), |summary, item| NutritionSummary {
            total_calories: summary.total_calories + item.calories,
            total_protein_g: summary.total_protein_g + item.protein_g,
            total_carbs_g: summary.total_carbs_g + item.carbohydrates_total_g,
            total_fat_g: summary.total_fat_g + item.fat_total_g,
            total_fiber_g: summary.total_fiber_g + item.fiber_g,
            total_sugar_g: summary.total_sugar_g + item.sugar_g,
        })
}

pub fn nutrition_recommendations(
    summary: &NutritionSummary,
    targets: &NutritionTargets,
) -> Vec<&'static str> {
    let mut recommendations = Vec::new();

    if summary.total_protein_g < targets.protein_g * 0.8 {
        recommendations
            .push("Consider adding more protein-rich foods like lean meats, beans, or nuts.");
    }
    if summary.total_fiber_g < targets.fiber_g * 0.6 {
        recommendations.push("Increase fiber intake with fruits, vegetables, and whole grains.");
    }
    if summary.total_sugar_g > targets.sugar_limit_g {
        recommendations.push("Consider reducing sugar intake for better overall health.");
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(protein_g: f64, fiber_g: f64, sugar_g: f64) -> NutritionItem {
        NutritionItem {
            name: String::from("meal"),
            calories: 500.0,
            protein_g,
            fiber_g,
            sugar_g,
            ..NutritionItem::default()
        }
    }

    #[test]
    fn sums_across_items() {
        let summary = daily_nutrition_summary(&[item(30.0, 5.0, 10.0), item(20.0, 3.0, 5.0)]);
        assert_eq!(summary.total_calories, 1000.0);
        assert_eq!(summary.total_protein_g, 50.0);
        assert_eq!(summary.total_sugar_g, 15.0);
    }

    #[test]
    fn each_shortfall_gets_its_own_message() {
        let targets = NutritionTargets::default();
        let low = daily_nutrition_summary(&[item(10.0, 2.0, 60.0)]);
        assert_eq!(nutrition_recommendations(&low, &targets).len(), 3);

        let balanced = daily_nutrition_summary(&[item(130.0, 20.0, 30.0)]);
        assert!(nutrition_recommendations(&balanced, &targets).is_empty());
    }

    #[test]
    fn empty_log_is_zero() {
        let summary = daily_nutrition_summary(&[]);
        assert_eq!(summary, NutritionSummary::default());
        assert_eq!(summary.progress(&NutritionTargets::default()).protein, 0.0);
    }
}
