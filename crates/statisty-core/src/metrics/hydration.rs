use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::Date;

use super::stats::{capped_percentage, mean, round_to, share_percentage};
use crate::HydrationEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrationTargets {
    pub daily_goal_ml: f64,
    /// Daily total that counts as a consistent day in weekly stats.
    pub consistent_day_ml: f64,
}

impl Default for HydrationTargets {
    fn default() -> Self {
        Self {
            daily_goal_ml: 2000.0,
            consistent_day_ml: 1500.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HydrationSummary {
    pub total_ml: f64,
    pub goal_ml: f64,
    /// Whole percent of the goal, capped at 100.
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeeklyHydrationStats {
    pub average_daily_ml: f64,
    pub best_day_ml: f64,
    /// Whole percent of days reaching `consistent_day_ml`.
    pub consistency: f64,
    pub days: usize,
}

pub fn daily_hydration(entries: &[HydrationEntry], targets: &HydrationTargets) -> HydrationSummary {
    let total_ml = entries.iter().map(|e| e.amount_ml).sum::<f64>();
    HydrationSummary {
        total_ml,
        goal_ml: targets.daily_goal_ml,
        percentage: round_to(capped_percentage(total_ml, targets.daily_goal_ml), 0),
    }
}

/// Totals per calendar date, in each entry's own offset.
pub fn daily_totals(entries: &[HydrationEntry]) -> BTreeMap<Date, f64> {
    let mut totals = BTreeMap::new();
    for entry in entries {
        *totals.entry(entry.date()).or_insert(0.0) += entry.amount_ml;
    }
    totals
}

pub fn weekly_hydration_stats(
    entries: &[HydrationEntry],
    targets: &HydrationTargets,
) -> WeeklyHydrationStats {
    let totals = daily_totals(entries).into_values().collect::<Vec<_>>();
    if totals.is_empty() {
        return WeeklyHydrationStats::default();
    }

    let consistent = totals
        .iter()
        .filter(|total| **total >= targets.consistent_day_ml)
        .count();

    WeeklyHydrationStats {
        average_daily_ml: round_to(mean(&totals), 0),
        best_day_ml: totals.iter().copied().fold(0.0, f64::max),
        consistency: round_to(share_percentage(consistent, totals.len()), 0),
        days: totals.len(),
    }
}

pub fn hydration_recommendation(summary: &HydrationSummary) -> String {
    let remaining = summary.goal_ml - summary.total_ml;
    if remaining <= 0.0 {
        String::from("Great job! You've reached your hydration goal today!")
    } else if remaining <= 250.0 {
        format!("Almost there! Just {remaining}ml more to reach your goal.")
    } else {
        format!("Keep going! You need {remaining}ml more water today.")
    }
}
