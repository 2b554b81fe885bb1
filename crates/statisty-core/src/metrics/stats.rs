//! Small numeric helpers shared by every calculator. All of them return 0
//! for empty input instead of NaN.

use serde::{Deserialize, Serialize};

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by `n`, not `n - 1`).
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean(values);
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

/// `value / goal * 100`, capped at 100. A non-positive goal yields 0.
pub fn capped_percentage(value: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        return 0.0;
    }
    (value / goal * 100.0).min(100.0)
}

/// Share of `matching` among `total`, as a percentage.
pub fn share_percentage(matching: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    matching as f64 / total as f64 * 100.0
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Ordered upper bounds, each exclusive, with a catch-all for larger values.
///
/// `classify` returns the label of the first step whose bound is strictly
/// greater than the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdLadder<T> {
    steps: Vec<(f64, T)>,
    otherwise: T,
}

impl<T: Copy> ThresholdLadder<T> {
    pub fn new(steps: Vec<(f64, T)>, otherwise: T) -> Self {
        Self { steps, otherwise }
    }

    pub fn classify(&self, value: f64) -> T {
        self.steps
            .iter()
            .find(|(bound, _)| value < *bound)
            .map_or(self.otherwise, |(_, label)| *label)
    }
}
