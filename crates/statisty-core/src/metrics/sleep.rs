use serde::{Deserialize, Serialize};

use super::stats::{mean, population_std_dev, round_to, share_percentage};
use crate::SleepEntry;

/// Tunable sleep thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepTargets {
    pub target_hours: f64,
    /// A night at or above this duration counts toward efficiency.
    pub efficient_hours: f64,
    /// Nights per trend window; the trend compares the last two windows.
    pub trend_window: usize,
    pub trend_threshold_hours: f64,
}

impl Default for SleepTargets {
    fn default() -> Self {
        Self {
            target_hours: 8.0,
            efficient_hours: 7.0,
            trend_window: 7,
            trend_threshold_hours: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SleepMetrics {
    /// Hours, one decimal.
    pub average_duration: f64,
    /// 1..=5 scale, one decimal.
    pub average_quality: f64,
    /// Whole percent of nights meeting `efficient_hours`.
    pub sleep_efficiency: f64,
    /// Whole percent, 100 for a perfectly regular schedule.
    pub consistency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepTrend {
    Improving,
    Declining,
    Stable,
}

pub fn sleep_metrics(entries: &[SleepEntry], targets: &SleepTargets) -> SleepMetrics {
    if entries.is_empty() {
        return SleepMetrics::default();
    }

    let durations = entries.iter().map(|e| e.duration_hours).collect::<Vec<_>>();
    let qualities = entries
        .iter()
        .map(|e| f64::from(e.quality))
        .collect::<Vec<_>>();
    let efficient = entries
        .iter()
        .filter(|e| e.duration_hours >= targets.efficient_hours)
        .count();

    // Midnight wrap is not handled: 23:30 and 00:30 are 1380 minutes apart.
    let bedtimes = minutes(entries.iter().map(|e| e.bedtime.minutes_since_midnight()));
    let wake_times = minutes(entries.iter().map(|e| e.wake_time.minutes_since_midnight()));
    let spread = (population_std_dev(&bedtimes) + population_std_dev(&wake_times)) / 2.0;

    SleepMetrics {
        average_duration: round_to(mean(&durations), 1),
        average_quality: round_to(mean(&qualities), 1),
        sleep_efficiency: round_to(share_percentage(efficient, entries.len()), 0),
        consistency: round_to((100.0 - spread).max(0.0), 0),
    }
}

fn minutes(values: impl Iterator<Item = u16>) -> Vec<f64> {
    values.map(f64::from).collect()
}

/// Compares mean duration of the most recent window against the one before.
///
/// Entries are ordered by date first. Without a full prior window the trend
/// is `Stable`.
pub fn sleep_trend(entries: &[SleepEntry], targets: &SleepTargets) -> SleepTrend {
    let window = targets.trend_window.max(1);
    if entries.len() < window * 2 {
        return SleepTrend::Stable;
    }

    let mut ordered = entries.iter().collect::<Vec<_>>();
    ordered.sort_by_key(|entry| entry.date);

    let split = ordered.len() - window;
    let average = |slice: &[&SleepEntry]| {
        mean(&slice.iter().map(|e| e.duration_hours).collect::<Vec<_>>())
    };
    let recent = average(&ordered[split..]);
    let previous = average(&ordered[split - window..split]);
    let difference = recent - previous;

    if difference > targets.trend_threshold_hours {
        SleepTrend::Improving
    } else if difference < -targets.trend_threshold_hours {
        SleepTrend::Declining
    } else {
        SleepTrend::Stable
    }
}

/// Hours short of `target_hours` per night, summed; never negative.
pub fn sleep_debt(entries: &[SleepEntry], target_hours: f64) -> f64 {
    let target = target_hours * entries.len() as f64;
    let actual = entries.iter().map(|e| e.duration_hours).sum::<f64>();
    round_to((target - actual).max(0.0), 1)
}

pub fn sleep_recommendation(metrics: &SleepMetrics) -> &'static str {
    if metrics.average_duration < 6.0 {
        "You're getting too little sleep. Aim for 7-9 hours per night for optimal health."
    } else if metrics.average_duration > 9.0 {
        "You might be oversleeping. Try to maintain 7-8 hours of sleep per night."
    } else if metrics.consistency < 70.0 {
        "Try to maintain a consistent sleep schedule by going to bed and waking up at the same time daily."
    } else if metrics.average_quality < 3.0 {
        "Focus on improving sleep quality through better sleep hygiene and environment."
    } else {
        "Great job! Your sleep patterns look healthy. Keep it up!"
    }
}
