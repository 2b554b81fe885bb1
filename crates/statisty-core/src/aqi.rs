//! Piecewise-linear concentration-to-index conversion.
//!
//! A [`BreakpointTable`] maps ordered concentration ranges `[c_low, c_high]`
//! to index ranges `[i_low, i_high]`. [`interpolate`] works for any
//! single-pollutant table; the US EPA PM2.5 and PM10 tables ship as defaults.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{AirQuality, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub c_low: f64,
    pub c_high: f64,
    pub i_low: u32,
    pub i_high: u32,
}

impl Breakpoint {
    pub const fn new(c_low: f64, c_high: f64, i_low: u32, i_high: u32) -> Self {
        Self {
            c_low,
            c_high,
            i_low,
            i_high,
        }
    }
}

const PM25_EPA: [Breakpoint; 7] = [
    Breakpoint::new(0.0, 12.0, 0, 50),
    Breakpoint::new(12.1, 35.4, 51, 100),
    Breakpoint::new(35.5, 55.4, 101, 150),
    Breakpoint::new(55.5, 150.4, 151, 200),
    Breakpoint::new(150.5, 250.4, 201, 300),
    Breakpoint::new(250.5, 350.4, 301, 400),
    Breakpoint::new(350.5, 500.4, 401, 500),
];

const PM10_EPA: [Breakpoint; 7] = [
    Breakpoint::new(0.0, 54.0, 0, 50),
    Breakpoint::new(55.0, 154.0, 51, 100),
    Breakpoint::new(155.0, 254.0, 101, 150),
    Breakpoint::new(255.0, 354.0, 151, 200),
    Breakpoint::new(355.0, 424.0, 201, 300),
    Breakpoint::new(425.0, 504.0, 301, 400),
    Breakpoint::new(505.0, 604.0, 401, 500),
];

/// Ordered, non-overlapping breakpoint ranges for one pollutant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Breakpoint>", into = "Vec<Breakpoint>")]
pub struct BreakpointTable {
    ranges: Vec<Breakpoint>,
}

impl BreakpointTable {
    /// Validates and builds a table.
    ///
    /// Every range must have `c_low < c_high` and `i_low <= i_high`, and each
    /// range must start above the previous range's end.
    pub fn new(ranges: Vec<Breakpoint>) -> Result<Self, ValidationError> {
        if ranges.is_empty() {
            return Err(ValidationError::InvalidBreakpoints {
                reason: "table must contain at least one range",
            });
        }
        for range in &ranges {
            if !(range.c_low.is_finite() && range.c_high.is_finite()) || range.c_low >= range.c_high
            {
                return Err(ValidationError::InvalidBreakpoints {
                    reason: "concentration range must be finite and increasing",
                });
            }
            if range.i_low > range.i_high {
                return Err(ValidationError::InvalidBreakpoints {
                    reason: "index range must not decrease",
                });
            }
        }
        for pair in ranges.windows(2) {
            if pair[1].c_low <= pair[0].c_high || pair[1].i_low < pair[0].i_high {
                return Err(ValidationError::InvalidBreakpoints {
                    reason: "ranges must be ordered and must not overlap",
                });
            }
        }
        Ok(Self { ranges })
    }

    /// US EPA PM2.5 table (µg/m³, 24-hour).
    pub fn pm25() -> Self {
        Self {
            ranges: PM25_EPA.to_vec(),
        }
    }

    /// US EPA PM10 table (µg/m³, 24-hour).
    pub fn pm10() -> Self {
        Self {
            ranges: PM10_EPA.to_vec(),
        }
    }

    pub fn ranges(&self) -> &[Breakpoint] {
        &self.ranges
    }

    /// Index returned for concentrations above the last range.
    pub fn max_index(&self) -> u32 {
        self.ranges.last().map_or(0, |range| range.i_high)
    }

    fn min_index(&self) -> u32 {
        self.ranges.first().map_or(0, |range| range.i_low)
    }
}

impl TryFrom<Vec<Breakpoint>> for BreakpointTable {
    type Error = ValidationError;

    fn try_from(value: Vec<Breakpoint>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BreakpointTable> for Vec<Breakpoint> {
    fn from(value: BreakpointTable) -> Self {
        value.ranges
    }
}

/// Converts a concentration into an index using `table`.
///
/// Inside a range the index is linearly interpolated and rounded to the
/// nearest integer. Values falling in the gap between two ranges are clamped
/// to the upper range's `i_low`. Above the last range the result saturates at
/// [`BreakpointTable::max_index`]. Negative or NaN input yields the first
/// range's `i_low`.
pub fn interpolate(concentration: f64, table: &BreakpointTable) -> u32 {
    if concentration.is_nan() {
        return table.min_index();
    }

    for range in table.ranges() {
        if concentration > range.c_high {
            continue;
        }
        if concentration < range.c_low {
            return range.i_low;
        }
        let slope = f64::from(range.i_high - range.i_low) / (range.c_high - range.c_low);
        let index = slope * (concentration - range.c_low) + f64::from(range.i_low);
        return index.round() as u32;
    }

    table.max_index()
}

/// US EPA AQI category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub const fn from_aqi(aqi: u32) -> Self {
        match aqi {
            0..=50 => Self::Good,
            51..=100 => Self::Moderate,
            101..=150 => Self::UnhealthyForSensitiveGroups,
            151..=200 => Self::Unhealthy,
            201..=300 => Self::VeryUnhealthy,
            _ => Self::Hazardous,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very Unhealthy",
            Self::Hazardous => "Hazardous",
        }
    }

    /// Hex colour used on the EPA scale.
    pub const fn color(self) -> &'static str {
        match self {
            Self::Good => "#00E400",
            Self::Moderate => "#FFFF00",
            Self::UnhealthyForSensitiveGroups => "#FF7E00",
            Self::Unhealthy => "#FF0000",
            Self::VeryUnhealthy => "#8F3F97",
            Self::Hazardous => "#7E0023",
        }
    }

    pub const fn health_recommendation(self) -> &'static str {
        match self {
            Self::Good => "Air quality is good. Great day for outdoor activities!",
            Self::Moderate => {
                "Air quality is moderate. Sensitive individuals should consider limiting prolonged outdoor activities."
            }
            Self::UnhealthyForSensitiveGroups => {
                "Unhealthy for sensitive groups. Children, elderly, and people with respiratory conditions should limit outdoor activities."
            }
            Self::Unhealthy => {
                "Unhealthy air quality. Everyone should limit outdoor activities and consider wearing a mask if going outside."
            }
            Self::VeryUnhealthy => {
                "Very unhealthy air quality. Avoid outdoor activities. Keep windows closed and use air purifiers if available."
            }
            Self::Hazardous => {
                "Hazardous air quality! Stay indoors, avoid outdoor activities completely, and consider relocating temporarily if possible."
            }
        }
    }
}

impl Display for AqiCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pollutant {
    #[serde(rename = "pm2_5")]
    Pm25,
    Pm10,
    O3,
    No2,
    So2,
    Co,
    No,
    Nh3,
}

impl Pollutant {
    pub const ALL: [Self; 8] = [
        Self::Pm25,
        Self::Pm10,
        Self::O3,
        Self::No2,
        Self::So2,
        Self::Co,
        Self::No,
        Self::Nh3,
    ];

    /// Upper bounds of the Low, Moderate and High bands.
    pub const fn level_thresholds(self) -> [f64; 3] {
        match self {
            Self::Pm25 => [12.0, 35.0, 55.0],
            Self::Pm10 => [54.0, 154.0, 254.0],
            Self::O3 => [54.0, 70.0, 85.0],
            Self::No2 => [53.0, 100.0, 360.0],
            Self::So2 => [35.0, 75.0, 185.0],
            Self::Co => [4.4, 9.4, 12.4],
            Self::No | Self::Nh3 => [50.0, 100.0, 150.0],
        }
    }

    pub fn concentration(self, reading: &AirQuality) -> f64 {
        match self {
            Self::Pm25 => reading.pm2_5,
            Self::Pm10 => reading.pm10,
            Self::O3 => reading.o3,
            Self::No2 => reading.no2,
            Self::So2 => reading.so2,
            Self::Co => reading.co,
            Self::No => reading.no,
            Self::Nh3 => reading.nh3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollutantLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

pub fn pollutant_level(value: f64, pollutant: Pollutant) -> PollutantLevel {
    let [low, moderate, high] = pollutant.level_thresholds();
    if value <= low {
        PollutantLevel::Low
    } else if value <= moderate {
        PollutantLevel::Moderate
    } else if value <= high {
        PollutantLevel::High
    } else {
        PollutantLevel::VeryHigh
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantReading {
    pub pollutant: Pollutant,
    pub value: f64,
    pub level: PollutantLevel,
}

/// Reading plus the derived category, advice and per-pollutant bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityReport {
    pub reading: AirQuality,
    pub category: Option<AqiCategory>,
    /// EPA scale colour for the category.
    pub color: Option<String>,
    pub recommendation: Option<String>,
    pub pollutants: Vec<PollutantReading>,
}

impl AirQualityReport {
    pub fn from_reading(reading: AirQuality) -> Self {
        let category = reading.aqi.map(AqiCategory::from_aqi);
        let pollutants = Pollutant::ALL
            .into_iter()
            .map(|pollutant| {
                let value = pollutant.concentration(&reading);
                PollutantReading {
                    pollutant,
                    value,
                    level: pollutant_level(value, pollutant),
                }
            })
            .collect();

        Self {
            category,
            color: category.map(|category| category.color().to_owned()),
            recommendation: category.map(|category| category.health_recommendation().to_owned()),
            pollutants,
            reading,
        }
    }
}
