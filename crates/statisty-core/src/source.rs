use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical identifiers for the external data providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    OpenMeteo,
    OpenWeather,
    Waqi,
    CalorieNinjas,
    ApiNinjas,
}

impl ProviderId {
    pub const ALL: [Self; 5] = [
        Self::OpenMeteo,
        Self::OpenWeather,
        Self::Waqi,
        Self::CalorieNinjas,
        Self::ApiNinjas,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenMeteo => "open_meteo",
            Self::OpenWeather => "openweather",
            Self::Waqi => "waqi",
            Self::CalorieNinjas => "calorie_ninjas",
            Self::ApiNinjas => "api_ninjas",
        }
    }

    /// Providers that can be called without any credential.
    pub const fn is_keyless(self) -> bool {
        matches!(self, Self::OpenMeteo)
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "open_meteo" | "openmeteo" => Ok(Self::OpenMeteo),
            "openweather" | "openweathermap" => Ok(Self::OpenWeather),
            "waqi" => Ok(Self::Waqi),
            "calorie_ninjas" | "calorieninjas" => Ok(Self::CalorieNinjas),
            "api_ninjas" | "apininjas" => Ok(Self::ApiNinjas),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}

/// Parses a comma-separated provider list such as `"waqi, open_meteo"`.
pub fn parse_provider_list(input: &str) -> Result<Vec<ProviderId>, ValidationError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect()
}
