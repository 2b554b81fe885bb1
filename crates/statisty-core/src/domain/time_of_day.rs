use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Wall-clock time written as `HH:MM`, stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidTimeOfDay {
            value: input.to_owned(),
        };

        let (hours, minutes) = input.trim().split_once(':').ok_or_else(invalid)?;
        let hours = hours.parse::<u16>().map_err(|_| invalid())?;
        let minutes = minutes.parse::<u16>().map_err(|_| invalid())?;
        if hours >= 24 || minutes >= 60 {
            return Err(invalid());
        }

        Ok(Self(hours * 60 + minutes))
    }

    pub const fn minutes_since_midnight(self) -> u16 {
        self.0
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for TimeOfDay {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_to_minutes_since_midnight() {
        let parsed = TimeOfDay::parse("23:05").expect("time should parse");
        assert_eq!(parsed.minutes_since_midnight(), 23 * 60 + 5);
        assert_eq!(TimeOfDay::parse("7:30").map(|t| t.to_string()), Ok("07:30".into()));
    }

    #[test]
    fn rejects_out_of_range_components() {
        assert!(TimeOfDay::parse("24:00").is_err());
        assert!(TimeOfDay::parse("12:60").is_err());
        assert!(TimeOfDay::parse("noon").is_err());
    }
}
