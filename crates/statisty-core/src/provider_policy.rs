use std::time::Duration;

use crate::ProviderId;

const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Quota attached to a rate-limited provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    pub quota_window: Duration,
    pub quota_limit: u32,
    /// Fixed wait between admission attempts once the quota is spent.
    pub admission_backoff: Duration,
}

impl ProviderPolicy {
    pub fn openweather_default() -> Self {
        Self {
            provider_id: ProviderId::OpenWeather,
            quota_window: DAY,
            quota_limit: 1_000,
            admission_backoff: Duration::from_secs(1),
        }
    }

    pub fn calorie_ninjas_default() -> Self {
        Self {
            provider_id: ProviderId::CalorieNinjas,
            quota_window: HOUR,
            quota_limit: 100,
            admission_backoff: Duration::from_secs(1),
        }
    }

    /// Providers without a published quota are not limited locally.
    pub fn default_for(provider_id: ProviderId) -> Option<Self> {
        match provider_id {
            ProviderId::OpenWeather => Some(Self::openweather_default()),
            ProviderId::CalorieNinjas => Some(Self::calorie_ninjas_default()),
            ProviderId::OpenMeteo | ProviderId::Waqi | ProviderId::ApiNinjas => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openweather_policy_matches_free_tier() {
        let policy = ProviderPolicy::openweather_default();

        assert_eq!(policy.provider_id, ProviderId::OpenWeather);
        assert_eq!(policy.quota_window, Duration::from_secs(86_400));
        assert_eq!(policy.quota_limit, 1_000);
    }

    #[test]
    fn keyless_provider_has_no_policy() {
        assert_eq!(ProviderPolicy::default_for(ProviderId::OpenMeteo), None);
        assert_eq!(
            ProviderPolicy::default_for(ProviderId::CalorieNinjas).map(|p| p.quota_limit),
            Some(100)
        );
    }
}
