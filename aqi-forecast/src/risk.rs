use serde::Serialize;
use std::fmt;

/// Predicted AQI above which an alert is raised (the "Unhealthy" boundary).
pub const ALERT_THRESHOLD: f64 = 150.0;

/// Health-risk category, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map an AQI value to its category. Upper bounds are inclusive.
///
/// NaN compares false against every bound and lands in `Hazardous`.
pub fn classify(aqi: f64) -> AqiCategory {
    if aqi <= 50.0 {
        AqiCategory::Good
    } else if aqi <= 100.0 {
        AqiCategory::Moderate
    } else if aqi <= 150.0 {
        AqiCategory::UnhealthyForSensitiveGroups
    } else if aqi <= 200.0 {
        AqiCategory::Unhealthy
    } else if aqi <= 300.0 {
        AqiCategory::VeryUnhealthy
    } else {
        AqiCategory::Hazardous
    }
}

/// True iff any predicted value is strictly above [`ALERT_THRESHOLD`].
pub fn exceeds_threshold<I>(predicted: I) -> bool
where
    I: IntoIterator<Item = f64>,
{
    predicted.into_iter().any(|aqi| aqi > ALERT_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_inclusive_upper() {
        assert_eq!(classify(-5.0), AqiCategory::Good);
        assert_eq!(classify(0.0), AqiCategory::Good);
        assert_eq!(classify(50.0), AqiCategory::Good);
        assert_eq!(classify(50.0001), AqiCategory::Moderate);
        assert_eq!(classify(100.0), AqiCategory::Moderate);
        assert_eq!(classify(100.5), AqiCategory::UnhealthyForSensitiveGroups);
        assert_eq!(classify(150.0), AqiCategory::UnhealthyForSensitiveGroups);
        assert_eq!(classify(150.0001), AqiCategory::Unhealthy);
        assert_eq!(classify(200.0), AqiCategory::Unhealthy);
        assert_eq!(classify(210.0), AqiCategory::VeryUnhealthy);
        assert_eq!(classify(300.0), AqiCategory::VeryUnhealthy);
        assert_eq!(classify(300.0001), AqiCategory::Hazardous);
        assert_eq!(classify(f64::INFINITY), AqiCategory::Hazardous);
    }

    #[test]
    fn nan_is_hazardous() {
        assert_eq!(classify(f64::NAN), AqiCategory::Hazardous);
    }

    #[test]
    fn classification_is_monotonic() {
        let mut previous = classify(-1.0);
        for step in 0..4000 {
            let current = classify(f64::from(step) * 0.1);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn labels() {
        assert_eq!(
            AqiCategory::UnhealthyForSensitiveGroups.to_string(),
            "Unhealthy for Sensitive Groups"
        );
        assert_eq!(AqiCategory::VeryUnhealthy.to_string(), "Very Unhealthy");
    }

    #[test]
    fn threshold_is_strict() {
        assert!(!exceeds_threshold([40.0, 150.0]));
        assert!(exceeds_threshold([40.0, 150.0001]));
        assert!(!exceeds_threshold(Vec::new()));
    }
}
