use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Duration;

use crate::ValidationError;

/// Lookback window selectable on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Range {
    #[default]
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1m")]
    OneMonth,
}

impl Range {
    pub const ALL: [Self; 3] = [Self::OneDay, Self::OneWeek, Self::OneMonth];

    /// Sampling interval used when fetching history for this range.
    ///
    /// The table is fixed here and never negotiated with the provider.
    pub const fn granularity(self) -> Granularity {
        match self {
            Self::OneDay => Granularity::FiveMinutes,
            Self::OneWeek => Granularity::FifteenMinutes,
            Self::OneMonth => Granularity::OneDay,
        }
    }

    /// Provider period string. A week is five trading days.
    pub const fn period(self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::OneWeek => "5d",
            Self::OneMonth => "1mo",
        }
    }

    /// Short label shown on the range selector.
    pub const fn label(self) -> &'static str {
        match self {
            Self::OneDay => "1D",
            Self::OneWeek => "1W",
            Self::OneMonth => "1M",
        }
    }

    /// Approximate number of bars a full trading window yields.
    pub const fn expected_points(self) -> usize {
        match self {
            // 6.5 trading hours of 5 minute bars
            Self::OneDay => 78,
            Self::OneWeek => 5 * 26,
            Self::OneMonth => 22,
        }
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Range {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1d" | "day" => Ok(Self::OneDay),
            "1w" | "5d" | "week" => Ok(Self::OneWeek),
            "1m" | "1mo" | "month" => Ok(Self::OneMonth),
            other => Err(ValidationError::InvalidRange {
                value: other.to_owned(),
            }),
        }
    }
}

/// Bar sampling interval requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1d")]
    OneDay,
}

impl Granularity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::OneDay => "1d",
        }
    }

    pub fn step(self) -> Duration {
        match self {
            Self::FiveMinutes => Duration::minutes(5),
            Self::FifteenMinutes => Duration::minutes(15),
            Self::OneDay => Duration::days(1),
        }
    }
}

impl Display for Granularity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "5m" => Ok(Self::FiveMinutes),
            "15m" => Ok(Self::FifteenMinutes),
            "1d" => Ok(Self::OneDay),
            other => Err(ValidationError::InvalidGranularity {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_maps_to_fixed_granularity() {
        assert_eq!(Range::OneDay.granularity(), Granularity::FiveMinutes);
        assert_eq!(Range::OneWeek.granularity(), Granularity::FifteenMinutes);
        assert_eq!(Range::OneMonth.granularity(), Granularity::OneDay);
    }

    #[test]
    fn granularity_mapping_is_stable_across_calls() {
        for range in Range::ALL {
            let first = range.granularity();
            for _ in 0..10 {
                assert_eq!(range.granularity(), first);
            }
        }
    }

    #[test]
    fn parses_range_aliases() {
        assert_eq!(Range::from_str("1D").expect("day"), Range::OneDay);
        assert_eq!(Range::from_str("5d").expect("week"), Range::OneWeek);
        assert_eq!(Range::from_str(" month ").expect("month"), Range::OneMonth);
        assert_eq!(Range::from_str("1m").expect("month"), Range::OneMonth);
    }

    #[test]
    fn rejects_unknown_range() {
        let err = Range::from_str("1y").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidRange { .. }));
    }

    #[test]
    fn default_range_is_one_day() {
        assert_eq!(Range::default(), Range::OneDay);
    }

    #[test]
    fn periods_match_provider_vocabulary() {
        let periods: Vec<_> = Range::ALL.iter().map(|range| range.period()).collect();
        assert_eq!(periods, ["1d", "5d", "1mo"]);
    }
}
