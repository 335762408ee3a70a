//! Rate spec domain model.
//!
//! A rate spec encodes how many requests a client may make per unit of time,
//! e.g. `"2/hour"` or `"100 per minute"`.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Time unit of a rate spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl RateUnit {
    /// Length of one unit.
    pub fn duration(self) -> Duration {
        match self {
            RateUnit::Second => Duration::from_secs(1),
            RateUnit::Minute => Duration::from_secs(60),
            RateUnit::Hour => Duration::from_secs(60 * 60),
            RateUnit::Day => Duration::from_secs(24 * 60 * 60),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RateUnit::Second => "second",
            RateUnit::Minute => "minute",
            RateUnit::Hour => "hour",
            RateUnit::Day => "day",
        }
    }
}

impl fmt::Display for RateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateUnit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = s.trim().to_ascii_lowercase();
        let singular = unit.strip_suffix('s').unwrap_or(&unit);
        match singular {
            "second" => Ok(RateUnit::Second),
            "minute" => Ok(RateUnit::Minute),
            "hour" => Ok(RateUnit::Hour),
            "day" => Ok(RateUnit::Day),
            _ => Err(DomainError::InvalidRateSpec(format!(
                "unknown time unit '{}'",
                s.trim()
            ))),
        }
    }
}

/// Allowed request count per time unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RateSpec {
    count: NonZeroU32,
    unit: RateUnit,
}

impl RateSpec {
    pub fn new(count: NonZeroU32, unit: RateUnit) -> Self {
        Self { count, unit }
    }

    /// Parses `<count>/<unit>` or `<count> per <unit>`.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        let (count, unit) = match trimmed.split_once('/') {
            Some(parts) => parts,
            None => split_per(trimmed).ok_or_else(|| {
                DomainError::InvalidRateSpec(format!(
                    "expected '<count>/<unit>', got '{}'",
                    trimmed
                ))
            })?,
        };

        let count: u32 = count.trim().parse().map_err(|_| {
            DomainError::InvalidRateSpec(format!("invalid request count '{}'", count.trim()))
        })?;
        let count = NonZeroU32::new(count).ok_or_else(|| {
            DomainError::InvalidRateSpec("request count must be at least 1".into())
        })?;

        Ok(Self {
            count,
            unit: unit.parse()?,
        })
    }

    /// Requests allowed per unit.
    pub fn count(&self) -> NonZeroU32 {
        self.count
    }

    pub fn unit(&self) -> RateUnit {
        self.unit
    }

    /// Length of the window the count applies to.
    pub fn window(&self) -> Duration {
        self.unit.duration()
    }

    /// Time it takes to earn back one request.
    pub fn replenish_interval(&self) -> Duration {
        self.window() / self.count.get()
    }
}

fn split_per(raw: &str) -> Option<(&str, &str)> {
    let mut parts = raw.split_whitespace();
    let count = parts.next()?;
    if !parts.next()?.eq_ignore_ascii_case("per") {
        return None;
    }
    let unit = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((count, unit))
}

impl fmt::Display for RateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.count, self.unit)
    }
}

impl FromStr for RateSpec {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slash_form() {
        let spec = RateSpec::parse("2/hour").unwrap();
        assert_eq!(spec.count().get(), 2);
        assert_eq!(spec.unit(), RateUnit::Hour);
        assert_eq!(spec.window(), Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_per_form_and_plurals() {
        let spec = RateSpec::parse("100 per Minutes").unwrap();
        assert_eq!(spec.count().get(), 100);
        assert_eq!(spec.unit(), RateUnit::Minute);

        let spec: RateSpec = " 5 / seconds ".parse().unwrap();
        assert_eq!(spec.unit(), RateUnit::Second);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for raw in ["", "hour", "2/fortnight", "0/day", "-1/day", "x/day", "2 every hour", "2 per"] {
            assert!(
                matches!(RateSpec::parse(raw), Err(DomainError::InvalidRateSpec(_))),
                "'{}' should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_replenish_interval() {
        let spec = RateSpec::parse("4/minute").unwrap();
        assert_eq!(spec.replenish_interval(), Duration::from_secs(15));
    }

    #[test]
    fn test_display_is_canonical() {
        let spec = RateSpec::parse("3 per days").unwrap();
        assert_eq!(spec.to_string(), "3/day");
    }
}
