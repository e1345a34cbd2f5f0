use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

use crate::error::{CoreError, Result};

/// UTC timestamp used for cache entries, carried as RFC3339 in
/// serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub OffsetDateTime);

impl Timestamp {
    pub fn new(datetime: OffsetDateTime) -> Self {
        Self(datetime)
    }

    pub fn inner(&self) -> &OffsetDateTime {
        &self.0
    }

    pub fn timestamp(&self) -> i64 {
        self.0.unix_timestamp()
    }

    /// Whole days elapsed between `self` and a later instant. Partial
    /// days truncate toward zero, matching calendar-day expiry.
    pub fn whole_days_until(&self, later: Timestamp) -> i64 {
        (later.0 - self.0).whole_days()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self
            .0
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(|_| fmt::Error)?;
        write!(f, "{formatted}")
    }
}

impl FromStr for Timestamp {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let datetime = OffsetDateTime::parse(s, &time::format_description::well_known::Rfc3339)
            .map_err(|e| CoreError::schema(format!("failed to parse timestamp '{s}': {e}")))?;
        Ok(Timestamp(datetime))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = self
            .0
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Timestamp::from_str(&s).map_err(serde::de::Error::custom)
    }
}

pub fn now_utc() -> Timestamp {
    Timestamp(OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn test_whole_day_difference() {
        let base = now_utc();
        let later = Timestamp(base.0 + Duration::days(3) + Duration::hours(5));
        assert_eq!(base.whole_days_until(later), 3);
    }

    #[test]
    fn test_partial_day_truncates() {
        let base = now_utc();
        let later = Timestamp(base.0 + Duration::hours(23));
        assert_eq!(base.whole_days_until(later), 0);
    }

    #[test]
    fn test_rfc3339_roundtrip() {
        let ts: Timestamp = "2026-01-15T10:30:00Z".parse().unwrap();
        assert_eq!(ts.to_string(), "2026-01-15T10:30:00Z");

        let json = serde_json::to_string(&ts).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
    }

    #[test]
    fn test_invalid_timestamp_rejected() {
        assert!("not a timestamp".parse::<Timestamp>().is_err());
    }
}
