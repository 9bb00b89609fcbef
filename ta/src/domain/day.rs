//! Calendar day keys
//!
//! A [`DayKey`] is a validated UTC calendar day in `YYYY-MM-DD` form. The rollup
//! code only ever accepts a `DayKey`, so malformed dates are rejected at the
//! boundary.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Format of a day key
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Milliseconds in one day
const DAY_MS: i64 = 86_400_000;

/// A malformed day key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date '{input}', expected YYYY-MM-DD")]
pub struct DayKeyError {
    pub input: String,
}

/// A UTC calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// Parse a strict `YYYY-MM-DD` key
    pub fn parse(input: &str) -> Result<Self, DayKeyError> {
        let err = || DayKeyError {
            input: input.to_string(),
        };
        let day = NaiveDate::parse_from_str(input, DAY_KEY_FORMAT)
            .map(Self)
            .map_err(|_| err())?;
        // chrono tolerates unpadded fields and leading spaces; only the canonical form is a key
        if day.as_string() != input {
            return Err(err());
        }
        Ok(day)
    }

    /// The UTC day a Unix-millisecond timestamp falls on
    pub fn from_timestamp_ms(ms: i64) -> Self {
        let date = DateTime::<Utc>::from_timestamp_millis(ms)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
            .date_naive();
        Self(date)
    }

    /// Today in UTC
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    /// Inclusive `[start, end]` of the day in Unix milliseconds
    pub fn bounds(&self) -> (i64, i64) {
        let start = self.0.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis();
        (start, start + DAY_MS - 1)
    }

    /// The key as stored, `YYYY-MM-DD`
    pub fn as_string(&self) -> String {
        self.0.format(DAY_KEY_FORMAT).to_string()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_KEY_FORMAT))
    }
}

impl FromStr for DayKey {
    type Err = DayKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DayKey {
    type Error = DayKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DayKey> for String {
    fn from(day: DayKey) -> Self {
        day.as_string()
    }
}
