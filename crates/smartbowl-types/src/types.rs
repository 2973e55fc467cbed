//! Core types for SmartBowl telemetry.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ParseError;

/// Normalize a device identifier for use as a lookup key.
///
/// Device identifiers are case-insensitive: `Kitchen`, `KITCHEN` and
/// `kitchen` all refer to the same series and the same registry entry.
///
/// # Examples
///
/// ```
/// use smartbowl_types::normalize_device_id;
///
/// assert_eq!(normalize_device_id("Kitchen-Bowl"), "kitchen-bowl");
/// ```
#[must_use]
pub fn normalize_device_id(id: &str) -> String {
    id.to_lowercase()
}

/// The measured part of a sample report, before a timestamp is attached.
///
/// This is what a device sends on every report. The store stamps it with
/// the arrival time (or a caller-supplied time) to produce a [`Sample`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reading {
    /// Amount of food left in the bowl.
    pub amount_remaining: f64,
    /// Amount eaten since the previous report.
    pub amount_consumed: f64,
    /// Amount added since the previous report.
    pub amount_added: f64,
    /// Number of refills since the previous report.
    pub refill_count: u32,
}

impl Reading {
    /// Create a builder for constructing a `Reading` field by field.
    pub fn builder() -> ReadingBuilder {
        ReadingBuilder::default()
    }
}

impl FromStr for Reading {
    type Err = ParseError;

    /// Decode a report line of the form `remaining,consumed,added,refills`.
    ///
    /// Missing trailing fields default to zero, extra fields are ignored and
    /// whitespace around each field is trimmed.
    ///
    /// # Examples
    ///
    /// ```
    /// use smartbowl_types::Reading;
    ///
    /// let reading: Reading = "42.5, 3.0".parse().unwrap();
    /// assert_eq!(reading.amount_remaining, 42.5);
    /// assert_eq!(reading.amount_consumed, 3.0);
    /// assert_eq!(reading.amount_added, 0.0);
    /// assert_eq!(reading.refill_count, 0);
    /// ```
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        if line.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        let mut fields: Vec<&str> = line.split(',').map(str::trim).collect();
        // Trailing separators do not introduce fields.
        while fields.last().is_some_and(|f| f.is_empty()) {
            fields.pop();
        }

        let mut reading = Reading::default();
        if let Some(value) = fields.first() {
            reading.amount_remaining = parse_field("amount_remaining", value)?;
        }
        if let Some(value) = fields.get(1) {
            reading.amount_consumed = parse_field("amount_consumed", value)?;
        }
        if let Some(value) = fields.get(2) {
            reading.amount_added = parse_field("amount_added", value)?;
        }
        if let Some(value) = fields.get(3) {
            reading.refill_count = parse_field("refill_count", value)?;
        }
        Ok(reading)
    }
}

fn parse_field<T: FromStr>(field: &'static str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Builder for constructing a [`Reading`].
#[derive(Debug, Default)]
#[must_use]
pub struct ReadingBuilder {
    reading: Reading,
}

impl ReadingBuilder {
    /// Set the remaining amount.
    pub fn remaining(mut self, amount: f64) -> Self {
        self.reading.amount_remaining = amount;
        self
    }

    /// Set the consumed amount.
    pub fn consumed(mut self, amount: f64) -> Self {
        self.reading.amount_consumed = amount;
        self
    }

    /// Set the added amount.
    pub fn added(mut self, amount: f64) -> Self {
        self.reading.amount_added = amount;
        self
    }

    /// Set the refill count.
    pub fn refills(mut self, count: u32) -> Self {
        self.reading.refill_count = count;
        self
    }

    /// Build the `Reading`.
    #[must_use]
    pub fn build(self) -> Reading {
        self.reading
    }
}

/// A single timestamped observation from a bowl.
///
/// Samples are immutable once created. The timestamp always has whole-second
/// precision; any sub-second part is dropped on construction, including when
/// deserializing.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "SampleRecord"))]
pub struct Sample {
    /// When the sample was taken (UTC).
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    timestamp: OffsetDateTime,
    /// Amount of food left in the bowl.
    amount_remaining: f64,
    /// Amount eaten since the previous report.
    amount_consumed: f64,
    /// Amount added since the previous report.
    amount_added: f64,
    /// Number of refills since the previous report.
    refill_count: u32,
}

impl Sample {
    /// Create a sample from a reading taken at `timestamp`.
    pub fn new(timestamp: OffsetDateTime, reading: Reading) -> Self {
        Self {
            timestamp: truncate_to_second(timestamp),
            amount_remaining: reading.amount_remaining,
            amount_consumed: reading.amount_consumed,
            amount_added: reading.amount_added,
            refill_count: reading.refill_count,
        }
    }

    /// When the sample was taken (UTC, whole seconds).
    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// Seconds since the Unix epoch.
    pub fn unix_timestamp(&self) -> i64 {
        self.timestamp.unix_timestamp()
    }

    pub fn amount_remaining(&self) -> f64 {
        self.amount_remaining
    }

    pub fn amount_consumed(&self) -> f64 {
        self.amount_consumed
    }

    pub fn amount_added(&self) -> f64 {
        self.amount_added
    }

    pub fn refill_count(&self) -> u32 {
        self.refill_count
    }

    /// The measured values without the timestamp.
    pub fn reading(&self) -> Reading {
        Reading {
            amount_remaining: self.amount_remaining,
            amount_consumed: self.amount_consumed,
            amount_added: self.amount_added,
            refill_count: self.refill_count,
        }
    }
}

/// Wire form of a [`Sample`], normalized through [`Sample::new`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct SampleRecord {
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    amount_remaining: f64,
    amount_consumed: f64,
    amount_added: f64,
    refill_count: u32,
}

#[cfg(feature = "serde")]
impl From<SampleRecord> for Sample {
    fn from(record: SampleRecord) -> Self {
        let reading = Reading {
            amount_remaining: record.amount_remaining,
            amount_consumed: record.amount_consumed,
            amount_added: record.amount_added,
            refill_count: record.refill_count,
        };
        Sample::new(record.timestamp, reading)
    }
}

fn truncate_to_second(timestamp: OffsetDateTime) -> OffsetDateTime {
    let utc = timestamp.to_offset(time::UtcOffset::UTC);
    // Nanosecond 0 is always in range.
    utc.replace_nanosecond(0).unwrap_or(utc)
}

/// A registered bowl.
///
/// The time zone is an IANA zone name such as `Europe/Warsaw`; it decides
/// where the bowl's day starts and ends. The daily ration is in grams.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Device {
    /// Device identifier.
    pub id: String,
    /// Human readable name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub display_name: String,
    /// IANA time zone name.
    pub time_zone: String,
    /// Daily ration in grams.
    #[cfg_attr(feature = "serde", serde(default))]
    pub daily_ration: i32,
}

impl Device {
    /// Create a new device description.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        time_zone: impl Into<String>,
        daily_ration: i32,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            time_zone: time_zone.into(),
            daily_ration,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}; id = {}; daily ration = {}; time zone = {}",
            self.display_name, self.id, self.daily_ration, self.time_zone
        )
    }
}
