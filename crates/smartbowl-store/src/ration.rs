//! Daily ration tracking.
//!
//! A device's day runs from local midnight in its own time zone to 24 hours
//! later. The ration left is the daily ration minus what was eaten since the
//! start of the day, never going below zero.
//!
//! # Example
//!
//! ```
//! use smartbowl_store::{TimeSeriesStore, ration};
//! use smartbowl_types::{Device, Reading};
//! use time::macros::datetime;
//!
//! let store = TimeSeriesStore::new();
//! let device = Device::new("kitchen", "Kitchen bowl", "UTC", 100);
//! let now = datetime!(2017-06-01 18:00:00 UTC);
//!
//! store.append(
//!     "kitchen",
//!     Some(datetime!(2017-06-01 08:00:00 UTC)),
//!     Reading::builder().consumed(30.0).build(),
//! );
//!
//! let status = ration::compute_at(&store, &device, now)?;
//! assert_eq!(status.ration_left, 70);
//! assert_eq!(status.render("rationLeft,secondsLeft", ","), "70,21600");
//! # Ok::<(), smartbowl_store::Error>(())
//! ```

use chrono::{DateTime, LocalResult, NaiveTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use smartbowl_types::{Device, Sample};

use crate::error::{Error, Result};
use crate::store::TimeSeriesStore;

/// A field that can be requested from a [`RationStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RationField {
    /// Ration left for the current day.
    RationLeft,
    /// Whole seconds until the end of the current day.
    SecondsLeft,
    /// An unrecognized name. Renders as an empty segment.
    Unknown,
}

impl RationField {
    /// Match a field name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if name.eq_ignore_ascii_case("rationLeft") {
            Self::RationLeft
        } else if name.eq_ignore_ascii_case("secondsLeft") {
            Self::SecondsLeft
        } else {
            Self::Unknown
        }
    }

    /// Parse a comma-separated list of field names.
    ///
    /// Trailing empty names are dropped, so `"rationLeft,"` requests a single
    /// field.
    pub fn parse_list(names: &str) -> Vec<Self> {
        let mut parts: Vec<&str> = names.split(',').collect();
        while parts.len() > 1 && parts.last().is_some_and(|p| p.is_empty()) {
            parts.pop();
        }
        parts.into_iter().map(Self::from_name).collect()
    }
}

/// Ration figures for one device at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RationStatus {
    /// Local midnight at the start of the day, as a UTC instant.
    pub start_of_day: OffsetDateTime,
    /// `start_of_day` plus 24 hours.
    pub end_of_day: OffsetDateTime,
    /// Amount eaten since `start_of_day`, rounded half-up.
    pub consumed: i64,
    /// `max(0, daily_ration - consumed)`.
    pub ration_left: i64,
    /// Whole seconds until `end_of_day`, truncated toward zero.
    pub seconds_left: i64,
}

impl RationStatus {
    /// Value of a single field, or `None` for [`RationField::Unknown`].
    pub fn field(&self, field: RationField) -> Option<i64> {
        match field {
            RationField::RationLeft => Some(self.ration_left),
            RationField::SecondsLeft => Some(self.seconds_left),
            RationField::Unknown => None,
        }
    }

    /// Render the requested comma-separated fields joined by `delimiter`.
    ///
    /// Unknown names produce an empty segment in their position.
    pub fn render(&self, fields: &str, delimiter: &str) -> String {
        self.render_fields(&RationField::parse_list(fields), delimiter)
    }

    /// Render already-parsed fields joined by `delimiter`.
    pub fn render_fields(&self, fields: &[RationField], delimiter: &str) -> String {
        fields
            .iter()
            .map(|&f| self.field(f).map(|v| v.to_string()).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(delimiter)
    }
}

/// Resolve an IANA time zone name.
pub fn parse_time_zone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| Error::UnknownTimeZone(name.to_string()))
}

/// Start and end of the local day containing `now`.
///
/// When local midnight falls into a daylight-saving gap the day starts at the
/// first instant after the gap. When it is ambiguous the candidate carrying
/// the offset in force at `now` is used, falling back to the earlier one.
pub fn day_bounds(
    time_zone: &str,
    now: OffsetDateTime,
) -> Result<(OffsetDateTime, OffsetDateTime)> {
    let tz = parse_time_zone(time_zone)?;
    let out_of_range = || Error::TimestampOutOfRange(now.unix_timestamp());

    let local_now = DateTime::<Utc>::from_timestamp(now.unix_timestamp(), 0)
        .ok_or_else(out_of_range)?
        .with_timezone(&tz);
    let midnight = local_now.date_naive().and_time(NaiveTime::MIN);

    let start = match tz.from_local_datetime(&midnight) {
        LocalResult::Single(start) => start,
        LocalResult::Ambiguous(earliest, latest) => {
            if latest.offset().fix() == local_now.offset().fix() {
                latest
            } else {
                earliest
            }
        }
        LocalResult::None => {
            // Read midnight with the offset in force before the transition.
            let before = midnight
                .checked_sub_signed(TimeDelta::days(1))
                .unwrap_or(midnight);
            let offset = tz.offset_from_utc_datetime(&before).fix();
            tz.from_utc_datetime(&(midnight - offset))
        }
    };

    let start =
        OffsetDateTime::from_unix_timestamp(start.timestamp()).map_err(|_| out_of_range())?;
    Ok((start, start + Duration::hours(24)))
}

/// Sum of `amount_consumed` over samples with `from < timestamp < to`,
/// rounded half-up to a whole number.
pub fn consumed_between(samples: &[Sample], from: OffsetDateTime, to: OffsetDateTime) -> i64 {
    let total: f64 = samples
        .iter()
        .filter(|s| s.timestamp() > from && s.timestamp() < to)
        .map(Sample::amount_consumed)
        .sum();
    (total + 0.5).floor() as i64
}

/// Compute ration figures from a device's zone, ration and samples.
///
/// `samples` may hold the whole series; only those within the current local
/// day before `now` count.
pub fn status(
    time_zone: &str,
    daily_ration: i32,
    samples: &[Sample],
    now: OffsetDateTime,
) -> Result<RationStatus> {
    let (start_of_day, end_of_day) = day_bounds(time_zone, now)?;
    let consumed = consumed_between(samples, start_of_day, now);

    Ok(RationStatus {
        start_of_day,
        end_of_day,
        consumed,
        ration_left: (i64::from(daily_ration) - consumed).max(0),
        seconds_left: (end_of_day - now).whole_seconds(),
    })
}

/// Compute ration figures for a registered device from the store, as of
/// `now`.
pub fn compute_at(
    store: &TimeSeriesStore,
    device: &Device,
    now: OffsetDateTime,
) -> Result<RationStatus> {
    let (start_of_day, _) = day_bounds(&device.time_zone, now)?;
    let samples = store.window(&device.id, start_of_day, now);
    let result = status(&device.time_zone, device.daily_ration, &samples, now)?;
    debug!(
        "Ration for {}: consumed {} of {}, {}s left in day",
        device.id, result.consumed, device.daily_ration, result.seconds_left
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartbowl_types::Reading;
    use time::macros::datetime;

    fn eaten(ts: OffsetDateTime, consumed: f64) -> Sample {
        Sample::new(ts, Reading::builder().consumed(consumed).build())
    }

    // --- Field parsing ---

    #[test]
    fn test_field_names_case_insensitive() {
        assert_eq!(RationField::from_name("RATIONLEFT"), RationField::RationLeft);
        assert_eq!(RationField::from_name(" secondsleft "), RationField::SecondsLeft);
        assert_eq!(RationField::from_name("bogus"), RationField::Unknown);
        assert_eq!(RationField::from_name(""), RationField::Unknown);
    }

    #[test]
    fn test_parse_list_drops_trailing_empty() {
        assert_eq!(
            RationField::parse_list("rationLeft,"),
            vec![RationField::RationLeft]
        );
        assert_eq!(RationField::parse_list(""), vec![RationField::Unknown]);
    }

    #[test]
    fn test_render_keeps_order_and_empty_segments() {
        let status = RationStatus {
            start_of_day: OffsetDateTime::UNIX_EPOCH,
            end_of_day: OffsetDateTime::UNIX_EPOCH + Duration::hours(24),
            consumed: 10,
            ration_left: 90,
            seconds_left: 3600,
        };

        assert_eq!(status.render("secondsLeft,bogus,rationLeft", ","), "3600,,90");
        assert_eq!(status.render("rationLeft,secondsLeft", ";"), "90;3600");
        assert_eq!(status.render("bogus", ","), "");
    }

    // --- Day boundaries ---

    #[test]
    fn test_day_bounds_utc() {
        let (start, end) = day_bounds("UTC", datetime!(2017-06-01 18:30:00 UTC)).unwrap();
        assert_eq!(start, datetime!(2017-06-01 00:00:00 UTC));
        assert_eq!(end, datetime!(2017-06-02 00:00:00 UTC));
    }

    #[test]
    fn test_day_bounds_uses_local_date() {
        // 23:30 UTC is already the next day in Warsaw (UTC+2 in summer).
        let (start, _) = day_bounds("Europe/Warsaw", datetime!(2017-06-01 23:30:00 UTC)).unwrap();
        assert_eq!(start, datetime!(2017-06-01 22:00:00 UTC));

        let (start, _) = day_bounds("America/New_York", datetime!(2017-06-01 02:00:00 UTC)).unwrap();
        assert_eq!(start, datetime!(2017-05-31 04:00:00 UTC));
    }

    #[test]
    fn test_day_bounds_dst_day_is_24_hours() {
        // Warsaw springs forward at 02:00 local on 2017-03-26.
        let now = datetime!(2017-03-26 12:00:00 UTC);
        let (start, end) = day_bounds("Europe/Warsaw", now).unwrap();
        assert_eq!(start, datetime!(2017-03-25 23:00:00 UTC));
        assert_eq!(end - start, Duration::hours(24));
    }

    #[test]
    fn test_day_bounds_midnight_in_gap() {
        // Havana skips 00:00 to 01:00 local on 2017-03-12 (UTC-5 to UTC-4).
        let now = datetime!(2017-03-12 15:00:00 UTC);
        let (start, _) = day_bounds("America/Havana", now).unwrap();
        assert_eq!(start, datetime!(2017-03-12 05:00:00 UTC));
    }

    #[test]
    fn test_day_bounds_ambiguous_midnight_keeps_current_offset() {
        // Havana falls back from 01:00 to 00:00 local on 2017-11-05, so
        // midnight happens at 04:00 UTC (UTC-4) and again at 05:00 UTC (UTC-5).
        let now = datetime!(2017-11-05 17:00:00 UTC);
        let (start, end) = day_bounds("America/Havana", now).unwrap();
        assert_eq!(start, datetime!(2017-11-05 05:00:00 UTC));
        assert_eq!(end, datetime!(2017-11-06 05:00:00 UTC));

        let status = status("America/Havana", 0, &[], now).unwrap();
        assert_eq!(status.seconds_left, 12 * 3600);
    }

    #[test]
    fn test_day_bounds_ambiguous_midnight_before_transition() {
        // Between the two midnights the first one is still in force.
        let now = datetime!(2017-11-05 04:30:00 UTC);
        let (start, _) = day_bounds("America/Havana", now).unwrap();
        assert_eq!(start, datetime!(2017-11-05 04:00:00 UTC));
    }

    #[test]
    fn test_unknown_time_zone() {
        let err = day_bounds("Mars/Olympus", OffsetDateTime::UNIX_EPOCH).unwrap_err();
        assert!(matches!(err, Error::UnknownTimeZone(ref name) if name == "Mars/Olympus"));
    }

    // --- Consumption ---

    #[test]
    fn test_consumed_between_rounds_half_up() {
        let from = datetime!(2017-06-01 00:00:00 UTC);
        let to = datetime!(2017-06-01 12:00:00 UTC);
        let samples = [
            eaten(datetime!(2017-06-01 01:00:00 UTC), 1.25),
            eaten(datetime!(2017-06-01 02:00:00 UTC), 1.25),
        ];
        assert_eq!(consumed_between(&samples, from, to), 3);

        let samples = [eaten(datetime!(2017-06-01 01:00:00 UTC), 2.49)];
        assert_eq!(consumed_between(&samples, from, to), 2);
    }

    #[test]
    fn test_consumed_between_excludes_bounds() {
        let from = datetime!(2017-06-01 00:00:00 UTC);
        let to = datetime!(2017-06-01 12:00:00 UTC);
        let samples = [eaten(from, 10.0), eaten(to, 10.0), eaten(from + Duration::SECOND, 1.0)];
        assert_eq!(consumed_between(&samples, from, to), 1);
    }

    #[test]
    fn test_status_ration_floor() {
        let now = datetime!(2017-06-01 12:00:00 UTC);
        let samples = [eaten(datetime!(2017-06-01 06:00:00 UTC), 150.0)];

        let status = status("UTC", 100, &samples, now).unwrap();
        assert_eq!(status.consumed, 150);
        assert_eq!(status.ration_left, 0);
    }

    #[test]
    fn test_status_ignores_yesterday() {
        let now = datetime!(2017-06-01 12:00:00 UTC);
        let samples = [
            eaten(datetime!(2017-05-31 23:59:59 UTC), 50.0),
            eaten(datetime!(2017-06-01 11:00:00 UTC), 20.0),
        ];

        let status = status("UTC", 100, &samples, now).unwrap();
        assert_eq!(status.ration_left, 80);
        assert_eq!(status.seconds_left, 12 * 3600);
    }

    #[test]
    fn test_seconds_left_truncates() {
        let now = datetime!(2017-06-01 23:59:58.750 UTC);
        let status = status("UTC", 0, &[], now).unwrap();
        assert_eq!(status.seconds_left, 1);
    }

    #[test]
    fn test_compute_reads_store() {
        let store = TimeSeriesStore::new();
        let device = Device::new("Kitchen", "Kitchen bowl", "Europe/Warsaw", 200);
        let now = datetime!(2017-06-01 10:00:00 UTC);

        for (ts, consumed) in [
            (datetime!(2017-05-31 21:00:00 UTC), 40.0),
            (datetime!(2017-05-31 23:00:00 UTC), 30.0),
            (datetime!(2017-06-01 09:00:00 UTC), 25.5),
        ] {
            store.append("kitchen", Some(ts), Reading::builder().consumed(consumed).build());
        }

        let status = compute_at(&store, &device, now).unwrap();
        assert_eq!(status.consumed, 56);
        assert_eq!(status.ration_left, 144);
        assert_eq!(status.seconds_left, 12 * 3600);
    }
}
