//! Sample selectors.
//!
//! A [`SampleQuery`] describes which samples of a series a caller wants and
//! whether they should be rolled up into hourly buckets. The HTTP layer builds
//! one from its `numEntries` / `hoursBack` parameters with
//! [`SampleQuery::from_params`].
//!
//! # Example
//!
//! ```
//! use smartbowl_store::{SampleQuery, TimeSeriesStore};
//! use smartbowl_types::Reading;
//!
//! let store = TimeSeriesStore::new();
//! store.append("kitchen", None, Reading::builder().remaining(40.0).build());
//!
//! let latest = store.query("kitchen", &SampleQuery::last_n(10));
//! assert_eq!(latest.len(), 1);
//!
//! let csv = store.to_csv("kitchen", &SampleQuery::from_params(0, 24))?;
//! assert!(csv.starts_with("time,amount,consumed,added,refills\n"));
//! # Ok::<(), smartbowl_store::Error>(())
//! ```

use core::fmt;

use time::OffsetDateTime;

/// Selects samples from a series.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SampleQuery {
    /// The whole series in insertion order.
    #[default]
    All,
    /// The last `n` samples in insertion order. `n <= 0` selects everything.
    LastN(i64),
    /// Samples strictly between `from` and `to`.
    Window {
        /// Exclusive lower bound.
        from: OffsetDateTime,
        /// Exclusive upper bound.
        to: OffsetDateTime,
    },
    /// Hourly roll-up of the samples newer than `hours_back` hours.
    Hourly {
        /// Look-back span in hours. Values `<= 0` select nothing.
        hours_back: i64,
    },
    /// No samples at all.
    Nothing,
}

impl SampleQuery {
    /// Select the last `n` samples.
    pub fn last_n(n: i64) -> Self {
        Self::LastN(n)
    }

    /// Select samples strictly between two instants.
    pub fn window(from: OffsetDateTime, to: OffsetDateTime) -> Self {
        Self::Window { from, to }
    }

    /// Roll up the last `hours_back` hours into hourly buckets.
    pub fn hourly(hours_back: i64) -> Self {
        Self::Hourly { hours_back }
    }

    /// Map the `numEntries` / `hoursBack` request parameters to a query.
    ///
    /// - `num_entries > 0`, or both zero: the last `num_entries` raw samples
    ///   (zero meaning all of them).
    /// - `num_entries == 0` with `hours_back > 0`: hourly roll-up.
    /// - Any other combination selects [`Nothing`](Self::Nothing).
    pub fn from_params(num_entries: i64, hours_back: i64) -> Self {
        match (num_entries, hours_back) {
            (n, _) if n > 0 => Self::LastN(n),
            (0, 0) => Self::LastN(0),
            (0, h) if h > 0 => Self::Hourly { hours_back: h },
            _ => Self::Nothing,
        }
    }
}

impl fmt::Display for SampleQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::LastN(n) => write!(f, "last {n}"),
            Self::Window { from, to } => write!(f, "window ({from}, {to})"),
            Self::Hourly { hours_back } => write!(f, "hourly over {hours_back}h"),
            Self::Nothing => write!(f, "nothing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_default_is_all() {
        assert_eq!(SampleQuery::default(), SampleQuery::All);
    }

    #[test]
    fn test_from_params_raw_when_entries_requested() {
        assert_eq!(SampleQuery::from_params(5, 0), SampleQuery::LastN(5));
        // numEntries wins when both are set.
        assert_eq!(SampleQuery::from_params(5, 24), SampleQuery::LastN(5));
    }

    #[test]
    fn test_from_params_both_zero_is_raw_all() {
        assert_eq!(SampleQuery::from_params(0, 0), SampleQuery::LastN(0));
    }

    #[test]
    fn test_from_params_hourly() {
        assert_eq!(
            SampleQuery::from_params(0, 24),
            SampleQuery::Hourly { hours_back: 24 }
        );
    }

    #[test]
    fn test_from_params_other_combinations_select_nothing() {
        assert_eq!(SampleQuery::from_params(0, -1), SampleQuery::Nothing);
        assert_eq!(SampleQuery::from_params(-3, 0), SampleQuery::Nothing);
        assert_eq!(SampleQuery::from_params(-3, 12), SampleQuery::Nothing);
        assert_eq!(SampleQuery::from_params(-3, -1), SampleQuery::Nothing);
    }

    #[test]
    fn test_constructors() {
        let from = datetime!(2017-06-01 00:00:00 UTC);
        let to = datetime!(2017-06-02 00:00:00 UTC);
        assert_eq!(SampleQuery::window(from, to), SampleQuery::Window { from, to });
        assert_eq!(SampleQuery::hourly(6), SampleQuery::Hourly { hours_back: 6 });
        assert_eq!(SampleQuery::last_n(2), SampleQuery::LastN(2));
    }

    #[test]
    fn test_display() {
        assert_eq!(SampleQuery::All.to_string(), "all");
        assert_eq!(SampleQuery::LastN(3).to_string(), "last 3");
        assert_eq!(SampleQuery::hourly(24).to_string(), "hourly over 24h");
        assert_eq!(SampleQuery::Nothing.to_string(), "nothing");
    }
}
