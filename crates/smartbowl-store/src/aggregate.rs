//! Hourly roll-up of sample series.
//!
//! Samples are bucketed by the UTC hour of the day (0 to 23) of their
//! timestamp. Two samples taken exactly 24 hours apart therefore land in the
//! same bucket. Each bucket reduces to one sample that carries the latest
//! timestamp and remaining amount of the bucket, together with the summed
//! consumed amount, added amount and refill count.

use std::collections::BTreeMap;

use time::{Duration, OffsetDateTime};

use smartbowl_types::{Reading, Sample};

/// Roll up the samples newer than `hours_back` hours before `now`.
///
/// Samples are reduced in slice order. The result is sorted by timestamp.
/// `hours_back <= 0` yields no samples.
pub fn hourly(samples: &[Sample], hours_back: i64, now: OffsetDateTime) -> Vec<Sample> {
    if hours_back <= 0 {
        return Vec::new();
    }

    // A look-back beyond the representable range keeps everything.
    let cutoff = hours_back
        .checked_mul(3600)
        .and_then(|secs| now.checked_sub(Duration::seconds(secs)));

    let mut buckets: BTreeMap<u8, Sample> = BTreeMap::new();
    for sample in samples
        .iter()
        .filter(|s| cutoff.is_none_or(|cutoff| s.timestamp() > cutoff))
    {
        buckets
            .entry(sample.timestamp().hour())
            .and_modify(|acc| *acc = merge(acc, sample))
            .or_insert(*sample);
    }

    let mut reduced: Vec<Sample> = buckets.into_values().collect();
    reduced.sort_by_key(Sample::timestamp);
    reduced
}

/// Fold `next` into `acc`. On equal timestamps `next` wins.
fn merge(acc: &Sample, next: &Sample) -> Sample {
    let (timestamp, amount_remaining) = if next.timestamp() >= acc.timestamp() {
        (next.timestamp(), next.amount_remaining())
    } else {
        (acc.timestamp(), acc.amount_remaining())
    };

    let reading = Reading {
        amount_remaining,
        amount_consumed: acc.amount_consumed() + next.amount_consumed(),
        amount_added: acc.amount_added() + next.amount_added(),
        refill_count: acc.refill_count().saturating_add(next.refill_count()),
    };
    Sample::new(timestamp, reading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample(ts: OffsetDateTime, remaining: f64, consumed: f64, added: f64, refills: u32) -> Sample {
        Sample::new(
            ts,
            Reading::builder()
                .remaining(remaining)
                .consumed(consumed)
                .added(added)
                .refills(refills)
                .build(),
        )
    }

    const NOW: OffsetDateTime = datetime!(2017-06-03 18:00:00 UTC);

    #[test]
    fn test_empty_input() {
        assert!(hourly(&[], 24, NOW).is_empty());
    }

    #[test]
    fn test_non_positive_hours_back() {
        let samples = [sample(NOW - Duration::minutes(5), 1.0, 1.0, 0.0, 0)];
        assert!(hourly(&samples, 0, NOW).is_empty());
        assert!(hourly(&samples, -4, NOW).is_empty());
    }

    #[test]
    fn test_same_hour_reduces_to_one() {
        let samples = [
            sample(datetime!(2017-06-03 14:05:00 UTC), 40.0, 2.0, 0.0, 0),
            sample(datetime!(2017-06-03 14:45:00 UTC), 35.0, 5.0, 10.0, 1),
            sample(datetime!(2017-06-03 14:20:00 UTC), 38.0, 1.0, 0.0, 0),
        ];

        let reduced = hourly(&samples, 24, NOW);
        assert_eq!(reduced.len(), 1);
        let bucket = reduced[0];
        assert_eq!(bucket.timestamp(), datetime!(2017-06-03 14:45:00 UTC));
        assert_eq!(bucket.amount_remaining(), 35.0);
        assert_eq!(bucket.amount_consumed(), 8.0);
        assert_eq!(bucket.amount_added(), 10.0);
        assert_eq!(bucket.refill_count(), 1);
    }

    #[test]
    fn test_hour_of_day_merges_across_days() {
        let samples = [
            sample(datetime!(2017-06-02 14:00:00 UTC), 10.0, 3.0, 1.0, 1),
            sample(datetime!(2017-06-03 14:00:00 UTC), 20.0, 4.0, 2.0, 2),
        ];

        let reduced = hourly(&samples, 48, NOW);
        assert_eq!(reduced.len(), 1);
        assert_eq!(reduced[0].timestamp(), datetime!(2017-06-03 14:00:00 UTC));
        assert_eq!(reduced[0].amount_remaining(), 20.0);
        assert_eq!(reduced[0].amount_consumed(), 7.0);
        assert_eq!(reduced[0].amount_added(), 3.0);
        assert_eq!(reduced[0].refill_count(), 3);
    }

    #[test]
    fn test_cutoff_is_exclusive() {
        let samples = [
            sample(NOW - Duration::hours(2), 1.0, 1.0, 0.0, 0),
            sample(NOW - Duration::minutes(119), 2.0, 1.0, 0.0, 0),
        ];

        let reduced = hourly(&samples, 2, NOW);
        assert_eq!(reduced.len(), 1);
        assert_eq!(reduced[0].amount_remaining(), 2.0);
        assert_eq!(reduced[0].amount_consumed(), 1.0);
    }

    #[test]
    fn test_output_sorted_by_time() {
        let samples = [
            sample(datetime!(2017-06-03 17:10:00 UTC), 1.0, 0.0, 0.0, 0),
            sample(datetime!(2017-06-03 09:10:00 UTC), 2.0, 0.0, 0.0, 0),
            sample(datetime!(2017-06-02 23:10:00 UTC), 3.0, 0.0, 0.0, 0),
        ];

        let times: Vec<_> = hourly(&samples, 24, NOW)
            .iter()
            .map(Sample::timestamp)
            .collect();
        assert_eq!(
            times,
            vec![
                datetime!(2017-06-02 23:10:00 UTC),
                datetime!(2017-06-03 09:10:00 UTC),
                datetime!(2017-06-03 17:10:00 UTC),
            ]
        );
    }

    #[test]
    fn test_equal_timestamps_later_insert_wins() {
        let ts = datetime!(2017-06-03 10:00:00 UTC);
        let samples = [sample(ts, 5.0, 1.0, 0.0, 0), sample(ts, 7.0, 1.0, 0.0, 0)];

        let reduced = hourly(&samples, 24, NOW);
        assert_eq!(reduced[0].amount_remaining(), 7.0);
        assert_eq!(reduced[0].amount_consumed(), 2.0);
    }

    #[test]
    fn test_huge_look_back_keeps_everything() {
        let samples = [sample(OffsetDateTime::UNIX_EPOCH, 1.0, 1.0, 0.0, 0)];
        assert_eq!(hourly(&samples, i64::MAX, NOW).len(), 1);
    }
}
