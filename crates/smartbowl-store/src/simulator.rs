//! Synthetic sample generation for demos and manual testing.
//!
//! The [`Simulator`] produces a plausible random walk of a bowl being eaten
//! from and occasionally topped up, spread over a look-back window ending now.
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use smartbowl_store::{Simulator, TimeSeriesStore};
//! use time::OffsetDateTime;
//!
//! let store = TimeSeriesStore::new();
//! let mut rng = StdRng::seed_from_u64(7);
//! let simulator = Simulator::new().sample_count(20);
//!
//! let added = simulator.fill_with(&store, "test", 6, OffsetDateTime::now_utc(), &mut rng);
//! assert_eq!(added, 20);
//! assert_eq!(store.len("test"), 20);
//! ```

use rand::Rng;
use time::OffsetDateTime;
use tracing::info;

use smartbowl_types::{Reading, Sample};

use crate::store::TimeSeriesStore;

/// Default number of samples generated per fill.
pub const DEFAULT_SAMPLE_COUNT: usize = 100;

/// Default starting amount in the bowl.
pub const DEFAULT_INITIAL_AMOUNT: f64 = 50.0;

/// Look-back span used when none is requested.
const DEFAULT_SPAN_HOURS: i64 = 24;

/// Random-walk generator for bowl samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simulator {
    sample_count: usize,
    initial_amount: f64,
}

impl Simulator {
    /// Create a simulator with the default sample count and starting amount.
    pub fn new() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            initial_amount: DEFAULT_INITIAL_AMOUNT,
        }
    }

    /// Set how many samples each fill generates.
    #[must_use]
    pub fn sample_count(mut self, count: usize) -> Self {
        self.sample_count = count;
        self
    }

    /// Set the amount in the bowl before the first sample.
    #[must_use]
    pub fn initial_amount(mut self, amount: f64) -> Self {
        self.initial_amount = amount;
        self
    }

    /// Generate samples covering the `hours_back` hours before `now`.
    ///
    /// `hours_back <= 0` means 24 hours. Each step eats up to 10 units with
    /// probability 0.7, and when the bowl holds less than 20 it is topped up
    /// by up to 20 units with probability 0.2. Timestamps advance by a random
    /// fraction of twice the average spacing, so the series can run past
    /// `now`.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        hours_back: i64,
        now: OffsetDateTime,
    ) -> Vec<Sample> {
        if self.sample_count == 0 {
            return Vec::new();
        }

        let hours = if hours_back > 0 { hours_back } else { DEFAULT_SPAN_HOURS };
        let span = hours.saturating_mul(3600);
        let count = i64::try_from(self.sample_count).unwrap_or(i64::MAX);
        let max_increment = span.saturating_mul(2) / count;
        let mut timestamp = now.unix_timestamp().saturating_sub(span);
        let mut amount = self.initial_amount;

        let mut samples = Vec::with_capacity(self.sample_count);
        for _ in 0..self.sample_count {
            let mut consumed = if rng.random::<f64>() < 0.7 {
                rng.random::<f64>() * 10.0
            } else {
                0.0
            };
            consumed = consumed.min(amount);

            let added = if amount < 20.0 && rng.random::<f64>() < 0.2 {
                rng.random::<f64>() * 20.0
            } else {
                0.0
            };
            amount += added - consumed;

            let step = rng.random::<f64>() * max_increment as f64;
            timestamp = timestamp.saturating_add(step as i64);
            let Ok(at) = OffsetDateTime::from_unix_timestamp(timestamp) else {
                break;
            };

            let reading = Reading::builder()
                .remaining(amount)
                .consumed(consumed)
                .added(added)
                .build();
            samples.push(Sample::new(at, reading));
        }
        samples
    }

    /// Replace a device's series with freshly generated samples ending at
    /// `now`. Returns how many were generated.
    pub fn fill(
        &self,
        store: &TimeSeriesStore,
        device_id: &str,
        hours_back: i64,
        now: OffsetDateTime,
    ) -> usize {
        self.fill_with(store, device_id, hours_back, now, &mut rand::rng())
    }

    /// Like [`fill`](Self::fill) with an explicit random source.
    pub fn fill_with<R: Rng + ?Sized>(
        &self,
        store: &TimeSeriesStore,
        device_id: &str,
        hours_back: i64,
        now: OffsetDateTime,
        rng: &mut R,
    ) -> usize {
        let samples = self.generate(rng, hours_back, now);
        let count = samples.len();
        store.replace(device_id, samples);
        info!("Generated {} samples for {}", count, device_id);
        count
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}
