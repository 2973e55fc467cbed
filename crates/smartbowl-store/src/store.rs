//! Main store implementation.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use time::OffsetDateTime;
use tracing::{debug, info};

use smartbowl_types::{Reading, Sample, normalize_device_id};

use crate::MAX_ENTRIES;
use crate::aggregate;
use crate::error::{Error, Result};
use crate::format;
use crate::queries::SampleQuery;

type Series = Arc<Mutex<VecDeque<Sample>>>;

/// Bounded in-memory store holding one sample series per device.
///
/// Each series is an append-only log capped at [`capacity`](Self::capacity)
/// samples; once full, every append evicts the oldest-inserted sample.
/// Device keys are case-insensitive.
///
/// The key map sits behind a read/write lock and every series has its own
/// mutex, so appends to different devices only share the read side of the
/// map lock. All reads return owned copies.
#[derive(Debug)]
pub struct TimeSeriesStore {
    capacity: usize,
    series: RwLock<HashMap<String, Series>>,
}

impl TimeSeriesStore {
    /// Create a store holding up to [`MAX_ENTRIES`] samples per device.
    pub fn new() -> Self {
        Self {
            capacity: MAX_ENTRIES,
            series: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store with a custom per-device capacity.
    ///
    /// Returns [`Error::InvalidCapacity`] when `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        Ok(Self {
            capacity,
            series: RwLock::new(HashMap::new()),
        })
    }

    /// Maximum number of samples kept per device.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // === Write operations ===

    /// Append a reading to a device's series.
    ///
    /// The series is created on first use. Without an explicit timestamp the
    /// sample is stamped with the current UTC time. Sub-second precision is
    /// dropped either way. Returns the stored sample.
    pub fn append(
        &self,
        device_id: &str,
        timestamp: Option<OffsetDateTime>,
        reading: Reading,
    ) -> Sample {
        let sample = Sample::new(timestamp.unwrap_or_else(OffsetDateTime::now_utc), reading);
        let series = self.series_or_create(device_id);
        let mut samples = lock(&series);

        samples.push_back(sample);
        if samples.len() > self.capacity
            && let Some(evicted) = samples.pop_front()
        {
            debug!(
                "Evicted sample at {} from {} (capacity {})",
                evicted.timestamp(),
                device_id,
                self.capacity
            );
        }
        sample
    }

    /// Remove every sample of a device, keeping the (now empty) series.
    pub fn clear(&self, device_id: &str) {
        if let Some(series) = self.get_series(device_id) {
            let mut samples = lock(&series);
            let removed = samples.len();
            samples.clear();
            info!("Cleared {} samples for {}", removed, device_id);
        }
    }

    /// Swap a device's whole series for `samples` in one step.
    ///
    /// Readers see either the old series or the new one, never a mix. Only
    /// the last [`capacity`](Self::capacity) samples are kept.
    pub fn replace(&self, device_id: &str, samples: Vec<Sample>) {
        let mut samples = VecDeque::from(samples);
        let excess = samples.len().saturating_sub(self.capacity);
        samples.drain(..excess);
        let count = samples.len();

        let series = self.series_or_create(device_id);
        let previous = std::mem::replace(&mut *lock(&series), samples);
        info!(
            "Replaced {} samples for {} with {}",
            previous.len(),
            device_id,
            count
        );
    }

    // === Read operations ===

    /// Copy of the whole series in insertion order.
    pub fn all(&self, device_id: &str) -> Vec<Sample> {
        self.read(device_id, |samples| samples.iter().copied().collect())
    }

    /// Samples with `from < timestamp < to`, in insertion order.
    pub fn window(&self, device_id: &str, from: OffsetDateTime, to: OffsetDateTime) -> Vec<Sample> {
        self.read(device_id, |samples| {
            samples
                .iter()
                .filter(|s| s.timestamp() > from && s.timestamp() < to)
                .copied()
                .collect()
        })
    }

    /// The last `n` samples in insertion order. `n <= 0` returns everything.
    pub fn last_n(&self, device_id: &str, n: i64) -> Vec<Sample> {
        self.read(device_id, |samples| {
            let len = samples.len();
            let count = if n <= 0 {
                len
            } else {
                usize::try_from(n).unwrap_or(usize::MAX).min(len)
            };
            samples.iter().skip(len - count).copied().collect()
        })
    }

    /// Number of samples held for a device.
    pub fn len(&self, device_id: &str) -> usize {
        self.read(device_id, VecDeque::len)
    }

    /// Whether a device has no samples.
    pub fn is_empty(&self, device_id: &str) -> bool {
        self.len(device_id) == 0
    }


    /// Run a query against the current time.
    pub fn query(&self, device_id: &str, query: &SampleQuery) -> Vec<Sample> {
        self.query_at(device_id, query, OffsetDateTime::now_utc())
    }

    /// Run a query, treating `now` as the current time for hourly roll-ups.
    pub fn query_at(&self, device_id: &str, query: &SampleQuery, now: OffsetDateTime) -> Vec<Sample> {
        debug!("Querying {} for {}", device_id, query);
        match *query {
            SampleQuery::All => self.all(device_id),
            SampleQuery::LastN(n) => self.last_n(device_id, n),
            SampleQuery::Window { from, to } => self.window(device_id, from, to),
            SampleQuery::Hourly { hours_back } => {
                if hours_back <= 0 {
                    return Vec::new();
                }
                aggregate::hourly(&self.all(device_id), hours_back, now)
            }
            SampleQuery::Nothing => Vec::new(),
        }
    }

    /// Render the selected samples as CSV with a header row.
    pub fn to_csv(&self, device_id: &str, query: &SampleQuery) -> Result<String> {
        self.to_csv_at(device_id, query, OffsetDateTime::now_utc())
    }

    /// Like [`to_csv`](Self::to_csv) with an explicit current time.
    pub fn to_csv_at(
        &self,
        device_id: &str,
        query: &SampleQuery,
        now: OffsetDateTime,
    ) -> Result<String> {
        format::write_csv(&self.query_at(device_id, query, now))
    }

    // === Internals ===

    fn get_series(&self, device_id: &str) -> Option<Series> {
        let key = normalize_device_id(device_id);
        let map = self.series.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&key).cloned()
    }

    fn series_or_create(&self, device_id: &str) -> Series {
        if let Some(series) = self.get_series(device_id) {
            return series;
        }

        let key = normalize_device_id(device_id);
        let mut map = self.series.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(key).or_insert_with_key(|key| {
            info!("Created series for {}", key);
            Arc::new(Mutex::new(VecDeque::new()))
        }))
    }

    fn read<T: Default>(&self, device_id: &str, f: impl FnOnce(&VecDeque<Sample>) -> T) -> T {
        match self.get_series(device_id) {
            Some(series) => f(&*lock(&series)),
            None => T::default(),
        }
    }
}

impl Default for TimeSeriesStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(series: &Series) -> MutexGuard<'_, VecDeque<Sample>> {
    series.lock().unwrap_or_else(PoisonError::into_inner)
}
