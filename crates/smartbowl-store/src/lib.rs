//! In-memory time-series storage for SmartBowl telemetry.
//!
//! This crate keeps a bounded, append-only series of samples per device and
//! answers the queries the HTTP service needs.
//!
//! # Features
//!
//! - Bounded per-device series with oldest-first eviction
//! - Windowed and last-N retrieval, always as owned copies
//! - Hourly roll-up of recent samples
//! - Daily ration tracking in each device's own time zone
//! - CSV export in a fixed, dashboard-compatible format
//! - A registry of known devices and a random-walk sample simulator
//!
//! # Example
//!
//! ```
//! use smartbowl_store::{SampleQuery, TimeSeriesStore};
//! use smartbowl_types::Reading;
//!
//! let store = TimeSeriesStore::new();
//! let reading: Reading = "48.0,2.0".parse().unwrap();
//! store.append("kitchen", None, reading);
//!
//! let csv = store.to_csv("kitchen", &SampleQuery::All)?;
//! assert_eq!(csv.lines().count(), 2);
//! # Ok::<(), smartbowl_store::Error>(())
//! ```

pub mod aggregate;
mod error;
pub mod format;
mod queries;
pub mod ration;
mod registry;
mod simulator;
mod store;

pub use error::{Error, Result};
pub use format::{CSV_HEADER, format_amount, format_instant};
pub use queries::SampleQuery;
pub use ration::{RationField, RationStatus};
pub use registry::DeviceRegistry;
pub use simulator::{DEFAULT_INITIAL_AMOUNT, DEFAULT_SAMPLE_COUNT, Simulator};
pub use store::TimeSeriesStore;

/// Default number of samples kept per device.
pub const MAX_ENTRIES: usize = 30_000;
