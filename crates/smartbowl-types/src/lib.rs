//! Shared types for SmartBowl telemetry.
//!
//! This crate provides the data types exchanged between the sample store
//! (smartbowl-store) and the HTTP service (smartbowl-service).
//!
//! # Features
//!
//! - [`Reading`]: the values a bowl reports, decodable from a text line
//! - [`Sample`]: a reading stamped with its UTC time
//! - [`Device`]: a registered bowl with its time zone and daily ration
//! - Error types for payload decoding
//!
//! # Example
//!
//! ```
//! use smartbowl_types::{Reading, Sample};
//! use time::OffsetDateTime;
//!
//! let reading: Reading = "48.0,2.0,0.0,0".parse()?;
//! let sample = Sample::new(OffsetDateTime::UNIX_EPOCH, reading);
//! assert_eq!(sample.amount_consumed(), 2.0);
//! # Ok::<(), smartbowl_types::ParseError>(())
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{Device, Reading, ReadingBuilder, Sample, normalize_device_id};
