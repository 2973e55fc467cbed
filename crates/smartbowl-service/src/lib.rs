//! HTTP API for SmartBowl telemetry.
//!
//! This crate provides a service that:
//! - Accepts sample reports from bowls as plain-text lines
//! - Serves each bowl's samples as CSV, raw or rolled up per hour
//! - Tells each bowl how much of its daily ration is left
//! - Keeps a registry of known bowls
//!
//! # REST API Endpoints
//!
//! - `GET /api/health` - Service health check
//! - `GET /datasets/{id}?numEntries=&hoursBack=` - Samples as CSV
//! - `POST /datasets/{id}` - Append a `remaining,consumed,added,refills` line
//! - `DELETE /datasets/{id}` - Clear a dataset
//! - `GET /configurations/{id}?fields=&delimiter=` - Ration status as text
//! - `GET /devices`, `POST /devices` - List or register devices
//! - `GET /devices/{id}`, `PUT /devices/{id}` - Read or replace a device
//!
//! The `test` dataset is regenerated with simulated samples on every read.
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/smartbowl/server.toml`:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [storage]
//! max_entries = 30000
//!
//! [simulator]
//! sample_count = 100
//! initial_amount = 50.0
//!
//! [[devices]]
//! id = "kitchen"
//! display_name = "Kitchen bowl"
//! time_zone = "Europe/Warsaw"
//! daily_ration = 200
//! ```

pub mod api;
pub mod config;
pub mod state;

pub use config::{
    Config, ConfigError, DeviceConfig, ServerConfig, SimulatorConfig, StorageConfig,
    ValidationError,
};
pub use state::{AppState, Clock};
