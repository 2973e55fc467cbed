//! Application state shared across handlers.

use std::sync::Arc;

use smartbowl_store::{DeviceRegistry, Simulator, TimeSeriesStore};
use time::OffsetDateTime;
use tracing::warn;

use crate::config::Config;

/// Source of the current time.
pub type Clock = fn() -> OffsetDateTime;

/// Shared application state.
///
/// The store and the registry synchronize internally, so handlers call them
/// directly without holding any lock of their own.
pub struct AppState {
    /// Per-device sample series.
    pub store: TimeSeriesStore,
    /// Known devices.
    pub devices: DeviceRegistry,
    /// Generator for the `test` dataset.
    pub simulator: Simulator,
    /// When the service started.
    pub started_at: OffsetDateTime,
    clock: Clock,
}

impl AppState {
    /// Create new application state.
    ///
    /// Devices listed in the configuration are registered immediately. A
    /// device that cannot be registered is logged and skipped.
    pub fn new(store: TimeSeriesStore, config: &Config) -> Arc<Self> {
        Self::with_clock(store, config, OffsetDateTime::now_utc)
    }

    /// Like [`new`](Self::new) with a custom time source.
    pub fn with_clock(store: TimeSeriesStore, config: &Config, clock: Clock) -> Arc<Self> {
        let devices = DeviceRegistry::new();
        for device in &config.devices {
            if let Err(e) = devices.add(device.to_device()) {
                warn!("Skipping configured device '{}': {}", device.id, e);
            }
        }

        Arc::new(Self {
            store,
            devices,
            simulator: config.simulator.simulator(),
            started_at: clock(),
            clock,
        })
    }

    /// The current time as seen by handlers.
    pub fn now(&self) -> OffsetDateTime {
        (self.clock)()
    }

    /// Whole seconds since the service started.
    pub fn uptime_seconds(&self) -> i64 {
        (self.now() - self.started_at).whole_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeviceConfig, SimulatorConfig};
    use time::macros::datetime;

    fn device_config(id: &str) -> DeviceConfig {
        DeviceConfig {
            id: id.to_string(),
            display_name: format!("{id} bowl"),
            time_zone: "UTC".to_string(),
            daily_ration: 100,
        }
    }

    fn fixed_clock() -> OffsetDateTime {
        datetime!(2017-06-01 12:00:00 UTC)
    }

    #[test]
    fn test_new_registers_configured_devices() {
        let config = Config {
            devices: vec![device_config("kitchen"), device_config("Porch")],
            ..Config::default()
        };
        let state = AppState::new(TimeSeriesStore::new(), &config);

        assert_eq!(state.devices.len(), 2);
        assert!(state.devices.contains("porch"));
        assert_eq!(state.devices.get("kitchen").unwrap().display_name, "kitchen bowl");
    }

    #[test]
    fn test_new_skips_duplicate_devices() {
        let config = Config {
            devices: vec![device_config("kitchen"), device_config("KITCHEN")],
            ..Config::default()
        };
        let state = AppState::new(TimeSeriesStore::new(), &config);

        assert_eq!(state.devices.len(), 1);
    }

    #[test]
    fn test_simulator_from_config() {
        let config = Config {
            simulator: SimulatorConfig {
                sample_count: 7,
                initial_amount: 12.0,
            },
            ..Config::default()
        };
        let state = AppState::new(TimeSeriesStore::new(), &config);

        assert_eq!(
            state.simulator,
            Simulator::new().sample_count(7).initial_amount(12.0)
        );
    }

    #[test]
    fn test_clock_is_injectable() {
        let state =
            AppState::with_clock(TimeSeriesStore::new(), &Config::default(), fixed_clock);

        assert_eq!(state.now(), fixed_clock());
        assert_eq!(state.started_at, fixed_clock());
        assert_eq!(state.uptime_seconds(), 0);
    }

    #[test]
    fn test_uptime_counts_from_start() {
        let state = AppState::new(TimeSeriesStore::new(), &Config::default());
        assert!(state.started_at <= OffsetDateTime::now_utc());
        assert!(state.uptime_seconds() >= 0);
    }
}
