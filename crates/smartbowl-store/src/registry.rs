//! Registered devices.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::info;

use smartbowl_types::{Device, normalize_device_id};

use crate::error::{Error, Result};

/// In-memory registry of known devices.
///
/// Devices are stored and returned by value, so callers never share state with
/// the registry. Ids are case-insensitive and are stored lower-cased.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<String, Device>>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new device.
    ///
    /// Returns [`Error::DeviceExists`] if the id is already taken.
    pub fn add(&self, device: Device) -> Result<Device> {
        let device = normalized(device);
        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        if devices.contains_key(&device.id) {
            return Err(Error::DeviceExists(device.id));
        }
        info!("Registered device {}", device);
        devices.insert(device.id.clone(), device.clone());
        Ok(device)
    }

    /// Replace an existing device.
    ///
    /// Returns [`Error::DeviceNotFound`] if the id is unknown.
    pub fn update(&self, device: Device) -> Result<Device> {
        let device = normalized(device);
        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        match devices.get_mut(&device.id) {
            Some(existing) => {
                *existing = device.clone();
                info!("Updated device {}", device);
                Ok(device)
            }
            None => Err(Error::DeviceNotFound(device.id)),
        }
    }

    /// Whether a device with this id is registered.
    pub fn contains(&self, id: &str) -> bool {
        let devices = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        devices.contains_key(&normalize_device_id(id))
    }

    /// Copy of the device with this id.
    pub fn get(&self, id: &str) -> Option<Device> {
        let devices = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        devices.get(&normalize_device_id(id)).cloned()
    }

    /// Copies of all devices, sorted by id.
    pub fn list(&self) -> Vec<Device> {
        let devices = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        let mut list: Vec<Device> = devices.values().cloned().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    /// Number of registered devices.
    pub fn len(&self) -> usize {
        self.devices.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no devices are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalized(mut device: Device) -> Device {
    device.id = normalize_device_id(&device.id);
    device
}
