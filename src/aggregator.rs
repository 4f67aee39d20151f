//! Aggregator
//!
//! Read-only rollups over the registry. Recomputed from the current
//! snapshot on every call; the collection is small (tens to low hundreds
//! of devices) so no caching is warranted.

use crate::device_registry::{DeviceRegistry, DeviceStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Registry-wide counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    /// Counts per brand as stored on the devices
    pub per_brand: BTreeMap<String, usize>,
    pub ptz_capable: usize,
    pub recording: usize,
}

/// Compute rollups over the current registry snapshot
pub async fn stats(registry: &DeviceRegistry) -> RegistryStats {
    let devices = registry.list().await;

    let mut per_brand: BTreeMap<String, usize> = BTreeMap::new();
    for device in &devices {
        *per_brand.entry(device.brand.clone()).or_insert(0) += 1;
    }

    RegistryStats {
        total: devices.len(),
        online: devices
            .iter()
            .filter(|d| d.status == DeviceStatus::Online)
            .count(),
        offline: devices
            .iter()
            .filter(|d| d.status == DeviceStatus::Offline)
            .count(),
        per_brand,
        ptz_capable: devices.iter().filter(|d| d.ptz_capable).count(),
        recording: devices.iter().filter(|d| d.recording_enabled).count(),
    }
}
