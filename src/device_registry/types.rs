//! DeviceRegistry data types

use crate::brand_catalog::ProtocolKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operational connection status of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
    Unknown,
}

/// Camera device entity (one per physical camera)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Unique, monotonically assigned identifier
    pub id: u32,
    pub name: String,
    pub model: Option<String>,
    /// Descriptive label, e.g. "4K" or "1080p"; never parsed
    pub resolution: Option<String>,
    pub location: Option<String>,
    /// Foreign reference to an external Site entity; no ownership
    pub site_id: Option<u32>,
    // === Network identity ===
    pub brand: String,
    pub ip_address: String,
    pub control_port: u16,
    /// Explicit media port override; None means the brand default
    pub media_port: Option<u16>,
    pub username: String,
    pub credential_secret: Option<String>,
    // === Derived addresses (never independently settable) ===
    pub media_stream_address: String,
    pub control_service_address: String,
    pub protocol_kind: ProtocolKind,
    // === Capability flags ===
    pub night_vision: bool,
    pub ptz_capable: bool,
    pub recording_enabled: bool,
    // === Operational ===
    pub status: DeviceStatus,
    pub last_observed_at: DateTime<Utc>,
}

/// Device creation request
///
/// `name`, `ip_address` and `brand` are required; everything else falls
/// back to the brand profile's defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateDeviceRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub brand: String,
    pub model: Option<String>,
    pub resolution: Option<String>,
    pub location: Option<String>,
    pub site_id: Option<u32>,
    pub control_port: Option<u16>,
    pub media_port: Option<u16>,
    pub username: Option<String>,
    pub credential_secret: Option<String>,
    pub night_vision: Option<bool>,
    /// Explicit PTZ override; defaults to the brand profile's capability
    pub ptz_capable: Option<bool>,
    pub recording_enabled: Option<bool>,
}

/// Device update request (partial merge)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDeviceRequest {
    pub name: Option<String>,
    pub model: Option<String>,
    pub resolution: Option<String>,
    pub location: Option<String>,
    pub site_id: Option<u32>,
    pub brand: Option<String>,
    pub ip_address: Option<String>,
    pub control_port: Option<u16>,
    pub media_port: Option<u16>,
    pub username: Option<String>,
    pub credential_secret: Option<String>,
    pub night_vision: Option<bool>,
    pub ptz_capable: Option<bool>,
    pub recording_enabled: Option<bool>,
    pub status: Option<DeviceStatus>,
}

impl UpdateDeviceRequest {
    /// Whether this update touches a field the derived addresses depend on
    pub fn touches_network_identity(&self) -> bool {
        self.brand.is_some()
            || self.ip_address.is_some()
            || self.media_port.is_some()
            || self.username.is_some()
            || self.credential_secret.is_some()
    }
}
