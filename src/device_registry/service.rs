//! DeviceRegistry service
//!
//! In-memory store guarded by a single RwLock. The write lock covers id
//! assignment and any single device's read-modify-write, which is the only
//! mutual-exclusion section the registry needs.

use super::types::{CreateDeviceRequest, Device, DeviceStatus, UpdateDeviceRequest};
use crate::brand_catalog::resolve_brand;
use crate::endpoint_resolver::{resolve_control_address, resolve_media_address};
use crate::error::{Error, Result};
use chrono::Utc;
use tokio::sync::RwLock;

#[derive(Default)]
struct RegistryState {
    /// Insertion order preserved for listing
    devices: Vec<Device>,
    /// Weak selection: held by id, re-resolved at read time
    selected: Option<u32>,
}

/// In-memory camera device registry
pub struct DeviceRegistry {
    state: RwLock<RegistryState>,
}

impl DeviceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Create a registry pre-seeded with the demo cameras
    pub async fn with_samples() -> Self {
        let registry = Self::new();
        let samples = [
            CreateDeviceRequest {
                name: "Main Entrance".to_string(),
                ip_address: "192.168.1.100".to_string(),
                brand: "Vivotek".to_string(),
                model: Some("IB9367-HT".to_string()),
                resolution: Some("4K".to_string()),
                location: Some("Front Door".to_string()),
                site_id: Some(1),
                ..Default::default()
            },
            CreateDeviceRequest {
                name: "Parking Area".to_string(),
                ip_address: "192.168.1.101".to_string(),
                brand: "Axis".to_string(),
                model: Some("P3245-LV".to_string()),
                resolution: Some("1080p".to_string()),
                location: Some("Parking Lot".to_string()),
                site_id: Some(1),
                ptz_capable: Some(false),
                ..Default::default()
            },
            CreateDeviceRequest {
                name: "Back Office".to_string(),
                ip_address: "192.168.1.102".to_string(),
                brand: "Hikvision".to_string(),
                model: Some("DS-2CD2385FWD-I".to_string()),
                resolution: Some("4K".to_string()),
                location: Some("Office Area".to_string()),
                site_id: Some(1),
                ptz_capable: Some(false),
                ..Default::default()
            },
        ];
        for request in samples {
            // Requests are statically valid
            if let Err(e) = registry.create(request).await {
                tracing::warn!(error = %e, "Failed to seed sample camera");
            }
        }
        registry
    }

    /// Register a new device. Returns the assigned id.
    ///
    /// Missing `name`, `ip_address` or `brand` fail with a validation error
    /// naming the field, before any state change.
    pub async fn create(&self, request: CreateDeviceRequest) -> Result<u32> {
        for (field, value) in [
            ("name", &request.name),
            ("ip_address", &request.ip_address),
            ("brand", &request.brand),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Validation(format!(
                    "missing required field: {}",
                    field
                )));
            }
        }

        let profile = resolve_brand(&request.brand);
        let username = request
            .username
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| profile.default_username.to_string());
        let media_stream_address = resolve_media_address(
            &request.brand,
            &request.ip_address,
            request.media_port,
            Some(&username),
            request.credential_secret.as_deref(),
        );
        let control_service_address =
            resolve_control_address(&request.brand, &request.ip_address);

        let mut state = self.state.write().await;
        let id = state.devices.iter().map(|d| d.id).max().unwrap_or(0) + 1;

        let device = Device {
            id,
            name: request.name,
            model: request.model,
            resolution: request.resolution,
            location: request.location,
            site_id: request.site_id,
            brand: request.brand,
            ip_address: request.ip_address,
            control_port: request.control_port.unwrap_or(profile.default_control_port),
            media_port: request.media_port,
            username,
            credential_secret: request.credential_secret,
            media_stream_address,
            control_service_address,
            protocol_kind: profile.protocol,
            night_vision: request.night_vision.unwrap_or(true),
            ptz_capable: request.ptz_capable.unwrap_or(profile.ptz_support),
            recording_enabled: request.recording_enabled.unwrap_or(true),
            // Offline pending first probe
            status: DeviceStatus::Offline,
            last_observed_at: Utc::now(),
        };

        tracing::info!(
            camera_id = %device.id,
            name = %device.name,
            brand = %device.brand,
            stream = %device.media_stream_address,
            "Camera registered"
        );
        state.devices.push(device);
        Ok(id)
    }

    /// Merge a partial update into an existing device.
    ///
    /// Any change to the network identity tuple re-derives both addresses
    /// before the mutation commits; `last_observed_at` is always refreshed.
    pub async fn update(&self, id: u32, request: UpdateDeviceRequest) -> Result<Device> {
        let rederive = request.touches_network_identity();
        let mut state = self.state.write().await;
        let device = state
            .devices
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| Error::NotFound(format!("Camera {} not found", id)))?;

        if let Some(name) = request.name {
            device.name = name;
        }
        if let Some(model) = request.model {
            device.model = Some(model);
        }
        if let Some(resolution) = request.resolution {
            device.resolution = Some(resolution);
        }
        if let Some(location) = request.location {
            device.location = Some(location);
        }
        if let Some(site_id) = request.site_id {
            device.site_id = Some(site_id);
        }
        if let Some(brand) = request.brand {
            device.brand = brand;
        }
        if let Some(ip_address) = request.ip_address {
            device.ip_address = ip_address;
        }
        if let Some(control_port) = request.control_port {
            device.control_port = control_port;
        }
        if let Some(media_port) = request.media_port {
            device.media_port = Some(media_port);
        }
        if let Some(username) = request.username {
            device.username = username;
        }
        if let Some(secret) = request.credential_secret {
            device.credential_secret = Some(secret);
        }
        if let Some(night_vision) = request.night_vision {
            device.night_vision = night_vision;
        }
        if let Some(ptz_capable) = request.ptz_capable {
            device.ptz_capable = ptz_capable;
        }
        if let Some(recording_enabled) = request.recording_enabled {
            device.recording_enabled = recording_enabled;
        }
        if let Some(status) = request.status {
            device.status = status;
        }

        if rederive {
            let profile = resolve_brand(&device.brand);
            device.media_stream_address = resolve_media_address(
                &device.brand,
                &device.ip_address,
                device.media_port,
                Some(&device.username),
                device.credential_secret.as_deref(),
            );
            device.control_service_address =
                resolve_control_address(&device.brand, &device.ip_address);
            device.protocol_kind = profile.protocol;
        }
        device.last_observed_at = Utc::now();

        Ok(device.clone())
    }

    /// Remove a device. Idempotent: removing an absent id is a no-op.
    ///
    /// Clears the selection if it pointed at this id. Returns whether a
    /// device was actually removed so callers can drop dependent state.
    pub async fn remove(&self, id: u32) -> bool {
        let mut state = self.state.write().await;
        let before = state.devices.len();
        state.devices.retain(|d| d.id != id);
        let removed = state.devices.len() != before;
        if removed {
            if state.selected == Some(id) {
                state.selected = None;
            }
            tracing::info!(camera_id = %id, "Camera removed");
        }
        removed
    }

    /// Focus a device by id; unchanged if the id does not exist
    pub async fn select(&self, id: u32) {
        let mut state = self.state.write().await;
        if state.devices.iter().any(|d| d.id == id) {
            state.selected = Some(id);
        }
    }

    /// Currently focused device, re-resolved by lookup
    pub async fn selected(&self) -> Option<Device> {
        let state = self.state.read().await;
        let id = state.selected?;
        state.devices.iter().find(|d| d.id == id).cloned()
    }

    /// Lookup by id
    pub async fn get(&self, id: u32) -> Option<Device> {
        self.state
            .read()
            .await
            .devices
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    /// All devices in insertion order
    pub async fn list(&self) -> Vec<Device> {
        self.state.read().await.devices.clone()
    }

    /// Devices scoped to a site, preserving registry order
    pub async fn list_by_site(&self, site_id: u32) -> Vec<Device> {
        self.state
            .read()
            .await
            .devices
            .iter()
            .filter(|d| d.site_id == Some(site_id))
            .cloned()
            .collect()
    }

    /// Devices of a brand, case-insensitive, preserving registry order
    pub async fn list_by_brand(&self, brand: &str) -> Vec<Device> {
        self.state
            .read()
            .await
            .devices
            .iter()
            .filter(|d| d.brand.eq_ignore_ascii_case(brand))
            .cloned()
            .collect()
    }

    /// Probe write-back: set a device's status if it still exists.
    ///
    /// Silent no-op (returns false) for removed ids, so a probe completing
    /// after removal cannot resurrect an entry.
    pub async fn record_status(&self, id: u32, status: DeviceStatus) -> bool {
        let mut state = self.state.write().await;
        match state.devices.iter_mut().find(|d| d.id == id) {
            Some(device) => {
                device.status = status;
                device.last_observed_at = Utc::now();
                true
            }
            None => false,
        }
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis_request(name: &str, ip: &str) -> CreateDeviceRequest {
        CreateDeviceRequest {
            name: name.to_string(),
            ip_address: ip.to_string(),
            brand: "Axis".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_fills_brand_defaults() {
        let registry = DeviceRegistry::new();
        let id = registry
            .create(axis_request("Lobby", "10.0.0.5"))
            .await
            .unwrap();

        let device = registry.get(id).await.unwrap();
        assert_eq!(device.control_port, 80);
        assert_eq!(device.username, "root");
        assert_eq!(device.status, DeviceStatus::Offline);
        assert!(device.media_stream_address.contains("10.0.0.5"));
        assert!(device
            .media_stream_address
            .contains("/axis-media/media.amp?videocodec=h264"));
    }

    #[tokio::test]
    async fn test_create_missing_field_names_the_field() {
        let registry = DeviceRegistry::new();
        let err = registry
            .create(CreateDeviceRequest {
                name: "Lobby".to_string(),
                brand: "Axis".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(&err, Error::Validation(msg) if msg.contains("ip_address")));
        assert!(registry.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_ptz_capability_follows_profile_unless_overridden() {
        let registry = DeviceRegistry::new();
        let default_id = registry
            .create(axis_request("A", "10.0.0.1"))
            .await
            .unwrap();
        let overridden_id = registry
            .create(CreateDeviceRequest {
                ptz_capable: Some(false),
                ..axis_request("B", "10.0.0.2")
            })
            .await
            .unwrap();

        assert!(registry.get(default_id).await.unwrap().ptz_capable);
        assert!(!registry.get(overridden_id).await.unwrap().ptz_capable);
    }

    #[tokio::test]
    async fn test_id_assignment_is_max_plus_one() {
        let registry = DeviceRegistry::new();
        let a = registry.create(axis_request("A", "10.0.0.1")).await.unwrap();
        let b = registry.create(axis_request("B", "10.0.0.2")).await.unwrap();
        let c = registry.create(axis_request("C", "10.0.0.3")).await.unwrap();
        assert_eq!((a, b, c), (1, 2, 3));

        // Removing a non-max id never frees it for reuse
        registry.remove(b).await;
        let d = registry.create(axis_request("D", "10.0.0.4")).await.unwrap();
        assert_eq!(d, 4);

        // Removing the max id allows that slot to be reassigned
        registry.remove(d).await;
        let e = registry.create(axis_request("E", "10.0.0.5")).await.unwrap();
        assert_eq!(e, 4);
    }

    #[tokio::test]
    async fn test_update_rederives_addresses() {
        let registry = DeviceRegistry::new();
        let id = registry
            .create(axis_request("Lobby", "10.0.0.5"))
            .await
            .unwrap();

        let updated = registry
            .update(
                id,
                UpdateDeviceRequest {
                    ip_address: Some("10.0.0.99".to_string()),
                    credential_secret: Some("s3cret".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(
            updated.media_stream_address,
            resolve_media_address(
                "Axis",
                "10.0.0.99",
                None,
                Some("root"),
                Some("s3cret")
            )
        );
        assert_eq!(
            updated.control_service_address,
            resolve_control_address("Axis", "10.0.0.99")
        );
    }

    #[tokio::test]
    async fn test_update_brand_switches_protocol_kind() {
        let registry = DeviceRegistry::new();
        let id = registry
            .create(axis_request("Lobby", "10.0.0.5"))
            .await
            .unwrap();

        let updated = registry
            .update(
                id,
                UpdateDeviceRequest {
                    brand: Some("Tapo".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            updated.protocol_kind,
            crate::brand_catalog::ProtocolKind::ManagedProfile
        );
        assert!(updated.media_stream_address.ends_with("/stream1"));
    }

    #[tokio::test]
    async fn test_resolution_is_stored_and_merged() {
        let registry = DeviceRegistry::new();
        let id = registry
            .create(CreateDeviceRequest {
                resolution: Some("1080p".to_string()),
                ..axis_request("Lobby", "10.0.0.5")
            })
            .await
            .unwrap();
        assert_eq!(
            registry.get(id).await.unwrap().resolution.as_deref(),
            Some("1080p")
        );

        let updated = registry
            .update(
                id,
                UpdateDeviceRequest {
                    resolution: Some("4K".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.resolution.as_deref(), Some("4K"));
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let registry = DeviceRegistry::new();
        let err = registry
            .update(42, UpdateDeviceRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_clears_matching_selection() {
        let registry = DeviceRegistry::new();
        let id = registry.create(axis_request("A", "10.0.0.1")).await.unwrap();
        registry.select(id).await;
        assert!(registry.selected().await.is_some());

        registry.remove(id).await;
        assert!(registry.selected().await.is_none());

        // Removing a nonexistent id is a quiet no-op
        assert!(!registry.remove(999).await);
    }

    #[tokio::test]
    async fn test_select_nonexistent_leaves_selection_unchanged() {
        let registry = DeviceRegistry::new();
        let id = registry.create(axis_request("A", "10.0.0.1")).await.unwrap();
        registry.select(id).await;
        registry.select(999).await;
        assert_eq!(registry.selected().await.unwrap().id, id);
    }

    #[tokio::test]
    async fn test_list_by_brand_case_insensitive() {
        let registry = DeviceRegistry::new();
        registry.create(axis_request("A", "10.0.0.1")).await.unwrap();
        registry
            .create(CreateDeviceRequest {
                name: "B".to_string(),
                ip_address: "10.0.0.2".to_string(),
                brand: "Hikvision".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let axis = registry.list_by_brand("axis").await;
        assert_eq!(axis.len(), 1);
        assert_eq!(axis[0].name, "A");
    }

    #[tokio::test]
    async fn test_list_by_site_preserves_order() {
        let registry = DeviceRegistry::new();
        for (name, site) in [("A", 1), ("B", 2), ("C", 1)] {
            registry
                .create(CreateDeviceRequest {
                    site_id: Some(site),
                    ..axis_request(name, "10.0.0.1")
                })
                .await
                .unwrap();
        }
        let site1: Vec<String> = registry
            .list_by_site(1)
            .await
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(site1, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_record_status_after_removal_is_noop() {
        let registry = DeviceRegistry::new();
        let id = registry.create(axis_request("A", "10.0.0.1")).await.unwrap();
        registry.remove(id).await;
        assert!(!registry.record_status(id, DeviceStatus::Online).await);
        assert!(registry.get(id).await.is_none());
    }
}
