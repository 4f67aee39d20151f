//! Connection Tester
//!
//! Drives an async liveness probe per device and records transient
//! per-device test state. Probe state is ephemeral: it exists only while a
//! probe is in flight or has a recent result, and is dropped when the
//! device is removed.
//!
//! Probes for different device ids run concurrently; probes for the same
//! id serialize on a per-id lock so a duplicate probe never races the
//! write-back.

use crate::device_registry::{Device, DeviceRegistry, DeviceStatus};
use crate::error::{Error, Result};
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;

/// Per-device probe state machine: Idle -> Testing -> {Online|Offline|Error}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeState {
    Idle,
    Testing,
    Online,
    Offline,
    Error,
}

/// External liveness check collaborator
#[async_trait]
pub trait LivenessCheck: Send + Sync {
    /// Returns whether the device answered. Transport failures are errors;
    /// a clean "not reachable" is Ok(false).
    async fn check(&self, device: &Device) -> Result<bool>;
}

/// Real TCP connect check against the device's media port
pub struct TcpLivenessCheck {
    timeout: Duration,
}

impl TcpLivenessCheck {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

#[async_trait]
impl LivenessCheck for TcpLivenessCheck {
    async fn check(&self, device: &Device) -> Result<bool> {
        let port = device
            .media_port
            .unwrap_or_else(|| crate::brand_catalog::resolve_brand(&device.brand).default_media_port);
        let addr = (device.ip_address.as_str(), port);

        match timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_)) => Ok(true),
            // Connection refused = host alive but stream port closed
            Ok(Err(_)) => Ok(false),
            Err(_) => Ok(false),
        }
    }
}

/// Simulated check with a fixed delay and configurable success ratio,
/// for demo wiring and environments without reachable cameras
pub struct SimulatedLivenessCheck {
    delay: Duration,
    success_ratio: f64,
}

impl SimulatedLivenessCheck {
    pub fn new(delay_ms: u64, success_ratio: f64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            success_ratio: success_ratio.clamp(0.0, 1.0),
        }
    }
}

impl Default for SimulatedLivenessCheck {
    fn default() -> Self {
        Self::new(2000, 0.8)
    }
}

#[async_trait]
impl LivenessCheck for SimulatedLivenessCheck {
    async fn check(&self, _device: &Device) -> Result<bool> {
        tokio::time::sleep(self.delay).await;
        Ok(rand::thread_rng().gen_bool(self.success_ratio))
    }
}

/// Deterministic check for tests
pub struct FixedLivenessCheck {
    outcome: Result<bool>,
}

impl FixedLivenessCheck {
    pub fn reachable(value: bool) -> Self {
        Self { outcome: Ok(value) }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(Error::Probe(message.to_string())),
        }
    }
}

#[async_trait]
impl LivenessCheck for FixedLivenessCheck {
    async fn check(&self, _device: &Device) -> Result<bool> {
        match &self.outcome {
            Ok(v) => Ok(*v),
            Err(e) => Err(Error::Probe(e.to_string())),
        }
    }
}

/// Drives liveness probes and tracks per-device probe state
pub struct ConnectionTester {
    registry: Arc<DeviceRegistry>,
    checker: Arc<dyn LivenessCheck>,
    states: RwLock<HashMap<u32, ProbeState>>,
    /// Per-device probe serialization, same shape as per-camera RTSP locks
    locks: RwLock<HashMap<u32, Arc<Mutex<()>>>>,
}

impl ConnectionTester {
    pub fn new(registry: Arc<DeviceRegistry>, checker: Arc<dyn LivenessCheck>) -> Self {
        Self {
            registry,
            checker,
            states: RwLock::new(HashMap::new()),
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Probe a device's liveness.
    ///
    /// Returns the reachable signal (Online = true). A missing id returns
    /// false without touching any state. Checker failures are captured into
    /// the Error probe state, never raised to the caller. The write-back is
    /// existence-checked: a probe completing after its device was removed
    /// is a silent no-op.
    pub async fn probe(&self, id: u32) -> bool {
        let Some(device) = self.registry.get(id).await else {
            tracing::debug!(camera_id = %id, "Probe requested for unknown camera");
            return false;
        };

        let lock = self.get_or_create_lock(id).await;
        let _guard = lock.lock().await;

        self.states.write().await.insert(id, ProbeState::Testing);
        tracing::debug!(camera_id = %id, name = %device.name, "Probing camera");

        let (probe_state, device_status, reachable) = match self.checker.check(&device).await {
            Ok(true) => (ProbeState::Online, DeviceStatus::Online, true),
            Ok(false) => (ProbeState::Offline, DeviceStatus::Offline, false),
            Err(e) => {
                tracing::warn!(camera_id = %id, error = %e, "Liveness check failed");
                (ProbeState::Error, DeviceStatus::Offline, false)
            }
        };

        // Guard against a device removed while the probe was in flight.
        // Drops both map entries so callers that bypass `clear` do not
        // accumulate state for removed devices.
        if !self.registry.record_status(id, device_status).await {
            tracing::debug!(camera_id = %id, "Camera removed mid-probe, discarding result");
            self.states.write().await.remove(&id);
            self.locks.write().await.remove(&id);
            return false;
        }

        self.states.write().await.insert(id, probe_state);
        reachable
    }

    /// Current probe state for a device (Idle when untracked).
    ///
    /// Re-checked against the registry at read time, so a removed device
    /// reads as Idle even before `clear` runs.
    pub async fn state(&self, id: u32) -> ProbeState {
        if self.registry.get(id).await.is_none() {
            return ProbeState::Idle;
        }
        self.states
            .read()
            .await
            .get(&id)
            .copied()
            .unwrap_or(ProbeState::Idle)
    }

    /// Drop probe state for a removed device
    pub async fn clear(&self, id: u32) {
        self.states.write().await.remove(&id);
        self.locks.write().await.remove(&id);
    }

    #[cfg(test)]
    async fn tracked_entries(&self) -> (usize, usize) {
        (
            self.states.read().await.len(),
            self.locks.read().await.len(),
        )
    }

    async fn get_or_create_lock(&self, id: u32) -> Arc<Mutex<()>> {
        {
            let locks = self.locks.read().await;
            if let Some(lock) = locks.get(&id) {
                return lock.clone();
            }
        }
        let mut locks = self.locks.write().await;
        locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_registry::CreateDeviceRequest;

    async fn registry_with_camera() -> (Arc<DeviceRegistry>, u32) {
        let registry = Arc::new(DeviceRegistry::new());
        let id = registry
            .create(CreateDeviceRequest {
                name: "Lobby".to_string(),
                ip_address: "10.0.0.5".to_string(),
                brand: "Axis".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        (registry, id)
    }

    #[tokio::test]
    async fn test_probe_online_writes_back_status() {
        let (registry, id) = registry_with_camera().await;
        let tester = ConnectionTester::new(
            registry.clone(),
            Arc::new(FixedLivenessCheck::reachable(true)),
        );

        assert_eq!(tester.state(id).await, ProbeState::Idle);
        assert!(tester.probe(id).await);
        assert_eq!(tester.state(id).await, ProbeState::Online);
        assert_eq!(registry.get(id).await.unwrap().status, DeviceStatus::Online);
    }

    #[tokio::test]
    async fn test_probe_offline() {
        let (registry, id) = registry_with_camera().await;
        let tester = ConnectionTester::new(
            registry.clone(),
            Arc::new(FixedLivenessCheck::reachable(false)),
        );

        assert!(!tester.probe(id).await);
        assert_eq!(tester.state(id).await, ProbeState::Offline);
        assert_eq!(
            registry.get(id).await.unwrap().status,
            DeviceStatus::Offline
        );
    }

    #[tokio::test]
    async fn test_probe_error_is_absorbed() {
        let (registry, id) = registry_with_camera().await;
        let tester = ConnectionTester::new(
            registry.clone(),
            Arc::new(FixedLivenessCheck::failing("connection reset")),
        );

        // Checker failure is state, not an error at the call site
        assert!(!tester.probe(id).await);
        assert_eq!(tester.state(id).await, ProbeState::Error);
    }

    #[tokio::test]
    async fn test_probe_unknown_id_returns_false_without_state() {
        let registry = Arc::new(DeviceRegistry::new());
        let tester = ConnectionTester::new(
            registry,
            Arc::new(FixedLivenessCheck::reachable(true)),
        );
        assert!(!tester.probe(404).await);
        assert_eq!(tester.state(404).await, ProbeState::Idle);
    }

    #[tokio::test]
    async fn test_probe_after_removal_resurrects_nothing() {
        let (registry, id) = registry_with_camera().await;
        let tester = Arc::new(ConnectionTester::new(
            registry.clone(),
            Arc::new(SimulatedLivenessCheck::new(200, 1.0)),
        ));

        let task = {
            let tester = tester.clone();
            tokio::spawn(async move { tester.probe(id).await })
        };
        // Remove while the probe is sleeping in the checker
        tokio::time::sleep(Duration::from_millis(50)).await;
        registry.remove(id).await;
        tester.clear(id).await;

        assert!(!task.await.unwrap());
        assert!(registry.get(id).await.is_none());
        assert_eq!(tester.state(id).await, ProbeState::Idle);
    }

    #[tokio::test]
    async fn test_removal_mid_probe_leaves_no_tracked_entries() {
        let (registry, id) = registry_with_camera().await;
        let tester = Arc::new(ConnectionTester::new(
            registry.clone(),
            Arc::new(SimulatedLivenessCheck::new(200, 1.0)),
        ));

        let task = {
            let tester = tester.clone();
            tokio::spawn(async move { tester.probe(id).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        // Direct registry removal, no clear() from any composing layer
        registry.remove(id).await;

        assert!(!task.await.unwrap());
        assert_eq!(tester.tracked_entries().await, (0, 0));
    }

    #[tokio::test]
    async fn test_concurrent_probes_on_one_id_serialize() {
        let (registry, id) = registry_with_camera().await;
        let tester = Arc::new(ConnectionTester::new(
            registry,
            Arc::new(SimulatedLivenessCheck::new(50, 1.0)),
        ));

        let a = {
            let tester = tester.clone();
            tokio::spawn(async move { tester.probe(id).await })
        };
        let b = {
            let tester = tester.clone();
            tokio::spawn(async move { tester.probe(id).await })
        };
        assert!(a.await.unwrap());
        assert!(b.await.unwrap());
        assert_eq!(tester.state(id).await, ProbeState::Online);
    }
}
