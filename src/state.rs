//! Application state
//!
//! Holds all shared components. The registry is an explicit, constructible
//! container; callers hold this state by reference, so isolated instances
//! (and isolated tests) need no ambient singleton.

use crate::command_dispatcher::CommandDispatcher;
use crate::connection_tester::ConnectionTester;
use crate::device_registry::DeviceRegistry;
use crate::site_directory::SiteDirectory;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Liveness probe timeout
    pub probe_timeout_ms: u64,
    /// Probe transport: "tcp" or "simulated"
    pub probe_mode: String,
    /// Site scope used when a listing does not name a site
    pub default_site_id: u32,
    /// Seed the registry with the demo cameras
    pub seed_samples: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            probe_timeout_ms: std::env::var("PROBE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            probe_mode: std::env::var("PROBE_MODE").unwrap_or_else(|_| "tcp".to_string()),
            default_site_id: std::env::var("DEFAULT_SITE_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            seed_samples: std::env::var("SEED_SAMPLES")
                .map(|v| v == "true")
                .unwrap_or(false),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Camera device registry
    pub registry: Arc<DeviceRegistry>,
    /// Liveness prober
    pub tester: Arc<ConnectionTester>,
    /// PTZ command router
    pub dispatcher: Arc<CommandDispatcher>,
    /// Site collaborator (current site scope)
    pub sites: Arc<dyn SiteDirectory>,
}
