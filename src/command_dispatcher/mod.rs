//! Command Dispatcher
//!
//! Routes directional/zoom commands to a brand-specific PTZ handler.
//! The dispatcher's contract is the routing and capability gate only; the
//! wire protocol lives in the injected handlers, so a new vendor registers
//! a handler without touching this module.

mod onvif_ptz;
mod types;

pub use onvif_ptz::OnvifPtzHandler;
pub use types::{PtzCommand, PtzHandler};

use crate::device_registry::DeviceRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Brand-keyed PTZ command router
pub struct CommandDispatcher {
    registry: Arc<DeviceRegistry>,
    /// Lowercased brand name -> handler
    handlers: RwLock<HashMap<String, Arc<dyn PtzHandler>>>,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self {
            registry,
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Register (or replace) the handler for a brand
    pub async fn register_handler(&self, brand: &str, handler: Arc<dyn PtzHandler>) {
        self.handlers
            .write()
            .await
            .insert(brand.to_lowercase(), handler);
        tracing::debug!(brand = %brand, "PTZ handler registered");
    }

    /// Dispatch a PTZ command to a device.
    ///
    /// Returns false with no side effect when the device is missing, not
    /// PTZ-capable, the command string is unrecognized, or no handler is
    /// registered for the brand. Handler transport failures are logged and
    /// also surface as false, keeping the call site uniform.
    pub async fn dispatch(&self, id: u32, command: &str, value: Option<f32>) -> bool {
        let Some(device) = self.registry.get(id).await else {
            tracing::debug!(camera_id = %id, "PTZ dispatch for unknown camera");
            return false;
        };
        if !device.ptz_capable {
            tracing::debug!(camera_id = %id, "PTZ dispatch refused: camera not PTZ-capable");
            return false;
        }

        let parsed = match command.parse::<PtzCommand>() {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(camera_id = %id, command = %command, error = %e, "PTZ dispatch refused");
                return false;
            }
        };

        let handler = {
            let handlers = self.handlers.read().await;
            handlers.get(&device.brand.to_lowercase()).cloned()
        };
        let Some(handler) = handler else {
            tracing::warn!(
                camera_id = %id,
                brand = %device.brand,
                "No PTZ handler registered for brand"
            );
            return false;
        };

        let speed = value.unwrap_or(0.5).clamp(0.0, 1.0);
        tracing::info!(
            camera_id = %id,
            brand = %device.brand,
            command = ?parsed,
            speed = %speed,
            "Dispatching PTZ command"
        );

        let result = match parsed {
            PtzCommand::Left => handler.pan(&device, -speed).await,
            PtzCommand::Right => handler.pan(&device, speed).await,
            PtzCommand::Up => handler.tilt(&device, speed).await,
            PtzCommand::Down => handler.tilt(&device, -speed).await,
            PtzCommand::ZoomIn => handler.zoom_in(&device, speed).await,
            PtzCommand::ZoomOut => handler.zoom_out(&device, speed).await,
            PtzCommand::Home => handler.home(&device).await,
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(camera_id = %id, error = %e, "PTZ command failed");
                false
            }
        }
    }
}
