//! PTZ command and handler types

use crate::device_registry::Device;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Directional/zoom commands accepted by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PtzCommand {
    Up,
    Down,
    Left,
    Right,
    ZoomIn,
    ZoomOut,
    Home,
}

impl FromStr for PtzCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "zoom_in" => Ok(Self::ZoomIn),
            "zoom_out" => Ok(Self::ZoomOut),
            "home" => Ok(Self::Home),
            other => Err(Error::UnsupportedCommand(other.to_string())),
        }
    }
}

/// Brand-specific PTZ transport, injected into the dispatcher.
///
/// Speed values are normalized to 0.0..=1.0 by the dispatcher; pan/tilt
/// receive signed speeds (negative = left/down).
#[async_trait]
pub trait PtzHandler: Send + Sync {
    async fn pan(&self, device: &Device, speed: f32) -> Result<()>;
    async fn tilt(&self, device: &Device, speed: f32) -> Result<()>;
    async fn zoom_in(&self, device: &Device, speed: f32) -> Result<()>;
    async fn zoom_out(&self, device: &Device, speed: f32) -> Result<()>;
    async fn home(&self, device: &Device) -> Result<()>;
}
