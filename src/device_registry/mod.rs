//! DeviceRegistry Module
//!
//! Owns the collection of camera device records: creation, mutation,
//! deletion, lookup, and selection of the "current" device. All mutation is
//! serialized through the registry's operations; no other module stores
//! device records locally.
//!
//! ## Module layout
//! - `types`: device entity, request/response types
//! - `service`: the in-memory registry itself
//!
//! ## Invariants
//! - `media_stream_address` and `control_service_address` are re-derived
//!   atomically whenever `brand`, `ip_address`, `media_port`, `username` or
//!   `credential_secret` change.
//! - Ids are assigned monotonically (max existing + 1) and never reassigned
//!   while a higher id exists.
//! - The selected device is held by id and re-resolved at read time, so
//!   removal can never leave a dangling handle.

mod service;
mod types;

pub use service::DeviceRegistry;
pub use types::{CreateDeviceRequest, Device, DeviceStatus, UpdateDeviceRequest};
