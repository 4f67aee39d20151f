//! camwatch - Multi-brand camera registry and connection-state manager
//!
//! ## Architecture (6 components)
//!
//! 1. BrandCatalog - static per-vendor connection defaults
//! 2. EndpointResolver - derives stream/control addresses from device identity
//! 3. DeviceRegistry - owns camera device records (SSoT)
//! 4. ConnectionTester - async liveness probes + per-device test state
//! 5. CommandDispatcher - brand-keyed PTZ command routing
//! 6. Aggregator - read-only rollups over the registry
//!
//! ## Design principles
//!
//! - SSoT: all device mutation goes through the DeviceRegistry
//! - Derived addresses are never independently settable; any change to a
//!   device's network identity re-derives them before commit
//! - Transient unreachability degrades a single device's state, never the
//!   registry's integrity

pub mod aggregator;
pub mod brand_catalog;
pub mod command_dispatcher;
pub mod connection_tester;
pub mod device_registry;
pub mod endpoint_resolver;
pub mod error;
pub mod models;
pub mod site_directory;
pub mod state;
pub mod web_api;

pub use error::{Error, Result};
pub use state::AppState;
