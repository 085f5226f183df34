//! Mobile-emulation override management for the DevTools client.
//!
//! A [`MobileEmulationOverrideManager`] is a
//! [`DevToolsEventListener`](carrick_devtools::DevToolsEventListener) that
//! keeps a device-metrics override in force across connects and top-level
//! navigations.

pub mod device_metrics;
pub mod override_manager;

pub use device_metrics::DeviceMetrics;
pub use override_manager::{build_metrics_params, MobileEmulationOverrideManager};
