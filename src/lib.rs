//! Activity Bridge
//!
//! Activity shim for native Android applications. Lifecycle callbacks from
//! the host are forwarded to the native layer; runtime permission requests
//! made by native code are correlated with the host's asynchronous answers.
//!
//! ## Architecture
//!
//! - `activity-bridge-core`: errors, configuration, event bus, lifecycle-bridge interface
//! - `activity-bridge-permissions`: permission kinds, callback handles, the permission bridge
//! - this crate: the activity shim, an in-process host simulator, and the CLI

#![warn(clippy::all)]

pub mod activity;
pub mod commands;
pub mod simulator;

// Re-export main components for library usage
pub use activity_bridge_core as core;
pub use activity_bridge_permissions as permissions;

pub use activity::ActivityShim;

/// Prelude module for convenient imports
pub mod prelude {
    pub use activity_bridge_core::{BridgeConfig, BridgeError, LifecycleBridge};
    pub use activity_bridge_permissions::{
        CallbackHandle, HostPermissions, NativeCallback, PermissionBridge, PermissionKind,
    };
    pub use crate::activity::ActivityShim;
}
