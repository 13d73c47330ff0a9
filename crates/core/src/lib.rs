//! Activity Bridge Core - shared types
//!
//! Error handling, configuration, the event bus, and the lifecycle-bridge
//! interface used by the activity shim and the permission bridge.

pub mod config;
pub mod events;
pub mod error;
pub mod lifecycle;

pub use config::{AnswerPolicy, BridgeConfig, LoggingConfig, SimulatorConfig};
pub use events::{Event, EventBus, EventSubscription};
pub use error::{BridgeError, Result};
pub use lifecycle::{Configuration, Intent, LifecycleBridge, LifecycleEvent, Orientation, ViewId};

/// Activity bridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "Activity Bridge";
