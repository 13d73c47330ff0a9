//! Runtime Permission Request Bridge
//!
//! Lets native code request a dangerous host permission and receive the
//! asynchronous grant/deny answer through an opaque callback handle.

pub mod bridge;
pub mod catalog;
pub mod handle;
pub mod host;
pub mod kind;

pub use bridge::PermissionBridge;
pub use catalog::{PermissionInfo, ProtectionLevel};
pub use handle::{CallbackHandle, NativeCallback};
pub use host::{HostPermissions, PermissionState, PERMISSION_DENIED, PERMISSION_GRANTED};
pub use kind::PermissionKind;
