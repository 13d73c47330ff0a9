//! Host Permission Subsystem
//!
//! What the bridge consumes from the host OS: current grant state, the
//! asynchronous prompt, and the list of permissions the app declares.

use activity_bridge_core::Result;

use crate::kind::PermissionKind;

/// Host result code for a granted permission
pub const PERMISSION_GRANTED: i32 = 0;

/// Host result code for a denied permission
pub const PERMISSION_DENIED: i32 = -1;

/// Current host grant state for a permission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
}

impl PermissionState {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionState::Granted)
    }

    /// Interpret a host result code
    pub fn from_result_code(code: i32) -> Self {
        if code == PERMISSION_GRANTED {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        }
    }
}

/// Host permission subsystem
pub trait HostPermissions: Send + Sync {
    /// Synchronous check of the current grant state
    fn check_current_permission_state(&self, kind: PermissionKind) -> PermissionState;

    /// Ask the user for `kind`. Returns immediately; the result, if any,
    /// comes back later tagged with `request_code`.
    fn prompt_for_permission(&self, kind: PermissionKind, request_code: i32);

    /// Host permission names the application declares
    fn declared_permissions(&self) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_codes() {
        assert!(PermissionState::from_result_code(PERMISSION_GRANTED).is_granted());
        assert!(!PermissionState::from_result_code(PERMISSION_DENIED).is_granted());
        assert!(!PermissionState::from_result_code(42).is_granted());
    }
}
