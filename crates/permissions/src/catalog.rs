//! Permission Catalog
//!
//! Display metadata for each permission kind.

use serde::{Deserialize, Serialize};

use crate::kind::PermissionKind;

/// Permission protection level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtectionLevel {
    Normal,
    Dangerous,
    Signature,
}

impl ProtectionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtectionLevel::Normal => "normal",
            ProtectionLevel::Dangerous => "dangerous",
            ProtectionLevel::Signature => "signature",
        }
    }
}

/// Permission info with display metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionInfo {
    pub kind: PermissionKind,
    pub id: i32,
    pub host_name: String,
    pub display_name: String,
    pub description: String,
    pub protection_level: ProtectionLevel,
    pub added_in_api: u32,
    /// Last API level the host permission is meaningful on
    pub max_sdk_version: Option<u32>,
}

impl PermissionInfo {
    /// Get the short host name without the android.permission prefix
    pub fn short_host_name(&self) -> &str {
        self.host_name
            .strip_prefix("android.permission.")
            .unwrap_or(&self.host_name)
    }

    /// Check if the host requires a runtime prompt for this permission
    pub fn requires_runtime_request(&self) -> bool {
        self.protection_level == ProtectionLevel::Dangerous
    }
}

/// Metadata for a single kind
pub fn info(kind: PermissionKind) -> PermissionInfo {
    let (display_name, description, added_in_api, max_sdk_version) = match kind {
        PermissionKind::RecordAudio => (
            "Microphone",
            "Allows the app to record audio",
            1,
            None,
        ),
        PermissionKind::BluetoothMidi => (
            "Bluetooth MIDI",
            "Allows the app to scan for Bluetooth LE MIDI devices",
            1,
            None,
        ),
        PermissionKind::ReadExternalStorage => (
            "Read Storage",
            "Allows the app to read from external storage",
            16,
            Some(32),
        ),
        PermissionKind::WriteExternalStorage => (
            "Write Storage",
            "Allows the app to write to external storage",
            4,
            Some(32),
        ),
    };

    PermissionInfo {
        kind,
        id: kind.id(),
        host_name: kind.host_name().to_string(),
        display_name: display_name.to_string(),
        description: description.to_string(),
        protection_level: ProtectionLevel::Dangerous,
        added_in_api,
        max_sdk_version,
    }
}

/// Metadata for every kind, in id order
pub fn all() -> Vec<PermissionInfo> {
    PermissionKind::ALL.into_iter().map(info).collect()
}
