//! Permission Kinds
//!
//! The closed set of runtime permissions native code may request, with the
//! numeric ids shared with the host side and the host permission names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use activity_bridge_core::BridgeError;

/// Permission kind requested by native code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionKind {
    RecordAudio,
    BluetoothMidi,
    ReadExternalStorage,
    WriteExternalStorage,
}

impl PermissionKind {
    /// Every kind, in id order
    pub const ALL: [PermissionKind; 4] = [
        PermissionKind::RecordAudio,
        PermissionKind::BluetoothMidi,
        PermissionKind::ReadExternalStorage,
        PermissionKind::WriteExternalStorage,
    ];

    /// Numeric id used on the host side and as the prompt request code
    pub fn id(&self) -> i32 {
        match self {
            PermissionKind::RecordAudio => 1,
            PermissionKind::BluetoothMidi => 2,
            PermissionKind::ReadExternalStorage => 3,
            PermissionKind::WriteExternalStorage => 4,
        }
    }

    /// Look up a kind by its numeric id
    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    /// Look up a kind by id coming across the host boundary.
    ///
    /// # Panics
    ///
    /// Panics if `id` names no kind. Both sides are built from the same
    /// table, so an unknown id is a contract violation.
    pub fn from_host_id(id: i32) -> Self {
        match Self::from_id(id) {
            Some(kind) => kind,
            None => panic!("contract violation: unknown permission id {}", id),
        }
    }

    /// Host permission name checked and prompted for
    pub fn host_name(&self) -> &'static str {
        match self {
            PermissionKind::RecordAudio => "android.permission.RECORD_AUDIO",
            // Bluetooth LE scanning for MIDI devices is gated on location
            PermissionKind::BluetoothMidi => "android.permission.ACCESS_COARSE_LOCATION",
            PermissionKind::ReadExternalStorage => "android.permission.READ_EXTERNAL_STORAGE",
            PermissionKind::WriteExternalStorage => "android.permission.WRITE_EXTERNAL_STORAGE",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionKind::RecordAudio => "RECORD_AUDIO",
            PermissionKind::BluetoothMidi => "BLUETOOTH_MIDI",
            PermissionKind::ReadExternalStorage => "READ_EXTERNAL_STORAGE",
            PermissionKind::WriteExternalStorage => "WRITE_EXTERNAL_STORAGE",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for PermissionKind {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RECORD_AUDIO" => Ok(PermissionKind::RecordAudio),
            "BLUETOOTH_MIDI" => Ok(PermissionKind::BluetoothMidi),
            "READ_EXTERNAL_STORAGE" | "READ_STORAGE" => Ok(PermissionKind::ReadExternalStorage),
            "WRITE_EXTERNAL_STORAGE" | "WRITE_STORAGE" => Ok(PermissionKind::WriteExternalStorage),
            _ => Err(BridgeError::UnknownPermission(s.to_string())),
        }
    }
}
