//! Native Callback Handles
//!
//! Opaque tokens minted on the native side and the single primitive used to
//! hand a permission result back to it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque token identifying a pending native continuation.
///
/// The bridge never interprets the value; any 64-bit value is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallbackHandle(pub u64);

impl CallbackHandle {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for CallbackHandle {
    fn from(raw: u64) -> Self {
        CallbackHandle(raw)
    }
}

impl fmt::Display for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Invocation primitive implemented by the native caller.
///
/// Called at most once per stored handle, never while bridge state is locked.
pub trait NativeCallback: Send + Sync {
    fn invoke(&self, handle: CallbackHandle, granted: bool);
}

impl<F> NativeCallback for F
where
    F: Fn(CallbackHandle, bool) + Send + Sync,
{
    fn invoke(&self, handle: CallbackHandle, granted: bool) {
        self(handle, granted)
    }
}
