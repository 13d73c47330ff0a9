//! Permission Request Bridge
//!
//! Correlates runtime permission prompts with the native callback handle
//! that was live when each prompt was issued.
//!
//! Each permission kind has one slot. A request for an ungranted kind stores
//! its handle in the slot (replacing, and silently dropping, any handle
//! already there) and prompts the host. The host result empties the slot and
//! invokes the handle it held. Only the most recently stored handle for a kind
//! can ever be invoked.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use activity_bridge_core::{Event, EventBus};

use crate::handle::{CallbackHandle, NativeCallback};
use crate::host::{HostPermissions, PermissionState};
use crate::kind::PermissionKind;

/// Runtime permission request bridge
pub struct PermissionBridge {
    host: Arc<dyn HostPermissions>,
    callback: Arc<dyn NativeCallback>,
    pending: Mutex<HashMap<PermissionKind, CallbackHandle>>,
    events: Option<Arc<EventBus>>,
}

impl PermissionBridge {
    /// Create a bridge with an empty pending table
    pub fn new(host: Arc<dyn HostPermissions>, callback: Arc<dyn NativeCallback>) -> Self {
        Self {
            host,
            callback,
            pending: Mutex::new(HashMap::new()),
            events: None,
        }
    }

    /// Publish bookkeeping events on `events`
    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Check the host's current grant state. Never touches pending requests.
    pub fn is_granted(&self, kind: PermissionKind) -> bool {
        self.host.check_current_permission_state(kind).is_granted()
    }

    /// [`is_granted`](Self::is_granted) for a raw host id.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a known permission id.
    pub fn is_granted_raw(&self, id: i32) -> bool {
        self.is_granted(PermissionKind::from_host_id(id))
    }

    /// Check whether the application declares the host permission for `kind`
    pub fn is_declared(&self, kind: PermissionKind) -> bool {
        match self.host.declared_permissions() {
            Ok(declared) => {
                let found = declared.iter().any(|name| name == kind.host_name());
                if !found {
                    debug!(permission = %kind, "{} is not declared by the application", kind.host_name());
                }
                found
            }
            Err(e) => {
                warn!(permission = %kind, "Could not read declared permissions: {}", e);
                false
            }
        }
    }

    /// Request `kind` on behalf of `handle`.
    ///
    /// An already granted permission invokes `handle` right away with
    /// `granted = true`. Otherwise `handle` becomes the pending handle for
    /// `kind` and the host is asked to prompt; this returns without waiting.
    pub fn request(&self, kind: PermissionKind, handle: CallbackHandle) {
        if self.is_granted(kind) {
            debug!(permission = %kind, %handle, "Permission already granted");
            self.emit(Event::PermissionGrantedImmediately {
                permission: kind.to_string(),
                handle: handle.raw(),
            });
            self.callback.invoke(handle, true);
            return;
        }

        let superseded = self.pending.lock().insert(kind, handle);

        if let Some(dropped) = superseded {
            debug!(permission = %kind, %dropped, replacement = %handle, "Pending request superseded");
            self.emit(Event::RequestSuperseded {
                permission: kind.to_string(),
                dropped: dropped.raw(),
                replacement: handle.raw(),
            });
        }

        debug!(permission = %kind, %handle, "Prompting for permission");
        self.emit(Event::PermissionRequested {
            permission: kind.to_string(),
            handle: handle.raw(),
        });
        self.host.prompt_for_permission(kind, kind.id());
    }

    /// [`request`](Self::request) for a raw host id and handle value.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a known permission id.
    pub fn request_raw(&self, id: i32, handle: u64) {
        self.request(PermissionKind::from_host_id(id), CallbackHandle(handle));
    }

    /// Deliver the host's answer for `kind`.
    ///
    /// Invokes the pending handle for `kind`, if any, exactly once. A result
    /// with nothing pending is ignored.
    pub fn on_result(&self, kind: PermissionKind, granted: bool) {
        let handle = self.pending.lock().remove(&kind);

        match handle {
            Some(handle) => {
                debug!(permission = %kind, %handle, granted, "Permission result delivered");
                self.emit(Event::PermissionResolved {
                    permission: kind.to_string(),
                    handle: handle.raw(),
                    granted,
                });
                self.callback.invoke(handle, granted);
            }
            None => {
                trace!(permission = %kind, granted, "Ignoring result with no pending request");
                self.emit(Event::StaleResult {
                    permission: kind.to_string(),
                    granted,
                });
            }
        }
    }

    /// [`on_result`](Self::on_result) for a raw host id.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a known permission id.
    pub fn on_result_raw(&self, id: i32, granted: bool) {
        self.on_result(PermissionKind::from_host_id(id), granted);
    }

    /// Deliver a host result in the host's own shape: the prompt's request
    /// code and one result code per requested permission. Only the first
    /// result counts; an empty list means the prompt was dismissed.
    ///
    /// # Panics
    ///
    /// Panics if `request_code` is not a known permission id.
    pub fn on_request_permissions_result(&self, request_code: i32, grant_results: &[i32]) {
        let kind = PermissionKind::from_host_id(request_code);
        let granted = grant_results
            .first()
            .map(|&code| PermissionState::from_result_code(code).is_granted())
            .unwrap_or(false);

        self.on_result(kind, granted);
    }

    /// Handle currently pending for `kind`
    pub fn pending_handle(&self, kind: PermissionKind) -> Option<CallbackHandle> {
        self.pending.lock().get(&kind).copied()
    }

    /// Number of kinds with a pending request
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Copy of the pending table, in kind id order
    pub fn pending_snapshot(&self) -> Vec<(PermissionKind, CallbackHandle)> {
        let mut entries: Vec<_> = self
            .pending
            .lock()
            .iter()
            .map(|(kind, handle)| (*kind, *handle))
            .collect();
        entries.sort_by_key(|(kind, _)| kind.id());
        entries
    }

    fn emit(&self, event: Event) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }
}

impl Drop for PermissionBridge {
    fn drop(&mut self) {
        let abandoned = self.pending.get_mut().len();
        if abandoned > 0 {
            debug!(abandoned, "Dropping permission bridge; pending handles will not be invoked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{OnceLock, Weak};

    use activity_bridge_core::{BridgeError, Result};

    use crate::host::{PERMISSION_DENIED, PERMISSION_GRANTED};

    #[derive(Default)]
    struct FakeHost {
        granted: Mutex<HashSet<PermissionKind>>,
        prompts: Mutex<Vec<(PermissionKind, i32)>>,
        declared: Option<Vec<String>>,
    }

    impl FakeHost {
        fn granting(kinds: &[PermissionKind]) -> Self {
            let host = FakeHost::default();
            host.granted.lock().extend(kinds.iter().copied());
            host
        }
    }

    impl HostPermissions for FakeHost {
        fn check_current_permission_state(&self, kind: PermissionKind) -> PermissionState {
            if self.granted.lock().contains(&kind) {
                PermissionState::Granted
            } else {
                PermissionState::Denied
            }
        }

        fn prompt_for_permission(&self, kind: PermissionKind, request_code: i32) {
            self.prompts.lock().push((kind, request_code));
        }

        fn declared_permissions(&self) -> Result<Vec<String>> {
            self.declared
                .clone()
                .ok_or_else(|| BridgeError::Host("package not found".into()))
        }
    }

    type Calls = Arc<Mutex<Vec<(CallbackHandle, bool)>>>;

    fn recording_bridge(host: FakeHost) -> (PermissionBridge, Arc<FakeHost>, Calls) {
        let host = Arc::new(host);
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let bridge = PermissionBridge::new(
            host.clone(),
            Arc::new(move |handle: CallbackHandle, granted: bool| sink.lock().push((handle, granted))),
        );
        (bridge, host, calls)
    }

    #[test]
    fn test_request_then_grant() {
        let (bridge, host, calls) = recording_bridge(FakeHost::default());

        bridge.request(PermissionKind::RecordAudio, CallbackHandle(0xABC));
        assert!(calls.lock().is_empty());
        assert_eq!(
            bridge.pending_snapshot(),
            vec![(PermissionKind::RecordAudio, CallbackHandle(0xABC))]
        );
        assert_eq!(*host.prompts.lock(), vec![(PermissionKind::RecordAudio, 1)]);

        bridge.on_result(PermissionKind::RecordAudio, true);
        assert_eq!(*calls.lock(), vec![(CallbackHandle(0xABC), true)]);
        assert_eq!(bridge.pending_handle(PermissionKind::RecordAudio), None);
    }

    #[test]
    fn test_already_granted_invokes_synchronously() {
        let (bridge, host, calls) =
            recording_bridge(FakeHost::granting(&[PermissionKind::WriteExternalStorage]));

        assert_eq!(bridge.pending_count(), 0);
        bridge.request(PermissionKind::WriteExternalStorage, CallbackHandle(0x1));

        assert_eq!(*calls.lock(), vec![(CallbackHandle(0x1), true)]);
        assert_eq!(bridge.pending_count(), 0);
        assert!(host.prompts.lock().is_empty());
    }

    #[test]
    fn test_granted_request_leaves_other_entries_alone() {
        let (bridge, _host, calls) =
            recording_bridge(FakeHost::granting(&[PermissionKind::WriteExternalStorage]));

        bridge.request(PermissionKind::RecordAudio, CallbackHandle(5));
        let before = bridge.pending_snapshot();

        bridge.request(PermissionKind::WriteExternalStorage, CallbackHandle(6));

        assert_eq!(bridge.pending_snapshot(), before);
        assert_eq!(*calls.lock(), vec![(CallbackHandle(6), true)]);
    }

    #[test]
    fn test_newer_request_supersedes_older() {
        let (bridge, host, calls) = recording_bridge(FakeHost::default());

        bridge.request(PermissionKind::BluetoothMidi, CallbackHandle(0x1));
        bridge.request(PermissionKind::BluetoothMidi, CallbackHandle(0x2));
        assert_eq!(bridge.pending_count(), 1);
        assert_eq!(host.prompts.lock().len(), 2);

        bridge.on_result(PermissionKind::BluetoothMidi, false);

        assert_eq!(*calls.lock(), vec![(CallbackHandle(0x2), false)]);
        assert_eq!(bridge.pending_count(), 0);
    }

    #[test]
    fn test_stale_result_is_ignored() {
        let (bridge, _host, calls) = recording_bridge(FakeHost::default());

        bridge.request(PermissionKind::ReadExternalStorage, CallbackHandle(3));
        bridge.on_result(PermissionKind::RecordAudio, true);

        assert!(calls.lock().is_empty());
        assert_eq!(
            bridge.pending_snapshot(),
            vec![(PermissionKind::ReadExternalStorage, CallbackHandle(3))]
        );
    }

    #[test]
    fn test_second_result_is_noop() {
        let (bridge, _host, calls) = recording_bridge(FakeHost::default());

        bridge.request(PermissionKind::RecordAudio, CallbackHandle(9));
        bridge.on_result(PermissionKind::RecordAudio, true);
        bridge.on_result(PermissionKind::RecordAudio, true);

        assert_eq!(calls.lock().len(), 1);
        assert_eq!(bridge.pending_count(), 0);
    }

    #[test]
    fn test_slot_is_reusable() {
        let (bridge, _host, calls) = recording_bridge(FakeHost::default());

        bridge.request(PermissionKind::RecordAudio, CallbackHandle(1));
        bridge.on_result(PermissionKind::RecordAudio, false);
        bridge.request(PermissionKind::RecordAudio, CallbackHandle(2));
        bridge.on_result(PermissionKind::RecordAudio, true);

        assert_eq!(
            *calls.lock(),
            vec![(CallbackHandle(1), false), (CallbackHandle(2), true)]
        );
    }

    #[test]
    fn test_kinds_are_independent() {
        let (bridge, _host, calls) = recording_bridge(FakeHost::default());

        bridge.request(PermissionKind::RecordAudio, CallbackHandle(1));
        bridge.request(PermissionKind::ReadExternalStorage, CallbackHandle(2));
        bridge.on_result(PermissionKind::ReadExternalStorage, true);
        bridge.on_result(PermissionKind::RecordAudio, false);

        assert_eq!(
            *calls.lock(),
            vec![(CallbackHandle(2), true), (CallbackHandle(1), false)]
        );
    }

    #[test]
    fn test_host_shaped_result() {
        let (bridge, _host, calls) = recording_bridge(FakeHost::default());

        bridge.request(PermissionKind::RecordAudio, CallbackHandle(1));
        bridge.request(PermissionKind::BluetoothMidi, CallbackHandle(2));
        bridge.request(PermissionKind::WriteExternalStorage, CallbackHandle(4));

        bridge.on_request_permissions_result(1, &[PERMISSION_GRANTED]);
        bridge.on_request_permissions_result(2, &[PERMISSION_DENIED]);
        bridge.on_request_permissions_result(4, &[]);

        assert_eq!(
            *calls.lock(),
            vec![
                (CallbackHandle(1), true),
                (CallbackHandle(2), false),
                (CallbackHandle(4), false),
            ]
        );
    }

    #[test]
    fn test_raw_entry_points() {
        let (bridge, _host, calls) =
            recording_bridge(FakeHost::granting(&[PermissionKind::ReadExternalStorage]));

        assert!(bridge.is_granted_raw(3));
        assert!(!bridge.is_granted_raw(1));

        bridge.request_raw(1, u64::MAX);
        bridge.on_result_raw(1, true);
        assert_eq!(*calls.lock(), vec![(CallbackHandle(u64::MAX), true)]);
    }

    #[test]
    #[should_panic(expected = "contract violation")]
    fn test_request_unknown_id_panics() {
        let (bridge, _host, _calls) = recording_bridge(FakeHost::default());
        bridge.request_raw(0, 1);
    }

    #[test]
    #[should_panic(expected = "contract violation")]
    fn test_result_unknown_id_panics() {
        let (bridge, _host, _calls) = recording_bridge(FakeHost::default());
        bridge.on_request_permissions_result(17, &[PERMISSION_GRANTED]);
    }

    #[test]
    fn test_is_granted_does_not_touch_pending() {
        let (bridge, host, _calls) = recording_bridge(FakeHost::default());

        bridge.request(PermissionKind::RecordAudio, CallbackHandle(1));
        host.granted.lock().insert(PermissionKind::RecordAudio);

        assert!(bridge.is_granted(PermissionKind::RecordAudio));
        assert_eq!(bridge.pending_handle(PermissionKind::RecordAudio), Some(CallbackHandle(1)));
    }

    #[test]
    fn test_is_declared() {
        let host = FakeHost {
            declared: Some(vec!["android.permission.ACCESS_COARSE_LOCATION".to_string()]),
            ..FakeHost::default()
        };
        let (bridge, _host, _calls) = recording_bridge(host);

        assert!(bridge.is_declared(PermissionKind::BluetoothMidi));
        assert!(!bridge.is_declared(PermissionKind::RecordAudio));
    }

    #[test]
    fn test_is_declared_host_failure() {
        let (bridge, _host, _calls) = recording_bridge(FakeHost::default());
        assert!(!bridge.is_declared(PermissionKind::RecordAudio));
    }

    #[test]
    fn test_drop_invokes_nothing() {
        let (bridge, _host, calls) = recording_bridge(FakeHost::default());

        bridge.request(PermissionKind::RecordAudio, CallbackHandle(1));
        bridge.request(PermissionKind::BluetoothMidi, CallbackHandle(2));
        drop(bridge);

        assert!(calls.lock().is_empty());
    }

    #[test]
    fn test_events_follow_bookkeeping() {
        let events = Arc::new(EventBus::new());
        let sub = events.subscribe();
        let (bridge, _host, _calls) =
            recording_bridge(FakeHost::granting(&[PermissionKind::WriteExternalStorage]));
        let bridge = bridge.with_event_bus(events);

        bridge.request(PermissionKind::WriteExternalStorage, CallbackHandle(1));
        bridge.request(PermissionKind::RecordAudio, CallbackHandle(2));
        bridge.request(PermissionKind::RecordAudio, CallbackHandle(3));
        bridge.on_result(PermissionKind::RecordAudio, true);
        bridge.on_result(PermissionKind::RecordAudio, true);

        assert_eq!(
            sub.drain(),
            vec![
                Event::PermissionGrantedImmediately {
                    permission: "WRITE_EXTERNAL_STORAGE".into(),
                    handle: 1,
                },
                Event::PermissionRequested { permission: "RECORD_AUDIO".into(), handle: 2 },
                Event::RequestSuperseded {
                    permission: "RECORD_AUDIO".into(),
                    dropped: 2,
                    replacement: 3,
                },
                Event::PermissionRequested { permission: "RECORD_AUDIO".into(), handle: 3 },
                Event::PermissionResolved {
                    permission: "RECORD_AUDIO".into(),
                    handle: 3,
                    granted: true,
                },
                Event::StaleResult { permission: "RECORD_AUDIO".into(), granted: true },
            ]
        );
    }

    /// Host that answers from inside `prompt_for_permission`.
    struct ImmediateHost {
        bridge: OnceLock<Weak<PermissionBridge>>,
        answer: bool,
    }

    impl HostPermissions for ImmediateHost {
        fn check_current_permission_state(&self, _kind: PermissionKind) -> PermissionState {
            PermissionState::Denied
        }

        fn prompt_for_permission(&self, _kind: PermissionKind, request_code: i32) {
            if let Some(bridge) = self.bridge.get().and_then(Weak::upgrade) {
                bridge.on_result_raw(request_code, self.answer);
            }
        }

        fn declared_permissions(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_synchronous_host_delivery_does_not_deadlock() {
        let host = Arc::new(ImmediateHost { bridge: OnceLock::new(), answer: true });
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let bridge = Arc::new(PermissionBridge::new(
            host.clone(),
            Arc::new(move |handle: CallbackHandle, granted: bool| sink.lock().push((handle, granted))),
        ));
        let _ = host.bridge.set(Arc::downgrade(&bridge));

        bridge.request(PermissionKind::RecordAudio, CallbackHandle(11));

        assert_eq!(*calls.lock(), vec![(CallbackHandle(11), true)]);
        assert_eq!(bridge.pending_count(), 0);
    }

    #[test]
    fn test_callback_may_reenter_request() {
        let slot: Arc<OnceLock<Weak<PermissionBridge>>> = Arc::new(OnceLock::new());
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));

        let callback_slot = Arc::clone(&slot);
        let sink = Arc::clone(&calls);
        let callback = move |handle: CallbackHandle, granted: bool| {
            sink.lock().push((handle, granted));
            // chain a second request from inside the first callback
            if handle == CallbackHandle(1) {
                if let Some(bridge) = callback_slot.get().and_then(Weak::upgrade) {
                    bridge.request(PermissionKind::BluetoothMidi, CallbackHandle(2));
                }
            }
        };

        let bridge = Arc::new(PermissionBridge::new(
            Arc::new(FakeHost::default()),
            Arc::new(callback),
        ));
        let _ = slot.set(Arc::downgrade(&bridge));

        bridge.request(PermissionKind::RecordAudio, CallbackHandle(1));
        bridge.on_result(PermissionKind::RecordAudio, true);

        assert_eq!(*calls.lock(), vec![(CallbackHandle(1), true)]);
        assert_eq!(
            bridge.pending_snapshot(),
            vec![(PermissionKind::BluetoothMidi, CallbackHandle(2))]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_result_delivered_from_another_task() {
        let (bridge, _host, calls) = recording_bridge(FakeHost::default());
        let bridge = Arc::new(bridge);

        bridge.request(PermissionKind::ReadExternalStorage, CallbackHandle(0x77));

        let delivering = Arc::clone(&bridge);
        tokio::spawn(async move {
            delivering.on_result(PermissionKind::ReadExternalStorage, true);
        })
        .await
        .unwrap();

        assert_eq!(*calls.lock(), vec![(CallbackHandle(0x77), true)]);
        assert_eq!(bridge.pending_count(), 0);
    }

    #[test]
    fn test_racing_requests_invoke_only_latest_per_kind() {
        let (bridge, _host, calls) = recording_bridge(FakeHost::default());
        let bridge = Arc::new(bridge);

        let threads: Vec<_> = (0..4u64)
            .map(|t| {
                let bridge = Arc::clone(&bridge);
                std::thread::spawn(move || {
                    for i in 0..100u64 {
                        bridge.request(PermissionKind::RecordAudio, CallbackHandle(t * 1000 + i));
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        let last = bridge.pending_handle(PermissionKind::RecordAudio).unwrap();
        bridge.on_result(PermissionKind::RecordAudio, true);
        bridge.on_result(PermissionKind::RecordAudio, true);

        assert_eq!(*calls.lock(), vec![(last, true)]);
    }

    #[test]
    fn test_concurrent_results_invoke_once() {
        let (bridge, _host, calls) = recording_bridge(FakeHost::default());
        let bridge = Arc::new(bridge);

        bridge.request(PermissionKind::RecordAudio, CallbackHandle(42));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let bridge = Arc::clone(&bridge);
                std::thread::spawn(move || bridge.on_result(PermissionKind::RecordAudio, true))
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(*calls.lock(), vec![(CallbackHandle(42), true)]);
    }

    #[test]
    fn test_request_through_blocking_future() {
        let (bridge, _host, calls) = recording_bridge(FakeHost::default());
        let bridge = Arc::new(bridge);
        bridge.request(PermissionKind::WriteExternalStorage, CallbackHandle(8));

        let delivering = Arc::clone(&bridge);
        tokio_test::block_on(async move {
            delivering.on_request_permissions_result(4, &[PERMISSION_GRANTED]);
        });

        assert_eq!(*calls.lock(), vec![(CallbackHandle(8), true)]);
    }
}
