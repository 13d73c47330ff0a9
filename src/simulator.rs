//! In-process host simulation
//!
//! A host permission subsystem and a lifecycle bridge that run without a
//! device, used by the `simulate` command and by tests.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use activity_bridge_core::{
    AnswerPolicy, Configuration, Intent, LifecycleBridge, Result, SimulatorConfig, ViewId,
};
use activity_bridge_permissions::{
    HostPermissions, PermissionKind, PermissionState, PERMISSION_DENIED, PERMISSION_GRANTED,
};

/// Simulated host permission subsystem
pub struct SimulatedHost {
    granted: Mutex<HashSet<PermissionKind>>,
    declared: Vec<String>,
    answer: AnswerPolicy,
    delay: Duration,
    /// Prompts shown and not yet answered, oldest first
    prompts: Mutex<VecDeque<(PermissionKind, i32)>>,
    history: Mutex<Vec<PermissionKind>>,
}

impl SimulatedHost {
    /// Create a host with nothing granted that answers every prompt with `answer`
    pub fn new(answer: AnswerPolicy) -> Self {
        Self {
            granted: Mutex::new(HashSet::new()),
            declared: PermissionKind::ALL
                .iter()
                .map(|kind| kind.host_name().to_string())
                .collect(),
            answer,
            delay: Duration::ZERO,
            prompts: Mutex::new(VecDeque::new()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Create a host from configuration
    pub fn from_config(config: &SimulatorConfig) -> Result<Self> {
        let granted = config
            .granted
            .iter()
            .map(|name| name.parse::<PermissionKind>())
            .collect::<Result<HashSet<_>>>()?;

        Ok(Self {
            granted: Mutex::new(granted),
            declared: config.declared.clone(),
            answer: config.answer,
            delay: Duration::from_millis(config.delivery_delay_ms),
            prompts: Mutex::new(VecDeque::new()),
            history: Mutex::new(Vec::new()),
        })
    }

    /// Grant `kind` outside of any prompt
    pub fn grant(&self, kind: PermissionKind) {
        self.granted.lock().insert(kind);
    }

    /// Revoke `kind`, as the user can from system settings
    pub fn revoke(&self, kind: PermissionKind) {
        self.granted.lock().remove(&kind);
    }

    /// Every kind prompted for, in order
    pub fn prompt_history(&self) -> Vec<PermissionKind> {
        self.history.lock().clone()
    }

    /// Number of prompts shown and not yet answered
    pub fn pending_prompts(&self) -> usize {
        self.prompts.lock().len()
    }

    /// Answer the oldest open prompt through `deliver`.
    ///
    /// Returns false when no prompt is open. A prompt answered with
    /// [`AnswerPolicy::Ignore`] is consumed without delivering anything.
    pub fn deliver_next<F>(&self, deliver: F) -> bool
    where
        F: Fn(i32, &[i32]),
    {
        let next = self.prompts.lock().pop_front();
        let Some((kind, request_code)) = next else {
            return false;
        };

        match self.answer {
            AnswerPolicy::Grant => {
                self.grant(kind);
                debug!(permission = %kind, "Simulated user granted permission");
                deliver(request_code, &[PERMISSION_GRANTED]);
            }
            AnswerPolicy::Deny => {
                debug!(permission = %kind, "Simulated user denied permission");
                deliver(request_code, &[PERMISSION_DENIED]);
            }
            AnswerPolicy::Ignore => {
                debug!(permission = %kind, "Simulated host cancelled prompt");
            }
        }
        true
    }

    /// Answer every open prompt, returning how many were consumed
    pub fn deliver_all<F>(&self, deliver: F) -> usize
    where
        F: Fn(i32, &[i32]),
    {
        let mut consumed = 0;
        while self.deliver_next(&deliver) {
            consumed += 1;
        }
        consumed
    }

    /// Answer every open prompt from a tokio task after the configured delay
    pub fn spawn_delivery<F>(self: &Arc<Self>, deliver: F) -> tokio::task::JoinHandle<usize>
    where
        F: Fn(i32, &[i32]) + Send + 'static,
    {
        let host = Arc::clone(self);
        tokio::spawn(async move {
            if !host.delay.is_zero() {
                tokio::time::sleep(host.delay).await;
            }
            host.deliver_all(deliver)
        })
    }
}

impl HostPermissions for SimulatedHost {
    fn check_current_permission_state(&self, kind: PermissionKind) -> PermissionState {
        if self.granted.lock().contains(&kind) {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        }
    }

    fn prompt_for_permission(&self, kind: PermissionKind, request_code: i32) {
        info!(permission = %kind, request_code, "Showing permission prompt");
        self.prompts.lock().push_back((kind, request_code));
        self.history.lock().push(kind);
    }

    fn declared_permissions(&self) -> Result<Vec<String>> {
        Ok(self.declared.clone())
    }
}

/// Lifecycle bridge that records every call it receives
pub struct RecordingLifecycle {
    calls: Mutex<Vec<String>>,
    focused_view: Option<ViewId>,
}

impl RecordingLifecycle {
    /// View returned by `create_view_for_default_component`
    pub const DEFAULT_VIEW: ViewId = ViewId(1);

    /// Set the view reported as focused
    pub fn with_focused_view(mut self, view: Option<ViewId>) -> Self {
        self.focused_view = view;
        self
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

impl Default for RecordingLifecycle {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            focused_view: Some(Self::DEFAULT_VIEW),
        }
    }
}

impl LifecycleBridge for RecordingLifecycle {
    fn set_activity_context(&self) {
        self.record("set_activity_context");
    }

    fn set_screen_saver(&self, enabled: bool) {
        self.record(format!("set_screen_saver({})", enabled));
    }

    fn hide_action_bar(&self) {
        self.record("hide_action_bar");
    }

    fn create_view_for_default_component(&self) -> ViewId {
        self.record("create_view_for_default_component");
        Self::DEFAULT_VIEW
    }

    fn quit_app(&self) {
        self.record("quit_app");
    }

    fn clear_data_cache(&self) {
        self.record("clear_data_cache");
    }

    fn suspend(&self) {
        self.record("suspend");
    }

    fn resume(&self) {
        self.record("resume");
    }

    fn configuration_changed(&self, _config: &Configuration) {
        self.record("configuration_changed");
    }

    fn new_intent(&self, intent: &Intent) {
        self.record(format!("new_intent({})", intent.action.as_deref().unwrap_or_default()));
    }

    fn activity_result(&self, request_code: i32, result_code: i32) {
        self.record(format!("activity_result({}, {})", request_code, result_code));
    }

    fn focused_or_default_view(&self) -> Option<ViewId> {
        self.focused_view
    }

    fn back_button_pressed(&self, view: ViewId) {
        self.record(format!("back_button_pressed({})", view.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = SimulatorConfig {
            granted: vec!["write_storage".into()],
            ..SimulatorConfig::default()
        };
        let host = SimulatedHost::from_config(&config).unwrap();

        assert!(host.check_current_permission_state(PermissionKind::WriteExternalStorage).is_granted());
        assert!(!host.check_current_permission_state(PermissionKind::RecordAudio).is_granted());
        assert_eq!(host.delay, Duration::from_millis(50));
    }

    #[test]
    fn test_from_config_rejects_unknown_kind() {
        let config = SimulatorConfig {
            granted: vec!["CAMERA".into()],
            ..SimulatorConfig::default()
        };
        assert!(SimulatedHost::from_config(&config).is_err());
    }

    #[test]
    fn test_ignore_consumes_without_delivery() {
        let host = SimulatedHost::new(AnswerPolicy::Ignore);
        host.prompt_for_permission(PermissionKind::RecordAudio, 1);

        let delivered = Mutex::new(Vec::new());
        let consumed = host.deliver_all(|code, results| delivered.lock().push((code, results.to_vec())));

        assert_eq!(consumed, 1);
        assert!(delivered.lock().is_empty());
        assert_eq!(host.pending_prompts(), 0);
    }

    #[test]
    fn test_grant_updates_state() {
        let host = SimulatedHost::new(AnswerPolicy::Grant);
        host.prompt_for_permission(PermissionKind::BluetoothMidi, 2);

        let delivered = Mutex::new(Vec::new());
        assert!(host.deliver_next(|code, results| delivered.lock().push((code, results.to_vec()))));
        assert!(!host.deliver_next(|_, _| {}));

        assert_eq!(*delivered.lock(), vec![(2, vec![PERMISSION_GRANTED])]);
        assert!(host.check_current_permission_state(PermissionKind::BluetoothMidi).is_granted());
        assert_eq!(host.prompt_history(), vec![PermissionKind::BluetoothMidi]);
    }

    #[test]
    fn test_revoke() {
        let host = SimulatedHost::new(AnswerPolicy::Deny);
        host.grant(PermissionKind::RecordAudio);
        host.revoke(PermissionKind::RecordAudio);
        assert!(!host.check_current_permission_state(PermissionKind::RecordAudio).is_granted());
    }

    #[test]
    fn test_recording_lifecycle_defaults() {
        let lifecycle = RecordingLifecycle::default();
        assert_eq!(lifecycle.focused_or_default_view(), Some(RecordingLifecycle::DEFAULT_VIEW));
        lifecycle.set_screen_saver(false);
        assert_eq!(lifecycle.calls(), vec!["set_screen_saver(false)"]);
    }
}
