//! Activity Shim
//!
//! Receives host lifecycle callbacks and routes them:
//! - Lifecycle events go straight to the native lifecycle bridge
//! - Permission results go to the permission bridge owned by the current
//!   activity instance

use std::sync::Arc;
use parking_lot::RwLock;
use tracing::{info, debug, warn};

use activity_bridge_core::{
    Configuration, Event, EventBus, Intent, LifecycleBridge, LifecycleEvent, ViewId,
};
use activity_bridge_permissions::{HostPermissions, NativeCallback, PermissionBridge};

/// Activity shim forwarding host callbacks to the native layer
pub struct ActivityShim<L: LifecycleBridge> {
    /// Native lifecycle bridge
    lifecycle: Arc<L>,
    /// Host permission subsystem handed to each permission bridge
    host: Arc<dyn HostPermissions>,
    /// Native invocation primitive handed to each permission bridge
    callback: Arc<dyn NativeCallback>,
    /// Permission bridge for the current create..destroy span
    permissions: RwLock<Option<Arc<PermissionBridge>>>,
    /// Content view created in on_create
    content_view: RwLock<Option<ViewId>>,
    /// Event bus for observers
    event_bus: Arc<EventBus>,
}

impl<L: LifecycleBridge> ActivityShim<L> {
    /// Create a shim; nothing is forwarded until `on_create`
    pub fn new(
        lifecycle: Arc<L>,
        host: Arc<dyn HostPermissions>,
        callback: Arc<dyn NativeCallback>,
    ) -> Self {
        Self {
            lifecycle,
            host,
            callback,
            permissions: RwLock::new(None),
            content_view: RwLock::new(None),
            event_bus: Arc::new(EventBus::new()),
        }
    }

    /// Get the event bus for subscribing to events
    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    /// Get the native lifecycle bridge
    pub fn lifecycle(&self) -> &Arc<L> {
        &self.lifecycle
    }

    /// Permission bridge of the running activity, if created
    pub fn permissions(&self) -> Option<Arc<PermissionBridge>> {
        self.permissions.read().clone()
    }

    /// Content view created by the lifecycle bridge
    pub fn content_view(&self) -> Option<ViewId> {
        *self.content_view.read()
    }

    pub fn on_create(&self) {
        info!("Activity created");
        self.lifecycle.set_activity_context();
        self.lifecycle.set_screen_saver(true);
        self.lifecycle.hide_action_bar();
        let view = self.lifecycle.create_view_for_default_component();
        *self.content_view.write() = Some(view);

        let bridge = PermissionBridge::new(Arc::clone(&self.host), Arc::clone(&self.callback))
            .with_event_bus(Arc::clone(&self.event_bus));

        if self.permissions.write().replace(Arc::new(bridge)).is_some() {
            warn!("on_create without on_destroy; previous pending permission requests dropped");
        }

        self.emit(LifecycleEvent::Create);
    }

    pub fn on_destroy(&self) {
        info!("Activity destroyed");
        self.lifecycle.quit_app();
        self.lifecycle.clear_data_cache();

        let bridge = self.permissions.write().take();
        if let Some(bridge) = bridge {
            debug!(pending = bridge.pending_count(), "Releasing permission bridge");
        }
        *self.content_view.write() = None;

        self.emit(LifecycleEvent::Destroy);
        let _ = self.event_bus.emit(Event::Shutdown);
    }

    pub fn on_pause(&self) {
        self.lifecycle.suspend();
        self.emit(LifecycleEvent::Pause);
    }

    pub fn on_resume(&self) {
        self.lifecycle.resume();
        self.emit(LifecycleEvent::Resume);
    }

    pub fn on_configuration_changed(&self, config: &Configuration) {
        self.lifecycle.configuration_changed(config);
        self.emit(LifecycleEvent::ConfigurationChanged(config.clone()));
    }

    pub fn on_new_intent(&self, intent: &Intent) {
        self.lifecycle.new_intent(intent);
        self.emit(LifecycleEvent::NewIntent(intent.clone()));
    }

    pub fn on_activity_result(&self, request_code: i32, result_code: i32) {
        self.lifecycle.activity_result(request_code, result_code);
        self.emit(LifecycleEvent::ActivityResult { request_code, result_code });
    }

    /// Route the back button to the focused view instead of finishing the activity
    pub fn on_back_pressed(&self) {
        let view = self.lifecycle.focused_or_default_view();
        if let Some(view) = view {
            self.lifecycle.back_button_pressed(view);
        }
        self.emit(LifecycleEvent::BackPressed { view });
    }

    /// Host permission result entry point
    pub fn on_request_permissions_result(&self, request_code: i32, grant_results: &[i32]) {
        match self.permissions() {
            Some(bridge) => bridge.on_request_permissions_result(request_code, grant_results),
            None => debug!(request_code, "Permission result with no running activity"),
        }
    }

    fn emit(&self, event: LifecycleEvent) {
        debug!("Lifecycle: {}", event.name());
        let _ = self.event_bus.emit(Event::Lifecycle(event));
    }
}
