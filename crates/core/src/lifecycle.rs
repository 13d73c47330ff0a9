//! Lifecycle Bridge Interface
//!
//! The fixed set of calls the activity shim forwards into the embedding
//! native application layer. Implementations live on the native side.

use serde::{Deserialize, Serialize};

/// Identifier of a native view owned by the lifecycle bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewId(pub u64);

/// Device configuration snapshot delivered on configuration change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub orientation: Orientation,
    pub screen_width_dp: u32,
    pub screen_height_dp: u32,
    pub density_dpi: u32,
    pub locale: Option<String>,
}

/// Screen orientation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Undefined,
    Portrait,
    Landscape,
}

/// Intent delivered to an already running activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub action: Option<String>,
    pub data: Option<String>,
    pub extras: Vec<(String, String)>,
}

/// Lifecycle callbacks forwarded by the shim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Create,
    Pause,
    Resume,
    Destroy,
    ConfigurationChanged(Configuration),
    BackPressed { view: Option<ViewId> },
    NewIntent(Intent),
    ActivityResult { request_code: i32, result_code: i32 },
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::Create => "create",
            LifecycleEvent::Pause => "pause",
            LifecycleEvent::Resume => "resume",
            LifecycleEvent::Destroy => "destroy",
            LifecycleEvent::ConfigurationChanged(_) => "configuration-changed",
            LifecycleEvent::BackPressed { .. } => "back-pressed",
            LifecycleEvent::NewIntent(_) => "new-intent",
            LifecycleEvent::ActivityResult { .. } => "activity-result",
        }
    }
}

/// Native application layer reached by the activity shim.
///
/// Every method is a one-way notification; the shim adds no logic beyond
/// calling them in the order the host lifecycle requires.
pub trait LifecycleBridge: Send + Sync {
    fn set_activity_context(&self);
    fn set_screen_saver(&self, enabled: bool);
    fn hide_action_bar(&self);
    fn create_view_for_default_component(&self) -> ViewId;
    fn quit_app(&self);
    fn clear_data_cache(&self);
    fn suspend(&self);
    fn resume(&self);
    fn configuration_changed(&self, config: &Configuration);
    fn new_intent(&self, intent: &Intent);
    fn activity_result(&self, request_code: i32, result_code: i32);
    /// View that currently has focus, or the default view if none does
    fn focused_or_default_view(&self) -> Option<ViewId>;
    fn back_button_pressed(&self, view: ViewId);
}
