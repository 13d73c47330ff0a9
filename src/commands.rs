//! CLI commands for the activity bridge
//!
//! Lets the permission flow be exercised from the command line against the
//! in-process host simulator.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use activity_bridge_core::{AnswerPolicy, BridgeConfig};
use activity_bridge_permissions::{catalog, CallbackHandle, PermissionInfo, PermissionKind};

use crate::activity::ActivityShim;
use crate::simulator::{RecordingLifecycle, SimulatedHost};

/// A `KIND=HANDLE` pair given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestSpec {
    pub kind: PermissionKind,
    pub handle: CallbackHandle,
}

impl FromStr for RequestSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, handle) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KIND=HANDLE, got '{}'", s))?;

        let kind: PermissionKind = kind.parse()?;
        let handle = handle.trim();
        let raw = match handle.strip_prefix("0x").or_else(|| handle.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => handle.parse::<u64>(),
        }
        .with_context(|| format!("invalid callback handle '{}'", handle))?;

        Ok(Self {
            kind,
            handle: CallbackHandle(raw),
        })
    }
}

/// List the supported permission kinds
pub struct KindsCommand;

impl KindsCommand {
    pub fn execute(&self) -> Vec<PermissionInfo> {
        catalog::all()
    }
}

/// One native callback invocation observed during a simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub handle: CallbackHandle,
    pub granted: bool,
}

/// Outcome of a simulated activity lifetime
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Kinds prompted for, in order
    pub prompts: Vec<PermissionKind>,
    /// Native callbacks invoked, in order
    pub invocations: Vec<Invocation>,
    /// Pending table just before the activity was destroyed
    pub pending: Vec<(PermissionKind, CallbackHandle)>,
    /// Requested kinds the simulated application does not declare
    pub undeclared: Vec<PermissionKind>,
}

/// Run one activity lifetime against the host simulator
pub struct SimulateCommand {
    pub grant: Vec<PermissionKind>,
    pub answer: Option<AnswerPolicy>,
    pub requests: Vec<RequestSpec>,
}

impl SimulateCommand {
    /// Execute the simulation
    pub async fn execute(&self, config: &BridgeConfig) -> Result<SimulationReport> {
        let mut sim_config = config.simulator.clone();
        if let Some(answer) = self.answer {
            sim_config.answer = answer;
        }

        let host = Arc::new(SimulatedHost::from_config(&sim_config)?);
        for kind in &self.grant {
            host.grant(*kind);
        }

        let invocations = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&invocations);
        let callback = move |handle: CallbackHandle, granted: bool| {
            info!(%handle, granted, "Native callback invoked");
            sink.lock().push(Invocation { handle, granted });
        };

        let shim = Arc::new(ActivityShim::new(
            Arc::new(RecordingLifecycle::default()),
            host.clone(),
            Arc::new(callback),
        ));

        shim.on_create();
        shim.on_resume();

        let bridge = shim
            .permissions()
            .ok_or_else(|| anyhow!("permission bridge missing after on_create"))?;

        let mut undeclared = Vec::new();
        for spec in &self.requests {
            if !bridge.is_declared(spec.kind) && !undeclared.contains(&spec.kind) {
                undeclared.push(spec.kind);
            }
            info!(permission = %spec.kind, handle = %spec.handle, "Requesting permission");
            bridge.request(spec.kind, spec.handle);
        }

        let target = Arc::clone(&shim);
        let answered = host
            .spawn_delivery(move |code, results| target.on_request_permissions_result(code, results))
            .await
            .context("prompt delivery task failed")?;
        info!(answered, "Host answered prompts");

        let pending = bridge.pending_snapshot();
        drop(bridge);

        shim.on_pause();
        shim.on_destroy();

        let invocations = invocations.lock().clone();
        Ok(SimulationReport {
            prompts: host.prompt_history(),
            invocations,
            pending,
            undeclared,
        })
    }
}
