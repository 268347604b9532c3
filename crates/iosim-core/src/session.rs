// ── Session orchestrator ──
//
// One command against one device: interpret, merge the result into the
// snapshot, then reconverge whatever topology the device lives in. Every
// call takes and returns full snapshots; nothing is retained between calls.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::command::CommandResult;
use crate::config::EngineConfig;
use crate::convergence::{ConvergenceOptions, ConvergenceReport, converge};
use crate::error::CoreError;
use crate::fallback::{CompletionSynthesizer, FallbackResolver, Synthesizer};
use crate::interpreter::Interpreter;
use crate::model::{DeviceConfig, Topology, TopologyContext};

/// Device id used when a lone device is converged on its own.
const LOCAL_DEVICE: &str = "local";

/// Everything a caller needs after one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionOutcome {
    pub result: CommandResult,
    /// The device after the command, routes refreshed.
    pub device: DeviceConfig,
    pub prompt: String,
    /// The reconverged topology, when one was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topology: Option<Topology>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convergence: Option<ConvergenceReport>,
}

#[derive(Debug, Clone)]
pub struct Session {
    interpreter: Interpreter,
    convergence: ConvergenceOptions,
}

impl Session {
    /// Build from engine configuration. A configured fallback gets a
    /// completion-service synthesizer; otherwise the session is offline.
    pub fn new(config: &EngineConfig) -> Result<Self, CoreError> {
        let resolver = match &config.fallback {
            Some(fallback) => {
                let synthesizer = CompletionSynthesizer::from_config(fallback)?;
                FallbackResolver::new(Arc::new(synthesizer), fallback.timeout)
            }
            None => FallbackResolver::disabled(),
        };
        Ok(Self {
            interpreter: Interpreter::new(resolver),
            convergence: config.convergence,
        })
    }

    pub fn with_synthesizer(
        synthesizer: Arc<dyn Synthesizer>,
        timeout: Duration,
        convergence: ConvergenceOptions,
    ) -> Self {
        Self {
            interpreter: Interpreter::new(FallbackResolver::new(synthesizer, timeout)),
            convergence,
        }
    }

    pub fn offline(convergence: ConvergenceOptions) -> Self {
        Self {
            interpreter: Interpreter::offline(),
            convergence,
        }
    }

    pub fn fallback_enabled(&self) -> bool {
        self.interpreter.resolver().is_enabled()
    }

    /// Run `line` against `device`.
    ///
    /// With a topology, the updated device replaces its entry and the whole
    /// topology is reconverged; the device is then read back so its derived
    /// routes reflect the new graph. Without one, a changed device is
    /// converged alone to refresh its connected routes. Rejected commands
    /// leave everything as it was.
    pub async fn handle(
        &self,
        device: DeviceConfig,
        line: &str,
        topology: Option<TopologyContext>,
    ) -> Result<SessionOutcome, CoreError> {
        if let Some(ctx) = &topology {
            if !ctx.topology.devices.contains_key(&ctx.device_id) {
                return Err(CoreError::DeviceNotFound {
                    identifier: ctx.device_id.to_string(),
                });
            }
        }

        let result = self
            .interpreter
            .interpret(&device, line, topology.as_ref())
            .await;
        let mut device = device;
        result.apply_to(&mut device);

        let (device, topology, convergence) = match topology {
            Some(ctx) if result.valid => {
                let (device, topology, report) = self.reconverge(ctx, device)?;
                (device, Some(topology), Some(report))
            }
            Some(ctx) => (device, Some(ctx.topology), None),
            None if result.valid && result.changes_state() => {
                let ctx = TopologyContext::new(Topology::new(), LOCAL_DEVICE);
                let (device, _, _) = self.reconverge(ctx, device)?;
                (device, None, None)
            }
            None => (device, None, None),
        };

        Ok(SessionOutcome {
            prompt: device.prompt(),
            result,
            device,
            topology,
            convergence,
        })
    }

    fn reconverge(
        &self,
        ctx: TopologyContext,
        device: DeviceConfig,
    ) -> Result<(DeviceConfig, Topology, ConvergenceReport), CoreError> {
        let TopologyContext {
            mut topology,
            device_id,
        } = ctx;
        topology.devices.insert(device_id.clone(), device);

        let converged = converge(topology, &self.convergence);
        debug!(
            device = %device_id,
            iterations = converged.report.iterations,
            converged = converged.report.converged,
            links_up = converged.report.links_up,
            "topology reconverged"
        );
        let device = converged
            .topology
            .devices
            .get(&device_id)
            .cloned()
            .ok_or_else(|| CoreError::Internal(format!("device {device_id} lost during convergence")))?;
        Ok((device, converged.topology, converged.report))
    }
}
