//! Command dispatch and the pieces every device command shares.

pub mod config_cmd;
pub mod converge;
pub mod device;
pub mod exec;
pub mod shell;

use clap::ValueEnum;
use tracing::warn;

use iosim_config::{Config, ConfigError};
use iosim_core::{ConvergenceOptions, DeviceConfig, Session, Topology, TopologyContext};

use crate::cli::{Command, GlobalOpts, OutputFormat, TargetArgs};
use crate::error::CliError;
use crate::output;
use crate::snapshot;

/// Global flags resolved against the config file.
#[derive(Debug)]
pub struct Context {
    pub format: OutputFormat,
    pub quiet: bool,
    pub color: bool,
    no_fallback: bool,
    config: Config,
}

impl Context {
    pub fn new(global: &GlobalOpts, config: Config) -> Result<Self, CliError> {
        let format = match global.output {
            Some(format) => format,
            None => OutputFormat::from_str(&config.defaults.output, true).map_err(|_| {
                CliError::Validation {
                    field: "defaults.output".into(),
                    reason: format!(
                        "unknown format '{}'; expected text, json, json-compact, or yaml",
                        config.defaults.output
                    ),
                }
            })?,
        };
        Ok(Self {
            format,
            quiet: global.quiet,
            color: output::should_color(global.color),
            no_fallback: global.no_fallback,
            config,
        })
    }

    pub fn convergence(&self) -> Result<ConvergenceOptions, CliError> {
        Ok(iosim_config::convergence_options(&self.config.convergence)?)
    }

    /// A session wired to the configured fallback. A missing API key is
    /// not fatal: the session runs grammar-only and says so once.
    pub fn session(&self) -> Result<Session, CliError> {
        let convergence = self.convergence()?;
        if self.no_fallback || !self.config.fallback.enabled {
            return Ok(Session::offline(convergence));
        }
        match iosim_config::engine_config(&self.config) {
            Ok(engine) => Ok(Session::new(&engine)?),
            Err(ConfigError::NoCredentials) => {
                warn!(
                    "no API key for the command fallback; unrecognized commands will be rejected \
                     (run `iosim config set-key`, or pass --no-fallback to silence this)"
                );
                Ok(Session::offline(convergence))
            }
            Err(err) => Err(err.into()),
        }
    }
}

pub async fn dispatch(cmd: Command, ctx: &Context) -> Result<(), CliError> {
    match cmd {
        Command::Exec(args) => exec::handle(args, ctx).await,
        Command::Shell(args) => shell::handle(&args, ctx).await,
        Command::Converge(args) => converge::handle(&args, ctx),
        Command::Device(args) => device::handle(args, ctx),
        // Handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}

// ── Target loading ──────────────────────────────────────────────────

/// Load the device a command runs on, plus its topology when one is named.
/// Without `--device`, the device is read out of the topology.
pub fn load_target(
    target: &TargetArgs,
) -> Result<(DeviceConfig, Option<TopologyContext>), CliError> {
    let topology = match (&target.topology, &target.device_id) {
        (Some(path), Some(id)) => {
            let topology = snapshot::read_topology(path)?;
            if topology.device(id).is_none() {
                return Err(CliError::DeviceNotFound {
                    identifier: id.clone(),
                    available: topology
                        .devices
                        .keys()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
            Some(TopologyContext::new(topology, id.as_str()))
        }
        (Some(_), None) => {
            return Err(CliError::Validation {
                field: "device-id".into(),
                reason: "--topology needs --device-id to pick a device".into(),
            });
        }
        (None, _) => None,
    };

    let device = match (&target.device, &topology) {
        (Some(path), _) => snapshot::read_device(path)?,
        (None, Some(ctx)) => ctx
            .topology
            .devices
            .get(&ctx.device_id)
            .cloned()
            .ok_or_else(|| CliError::DeviceNotFound {
                identifier: ctx.device_id.to_string(),
                available: String::new(),
            })?,
        (None, None) => {
            return Err(CliError::Validation {
                field: "device".into(),
                reason: "pass --device, or --topology with --device-id".into(),
            });
        }
    };

    Ok((device, topology))
}

/// Write updated snapshots back to whichever files they came from.
pub fn save_target(
    target: &TargetArgs,
    device: &DeviceConfig,
    topology: Option<&Topology>,
) -> Result<(), CliError> {
    if let Some(path) = &target.device {
        snapshot::write(path, device)?;
    }
    if let (Some(path), Some(topology)) = (&target.topology, topology) {
        snapshot::write(path, topology)?;
    }
    Ok(())
}
