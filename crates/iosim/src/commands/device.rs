//! Device subcommand handlers.

use iosim_core::DeviceConfig;
use iosim_core::model::is_valid_hostname;

use crate::cli::{DeviceArgs, DeviceCommand, DeviceKind};
use crate::commands::Context;
use crate::error::CliError;
use crate::output;
use crate::snapshot;

pub fn factory_default(hostname: &str, kind: DeviceKind) -> Result<DeviceConfig, CliError> {
    if !is_valid_hostname(hostname) {
        return Err(CliError::Validation {
            field: "hostname".into(),
            reason: format!(
                "'{hostname}' must start with a letter and contain only letters, digits, and hyphens"
            ),
        });
    }
    Ok(match kind {
        DeviceKind::Router => DeviceConfig::router(hostname),
        DeviceKind::Switch => DeviceConfig::switch(hostname),
    })
}

pub fn handle(args: DeviceArgs, ctx: &Context) -> Result<(), CliError> {
    match args.command {
        DeviceCommand::New {
            hostname,
            kind,
            file,
        } => {
            let device = factory_default(&hostname, kind)?;

            if let Some(path) = file {
                snapshot::write(&path, &device)?;
                if !ctx.quiet {
                    eprintln!("✓ Wrote {} to {}", device.hostname, path.display());
                }
                return Ok(());
            }

            // A snapshot has no terminal rendering of its own; text is JSON.
            let text = output::render_json(&device, false)?;
            let out = output::render_single(ctx.format, &device, |_| text.clone())?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn router_and_switch_profiles() {
        let r1 = factory_default("R1", DeviceKind::Router).unwrap();
        assert_eq!(r1.prompt(), "R1>");
        assert!(r1.interfaces.contains_key("GigabitEthernet0/2"));

        let sw = factory_default("SW1", DeviceKind::Switch).unwrap();
        assert!(sw.is_switch());
        assert!(sw.interfaces.contains_key("FastEthernet0/24"));
    }

    #[test]
    fn illegal_hostname_is_rejected() {
        let err = factory_default("1bad", DeviceKind::Router).unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));
    }
}
