//! `iosim exec`: one command line, one device.

use iosim_core::SessionOutcome;

use crate::cli::ExecArgs;
use crate::commands::{Context, load_target, save_target};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: ExecArgs, ctx: &Context) -> Result<(), CliError> {
    let session = ctx.session()?;
    let (device, topology) = load_target(&args.target)?;

    let outcome = session.handle(device, &args.line, topology).await?;

    if args.target.write && outcome.result.valid {
        save_target(&args.target, &outcome.device, outcome.topology.as_ref())?;
    }

    let out = output::render_single(ctx.format, &outcome, device_text)?;
    output::print_output(&out, ctx.quiet);

    if outcome.result.valid {
        Ok(())
    } else {
        Err(CliError::Rejected { line: args.line })
    }
}

/// What the terminal shows after the command: its output, then any error.
pub fn device_text(outcome: &SessionOutcome) -> String {
    let result = &outcome.result;
    let mut parts = Vec::with_capacity(2);
    if !result.output.is_empty() {
        parts.push(result.output.as_str());
    }
    if let Some(error) = &result.error {
        parts.push(error.as_str());
    }
    parts.join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use iosim_core::{CommandResult, DeviceConfig};

    fn outcome(result: CommandResult) -> SessionOutcome {
        let device = DeviceConfig::router("R1");
        SessionOutcome {
            prompt: device.prompt(),
            result,
            device,
            topology: None,
            convergence: None,
        }
    }

    #[test]
    fn text_shows_output_then_error() {
        assert_eq!(device_text(&outcome(CommandResult::ok("hello"))), "hello");
        assert_eq!(
            device_text(&outcome(CommandResult::rejected("% Incomplete command."))),
            "% Incomplete command."
        );
        assert_eq!(device_text(&outcome(CommandResult::ok(""))), "");
    }
}
