//! `iosim shell`: an interactive prompt over one device.
//!
//! Reads lines from stdin until EOF or an EXEC-mode `exit` / `logout`.
//! Every line goes through the same session path as `iosim exec`, with
//! the device and topology carried from one line to the next.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use iosim_core::model::ModeKind;

use crate::cli::{OutputFormat, ShellArgs};
use crate::commands::exec::device_text;
use crate::commands::{Context, load_target, save_target};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: &ShellArgs, ctx: &Context) -> Result<(), CliError> {
    let session = ctx.session()?;
    let (mut device, mut topology) = load_target(&args.target)?;
    let interactive_text = ctx.format == OutputFormat::Text && !ctx.quiet;
    let mut changed = false;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive_text {
            let mut stdout = std::io::stdout().lock();
            write!(stdout, "{}", device.prompt())?;
            stdout.flush()?;
        }

        let Some(line) = lines.next_line().await? else {
            if interactive_text {
                println!();
            }
            break;
        };

        let exec_mode = matches!(device.mode.kind(), ModeKind::User | ModeKind::Privileged);
        let outcome = session
            .handle(device.clone(), &line, topology.clone())
            .await?;

        let out = output::render_single(ctx.format, &outcome, device_text)?;
        output::print_output(&out, ctx.quiet);

        changed |= outcome.result.valid && outcome.result.changes_state();
        let leaving = exec_mode && outcome.result.valid && ends_session(&line);

        device = outcome.device;
        if let (Some(current), Some(next)) = (topology.as_mut(), outcome.topology) {
            current.topology = next;
        }

        if leaving {
            debug!("session closed from EXEC mode");
            break;
        }
    }

    if args.target.write && changed {
        let topology = topology.as_ref().map(|current| &current.topology);
        save_target(&args.target, &device, topology)?;
    }
    Ok(())
}

/// `exit` or `logout`, possibly abbreviated. Only consulted for lines the
/// device accepted, so ambiguous prefixes never get here.
fn ends_session(line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(word), None) => {
            let word = word.to_ascii_lowercase();
            "exit".starts_with(&word) || "logout".starts_with(&word)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_and_logout_end_the_session() {
        assert!(ends_session("exit"));
        assert!(ends_session("  EXI "));
        assert!(ends_session("logout"));
        assert!(ends_session("lo"));
        assert!(!ends_session("enable"));
        assert!(!ends_session("exit now"));
        assert!(!ends_session(""));
    }
}
