// User and privileged EXEC commands, plus `do` from configuration modes.

use super::{Cmd, OnMiss, Step, enter, ping, show};
use crate::command::CommandResult;
use crate::model::Mode;

const USER: &[&str] = &["enable", "exit", "logout", "ping", "show"];

const PRIVILEGED: &[&str] = &[
    "configure",
    "copy",
    "disable",
    "enable",
    "exit",
    "logout",
    "ping",
    "show",
    "write",
];

/// EXEC commands reachable through `do`.
const DO: &[&str] = &["copy", "ping", "show", "write"];

const CONFIG_BANNER: &str = "Enter configuration commands, one per line.  End with CNTL/Z.";

pub(super) fn user(cx: &Cmd<'_>) -> Step<CommandResult> {
    match cx.keyword(0, USER, OnMiss::Defer)? {
        "enable" => {
            cx.end(1)?;
            Ok(enter(cx.state, Mode::Privileged))
        }
        "ping" => ping::evaluate(&cx.shifted(1)),
        "show" => show::evaluate(&cx.shifted(1), false),
        // exit, logout: the session stays where it is.
        _ => {
            cx.end(1)?;
            Ok(CommandResult::ok(""))
        }
    }
}

pub(super) fn privileged(cx: &Cmd<'_>) -> Step<CommandResult> {
    match cx.keyword(0, PRIVILEGED, OnMiss::Defer)? {
        "configure" => {
            if cx.line.len() > 1 {
                cx.keyword(1, &["terminal"], OnMiss::Reject)?;
                cx.end(2)?;
            }
            Ok(CommandResult {
                output: CONFIG_BANNER.into(),
                ..enter(cx.state, Mode::GlobalConfig)
            })
        }
        "copy" => copy(cx),
        "disable" => {
            cx.end(1)?;
            Ok(enter(cx.state, Mode::User))
        }
        "ping" => ping::evaluate(&cx.shifted(1)),
        "show" => show::evaluate(&cx.shifted(1), true),
        "write" => write(cx),
        // enable, exit, logout
        _ => {
            cx.end(1)?;
            Ok(CommandResult::ok(""))
        }
    }
}

/// `do <exec command>` from any configuration mode. The mode never changes.
pub(super) fn run_do(cx: &Cmd<'_>) -> Step<CommandResult> {
    let inner = cx.shifted(1);
    match inner.keyword(0, DO, OnMiss::Reject)? {
        "copy" => copy(&inner),
        "ping" => ping::evaluate(&inner.shifted(1)),
        "show" => show::evaluate(&inner.shifted(1), true),
        _ => write(&inner),
    }
}

fn write(cx: &Cmd<'_>) -> Step<CommandResult> {
    if cx.line.len() > 1 {
        cx.keyword(1, &["memory"], OnMiss::Reject)?;
        cx.end(2)?;
    }
    Ok(CommandResult::ok("Building configuration...\n[OK]"))
}

fn copy(cx: &Cmd<'_>) -> Step<CommandResult> {
    let source = cx.keyword(1, &["running-config", "startup-config"], OnMiss::Reject)?;
    if source != "running-config" {
        return Err(cx.invalid_at(1));
    }
    let dest = cx.keyword(2, &["running-config", "startup-config"], OnMiss::Reject)?;
    if dest != "startup-config" {
        return Err(cx.invalid_at(2));
    }
    cx.end(3)?;
    Ok(CommandResult::ok(
        "Destination filename [startup-config]? \nBuilding configuration...\n[OK]",
    ))
}
