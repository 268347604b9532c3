// ── Command results ──
//
// The single shape every command evaluation produces, whether the grammar
// or the fallback resolver handled it.

use serde::{Deserialize, Serialize};

use crate::model::{DeviceConfig, Mode};

/// Generic error for resolver failures. Never reveals why the call failed.
pub const SYSTEM_ERROR: &str = "% System error: command could not be processed";

/// Generic rejection when nothing recognizes the input.
pub const INVALID_INPUT: &str = "% Invalid input detected at '^' marker.";

pub const INCOMPLETE_COMMAND: &str = "% Incomplete command.";

/// Outcome of evaluating one command line.
///
/// `new_state` is a full snapshot and takes precedence over the individual
/// `mode_change`/`hostname_change` deltas when a caller merges results.
/// Invalid results never carry state changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub valid: bool,
    #[serde(default)]
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_change: Option<Mode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname_change: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_state: Option<DeviceConfig>,
}

impl CommandResult {
    /// Accepted, with terminal output and no state change.
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            valid: true,
            output: output.into(),
            ..Self::default()
        }
    }

    /// Rejected with an IOS-style error message.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn system_error() -> Self {
        Self::rejected(SYSTEM_ERROR)
    }

    /// Accepted, moving from `before` to `after`. Mode and hostname deltas
    /// are filled in alongside the full snapshot; an unchanged snapshot
    /// yields no state fields at all.
    pub fn transition(before: &DeviceConfig, after: DeviceConfig, output: impl Into<String>) -> Self {
        let mut result = Self::ok(output);
        if after.mode != before.mode {
            result.mode_change = Some(after.mode.clone());
        }
        if after.hostname != before.hostname {
            result.hostname_change = Some(after.hostname.clone());
        }
        if after != *before {
            result.new_state = Some(after);
        }
        result
    }

    pub fn changes_state(&self) -> bool {
        self.new_state.is_some() || self.mode_change.is_some() || self.hostname_change.is_some()
    }

    /// Apply this result to `state`: the full snapshot wins, otherwise the
    /// individual deltas. Invalid results leave `state` untouched.
    pub fn apply_to(&self, state: &mut DeviceConfig) {
        if !self.valid {
            return;
        }
        if let Some(next) = &self.new_state {
            state.clone_from(next);
            return;
        }
        if let Some(mode) = &self.mode_change {
            state.mode = mode.clone();
        }
        if let Some(hostname) = &self.hostname_change {
            state.hostname.clone_from(hostname);
        }
    }
}
