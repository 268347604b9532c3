// ── Generative fallback resolver ──
//
// Handles the lines the grammar does not cover. A `Synthesizer` proposes
// what IOS would print and how the device would change; the resolver
// bounds the call, validates the proposal, and fails closed on anything
// it cannot trust.

mod completion;
mod delta;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::command::{CommandResult, INVALID_INPUT};
use crate::error::CoreError;
use crate::model::{DeviceConfig, Mode, RouteSource};

pub use completion::{CompletionSynthesizer, SYSTEM_PROMPT, parse_synthesis};
pub use delta::{DeltaError, InterfacePatch, StateDelta, StaticRouteSpec, VlanPatch};

/// Replies longer than this are cut at a character boundary.
pub const MAX_OUTPUT_BYTES: usize = 8 * 1024;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Source of proposed results for unmatched commands.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, context: &SynthesisContext) -> Result<Synthesis, CoreError>;
}

// ── Request / reply shapes ──────────────────────────────────────────

/// Everything the synthesizer is told about one unmatched line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesisContext {
    pub mode: Mode,
    pub prompt: String,
    pub device: StateSummary,
    pub command: String,
}

impl SynthesisContext {
    pub fn new(state: &DeviceConfig, command: &str) -> Self {
        Self {
            mode: state.mode.clone(),
            prompt: state.prompt(),
            device: StateSummary::of(state),
            command: command.trim().to_owned(),
        }
    }
}

/// Compact view of a device: enough to answer most commands without
/// shipping the full snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSummary {
    pub hostname: String,
    pub interfaces: Vec<InterfaceSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vlans: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub static_routes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceSummary {
    pub name: String,
    pub shutdown: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switchport: Option<String>,
}

impl StateSummary {
    pub fn of(state: &DeviceConfig) -> Self {
        let interfaces = state
            .interfaces
            .iter()
            .map(|(name, iface)| InterfaceSummary {
                name: name.clone(),
                shutdown: iface.shutdown,
                address: iface.address.map(|a| a.to_string()),
                switchport: iface
                    .effective_access_vlan()
                    .map(|v| format!("access vlan {v}"))
                    .or_else(|| iface.is_switchport().then(|| "trunk".to_owned())),
            })
            .collect();
        let vlans = state
            .vlans
            .iter()
            .map(|(id, vlan)| format!("{id} {}", vlan.name))
            .collect();
        let static_routes = state
            .routes_from(RouteSource::Static)
            .map(|r| {
                let target = r
                    .next_hop
                    .map(|h| h.to_string())
                    .or_else(|| r.interface.clone())
                    .unwrap_or_default();
                format!("{} via {target}", r.destination)
            })
            .collect();
        Self {
            hostname: state.hostname.clone(),
            interfaces,
            vlans,
            static_routes,
        }
    }
}

/// A synthesizer's answer. `delta` stays raw JSON until the resolver
/// decides whether to trust it, so a bad delta never costs the output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Synthesis {
    pub valid: bool,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub delta: Option<serde_json::Value>,
}

// ── Resolver ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct FallbackResolver {
    synthesizer: Option<Arc<dyn Synthesizer>>,
    timeout: Duration,
}

impl std::fmt::Debug for FallbackResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackResolver")
            .field("enabled", &self.is_enabled())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl FallbackResolver {
    pub fn new(synthesizer: Arc<dyn Synthesizer>, timeout: Duration) -> Self {
        Self {
            synthesizer: Some(synthesizer),
            timeout,
        }
    }

    /// No synthesizer: unmatched lines are rejected as invalid input.
    pub fn disabled() -> Self {
        Self {
            synthesizer: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.synthesizer.is_some()
    }

    /// Resolve a line the grammar could not. Never returns an error: every
    /// failure becomes an invalid `CommandResult` with no state change.
    pub async fn resolve(&self, state: &DeviceConfig, line: &str) -> CommandResult {
        let Some(synthesizer) = &self.synthesizer else {
            return invalid_input(state, line);
        };

        let context = SynthesisContext::new(state, line);
        info!(mode = %state.mode.kind(), command = %context.command, "resolving through fallback");

        let synthesis =
            match tokio::time::timeout(self.timeout, synthesizer.synthesize(&context)).await {
                Ok(Ok(synthesis)) => synthesis,
                Ok(Err(e)) => {
                    warn!(error = %e, "fallback failed");
                    return CommandResult::system_error();
                }
                Err(_) => {
                    warn!(
                        timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                        "fallback timed out"
                    );
                    return CommandResult::system_error();
                }
            };
        accept(state, synthesis)
    }
}

/// Turn a synthesis into a result, applying its delta only if it passes
/// validation as a whole.
fn accept(state: &DeviceConfig, synthesis: Synthesis) -> CommandResult {
    let output = truncate(synthesis.output);
    if !synthesis.valid {
        let error = synthesis
            .error
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| INVALID_INPUT.to_owned());
        return CommandResult {
            output,
            ..CommandResult::rejected(error)
        };
    }

    let Some(raw) = synthesis.delta.filter(|d| !d.is_null()) else {
        return CommandResult::ok(output);
    };
    let delta = match serde_json::from_value::<StateDelta>(raw) {
        Ok(delta) => delta,
        Err(e) => {
            warn!(error = %e, "discarding undecodable fallback delta");
            return CommandResult::ok(output);
        }
    };
    match delta.apply(state) {
        Ok(next) => CommandResult::transition(state, next, output),
        Err(e) => {
            warn!(error = %e, "discarding invalid fallback delta");
            CommandResult::ok(output)
        }
    }
}

fn truncate(mut output: String) -> String {
    if output.len() > MAX_OUTPUT_BYTES {
        let mut cut = MAX_OUTPUT_BYTES;
        while !output.is_char_boundary(cut) {
            cut -= 1;
        }
        output.truncate(cut);
    }
    output
}

/// IOS rejection with the caret under the first token.
fn invalid_input(state: &DeviceConfig, line: &str) -> CommandResult {
    let leading = line.chars().take_while(|c| c.is_whitespace()).count();
    let column = state.prompt().chars().count() + leading;
    CommandResult::rejected(format!("{}^\n{INVALID_INPUT}", " ".repeat(column)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::command::SYSTEM_ERROR;
    use crate::model::ModeKind;

    /// Canned synthesizer that counts calls.
    struct Canned {
        reply: Result<&'static str, &'static str>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl Canned {
        fn reply(json: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(json),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(message: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(r#"{"valid": true}"#),
                delay,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Synthesizer for Canned {
        async fn synthesize(&self, _context: &SynthesisContext) -> Result<Synthesis, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.reply {
                Ok(json) => parse_synthesis(json),
                Err(message) => Err(CoreError::ConnectionFailed {
                    reason: message.into(),
                }),
            }
        }
    }

    fn resolver(synth: Arc<Canned>) -> FallbackResolver {
        FallbackResolver::new(synth, DEFAULT_TIMEOUT)
    }

    fn global() -> DeviceConfig {
        let mut r1 = DeviceConfig::router("R1");
        r1.mode = Mode::GlobalConfig;
        r1
    }

    #[tokio::test]
    async fn disabled_resolver_rejects_with_caret() {
        let r1 = DeviceConfig::router("R1");
        let result = FallbackResolver::disabled().resolve(&r1, "  frobnicate").await;
        assert!(!result.valid);
        assert_eq!(
            result.error,
            Some(format!("{}^\n{INVALID_INPUT}", " ".repeat(5)))
        );
    }

    #[tokio::test]
    async fn valid_reply_with_delta_changes_state() {
        let synth = Canned::reply(
            r#"{"valid": true, "output": "", "delta": {"hostname": "Lab1"}}"#,
        );
        let result = resolver(synth.clone()).resolve(&global(), "hostnam Lab1").await;
        assert!(result.valid);
        assert_eq!(result.hostname_change.as_deref(), Some("Lab1"));
        assert_eq!(result.new_state.unwrap().hostname, "Lab1");
        assert_eq!(synth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn synthesizer_error_fails_closed() {
        let result = resolver(Canned::failing("connection refused"))
            .resolve(&global(), "frobnicate the uplink")
            .await;
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some(SYSTEM_ERROR));
        assert!(!result.changes_state());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_synthesizer_times_out() {
        let result = resolver(Canned::slow(Duration::from_secs(60)))
            .resolve(&global(), "frobnicate")
            .await;
        assert_eq!(result, CommandResult::system_error());
    }

    #[tokio::test]
    async fn malformed_reply_fails_closed() {
        let result = resolver(Canned::reply("sure, that works"))
            .resolve(&global(), "frobnicate")
            .await;
        assert_eq!(result.error.as_deref(), Some(SYSTEM_ERROR));
    }

    #[tokio::test]
    async fn invalid_delta_is_discarded_but_output_kept() {
        let synth = Canned::reply(
            r#"{"valid": true, "output": "NTP configured", "delta": {"hostname": "bad name!"}}"#,
        );
        let result = resolver(synth).resolve(&global(), "ntp server 1.2.3.4").await;
        assert!(result.valid);
        assert_eq!(result.output, "NTP configured");
        assert!(!result.changes_state());
    }

    #[tokio::test]
    async fn illegal_mode_jump_is_discarded() {
        let synth = Canned::reply(
            r#"{"valid": true, "delta": {"mode": {"kind": "global-config"}}}"#,
        );
        let user = DeviceConfig::router("R1");
        let result = resolver(synth).resolve(&user, "conft").await;
        assert!(result.valid);
        assert_eq!(result.mode_change, None);
        assert_eq!(user.mode.kind(), ModeKind::User);
    }

    #[tokio::test]
    async fn config_delta_from_user_exec_is_discarded() {
        let synth = Canned::reply(
            r#"{"valid": true, "delta": {
                "hostname": "Pwned",
                "interfaces": {"g0/0": {"shutdown": false, "address": "10.9.9.1/24"}},
                "static_routes": [{"destination": "0.0.0.0/0", "next_hop": "10.9.9.254"}]
            }}"#,
        );
        let user = DeviceConfig::router("R1");
        let result = resolver(synth).resolve(&user, "hostnme Pwned").await;
        assert!(result.valid);
        assert!(!result.changes_state());
        assert_eq!(result.hostname_change, None);
    }

    #[tokio::test]
    async fn unknown_delta_keys_are_discarded() {
        let synth = Canned::reply(r#"{"valid": true, "output": "x", "delta": {"clock": "now"}}"#);
        let result = resolver(synth).resolve(&global(), "clock set").await;
        assert_eq!(result, CommandResult::ok("x"));
    }

    #[tokio::test]
    async fn rejection_without_message_uses_generic_error() {
        let synth = Canned::reply(r#"{"valid": false, "delta": {"hostname": "X"}}"#);
        let result = resolver(synth).resolve(&global(), "bogus").await;
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some(INVALID_INPUT));
        assert!(!result.changes_state());
    }

    #[test]
    fn long_output_is_truncated_on_char_boundary() {
        let text = "é".repeat(MAX_OUTPUT_BYTES);
        let cut = truncate(text);
        assert!(cut.len() <= MAX_OUTPUT_BYTES);
        assert!(cut.chars().all(|c| c == 'é'));
    }

    #[test]
    fn summary_lists_interfaces_and_statics() {
        let mut r1 = global();
        r1.routes.push(crate::model::Route::static_via(
            "0.0.0.0/0".parse().unwrap(),
            "192.0.2.1".parse().unwrap(),
        ));
        let summary = StateSummary::of(&r1);
        assert_eq!(summary.interfaces.len(), 3);
        assert_eq!(summary.static_routes, vec!["0.0.0.0/0 via 192.0.2.1"]);
    }
}
