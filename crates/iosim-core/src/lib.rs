//! Simulated Cisco IOS command-line engine.
//!
//! Everything here works on plain value snapshots: a command goes in with a
//! [`DeviceConfig`], and a new snapshot comes out. The pieces:
//!
//! - **[`Grammar`]** -- Deterministic recognizer for the IOS command set,
//!   keyed on the current [`Mode`]. Accepts any unambiguous keyword prefix
//!   and answers with IOS-style errors (caret markers, `% Incomplete
//!   command.`). Lines it does not recognize are reported as unmatched.
//!
//! - **[`FallbackResolver`]** -- Handles unmatched lines through an injected
//!   [`Synthesizer`]. Replies are bounded by a timeout, and any proposed
//!   [`StateDelta`] is validated as a whole before it touches the snapshot.
//!   Failures come back as a generic system error, never as state changes.
//!
//! - **[`converge()`]** -- Recomputes link status and derived routes for a
//!   [`Topology`] with synchronous distance-vector rounds between devices
//!   whose routing processes cover the shared link.
//!
//! - **[`Session`]** -- One command against one device: interpret, merge the
//!   [`CommandResult`], and reconverge the surrounding topology.

pub mod command;
pub mod config;
pub mod convergence;
pub mod error;
pub mod fallback;
pub mod grammar;
pub mod interpreter;
pub mod model;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{CommandResult, INCOMPLETE_COMMAND, INVALID_INPUT, SYSTEM_ERROR};
pub use config::{DEFAULT_ENDPOINT, EngineConfig, FallbackConfig, TlsVerification};
pub use convergence::{Converged, ConvergenceOptions, ConvergenceReport, converge};
pub use error::CoreError;
pub use fallback::{
    CompletionSynthesizer, FallbackResolver, StateDelta, Synthesis, SynthesisContext, Synthesizer,
};
pub use grammar::{Grammar, Outcome};
pub use interpreter::Interpreter;
pub use session::{Session, SessionOutcome};

pub use model::{
    DeviceConfig, DeviceId, Endpoint, Interface, Ipv4Prefix, Link, LinkStatus, Mode, Route,
    RouteSource, Topology, TopologyContext,
};
