//! Clap derive structures for the `iosim` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// iosim -- a simulated Cisco IOS command line
#[derive(Debug, Parser)]
#[command(
    name = "iosim",
    version,
    about = "Run IOS commands against simulated routers and switches",
    long_about = "Drive simulated Cisco IOS devices from the command line.\n\n\
        Device and topology snapshots are plain JSON (or YAML) files. Commands\n\
        the built-in grammar does not cover can be answered by a language\n\
        model fallback, configured with `iosim config init`.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Output format (defaults to the config file's `defaults.output`)
    #[arg(long, short = 'o', env = "IOSIM_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Never consult the language model; unknown commands are rejected
    #[arg(long, global = true)]
    pub no_fallback: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Device text, as a terminal would show it
    Text,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceKind {
    /// Three GigabitEthernet ports, shut by default
    Router,
    /// 24 FastEthernet access ports in VLAN 1
    Switch,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a single IOS command line against a device
    #[command(alias = "x")]
    Exec(ExecArgs),

    /// Interactive IOS prompt on a device
    #[command(alias = "sh")]
    Shell(ShellArgs),

    /// Recompute link status and routing tables for a topology
    Converge(ConvergeArgs),

    /// Create device snapshots
    #[command(alias = "dev")]
    Device(DeviceArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Target selection ─────────────────────────────────────────────────

/// Which device a command runs on: a standalone snapshot file, a device
/// inside a topology file, or a standalone file placed into a topology.
#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Device snapshot file (JSON or YAML)
    #[arg(long, short = 'd', required_unless_present = "topology")]
    pub device: Option<PathBuf>,

    /// Topology file the device belongs to
    #[arg(long, short = 't', requires = "device_id")]
    pub topology: Option<PathBuf>,

    /// Id of the device within the topology
    #[arg(long, requires = "topology")]
    pub device_id: Option<String>,

    /// Write the updated snapshots back to their files
    #[arg(long, short = 'w')]
    pub write: bool,
}

#[derive(Debug, Args)]
pub struct ExecArgs {
    /// Command line, exactly as typed at the device prompt
    pub line: String,

    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Debug, Args)]
pub struct ShellArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Debug, Args)]
pub struct ConvergeArgs {
    /// Topology file (JSON or YAML)
    pub topology: PathBuf,

    /// Write the converged topology back to the file
    #[arg(long, short = 'w')]
    pub write: bool,
}

// ── Device ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DeviceArgs {
    #[command(subcommand)]
    pub command: DeviceCommand,
}

#[derive(Debug, Subcommand)]
pub enum DeviceCommand {
    /// Print a factory-default device snapshot
    New {
        /// Hostname for the new device
        hostname: String,

        /// Hardware profile
        #[arg(long, short = 'k', default_value = "router")]
        kind: DeviceKind,

        /// Write the snapshot to this file instead of stdout
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Display the effective configuration
    Show,

    /// Print the config file location
    Path,

    /// Store the fallback API key in the system keyring
    SetKey,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
