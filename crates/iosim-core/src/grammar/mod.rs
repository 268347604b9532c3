// ── Deterministic command grammar ──
//
// Token-level recognizer for the IOS command set, keyed on the current
// mode. Keywords match on any unambiguous prefix. A line is either
// recognized (and answered, possibly with an IOS-style error) or reported
// as unmatched so the fallback resolver can take it.

mod exec;
mod global;
mod interface;
mod ping;
mod router;
mod show;
mod vlan;

use std::net::Ipv4Addr;

use crate::command::{CommandResult, INCOMPLETE_COMMAND, INVALID_INPUT};
use crate::model::{DeviceConfig, Mode, TopologyContext, addr};

/// What the grammar made of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Recognized: the result is final, valid or not.
    Matched(CommandResult),
    /// No rule covers the leading tokens.
    Unmatched,
}

/// The deterministic recognizer. Stateless: everything it needs arrives
/// with each call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Grammar;

impl Grammar {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(
        &self,
        state: &DeviceConfig,
        line: &str,
        topology: Option<&TopologyContext>,
    ) -> Outcome {
        let cx = Cmd::new(state, Line::parse(line), topology);
        if cx.line.is_empty() || line.trim_start().starts_with('!') {
            return Outcome::Matched(CommandResult::ok(""));
        }

        let step = match &state.mode {
            Mode::User => exec::user(&cx),
            Mode::Privileged => exec::privileged(&cx),
            Mode::GlobalConfig => global::evaluate(&cx),
            Mode::InterfaceConfig { interface } => interface::evaluate(&cx, interface),
            Mode::VlanConfig { vlan } => vlan::evaluate(&cx, *vlan),
            Mode::RouterConfig { protocol } => router::evaluate(&cx, *protocol),
        };
        match step {
            Ok(result) | Err(Stop::Reply(result)) => Outcome::Matched(result),
            Err(Stop::Unmatched) => Outcome::Unmatched,
        }
    }
}

// ── Tokens ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    /// Byte offset into the raw line.
    offset: usize,
}

#[derive(Debug, Clone)]
struct Line<'a> {
    raw: &'a str,
    tokens: Vec<Token<'a>>,
}

impl<'a> Line<'a> {
    fn parse(raw: &'a str) -> Self {
        let mut tokens = Vec::new();
        let mut start = None;
        for (i, c) in raw.char_indices() {
            match (c.is_whitespace(), start) {
                (false, None) => start = Some(i),
                (true, Some(s)) => {
                    tokens.push(Token {
                        text: &raw[s..i],
                        offset: s,
                    });
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            tokens.push(Token {
                text: &raw[s..],
                offset: s,
            });
        }
        Self { raw, tokens }
    }

    fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn len(&self) -> usize {
        self.tokens.len()
    }

    fn get(&self, index: usize) -> Option<&'a str> {
        self.tokens.get(index).map(|t| t.text)
    }

    /// Raw text from token `index` to the end of the line, spacing kept.
    fn rest(&self, index: usize) -> Option<&'a str> {
        self.tokens
            .get(index)
            .map(|t| self.raw[t.offset..].trim_end())
    }

    /// The same line with the first `n` tokens dropped. Offsets still
    /// index the original text so carets stay aligned.
    fn skip(&self, n: usize) -> Self {
        Self {
            raw: self.raw,
            tokens: self.tokens.iter().skip(n).copied().collect(),
        }
    }
}

// ── Keyword matching ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword<'k> {
    Hit(&'k str),
    Ambiguous,
    Miss,
}

/// Case-insensitive match of `token` against `table`: an exact keyword
/// wins outright, otherwise the token must prefix exactly one keyword.
fn keyword<'k>(token: &str, table: &[&'k str]) -> Keyword<'k> {
    let token = token.to_ascii_lowercase();
    if let Some(exact) = table.iter().find(|k| **k == token) {
        return Keyword::Hit(exact);
    }
    let mut hits = table.iter().filter(|k| k.starts_with(&token));
    match (hits.next(), hits.next()) {
        (Some(only), None) => Keyword::Hit(only),
        (Some(_), Some(_)) => Keyword::Ambiguous,
        _ => Keyword::Miss,
    }
}

/// How to treat a token no keyword matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnMiss {
    /// Let the fallback resolver try the line.
    Defer,
    /// The command is known; reject with a caret under the token.
    Reject,
}

/// Early exit from a handler: either a final reply or a hand-off.
#[derive(Debug)]
enum Stop {
    Reply(CommandResult),
    Unmatched,
}

type Step<T> = Result<T, Stop>;

// ── Evaluation context ──────────────────────────────────────────────

struct Cmd<'a> {
    state: &'a DeviceConfig,
    line: Line<'a>,
    topology: Option<&'a TopologyContext>,
}

impl<'a> Cmd<'a> {
    fn new(state: &'a DeviceConfig, line: Line<'a>, topology: Option<&'a TopologyContext>) -> Self {
        Self {
            state,
            line,
            topology,
        }
    }

    /// This command with its leading `n` tokens consumed (`do`, `no`).
    fn shifted(&self, n: usize) -> Self {
        Self {
            state: self.state,
            line: self.line.skip(n),
            topology: self.topology,
        }
    }

    // ── Replies ──

    fn invalid_at(&self, index: usize) -> Stop {
        let Some(token) = self.line.tokens.get(index) else {
            return self.incomplete();
        };
        let column =
            self.state.prompt().chars().count() + self.line.raw[..token.offset].chars().count();
        Stop::Reply(CommandResult::rejected(format!(
            "{}^\n{INVALID_INPUT}",
            " ".repeat(column)
        )))
    }

    fn incomplete(&self) -> Stop {
        Stop::Reply(CommandResult::rejected(INCOMPLETE_COMMAND))
    }

    fn ambiguous(&self) -> Stop {
        Stop::Reply(CommandResult::rejected(format!(
            "% Ambiguous command:  \"{}\"",
            self.line.raw.trim()
        )))
    }

    fn fail(error: impl Into<String>) -> Stop {
        Stop::Reply(CommandResult::rejected(error))
    }

    // ── Token accessors ──

    fn keyword<'k>(&self, index: usize, table: &[&'k str], on_miss: OnMiss) -> Step<&'k str> {
        let token = self.arg(index)?;
        match keyword(token, table) {
            Keyword::Hit(k) => Ok(k),
            Keyword::Ambiguous => Err(self.ambiguous()),
            Keyword::Miss => match on_miss {
                OnMiss::Defer => Err(Stop::Unmatched),
                OnMiss::Reject => Err(self.invalid_at(index)),
            },
        }
    }

    fn arg(&self, index: usize) -> Step<&'a str> {
        self.line.get(index).ok_or_else(|| self.incomplete())
    }

    fn end(&self, index: usize) -> Step<()> {
        if index < self.line.len() {
            Err(self.invalid_at(index))
        } else {
            Ok(())
        }
    }

    fn ipv4(&self, index: usize) -> Step<Ipv4Addr> {
        addr::parse_ipv4(self.arg(index)?).ok_or_else(|| self.invalid_at(index))
    }

    /// A dotted-quad netmask, returned as a prefix length.
    fn mask(&self, index: usize) -> Step<u8> {
        addr::mask_len(self.ipv4(index)?).ok_or_else(|| self.invalid_at(index))
    }

    fn number(&self, index: usize, range: std::ops::RangeInclusive<u32>) -> Step<u32> {
        self.arg(index)?
            .parse::<u32>()
            .ok()
            .filter(|n| range.contains(n))
            .ok_or_else(|| self.invalid_at(index))
    }
}

/// Commands available as the first token in every configuration mode.
const CONFIG_COMMON: [&str; 3] = ["do", "end", "exit"];

/// `end`, `exit`, and `do` behave the same in every configuration sub-mode
/// except for where `exit` lands.
fn config_common(cx: &Cmd<'_>, command: &str, exit_to: Mode) -> Step<CommandResult> {
    match command {
        "do" => exec::run_do(cx),
        "end" => {
            cx.end(1)?;
            Ok(enter(cx.state, Mode::Privileged))
        }
        _ => {
            cx.end(1)?;
            Ok(enter(cx.state, exit_to))
        }
    }
}

/// Transition to `mode` with no other change.
fn enter(state: &DeviceConfig, mode: Mode) -> CommandResult {
    let mut next = state.clone();
    next.mode = mode;
    CommandResult::transition(state, next, "")
}
