//! Output formatting: device text, JSON, YAML, and tables.
//!
//! Text output is whatever the device would print. Structured formats
//! serialize the full result so scripts can pick fields out of it.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Render a single item; `text_fn` supplies the text-mode rendering.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    text_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    match format {
        OutputFormat::Text => Ok(text_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let out = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(out)
}

pub fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}

// ── Colored fragments ───────────────────────────────────────────────

pub fn status_word(up: bool, color: bool) -> String {
    match (up, color) {
        (true, true) => "up".green().to_string(),
        (false, true) => "down".red().to_string(),
        (true, false) => "up".into(),
        (false, false) => "down".into(),
    }
}

pub fn warning(text: &str, color: bool) -> String {
    if color {
        text.yellow().bold().to_string()
    } else {
        text.to_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct Sample {
        name: &'static str,
        up: bool,
    }

    #[test]
    fn structured_formats_serialize_the_data() {
        let sample = Sample {
            name: "R1",
            up: true,
        };
        assert_eq!(
            render_single(OutputFormat::JsonCompact, &sample, |_| String::new()).unwrap(),
            r#"{"name":"R1","up":true}"#
        );
        assert_eq!(
            render_single(OutputFormat::Yaml, &sample, |_| String::new()).unwrap(),
            "name: R1\nup: true\n"
        );
        assert_eq!(
            render_single(OutputFormat::Text, &sample, |s| s.name.to_owned()).unwrap(),
            "R1"
        );
    }

    #[test]
    fn plain_status_words_have_no_escapes() {
        assert_eq!(status_word(true, false), "up");
        assert_eq!(status_word(false, false), "down");
        assert!(status_word(true, true).contains("\u{1b}["));
    }
}
