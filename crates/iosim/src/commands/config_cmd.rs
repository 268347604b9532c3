//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};

use iosim_config::{self as config, Config, ConfigError};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn read_secret() -> Result<String, CliError> {
    let key = rpassword::prompt_password("API key: ").map_err(prompt_err)?;
    if key.is_empty() {
        return Err(CliError::Validation {
            field: "api_key".into(),
            reason: "API key cannot be empty".into(),
        });
    }
    Ok(key)
}

/// Copy of `cfg` safe to print: a plaintext key is masked.
fn redacted(cfg: &Config) -> Config {
    let mut shown = cfg.clone();
    if shown.fallback.api_key.is_some() {
        shown.fallback.api_key = Some("********".into());
    }
    shown
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let mut cfg = config::load_config_or_default();
            eprintln!("iosim configuration wizard");
            eprintln!("   Config path: {}\n", config::config_path().display());

            cfg.fallback.enabled = Confirm::new()
                .with_prompt("Answer unrecognized commands with a language model?")
                .default(cfg.fallback.enabled)
                .interact()
                .map_err(prompt_err)?;

            if cfg.fallback.enabled {
                cfg.fallback.model = Input::new()
                    .with_prompt("Model")
                    .default(cfg.fallback.model.clone())
                    .interact_text()
                    .map_err(prompt_err)?;

                let key_choices = &[
                    "Read from an environment variable",
                    "Store in system keyring (recommended)",
                    "Save to config file (plaintext)",
                ];
                let selection = Select::new()
                    .with_prompt("Where does the API key come from?")
                    .items(key_choices)
                    .default(0)
                    .interact()
                    .map_err(prompt_err)?;

                match selection {
                    0 => {
                        let var: String = Input::new()
                            .with_prompt("Environment variable")
                            .default(
                                cfg.fallback
                                    .api_key_env
                                    .clone()
                                    .unwrap_or_else(|| "ANTHROPIC_API_KEY".into()),
                            )
                            .interact_text()
                            .map_err(prompt_err)?;
                        cfg.fallback.api_key_env = Some(var);
                    }
                    1 => {
                        config::store_api_key(&read_secret()?)?;
                        cfg.fallback.api_key = None;
                        eprintln!("   ✓ API key stored in system keyring");
                    }
                    _ => cfg.fallback.api_key = Some(read_secret()?),
                }
            }

            let formats = ["text", "json", "json-compact", "yaml"];
            let current = formats
                .iter()
                .position(|f| *f == cfg.defaults.output)
                .unwrap_or(0);
            let format = Select::new()
                .with_prompt("Default output format")
                .items(&formats)
                .default(current)
                .interact()
                .map_err(prompt_err)?;
            cfg.defaults.output = formats.get(format).copied().unwrap_or("text").into();

            let path = config::save_config(&cfg)?;
            eprintln!("\n✓ Configuration written to {}", path.display());
            eprintln!("\n  Try it: iosim device new R1 -f r1.json && iosim shell -d r1.json");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config()?);
            let text = toml::to_string_pretty(&cfg).map_err(ConfigError::from)?;
            let format = global.output.unwrap_or(OutputFormat::Text);
            let out = output::render_single(format, &cfg, |_| text.trim_end().to_owned())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── SetKey ──────────────────────────────────────────────────
        ConfigCommand::SetKey => {
            config::store_api_key(&read_secret()?)?;
            eprintln!("✓ API key stored in system keyring");
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn show_masks_plaintext_keys() {
        let mut cfg = Config::default();
        cfg.fallback.api_key = Some("sk-live-secret".into());
        let shown = redacted(&cfg);
        assert_eq!(shown.fallback.api_key.as_deref(), Some("********"));
        assert_eq!(shown.fallback.model, cfg.fallback.model);

        let text = toml::to_string_pretty(&shown).unwrap();
        assert!(!text.contains("sk-live-secret"));
    }
}
