use std::path::PathBuf;

use {anyhow::Result, clap::Subcommand, secrecy::{ExposeSecret, Secret}};

use courier_config::{CourierConfig, Severity, validate};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration and report errors and warnings.
    Check,
    /// Print the effective configuration as TOML, secrets redacted.
    Show,
}

pub fn handle_config(
    action: ConfigAction,
    config: &CourierConfig,
    config_path: Option<PathBuf>,
) -> Result<()> {
    match action {
        ConfigAction::Check => check(config, config_path),
        ConfigAction::Show => {
            print!("{}", render_redacted(config)?);
            Ok(())
        },
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(config: &CourierConfig, config_path: Option<PathBuf>) -> Result<()> {
    let mut result = validate(config);
    result.config_path = config_path;

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    for d in &result.diagnostics {
        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
        };
        eprintln!("  {BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message);
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if !result.diagnostics.is_empty() {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if result.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

fn render_redacted(config: &CourierConfig) -> Result<String> {
    let mut shown = config.clone();
    if !shown.vault.client_secret.expose_secret().is_empty() {
        shown.vault.client_secret = Secret::new("[REDACTED]".into());
    }
    Ok(toml::to_string_pretty(&shown)?)
}
