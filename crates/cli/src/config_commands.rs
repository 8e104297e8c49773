use std::path::Path;

use {anyhow::Result, clap::Subcommand, secrecy::Secret};

use reelsmith_config::{ReelsmithConfig, Severity};

#[derive(Subcommand, Default)]
pub enum ConfigAction {
    /// Print the effective configuration (file, defaults and env), token redacted.
    #[default]
    Show,
    /// Validate the configuration and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
}

pub fn handle_config(action: ConfigAction, explicit: Option<&Path>) -> Result<()> {
    let config = crate::load_config(explicit)?;
    match action {
        ConfigAction::Show => {
            print!("{}", render(&config)?);
            Ok(())
        },
        ConfigAction::Check { verbose } => check(&config, verbose),
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

const REDACTED: &str = "[REDACTED]";

/// TOML rendering with the bot token masked.
fn render(config: &ReelsmithConfig) -> Result<String> {
    let mut shown = config.clone();
    if shown.telegram.has_token() {
        shown.telegram.token = Secret::new(REDACTED.to_string());
    }
    Ok(toml::to_string_pretty(&shown)?)
}

fn check(config: &ReelsmithConfig, verbose: bool) -> Result<()> {
    let result = reelsmith_config::validate(config);

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
            Severity::Info => (CYAN, "info"),
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}
