//! `reelsmith doctor`: config validation, external tool and temp dir checks.
//!
//! Prints a report with `[ok]`, `[warn]`, `[fail]` or `[info]` per item and
//! exits non-zero when anything failed.

use std::path::{Path, PathBuf};

use {
    anyhow::Result,
    reelsmith_config::{ReelsmithConfig, Severity},
};

// ── ANSI helpers ────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Info => CYAN,
        }
    }
}

struct CheckItem {
    status: Status,
    message: String,
}

struct Section {
    title: String,
    items: Vec<CheckItem>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push(CheckItem {
            status,
            message: message.into(),
        });
    }

    fn has(&self, status: Status) -> bool {
        self.items.iter().any(|item| item.status == status)
    }
}

fn print_report(sections: &[Section]) -> (usize, usize) {
    let mut errors = 0usize;
    let mut warnings = 0usize;

    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for item in &section.items {
            let color = item.status.color();
            let label = item.status.label();
            eprintln!("  [{color}{label}{RESET}]  {}", item.message);
            match item.status {
                Status::Fail => errors += 1,
                Status::Warn => warnings += 1,
                _ => {},
            }
        }
        eprintln!();
    }

    (errors, warnings)
}

pub fn handle_doctor(explicit: Option<&Path>) -> Result<()> {
    eprintln!("{BOLD}reelsmith doctor{RESET}");
    eprintln!("{BOLD}================{RESET}\n");

    let file = explicit
        .map(Path::to_path_buf)
        .or_else(reelsmith_config::find_config_file);
    let config = crate::load_config(explicit)?;

    let sections = vec![
        check_config(file.as_deref(), &config),
        check_tools(&config),
        check_temp_dir(&config.media.temp_dir),
    ];

    let (errors, warnings) = print_report(&sections);

    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

// ── 1. Config validation ────────────────────────────────────────────────────

fn check_config(file: Option<&Path>, config: &ReelsmithConfig) -> Section {
    let label = file
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".into());
    let mut section = Section::new(format!("Config ({label})"));

    // Unknown or misspelled keys only show up in the raw TOML.
    if let Some(path) = file.filter(|p| p.extension().is_some_and(|e| e == "toml")) {
        match std::fs::read_to_string(path) {
            Ok(raw) => push_diagnostics(&mut section, &reelsmith_config::validate_toml_str(&raw)),
            Err(e) => section.push(Status::Fail, format!("cannot read {}: {e}", path.display())),
        }
    }

    push_diagnostics(&mut section, &reelsmith_config::validate(config));

    if section.items.is_empty() {
        section.push(Status::Ok, "no issues found");
    }
    section
}

fn push_diagnostics(section: &mut Section, result: &reelsmith_config::ValidationResult) {
    for d in &result.diagnostics {
        let status = match d.severity {
            Severity::Error => Status::Fail,
            Severity::Warning => Status::Warn,
            Severity::Info => Status::Info,
        };
        if d.path.is_empty() {
            section.push(status, d.message.clone());
        } else {
            section.push(status, format!("{}: {}", d.path, d.message));
        }
    }
}

// ── 2. External tools ───────────────────────────────────────────────────────

fn check_tools(config: &ReelsmithConfig) -> Section {
    let mut section = Section::new("External tools");
    for (name, program) in [
        ("media tool", &config.media.ffmpeg_path),
        ("downloader", &config.media.downloader_path),
    ] {
        match resolve_program(program) {
            Some(path) => section.push(
                Status::Ok,
                format!("{name}: \"{}\" found at {}", program.display(), path.display()),
            ),
            None => section.push(
                Status::Fail,
                format!("{name}: \"{}\" not found", program.display()),
            ),
        }
    }
    section
}

/// Bare names are looked up in `PATH`, anything with a separator is taken as a path.
fn resolve_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        program.is_file().then(|| program.to_path_buf())
    } else {
        which::which(program).ok()
    }
}

// ── 3. Temp directory ───────────────────────────────────────────────────────

fn check_temp_dir(dir: &Path) -> Section {
    let mut section = Section::new(format!("Temp directory ({})", dir.display()));

    if !dir.exists() {
        section.push(Status::Info, "does not exist yet, created on startup");
        return section;
    }
    if !dir.is_dir() {
        section.push(Status::Fail, "exists but is not a directory");
        return section;
    }

    let marker = dir.join(".reelsmith-doctor-write");
    match std::fs::write(&marker, b"") {
        Ok(()) => {
            let _ = std::fs::remove_file(&marker);
            section.push(Status::Ok, "writable");
        },
        Err(e) => section.push(Status::Fail, format!("not writable: {e}")),
    }

    match std::fs::read_dir(dir) {
        Ok(entries) => {
            let leftovers = entries.filter_map(|e| e.ok()).count();
            if leftovers > 0 {
                section.push(
                    Status::Info,
                    format!("{leftovers} leftover file(s), removed on next startup"),
                );
            }
        },
        Err(e) => section.push(Status::Warn, format!("cannot list: {e}")),
    }

    section
}
