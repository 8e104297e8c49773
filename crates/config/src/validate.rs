//! Configuration validation.
//!
//! Two passes: [`validate_toml_str`] checks raw TOML for syntax errors and
//! unknown or misspelled keys, [`validate`] checks a parsed config for values
//! the bot cannot run with.

use std::collections::HashMap;

use secrecy::ExposeSecret;

use crate::schema::ReelsmithConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "limits.window_secs"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(severity: Severity, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Check a parsed config for values the bot cannot run with.
#[must_use]
pub fn validate(config: &ReelsmithConfig) -> ValidationResult {
    let mut diagnostics = Vec::new();

    if config.telegram.token.expose_secret().trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "telegram.token",
            "bot token is empty (set BOT_TOKEN)",
        ));
    }
    if config.limits.max_requests_per_window == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "limits.max_requests_per_window",
            "must be at least 1",
        ));
    }
    if config.limits.window_secs == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "limits.window_secs",
            "window must be positive",
        ));
    }
    if config.limits.max_file_size_mb == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "limits.max_file_size_mb",
            "must be at least 1",
        ));
    }
    if config.media.encode_attempts == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "media.encode_attempts",
            "must be at least 1",
        ));
    }
    if config.media.allowed_domains.is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "media.allowed_domains",
            "empty allow-list: every URL submission will be rejected",
        ));
    }
    if !config.limits.admin_ids.is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Info,
            "limits.admin_ids",
            format!(
                "{} privileged identities bypass quota and size limits",
                config.limits.admin_ids.len()
            ),
        ));
    }

    ValidationResult { diagnostics }
}

// ── Unknown-field detection ─────────────────────────────────────────────────

fn known_sections() -> HashMap<&'static str, &'static [&'static str]> {
    HashMap::from([
        ("telegram", &["token", "api_url"][..]),
        (
            "limits",
            &[
                "max_requests_per_window",
                "window_secs",
                "max_file_size_mb",
                "admin_ids",
            ][..],
        ),
        (
            "media",
            &[
                "ffmpeg_path",
                "downloader_path",
                "temp_dir",
                "encode_attempts",
                "retry_delay_ms",
                "encode_timeout_secs",
                "allowed_domains",
            ][..],
        ),
        ("i18n", &["default_language"][..]),
        ("metrics", &["enabled", "listen"][..]),
    ])
}

/// Validate a TOML string: syntax, unknown keys (with suggestions), and types.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "",
                format!("TOML syntax error: {e}"),
            ));
            return ValidationResult { diagnostics };
        },
    };

    let sections = known_sections();
    let section_names: Vec<&str> = sections.keys().copied().collect();
    if let Some(table) = value.as_table() {
        for (key, child) in table {
            let Some(fields) = sections.get(key.as_str()) else {
                diagnostics.push(unknown_field(key, key, &section_names));
                continue;
            };
            let Some(child_table) = child.as_table() else {
                continue;
            };
            for field in child_table.keys() {
                if !fields.contains(&field.as_str()) {
                    diagnostics.push(unknown_field(&format!("{key}.{field}"), field, fields));
                }
            }
        }
    }

    if let Err(e) = toml::from_str::<ReelsmithConfig>(toml_str) {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "",
            format!("type error: {e}"),
        ));
    }

    ValidationResult { diagnostics }
}

fn unknown_field(path: &str, key: &str, candidates: &[&str]) -> Diagnostic {
    let message = match suggest(key, candidates, 3) {
        Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
        None => "unknown field".to_string(),
    };
    Diagnostic::new(Severity::Error, path, message)
}

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (*c, levenshtein(needle, c)))
        .filter(|(_, d)| *d > 0 && *d <= max_distance)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {rstest::rstest, secrecy::Secret};

    use super::*;

    fn runnable() -> ReelsmithConfig {
        let mut cfg = ReelsmithConfig::default();
        cfg.telegram.token = Secret::new("1:abc".into());
        cfg
    }

    #[test]
    fn default_config_with_token_is_clean() {
        let result = validate(&runnable());
        assert!(!result.has_errors());
        assert_eq!(result.count(Severity::Warning), 0);
    }

    #[test]
    fn missing_token_is_an_error() {
        let result = validate(&ReelsmithConfig::default());
        assert!(result.has_errors());
        assert_eq!(result.diagnostics[0].path, "telegram.token");
    }

    #[rstest]
    #[case::zero_quota(|c: &mut ReelsmithConfig| c.limits.max_requests_per_window = 0, "limits.max_requests_per_window")]
    #[case::zero_window(|c: &mut ReelsmithConfig| c.limits.window_secs = 0, "limits.window_secs")]
    #[case::zero_size(|c: &mut ReelsmithConfig| c.limits.max_file_size_mb = 0, "limits.max_file_size_mb")]
    #[case::zero_attempts(|c: &mut ReelsmithConfig| c.media.encode_attempts = 0, "media.encode_attempts")]
    fn zero_limits_are_errors(#[case] mutate: fn(&mut ReelsmithConfig), #[case] path: &str) {
        let mut cfg = runnable();
        mutate(&mut cfg);
        let result = validate(&cfg);
        assert!(result.has_errors());
        assert!(result.diagnostics.iter().any(|d| d.path == path));
    }

    #[test]
    fn empty_allow_list_warns_and_admins_inform() {
        let mut cfg = runnable();
        cfg.media.allowed_domains.clear();
        cfg.limits.admin_ids = vec![42];
        let result = validate(&cfg);
        assert!(!result.has_errors());
        assert_eq!(result.count(Severity::Warning), 1);
        assert_eq!(result.count(Severity::Info), 1);
    }

    #[test]
    fn misspelled_key_gets_suggestion() {
        let result = validate_toml_str("[limits]\nwindow_sec = 30\n");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].path, "limits.window_sec");
        assert!(result.diagnostics[0].message.contains("window_secs"));
    }

    #[test]
    fn unknown_section_is_flagged() {
        let result = validate_toml_str("[medai]\ntemp_dir = \"/tmp\"\n");
        assert!(result.has_errors());
        assert!(result.diagnostics[0].message.contains("media"));
    }

    #[test]
    fn syntax_error_short_circuits() {
        let result = validate_toml_str("[limits\n");
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.diagnostics[0].message.starts_with("TOML syntax error"));
    }

    #[test]
    fn wrong_type_is_reported() {
        let result = validate_toml_str("[limits]\nwindow_secs = \"soon\"\n");
        assert!(result.has_errors());
        assert!(result.diagnostics.iter().any(|d| d.message.starts_with("type error")));
    }
}
