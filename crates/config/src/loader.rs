use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::schema::ReelsmithConfig;

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "reelsmith.toml",
    "reelsmith.yaml",
    "reelsmith.yml",
    "reelsmith.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<ReelsmithConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `explicit`, when given (a load failure is returned, not swallowed)
/// 2. `./reelsmith.{toml,yaml,yml,json}` (project-local)
/// 3. `~/.config/reelsmith/reelsmith.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `ReelsmithConfig::default()` when nothing is found.
pub fn discover_and_load(explicit: Option<&Path>) -> anyhow::Result<ReelsmithConfig> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading config");
        return load_config(path);
    }
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return Ok(cfg),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    Ok(ReelsmithConfig::default())
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/reelsmith/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "reelsmith").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<ReelsmithConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

/// Apply environment overrides from the process environment.
pub fn apply_env_overrides(config: &mut ReelsmithConfig) {
    apply_env_overrides_with(config, |key| std::env::var(key).ok());
}

/// Apply environment overrides using `lookup` to resolve variables.
///
/// Empty values are treated as unset. Values that fail to parse are logged
/// and leave the file/default value in place.
pub fn apply_env_overrides_with<F>(config: &mut ReelsmithConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(token) = get("BOT_TOKEN") {
        config.telegram.token = Secret::new(token.trim().to_string());
    }
    if let Some(url) = get("TELEGRAM_API_URL") {
        config.telegram.api_url = url.trim().to_string();
    }
    if let Some(v) = get("MAX_REQUESTS_PER_MINUTE") {
        set_parsed("MAX_REQUESTS_PER_MINUTE", &v, &mut config.limits.max_requests_per_window);
    }
    if let Some(v) = get("RATE_LIMIT_PERIOD") {
        set_parsed("RATE_LIMIT_PERIOD", &v, &mut config.limits.window_secs);
    }
    if let Some(v) = get("MAX_FILE_SIZE_MB") {
        set_parsed("MAX_FILE_SIZE_MB", &v, &mut config.limits.max_file_size_mb);
    }
    if let Some(v) = get("ADMIN_USER_IDS") {
        config.limits.admin_ids = parse_id_list(&v);
    }
    if let Some(v) = get("FFMPEG_PATH") {
        config.media.ffmpeg_path = PathBuf::from(v.trim());
    }
    if let Some(v) = get("YTDLP_PATH") {
        config.media.downloader_path = PathBuf::from(v.trim());
    }
    if let Some(v) = get("TEMP_DIR") {
        config.media.temp_dir = PathBuf::from(v.trim());
    }
    if let Some(v) = get("DEFAULT_LANGUAGE") {
        config.i18n.default_language = v.trim().to_lowercase();
    }
}

fn set_parsed<T: std::str::FromStr>(key: &str, raw: &str, slot: &mut T) {
    match raw.trim().parse::<T>() {
        Ok(value) => *slot = value,
        Err(_) => warn!(key, value = raw, "ignoring unparsable environment override"),
    }
}

/// Parse a comma separated id list, skipping malformed entries.
fn parse_id_list(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(entry = s, "skipping malformed admin id");
                None
            },
        })
        .collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {secrecy::ExposeSecret, std::collections::HashMap};

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut cfg = ReelsmithConfig::default();
        apply_env_overrides_with(
            &mut cfg,
            lookup(&[
                ("BOT_TOKEN", " 123:abc "),
                ("MAX_REQUESTS_PER_MINUTE", "7"),
                ("RATE_LIMIT_PERIOD", "30"),
                ("FFMPEG_PATH", "/usr/local/bin/ffmpeg"),
                ("DEFAULT_LANGUAGE", "EN"),
            ]),
        );
        assert_eq!(cfg.telegram.token.expose_secret(), "123:abc");
        assert_eq!(cfg.limits.max_requests_per_window, 7);
        assert_eq!(cfg.limits.window_secs, 30);
        assert_eq!(cfg.media.ffmpeg_path, PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(cfg.i18n.default_language, "en");
    }

    #[test]
    fn unparsable_override_keeps_previous_value() {
        let mut cfg = ReelsmithConfig::default();
        apply_env_overrides_with(&mut cfg, lookup(&[("MAX_FILE_SIZE_MB", "lots")]));
        assert_eq!(cfg.limits.max_file_size_mb, 50);
    }

    #[test]
    fn admin_ids_skip_malformed_entries() {
        let mut cfg = ReelsmithConfig::default();
        apply_env_overrides_with(&mut cfg, lookup(&[("ADMIN_USER_IDS", "1, 2,x,, 3")]));
        assert_eq!(cfg.limits.admin_ids, vec![1, 2, 3]);
    }

    #[test]
    fn empty_values_are_ignored() {
        let mut cfg = ReelsmithConfig::default();
        apply_env_overrides_with(&mut cfg, lookup(&[("TEMP_DIR", "  ")]));
        assert_eq!(cfg.media.temp_dir, PathBuf::from("./temp"));
    }

    #[test]
    fn loads_each_supported_format() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("reelsmith.toml");
        std::fs::write(&toml_path, "[limits]\nmax_file_size_mb = 20\n").unwrap();
        assert_eq!(load_config(&toml_path).unwrap().limits.max_file_size_mb, 20);

        let yaml_path = dir.path().join("reelsmith.yaml");
        std::fs::write(&yaml_path, "limits:\n  window_secs: 90\n").unwrap();
        assert_eq!(load_config(&yaml_path).unwrap().limits.window_secs, 90);

        let json_path = dir.path().join("reelsmith.json");
        std::fs::write(&json_path, r#"{"i18n":{"default_language":"uz"}}"#).unwrap();
        assert_eq!(load_config(&json_path).unwrap().i18n.default_language, "uz");
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reelsmith.ini");
        std::fs::write(&path, "x=1").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn explicit_path_errors_propagate() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(discover_and_load(Some(&missing)).is_err());
    }
}
