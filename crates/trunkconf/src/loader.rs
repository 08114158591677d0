//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, TrunkConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns existing paths in load order (system, user, local/cli).
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/trunkline/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("trunkline/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("trunkline.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a TOML file and apply every value it sets on top of `config`.
pub fn overlay_file(config: &mut TrunkConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    overlay_toml(config, &contents, path)
}

/// Apply the values present in a TOML document; absent keys keep their
/// current value.
fn overlay_toml(config: &mut TrunkConfig, contents: &str, path: &Path) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if let Some(paths) = table.get("paths").and_then(|v| v.as_table()) {
        if let Some(v) = paths.get("model_dir").and_then(|v| v.as_str()) {
            config.paths.model_dir = expand_path(v);
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level").and_then(|v| v.as_str()) {
            config.telemetry.log_level = v.to_string();
        }
    }

    if let Some(explorer) = table.get("explorer").and_then(|v| v.as_table()) {
        if let Some(v) = explorer.get("max_trunks").and_then(|v| v.as_integer()) {
            config.explorer.max_trunks = v.max(0) as usize;
        }
        if let Some(v) = explorer
            .get("recommendations_per_genre")
            .and_then(|v| v.as_integer())
        {
            config.explorer.recommendations_per_genre = v.max(0) as usize;
        }
        if let Some(v) = explorer.get("pattern_max_length").and_then(|v| v.as_integer()) {
            config.explorer.pattern_max_length = v.max(0) as usize;
        }
        if let Some(genres) = explorer.get("genres").and_then(|v| v.as_array()) {
            config.explorer.genres = genres
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect();
        }
    }

    if let Some(weights) = table.get("weights").and_then(|v| v.as_table()) {
        if let Some(v) = weights.get("statistical").and_then(as_number) {
            config.weights.statistical = v;
        }
        if let Some(v) = weights.get("harmonic").and_then(as_number) {
            config.weights.harmonic = v;
        }
        if let Some(v) = weights.get("voice_leading").and_then(as_number) {
            config.weights.voice_leading = v;
        }
        if let Some(v) = weights.get("friction").and_then(as_number) {
            config.weights.friction = v;
        }
    }

    if let Some(fallback) = table.get("fallback").and_then(|v| v.as_table()) {
        if let Some(v) = fallback
            .get("estimated_probability_cap")
            .and_then(as_number)
        {
            config.fallback.estimated_probability_cap = v;
        }
        if let Some(v) = fallback.get("neutral_friction").and_then(as_number) {
            config.fallback.neutral_friction = v;
        }
    }

    Ok(())
}

/// Floats, or integers written without a decimal point.
fn as_number(value: &toml::Value) -> Option<f64> {
    value
        .as_float()
        .or_else(|| value.as_integer().map(|i| i as f64))
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut TrunkConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |name| env::var(name).ok());
}

fn apply_overrides_from(
    config: &mut TrunkConfig,
    sources: &mut ConfigSources,
    var: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = var("TRUNKLINE_MODEL_DIR") {
        config.paths.model_dir = expand_path(&v);
        sources.env_overrides.push("TRUNKLINE_MODEL_DIR".to_string());
    }

    if let Some(v) = var("TRUNKLINE_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("TRUNKLINE_LOG_LEVEL".to_string());
    }
    // RUST_LOG wins over TRUNKLINE_LOG_LEVEL
    if let Some(v) = var("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }

    if let Some(v) = var("TRUNKLINE_MAX_TRUNKS") {
        if let Ok(n) = v.parse() {
            config.explorer.max_trunks = n;
            sources.env_overrides.push("TRUNKLINE_MAX_TRUNKS".to_string());
        }
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}
