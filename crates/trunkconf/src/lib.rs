//! Configuration loading for Trunkline.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/trunkline/config.toml` (system)
//! 2. `~/.config/trunkline/config.toml` (user)
//! 3. `./trunkline.toml` (local override), or a path given with `--config`
//! 4. Environment variables (`TRUNKLINE_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [paths]
//! model_dir = "~/corpus/model"
//!
//! [telemetry]
//! log_level = "debug"
//!
//! [explorer]
//! max_trunks = 5
//! recommendations_per_genre = 12
//! pattern_max_length = 4
//! genres = ["pop", "rock"]
//!
//! [weights]
//! statistical = 0.4
//! harmonic = 0.3
//! voice_leading = 0.2
//! friction = 0.1
//!
//! [fallback]
//! estimated_probability_cap = 0.01
//! neutral_friction = 0.5
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, expand_path, ConfigSources};
pub use sections::{ExplorerConfig, FallbackConfig, PathsConfig, TelemetryConfig, WeightsConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete Trunkline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TrunkConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub explorer: ExplorerConfig,
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
}

impl TrunkConfig {
    /// Load configuration from all standard sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration, with `config_path` replacing `./trunkline.toml`.
    ///
    /// System and user configs still load first.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report which files and variables contributed.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = TrunkConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::overlay_file(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Render the effective config as TOML.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# Trunkline Configuration\n\n");

        output.push_str("[paths]\n");
        output.push_str(&format!(
            "model_dir = \"{}\"\n",
            self.paths.model_dir.display()
        ));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output.push_str("\n[explorer]\n");
        output.push_str(&format!("max_trunks = {}\n", self.explorer.max_trunks));
        output.push_str(&format!(
            "recommendations_per_genre = {}\n",
            self.explorer.recommendations_per_genre
        ));
        output.push_str(&format!(
            "pattern_max_length = {}\n",
            self.explorer.pattern_max_length
        ));
        let genres: Vec<String> = self
            .explorer
            .genres
            .iter()
            .map(|g| format!("\"{}\"", g))
            .collect();
        output.push_str(&format!("genres = [{}]\n", genres.join(", ")));

        output.push_str("\n[weights]\n");
        output.push_str(&format!("statistical = {:?}\n", self.weights.statistical));
        output.push_str(&format!("harmonic = {:?}\n", self.weights.harmonic));
        output.push_str(&format!("voice_leading = {:?}\n", self.weights.voice_leading));
        output.push_str(&format!("friction = {:?}\n", self.weights.friction));

        output.push_str("\n[fallback]\n");
        output.push_str(&format!(
            "estimated_probability_cap = {:?}\n",
            self.fallback.estimated_probability_cap
        ));
        output.push_str(&format!(
            "neutral_friction = {:?}\n",
            self.fallback.neutral_friction
        ));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = TrunkConfig::default();
        assert_eq!(config.explorer.max_trunks, 5);
        assert_eq!(config.weights.statistical, 0.4);
        assert_eq!(config.fallback.estimated_probability_cap, 0.01);
        assert!(config.explorer.genres.is_empty());
    }

    #[test]
    fn test_to_toml() {
        let toml = TrunkConfig::default().to_toml();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[explorer]"));
        assert!(toml.contains("max_trunks = 5"));
        assert!(toml.contains("neutral_friction = 0.5"));
    }

    #[test]
    fn test_to_toml_parses_back() {
        let mut config = TrunkConfig::default();
        config.explorer.genres = vec!["pop".into(), "jazz".into()];
        config.weights.friction = 0.25;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trunkline.toml");
        std::fs::write(&path, config.to_toml()).unwrap();

        let mut reloaded = TrunkConfig::default();
        loader::overlay_file(&mut reloaded, &path).unwrap();
        assert_eq!(reloaded, config);
    }
}
