//! Config sections and their compiled defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Filesystem locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding `markov_model.json` and `patterns.json`.
    /// Default: ~/.local/share/trunkline/model
    #[serde(default = "PathsConfig::default_model_dir")]
    pub model_dir: PathBuf,
}

impl PathsConfig {
    fn default_model_dir() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.data_dir().join("trunkline/model"))
            .unwrap_or_else(|| PathBuf::from(".local/share/trunkline/model"))
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            model_dir: Self::default_model_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

/// Trunk explorer behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Parallel exploration lanes grown from the root.
    /// Default: 5
    #[serde(default = "ExplorerConfig::default_max_trunks")]
    pub max_trunks: usize,

    /// Corpus recommendations requested per genre on expansion.
    /// Default: 12
    #[serde(default = "ExplorerConfig::default_recommendations_per_genre")]
    pub recommendations_per_genre: usize,

    /// Longest n-gram pattern requested from the corpus.
    /// Default: 4
    #[serde(default = "ExplorerConfig::default_pattern_max_length")]
    pub pattern_max_length: usize,

    /// Genres to consult. Empty means every genre the model knows.
    #[serde(default)]
    pub genres: Vec<String>,
}

impl ExplorerConfig {
    fn default_max_trunks() -> usize {
        5
    }

    fn default_recommendations_per_genre() -> usize {
        12
    }

    fn default_pattern_max_length() -> usize {
        4
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            max_trunks: Self::default_max_trunks(),
            recommendations_per_genre: Self::default_recommendations_per_genre(),
            pattern_max_length: Self::default_pattern_max_length(),
            genres: Vec::new(),
        }
    }
}

/// Hybrid score blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "WeightsConfig::default_statistical")]
    pub statistical: f64,
    #[serde(default = "WeightsConfig::default_harmonic")]
    pub harmonic: f64,
    #[serde(default = "WeightsConfig::default_voice_leading")]
    pub voice_leading: f64,
    #[serde(default = "WeightsConfig::default_friction")]
    pub friction: f64,
}

impl WeightsConfig {
    fn default_statistical() -> f64 {
        0.4
    }

    fn default_harmonic() -> f64 {
        0.3
    }

    fn default_voice_leading() -> f64 {
        0.2
    }

    fn default_friction() -> f64 {
        0.1
    }
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            statistical: Self::default_statistical(),
            harmonic: Self::default_harmonic(),
            voice_leading: Self::default_voice_leading(),
            friction: Self::default_friction(),
        }
    }
}

/// Stand-ins for candidates the corpus has no data on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Ceiling on the estimated probability of an unattested candidate.
    /// Default: 0.01
    #[serde(default = "FallbackConfig::default_estimated_probability_cap")]
    pub estimated_probability_cap: f64,

    /// Friction assumed for an unattested candidate.
    /// Default: 0.5
    #[serde(default = "FallbackConfig::default_neutral_friction")]
    pub neutral_friction: f64,
}

impl FallbackConfig {
    fn default_estimated_probability_cap() -> f64 {
        0.01
    }

    fn default_neutral_friction() -> f64 {
        0.5
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            estimated_probability_cap: Self::default_estimated_probability_cap(),
            neutral_friction: Self::default_neutral_friction(),
        }
    }
}
