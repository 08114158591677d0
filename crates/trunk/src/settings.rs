use progression::{FallbackPolicy, HybridWeights};
use trunkconf::TrunkConfig;

/// Explorer tuning, resolved from config.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerSettings {
    pub max_trunks: usize,
    pub recommendations_per_genre: usize,
    pub pattern_max_length: usize,
    /// Genres to consult; empty means all the recommender offers.
    pub genres: Vec<String>,
    pub weights: HybridWeights,
    pub fallback: FallbackPolicy,
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self::from(&TrunkConfig::default())
    }
}

impl From<&TrunkConfig> for ExplorerSettings {
    fn from(config: &TrunkConfig) -> Self {
        Self {
            max_trunks: config.explorer.max_trunks,
            recommendations_per_genre: config.explorer.recommendations_per_genre,
            pattern_max_length: config.explorer.pattern_max_length,
            genres: config.explorer.genres.clone(),
            weights: HybridWeights {
                statistical: config.weights.statistical,
                harmonic: config.weights.harmonic,
                voice_leading: config.weights.voice_leading,
                friction: config.weights.friction,
            },
            fallback: FallbackPolicy {
                estimated_probability_cap: config.fallback.estimated_probability_cap,
                neutral_friction: config.fallback.neutral_friction,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_scoring_defaults() {
        let settings = ExplorerSettings::default();
        assert_eq!(settings.max_trunks, 5);
        assert_eq!(settings.weights, HybridWeights::default());
        assert_eq!(settings.fallback, FallbackPolicy::default());
    }
}
