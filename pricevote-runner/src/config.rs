//! Pipeline configuration, loaded from TOML.
//!
//! Every section is optional; missing keys take their defaults. Example:
//!
//! ```toml
//! seed = 42
//! min_rows = 20
//! parallel = true
//!
//! [label]
//! horizons = 7
//! threshold = 0.02
//!
//! [split]
//! kind = "chronological"
//! test_fraction = 0.25
//!
//! [committee.knn]
//! k = 5
//!
//! [committee.forest]
//! n_trees = 100
//! ```

use pricevote_core::labels::LabelConfig;
use pricevote_core::models::{CommitteeConfig, SplitStrategy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default master seed.
pub const DEFAULT_SEED: u64 = 42;

/// Default minimum number of feature rows needed to train.
pub const DEFAULT_MIN_ROWS: usize = 20;

/// Errors from loading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything a training run or sweep needs besides the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Master seed for splits and forests.
    pub seed: u64,
    /// Fewer surviving feature rows than this is a hard failure.
    pub min_rows: usize,
    /// Run the sweep on the rayon pool.
    pub parallel: bool,
    pub label: LabelConfig,
    pub split: SplitStrategy,
    pub committee: CommitteeConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            min_rows: DEFAULT_MIN_ROWS,
            parallel: true,
            label: LabelConfig::default(),
            split: SplitStrategy::default(),
            committee: CommitteeConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.label
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.split
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.committee
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.min_rows < 2 {
            return Err(ConfigError::Invalid(format!(
                "min_rows must be at least 2, got {}",
                self.min_rows
            )));
        }
        Ok(())
    }

    /// BLAKE3 hash of the seed's little-endian bytes followed by the
    /// canonical TOML rendering of everything else. TOML integers stop at
    /// `i64::MAX`, so the seed is kept out of the TOML text. `parallel` does
    /// not change results and is left out.
    pub fn config_hash(&self) -> Result<String, ConfigError> {
        let canonical = Self {
            seed: 0,
            parallel: true,
            ..self.clone()
        };
        let text = canonical.to_toml()?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(text.as_bytes());
        Ok(hasher.finalize().to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.label.horizons, 7);
        assert_eq!(config.label.threshold, 0.02);
        assert_eq!(config.min_rows, 20);
        assert_eq!(config.split, SplitStrategy::Random { test_fraction: 0.25 });
    }

    #[test]
    fn parses_all_sections() {
        let toml = r#"
seed = 7
min_rows = 50
parallel = false

[label]
horizons = 5
threshold = 0.03

[split]
kind = "chronological"
test_fraction = 0.2

[committee.linear_svc]
c = 0.5

[committee.knn]
k = 3

[committee.forest]
n_trees = 10
max_depth = 6
"#;
        let config = PipelineConfig::from_toml(toml).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.min_rows, 50);
        assert!(!config.parallel);
        assert_eq!(config.label.horizons, 5);
        assert_eq!(
            config.split,
            SplitStrategy::Chronological { test_fraction: 0.2 }
        );
        assert_eq!(config.committee.linear_svc.c, 0.5);
        assert_eq!(config.committee.knn.k, 3);
        assert_eq!(config.committee.forest.n_trees, 10);
        assert_eq!(config.committee.forest.max_depth, Some(6));
        assert!(config.committee.forest.bootstrap);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for toml in [
            "[label]\nhorizons = 0",
            "[label]\nthreshold = -0.1",
            "[split]\nkind = \"random\"\ntest_fraction = 1.5",
            "[committee.knn]\nk = 0",
            "[committee.forest]\nn_trees = 0",
            "min_rows = 1",
        ] {
            let err = PipelineConfig::from_toml(toml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{toml}: {err}");
        }
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = PipelineConfig::from_toml("seed = \"not a number\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_roundtrip() {
        let config = PipelineConfig {
            seed: 9,
            ..Default::default()
        };
        let text = config.to_toml().unwrap();
        assert_eq!(PipelineConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn config_hash_tracks_settings() {
        let a = PipelineConfig::default();
        let b = PipelineConfig {
            seed: 1,
            ..Default::default()
        };
        assert_eq!(a.config_hash().unwrap(), a.clone().config_hash().unwrap());
        assert_ne!(a.config_hash().unwrap(), b.config_hash().unwrap());

        let sequential = PipelineConfig {
            parallel: false,
            ..Default::default()
        };
        assert_eq!(a.config_hash().unwrap(), sequential.config_hash().unwrap());
    }

    #[test]
    fn config_hash_accepts_seeds_past_i64() {
        let max = PipelineConfig {
            seed: u64::MAX,
            ..Default::default()
        };
        let below = PipelineConfig {
            seed: u64::MAX - 1,
            ..Default::default()
        };
        assert!(max.validate().is_ok());
        let hash = max.config_hash().unwrap();
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, below.config_hash().unwrap());
        assert_ne!(hash, PipelineConfig::default().config_hash().unwrap());
    }
}
