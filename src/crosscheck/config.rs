use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::evidence::DEFAULT_MIN_BASE_QUALITY;
use crate::core::types::{ContaminationTarget, IdentityGranularity};
use crate::crosscheck::scheduler::CrosscheckError;
use crate::crosscheck::source::LoadOptions;
use crate::matching::engine::{MatchingConfig, DEFAULT_P_LOH};
use crate::parsing::pileup::PileupOptions;
use crate::utils::validation::is_probability;

/// What to do with an input that cannot be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStringency {
    /// Abort the whole crosscheck
    #[default]
    Strict,
    /// Log the failure and continue without the input
    Lenient,
}

/// Which pairs are compared when two batches are given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CrosscheckMode {
    /// Every left group against every right group
    #[default]
    CheckAllOthers,
    /// Only groups sharing a sample name
    CheckSameSample,
}

/// Configuration for a crosscheck run.
///
/// Every field has a default, so a JSON config file may supply any subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrosscheckConfig {
    /// Key that fingerprints are grouped by before comparison
    pub identity_granularity: IdentityGranularity,

    /// LOD threshold for classifying a pair (usually zero or negative)
    pub lod_threshold: f64,

    /// Treat every pair as expected to match
    pub expect_all_groups_to_match: bool,

    /// Loss-of-heterozygosity rate for tumor/normal LODs
    pub p_loh: f64,

    /// Error rate applied to hard genotype calls
    pub matching_error_rate: f64,

    /// Deadline for loading all inputs, in seconds
    pub timeout_secs: f64,

    /// Number of inputs loaded concurrently
    pub num_threads: usize,

    pub validation: ValidationStringency,

    pub mode: CrosscheckMode,

    /// Minimum base quality for read evidence
    pub min_base_quality: u8,

    /// Contamination fraction to model in read evidence
    pub contamination: Option<f64>,

    /// Individual the contamination-aware model reports on
    pub contamination_target: ContaminationTarget,

    /// Compute the directional tumor/normal LODs
    pub calculate_tumor_aware: bool,
}

impl Default for CrosscheckConfig {
    fn default() -> Self {
        Self {
            identity_granularity: IdentityGranularity::default(),
            lod_threshold: 0.0,
            expect_all_groups_to_match: false,
            p_loh: DEFAULT_P_LOH,
            matching_error_rate: 0.01,
            timeout_secs: 3600.0,
            num_threads: std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
            validation: ValidationStringency::default(),
            mode: CrosscheckMode::default(),
            min_base_quality: DEFAULT_MIN_BASE_QUALITY,
            contamination: None,
            contamination_target: ContaminationTarget::default(),
            calculate_tumor_aware: true,
        }
    }
}

impl CrosscheckConfig {
    /// Load a JSON config file; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns `CrosscheckError::InvalidConfig` if the file cannot be read,
    /// is not valid JSON, or fails [`Self::validate`].
    pub fn load_from_file(path: &Path) -> Result<Self, CrosscheckError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CrosscheckError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            CrosscheckError::InvalidConfig(format!("cannot parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns `CrosscheckError::InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> Result<(), CrosscheckError> {
        let invalid = |msg: String| Err(CrosscheckError::InvalidConfig(msg));

        if !is_probability(self.p_loh) {
            return invalid(format!("p_loh must be in [0, 1], got {}", self.p_loh));
        }
        if !is_probability(self.matching_error_rate) {
            return invalid(format!(
                "matching_error_rate must be in [0, 1], got {}",
                self.matching_error_rate
            ));
        }
        if let Some(alpha) = self.contamination {
            if !is_probability(alpha) {
                return invalid(format!("contamination must be in [0, 1], got {alpha}"));
            }
        }
        if !self.lod_threshold.is_finite() {
            return invalid(format!("lod_threshold must be finite, got {}", self.lod_threshold));
        }
        if !(self.timeout_secs.is_finite() && self.timeout_secs > 0.0) {
            return invalid(format!("timeout must be positive, got {}", self.timeout_secs));
        }
        if self.num_threads == 0 {
            return invalid("num_threads must be at least 1".to_string());
        }
        Ok(())
    }

    /// Deadline for the load phase
    ///
    /// Only meaningful on a validated config.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs).unwrap_or(Duration::MAX)
    }

    #[must_use]
    pub fn matching_config(&self) -> MatchingConfig {
        MatchingConfig {
            p_loh: self.p_loh,
            calculate_tumor_aware: self.calculate_tumor_aware,
        }
    }

    #[must_use]
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            error_rate: self.matching_error_rate,
            pileup: PileupOptions {
                min_base_quality: self.min_base_quality,
                contamination: self.contamination,
                target: self.contamination_target,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = CrosscheckConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.num_threads >= 1);
        assert_eq!(config.identity_granularity, IdentityGranularity::ReadGroup);
        assert_eq!(config.timeout(), Duration::from_secs(3600));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            CrosscheckConfig { p_loh: 1.5, ..CrosscheckConfig::default() },
            CrosscheckConfig { matching_error_rate: -0.1, ..CrosscheckConfig::default() },
            CrosscheckConfig { timeout_secs: 0.0, ..CrosscheckConfig::default() },
            CrosscheckConfig { num_threads: 0, ..CrosscheckConfig::default() },
            CrosscheckConfig { contamination: Some(2.0), ..CrosscheckConfig::default() },
            CrosscheckConfig { lod_threshold: f64::NAN, ..CrosscheckConfig::default() },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(CrosscheckError::InvalidConfig(_))),
                "{config:?}"
            );
        }
    }

    #[test]
    fn test_load_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"identity_granularity": "sample", "lod_threshold": -5.0, "validation": "lenient", "timeout_secs": 0.5}"#,
        )
        .unwrap();

        let config = CrosscheckConfig::load_from_file(&path).unwrap();
        assert_eq!(config.identity_granularity, IdentityGranularity::Sample);
        assert_eq!(config.validation, ValidationStringency::Lenient);
        assert!((config.lod_threshold - (-5.0)).abs() < f64::EPSILON);
        assert_eq!(config.timeout(), Duration::from_millis(500));
        assert!((config.p_loh - DEFAULT_P_LOH).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"p_loh": 3.0}"#).unwrap();
        assert!(CrosscheckConfig::load_from_file(&path).is_err());

        std::fs::write(&path, "not json").unwrap();
        assert!(CrosscheckConfig::load_from_file(&path).is_err());
        assert!(CrosscheckConfig::load_from_file(&dir.path().join("missing.json")).is_err());
    }
}
