use serde::{Deserialize, Serialize};

use crate::core::types::NUM_GENOTYPES;
use crate::utils::math::log10_sum_log10;

/// Identity scores for an (observed, expected) fingerprint pair.
///
/// All likelihoods are log10. With no shared informative blocks every field
/// is zero: there is no evidence either way.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchResults {
    /// Evidence under "both fingerprints come from one individual"
    pub sample_likelihood: f64,

    /// Evidence under "the fingerprints come from two unrelated individuals"
    pub population_likelihood: f64,

    /// `sample_likelihood - population_likelihood`
    pub lod: f64,

    /// LOD treating the observed fingerprint as a tumor of the expected normal
    pub lod_tn: f64,

    /// LOD treating the expected fingerprint as a tumor of the observed normal
    pub lod_nt: f64,

    /// Number of blocks that contributed evidence
    pub informative_blocks: usize,
}

impl MatchResults {
    /// Whether the pair's LOD reaches `threshold`
    #[must_use]
    pub fn passes(&self, threshold: f64) -> bool {
        self.lod >= threshold
    }
}

/// Per-block likelihood terms, both in log10
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockScore {
    pub sample: f64,
    pub population: f64,
}

impl BlockScore {
    /// Score one block from shifted log-likelihoods of each side.
    ///
    /// `population` marginalizes the observed evidence over the genotype
    /// prior. `sample` weights the observed evidence by the expected side's
    /// genotype posterior, so flat expected evidence gives `sample ==
    /// population`. The difference is symmetric in the two sides even though
    /// the individual terms are not.
    #[must_use]
    pub fn calculate(
        log_priors: &[f64; NUM_GENOTYPES],
        observed: &[f64; NUM_GENOTYPES],
        expected: &[f64; NUM_GENOTYPES],
    ) -> Self {
        let joint: [f64; NUM_GENOTYPES] =
            std::array::from_fn(|i| log_priors[i] + observed[i] + expected[i]);
        let observed_marginal: [f64; NUM_GENOTYPES] =
            std::array::from_fn(|i| log_priors[i] + observed[i]);
        let expected_marginal: [f64; NUM_GENOTYPES] =
            std::array::from_fn(|i| log_priors[i] + expected[i]);

        Self {
            sample: log10_sum_log10(&joint) - log10_sum_log10(&expected_marginal),
            population: log10_sum_log10(&observed_marginal),
        }
    }

    #[must_use]
    pub fn lod(&self) -> f64 {
        self.sample - self.population
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_priors(maf: f64) -> [f64; 3] {
        let q = 1.0 - maf;
        [q * q, 2.0 * maf * q, maf * maf].map(f64::log10)
    }

    #[test]
    fn test_flat_evidence_has_zero_lod() {
        let priors = log_priors(0.3);
        let flat = [0.0, 0.0, 0.0];
        let informative = [0.0, -3.0, -6.0];
        let score = BlockScore::calculate(&priors, &informative, &flat);
        assert!(score.lod().abs() < 1e-12);
    }

    #[test]
    fn test_identical_calls_positive_lod() {
        let priors = log_priors(0.4);
        let het = [-4.0, 0.0, -4.0];
        let score = BlockScore::calculate(&priors, &het, &het);
        assert!(score.lod() > 0.0);
        // Approaches -log10(prior(het)) for certain calls
        assert!((score.lod() - (-(0.48f64.log10()))).abs() < 1e-2);
    }

    #[test]
    fn test_block_score_symmetric() {
        let priors = log_priors(0.25);
        let a = [0.0, -1.3, -4.2];
        let b = [-2.2, 0.0, -0.7];
        let ab = BlockScore::calculate(&priors, &a, &b);
        let ba = BlockScore::calculate(&priors, &b, &a);
        assert!((ab.lod() - ba.lod()).abs() < 1e-12);
    }

    #[test]
    fn test_likelihood_terms_hom_ref_vs_het() {
        let priors = log_priors(0.4);
        let r = (1e-4f64 / (1.0 - 1e-4)).log10();
        let hom_ref = [0.0, r, r];
        let het = [r, 0.0, r];
        let score = BlockScore::calculate(&priors, &hom_ref, &het);
        assert!((score.population - (-0.443_620)).abs() < 1e-5, "{score:?}");
        assert!((score.sample - (-3.756_957)).abs() < 1e-5, "{score:?}");
        assert!((score.lod() - (-3.313_337)).abs() < 1e-5, "{score:?}");
    }

    #[test]
    fn test_flat_expected_reduces_to_population() {
        let priors = log_priors(0.2);
        let observed = [-1.5, 0.0, -3.0];
        let score = BlockScore::calculate(&priors, &observed, &[0.0, 0.0, 0.0]);
        assert!((score.sample - score.population).abs() < 1e-12);
        let marginal = log10_sum_log10(&[priors[0] - 1.5, priors[1], priors[2] - 3.0]);
        assert!((score.population - marginal).abs() < 1e-12);
    }

    #[test]
    fn test_passes() {
        let results = MatchResults {
            lod: -2.0,
            ..MatchResults::default()
        };
        assert!(results.passes(-3.0));
        assert!(!results.passes(0.0));
    }
}
