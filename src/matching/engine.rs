use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::core::block::{BlockId, HaplotypeBlock};
use crate::core::evidence::{AlleleCounts, HaplotypeEvidence};
use crate::core::fingerprint::Fingerprint;
use crate::core::types::Genotype;
use crate::matching::scoring::{BlockScore, MatchResults};
use crate::matching::tumor_normal::LohTransition;
use crate::utils::math::shift_to_max_zero;
use crate::utils::validation::maf_equal;

/// Default loss-of-heterozygosity rate for tumor/normal scores
pub const DEFAULT_P_LOH: f64 = 0.5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error(
        "Block '{block}' has MAF {observed_maf} in '{observed}' but {expected_maf} in '{expected}'; fingerprints were built from different panels"
    )]
    IncompatibleBlockSet {
        block: BlockId,
        observed: String,
        expected: String,
        observed_maf: f64,
        expected_maf: f64,
    },
}

/// Configuration for the matching engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Probability that a heterozygous normal block appears homozygous in a tumor
    pub p_loh: f64,
    /// Compute the directional tumor/normal LODs
    pub calculate_tumor_aware: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            p_loh: DEFAULT_P_LOH,
            calculate_tumor_aware: true,
        }
    }
}

/// Per-block diagnostics for one compared pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocusResult {
    pub block: BlockId,
    /// Representative marker of the block
    pub marker: String,
    pub locus: String,
    pub observed_genotype: Genotype,
    pub expected_genotype: Genotype,
    /// Confidence of the observed genotype (log10 odds vs. runner-up)
    pub observed_genotype_lod: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_counts: Option<AlleleCounts>,
    pub lod: f64,
    pub lod_tn: f64,
    pub lod_nt: f64,
}

/// Computes identity scores between fingerprints
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    config: MatchingConfig,
    transition: LohTransition,
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}

struct SharedBlock<'a> {
    block: &'a Arc<HaplotypeBlock>,
    observed: &'a HaplotypeEvidence,
    expected: &'a HaplotypeEvidence,
}

struct PairScore {
    plain: BlockScore,
    tumor_normal: Option<BlockScore>,
    normal_tumor: Option<BlockScore>,
}

impl MatchingEngine {
    pub fn new(config: MatchingConfig) -> Self {
        Self {
            transition: LohTransition::new(config.p_loh),
            config,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Compare an observed fingerprint against an expected one.
    ///
    /// Only blocks with evidence on both sides contribute. The plain LOD is
    /// symmetric in its arguments; `lod_tn` and `lod_nt` are not.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::IncompatibleBlockSet` if a shared block carries
    /// different allele frequencies on the two sides.
    pub fn compare(
        &self,
        observed: &Fingerprint,
        expected: &Fingerprint,
    ) -> Result<MatchResults, MatchError> {
        let mut results = MatchResults::default();

        for shared in shared_blocks(observed, expected)? {
            let score = self.score_block(&shared);
            results.sample_likelihood += score.plain.sample;
            results.population_likelihood += score.plain.population;
            if let Some(tn) = score.tumor_normal {
                results.lod_tn += tn.lod();
            }
            if let Some(nt) = score.normal_tumor {
                results.lod_nt += nt.lod();
            }
            results.informative_blocks += 1;
        }

        results.lod = results.sample_likelihood - results.population_likelihood;
        Ok(results)
    }

    /// Per-block breakdown of a comparison
    ///
    /// # Errors
    ///
    /// Returns `MatchError::IncompatibleBlockSet` under the same conditions as
    /// [`Self::compare`].
    pub fn locus_results(
        &self,
        observed: &Fingerprint,
        expected: &Fingerprint,
    ) -> Result<Vec<LocusResult>, MatchError> {
        Ok(shared_blocks(observed, expected)?
            .into_iter()
            .map(|shared| {
                let score = self.score_block(&shared);
                let marker = shared.block.representative_marker();
                LocusResult {
                    block: shared.block.id.clone(),
                    marker: marker.map(|m| m.name.clone()).unwrap_or_default(),
                    locus: marker.map(|m| m.locus()).unwrap_or_default(),
                    observed_genotype: shared.observed.most_likely_genotype(),
                    expected_genotype: shared.expected.most_likely_genotype(),
                    observed_genotype_lod: shared.observed.lod_most_probable_genotype(),
                    observed_counts: shared.observed.allele_counts(),
                    lod: score.plain.lod(),
                    lod_tn: score.tumor_normal.map_or(0.0, |s| s.lod()),
                    lod_nt: score.normal_tumor.map_or(0.0, |s| s.lod()),
                }
            })
            .collect())
    }

    fn score_block(&self, shared: &SharedBlock<'_>) -> PairScore {
        let log_priors = shared.block.log10_priors();
        let observed = shift_to_max_zero(shared.observed.log_likelihoods());
        let expected = shift_to_max_zero(shared.expected.log_likelihoods());

        let plain = BlockScore::calculate(&log_priors, &observed, &expected);
        if !self.config.calculate_tumor_aware {
            return PairScore {
                plain,
                tumor_normal: None,
                normal_tumor: None,
            };
        }

        let observed_as_tumor = self.transition.normal_given_tumor(observed);
        let expected_as_tumor = self.transition.normal_given_tumor(expected);
        PairScore {
            plain,
            tumor_normal: Some(BlockScore::calculate(
                &log_priors,
                &observed_as_tumor,
                &expected,
            )),
            normal_tumor: Some(BlockScore::calculate(
                &log_priors,
                &observed,
                &expected_as_tumor,
            )),
        }
    }
}

/// Blocks with informative evidence in both fingerprints, in block order
fn shared_blocks<'a>(
    observed: &'a Fingerprint,
    expected: &'a Fingerprint,
) -> Result<Vec<SharedBlock<'a>>, MatchError> {
    let mut shared = Vec::new();
    for (id, obs) in observed.iter() {
        let Some(exp) = expected.get(id) else {
            continue;
        };
        if !Arc::ptr_eq(obs.block(), exp.block()) && !maf_equal(obs.block().maf, exp.block().maf)
        {
            return Err(MatchError::IncompatibleBlockSet {
                block: id.clone(),
                observed: observed.identity.to_string(),
                expected: expected.identity.to_string(),
                observed_maf: obs.block().maf,
                expected_maf: exp.block().maf,
            });
        }
        if obs.has_evidence() && exp.has_evidence() {
            shared.push(SharedBlock {
                block: obs.block(),
                observed: obs,
                expected: exp,
            });
        }
    }
    Ok(shared)
}
