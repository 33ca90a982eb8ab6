//! Loss-of-heterozygosity model for tumor/normal comparisons.
//!
//! A tumor derived from a normal sample may lose one haplotype at a
//! heterozygous block, so a heterozygous normal can present as either
//! homozygous state in the tumor. Homozygous normal blocks are stable.

use crate::core::types::{Genotype, NUM_GENOTYPES};
use crate::utils::math::log10_sum_log10;

/// Transition probabilities from normal genotype to tumor genotype
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LohTransition {
    /// `matrix[normal][tumor]`
    matrix: [[f64; NUM_GENOTYPES]; NUM_GENOTYPES],
}

impl LohTransition {
    /// Build the transition for a loss-of-heterozygosity rate `p_loh`.
    ///
    /// A heterozygous normal is seen as heterozygous in the tumor with
    /// probability `1 - p_loh` and as each homozygous state with `p_loh / 2`.
    #[must_use]
    pub fn new(p_loh: f64) -> Self {
        let p_loh = p_loh.clamp(0.0, 1.0);
        Self {
            matrix: [
                [1.0, 0.0, 0.0],
                [p_loh / 2.0, 1.0 - p_loh, p_loh / 2.0],
                [0.0, 0.0, 1.0],
            ],
        }
    }

    #[must_use]
    pub fn probability(&self, normal: Genotype, tumor: Genotype) -> f64 {
        self.matrix[normal.index()][tumor.index()]
    }

    /// Convert tumor-evidence log10 likelihoods into log10 likelihoods of the
    /// underlying normal genotype: `L_n(g) = Σ_t T[g][t] · L_t(t)`.
    #[must_use]
    pub fn normal_given_tumor(&self, tumor_log_likelihoods: [f64; NUM_GENOTYPES]) -> [f64; NUM_GENOTYPES] {
        Genotype::ALL.map(|normal| {
            let terms = Genotype::ALL.map(|tumor| {
                let p = self.probability(normal, tumor);
                if p > 0.0 {
                    p.log10() + tumor_log_likelihoods[tumor.index()]
                } else {
                    f64::NEG_INFINITY
                }
            });
            log10_sum_log10(&terms)
        })
    }
}
