//! Per-block genotype evidence for one sample.
//!
//! Every evidence source reduces to a vector of un-normalized log10
//! likelihoods over `[HomRef, Het, HomVar]`. Combining evidence for the same
//! block is pointwise addition in log space, so merging is associative and
//! commutative regardless of the order in which reads or files arrive.

use std::sync::Arc;
use thiserror::Error;

use crate::core::block::{BlockId, HaplotypeBlock};
use crate::core::marker::AlleleMatch;
use crate::core::types::{ContaminationTarget, Genotype, NUM_GENOTYPES};
use crate::utils::math::{log10_sum_log10, log10_to_probabilities, phred_to_error_probability};

/// Lower bound applied to genotyping error rates so log scores stay finite
pub const MIN_ERROR_RATE: f64 = 1e-10;

/// Upper bound applied to genotyping error rates
pub const MAX_ERROR_RATE: f64 = 0.5;

/// Default floor below which bases are ignored
pub const DEFAULT_MIN_BASE_QUALITY: u8 = 20;

const CONTAMINATION_TOLERANCE: f64 = 1e-12;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvidenceError {
    #[error("Cannot merge evidence for block '{left}' with evidence for block '{right}'")]
    BlockMismatch { left: BlockId, right: BlockId },

    #[error("Cannot combine {left} evidence with {right} evidence for block '{block}'")]
    SourceMismatch {
        block: BlockId,
        left: &'static str,
        right: &'static str,
    },

    #[error("Marker '{marker}' is not part of block '{block}'")]
    MarkerNotInBlock { marker: String, block: BlockId },

    #[error("Cannot merge fingerprint '{right}' into fingerprint '{left}'")]
    IdentityMismatch { left: String, right: String },
}

/// Counts of observed bases at the block's markers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct AlleleCounts {
    pub ref_count: u32,
    pub alt_count: u32,
    /// Bases matching neither allele
    pub other_count: u32,
}

impl AlleleCounts {
    fn record(&mut self, allele: AlleleMatch) {
        match allele {
            AlleleMatch::Ref => self.ref_count += 1,
            AlleleMatch::Alt => self.alt_count += 1,
            AlleleMatch::Other => self.other_count += 1,
        }
    }

    /// Number of bases supporting either allele
    #[must_use]
    pub fn informative(&self) -> u32 {
        self.ref_count + self.alt_count
    }
}

impl std::ops::Add for AlleleCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            ref_count: self.ref_count + rhs.ref_count,
            alt_count: self.alt_count + rhs.alt_count,
            other_count: self.other_count + rhs.other_count,
        }
    }
}

/// Evidence from a discrete genotype call or from genotype likelihoods
#[derive(Debug, Clone, PartialEq)]
pub struct CallEvidence {
    pub log_likelihoods: [f64; NUM_GENOTYPES],
}

/// Evidence accumulated from individual sequencing bases
#[derive(Debug, Clone, PartialEq)]
pub struct ReadEvidence {
    pub log_likelihoods: [f64; NUM_GENOTYPES],
    pub counts: AlleleCounts,
    pub min_base_quality: u8,
}

/// Evidence from bases drawn from a mixture of two individuals.
///
/// Likelihoods are kept jointly over (sample genotype, contaminant genotype)
/// and only marginalized when read, so merged evidence stays exact.
#[derive(Debug, Clone, PartialEq)]
pub struct ContaminatedReadEvidence {
    /// Fraction of bases originating from the contaminant
    pub contamination: f64,
    pub target: ContaminationTarget,
    /// `log_matrix[sample][contaminant]`
    pub log_matrix: [[f64; NUM_GENOTYPES]; NUM_GENOTYPES],
    pub counts: AlleleCounts,
    pub min_base_quality: u8,
}

/// The evidence variants
#[derive(Debug, Clone, PartialEq)]
pub enum EvidenceSource {
    Call(CallEvidence),
    Reads(ReadEvidence),
    ContaminatedReads(ContaminatedReadEvidence),
}

impl EvidenceSource {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Call(_) => "genotype-call",
            Self::Reads(_) => "read",
            Self::ContaminatedReads(_) => "contaminated-read",
        }
    }
}

/// Genotype evidence for one haplotype block in one sample
#[derive(Debug, Clone, PartialEq)]
pub struct HaplotypeEvidence {
    block: Arc<HaplotypeBlock>,
    source: EvidenceSource,
}

impl HaplotypeEvidence {
    /// Evidence from a called genotype with error rate `error_rate`.
    ///
    /// The called state gets likelihood `1 - ε` and the two other states `ε`,
    /// with `ε` clamped into [`MIN_ERROR_RATE`, `MAX_ERROR_RATE`].
    #[must_use]
    pub fn from_call(block: Arc<HaplotypeBlock>, genotype: Genotype, error_rate: f64) -> Self {
        let error_rate = if error_rate.is_nan() {
            MAX_ERROR_RATE
        } else {
            error_rate.clamp(MIN_ERROR_RATE, MAX_ERROR_RATE)
        };
        let mut log_likelihoods = [error_rate.log10(); NUM_GENOTYPES];
        log_likelihoods[genotype.index()] = (1.0 - error_rate).log10();
        Self {
            block,
            source: EvidenceSource::Call(CallEvidence { log_likelihoods }),
        }
    }

    /// Evidence from phred-scaled genotype likelihoods (VCF `PL`)
    #[must_use]
    pub fn from_genotype_likelihoods(block: Arc<HaplotypeBlock>, pl: [u32; NUM_GENOTYPES]) -> Self {
        let log_likelihoods = pl.map(|p| -f64::from(p) / 10.0);
        Self {
            block,
            source: EvidenceSource::Call(CallEvidence { log_likelihoods }),
        }
    }

    /// Evidence from raw per-genotype likelihoods
    #[must_use]
    pub fn from_likelihoods(block: Arc<HaplotypeBlock>, likelihoods: [f64; NUM_GENOTYPES]) -> Self {
        let log_likelihoods = likelihoods.map(|p| p.max(f64::MIN_POSITIVE).log10());
        Self {
            block,
            source: EvidenceSource::Call(CallEvidence { log_likelihoods }),
        }
    }

    /// Empty read evidence; populate with [`Self::add_base`]
    #[must_use]
    pub fn from_reads(block: Arc<HaplotypeBlock>, min_base_quality: u8) -> Self {
        Self {
            block,
            source: EvidenceSource::Reads(ReadEvidence {
                log_likelihoods: [0.0; NUM_GENOTYPES],
                counts: AlleleCounts::default(),
                min_base_quality,
            }),
        }
    }

    /// Empty contamination-aware read evidence; populate with [`Self::add_base`]
    #[must_use]
    pub fn from_contaminated_reads(
        block: Arc<HaplotypeBlock>,
        contamination: f64,
        target: ContaminationTarget,
        min_base_quality: u8,
    ) -> Self {
        Self {
            block,
            source: EvidenceSource::ContaminatedReads(ContaminatedReadEvidence {
                contamination: contamination.clamp(0.0, 1.0),
                target,
                log_matrix: [[0.0; NUM_GENOTYPES]; NUM_GENOTYPES],
                counts: AlleleCounts::default(),
                min_base_quality,
            }),
        }
    }

    /// Add one observed base at `marker_name`.
    ///
    /// Returns whether the base contributed evidence: bases below the quality
    /// floor and bases matching neither allele are accepted but ignored.
    ///
    /// # Errors
    ///
    /// Returns `EvidenceError::MarkerNotInBlock` if the marker is not part of
    /// this block, or `EvidenceError::SourceMismatch` for call evidence.
    pub fn add_base(
        &mut self,
        marker_name: &str,
        base: u8,
        quality: u8,
    ) -> Result<bool, EvidenceError> {
        let marker = self.block.get_marker(marker_name).ok_or_else(|| {
            EvidenceError::MarkerNotInBlock {
                marker: marker_name.to_string(),
                block: self.block.id.clone(),
            }
        })?;
        let allele = marker.match_allele(base);

        match &mut self.source {
            EvidenceSource::Call(_) => Err(EvidenceError::SourceMismatch {
                block: self.block.id.clone(),
                left: "genotype-call",
                right: "read",
            }),
            EvidenceSource::Reads(reads) => {
                if quality < reads.min_base_quality {
                    return Ok(false);
                }
                reads.counts.record(allele);
                let Some(is_alt) = is_alt(allele) else {
                    return Ok(false);
                };
                let p_err = phred_to_error_probability(quality);
                for genotype in Genotype::ALL {
                    reads.log_likelihoods[genotype.index()] +=
                        base_likelihood(alt_fraction(genotype, genotype, 0.0), p_err, is_alt)
                            .log10();
                }
                Ok(true)
            }
            EvidenceSource::ContaminatedReads(mixed) => {
                if quality < mixed.min_base_quality {
                    return Ok(false);
                }
                mixed.counts.record(allele);
                let Some(is_alt) = is_alt(allele) else {
                    return Ok(false);
                };
                let p_err = phred_to_error_probability(quality);
                for sample in Genotype::ALL {
                    for contaminant in Genotype::ALL {
                        let theta = alt_fraction(sample, contaminant, mixed.contamination);
                        mixed.log_matrix[sample.index()][contaminant.index()] +=
                            base_likelihood(theta, p_err, is_alt).log10();
                    }
                }
                Ok(true)
            }
        }
    }

    /// The block this evidence describes
    #[must_use]
    pub fn block(&self) -> &Arc<HaplotypeBlock> {
        &self.block
    }

    #[must_use]
    pub fn source(&self) -> &EvidenceSource {
        &self.source
    }

    /// Un-normalized log10 likelihoods over `[HomRef, Het, HomVar]`
    #[must_use]
    pub fn log_likelihoods(&self) -> [f64; NUM_GENOTYPES] {
        match &self.source {
            EvidenceSource::Call(call) => call.log_likelihoods,
            EvidenceSource::Reads(reads) => reads.log_likelihoods,
            EvidenceSource::ContaminatedReads(mixed) => {
                let log_priors = self.block.log10_priors();
                let mut out = [0.0; NUM_GENOTYPES];
                for genotype in Genotype::ALL {
                    let terms: [f64; NUM_GENOTYPES] = match mixed.target {
                        ContaminationTarget::Sample => Genotype::ALL.map(|other| {
                            mixed.log_matrix[genotype.index()][other.index()]
                                + log_priors[other.index()]
                        }),
                        ContaminationTarget::Contaminant => Genotype::ALL.map(|other| {
                            mixed.log_matrix[other.index()][genotype.index()]
                                + log_priors[other.index()]
                        }),
                    };
                    out[genotype.index()] = log10_sum_log10(&terms);
                }
                out
            }
        }
    }

    /// Allele counts for read-based evidence
    #[must_use]
    pub fn allele_counts(&self) -> Option<AlleleCounts> {
        match &self.source {
            EvidenceSource::Call(_) => None,
            EvidenceSource::Reads(reads) => Some(reads.counts),
            EvidenceSource::ContaminatedReads(mixed) => Some(mixed.counts),
        }
    }

    /// Whether this evidence says anything at all about the genotype
    #[must_use]
    pub fn has_evidence(&self) -> bool {
        match self.allele_counts() {
            Some(counts) => counts.informative() > 0,
            None => true,
        }
    }

    /// Posterior genotype probabilities under the block's Hardy-Weinberg prior
    #[must_use]
    pub fn posterior_probabilities(&self) -> [f64; NUM_GENOTYPES] {
        let ll = self.log_likelihoods();
        let log_priors = self.block.log10_priors();
        log10_to_probabilities([
            ll[0] + log_priors[0],
            ll[1] + log_priors[1],
            ll[2] + log_priors[2],
        ])
    }

    /// Genotype with the highest posterior probability
    #[must_use]
    pub fn most_likely_genotype(&self) -> Genotype {
        let posteriors = self.posterior_probabilities();
        let mut best = Genotype::HomRef;
        for genotype in Genotype::ALL {
            if posteriors[genotype.index()] > posteriors[best.index()] {
                best = genotype;
            }
        }
        best
    }

    /// log10 odds of the most probable genotype against the runner-up
    #[must_use]
    pub fn lod_most_probable_genotype(&self) -> f64 {
        let mut posteriors = self.posterior_probabilities();
        posteriors.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        if posteriors[1] <= 0.0 {
            return f64::INFINITY;
        }
        (posteriors[0] / posteriors[1]).log10()
    }

    /// Combine with other evidence for the same block.
    ///
    /// # Errors
    ///
    /// Returns `EvidenceError::BlockMismatch` if the blocks differ, or
    /// `EvidenceError::SourceMismatch` if the evidence variants cannot be
    /// combined exactly.
    pub fn merge(&self, other: &HaplotypeEvidence) -> Result<HaplotypeEvidence, EvidenceError> {
        if self.block.id != other.block.id {
            return Err(EvidenceError::BlockMismatch {
                left: self.block.id.clone(),
                right: other.block.id.clone(),
            });
        }

        let mismatch = || EvidenceError::SourceMismatch {
            block: self.block.id.clone(),
            left: self.source.kind(),
            right: other.source.kind(),
        };

        let source = match (&self.source, &other.source) {
            (EvidenceSource::Call(a), EvidenceSource::Call(b)) => {
                EvidenceSource::Call(CallEvidence {
                    log_likelihoods: add_vectors(a.log_likelihoods, b.log_likelihoods),
                })
            }
            (EvidenceSource::Reads(a), EvidenceSource::Reads(b)) => {
                EvidenceSource::Reads(ReadEvidence {
                    log_likelihoods: add_vectors(a.log_likelihoods, b.log_likelihoods),
                    counts: a.counts + b.counts,
                    min_base_quality: a.min_base_quality.min(b.min_base_quality),
                })
            }
            (EvidenceSource::ContaminatedReads(a), EvidenceSource::ContaminatedReads(b)) => {
                if a.target != b.target
                    || (a.contamination - b.contamination).abs() > CONTAMINATION_TOLERANCE
                {
                    return Err(mismatch());
                }
                let mut log_matrix = a.log_matrix;
                for (row, other_row) in log_matrix.iter_mut().zip(b.log_matrix.iter()) {
                    *row = add_vectors(*row, *other_row);
                }
                EvidenceSource::ContaminatedReads(ContaminatedReadEvidence {
                    contamination: a.contamination,
                    target: a.target,
                    log_matrix,
                    counts: a.counts + b.counts,
                    min_base_quality: a.min_base_quality.min(b.min_base_quality),
                })
            }
            _ => return Err(mismatch()),
        };

        Ok(HaplotypeEvidence {
            block: Arc::clone(&self.block),
            source,
        })
    }
}

fn add_vectors(a: [f64; NUM_GENOTYPES], b: [f64; NUM_GENOTYPES]) -> [f64; NUM_GENOTYPES] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn is_alt(allele: AlleleMatch) -> Option<bool> {
    match allele {
        AlleleMatch::Ref => Some(false),
        AlleleMatch::Alt => Some(true),
        AlleleMatch::Other => None,
    }
}

/// Expected fraction of alternate bases in a two-individual mixture
fn alt_fraction(sample: Genotype, contaminant: Genotype, contamination: f64) -> f64 {
    ((1.0 - contamination) * f64::from(sample.alt_dosage())
        + contamination * f64::from(contaminant.alt_dosage()))
        / 2.0
}

/// Probability of observing the base given the alt fraction and error rate
fn base_likelihood(alt_fraction: f64, p_err: f64, is_alt: bool) -> f64 {
    let p_alt = alt_fraction * (1.0 - p_err) + (1.0 - alt_fraction) * p_err;
    if is_alt {
        p_alt
    } else {
        1.0 - p_alt
    }
}
