//! Likelihood-based identity scoring between fingerprints.
//!
//! - [`MatchingEngine`]: Compares an observed fingerprint against an expected one
//! - [`MatchResults`]: Sample/population likelihoods and the resulting LODs
//! - [`LohTransition`]: Loss-of-heterozygosity model for tumor/normal pairs
//!
//! ## Scoring
//!
//! For every block where both fingerprints carry evidence, two hypotheses are
//! weighed against the block's Hardy-Weinberg prior:
//!
//! - **Same individual**: one genotype explains both sides
//! - **Different individuals**: each side draws its own genotype
//!
//! The LOD is the log10 ratio of the two, summed over blocks. Positive values
//! support identity, negative values support different individuals.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fp_crosscheck::core::panel::HaplotypeDatabase;
//! use fp_crosscheck::matching::engine::{MatchingConfig, MatchingEngine};
//! use fp_crosscheck::parsing::vcf::parse_vcf_file;
//! use std::path::Path;
//!
//! let panel = HaplotypeDatabase::load_from_file(Path::new("panel.haplotype_map")).unwrap();
//! let fingerprints = parse_vcf_file(Path::new("calls.vcf.gz"), &panel, 1e-2).unwrap();
//!
//! let engine = MatchingEngine::new(MatchingConfig::default());
//! let results = engine.compare(&fingerprints[0], &fingerprints[1]).unwrap();
//! println!("LOD {:.2}", results.lod);
//! ```

pub mod engine;
pub mod scoring;
pub mod tumor_normal;

pub use engine::{LocusResult, MatchError, MatchingConfig, MatchingEngine};
pub use scoring::MatchResults;
pub use tumor_normal::LohTransition;
