//! # fp-crosscheck
//!
//! A library for checking that genotype fingerprints come from the individuals
//! they are labelled with.
//!
//! Sample swaps and contamination are common in sequencing pipelines: a BAM
//! labelled "patient 7" may hold reads from patient 12, or a tumor may be
//! paired with the wrong normal. `fp-crosscheck` compares genotype evidence at
//! a panel of common SNPs and reports how much more likely each pair is to
//! come from one individual than from two unrelated ones.
//!
//! ## Features
//!
//! - **Haplotype-aware**: Linked SNPs are grouped into blocks so correlated markers
//!   are not double-counted
//! - **Multiple evidence types**: Genotype calls, genotype likelihoods, read pileups,
//!   and contamination-aware pileups
//! - **Tumor/normal LODs**: Directional scores that tolerate loss of heterozygosity
//! - **Concurrent crosschecks**: Many inputs loaded in parallel under a deadline,
//!   grouped by sample, library, read group, or file
//! - **Classification**: Expected/unexpected match/mismatch against a LOD threshold
//!
//! ## Example
//!
//! ```rust,no_run
//! use fp_crosscheck::{HaplotypeDatabase, MatchingEngine};
//! use fp_crosscheck::parsing::vcf::parse_vcf_file;
//! use std::path::Path;
//!
//! // Load the marker panel
//! let panel = HaplotypeDatabase::load_from_file(Path::new("panel.haplotype_map")).unwrap();
//!
//! // One fingerprint per VCF sample
//! let fingerprints = parse_vcf_file(Path::new("cohort.vcf.gz"), &panel, 0.01).unwrap();
//!
//! // Compare every pair
//! let engine = MatchingEngine::default();
//! for a in &fingerprints {
//!     for b in &fingerprints {
//!         if a.identity != b.identity {
//!             let m = engine.compare(a, b).unwrap();
//!             println!("{} vs {}: LOD {:.2}", a.identity, b.identity, m.lod);
//!         }
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Markers, haplotype blocks, evidence, and fingerprints
//! - [`matching`]: Matching engine and LOD scoring
//! - [`crosscheck`]: Concurrent loading, grouping, and pairwise crosschecks
//! - [`parsing`]: Parsers for haplotype maps, VCFs, and pileups
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod crosscheck;
pub mod matching;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::block::{BlockId, HaplotypeBlock};
pub use core::evidence::HaplotypeEvidence;
pub use core::fingerprint::Fingerprint;
pub use core::identity::FingerprintIdentity;
pub use core::marker::Marker;
pub use core::panel::HaplotypeDatabase;
pub use core::types::*;
pub use crosscheck::{CrosscheckConfig, CrosscheckReport, Crosschecker};
pub use matching::engine::{MatchingConfig, MatchingEngine};
pub use matching::scoring::MatchResults;
