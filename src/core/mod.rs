//! Core data types for fingerprint identity checks.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`Marker`]: A single biallelic site with its population allele frequency
//! - [`HaplotypeBlock`]: Markers in full linkage sharing one allele-frequency model
//! - [`HaplotypeDatabase`]: The immutable panel of blocks, shared by all loaders
//! - [`HaplotypeEvidence`]: Per-block genotype likelihoods for one sample
//! - [`Fingerprint`]: A sample's evidence across blocks
//! - [`FingerprintIdentity`]: Structural identity key used for grouping
//!
//! ## Genotype Orientation
//!
//! Likelihood vectors are always ordered `[HomRef, Het, HomVar]` relative to
//! the block's reference haplotype. Marker alleles in the panel are phased so
//! that every marker's reference allele lies on that haplotype:
//!
//! | Block genotype | Prior |
//! |----------------|-------|
//! | `HomRef`       | (1-p)^2 |
//! | `Het`          | 2p(1-p) |
//! | `HomVar`       | p^2 |
//!
//! [`Marker`]: marker::Marker
//! [`HaplotypeBlock`]: block::HaplotypeBlock
//! [`HaplotypeDatabase`]: panel::HaplotypeDatabase
//! [`HaplotypeEvidence`]: evidence::HaplotypeEvidence
//! [`Fingerprint`]: fingerprint::Fingerprint
//! [`FingerprintIdentity`]: identity::FingerprintIdentity

pub mod block;
pub mod evidence;
pub mod fingerprint;
pub mod identity;
pub mod marker;
pub mod panel;
pub mod types;
