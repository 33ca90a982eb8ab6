use serde::{Deserialize, Serialize};

/// Number of diploid genotype states at a biallelic haplotype block
pub const NUM_GENOTYPES: usize = 3;

/// Diploid genotype relative to the block's reference haplotype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Genotype {
    HomRef,
    Het,
    HomVar,
}

impl Genotype {
    /// All genotypes in vector order
    pub const ALL: [Genotype; NUM_GENOTYPES] = [Genotype::HomRef, Genotype::Het, Genotype::HomVar];

    /// Index into a likelihood vector
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::HomRef => 0,
            Self::Het => 1,
            Self::HomVar => 2,
        }
    }

    /// Number of alternate alleles carried
    #[must_use]
    pub fn alt_dosage(self) -> u8 {
        match self {
            Self::HomRef => 0,
            Self::Het => 1,
            Self::HomVar => 2,
        }
    }

    #[must_use]
    pub fn from_alt_dosage(dosage: u8) -> Option<Self> {
        match dosage {
            0 => Some(Self::HomRef),
            1 => Some(Self::Het),
            2 => Some(Self::HomVar),
            _ => None,
        }
    }

    /// The same genotype with reference and alternate alleles exchanged
    #[must_use]
    pub fn swapped(self) -> Self {
        match self {
            Self::HomRef => Self::HomVar,
            Self::Het => Self::Het,
            Self::HomVar => Self::HomRef,
        }
    }
}

impl std::fmt::Display for Genotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HomRef => write!(f, "hom_ref"),
            Self::Het => write!(f, "het"),
            Self::HomVar => write!(f, "hom_var"),
        }
    }
}

/// How fingerprints are grouped before they are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum IdentityGranularity {
    /// One group per sample name
    Sample,
    /// One group per (sample, library)
    Library,
    /// One group per (sample, library, read group)
    #[default]
    ReadGroup,
    /// One group per input file
    File,
}

impl std::fmt::Display for IdentityGranularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sample => write!(f, "sample"),
            Self::Library => write!(f, "library"),
            Self::ReadGroup => write!(f, "read_group"),
            Self::File => write!(f, "file"),
        }
    }
}

/// Which individual a contamination-aware model reports evidence for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ContaminationTarget {
    /// The majority (intended) sample
    #[default]
    Sample,
    /// The contaminating individual
    Contaminant,
}

/// Outcome of comparing one pair of fingerprint groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintResult {
    ExpectedMatch,
    ExpectedMismatch,
    UnexpectedMatch,
    UnexpectedMismatch,
    Inconclusive,
}

impl FingerprintResult {
    /// Classify a LOD score given whether the pair was expected to match.
    ///
    /// The threshold is usually zero or negative: an expected match fails once
    /// its LOD drops below it, and an unexpected pair is called a match once
    /// its LOD rises above its negation.
    #[must_use]
    pub fn classify(expected_to_match: bool, lod: f64, lod_threshold: f64) -> Self {
        if expected_to_match {
            if lod < lod_threshold {
                Self::UnexpectedMismatch
            } else if lod > -lod_threshold {
                Self::ExpectedMatch
            } else {
                Self::Inconclusive
            }
        } else if lod > -lod_threshold {
            Self::UnexpectedMatch
        } else if lod < lod_threshold {
            Self::ExpectedMismatch
        } else {
            Self::Inconclusive
        }
    }

    /// Whether this outcome contradicts the expectation
    #[must_use]
    pub fn is_unexpected(self) -> bool {
        matches!(self, Self::UnexpectedMatch | Self::UnexpectedMismatch)
    }
}

impl std::fmt::Display for FingerprintResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExpectedMatch => write!(f, "EXPECTED_MATCH"),
            Self::ExpectedMismatch => write!(f, "EXPECTED_MISMATCH"),
            Self::UnexpectedMatch => write!(f, "UNEXPECTED_MATCH"),
            Self::UnexpectedMismatch => write!(f, "UNEXPECTED_MISMATCH"),
            Self::Inconclusive => write!(f, "INCONCLUSIVE"),
        }
    }
}
