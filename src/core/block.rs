use serde::{Deserialize, Serialize};

use crate::core::marker::Marker;
use crate::core::panel::PanelError;
use crate::core::types::NUM_GENOTYPES;
use crate::utils::validation::maf_equal;

/// Unique identifier for a haplotype block (the name of its anchor marker)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub String);

impl BlockId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A set of markers in full linkage that share one allele-frequency model.
///
/// Knowing the genotype at any marker of the block determines the genotype at
/// all of them, so the block is the unit of independent evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaplotypeBlock {
    pub id: BlockId,

    /// Frequency of the alternate haplotype
    pub maf: f64,

    /// Linked markers, in insertion order
    pub markers: Vec<Marker>,
}

impl HaplotypeBlock {
    pub fn new(id: impl Into<String>, maf: f64) -> Self {
        Self {
            id: BlockId::new(id),
            maf,
            markers: Vec::new(),
        }
    }

    /// Create a block anchored on a single marker, inheriting its MAF
    #[must_use]
    pub fn from_anchor(anchor: Marker) -> Self {
        Self {
            id: BlockId::new(anchor.name.clone()),
            maf: anchor.maf,
            markers: vec![anchor],
        }
    }

    /// Add a linked marker to the block.
    ///
    /// # Errors
    ///
    /// Returns `PanelError::LinkageInconsistency` if the marker's MAF differs
    /// from the block's, or `PanelError::DuplicateMarker` if a marker with the
    /// same name is already present.
    pub fn add_marker(&mut self, marker: Marker) -> Result<(), PanelError> {
        if !maf_equal(self.maf, marker.maf) {
            return Err(PanelError::LinkageInconsistency {
                block: self.id.to_string(),
                marker: marker.name,
                block_maf: self.maf,
                marker_maf: marker.maf,
            });
        }
        if self.contains(&marker.name) {
            return Err(PanelError::DuplicateMarker(marker.name));
        }
        self.markers.push(marker);
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, marker_name: &str) -> bool {
        self.markers.iter().any(|m| m.name == marker_name)
    }

    #[must_use]
    pub fn get_marker(&self, marker_name: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.name == marker_name)
    }

    /// The marker reported when a single site must stand for the block
    #[must_use]
    pub fn representative_marker(&self) -> Option<&Marker> {
        self.markers.first()
    }

    /// Hardy-Weinberg prior over `[HomRef, Het, HomVar]`
    #[must_use]
    pub fn prior_probabilities(&self) -> [f64; NUM_GENOTYPES] {
        let p = self.maf;
        let q = 1.0 - p;
        [q * q, 2.0 * p * q, p * p]
    }

    /// Hardy-Weinberg prior in log10 space
    #[must_use]
    pub fn log10_priors(&self) -> [f64; NUM_GENOTYPES] {
        self.prior_probabilities().map(f64::log10)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
