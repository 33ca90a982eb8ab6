use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::core::block::BlockId;
use crate::core::evidence::{EvidenceError, HaplotypeEvidence};
use crate::core::identity::FingerprintIdentity;

/// A sample's genotype evidence across haplotype blocks.
///
/// Blocks without observed evidence are simply absent. A fingerprint is built
/// by a single loader and never shared while it is being populated.
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    pub identity: FingerprintIdentity,
    evidence: BTreeMap<BlockId, HaplotypeEvidence>,
}

impl Fingerprint {
    pub fn new(identity: FingerprintIdentity) -> Self {
        Self {
            identity,
            evidence: BTreeMap::new(),
        }
    }

    /// Add evidence, merging with any existing evidence for the same block
    ///
    /// # Errors
    ///
    /// Returns `EvidenceError::SourceMismatch` if existing evidence for the
    /// block cannot be combined with the new evidence.
    pub fn add(&mut self, evidence: HaplotypeEvidence) -> Result<(), EvidenceError> {
        match self.evidence.entry(evidence.block().id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(evidence);
            }
            Entry::Occupied(mut slot) => {
                let merged = slot.get().merge(&evidence)?;
                slot.insert(merged);
            }
        }
        Ok(())
    }

    /// Union with another fingerprint of the same identity
    ///
    /// # Errors
    ///
    /// Returns `EvidenceError::IdentityMismatch` if the identities differ, or
    /// any error from merging overlapping block evidence.
    pub fn merge(&mut self, other: Fingerprint) -> Result<(), EvidenceError> {
        if self.identity != other.identity {
            return Err(EvidenceError::IdentityMismatch {
                left: self.identity.to_string(),
                right: other.identity.to_string(),
            });
        }
        self.absorb(other)
    }

    /// Union with another fingerprint regardless of its identity.
    ///
    /// Used once keys have been projected onto a grouping granularity, where
    /// fingerprints with different full identities share a group.
    ///
    /// # Errors
    ///
    /// Returns any error from merging overlapping block evidence.
    pub fn absorb(&mut self, other: Fingerprint) -> Result<(), EvidenceError> {
        for evidence in other.evidence.into_values() {
            self.add(evidence)?;
        }
        Ok(())
    }

    /// Evidence for a block, if any was observed
    pub fn get(&self, block: &BlockId) -> Option<&HaplotypeEvidence> {
        self.evidence.get(block)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BlockId, &HaplotypeEvidence)> {
        self.evidence.iter()
    }

    /// Number of blocks with evidence
    pub fn len(&self) -> usize {
        self.evidence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evidence.is_empty()
    }
}
