use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::core::block::{BlockId, HaplotypeBlock};
use crate::core::marker::Marker;
use crate::parsing::ParseError;
use crate::utils::validation::check_marker_limit;

#[derive(Error, Debug)]
pub enum PanelError {
    #[error(
        "Marker '{marker}' has MAF {marker_maf} but block '{block}' is fixed at MAF {block_maf}"
    )]
    LinkageInconsistency {
        block: String,
        marker: String,
        block_maf: f64,
        marker_maf: f64,
    },

    #[error("Duplicate marker in haplotype panel: {0}")]
    DuplicateMarker(String),

    #[error("Marker '{marker}' refers to unknown anchor marker '{anchor}'")]
    UnknownAnchor { marker: String, anchor: String },

    #[error("Too many markers: {0} exceeds maximum allowed")]
    TooManyMarkers(usize),

    #[error("Failed to parse haplotype panel: {0}")]
    Parse(#[from] ParseError),
}

/// The static haplotype panel: every block with its linked markers.
///
/// Built once at startup and shared read-only (via `Arc`) by every loader and
/// every comparison.
#[derive(Debug, Default)]
pub struct HaplotypeDatabase {
    /// All blocks, in panel order
    blocks: Vec<Arc<HaplotypeBlock>>,

    /// Index: block ID -> index in blocks vec
    id_to_index: HashMap<BlockId, usize>,

    /// Index: marker name -> block index
    marker_to_block: HashMap<String, usize>,

    /// Index: (chromosome, position) -> (block index, marker name)
    locus_to_marker: HashMap<(String, u64), (usize, String)>,
}

impl HaplotypeDatabase {
    /// Load a haplotype map file
    ///
    /// # Errors
    ///
    /// Returns `PanelError` if the file cannot be read or any line is malformed;
    /// no partial panel is ever returned.
    pub fn load_from_file(path: &Path) -> Result<Self, PanelError> {
        crate::parsing::haplotype_map::parse_haplotype_map_file(path)
    }

    /// Get a block by ID
    pub fn get(&self, id: &BlockId) -> Option<&Arc<HaplotypeBlock>> {
        self.id_to_index.get(id).map(|&idx| &self.blocks[idx])
    }

    /// Find the block containing a named marker
    pub fn block_for_marker(&self, marker_name: &str) -> Option<&Arc<HaplotypeBlock>> {
        self.marker_to_block
            .get(marker_name)
            .map(|&idx| &self.blocks[idx])
    }

    /// Find the block and marker at a genomic locus
    pub fn find_by_locus(
        &self,
        chromosome: &str,
        position: u64,
    ) -> Option<(&Arc<HaplotypeBlock>, &Marker)> {
        let (idx, name) = self
            .locus_to_marker
            .get(&(chromosome.to_string(), position))?;
        let block = &self.blocks[*idx];
        block.get_marker(name).map(|m| (block, m))
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Arc<HaplotypeBlock>> {
        self.blocks.iter()
    }

    /// Number of blocks in the panel
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total number of markers across all blocks
    pub fn marker_count(&self) -> usize {
        self.marker_to_block.len()
    }
}

/// Collects markers into blocks and produces an immutable [`HaplotypeDatabase`]
#[derive(Debug, Default)]
pub struct HaplotypeDatabaseBuilder {
    blocks: Vec<HaplotypeBlock>,
    id_to_index: HashMap<BlockId, usize>,
    marker_to_block: HashMap<String, usize>,
    pending: Vec<(String, Marker)>,
}

impl HaplotypeDatabaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new block anchored on `marker`
    ///
    /// # Errors
    ///
    /// Returns `PanelError::DuplicateMarker` if the marker name is already used.
    pub fn add_anchor(&mut self, marker: Marker) -> Result<&mut Self, PanelError> {
        self.check_new_marker(&marker.name)?;
        let index = self.blocks.len();
        let block = HaplotypeBlock::from_anchor(marker);
        self.marker_to_block.insert(block.id.0.clone(), index);
        self.id_to_index.insert(block.id.clone(), index);
        self.blocks.push(block);
        Ok(self)
    }

    /// Add `marker` to the block anchored on `anchor`.
    ///
    /// The anchor may be added later; linkage is resolved in [`Self::build`].
    ///
    /// # Errors
    ///
    /// Returns `PanelError::DuplicateMarker` if the marker name is already used.
    pub fn add_linked(
        &mut self,
        anchor: impl Into<String>,
        marker: Marker,
    ) -> Result<&mut Self, PanelError> {
        self.check_new_marker(&marker.name)?;
        self.pending.push((anchor.into(), marker));
        Ok(self)
    }

    fn check_new_marker(&self, name: &str) -> Result<(), PanelError> {
        let count = self.marker_to_block.len() + self.pending.len();
        if check_marker_limit(count).is_some() {
            return Err(PanelError::TooManyMarkers(count));
        }
        if self.marker_to_block.contains_key(name)
            || self.pending.iter().any(|(_, m)| m.name == name)
        {
            return Err(PanelError::DuplicateMarker(name.to_string()));
        }
        Ok(())
    }

    /// Resolve linked markers and freeze the panel
    ///
    /// # Errors
    ///
    /// Returns `PanelError::UnknownAnchor` if a linked marker names an anchor
    /// that was never added, or `PanelError::LinkageInconsistency` if its MAF
    /// disagrees with the anchor's block.
    pub fn build(mut self) -> Result<HaplotypeDatabase, PanelError> {
        for (anchor, marker) in std::mem::take(&mut self.pending) {
            let index = *self
                .id_to_index
                .get(&BlockId::new(anchor.clone()))
                .ok_or_else(|| PanelError::UnknownAnchor {
                    marker: marker.name.clone(),
                    anchor,
                })?;
            let name = marker.name.clone();
            self.blocks[index].add_marker(marker)?;
            self.marker_to_block.insert(name, index);
        }

        let mut locus_to_marker = HashMap::new();
        for (index, block) in self.blocks.iter().enumerate() {
            for marker in &block.markers {
                locus_to_marker.insert(
                    (marker.chromosome.clone(), marker.position),
                    (index, marker.name.clone()),
                );
            }
        }

        debug!(
            "Built haplotype panel with {} blocks and {} markers",
            self.blocks.len(),
            self.marker_to_block.len()
        );

        Ok(HaplotypeDatabase {
            blocks: self.blocks.into_iter().map(Arc::new).collect(),
            id_to_index: self.id_to_index,
            marker_to_block: self.marker_to_block,
            locus_to_marker,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(name: &str, pos: u64, maf: f64) -> Marker {
        Marker::new(name, "chr1", pos, b'A', b'G', maf)
    }

    fn make_test_panel() -> HaplotypeDatabase {
        let mut builder = HaplotypeDatabaseBuilder::new();
        builder.add_anchor(marker("rs1", 100, 0.3)).unwrap();
        builder.add_linked("rs1", marker("rs2", 150, 0.3)).unwrap();
        builder.add_anchor(marker("rs3", 5000, 0.45)).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_build_panel() {
        let panel = make_test_panel();
        assert_eq!(panel.len(), 2);
        assert_eq!(panel.marker_count(), 3);

        let block = panel.block_for_marker("rs2").unwrap();
        assert_eq!(block.id, BlockId::new("rs1"));
        assert_eq!(block.len(), 2);
    }

    #[test]
    fn test_find_by_locus() {
        let panel = make_test_panel();
        let (block, marker) = panel.find_by_locus("chr1", 150).unwrap();
        assert_eq!(block.id, BlockId::new("rs1"));
        assert_eq!(marker.name, "rs2");
        assert!(panel.find_by_locus("chr1", 151).is_none());
        assert!(panel.find_by_locus("chr2", 150).is_none());
    }

    #[test]
    fn test_linked_before_anchor() {
        let mut builder = HaplotypeDatabaseBuilder::new();
        builder.add_linked("rs1", marker("rs2", 150, 0.3)).unwrap();
        builder.add_anchor(marker("rs1", 100, 0.3)).unwrap();
        let panel = builder.build().unwrap();
        assert_eq!(panel.get(&BlockId::new("rs1")).unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_anchor() {
        let mut builder = HaplotypeDatabaseBuilder::new();
        builder.add_linked("rs9", marker("rs2", 150, 0.3)).unwrap();
        let err = builder.build().unwrap_err();
        assert!(matches!(err, PanelError::UnknownAnchor { .. }));
    }

    #[test]
    fn test_linkage_inconsistency_fails_build() {
        let mut builder = HaplotypeDatabaseBuilder::new();
        builder.add_anchor(marker("rs1", 100, 0.3)).unwrap();
        builder.add_linked("rs1", marker("rs2", 150, 0.2)).unwrap();
        let err = builder.build().unwrap_err();
        assert!(matches!(err, PanelError::LinkageInconsistency { .. }));
    }

    #[test]
    fn test_duplicate_marker() {
        let mut builder = HaplotypeDatabaseBuilder::new();
        builder.add_anchor(marker("rs1", 100, 0.3)).unwrap();
        let err = builder.add_anchor(marker("rs1", 200, 0.3)).unwrap_err();
        assert!(matches!(err, PanelError::DuplicateMarker(_)));
    }
}
