//! Read-level evidence from a base pileup table.
//!
//! Each line is one base observed on one read at a panel locus:
//!
//! ```text
//! sample  library  read_group  chromosome  position  base  quality
//! ```
//!
//! `library` and `read_group` may be `.` when unknown. Quality is a numeric
//! phred score.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::core::block::BlockId;
use crate::core::evidence::{HaplotypeEvidence, DEFAULT_MIN_BASE_QUALITY};
use crate::core::fingerprint::Fingerprint;
use crate::core::identity::FingerprintIdentity;
use crate::core::panel::HaplotypeDatabase;
use crate::core::types::ContaminationTarget;
use crate::parsing::{parse_field, read_text, ParseError};

const NUM_COLUMNS: usize = 7;

/// How pileup bases are turned into evidence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PileupOptions {
    /// Bases below this quality are ignored
    pub min_base_quality: u8,
    /// Fraction of reads from a contaminating individual, if modelled
    pub contamination: Option<f64>,
    /// Which individual contaminated evidence describes
    pub target: ContaminationTarget,
}

impl Default for PileupOptions {
    fn default() -> Self {
        Self {
            min_base_quality: DEFAULT_MIN_BASE_QUALITY,
            contamination: None,
            target: ContaminationTarget::Sample,
        }
    }
}

/// Parse a pileup file (plain or gzipped)
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::InvalidFormat` if a line is malformed.
pub fn parse_pileup_file(
    path: &Path,
    panel: &HaplotypeDatabase,
    options: &PileupOptions,
) -> Result<Vec<Fingerprint>, ParseError> {
    let content = read_text(path)?;
    parse_pileup_text(&content, &path.display().to_string(), panel, options)
}

/// Parse pileup text into one fingerprint per (sample, library, read group).
///
/// Fingerprints are returned in identity order. Bases at loci outside the
/// panel are skipped.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a line has the wrong number of
/// columns, an unparseable position or quality, or a multi-character base.
pub fn parse_pileup_text(
    text: &str,
    file: &str,
    panel: &HaplotypeDatabase,
    options: &PileupOptions,
) -> Result<Vec<Fingerprint>, ParseError> {
    let mut evidence: BTreeMap<FingerprintIdentity, BTreeMap<BlockId, HaplotypeEvidence>> =
        BTreeMap::new();
    let mut used = 0usize;
    let mut off_panel = 0usize;

    for (i, line) in text.lines().enumerate() {
        let line_num = i + 1;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if line_num == 1 && fields.first().is_some_and(|f| f.eq_ignore_ascii_case("sample")) {
            continue;
        }
        if fields.len() != NUM_COLUMNS {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has {} columns, expected {NUM_COLUMNS}",
                fields.len()
            )));
        }

        let position: u64 = parse_field(&fields, 4, "position", line_num)?;
        let quality: u8 = parse_field(&fields, 6, "quality", line_num)?;
        let base = match fields[5].trim().as_bytes() {
            [b] => *b,
            _ => {
                return Err(ParseError::InvalidFormat(format!(
                    "Invalid base on line {line_num}: '{}'",
                    fields[5]
                )))
            }
        };

        let Some((block, marker)) = panel.find_by_locus(fields[3].trim(), position) else {
            off_panel += 1;
            continue;
        };

        let identity = make_identity(fields[0], fields[1], fields[2], file);
        let block_evidence = evidence
            .entry(identity)
            .or_default()
            .entry(block.id.clone())
            .or_insert_with(|| new_read_evidence(Arc::clone(block), options));

        if block_evidence
            .add_base(&marker.name, base, quality)
            .map_err(|e| ParseError::InvalidFormat(format!("Line {line_num}: {e}")))?
        {
            used += 1;
        }
    }

    debug!(
        "Pileup {}: {} informative bases, {} off-panel lines",
        file, used, off_panel
    );

    evidence
        .into_iter()
        .map(|(identity, blocks)| {
            let mut fingerprint = Fingerprint::new(identity);
            for ev in blocks.into_values() {
                fingerprint
                    .add(ev)
                    .map_err(|e| ParseError::InvalidFormat(e.to_string()))?;
            }
            Ok(fingerprint)
        })
        .collect()
}

fn make_identity(sample: &str, library: &str, read_group: &str, file: &str) -> FingerprintIdentity {
    let mut identity = FingerprintIdentity::new(sample.trim()).with_file(file);
    if let Some(library) = known(library) {
        identity = identity.with_library(library);
    }
    if let Some(read_group) = known(read_group) {
        identity = identity.with_read_group(read_group);
    }
    identity
}

fn known(field: &str) -> Option<&str> {
    let field = field.trim();
    (!field.is_empty() && field != ".").then_some(field)
}

fn new_read_evidence(
    block: Arc<crate::core::block::HaplotypeBlock>,
    options: &PileupOptions,
) -> HaplotypeEvidence {
    match options.contamination {
        Some(alpha) => HaplotypeEvidence::from_contaminated_reads(
            block,
            alpha,
            options.target,
            options.min_base_quality,
        ),
        None => HaplotypeEvidence::from_reads(block, options.min_base_quality),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::evidence::EvidenceSource;
    use crate::core::types::Genotype;
    use crate::parsing::haplotype_map::parse_haplotype_map_text;

    fn make_panel() -> HaplotypeDatabase {
        parse_haplotype_map_text(
            "chr1\t100\trs1\tA\tG\t0.3\t\n\
chr1\t150\trs2\tC\tT\t0.3\trs1\n\
chr2\t500\trs3\tG\tT\t0.4\t\n",
        )
        .unwrap()
    }

    fn pileup_lines(sample: &str, rg: &str, chrom: &str, pos: u64, bases: &str) -> String {
        bases
            .chars()
            .map(|b| format!("{sample}\tlib1\t{rg}\t{chrom}\t{pos}\t{b}\t30\n"))
            .collect()
    }

    #[test]
    fn test_parse_pileup_groups_by_read_group() {
        let panel = make_panel();
        let mut text = String::from("sample\tlibrary\tread_group\tchromosome\tposition\tbase\tquality\n");
        text.push_str(&pileup_lines("S1", "rg1", "chr1", 100, "AAAAGGGG"));
        text.push_str(&pileup_lines("S1", "rg2", "chr2", 500, "TTTTTTTT"));
        text.push_str(&pileup_lines("S1", "rg1", "chr9", 1, "AC"));

        let fps = parse_pileup_text(&text, "s1.tsv", &panel, &PileupOptions::default()).unwrap();
        assert_eq!(fps.len(), 2);
        assert_eq!(fps[0].identity.read_group.as_deref(), Some("rg1"));
        assert_eq!(fps[0].identity.library.as_deref(), Some("lib1"));

        let rs1 = panel.block_for_marker("rs1").unwrap();
        let ev = fps[0].get(&rs1.id).unwrap();
        assert_eq!(ev.most_likely_genotype(), Genotype::Het);
        assert_eq!(ev.allele_counts().unwrap().ref_count, 4);
        assert_eq!(ev.allele_counts().unwrap().alt_count, 4);

        let rs3 = panel.block_for_marker("rs3").unwrap();
        assert_eq!(fps[1].get(&rs3.id).unwrap().most_likely_genotype(), Genotype::HomVar);
    }

    #[test]
    fn test_linked_markers_share_evidence() {
        let panel = make_panel();
        let mut text = pileup_lines("S1", ".", "chr1", 100, "GGG");
        text.push_str(&pileup_lines("S1", ".", "chr1", 150, "TTT"));
        let fps = parse_pileup_text(&text, "s1.tsv", &panel, &PileupOptions::default()).unwrap();
        assert_eq!(fps.len(), 1);
        assert!(fps[0].identity.read_group.is_none());
        assert_eq!(fps[0].len(), 1);
        let counts = fps[0].iter().next().unwrap().1.allele_counts().unwrap();
        assert_eq!(counts.alt_count, 6);
    }

    #[test]
    fn test_low_quality_bases_ignored() {
        let panel = make_panel();
        let text = "S1\tlib1\trg1\tchr1\t100\tG\t5\n";
        let fps = parse_pileup_text(text, "s1.tsv", &panel, &PileupOptions::default()).unwrap();
        assert!(!fps[0].iter().next().unwrap().1.has_evidence());
    }

    #[test]
    fn test_contaminated_evidence() {
        let panel = make_panel();
        let text = pileup_lines("S1", "rg1", "chr1", 100, "AAAAAAAAAG");
        let options = PileupOptions {
            contamination: Some(0.1),
            ..PileupOptions::default()
        };
        let fps = parse_pileup_text(&text, "s1.tsv", &panel, &options).unwrap();
        let ev = fps[0].iter().next().unwrap().1;
        assert!(matches!(ev.source(), EvidenceSource::ContaminatedReads(_)));
        assert_eq!(ev.most_likely_genotype(), Genotype::HomRef);
    }

    #[test]
    fn test_malformed_lines() {
        let panel = make_panel();
        let options = PileupOptions::default();
        assert!(parse_pileup_text("S1\tlib\trg\tchr1\t100\tA\n", "x", &panel, &options).is_err());
        assert!(parse_pileup_text("S1\tlib\trg\tchr1\tx\tA\t30\n", "x", &panel, &options).is_err());
        assert!(parse_pileup_text("S1\tlib\trg\tchr1\t100\tAC\t30\n", "x", &panel, &options).is_err());
        assert!(parse_pileup_text("S1\tlib\trg\tchr1\t100\tA\t300\n", "x", &panel, &options).is_err());
    }
}
