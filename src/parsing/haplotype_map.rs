use std::path::Path;

use crate::core::marker::Marker;
use crate::core::panel::{HaplotypeDatabase, HaplotypeDatabaseBuilder, PanelError};
use crate::parsing::{parse_field, read_text, ParseError};
use crate::utils::validation::{is_probability, normalize_allele};

const MIN_FIELDS: usize = 6;

/// Parse a haplotype map file (plain or gzipped)
///
/// # Errors
///
/// Returns `PanelError::Parse` if the file cannot be read or a line is
/// malformed, or any panel consistency error from building the blocks.
pub fn parse_haplotype_map_file(path: &Path) -> Result<HaplotypeDatabase, PanelError> {
    let content = read_text(path)?;
    parse_haplotype_map_text(&content)
}

/// Parse haplotype map text.
///
/// `@` lines are a free-form header and `#` lines are column headers; both
/// are skipped. Each remaining line is one marker. A marker with an empty
/// `ANCHOR_SNP` column starts a block; any other marker joins the block
/// anchored on the named marker.
///
/// # Errors
///
/// Returns `PanelError::Parse` for malformed lines or an empty panel,
/// `PanelError::DuplicateMarker`, `PanelError::UnknownAnchor`, or
/// `PanelError::LinkageInconsistency` if the blocks are inconsistent.
pub fn parse_haplotype_map_text(text: &str) -> Result<HaplotypeDatabase, PanelError> {
    let mut builder = HaplotypeDatabaseBuilder::new();
    let mut markers = 0usize;

    for (i, line) in text.lines().enumerate() {
        let line_num = i + 1;
        if line.trim().is_empty() || line.starts_with('@') || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < MIN_FIELDS {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has {} fields, expected at least {MIN_FIELDS}",
                fields.len()
            ))
            .into());
        }

        let chromosome: String = parse_field(&fields, 0, "CHROMOSOME", line_num)?;
        let position: u64 = parse_field(&fields, 1, "POSITION", line_num)?;
        let name: String = parse_field(&fields, 2, "NAME", line_num)?;
        let major = parse_allele(fields[3], "MAJOR_ALLELE", line_num)?;
        let minor = parse_allele(fields[4], "MINOR_ALLELE", line_num)?;
        let maf: f64 = parse_field(&fields, 5, "MAF", line_num)?;

        if !is_probability(maf) {
            return Err(ParseError::InvalidFormat(format!(
                "MAF on line {line_num} must be in [0, 1], got {maf}"
            ))
            .into());
        }
        if major == minor {
            return Err(ParseError::InvalidFormat(format!(
                "Marker {name} on line {line_num} has identical alleles"
            ))
            .into());
        }

        let anchor = fields.get(6).map(|s| s.trim()).unwrap_or_default();
        let marker = Marker::new(name.clone(), chromosome, position, major, minor, maf);
        if anchor.is_empty() || anchor == name {
            builder.add_anchor(marker)?;
        } else {
            builder.add_linked(anchor, marker)?;
        }
        markers += 1;
    }

    if markers == 0 {
        return Err(ParseError::InvalidFormat("No markers found in haplotype map".to_string()).into());
    }

    builder.build()
}

fn parse_allele(raw: &str, column: &str, line_num: usize) -> Result<u8, ParseError> {
    normalize_allele(raw.trim()).ok_or_else(|| {
        ParseError::InvalidFormat(format!("Invalid {column} on line {line_num}: '{raw}'"))
    })
}
