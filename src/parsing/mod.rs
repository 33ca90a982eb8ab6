//! Parsers for haplotype panels and genotype evidence.
//!
//! This module provides parsers for:
//!
//! - **Haplotype maps**: The marker panel, grouped into linkage blocks
//! - **VCF files**: Called genotypes or genotype likelihoods per sample, read with noodles (plain, gzip or BGZF)
//! - **Pileup TSV**: Per-read base observations at panel markers
//!
//! ## Example
//!
//! ```rust,no_run
//! use fp_crosscheck::parsing::haplotype_map::parse_haplotype_map_file;
//! use fp_crosscheck::parsing::pileup::{parse_pileup_file, PileupOptions};
//! use std::path::Path;
//!
//! let panel = parse_haplotype_map_file(Path::new("panel.haplotype_map")).unwrap();
//! let fingerprints =
//!     parse_pileup_file(Path::new("sample.pileup.tsv"), &panel, &PileupOptions::default()).unwrap();
//! ```
//!
//! ## Haplotype Map Columns
//!
//! | Column | Description | Required |
//! |--------|-------------|----------|
//! | CHROMOSOME | Contig name | Yes |
//! | POSITION | 1-based position | Yes |
//! | NAME | Marker name | Yes |
//! | MAJOR_ALLELE | Allele on the block's reference haplotype | Yes |
//! | MINOR_ALLELE | Alternate allele | Yes |
//! | MAF | Minor allele frequency of the block | Yes |
//! | ANCHOR_SNP | Marker whose block this one joins (empty for an anchor) | No |
//! | PANELS | Free-form panel labels | No |

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

use flate2::read::MultiGzDecoder;

pub mod haplotype_map;
pub mod pileup;
pub mod vcf;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

fn is_gzipped(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz") || e.eq_ignore_ascii_case("bgz"))
}

/// Open a text file for buffered reading, decompressing `.gz`/`.bgz`.
///
/// Compressed input may hold several gzip members (BGZF blocks); all of them
/// are decoded.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead>, ParseError> {
    let file = File::open(path)?;
    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Read a whole text file, decompressing `.gz`/`.bgz`
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read or decompressed.
pub fn read_text(path: &Path) -> Result<String, ParseError> {
    let mut content = String::new();
    open_text(path)?.read_to_string(&mut content)?;
    Ok(content)
}

/// Parse a required column, naming the line in the error
pub(crate) fn parse_field<T: std::str::FromStr>(
    fields: &[&str],
    index: usize,
    column: &str,
    line_num: usize,
) -> Result<T, ParseError> {
    let raw = fields.get(index).map(|s| s.trim()).ok_or_else(|| {
        ParseError::InvalidFormat(format!("Line {line_num} is missing column {column}"))
    })?;
    raw.parse().map_err(|_| {
        ParseError::InvalidFormat(format!("Invalid {column} on line {line_num}: '{raw}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_read_text_plain_and_gzipped() {
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("a.txt");
        std::fs::write(&plain, "hello\n").unwrap();
        assert_eq!(read_text(&plain).unwrap(), "hello\n");

        let gz = dir.path().join("a.txt.gz");
        let mut encoder = GzEncoder::new(std::fs::File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(b"hello\n").unwrap();
        encoder.finish().unwrap();
        assert_eq!(read_text(&gz).unwrap(), "hello\n");
    }

    #[test]
    fn test_read_text_all_gzip_members() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocks.txt.bgz");

        let mut bytes = Vec::new();
        for chunk in ["line1\n", "line2\n", "line3\n"] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(chunk.as_bytes()).unwrap();
            bytes.extend(encoder.finish().unwrap());
        }
        std::fs::write(&path, bytes).unwrap();

        assert_eq!(read_text(&path).unwrap(), "line1\nline2\nline3\n");
    }

    #[test]
    fn test_parse_field_errors() {
        let fields = ["chr1", "abc"];
        let err = parse_field::<u64>(&fields, 1, "POSITION", 3).unwrap_err();
        assert!(err.to_string().contains("line 3"));
        let err = parse_field::<u64>(&fields, 5, "MAF", 4).unwrap_err();
        assert!(err.to_string().contains("missing column MAF"));
        assert_eq!(parse_field::<String>(&fields, 0, "CHROMOSOME", 1).unwrap(), "chr1");
    }
}
