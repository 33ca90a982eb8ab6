//! Genotype evidence from VCF sample columns.
//!
//! Records are read with noodles. Every record at a panel locus contributes
//! one piece of call evidence per sample: `PL` when present, otherwise the
//! `GT` call converted with a fixed genotyping error rate.

use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;

use noodles::vcf;
use noodles::vcf::variant::record::samples::series::value::Array;
use noodles::vcf::variant::record::samples::series::Value;
use noodles::vcf::variant::record::samples::Series;
use noodles::vcf::variant::record::AlternateBases;
use tracing::debug;

use crate::core::evidence::HaplotypeEvidence;
use crate::core::fingerprint::Fingerprint;
use crate::core::identity::FingerprintIdentity;
use crate::core::marker::{AlleleMatch, Marker};
use crate::core::panel::HaplotypeDatabase;
use crate::core::types::{Genotype, NUM_GENOTYPES};
use crate::parsing::{open_text, ParseError};
use crate::utils::validation::normalize_allele;

const GENOTYPE_KEY: &str = "GT";
const GENOTYPE_LIKELIHOODS_KEY: &str = "PL";

/// Parse a VCF file (plain, gzip or BGZF) into one fingerprint per sample
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened, or
/// `ParseError::InvalidFormat` if the header or a record is malformed.
pub fn parse_vcf_file(
    path: &Path,
    panel: &HaplotypeDatabase,
    error_rate: f64,
) -> Result<Vec<Fingerprint>, ParseError> {
    let reader = open_text(path)?;
    parse_vcf_reader(reader, &path.display().to_string(), panel, error_rate)
}

/// Parse VCF text into one fingerprint per sample
///
/// # Errors
///
/// See [`parse_vcf_reader`].
pub fn parse_vcf_text(
    text: &str,
    file: &str,
    panel: &HaplotypeDatabase,
    error_rate: f64,
) -> Result<Vec<Fingerprint>, ParseError> {
    parse_vcf_reader(text.as_bytes(), file, panel, error_rate)
}

/// Parse a VCF stream into one fingerprint per sample.
///
/// Fingerprints are keyed by sample name and labelled with `file`. Records at
/// loci outside the panel, and records whose alleles do not match the panel
/// marker, are skipped.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if the header cannot be read, there are
/// no sample columns, or a record is malformed.
pub fn parse_vcf_reader<R: BufRead>(
    inner: R,
    file: &str,
    panel: &HaplotypeDatabase,
    error_rate: f64,
) -> Result<Vec<Fingerprint>, ParseError> {
    let mut reader = vcf::io::Reader::new(inner);
    let header = reader
        .read_header()
        .map_err(|e| ParseError::InvalidFormat(format!("Invalid VCF header in {file}: {e}")))?;

    if header.sample_names().is_empty() {
        return Err(ParseError::InvalidFormat(format!(
            "VCF {file} has no sample columns"
        )));
    }

    let mut fingerprints: Vec<Fingerprint> = header
        .sample_names()
        .iter()
        .map(|s| Fingerprint::new(FingerprintIdentity::new(s.as_str()).with_file(file)))
        .collect();
    let mut records_used = 0usize;

    for (i, result) in reader.records().enumerate() {
        let record_num = i + 1;
        let invalid = |e: io::Error| {
            ParseError::InvalidFormat(format!("VCF {file} record {record_num}: {e}"))
        };
        let record = result.map_err(invalid)?;

        let chromosome = record.reference_sequence_name();
        let position = match record.variant_start() {
            Some(start) => usize::from(start.map_err(invalid)?),
            None => continue,
        };
        let Ok(position) = u64::try_from(position) else {
            continue;
        };
        let Some((block, marker)) = panel.find_by_locus(chromosome, position) else {
            continue;
        };

        let alternate_bases = record.alternate_bases();
        let alternates: Vec<&str> = alternate_bases
            .iter()
            .collect::<io::Result<_>>()
            .map_err(invalid)?;
        let Some(site) = SiteAlleles::resolve(marker, record.reference_bases(), &alternates) else {
            debug!(
                "Skipping {}:{}: alleles {}/{} do not match marker {}",
                chromosome,
                position,
                record.reference_bases(),
                alternates.join(","),
                marker
            );
            continue;
        };

        let samples = record.samples();
        let calls = match samples.select(GENOTYPE_KEY) {
            Some(series) => series
                .iter(&header)
                .map(|value| value.map(|v| v.and_then(|v| site.genotype(&v))))
                .collect::<io::Result<Vec<_>>>()
                .map_err(invalid)?,
            None => Vec::new(),
        };
        let likelihoods = match samples.select(GENOTYPE_LIKELIHOODS_KEY) {
            Some(series) => series
                .iter(&header)
                .map(|value| value.map(|v| v.and_then(|v| site.pl(&v))))
                .collect::<io::Result<Vec<_>>>()
                .map_err(invalid)?,
            None => Vec::new(),
        };

        for (s, fingerprint) in fingerprints.iter_mut().enumerate() {
            let pl = likelihoods.get(s).copied().flatten();
            let call = calls.get(s).copied().flatten();
            let evidence = match (pl, call) {
                (Some(pl), _) => HaplotypeEvidence::from_genotype_likelihoods(Arc::clone(block), pl),
                (None, Some(genotype)) => {
                    HaplotypeEvidence::from_call(Arc::clone(block), genotype, error_rate)
                }
                (None, None) => continue,
            };
            fingerprint.add(evidence).map_err(|e| {
                ParseError::InvalidFormat(format!("VCF {file} record {record_num}: {e}"))
            })?;
        }
        records_used += 1;
    }

    debug!(
        "Loaded {} samples from {} ({} panel records)",
        fingerprints.len(),
        file,
        records_used
    );

    Ok(fingerprints)
}

/// How a record's alleles map onto a panel marker
struct SiteAlleles {
    /// Index of the marker's other allele among the record's alleles
    alt_index: usize,
    /// Record REF is the marker's alternate allele
    swapped: bool,
}

impl SiteAlleles {
    fn resolve(marker: &Marker, reference: &str, alternates: &[&str]) -> Option<Self> {
        let reference = normalize_allele(reference)?;
        let swapped = match marker.match_allele(reference) {
            AlleleMatch::Ref => false,
            AlleleMatch::Alt => true,
            AlleleMatch::Other => return None,
        };
        let wanted = if swapped {
            marker.ref_allele
        } else {
            marker.alt_allele
        };
        let alt_index = alternates
            .iter()
            .position(|a| normalize_allele(a) == Some(wanted))?
            + 1;
        Some(Self { alt_index, swapped })
    }

    fn orient<T>(&self, mut values: [T; NUM_GENOTYPES]) -> [T; NUM_GENOTYPES] {
        if self.swapped {
            values.reverse();
        }
        values
    }

    /// `PL` restricted to REF and the marker's allele, in marker orientation
    fn pl(&self, value: &Value<'_>) -> Option<[u32; NUM_GENOTYPES]> {
        let Value::Array(Array::Integer(values)) = value else {
            return None;
        };
        let pls: Vec<Option<i32>> = values.iter().collect::<io::Result<_>>().ok()?;
        let at = |i: usize| -> Option<u32> { u32::try_from((*pls.get(i)?)?).ok() };

        let k = self.alt_index;
        let het = k * (k + 1) / 2;
        Some(self.orient([at(0)?, at(het)?, at(het + k)?]))
    }

    /// Diploid `GT` call in marker orientation
    fn genotype(&self, value: &Value<'_>) -> Option<Genotype> {
        let Value::Genotype(genotype) = value else {
            return None;
        };
        let alleles: Vec<Option<usize>> = genotype
            .iter()
            .map(|allele| allele.map(|(position, _)| position))
            .collect::<io::Result<_>>()
            .ok()?;
        self.dosage_call(&alleles)
    }

    fn dosage_call(&self, alleles: &[Option<usize>]) -> Option<Genotype> {
        if alleles.len() != 2 {
            return None;
        }
        let mut alt_dosage = 0u8;
        for &allele in alleles {
            match allele? {
                0 => {}
                i if i == self.alt_index => alt_dosage += 1,
                _ => return None,
            }
        }
        let genotype = Genotype::from_alt_dosage(alt_dosage)?;
        Some(if self.swapped {
            genotype.swapped()
        } else {
            genotype
        })
    }
}
