use std::path::{Path, PathBuf};

use crate::core::fingerprint::Fingerprint;
use crate::core::panel::HaplotypeDatabase;
use crate::parsing::pileup::{parse_pileup_file, PileupOptions};
use crate::parsing::vcf::parse_vcf_file;
use crate::parsing::ParseError;

/// Settings shared by every loader in a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    /// Error rate for hard genotype calls
    pub error_rate: f64,
    pub pileup: PileupOptions,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            error_rate: 0.01,
            pileup: PileupOptions::default(),
        }
    }
}

/// Anything that can produce fingerprints against a panel.
///
/// `load` runs on a blocking worker thread and may take as long as it needs;
/// the scheduler enforces the overall deadline.
pub trait FingerprintSource: Send + Sync {
    /// Label used in logs, errors, and as the file identity
    fn name(&self) -> String;

    /// Load every fingerprint this source contains
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the source is unreadable or malformed.
    fn load(&self, panel: &HaplotypeDatabase) -> Result<Vec<Fingerprint>, ParseError>;
}

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Vcf,
    Pileup,
}

impl InputFormat {
    /// Detect format from file extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        let name = name
            .strip_suffix(".gz")
            .or_else(|| name.strip_suffix(".bgz"))
            .unwrap_or(&name);

        if name.ends_with(".vcf") {
            Some(Self::Vcf)
        } else if name.ends_with(".pileup") || name.ends_with(".tsv") {
            Some(Self::Pileup)
        } else {
            None
        }
    }
}

/// A fingerprint source backed by a file on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: Option<InputFormat>,
    options: LoadOptions,
}

impl FileSource {
    /// Source for `path`, detecting the format from its extension
    pub fn new(path: impl Into<PathBuf>, options: LoadOptions) -> Self {
        let path = path.into();
        let format = InputFormat::from_path(&path);
        Self {
            path,
            format,
            options,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: InputFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FingerprintSource for FileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self, panel: &HaplotypeDatabase) -> Result<Vec<Fingerprint>, ParseError> {
        match self.format {
            Some(InputFormat::Vcf) => parse_vcf_file(&self.path, panel, self.options.error_rate),
            Some(InputFormat::Pileup) => parse_pileup_file(&self.path, panel, &self.options.pileup),
            None => Err(ParseError::UnsupportedFormat(self.name())),
        }
    }
}

/// Fingerprints already in memory
#[derive(Debug, Clone)]
pub struct InMemorySource {
    name: String,
    fingerprints: Vec<Fingerprint>,
}

impl InMemorySource {
    pub fn new(name: impl Into<String>, fingerprints: Vec<Fingerprint>) -> Self {
        Self {
            name: name.into(),
            fingerprints,
        }
    }
}

impl FingerprintSource for InMemorySource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn load(&self, _panel: &HaplotypeDatabase) -> Result<Vec<Fingerprint>, ParseError> {
        Ok(self.fingerprints.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_format_from_path() {
        assert_eq!(InputFormat::from_path(Path::new("a.vcf")), Some(InputFormat::Vcf));
        assert_eq!(InputFormat::from_path(Path::new("a.VCF.gz")), Some(InputFormat::Vcf));
        assert_eq!(InputFormat::from_path(Path::new("a.vcf.bgz")), Some(InputFormat::Vcf));
        assert_eq!(InputFormat::from_path(Path::new("a.pileup")), Some(InputFormat::Pileup));
        assert_eq!(InputFormat::from_path(Path::new("a.tsv.gz")), Some(InputFormat::Pileup));
        assert_eq!(InputFormat::from_path(Path::new("a.bam")), None);
    }

    #[test]
    fn test_unsupported_format() {
        let source = FileSource::new("sample.bam", LoadOptions::default());
        let err = source.load(&HaplotypeDatabase::default()).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_file() {
        let source = FileSource::new("/nonexistent/sample.vcf", LoadOptions::default());
        let err = source.load(&HaplotypeDatabase::default()).unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
    }

    #[test]
    fn test_explicit_format_overrides_extension() {
        let panel = crate::parsing::haplotype_map::parse_haplotype_map_text(
            "chr1\t100\trs1\tA\tG\t0.3\t\n",
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.txt");
        std::fs::write(
            &path,
            "##fileformat=VCFv4.2\n\
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA1\n\
chr1\t100\trs1\tA\tG\t.\tPASS\t.\tGT\t0/1\n",
        )
        .unwrap();

        let source = FileSource::new(&path, LoadOptions::default());
        assert!(source.load(&panel).is_err());

        let source = source.with_format(InputFormat::Vcf);
        assert_eq!(source.path(), path.as_path());
        let fingerprints = source.load(&panel).unwrap();
        assert_eq!(fingerprints.len(), 1);
        assert_eq!(fingerprints[0].identity.sample, "NA1");
        assert_eq!(fingerprints[0].len(), 1);
    }
}
