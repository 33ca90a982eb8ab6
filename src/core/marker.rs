use serde::{Deserialize, Serialize};

/// A single biallelic marker from the haplotype panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Marker name (typically an rsID)
    pub name: String,

    /// Chromosome the marker lies on
    pub chromosome: String,

    /// 1-based position
    pub position: u64,

    /// Reference (major) allele, phased onto the block's reference haplotype
    #[serde(with = "allele_serde")]
    pub ref_allele: u8,

    /// Alternate (minor) allele
    #[serde(with = "allele_serde")]
    pub alt_allele: u8,

    /// Population frequency of the alternate allele
    pub maf: f64,
}

/// Which of the marker's alleles a base supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlleleMatch {
    Ref,
    Alt,
    Other,
}

impl Marker {
    pub fn new(
        name: impl Into<String>,
        chromosome: impl Into<String>,
        position: u64,
        ref_allele: u8,
        alt_allele: u8,
        maf: f64,
    ) -> Self {
        Self {
            name: name.into(),
            chromosome: chromosome.into(),
            position,
            ref_allele: ref_allele.to_ascii_uppercase(),
            alt_allele: alt_allele.to_ascii_uppercase(),
            maf,
        }
    }

    /// Classify an observed base against this marker's alleles
    #[must_use]
    pub fn match_allele(&self, base: u8) -> AlleleMatch {
        let base = base.to_ascii_uppercase();
        if base == self.ref_allele {
            AlleleMatch::Ref
        } else if base == self.alt_allele {
            AlleleMatch::Alt
        } else {
            AlleleMatch::Other
        }
    }

    /// Genomic locus as `chrom:pos`
    #[must_use]
    pub fn locus(&self) -> String {
        format!("{}:{}", self.chromosome, self.position)
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}:{} {}/{})",
            self.name,
            self.chromosome,
            self.position,
            self.ref_allele as char,
            self.alt_allele as char
        )
    }
}

mod allele_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(allele: &u8, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&(*allele as char).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
        let s = String::deserialize(deserializer)?;
        crate::utils::validation::normalize_allele(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid allele: {s}")))
    }
}
