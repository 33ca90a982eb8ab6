use serde::{Deserialize, Serialize};

use crate::core::types::IdentityGranularity;

/// Identity of a fingerprint: who the evidence came from.
///
/// Keys compare structurally. Before grouping, keys are projected onto the
/// configured granularity so that, for example, all read groups of a sample
/// collapse into one key when crosschecking by sample.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FingerprintIdentity {
    pub sample: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl FingerprintIdentity {
    pub fn new(sample: impl Into<String>) -> Self {
        Self {
            sample: sample.into(),
            library: None,
            read_group: None,
            file: None,
        }
    }

    #[must_use]
    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    #[must_use]
    pub fn with_read_group(mut self, read_group: impl Into<String>) -> Self {
        self.read_group = Some(read_group.into());
        self
    }

    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Keep only the fields that define a group at `granularity`.
    ///
    /// Grouping by file drops the sample name entirely: every fingerprint in a
    /// file lands in the same group, labelled by the file.
    #[must_use]
    pub fn project(&self, granularity: IdentityGranularity) -> Self {
        match granularity {
            IdentityGranularity::Sample => Self::new(self.sample.clone()),
            IdentityGranularity::Library => Self {
                sample: self.sample.clone(),
                library: self.library.clone(),
                read_group: None,
                file: None,
            },
            IdentityGranularity::ReadGroup => Self {
                sample: self.sample.clone(),
                library: self.library.clone(),
                read_group: self.read_group.clone(),
                file: None,
            },
            IdentityGranularity::File => Self {
                sample: String::new(),
                library: None,
                read_group: None,
                file: self.file.clone(),
            },
        }
    }
}

impl std::fmt::Display for FingerprintIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts: Vec<&str> = Vec::with_capacity(4);
        if let Some(file) = &self.file {
            parts.push(file);
        }
        if !self.sample.is_empty() {
            parts.push(&self.sample);
        }
        if let Some(library) = &self.library {
            parts.push(library);
        }
        if let Some(read_group) = &self.read_group {
            parts.push(read_group);
        }
        write!(f, "{}", parts.join("::"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn full_identity() -> FingerprintIdentity {
        FingerprintIdentity::new("NA12891")
            .with_library("lib1")
            .with_read_group("rg1")
            .with_file("a.vcf")
    }

    #[test]
    fn test_project_sample() {
        let key = full_identity().project(IdentityGranularity::Sample);
        assert_eq!(key, FingerprintIdentity::new("NA12891"));
        assert_eq!(key.to_string(), "NA12891");
    }

    #[test]
    fn test_project_library() {
        let key = full_identity().project(IdentityGranularity::Library);
        assert_eq!(key.library.as_deref(), Some("lib1"));
        assert!(key.read_group.is_none());
        assert!(key.file.is_none());
        assert_eq!(key.to_string(), "NA12891::lib1");
    }

    #[test]
    fn test_project_read_group() {
        let key = full_identity().project(IdentityGranularity::ReadGroup);
        assert_eq!(key.to_string(), "NA12891::lib1::rg1");
    }

    #[test]
    fn test_project_file() {
        let key = full_identity().project(IdentityGranularity::File);
        assert!(key.sample.is_empty());
        assert_eq!(key.to_string(), "a.vcf");
    }

    #[test]
    fn test_structural_equality() {
        let mut set = HashSet::new();
        set.insert(full_identity().project(IdentityGranularity::Sample));
        set.insert(
            FingerprintIdentity::new("NA12891")
                .with_library("other")
                .project(IdentityGranularity::Sample),
        );
        assert_eq!(set.len(), 1);
    }
}
