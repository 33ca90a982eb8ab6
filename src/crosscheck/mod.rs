//! Crosschecking many inputs against each other.
//!
//! - [`Crosschecker`]: Loads sources concurrently under a deadline and compares groups
//! - [`CrosscheckConfig`]: Grouping, thresholds, and load settings
//! - [`FingerprintSource`]: Anything that yields fingerprints for a panel
//!
//! ## Example
//!
//! ```rust,no_run
//! use fp_crosscheck::core::panel::HaplotypeDatabase;
//! use fp_crosscheck::crosscheck::{CrosscheckConfig, Crosschecker, FileSource, FingerprintSource};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let panel = Arc::new(HaplotypeDatabase::load_from_file(Path::new("panel.haplotype_map")).unwrap());
//! let config = CrosscheckConfig::default();
//! let sources: Vec<Arc<dyn FingerprintSource>> = vec![
//!     Arc::new(FileSource::new("a.vcf.gz", config.load_options())),
//!     Arc::new(FileSource::new("b.vcf.gz", config.load_options())),
//! ];
//!
//! let report = Crosschecker::new(panel, config).unwrap().crosscheck(&sources).unwrap();
//! println!("passed: {}", report.passed());
//! ```

pub mod config;
pub mod scheduler;
pub mod source;

pub use config::{CrosscheckConfig, CrosscheckMode, ValidationStringency};
pub use scheduler::{CrosscheckError, CrosscheckReport, CrosscheckResult, Crosschecker};
pub use source::{FileSource, FingerprintSource, InMemorySource, InputFormat, LoadOptions};
