//! Command-line interface for fp-crosscheck.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **crosscheck**: Compare every fingerprint group against every other
//! - **compare**: Compare two inputs with per-block diagnostics
//! - **panel**: Summarize or inspect a haplotype map
//!
//! ## Usage
//!
//! ```text
//! # Crosscheck all read groups across several VCFs
//! fp-crosscheck crosscheck -H panel.haplotype_map a.vcf.gz b.vcf.gz c.vcf.gz
//!
//! # Group by sample, tolerate unreadable inputs, JSON output
//! fp-crosscheck crosscheck -H panel.haplotype_map --crosscheck-by sample \
//!     --validation lenient --format json *.vcf.gz
//!
//! # Tumor vs normal with diagnostics
//! fp-crosscheck compare -H panel.haplotype_map tumor.pileup.tsv normal.vcf.gz
//!
//! # Panel summary
//! fp-crosscheck panel summary panel.haplotype_map
//! ```

use std::path::Path;

use clap::{Parser, Subcommand};

use crate::core::panel::HaplotypeDatabase;

pub mod compare;
pub mod crosscheck;
pub mod panel;

#[derive(Parser)]
#[command(name = "fp-crosscheck")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Check that genotype fingerprints come from the individuals they claim to")]
#[command(
    long_about = "fp-crosscheck compares genotype fingerprints from VCFs and read pileups against a haplotype panel.\n\nFor every pair of fingerprint groups it reports:\n- A LOD score for \"same individual\" vs. \"unrelated individuals\"\n- Tumor/normal aware LODs that tolerate loss of heterozygosity\n- Whether the result matches expectation (same sample name, or all groups expected to match)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crosscheck fingerprints from many inputs
    Crosscheck(crosscheck::CrosscheckArgs),

    /// Compare two inputs with per-block diagnostics
    Compare(compare::CompareArgs),

    /// Inspect a haplotype panel
    Panel(panel::PanelArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Load a haplotype map, reporting its size when verbose
pub(crate) fn load_panel(path: &Path, verbose: bool) -> anyhow::Result<HaplotypeDatabase> {
    let panel = HaplotypeDatabase::load_from_file(path)?;
    if verbose {
        eprintln!(
            "Loaded panel with {} blocks ({} markers) from {}",
            panel.len(),
            panel.marker_count(),
            path.display()
        );
    }
    Ok(panel)
}
