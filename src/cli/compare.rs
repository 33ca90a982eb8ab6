use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use crate::cli::{load_panel, OutputFormat};
use crate::core::fingerprint::Fingerprint;
use crate::core::identity::FingerprintIdentity;
use crate::core::panel::HaplotypeDatabase;
use crate::crosscheck::{FileSource, FingerprintSource, LoadOptions};
use crate::matching::engine::{LocusResult, MatchingConfig, MatchingEngine, DEFAULT_P_LOH};
use crate::matching::scoring::MatchResults;

#[derive(Args)]
pub struct CompareArgs {
    /// Observed input (VCF, VCF.gz, or pileup TSV)
    #[arg(required = true)]
    pub observed: PathBuf,

    /// Expected input (VCF, VCF.gz, or pileup TSV)
    #[arg(required = true)]
    pub expected: PathBuf,

    /// Haplotype map defining the marker panel
    #[arg(short = 'H', long)]
    pub haplotype_map: PathBuf,

    /// Sample to use from the observed input (default: all samples pooled)
    #[arg(long)]
    pub observed_sample: Option<String>,

    /// Sample to use from the expected input (default: all samples pooled)
    #[arg(long)]
    pub expected_sample: Option<String>,

    /// Error rate applied to hard genotype calls
    #[arg(long, default_value = "0.01")]
    pub genotyping_error_rate: f64,

    /// Loss-of-heterozygosity rate for tumor/normal LODs
    #[arg(long, default_value_t = DEFAULT_P_LOH)]
    pub loss_of_het_rate: f64,
}

/// Execute compare subcommand
///
/// # Errors
///
/// Returns an error if either input cannot be loaded, a requested sample is
/// missing, or the fingerprints were built from incompatible panels.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CompareArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let panel = load_panel(&args.haplotype_map, verbose)?;
    let options = LoadOptions {
        error_rate: args.genotyping_error_rate,
        ..LoadOptions::default()
    };

    let observed = load_one(&panel, &args.observed, args.observed_sample.as_deref(), options)?;
    let expected = load_one(&panel, &args.expected, args.expected_sample.as_deref(), options)?;

    if verbose {
        eprintln!(
            "Observed: {} blocks with evidence, expected: {} blocks with evidence",
            observed.len(),
            expected.len()
        );
    }

    let engine = MatchingEngine::new(MatchingConfig {
        p_loh: args.loss_of_het_rate,
        calculate_tumor_aware: true,
    });
    let results = engine.compare(&observed, &expected)?;
    let loci = engine.locus_results(&observed, &expected)?;

    match format {
        OutputFormat::Text => print_text(&observed, &expected, &results, &loci, verbose),
        OutputFormat::Json => print_json(&observed, &expected, &results, &loci)?,
        OutputFormat::Tsv => print_tsv(&loci),
    }

    Ok(())
}

/// Load one input and pool it into a single fingerprint
fn load_one(
    panel: &HaplotypeDatabase,
    path: &Path,
    sample: Option<&str>,
    options: LoadOptions,
) -> anyhow::Result<Fingerprint> {
    let source = FileSource::new(path, options);
    let fingerprints = source
        .load(panel)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    let selected: Vec<Fingerprint> = fingerprints
        .into_iter()
        .filter(|fp| sample.map_or(true, |s| fp.identity.sample == s))
        .collect();
    if selected.is_empty() {
        anyhow::bail!(
            "No fingerprints{} found in {}",
            sample.map(|s| format!(" for sample '{s}'")).unwrap_or_default(),
            path.display()
        );
    }

    let mut pooled = Fingerprint::new(
        FingerprintIdentity::new(sample.unwrap_or_default()).with_file(source.name()),
    );
    for fp in selected {
        pooled.absorb(fp)?;
    }
    Ok(pooled)
}

fn print_text(
    observed: &Fingerprint,
    expected: &Fingerprint,
    results: &MatchResults,
    loci: &[LocusResult],
    verbose: bool,
) {
    println!("Observed: {}", observed.identity);
    println!("Expected: {}", expected.identity);
    println!();
    println!("   LOD:                  {:.3}", results.lod);
    println!("   LOD (tumor/normal):   {:.3}", results.lod_tn);
    println!("   LOD (normal/tumor):   {:.3}", results.lod_nt);
    println!("   Sample likelihood:    {:.3}", results.sample_likelihood);
    println!("   Population likelihood: {:.3}", results.population_likelihood);
    println!("   Informative blocks:   {}", results.informative_blocks);

    let disagreeing: Vec<&LocusResult> = loci
        .iter()
        .filter(|l| verbose || l.observed_genotype != l.expected_genotype)
        .collect();
    if disagreeing.is_empty() {
        return;
    }

    println!();
    println!(
        "   {} of {} blocks {}:",
        disagreeing.len(),
        loci.len(),
        if verbose { "compared" } else { "disagree" }
    );
    for l in disagreeing {
        println!(
            "     {} {}  {} vs {}  LOD {:.3}",
            l.marker, l.locus, l.observed_genotype, l.expected_genotype, l.lod
        );
    }
}

fn print_json(
    observed: &Fingerprint,
    expected: &Fingerprint,
    results: &MatchResults,
    loci: &[LocusResult],
) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "observed": observed.identity,
        "expected": expected.identity,
        "results": results,
        "loci": loci,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(loci: &[LocusResult]) {
    println!(
        "block\tmarker\tlocus\tobserved_genotype\texpected_genotype\tobserved_genotype_lod\tlod\tlod_tumor_normal\tlod_normal_tumor"
    );
    for l in loci {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{:.4}\t{:.4}\t{:.4}\t{:.4}",
            l.block,
            l.marker,
            l.locus,
            l.observed_genotype,
            l.expected_genotype,
            l.observed_genotype_lod,
            l.lod,
            l.lod_tn,
            l.lod_nt
        );
    }
}
