use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::cli::{load_panel, OutputFormat};
use crate::core::types::{ContaminationTarget, IdentityGranularity};
use crate::crosscheck::{
    CrosscheckConfig, CrosscheckMode, CrosscheckReport, Crosschecker, FileSource,
    FingerprintSource, ValidationStringency,
};

#[derive(Args)]
pub struct CrosscheckArgs {
    /// Input files (VCF, VCF.gz, or pileup TSV)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Second batch of inputs; when given, only left-vs-right pairs are compared
    #[arg(long, num_args = 1..)]
    pub second_input: Vec<PathBuf>,

    /// Haplotype map defining the marker panel
    #[arg(short = 'H', long)]
    pub haplotype_map: PathBuf,

    /// JSON config file; command-line options override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Group fingerprints by this key before comparing
    #[arg(long, value_enum)]
    pub crosscheck_by: Option<IdentityGranularity>,

    /// LOD threshold for classifying pairs (usually zero or negative)
    #[arg(long, allow_hyphen_values = true)]
    pub lod_threshold: Option<f64>,

    /// Treat every pair as expected to match
    #[arg(long)]
    pub expect_all_groups_to_match: bool,

    /// Loss-of-heterozygosity rate for tumor/normal LODs
    #[arg(long)]
    pub loss_of_het_rate: Option<f64>,

    /// Error rate applied to hard genotype calls
    #[arg(long)]
    pub genotyping_error_rate: Option<f64>,

    /// Deadline for loading all inputs, in seconds
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Number of inputs to load concurrently
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// How to handle unreadable inputs
    #[arg(long, value_enum)]
    pub validation: Option<ValidationStringency>,

    /// Which pairs to compare in two-batch mode
    #[arg(long, value_enum)]
    pub mode: Option<CrosscheckMode>,

    /// Minimum base quality for pileup evidence
    #[arg(long)]
    pub min_base_quality: Option<u8>,

    /// Model this fraction of contaminating reads in pileup evidence
    #[arg(long)]
    pub contamination: Option<f64>,

    /// Report evidence for the contaminant instead of the sample
    #[arg(long, value_enum)]
    pub contamination_target: Option<ContaminationTarget>,

    /// Skip the tumor/normal LODs
    #[arg(long)]
    pub no_tumor_aware: bool,
}

impl CrosscheckArgs {
    fn to_config(&self) -> anyhow::Result<CrosscheckConfig> {
        let mut config = match &self.config {
            Some(path) => CrosscheckConfig::load_from_file(path)?,
            None => CrosscheckConfig::default(),
        };

        if let Some(v) = self.crosscheck_by {
            config.identity_granularity = v;
        }
        if let Some(v) = self.lod_threshold {
            config.lod_threshold = v;
        }
        if self.expect_all_groups_to_match {
            config.expect_all_groups_to_match = true;
        }
        if let Some(v) = self.loss_of_het_rate {
            config.p_loh = v;
        }
        if let Some(v) = self.genotyping_error_rate {
            config.matching_error_rate = v;
        }
        if let Some(v) = self.timeout {
            config.timeout_secs = v;
        }
        if let Some(v) = self.threads {
            config.num_threads = v;
        }
        if let Some(v) = self.validation {
            config.validation = v;
        }
        if let Some(v) = self.mode {
            config.mode = v;
        }
        if let Some(v) = self.min_base_quality {
            config.min_base_quality = v;
        }
        if self.contamination.is_some() {
            config.contamination = self.contamination;
        }
        if let Some(v) = self.contamination_target {
            config.contamination_target = v;
        }
        if self.no_tumor_aware {
            config.calculate_tumor_aware = false;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Execute crosscheck subcommand
///
/// # Errors
///
/// Returns an error if the panel or config cannot be loaded, the crosscheck
/// fails, or any pair has an unexpected result.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CrosscheckArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.to_config()?;
    let panel = Arc::new(load_panel(&args.haplotype_map, verbose)?);

    let options = config.load_options();
    let to_sources = |paths: &[PathBuf]| -> Vec<Arc<dyn FingerprintSource>> {
        paths
            .iter()
            .map(|p| Arc::new(FileSource::new(p.clone(), options)) as Arc<dyn FingerprintSource>)
            .collect()
    };
    let left = to_sources(&args.inputs);
    let right = to_sources(&args.second_input);

    if verbose {
        eprintln!(
            "Crosschecking {} inputs by {} ({} threads, timeout {}s)",
            left.len() + right.len(),
            config.identity_granularity,
            config.num_threads,
            config.timeout_secs
        );
    }

    let checker = Crosschecker::new(panel, config)?;
    let report = if right.is_empty() {
        checker.crosscheck(&left)?
    } else {
        checker.crosscheck_batches(&left, &right)?
    };

    match format {
        OutputFormat::Text => print_text_report(&report, verbose),
        OutputFormat::Json => print_json_report(&report, checker.config())?,
        OutputFormat::Tsv => print_tsv_report(&report),
    }

    if let Some(reason) = report.failure_summary() {
        anyhow::bail!("Crosscheck failed: {reason}");
    }

    Ok(())
}

fn print_text_report(report: &CrosscheckReport, verbose: bool) {
    println!(
        "Compared {} pairs across {} groups",
        report.results.len(),
        report.groups
    );
    for (result, count) in report.counts() {
        println!("   {result}: {count}");
    }

    let shown: Vec<_> = report
        .results
        .iter()
        .filter(|r| verbose || r.result.is_unexpected())
        .collect();
    if shown.is_empty() {
        return;
    }

    println!();
    for r in shown {
        println!(
            "{:<20} {} vs {}  LOD {:.3}  (tumor/normal {:.3}, normal/tumor {:.3}, {} blocks)",
            r.result.to_string(),
            r.left,
            r.right,
            r.match_results.lod,
            r.match_results.lod_tn,
            r.match_results.lod_nt,
            r.match_results.informative_blocks
        );
    }
}

fn print_json_report(report: &CrosscheckReport, config: &CrosscheckConfig) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "created_at": chrono::Utc::now().to_rfc3339(),
        "passed": report.passed(),
        "config": config,
        "summary": report.counts(),
        "groups": report.groups,
        "results": report.results,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_report(report: &CrosscheckReport) {
    println!(
        "left_group\tright_group\tresult\texpected_to_match\tlod\tlod_tumor_normal\tlod_normal_tumor\tsample_likelihood\tpopulation_likelihood\tinformative_blocks"
    );
    for r in &report.results {
        let m = &r.match_results;
        println!(
            "{}\t{}\t{}\t{}\t{:.4}\t{:.4}\t{:.4}\t{:.4}\t{:.4}\t{}",
            r.left,
            r.right,
            r.result,
            r.expected_to_match,
            m.lod,
            m.lod_tn,
            m.lod_nt,
            m.sample_likelihood,
            m.population_likelihood,
            m.informative_blocks
        );
    }
}
