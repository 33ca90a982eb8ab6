use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::{load_panel, OutputFormat};
use crate::core::panel::HaplotypeDatabase;
use crate::utils::math::count_to_f64;

#[derive(Args)]
pub struct PanelArgs {
    #[command(subcommand)]
    pub command: PanelCommands,
}

#[derive(Subcommand)]
pub enum PanelCommands {
    /// Summarize a haplotype map
    Summary {
        /// Haplotype map file
        #[arg(required = true)]
        haplotype_map: PathBuf,
    },

    /// Show the block containing a marker
    Show {
        /// Haplotype map file
        #[arg(required = true)]
        haplotype_map: PathBuf,

        /// Marker name
        #[arg(required = true)]
        marker: String,
    },
}

/// Per-chromosome block and marker counts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ChromosomeCounts {
    blocks: usize,
    markers: usize,
}

/// Execute panel subcommand
///
/// # Errors
///
/// Returns an error if the haplotype map cannot be loaded or the marker is
/// not in the panel.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: PanelArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    match args.command {
        PanelCommands::Summary { haplotype_map } => {
            let panel = load_panel(&haplotype_map, verbose)?;
            print_summary(&panel, format)
        }
        PanelCommands::Show {
            haplotype_map,
            marker,
        } => {
            let panel = load_panel(&haplotype_map, verbose)?;
            show_block(&panel, &marker, format)
        }
    }
}

fn chromosome_counts(panel: &HaplotypeDatabase) -> BTreeMap<String, ChromosomeCounts> {
    let mut counts: BTreeMap<String, ChromosomeCounts> = BTreeMap::new();
    for block in panel.blocks() {
        if let Some(anchor) = block.representative_marker() {
            counts.entry(anchor.chromosome.clone()).or_default().blocks += 1;
        }
        for marker in &block.markers {
            counts.entry(marker.chromosome.clone()).or_default().markers += 1;
        }
    }
    counts
}

fn mean_maf(panel: &HaplotypeDatabase) -> f64 {
    if panel.is_empty() {
        return 0.0;
    }
    panel.blocks().map(|b| b.maf).sum::<f64>() / count_to_f64(panel.len())
}

fn print_summary(panel: &HaplotypeDatabase, format: OutputFormat) -> anyhow::Result<()> {
    let counts = chromosome_counts(panel);
    let multi_marker = panel.blocks().filter(|b| b.len() > 1).count();

    match format {
        OutputFormat::Text => {
            println!("Blocks:  {}", panel.len());
            println!("Markers: {}", panel.marker_count());
            println!("Blocks with linked markers: {multi_marker}");
            println!("Mean MAF: {:.4}", mean_maf(panel));
            println!();
            println!("{:<12} {:>8} {:>8}", "Chromosome", "Blocks", "Markers");
            for (chrom, c) in &counts {
                println!("{:<12} {:>8} {:>8}", chrom, c.blocks, c.markers);
            }
        }
        OutputFormat::Json => {
            let chromosomes: BTreeMap<&str, serde_json::Value> = counts
                .iter()
                .map(|(chrom, c)| {
                    (
                        chrom.as_str(),
                        serde_json::json!({ "blocks": c.blocks, "markers": c.markers }),
                    )
                })
                .collect();
            let output = serde_json::json!({
                "blocks": panel.len(),
                "markers": panel.marker_count(),
                "blocks_with_linked_markers": multi_marker,
                "mean_maf": mean_maf(panel),
                "chromosomes": chromosomes,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("chromosome\tblocks\tmarkers");
            for (chrom, c) in &counts {
                println!("{chrom}\t{}\t{}", c.blocks, c.markers);
            }
        }
    }
    Ok(())
}

fn show_block(panel: &HaplotypeDatabase, marker: &str, format: OutputFormat) -> anyhow::Result<()> {
    let block = panel
        .block_for_marker(marker)
        .ok_or_else(|| anyhow::anyhow!("Marker '{marker}' not found in panel"))?;

    match format {
        OutputFormat::Text => {
            println!("Block: {}", block.id);
            println!("MAF:   {:.4}", block.maf);
            let priors = block.prior_probabilities();
            println!(
                "Priors: hom_ref {:.4}, het {:.4}, hom_var {:.4}",
                priors[0], priors[1], priors[2]
            );
            println!("Markers ({}):", block.len());
            for m in &block.markers {
                println!("   {m}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(block.as_ref())?),
        OutputFormat::Tsv => {
            println!("block\tname\tchromosome\tposition\tref\talt\tmaf");
            for m in &block.markers {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    block.id,
                    m.name,
                    m.chromosome,
                    m.position,
                    m.ref_allele as char,
                    m.alt_allele as char,
                    m.maf
                );
            }
        }
    }
    Ok(())
}
