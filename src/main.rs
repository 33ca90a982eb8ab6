use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod core;
mod crosscheck;
mod matching;
mod parsing;
mod utils;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("fp_crosscheck=debug,info")
    } else {
        EnvFilter::new("fp_crosscheck=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Crosscheck(args) => {
            cli::crosscheck::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Compare(args) => {
            cli::compare::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Panel(args) => {
            cli::panel::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
