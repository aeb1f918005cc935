//! Run example:
//!
//! cargo run --release -- cases/taylorgreen_diff.toml
//!
//! Write the summary as toml:
//!
//! cargo run --release -- cases/taylorgreen_diff.toml --output summary.toml
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use taylorgreen::config::StudyConfig;
use taylorgreen::logging::init_logging;
use taylorgreen::study::run_study;

/// Grid convergence study against the decaying Taylor-Green vortex
#[derive(Parser)]
#[command(name = "taylorgreen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Grid convergence study against the Taylor-Green vortex", long_about = None)]
struct Cli {
    /// Study configuration (toml)
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error), default: RUST_LOG or info
    #[arg(short, long)]
    log_level: Option<String>,

    /// Write the summary to this toml file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let config = StudyConfig::from_file(&cli.config)?;
    let params = config.parameters()?;
    let loader = config.build_loader()?;
    log::info!(
        "study {:?}: nu = {:.6e}, t = {}",
        cli.config,
        params.viscosity,
        params.time
    );

    let report = run_study(&params, loader.as_ref())?;
    print!("{}", report);

    if let Some(path) = &cli.output {
        let toml = report.summary().to_toml()?;
        std::fs::write(path, toml).with_context(|| format!("failed to write {:?}", path))?;
        log::info!(" ==> {:?}", path);
    }
    Ok(())
}
