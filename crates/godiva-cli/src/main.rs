//! Godiva benchmark sweep driver.
//!
//! Compares the analytic CSG model with every registered DAGMC artifact:
//! ```sh
//! godiva-sweep --run
//! godiva-sweep -c -p
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use godiva_cli::{config, runner};
use godiva_core::ShellLayout;
use godiva_transport::{OpenMcExecutable, StaticInputs};

#[derive(Parser)]
#[command(name = "godiva-sweep")]
#[command(about = "Godiva CSG vs. DAGMC benchmark sweep")]
#[command(version)]
struct Cli {
    /// Estimate material volumes and compare them with the exact values.
    #[arg(short = 'c', long = "calculate_volume")]
    calculate_volume: bool,
    /// Run eigenvalue calculations.
    #[arg(short, long)]
    run: bool,
    /// Plot slices of every model.
    #[arg(short, long)]
    plot: bool,
    /// Job configuration (default: godiva.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if !(cli.calculate_volume || cli.run || cli.plot) {
        println!("Nothing to do: pass --run, --calculate_volume and/or --plot.");
        return Ok(());
    }

    let job = config::load_config(cli.config.as_deref())?;
    let root = job.paths.root_dir()?;

    let layout = ShellLayout::godiva();
    let xml_dir = root.join(&job.paths.xml);
    let inputs = StaticInputs::load(&xml_dir)
        .with_context(|| format!("Loading engine inputs from {}", xml_dir.display()))?;
    inputs
        .check_catalog(layout.catalog())
        .context("Materials file does not match the material catalog")?;

    let engine = OpenMcExecutable::new(job.engine.executable.clone()).with_threads(job.engine.threads);
    let sweep = runner::Sweep::new(&root, &layout, &inputs, job.model_options(), &engine);

    if cli.calculate_volume {
        let records = sweep.run_volumes()?;
        runner::print_volume_table(&records);
        runner::write_volumes_csv(&records, &root.join("volumes.csv"))?;
    }

    if cli.plot {
        let records = sweep.run_plots()?;
        let failed = records.iter().filter(|r| r.outcome.is_failed()).count();
        println!("Plotted {} of {} models", records.len() - failed, records.len());
    }

    if cli.run {
        let records = sweep.run_keff()?;
        runner::write_keff_csv(&records, &root.join("keff.csv"))?;
    }

    Ok(())
}
