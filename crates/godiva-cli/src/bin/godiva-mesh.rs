//! Generates the DAGMC geometry artifacts for the configured sweep.
//!
//! ```sh
//! godiva-mesh                      # every configured angle, Cubit journals
//! godiva-mesh --pipeline step      # STEP export plus converter
//! godiva-mesh reindex              # rebuild h5m/manifest.json from file names
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};

use godiva_cad::cubit::CubitJournal;
use godiva_cad::memory::InMemoryKernel;
use godiva_cad::CadKernel;
use godiva_cli::config::{self, JobConfig};
use godiva_cli::runner::{self, GeneratorPath};
use godiva_core::{Manifest, ShellLayout};

#[derive(Parser)]
#[command(name = "godiva-mesh")]
#[command(about = "Generate Godiva DAGMC geometries across the meshing sweep")]
#[command(version)]
struct Cli {
    /// Job configuration (default: godiva.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// How artifacts are produced.
    #[arg(long, value_enum, default_value_t = PipelineArg::Cubit)]
    pipeline: PipelineArg,
    /// Use the in-memory kernel and write under `dry-run/` instead of
    /// launching the CAD executable.
    #[arg(long)]
    dry_run: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PipelineArg {
    Cubit,
    Step,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the artifact manifest from legacy file names.
    Reindex,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let job = config::load_config(cli.config.as_deref())?;
    let root = job.paths.root_dir()?;

    match cli.command {
        Some(Commands::Reindex) => reindex(&job, &root),
        None => generate(&job, &root, cli.pipeline, cli.dry_run),
    }
}

fn reindex(job: &JobConfig, root: &std::path::Path) -> anyhow::Result<()> {
    let mesh_dir = root.join(&job.paths.h5m);
    let (manifest, rejected) = Manifest::from_legacy_listing(&mesh_dir)
        .with_context(|| format!("Listing {}", mesh_dir.display()))?;
    for e in &rejected {
        log::warn!("Skipped: {}", e);
    }
    manifest.save(&mesh_dir)?;
    println!(
        "Indexed {} artifacts in {} ({} skipped)",
        manifest.artifacts.len(),
        mesh_dir.display(),
        rejected.len()
    );
    Ok(())
}

fn generate(
    job: &JobConfig,
    root: &std::path::Path,
    pipeline: PipelineArg,
    dry_run: bool,
) -> anyhow::Result<()> {
    let layout = ShellLayout::godiva();
    let dirs = job.paths.output_dirs(root, dry_run);
    if dry_run {
        println!("Dry run: writing model snapshots to {}", dirs.mesh.display());
    }
    let path = match pipeline {
        PipelineArg::Cubit => GeneratorPath::Cubit,
        PipelineArg::Step => GeneratorPath::Step,
    };

    let kernel: Box<dyn CadKernel> = if dry_run {
        Box::new(InMemoryKernel::new())
    } else {
        let journal_dir = root.join(&job.paths.journal);
        Box::new(
            CubitJournal::new(job.cad.executable.clone(), journal_dir)
                .with_args(job.cad.args.clone()),
        )
    };

    let points = job.sweep.points();
    let results = runner::generate_geometries(
        &layout,
        &dirs,
        kernel.as_ref(),
        path,
        &job.cad.converter,
        &points,
    );

    let failed: Vec<_> = results
        .iter()
        .filter(|(_, r)| r.is_err())
        .map(|(p, _)| p.to_string())
        .collect();
    println!("Generated {} of {} geometries", results.len() - failed.len(), results.len());
    if !failed.is_empty() {
        bail!("Geometry generation failed for: {}", failed.join("; "));
    }
    Ok(())
}
