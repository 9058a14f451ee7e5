//! TOML configuration for sweeps and geometry generation.
//!
//! Every section is optional; a missing `godiva.toml` means all defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use godiva_cad::step::ConverterCommand;
use godiva_cad::OutputDirs;
use godiva_core::artifact::SweepPoint;
use godiva_transport::ModelOptions;
use serde::Deserialize;

/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG: &str = "godiva.toml";

/// Scratch directory, under the root, that receives `--dry-run` output.
pub const DRY_RUN_DIR: &str = "dry-run";

/// Top-level job configuration.
#[derive(Debug, Default, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub cad: CadConfig,
    #[serde(default)]
    pub volume: VolumeConfig,
    #[serde(default)]
    pub plot: PlotConfig,
}

/// Directory layout, relative to `root`.
#[derive(Debug, Deserialize)]
pub struct PathsConfig {
    /// Working directory the engine runs in (default: ".").
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_h5m")]
    pub h5m: PathBuf,
    #[serde(default = "default_cub5")]
    pub cub5: PathBuf,
    #[serde(default = "default_c2omc")]
    pub c2omc: PathBuf,
    #[serde(default = "default_xml")]
    pub xml: PathBuf,
    #[serde(default = "default_plots")]
    pub plots: PathBuf,
    #[serde(default = "default_journal")]
    pub journal: PathBuf,
    /// Whether to keep a native `.cub5` save next to every artifact.
    #[serde(default = "default_true")]
    pub save_session: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            h5m: default_h5m(),
            cub5: default_cub5(),
            c2omc: default_c2omc(),
            xml: default_xml(),
            plots: default_plots(),
            journal: default_journal(),
            save_session: true,
        }
    }
}

impl PathsConfig {
    /// Absolute root; CAD journals need absolute paths.
    pub fn root_dir(&self) -> anyhow::Result<PathBuf> {
        std::fs::canonicalize(&self.root)
            .with_context(|| format!("Working directory {} is not accessible", self.root.display()))
    }

    /// Generator output directories under `root`, or under the scratch
    /// `dry-run/` directory so simulated output never replaces real meshes.
    pub fn output_dirs(&self, root: &Path, dry_run: bool) -> OutputDirs {
        let base = if dry_run {
            root.join(DRY_RUN_DIR)
        } else {
            root.to_path_buf()
        };
        OutputDirs {
            mesh: base.join(&self.h5m),
            session: self.save_session.then(|| base.join(&self.cub5)),
            step: base.join(&self.c2omc),
        }
    }
}

/// Meshing-fidelity sweep.
#[derive(Debug, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_angles")]
    pub angles: Vec<f64>,
    #[serde(default = "default_aniso")]
    pub aniso: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            angles: default_angles(),
            aniso: default_aniso(),
        }
    }
}

impl SweepConfig {
    pub fn points(&self) -> Vec<SweepPoint> {
        self.angles
            .iter()
            .map(|&angle| SweepPoint::new(angle, self.aniso))
            .collect()
    }
}

/// Transport engine invocation.
#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_openmc")]
    pub executable: String,
    /// OpenMP threads; engine default when unset.
    #[serde(default)]
    pub threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            executable: default_openmc(),
            threads: None,
        }
    }
}

/// CAD kernel and STEP converter.
#[derive(Debug, Deserialize)]
pub struct CadConfig {
    #[serde(default = "default_cubit")]
    pub executable: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub converter: ConverterCommand,
}

impl Default for CadConfig {
    fn default() -> Self {
        Self {
            executable: default_cubit(),
            args: Vec::new(),
            converter: ConverterCommand::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VolumeConfig {
    #[serde(default = "default_samples")]
    pub samples: u64,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PlotConfig {
    #[serde(default = "default_plot_width")]
    pub width: [f64; 2],
    #[serde(default = "default_plot_pixels")]
    pub pixels: [u32; 2],
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: default_plot_width(),
            pixels: default_plot_pixels(),
        }
    }
}

impl JobConfig {
    /// Model options derived from the `[volume]`, `[plot]` and `[paths]`
    /// sections.
    pub fn model_options(&self) -> ModelOptions {
        ModelOptions {
            volume_samples: self.volume.samples,
            plot_width: self.plot.width,
            plot_pixels: self.plot.pixels,
            plot_dir: self.paths.plots.clone(),
            mesh_dir: self.paths.h5m.clone(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_h5m() -> PathBuf {
    PathBuf::from("h5m")
}
fn default_cub5() -> PathBuf {
    PathBuf::from("cub5")
}
fn default_c2omc() -> PathBuf {
    PathBuf::from("c2omc")
}
fn default_xml() -> PathBuf {
    PathBuf::from("xml")
}
fn default_plots() -> PathBuf {
    PathBuf::from("plots")
}
fn default_journal() -> PathBuf {
    PathBuf::from("journal")
}
fn default_true() -> bool {
    true
}
fn default_angles() -> Vec<f64> {
    vec![0.5, 1.0, 2.0, 3.0, 4.0, 5.0]
}
fn default_aniso() -> f64 {
    100.0
}
fn default_openmc() -> String {
    "openmc".into()
}
fn default_cubit() -> String {
    "cubit".into()
}
fn default_samples() -> u64 {
    10_000_000
}
fn default_plot_width() -> [f64; 2] {
    [20.0, 20.0]
}
fn default_plot_pixels() -> [u32; 2] {
    [5000, 5000]
}

/// Load the job configuration.
///
/// An explicit path must exist. Without one, `godiva.toml` in the current
/// directory is used when present and defaults otherwise.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<JobConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = PathBuf::from(DEFAULT_CONFIG);
            if !p.is_file() {
                log::info!("No {} found, using defaults", DEFAULT_CONFIG);
                return Ok(JobConfig::default());
            }
            p
        }
    };
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read configuration {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid configuration {}", path.display()))
}

pub fn parse_config(content: &str) -> anyhow::Result<JobConfig> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let job = parse_config("").unwrap();
        assert_eq!(job.sweep.angles, vec![0.5, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(job.sweep.aniso, 100.0);
        assert_eq!(job.engine.executable, "openmc");
        assert_eq!(job.volume.samples, 10_000_000);
        assert!(job.paths.save_session);
    }

    #[test]
    fn test_partial_sections() {
        let job = parse_config(
            r#"
            [sweep]
            angles = [2.0]

            [engine]
            threads = 8

            [cad.converter]
            program = "convert"
            args = ["{step}", "{h5m}"]
            "#,
        )
        .unwrap();
        assert_eq!(job.sweep.points(), vec![SweepPoint::new(2.0, 100.0)]);
        assert_eq!(job.engine.threads, Some(8));
        assert_eq!(job.cad.converter.program, "convert");
        assert_eq!(job.cad.executable, "cubit");
        assert_eq!(job.paths.h5m, PathBuf::from("h5m"));
    }

    #[test]
    fn test_dry_run_output_is_kept_apart() {
        let job = parse_config("[paths]\nsave_session = false\n").unwrap();
        let root = Path::new("/work");

        let real = job.paths.output_dirs(root, false);
        assert_eq!(real.mesh, PathBuf::from("/work/h5m"));
        assert_eq!(real.session, None);

        let dry = job.paths.output_dirs(root, true);
        assert_eq!(dry.mesh, PathBuf::from("/work/dry-run/h5m"));
        assert_eq!(dry.step, PathBuf::from("/work/dry-run/c2omc"));
        assert_ne!(dry.mesh, real.mesh);
    }

    #[test]
    fn test_unknown_value_type_is_rejected() {
        assert!(parse_config("[sweep]\naniso = \"high\"\n").is_err());
    }
}
