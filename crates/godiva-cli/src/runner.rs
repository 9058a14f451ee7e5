//! Sweep drivers: geometry generation, k-effective runs, volume
//! calculations and plots, plus the CSV reports they produce.
//!
//! Every model is processed to completion (export, engine call, result
//! capture, transient-file cleanup) before the next one starts.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use godiva_cad::generator::{GenerateError, OutputDirs, ShellGenerator};
use godiva_cad::step::{ConverterCommand, StepPipeline};
use godiva_cad::CadKernel;
use godiva_core::artifact::{ArtifactEntry, Manifest, SweepPoint};
use godiva_core::results::{
    sort_volume_records, KeffRecord, ModelKind, Outcome, VolumeComparison, VolumeRecord,
    VolumeSource,
};
use godiva_core::ShellLayout;
use godiva_transport::engine::{clean_transient, EngineError, TransportEngine};
use godiva_transport::model::Model;
use godiva_transport::{ModelAssembler, ModelOptions, StaticInputs};

/// Which generator builds the mesh artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorPath {
    Cubit,
    Step,
}

/// Generate one artifact per sweep point, in order.
///
/// A failed point is reported in its slot and does not stop the others.
pub fn generate_geometries(
    layout: &ShellLayout,
    dirs: &OutputDirs,
    kernel: &dyn CadKernel,
    path: GeneratorPath,
    converter: &ConverterCommand,
    points: &[SweepPoint],
) -> Vec<(SweepPoint, Result<ArtifactEntry, GenerateError>)> {
    points
        .iter()
        .map(|&point| {
            println!(
                "GENERATING GEOMETRY WITH angle={} aniso={}",
                point.angle, point.aniso
            );
            let result = match path {
                GeneratorPath::Cubit => ShellGenerator::new(layout, dirs.clone()).generate(kernel, point),
                GeneratorPath::Step => {
                    StepPipeline::new(layout, dirs.clone(), converter.clone()).generate(kernel, point)
                }
            };
            if let Err(e) = &result {
                log::error!("Geometry generation failed: {}", e);
            }
            (point, result)
        })
        .collect()
}

/// One plot invocation and how it went.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRecord {
    pub model: ModelKind,
    pub outcome: Outcome<()>,
}

/// Runs engine operations over the CSG baseline and every registered
/// artifact.
pub struct Sweep<'a> {
    root: PathBuf,
    mesh_dir: PathBuf,
    plot_dir: PathBuf,
    layout: &'a ShellLayout,
    inputs: &'a StaticInputs,
    assembler: ModelAssembler<'a>,
    engine: &'a dyn TransportEngine,
}

impl<'a> Sweep<'a> {
    /// `root` is the engine's working directory; the directories in
    /// `options` are relative to it.
    pub fn new(
        root: &Path,
        layout: &'a ShellLayout,
        inputs: &'a StaticInputs,
        options: ModelOptions,
        engine: &'a dyn TransportEngine,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            mesh_dir: root.join(&options.mesh_dir),
            plot_dir: root.join(&options.plot_dir),
            layout,
            inputs,
            assembler: ModelAssembler::new(layout, inputs, options),
            engine,
        }
    }

    /// Sweep points of every mesh artifact that finished exporting.
    ///
    /// Entries left by a simulated kernel are model snapshots, not meshes,
    /// and are skipped.
    pub fn available(&self) -> Result<Vec<SweepPoint>> {
        let entries = Manifest::available(&self.mesh_dir)
            .with_context(|| format!("Reading artifact manifest in {}", self.mesh_dir.display()))?;
        Ok(entries
            .into_iter()
            .filter(|e| {
                if !e.pipeline.is_mesh() {
                    log::warn!("Skipping {}: written by a {} run", e.file, e.pipeline);
                }
                e.pipeline.is_mesh()
            })
            .map(|e| e.point)
            .collect())
    }

    fn cad_models(&self) -> Result<Vec<Model>> {
        Ok(self
            .available()?
            .into_iter()
            .map(|p| self.assembler.cad(p))
            .collect())
    }

    /// Export `model`, run `op` on it and clean up, whatever the outcome.
    ///
    /// Engine failures become [`Outcome::Failed`]; failing to write the
    /// model is an error.
    fn invoke<T>(
        &self,
        model: &Model,
        op: impl FnOnce(&Path) -> Result<T, EngineError>,
    ) -> Result<Outcome<T>> {
        model
            .export(&self.root)
            .with_context(|| format!("Exporting {} to {}", model.kind, self.root.display()))?;

        let result = op(&self.root);

        match clean_transient(&self.root) {
            Ok(removed) => log::debug!("Removed {} transient files", removed.len()),
            Err(e) => log::warn!("Transient cleanup in {} failed: {}", self.root.display(), e),
        }

        Ok(match result {
            Ok(value) => Outcome::Value(value),
            Err(e) => {
                println!("Calculation for {} could not complete: {}", model.kind, e);
                log::error!("{} failed: {}", model.kind, e);
                Outcome::Failed {
                    reason: e.to_string(),
                }
            }
        })
    }

    /// Eigenvalue run for the CSG baseline, then every artifact.
    pub fn run_keff(&self) -> Result<Vec<KeffRecord>> {
        let mut models = vec![self.assembler.csg()];
        models.extend(self.cad_models()?);

        let mut records = Vec::with_capacity(models.len());
        for model in &models {
            println!("Running {}", model.kind);
            let outcome = self.invoke(model, |dir| self.engine.run(dir))?;
            if let Outcome::Value(k) = &outcome {
                println!("  k-effective = {:.5} +/- {:.5}", k.mean, k.std_dev);
            }
            records.push(KeffRecord {
                model: model.kind,
                outcome,
            });
        }
        Ok(records)
    }

    /// Exact volumes, then the CSG and artifact volume calculations.
    pub fn run_volumes(&self) -> Result<Vec<VolumeRecord>> {
        let exact = self.layout.material_volumes();
        let mut records: Vec<VolumeRecord> = exact
            .iter()
            .map(|(name, v)| VolumeRecord::exact(name.clone(), *v))
            .collect();

        let mut models = vec![self.assembler.csg()];
        models.extend(self.cad_models()?);

        for model in &models {
            println!("Calculating volumes for {}", model.kind);
            let source = VolumeSource::Model(model.kind);
            match self.invoke(model, |dir| self.engine.calculate_volumes(dir))? {
                Outcome::Value(estimates) => {
                    for est in estimates {
                        let Some(name) = self.inputs.material_name(est.material_id) else {
                            log::warn!("Engine reported unknown material {}", est.material_id);
                            continue;
                        };
                        let Some(exact) = self.layout.exact_volume(name).filter(|v| *v > 0.0) else {
                            log::warn!("Material '{}' has no exact volume to compare against", name);
                            continue;
                        };
                        records.push(VolumeRecord {
                            material: name.to_string(),
                            source,
                            outcome: Outcome::Value(VolumeComparison::against(
                                est.volume,
                                est.std_dev,
                                exact,
                            )),
                        });
                    }
                }
                Outcome::Failed { reason } => {
                    for (name, _) in &exact {
                        records.push(VolumeRecord {
                            material: name.clone(),
                            source,
                            outcome: Outcome::Failed {
                                reason: reason.clone(),
                            },
                        });
                    }
                }
            }
        }

        sort_volume_records(&mut records);
        Ok(records)
    }

    /// Plot every artifact model, then the CSG model.
    pub fn run_plots(&self) -> Result<Vec<PlotRecord>> {
        std::fs::create_dir_all(&self.plot_dir)
            .with_context(|| format!("Creating {}", self.plot_dir.display()))?;

        let mut models = self.cad_models()?;
        models.push(self.assembler.csg());

        let mut records = Vec::with_capacity(models.len());
        for model in &models {
            println!("Plotting {}", model.kind);
            let outcome = self.invoke(model, |dir| self.engine.plot_geometry(dir))?;
            records.push(PlotRecord {
                model: model.kind,
                outcome,
            });
        }
        Ok(records)
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Write k-effective records to CSV.
pub fn write_keff_csv(records: &[KeffRecord], path: &Path) -> Result<()> {
    create_parent(path)?;
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Creating {}", path.display()))?;
    writeln!(file, "{}", KeffRecord::HEADER)?;
    for record in records {
        writeln!(file, "{}", record.csv_row())?;
    }
    println!("k-effective results written to: {}", path.display());
    Ok(())
}

/// Write volume records to CSV.
pub fn write_volumes_csv(records: &[VolumeRecord], path: &Path) -> Result<()> {
    create_parent(path)?;
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Creating {}", path.display()))?;
    writeln!(file, "{}", VolumeRecord::HEADER)?;
    for record in records {
        writeln!(file, "{}", record.csv_row())?;
    }
    println!("Volume results written to: {}", path.display());
    Ok(())
}

/// Print volume records as an aligned table.
pub fn print_volume_table(records: &[VolumeRecord]) {
    println!(
        "{:<10} {:>8} {:>8} {:>14} {:>12} {:>12}",
        "material", "angle", "aniso", "volume", "sigvolume", "error_%"
    );
    for record in records {
        let row = record.csv_row();
        let cols: Vec<&str> = row.split(',').collect();
        if let [material, angle, aniso, volume, sig, err] = cols.as_slice() {
            println!(
                "{:<10} {:>8} {:>8} {:>14} {:>12} {:>12}",
                material, angle, aniso, volume, sig, err
            );
        }
    }
}
