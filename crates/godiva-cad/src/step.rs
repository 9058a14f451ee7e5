//! Alternate artifact path: shells exported as STEP, then meshed and tagged
//! by an external STEP-to-DAGMC converter.
//!
//! The converter is a command template from configuration. Placeholders
//! `{step}`, `{h5m}`, `{tags}`, `{angle}` and `{aniso}` are substituted per
//! argument; `{tags}` is the comma-separated material name of each volume,
//! innermost first.
//!
//! The STEP file is produced through the same [`CadKernel`] as the journal
//! path, so outside a dry run this path still needs the Cubit executable.
//! Only the meshing and tagging move to the external converter.

use std::path::Path;
use std::process::Command;

use godiva_core::artifact::{ArtifactEntry, Manifest, Pipeline, SweepPoint};
use godiva_core::ShellLayout;
use serde::{Deserialize, Serialize};

use crate::arena::VolumeArena;
use crate::generator::{GenerateError, OutputDirs};
use crate::kernel::{CadError, CadKernel};

/// External converter invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for ConverterCommand {
    fn default() -> Self {
        Self {
            program: "step2dagmc".into(),
            args: vec![
                "{step}".into(),
                "--output".into(),
                "{h5m}".into(),
                "--tags".into(),
                "{tags}".into(),
                "--threads".into(),
                "1".into(),
            ],
        }
    }
}

impl ConverterCommand {
    /// Arguments with every placeholder filled in.
    pub fn render(&self, step: &Path, h5m: &Path, tags: &[String], point: SweepPoint) -> Vec<String> {
        let tags = tags.join(",");
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{step}", &step.display().to_string())
                    .replace("{h5m}", &h5m.display().to_string())
                    .replace("{tags}", &tags)
                    .replace("{angle}", &point.angle.to_string())
                    .replace("{aniso}", &point.aniso.to_string())
            })
            .collect()
    }

    fn run(&self, args: &[String]) -> Result<(), CadError> {
        log::info!("Running {} {}", self.program, args.join(" "));
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| CadError::Launch {
                program: self.program.clone(),
                source,
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            return Err(CadError::Converter(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            )));
        }
        Ok(())
    }
}

/// STEP export plus external conversion.
pub struct StepPipeline<'a> {
    layout: &'a ShellLayout,
    dirs: OutputDirs,
    converter: ConverterCommand,
}

impl<'a> StepPipeline<'a> {
    pub fn new(layout: &'a ShellLayout, dirs: OutputDirs, converter: ConverterCommand) -> Self {
        Self {
            layout,
            dirs,
            converter,
        }
    }

    /// Material name of each volume, innermost first.
    pub fn sequential_tags(&self) -> Vec<String> {
        (1..=self.layout.shell_count())
            .map(|i| self.layout.material_name_of(i).unwrap_or_default().to_string())
            .collect()
    }

    pub fn generate(
        &self,
        kernel: &dyn CadKernel,
        point: SweepPoint,
    ) -> Result<ArtifactEntry, GenerateError> {
        let step_path = self.dirs.step.join(point.step_file());
        let mesh_path = self.dirs.mesh.join(point.mesh_file());
        OutputDirs::prepare(&self.dirs.step)?;
        OutputDirs::prepare(&self.dirs.mesh)?;
        OutputDirs::discard(&mesh_path)?;

        let cad_error = |name: &str, source| GenerateError::Cad {
            kernel: name.to_string(),
            point,
            source,
        };

        kernel
            .open(&point.stem())
            .and_then(|mut session| {
                session.execute("reset")?;
                let mut arena = VolumeArena::create_spheres(session.as_mut(), self.layout.radii())?;
                arena.carve_shells(session.as_mut())?;
                session.execute(&format!("export step \"{}\" overwrite", step_path.display()))?;
                session.close()
            })
            .map_err(|e| cad_error(kernel.name(), e))?;

        let args = self
            .converter
            .render(&step_path, &mesh_path, &self.sequential_tags(), point);
        if let Err(e) = self.converter.run(&args) {
            OutputDirs::discard(&mesh_path)?;
            return Err(cad_error(&self.converter.program, e));
        }

        if !mesh_path.is_file() {
            return Err(GenerateError::MissingExport {
                kernel: self.converter.program.clone(),
                point,
                path: mesh_path,
            });
        }

        let pipeline = if kernel.is_simulated() {
            Pipeline::DryRun
        } else {
            Pipeline::Step
        };
        let entry = ArtifactEntry::new(point, pipeline);
        Manifest::record(&self.dirs.mesh, entry.clone())?;
        log::info!("Registered {} ({}, via STEP)", entry.file, point);
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_render_fills_placeholders() {
        let converter = ConverterCommand {
            program: "convert".into(),
            args: vec!["{step}".into(), "-o={h5m}".into(), "{tags}".into(), "a{angle}r{aniso}".into()],
        };
        let args = converter.render(
            &PathBuf::from("c2omc/g.step"),
            &PathBuf::from("h5m/g.h5m"),
            &["Shell_1".to_string(), "Air".to_string()],
            SweepPoint::new(0.5, 100.0),
        );
        assert_eq!(args, vec!["c2omc/g.step", "-o=h5m/g.h5m", "Shell_1,Air", "a0.5r100"]);
    }

    #[test]
    fn test_sequential_tags_follow_assignment() {
        let layout = ShellLayout::godiva();
        let pipeline = StepPipeline::new(
            &layout,
            OutputDirs::under(Path::new("/tmp")),
            ConverterCommand::default(),
        );
        let tags = pipeline.sequential_tags();
        assert_eq!(tags.len(), 10);
        assert_eq!(tags[0], "Shell_1");
        assert_eq!(tags[1], "Air");
        assert_eq!(tags[9], "Shell_6");
    }
}
