//! Godiva shell geometry through the CAD kernel, meshed and exported as a
//! DAGMC artifact.

use std::path::{Path, PathBuf};

use godiva_core::artifact::{ArtifactEntry, ArtifactError, Manifest, Pipeline, SweepPoint};
use godiva_core::ShellLayout;
use thiserror::Error;

use crate::arena::VolumeArena;
use crate::kernel::{CadError, CadKernel, CadSession};

/// Coincident geometry closer than this is welded before imprinting.
pub const MERGE_TOLERANCE: f64 = 0.0005;

/// Errors from generating one artifact.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("{kernel} failed for {point}: {source}")]
    Cad {
        kernel: String,
        point: SweepPoint,
        #[source]
        source: CadError,
    },

    #[error("{kernel} finished for {point} but {path} was not written")]
    MissingExport {
        kernel: String,
        point: SweepPoint,
        path: PathBuf,
    },

    #[error("Failed to prepare {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Where a generator writes its files.
#[derive(Debug, Clone)]
pub struct OutputDirs {
    /// DAGMC `.h5m` artifacts and the manifest.
    pub mesh: PathBuf,
    /// Native `.cub5` session saves; `None` skips the save.
    pub session: Option<PathBuf>,
    /// Intermediate STEP files of the conversion pipeline.
    pub step: PathBuf,
}

impl OutputDirs {
    /// `h5m/`, `cub5/` and `c2omc/` under `root`.
    pub fn under(root: &Path) -> Self {
        Self {
            mesh: root.join("h5m"),
            session: Some(root.join("cub5")),
            step: root.join("c2omc"),
        }
    }

    pub(crate) fn prepare(dir: &Path) -> Result<(), GenerateError> {
        std::fs::create_dir_all(dir).map_err(|source| GenerateError::Io {
            path: dir.to_path_buf(),
            source,
        })
    }

    /// Delete a previous artifact so a failed rebuild cannot leave it behind.
    pub(crate) fn discard(path: &Path) -> Result<(), GenerateError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(GenerateError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// Builds the shells with booleans, assigns material blocks, surface-meshes
/// and exports a `cf_dagmc` artifact per sweep point.
pub struct ShellGenerator<'a> {
    layout: &'a ShellLayout,
    dirs: OutputDirs,
}

impl<'a> ShellGenerator<'a> {
    pub fn new(layout: &'a ShellLayout, dirs: OutputDirs) -> Self {
        Self { layout, dirs }
    }

    /// Generate and register the artifact for `point`.
    ///
    /// Any kernel error aborts before the manifest is touched, and a stale
    /// artifact from an earlier run is removed first.
    pub fn generate(
        &self,
        kernel: &dyn CadKernel,
        point: SweepPoint,
    ) -> Result<ArtifactEntry, GenerateError> {
        let mesh_path = self.dirs.mesh.join(point.mesh_file());
        OutputDirs::prepare(&self.dirs.mesh)?;
        if let Some(dir) = &self.dirs.session {
            OutputDirs::prepare(dir)?;
        }
        OutputDirs::discard(&mesh_path)?;

        let cad_error = |source| GenerateError::Cad {
            kernel: kernel.name().to_string(),
            point,
            source,
        };

        let outcome = kernel.open(&point.stem()).and_then(|mut session| {
            self.build(session.as_mut(), point, &mesh_path)?;
            session.close()
        });
        if let Err(source) = outcome {
            OutputDirs::discard(&mesh_path)?;
            return Err(cad_error(source));
        }

        if !mesh_path.is_file() {
            return Err(GenerateError::MissingExport {
                kernel: kernel.name().to_string(),
                point,
                path: mesh_path,
            });
        }

        let pipeline = if kernel.is_simulated() {
            Pipeline::DryRun
        } else {
            Pipeline::Cubit
        };
        let entry = ArtifactEntry::new(point, pipeline);
        Manifest::record(&self.dirs.mesh, entry.clone())?;
        log::info!("Registered {} ({})", entry.file, point);
        Ok(entry)
    }

    fn build(
        &self,
        session: &mut dyn CadSession,
        point: SweepPoint,
        mesh_path: &Path,
    ) -> Result<(), CadError> {
        session.execute("reset")?;

        let mut arena = VolumeArena::create_spheres(session, self.layout.radii())?;
        arena.carve_shells(session)?;

        session.execute(&format!("merge tolerance {}", MERGE_TOLERANCE))?;
        session.execute("imprint volume all")?;
        session.execute("merge volume all")?;

        let catalog = self.layout.catalog();
        for (_, name) in catalog.iter() {
            session.execute(&format!(
                "create material \"{}\" property_group \"CUBIT-ABAQUS\"",
                name
            ))?;
        }

        for volume in arena.iter() {
            let Some(material) = self.layout.assignment().material_of(volume.index) else {
                continue;
            };
            let name = catalog.name(material).unwrap_or_default();
            session.execute("set duplicate block elements off")?;
            session.execute(&format!("block {} add volume {}", material, volume.kernel_id))?;
            session.execute(&format!("block {} name \"{}\"", material, name))?;
            session.execute(&format!("block {} material \"{}\"", material, name))?;
        }

        session.execute(&format!(
            "set trimesher coarse on ratio {} angle {}",
            point.aniso, point.angle
        ))?;
        session.execute("surface all scheme trimesh")?;
        session.execute("mesh surface all")?;

        if let Some(dir) = &self.dirs.session {
            session.execute(&format!(
                "save cub5 \"{}\" overwrite journal",
                dir.join(point.session_file()).display()
            ))?;
        }
        session.execute(&format!(
            "export cf_dagmc \"{}\" overwrite",
            mesh_path.display()
        ))
    }
}
