//! Sweep parameter pairs, artifact naming and the sidecar manifest.
//!
//! Every generated mesh geometry is keyed by its `(angle, aniso)` pair. The
//! pair is still encoded into the file name for humans, but later stages
//! discover artifacts through `manifest.json` in the mesh directory rather
//! than by splitting file names on underscores.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the manifest inside the mesh directory.
pub const MANIFEST_FILE: &str = "manifest.json";

const STEM_PREFIX: &str = "geometry_angle_";
const ANISO_MARKER: &str = "_aniso_";

/// Errors from artifact naming and manifest handling.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest {path} is malformed: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Artifact name '{name}' is malformed: {message}")]
    BadName { name: String, message: String },
}

/// One point of the meshing-fidelity sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    /// Surface mesher angle.
    pub angle: f64,
    /// Surface mesher anisotropy (coarseness) ratio.
    pub aniso: f64,
}

impl SweepPoint {
    pub fn new(angle: f64, aniso: f64) -> Self {
        Self { angle, aniso }
    }

    /// `angle_{angle}_aniso_{aniso}`, used for plot names.
    pub fn label(&self) -> String {
        format!("angle_{}_aniso_{}", self.angle, self.aniso)
    }

    /// `geometry_angle_{angle}_aniso_{aniso}`, shared by every artifact kind.
    pub fn stem(&self) -> String {
        format!("geometry_{}", self.label())
    }

    /// Mesh artifact file name (`.h5m`).
    pub fn mesh_file(&self) -> String {
        format!("{}.h5m", self.stem())
    }

    /// Native CAD session file name (`.cub5`).
    pub fn session_file(&self) -> String {
        format!("{}.cub5", self.stem())
    }

    /// STEP export file name used by the conversion pipeline.
    pub fn step_file(&self) -> String {
        format!("{}.step", self.stem())
    }

    /// CAD journal file name (`.jou`).
    pub fn journal_file(&self) -> String {
        format!("{}.jou", self.stem())
    }

    fn sort_key(&self, other: &Self) -> std::cmp::Ordering {
        self.angle
            .total_cmp(&other.angle)
            .then(self.aniso.total_cmp(&other.aniso))
    }
}

impl fmt::Display for SweepPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "angle={} aniso={}", self.angle, self.aniso)
    }
}

/// Which generator produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pipeline {
    /// Cubit journal: boolean shells, trimesh, `export cf_dagmc`.
    Cubit,
    /// STEP export followed by an external STEP-to-DAGMC converter.
    Step,
    /// Recovered from a legacy file name by `reindex`.
    Unknown,
    /// Written by a simulated kernel; a model snapshot, not a mesh.
    #[serde(rename = "dry-run")]
    DryRun,
}

impl Pipeline {
    /// Whether the artifact is a real DAGMC mesh an engine can load.
    pub fn is_mesh(&self) -> bool {
        !matches!(self, Pipeline::DryRun)
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pipeline::Cubit => "cubit",
            Pipeline::Step => "step",
            Pipeline::Unknown => "unknown",
            Pipeline::DryRun => "dry-run",
        };
        f.write_str(name)
    }
}

/// A registered mesh artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    /// File name relative to the mesh directory.
    pub file: String,
    #[serde(flatten)]
    pub point: SweepPoint,
    pub pipeline: Pipeline,
    /// Seconds since the Unix epoch at registration.
    #[serde(default)]
    pub created: u64,
}

impl ArtifactEntry {
    /// Entry for a freshly exported artifact, stamped with the current time.
    pub fn new(point: SweepPoint, pipeline: Pipeline) -> Self {
        let created = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            file: point.mesh_file(),
            point,
            pipeline,
            created,
        }
    }
}

/// Index of the mesh artifacts that finished exporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub artifacts: Vec<ArtifactEntry>,
}

impl Manifest {
    pub fn path(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_FILE)
    }

    /// Load the manifest from `dir`; a missing file is an empty manifest.
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let path = Self::path(dir);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ArtifactError::Io { path, source }),
        };
        serde_json::from_str(&content).map_err(|source| ArtifactError::Manifest { path, source })
    }

    /// Write the manifest atomically (temporary file, then rename).
    pub fn save(&self, dir: &Path) -> Result<(), ArtifactError> {
        std::fs::create_dir_all(dir).map_err(|source| ArtifactError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = Self::path(dir);
        let tmp = dir.join(format!("{}.tmp", MANIFEST_FILE));
        let json = serde_json::to_string_pretty(self).map_err(|source| ArtifactError::Manifest {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&tmp, json).map_err(|source| ArtifactError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| ArtifactError::Io { path, source })
    }

    /// Add an entry, replacing any previous entry for the same file.
    pub fn register(&mut self, entry: ArtifactEntry) {
        self.artifacts.retain(|e| e.file != entry.file);
        self.artifacts.push(entry);
        self.artifacts.sort_by(|a, b| a.point.sort_key(&b.point));
    }

    /// Load, register one entry and save.
    pub fn record(dir: &Path, entry: ArtifactEntry) -> Result<(), ArtifactError> {
        let mut manifest = Self::load(dir)?;
        manifest.register(entry);
        manifest.save(dir)
    }

    /// Registered entries whose artifact file is present, sorted by
    /// `(angle, aniso)`.
    pub fn available(dir: &Path) -> Result<Vec<ArtifactEntry>, ArtifactError> {
        let manifest = Self::load(dir)?;
        let mut present: Vec<ArtifactEntry> = manifest
            .artifacts
            .into_iter()
            .filter(|e| {
                let exists = dir.join(&e.file).is_file();
                if !exists {
                    log::warn!("Manifest lists {} but the file is missing; skipping", e.file);
                }
                exists
            })
            .collect();
        present.sort_by(|a, b| a.point.sort_key(&b.point));
        Ok(present)
    }

    /// Rebuild a manifest from the `.h5m` files in `dir` named with the
    /// legacy `geometry_angle_{a}_aniso_{b}.h5m` scheme.
    ///
    /// Malformed names are returned alongside the manifest, not fatal.
    pub fn from_legacy_listing(dir: &Path) -> Result<(Self, Vec<ArtifactError>), ArtifactError> {
        let read = std::fs::read_dir(dir).map_err(|source| ArtifactError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut manifest = Self::default();
        let mut rejected = Vec::new();
        for entry in read {
            let entry = entry.map_err(|source| ArtifactError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(".h5m") {
                continue;
            }
            match parse_legacy_name(&name) {
                Ok(point) => manifest.register(ArtifactEntry {
                    file: name,
                    point,
                    pipeline: Pipeline::Unknown,
                    created: 0,
                }),
                Err(e) => rejected.push(e),
            }
        }
        Ok((manifest, rejected))
    }
}

/// Parse `geometry_angle_{angle}_aniso_{aniso}.h5m` back into its pair.
pub fn parse_legacy_name(name: &str) -> Result<SweepPoint, ArtifactError> {
    let bad = |message: &str| ArtifactError::BadName {
        name: name.to_string(),
        message: message.to_string(),
    };

    let stem = name
        .strip_suffix(".h5m")
        .ok_or_else(|| bad("expected a .h5m extension"))?;
    let rest = stem
        .strip_prefix(STEM_PREFIX)
        .ok_or_else(|| bad("expected a 'geometry_angle_' prefix"))?;
    let (angle, aniso) = rest
        .split_once(ANISO_MARKER)
        .ok_or_else(|| bad("expected an '_aniso_' separator"))?;

    let angle: f64 = angle
        .parse()
        .map_err(|_| bad(&format!("angle '{}' is not a number", angle)))?;
    let aniso: f64 = aniso
        .parse()
        .map_err(|_| bad(&format!("aniso '{}' is not a number", aniso)))?;
    Ok(SweepPoint::new(angle, aniso))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names_use_shortest_float_form() {
        let point = SweepPoint::new(1.0, 100.0);
        assert_eq!(point.mesh_file(), "geometry_angle_1_aniso_100.h5m");
        assert_eq!(SweepPoint::new(0.5, 100.0).session_file(), "geometry_angle_0.5_aniso_100.cub5");
        assert_eq!(point.label(), "angle_1_aniso_100");
    }

    #[test]
    fn test_parse_legacy_name() {
        let point = parse_legacy_name("geometry_angle_0.5_aniso_100.h5m").unwrap();
        assert_eq!(point, SweepPoint::new(0.5, 100.0));
    }

    #[test]
    fn test_parse_legacy_name_rejects_malformed() {
        for name in [
            "geometry.h5m",
            "geometry_angle_x_aniso_100.h5m",
            "geometry_angle_2_aniso_100.cub5",
            "mesh_angle_2_aniso_100.h5m",
            "geometry_angle_2.h5m",
        ] {
            assert!(
                matches!(parse_legacy_name(name), Err(ArtifactError::BadName { .. })),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_register_replaces_same_file() {
        let mut manifest = Manifest::default();
        manifest.register(ArtifactEntry::new(SweepPoint::new(2.0, 100.0), Pipeline::Cubit));
        manifest.register(ArtifactEntry::new(SweepPoint::new(1.0, 100.0), Pipeline::Cubit));
        manifest.register(ArtifactEntry::new(SweepPoint::new(2.0, 100.0), Pipeline::Step));
        assert_eq!(manifest.artifacts.len(), 2);
        assert_eq!(manifest.artifacts[0].point.angle, 1.0);
        assert_eq!(manifest.artifacts[1].pipeline, Pipeline::Step);
    }

    #[test]
    fn test_dry_run_entries_are_not_meshes() {
        let entry = ArtifactEntry::new(SweepPoint::new(2.0, 100.0), Pipeline::DryRun);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"pipeline\":\"dry-run\""));
        let back: ArtifactEntry = serde_json::from_str(&json).unwrap();
        assert!(!back.pipeline.is_mesh());
        assert!(Pipeline::Cubit.is_mesh());
        assert!(Pipeline::Unknown.is_mesh());
    }
}
