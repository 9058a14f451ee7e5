//! Transport engine trait.
//!
//! The engine reads `model.xml` from a working directory and leaves its
//! output files there. Everything the sweep needs back is returned from the
//! call; files are only cleaned up afterwards.

use std::path::{Path, PathBuf};

use godiva_core::results::{KeffEstimate, VolumeEstimate};
use thiserror::Error;

/// Errors from an engine invocation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {detail}")]
    Failed {
        program: String,
        status: String,
        detail: String,
    },

    #[error("Engine output has no {0}")]
    MissingResult(&'static str),

    #[error("Could not parse engine output line '{line}': {message}")]
    Parse { line: String, message: String },
}

/// A Monte Carlo transport engine reached through a narrow interface.
///
/// All calls block until the engine finishes; there is no timeout.
pub trait TransportEngine {
    /// Human-readable engine name.
    fn name(&self) -> &str;

    /// Eigenvalue run; returns the combined k-effective estimate.
    fn run(&self, workdir: &Path) -> Result<KeffEstimate, EngineError>;

    /// Stochastic volume calculation over the model's material domains.
    fn calculate_volumes(&self, workdir: &Path) -> Result<Vec<VolumeEstimate>, EngineError>;

    /// Render the model's plots.
    fn plot_geometry(&self, workdir: &Path) -> Result<(), EngineError>;
}

/// Remove `*.h5` and `*.xml` files at the top level of `dir`.
///
/// Subdirectories (including the static `xml/` inputs) are left alone.
pub fn clean_transient(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let transient = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("h5") | Some("xml")
        );
        if transient {
            std::fs::remove_file(&path)?;
            removed.push(path);
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_transient_keeps_inputs() {
        let dir = std::env::temp_dir().join(format!("godiva-clean-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("xml")).unwrap();
        std::fs::write(dir.join("xml/materials.xml"), "<materials/>").unwrap();
        std::fs::write(dir.join("model.xml"), "<model/>").unwrap();
        std::fs::write(dir.join("statepoint.10.h5"), b"").unwrap();
        std::fs::write(dir.join("keff.csv"), b"").unwrap();

        let mut removed = clean_transient(&dir).unwrap();
        removed.sort();
        assert_eq!(removed.len(), 2);
        assert!(dir.join("xml/materials.xml").exists());
        assert!(dir.join("keff.csv").exists());
        assert!(!dir.join("model.xml").exists());
    }
}
