//! OpenMC executable backend.
//!
//! Runs `openmc` synchronously in the working directory and reads results
//! from its standard output rather than from the HDF5 files it leaves
//! behind:
//!
//! ```text
//!  Combined k-effective        =  1.00012 +/-  0.00045
//!    Material 1: 4.4659E+00 +/- 1.3E-03 cm^3
//! ```

use std::path::Path;
use std::process::{Command, Output};

use godiva_core::results::{KeffEstimate, VolumeEstimate};

use crate::engine::{EngineError, TransportEngine};

const KEFF_MARKER: &str = "Combined k-effective";
const STDERR_TAIL: usize = 8;

/// The `openmc` command-line executable.
#[derive(Debug, Clone)]
pub struct OpenMcExecutable {
    program: String,
    threads: Option<usize>,
}

impl Default for OpenMcExecutable {
    fn default() -> Self {
        Self::new("openmc")
    }
}

impl OpenMcExecutable {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            threads: None,
        }
    }

    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    fn invoke(&self, workdir: &Path, mode: Option<&str>) -> Result<String, EngineError> {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(workdir);
        if let Some(flag) = mode {
            cmd.arg(flag);
        }
        if let Some(n) = self.threads {
            cmd.arg("--threads").arg(n.to_string());
        }
        log::debug!("Running {:?} in {}", cmd, workdir.display());

        let output = cmd.output().map_err(|source| EngineError::Launch {
            program: self.program.clone(),
            source,
        })?;
        self.check(&output)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn check(&self, output: &Output) -> Result<(), EngineError> {
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let source = if stderr.trim().is_empty() { stdout } else { stderr };
        let lines: Vec<&str> = source.lines().filter(|l| !l.trim().is_empty()).collect();
        let tail = lines[lines.len().saturating_sub(STDERR_TAIL)..].join(" | ");
        Err(EngineError::Failed {
            program: self.program.clone(),
            status: output.status.to_string(),
            detail: tail,
        })
    }
}

impl TransportEngine for OpenMcExecutable {
    fn name(&self) -> &str {
        &self.program
    }

    fn run(&self, workdir: &Path) -> Result<KeffEstimate, EngineError> {
        let stdout = self.invoke(workdir, None)?;
        parse_keff(&stdout)
    }

    fn calculate_volumes(&self, workdir: &Path) -> Result<Vec<VolumeEstimate>, EngineError> {
        let stdout = self.invoke(workdir, Some("--volume"))?;
        parse_volumes(&stdout)
    }

    fn plot_geometry(&self, workdir: &Path) -> Result<(), EngineError> {
        self.invoke(workdir, Some("--plot")).map(|_| ())
    }
}

/// Split `"<mean> +/- <std>"` into two numbers.
fn mean_and_std(text: &str, line: &str) -> Result<(f64, f64), EngineError> {
    let parse_error = |message: &str| EngineError::Parse {
        line: line.trim().to_string(),
        message: message.to_string(),
    };
    let (mean, std) = text
        .split_once("+/-")
        .ok_or_else(|| parse_error("expected 'value +/- uncertainty'"))?;
    let mean: f64 = mean
        .trim()
        .parse()
        .map_err(|_| parse_error("mean is not a number"))?;
    let std: f64 = std
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .parse()
        .map_err(|_| parse_error("uncertainty is not a number"))?;
    Ok((mean, std))
}

/// Combined k-effective from an eigenvalue run's output.
pub fn parse_keff(stdout: &str) -> Result<KeffEstimate, EngineError> {
    let line = stdout
        .lines()
        .find(|l| l.trim_start().starts_with(KEFF_MARKER))
        .ok_or(EngineError::MissingResult("combined k-effective"))?;
    let (_, value) = line.split_once('=').ok_or_else(|| EngineError::Parse {
        line: line.trim().to_string(),
        message: "expected '='".into(),
    })?;
    let (mean, std_dev) = mean_and_std(value, line)?;
    Ok(KeffEstimate { mean, std_dev })
}

/// Per-material volumes from a volume calculation's output.
pub fn parse_volumes(stdout: &str) -> Result<Vec<VolumeEstimate>, EngineError> {
    let mut volumes = Vec::new();
    for line in stdout.lines() {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix("Material") else {
            continue;
        };
        if !trimmed.ends_with("cm^3") {
            continue;
        }
        let (id, value) = rest.split_once(':').ok_or_else(|| EngineError::Parse {
            line: trimmed.to_string(),
            message: "expected 'Material <id>: ...'".into(),
        })?;
        let material_id: u32 = id.trim().parse().map_err(|_| EngineError::Parse {
            line: trimmed.to_string(),
            message: format!("material id '{}' is not an integer", id.trim()),
        })?;
        let (volume, std_dev) = mean_and_std(value, line)?;
        volumes.push(VolumeEstimate {
            material_id,
            volume,
            std_dev,
        });
    }
    if volumes.is_empty() {
        return Err(EngineError::MissingResult("material volume results"));
    }
    Ok(volumes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EIGENVALUE_TAIL: &str = "\
 =======================>     RESULTS     <========================

 k-effective (Collision)     = 0.99940 +/- 0.00081
 k-effective (Track-length)  = 0.99910 +/- 0.00094
 k-effective (Absorption)    = 1.00021 +/- 0.00077
 Combined k-effective        = 0.99972 +/- 0.00064
 Leakage Fraction            = 0.56390 +/- 0.00030
";

    const VOLUME_TAIL: &str = "\
 Performing volume calculation 1
  Material 1: 4.4659E+00 +/- 1.3E-03 cm^3
  Material 7: 3.5020E+02 +/- 8.1E-02 cm^3
 Elapsed time: 12.3 s
";

    #[test]
    fn test_parse_keff() {
        let k = parse_keff(EIGENVALUE_TAIL).unwrap();
        assert_relative_eq!(k.mean, 0.99972);
        assert_relative_eq!(k.std_dev, 0.00064);
    }

    #[test]
    fn test_missing_keff() {
        assert!(matches!(
            parse_keff("Reading settings XML file...\n"),
            Err(EngineError::MissingResult(_))
        ));
    }

    #[test]
    fn test_parse_volumes() {
        let volumes = parse_volumes(VOLUME_TAIL).unwrap();
        assert_eq!(volumes.len(), 2);
        assert_eq!(volumes[1].material_id, 7);
        assert_relative_eq!(volumes[0].volume, 4.4659);
        assert_relative_eq!(volumes[1].std_dev, 0.081);
    }

    #[test]
    fn test_launch_failure() {
        let engine = OpenMcExecutable::new("/nonexistent/openmc");
        let err = engine.run(Path::new(".")).unwrap_err();
        assert!(matches!(err, EngineError::Launch { .. }));
    }
}
