//! k-effective and volume result records.
//!
//! Failed engine invocations are kept as rows with an `error` sentinel so a
//! single bad model never drops out of the tabulated sweep.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::artifact::SweepPoint;

/// Sentinel written in place of numbers for failed models.
pub const ERROR_SENTINEL: &str = "error";

/// Mean and standard deviation of the multiplication factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeffEstimate {
    pub mean: f64,
    pub std_dev: f64,
}

/// Stochastic volume estimate for one material (cm³).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeEstimate {
    pub material_id: u32,
    pub volume: f64,
    pub std_dev: f64,
}

/// Which model a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ModelKind {
    /// Analytic constructive solid geometry.
    Csg,
    /// DAGMC mesh geometry for one sweep point.
    Cad(SweepPoint),
}

impl ModelKind {
    pub fn mode(&self) -> &'static str {
        match self {
            ModelKind::Csg => "CSG",
            ModelKind::Cad(_) => "CAD",
        }
    }

    /// Values for the `angle` and `aniso` columns.
    pub fn columns(&self) -> (String, String) {
        match self {
            ModelKind::Csg => ("CSG".into(), "CSG".into()),
            ModelKind::Cad(p) => (p.angle.to_string(), p.aniso.to_string()),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Csg => f.write_str("CSG model"),
            ModelKind::Cad(p) => write!(f, "CAD model ({})", p),
        }
    }
}

/// Result of one engine invocation, or why it has none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome<T> {
    Value(T),
    Failed { reason: String },
}

impl<T> Outcome<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Value(v) => Some(v),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

/// One row of `keff.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeffRecord {
    pub model: ModelKind,
    pub outcome: Outcome<KeffEstimate>,
}

impl KeffRecord {
    pub const HEADER: &'static str = "mode,angle,aniso,keff,sig_keff";

    pub fn csv_row(&self) -> String {
        let (angle, aniso) = self.model.columns();
        match &self.outcome {
            Outcome::Value(k) => format!(
                "{},{},{},{:.6},{:.6}",
                self.model.mode(),
                angle,
                aniso,
                k.mean,
                k.std_dev
            ),
            Outcome::Failed { .. } => format!(
                "{},{},{},{},{}",
                self.model.mode(),
                angle,
                aniso,
                ERROR_SENTINEL,
                ERROR_SENTINEL
            ),
        }
    }
}

/// Where a volume row comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolumeSource {
    /// Analytic shell volumes from the parameter table.
    Exact,
    Model(ModelKind),
}

impl VolumeSource {
    fn columns(&self) -> (String, String) {
        match self {
            VolumeSource::Exact => ("EXACT".into(), "EXACT".into()),
            VolumeSource::Model(m) => m.columns(),
        }
    }

    /// EXACT, then CSG, then CAD models by ascending (angle, aniso).
    fn order(&self, other: &Self) -> Ordering {
        fn rank(s: &VolumeSource) -> u8 {
            match s {
                VolumeSource::Exact => 0,
                VolumeSource::Model(ModelKind::Csg) => 1,
                VolumeSource::Model(ModelKind::Cad(_)) => 2,
            }
        }
        match (self, other) {
            (
                VolumeSource::Model(ModelKind::Cad(a)),
                VolumeSource::Model(ModelKind::Cad(b)),
            ) => a.angle.total_cmp(&b.angle).then(a.aniso.total_cmp(&b.aniso)),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

/// Computed volume of one material with its deviation from the exact value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeComparison {
    pub volume: f64,
    pub std_dev: f64,
    pub percent_error: f64,
}

impl VolumeComparison {
    pub fn against(volume: f64, std_dev: f64, exact: f64) -> Self {
        Self {
            volume,
            std_dev,
            percent_error: (volume - exact) / exact * 100.0,
        }
    }
}

/// One row of `volumes.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeRecord {
    pub material: String,
    pub source: VolumeSource,
    pub outcome: Outcome<VolumeComparison>,
}

impl VolumeRecord {
    pub const HEADER: &'static str = "material,angle,aniso,volume,sigvolume,error_percent";

    pub fn exact(material: impl Into<String>, volume: f64) -> Self {
        Self {
            material: material.into(),
            source: VolumeSource::Exact,
            outcome: Outcome::Value(VolumeComparison {
                volume,
                std_dev: 0.0,
                percent_error: 0.0,
            }),
        }
    }

    pub fn csv_row(&self) -> String {
        let (angle, aniso) = self.source.columns();
        match &self.outcome {
            Outcome::Value(v) => format!(
                "{},{},{},{:.6e},{:.6e},{:.6}",
                self.material, angle, aniso, v.volume, v.std_dev, v.percent_error
            ),
            Outcome::Failed { .. } => format!(
                "{},{},{},{e},{e},{e}",
                self.material,
                angle,
                aniso,
                e = ERROR_SENTINEL
            ),
        }
    }
}

/// Sort volume rows by material name, then EXACT, CSG and CAD points.
pub fn sort_volume_records(records: &mut [VolumeRecord]) {
    records.sort_by(|a, b| {
        a.material
            .cmp(&b.material)
            .then_with(|| a.source.order(&b.source))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keff_rows() {
        let csg = KeffRecord {
            model: ModelKind::Csg,
            outcome: Outcome::Value(KeffEstimate { mean: 1.0012, std_dev: 0.0004 }),
        };
        assert_eq!(csg.csv_row(), "CSG,CSG,CSG,1.001200,0.000400");

        let failed = KeffRecord {
            model: ModelKind::Cad(SweepPoint::new(0.5, 100.0)),
            outcome: Outcome::Failed { reason: "lost particles".into() },
        };
        assert_eq!(failed.csv_row(), "CAD,0.5,100,error,error");
    }

    #[test]
    fn test_percent_error() {
        let cmp = VolumeComparison::against(10.1, 0.01, 10.0);
        assert!((cmp.percent_error - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_volume_sort_order() {
        let cad = |angle: f64| VolumeRecord {
            material: "Air".into(),
            source: VolumeSource::Model(ModelKind::Cad(SweepPoint::new(angle, 100.0))),
            outcome: Outcome::Failed { reason: String::new() },
        };
        let mut rows = vec![
            cad(3.0),
            VolumeRecord {
                material: "Air".into(),
                source: VolumeSource::Model(ModelKind::Csg),
                outcome: Outcome::Failed { reason: String::new() },
            },
            cad(0.5),
            VolumeRecord::exact("Shell_1", 1.0),
            VolumeRecord::exact("Air", 2.0),
        ];
        sort_volume_records(&mut rows);
        let labels: Vec<(String, String)> = rows
            .iter()
            .map(|r| (r.material.clone(), r.source.columns().0))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("Air".to_string(), "EXACT".to_string()),
                ("Air".to_string(), "CSG".to_string()),
                ("Air".to_string(), "0.5".to_string()),
                ("Air".to_string(), "3".to_string()),
                ("Shell_1".to_string(), "EXACT".to_string()),
            ]
        );
    }
}
