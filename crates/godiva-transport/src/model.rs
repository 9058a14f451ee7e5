//! Model assembly: CSG and DAGMC models written as a single `model.xml`.
//!
//! Both model families embed the same static materials and settings, the
//! same volume calculation and the same pair of slice plots. They differ
//! only in the `<geometry>` section: analytic spheres per shell, or one
//! vacuum sphere filled with a DAGMC universe.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use godiva_core::artifact::SweepPoint;
use godiva_core::results::ModelKind;
use godiva_core::{ShellCell, ShellLayout};
use serde::{Deserialize, Serialize};

use crate::inputs::{SettingsFile, StaticInputs};

/// File name the engine reads.
pub const MODEL_FILE: &str = "model.xml";

/// Tunables shared by every model of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Samples of the stochastic volume calculation.
    pub volume_samples: u64,
    /// Slice plot width (cm).
    pub plot_width: [f64; 2],
    /// Slice plot resolution.
    pub plot_pixels: [u32; 2],
    /// Directory plot images are written to, relative to the working dir.
    pub plot_dir: PathBuf,
    /// Directory holding mesh artifacts, relative to the working dir.
    pub mesh_dir: PathBuf,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            volume_samples: 10_000_000,
            plot_width: [20.0, 20.0],
            plot_pixels: [5000, 5000],
            plot_dir: PathBuf::from("plots"),
            mesh_dir: PathBuf::from("h5m"),
        }
    }
}

/// What fills the model's geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// One analytic cell per shell.
    Csg(Vec<ShellCell>),
    /// A vacuum sphere of `outer_radius` filled with a DAGMC mesh.
    Dagmc { filename: PathBuf, outer_radius: f64 },
}

/// Coloring of a slice plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBy {
    Material,
    Cell,
}

impl ColorBy {
    fn as_str(&self) -> &'static str {
        match self {
            ColorBy::Material => "material",
            ColorBy::Cell => "cell",
        }
    }
}

/// An `xy` slice plot through the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct SlicePlot {
    pub id: u32,
    pub color_by: ColorBy,
    /// Output path without extension; the engine appends `.png`.
    pub filename: PathBuf,
    pub width: [f64; 2],
    pub pixels: [u32; 2],
}

/// Stochastic volume calculation over material domains inside a cube.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeCalculation {
    pub material_ids: Vec<u32>,
    pub samples: u64,
    pub half_width: f64,
}

/// A complete engine model ready to export.
#[derive(Debug, Clone)]
pub struct Model {
    pub kind: ModelKind,
    pub geometry: Geometry,
    pub volume_calc: VolumeCalculation,
    pub plots: Vec<SlicePlot>,
    materials_xml: String,
    settings_open: String,
}

/// Builds CSG and DAGMC models from one layout and one set of inputs.
pub struct ModelAssembler<'a> {
    layout: &'a ShellLayout,
    inputs: &'a StaticInputs,
    options: ModelOptions,
}

impl<'a> ModelAssembler<'a> {
    pub fn new(layout: &'a ShellLayout, inputs: &'a StaticInputs, options: ModelOptions) -> Self {
        Self {
            layout,
            inputs,
            options,
        }
    }

    /// Analytic concentric-sphere model.
    pub fn csg(&self) -> Model {
        self.assemble(ModelKind::Csg, Geometry::Csg(self.layout.cells()), "csg")
    }

    /// DAGMC model wrapping the artifact for `point`.
    pub fn cad(&self, point: SweepPoint) -> Model {
        let geometry = Geometry::Dagmc {
            filename: self.options.mesh_dir.join(point.mesh_file()),
            outer_radius: self.layout.radii().outer(),
        };
        self.assemble(ModelKind::Cad(point), geometry, &point.label())
    }

    fn assemble(&self, kind: ModelKind, geometry: Geometry, plot_label: &str) -> Model {
        let plots = [ColorBy::Material, ColorBy::Cell]
            .into_iter()
            .enumerate()
            .map(|(i, color_by)| SlicePlot {
                id: i as u32 + 1,
                color_by,
                filename: self
                    .options
                    .plot_dir
                    .join(format!("{}_{}", color_by.as_str(), plot_label)),
                width: self.options.plot_width,
                pixels: self.options.plot_pixels,
            })
            .collect();

        Model {
            kind,
            geometry,
            volume_calc: VolumeCalculation {
                material_ids: self.inputs.material_ids(),
                samples: self.options.volume_samples,
                half_width: self.layout.radii().outer(),
            },
            plots,
            materials_xml: self.inputs.materials.raw.clone(),
            settings_open: self.inputs.settings.open.clone(),
        }
    }
}

impl Model {
    /// Number of distinct material-filled cells the model exposes.
    pub fn cell_count(&self) -> Option<usize> {
        match &self.geometry {
            Geometry::Csg(cells) => Some(cells.len()),
            Geometry::Dagmc { .. } => None,
        }
    }

    /// The `<geometry>` element.
    pub fn geometry_xml(&self) -> String {
        let mut xml = String::from("<geometry>\n");
        match &self.geometry {
            Geometry::Csg(cells) => {
                let outermost = cells.len();
                for cell in cells {
                    let boundary = if cell.index == outermost {
                        " boundary=\"vacuum\""
                    } else {
                        ""
                    };
                    let _ = writeln!(
                        xml,
                        "    <surface id=\"{}\" type=\"sphere\" coeffs=\"0.0 0.0 0.0 {}\"{} />",
                        cell.index, cell.outer_radius, boundary
                    );
                }
                for cell in cells {
                    let region = if cell.index == 1 {
                        "-1".to_string()
                    } else {
                        format!("{} -{}", cell.index - 1, cell.index)
                    };
                    let _ = writeln!(
                        xml,
                        "    <cell id=\"{}\" name=\"{}\" material=\"{}\" region=\"{}\" universe=\"1\" />",
                        cell.index, cell.material_name, cell.material_id, region
                    );
                }
            }
            Geometry::Dagmc {
                filename,
                outer_radius,
            } => {
                let _ = writeln!(
                    xml,
                    "    <surface id=\"1\" type=\"sphere\" coeffs=\"0.0 0.0 0.0 {}\" boundary=\"vacuum\" />",
                    outer_radius
                );
                xml.push_str("    <cell id=\"1\" fill=\"2\" region=\"-1\" universe=\"1\" />\n");
                let _ = writeln!(
                    xml,
                    "    <dagmc_universe id=\"2\" filename=\"{}\" auto_geom_ids=\"true\" />",
                    filename.display()
                );
            }
        }
        xml.push_str("  </geometry>");
        xml
    }

    /// The static settings with this model's volume calculation in place of
    /// any the file already declared.
    pub fn settings_xml(&self) -> String {
        let v = &self.volume_calc;
        let ids: Vec<String> = v.material_ids.iter().map(u32::to_string).collect();
        let r = v.half_width;
        let calc = format!(
            "  <volume_calc>\n    <domain_type>material</domain_type>\n    <domain_ids>{}</domain_ids>\n    <samples>{}</samples>\n    <lower_left>{} {} {}</lower_left>\n    <upper_right>{} {} {}</upper_right>\n  </volume_calc>\n",
            ids.join(" "),
            v.samples,
            -r, -r, -r,
            r, r, r
        );
        format!("{}{}{}", self.settings_open, calc, SettingsFile::CLOSE)
    }

    /// The `<plots>` element.
    pub fn plots_xml(&self) -> String {
        let mut xml = String::from("<plots>\n");
        for plot in &self.plots {
            let _ = writeln!(
                xml,
                "    <plot id=\"{}\" type=\"slice\" basis=\"xy\" color_by=\"{}\" filename=\"{}\">",
                plot.id,
                plot.color_by.as_str(),
                plot.filename.display()
            );
            xml.push_str("      <origin>0.0 0.0 0.0</origin>\n");
            let _ = writeln!(xml, "      <width>{} {}</width>", plot.width[0], plot.width[1]);
            let _ = writeln!(xml, "      <pixels>{} {}</pixels>", plot.pixels[0], plot.pixels[1]);
            xml.push_str("    </plot>\n");
        }
        xml.push_str("  </plots>");
        xml
    }

    /// Full `model.xml` text.
    pub fn to_xml(&self) -> String {
        format!(
            "<?xml version='1.0' encoding='utf-8'?>\n<model>\n  {}\n  {}\n  {}\n  {}\n</model>\n",
            self.materials_xml,
            self.geometry_xml(),
            self.settings_xml(),
            self.plots_xml()
        )
    }

    /// Write `model.xml` into `dir`.
    pub fn export(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(MODEL_FILE);
        std::fs::write(&path, self.to_xml())?;
        log::debug!("Exported {} to {}", self.kind, path.display());
        Ok(path)
    }
}
