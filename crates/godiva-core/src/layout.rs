//! Validated shell layout: radii, catalog and assignment together.
//!
//! Both model families (analytic CSG and DAGMC mesh) are derived from the
//! same [`ShellLayout`], which is what makes them cross-validation pairs.

use thiserror::Error;

use crate::materials::{MaterialCatalog, VolumeAssignment};
use crate::shells::ShellRadii;

/// Errors from building a shell layout.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Layout needs at least one shell")]
    NoShells,

    #[error("Radius {index} must be positive and finite, got {radius}")]
    InvalidRadius { index: usize, radius: f64 },

    #[error("Radius {index} ({radius}) must exceed the previous radius ({previous})")]
    NotIncreasing {
        index: usize,
        radius: f64,
        previous: f64,
    },

    #[error("Volume {0} has no material assigned")]
    Unassigned(usize),

    #[error("Volume {volume} is assigned unknown material id {material}")]
    UnknownMaterial { volume: usize, material: u32 },

    #[error("Volume {volume} is assigned but only {shells} shells exist")]
    ExtraVolume { volume: usize, shells: usize },
}

/// One logical cell of the layout: a single shell and what fills it.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellCell {
    /// Logical volume index, 1 = innermost.
    pub index: usize,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub material_id: u32,
    pub material_name: String,
}

/// Radii plus materials, checked for consistency.
#[derive(Debug, Clone)]
pub struct ShellLayout {
    radii: ShellRadii,
    catalog: MaterialCatalog,
    assignment: VolumeAssignment,
}

impl ShellLayout {
    pub fn new(
        radii: ShellRadii,
        catalog: MaterialCatalog,
        assignment: VolumeAssignment,
    ) -> Result<Self, LayoutError> {
        for (volume, material) in assignment.iter() {
            if volume == 0 || volume > radii.len() {
                return Err(LayoutError::ExtraVolume {
                    volume,
                    shells: radii.len(),
                });
            }
            if !catalog.contains(material) {
                return Err(LayoutError::UnknownMaterial { volume, material });
            }
        }
        if let Some(missing) = (1..=radii.len()).find(|v| assignment.material_of(*v).is_none()) {
            return Err(LayoutError::Unassigned(missing));
        }
        Ok(Self {
            radii,
            catalog,
            assignment,
        })
    }

    /// The ten-shell Godiva benchmark.
    pub fn godiva() -> Self {
        Self {
            radii: ShellRadii::godiva(),
            catalog: MaterialCatalog::godiva(),
            assignment: VolumeAssignment::godiva(),
        }
    }

    pub fn radii(&self) -> &ShellRadii {
        &self.radii
    }

    pub fn catalog(&self) -> &MaterialCatalog {
        &self.catalog
    }

    pub fn assignment(&self) -> &VolumeAssignment {
        &self.assignment
    }

    pub fn shell_count(&self) -> usize {
        self.radii.len()
    }

    /// Material name filling logical volume `index`.
    pub fn material_name_of(&self, index: usize) -> Option<&str> {
        self.assignment
            .material_of(index)
            .and_then(|id| self.catalog.name(id))
    }

    /// One cell per shell, innermost first.
    pub fn cells(&self) -> Vec<ShellCell> {
        let volumes = 1..=self.radii.len();
        volumes
            .filter_map(|index| {
                let material_id = self.assignment.material_of(index)?;
                Some(ShellCell {
                    index,
                    inner_radius: self.radii.inner_of(index)?,
                    outer_radius: self.radii.outer_of(index)?,
                    material_id,
                    material_name: self.catalog.name(material_id)?.to_string(),
                })
            })
            .collect()
    }

    /// Exact volume per material name, in catalog id order.
    ///
    /// Materials with no assigned shell are reported with zero volume.
    pub fn material_volumes(&self) -> Vec<(String, f64)> {
        let shell_volumes = self.radii.shell_volumes();
        self.catalog
            .iter()
            .map(|(id, name)| {
                let total = self
                    .assignment
                    .volumes_of(id)
                    .iter()
                    .map(|v| shell_volumes[v - 1])
                    .sum();
                (name.to_string(), total)
            })
            .collect()
    }

    /// Exact volume of a single material, looked up by name.
    pub fn exact_volume(&self, material: &str) -> Option<f64> {
        self.material_volumes()
            .into_iter()
            .find(|(name, _)| name == material)
            .map(|(_, v)| v)
    }
}
