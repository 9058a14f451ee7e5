//! Concentric shell radii and their analytic volumes.
//!
//! Shell `i` (1-based, innermost first) is the region between radius
//! $r_{i-1}$ and $r_i$ with $r_0 = 0$, so its exact volume is
//! $\frac{4\pi}{3}(r_i^3 - r_{i-1}^3)$.

use serde::{Deserialize, Serialize};

use crate::layout::LayoutError;

/// Radii of the Godiva benchmark spheres (cm), innermost first.
pub const GODIVA_RADII: [f64; 10] = [
    1.0216, 1.0541, 6.2809, 6.2937, 7.7525, 7.7620, 8.2527, 8.2610, 8.7062, 8.7499,
];

/// Volume of a full sphere of radius `r`.
pub fn sphere_volume(r: f64) -> f64 {
    4.0 / 3.0 * std::f64::consts::PI * r.powi(3)
}

/// A strictly increasing set of positive radii sharing one origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ShellRadii(Vec<f64>);

impl ShellRadii {
    /// Validate and wrap a radius sequence.
    pub fn new(radii: Vec<f64>) -> Result<Self, LayoutError> {
        if radii.is_empty() {
            return Err(LayoutError::NoShells);
        }
        for (idx, &r) in radii.iter().enumerate() {
            if !(r.is_finite() && r > 0.0) {
                return Err(LayoutError::InvalidRadius { index: idx + 1, radius: r });
            }
            if idx > 0 && r <= radii[idx - 1] {
                return Err(LayoutError::NotIncreasing {
                    index: idx + 1,
                    radius: r,
                    previous: radii[idx - 1],
                });
            }
        }
        Ok(Self(radii))
    }

    /// The ten-shell benchmark set.
    pub fn godiva() -> Self {
        Self(GODIVA_RADII.to_vec())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Outermost radius; also the half-width of the volume-calculation box.
    pub fn outer(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// Radius bounding shell `index` from outside (1-based).
    pub fn outer_of(&self, index: usize) -> Option<f64> {
        index.checked_sub(1).and_then(|i| self.0.get(i)).copied()
    }

    /// Radius bounding shell `index` from inside, `0` for the innermost.
    pub fn inner_of(&self, index: usize) -> Option<f64> {
        match index {
            0 => None,
            1 => Some(0.0),
            _ => self.0.get(index - 2).copied(),
        }
    }

    /// Exact volume of every shell, innermost first.
    pub fn shell_volumes(&self) -> Vec<f64> {
        let mut previous = 0.0;
        self.0
            .iter()
            .map(|&r| {
                let v = sphere_volume(r) - sphere_volume(previous);
                previous = r;
                v
            })
            .collect()
    }

    /// Volume of the outermost sphere.
    pub fn total_volume(&self) -> f64 {
        sphere_volume(self.outer())
    }
}

impl TryFrom<Vec<f64>> for ShellRadii {
    type Error = LayoutError;

    fn try_from(radii: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(radii)
    }
}

impl From<ShellRadii> for Vec<f64> {
    fn from(radii: ShellRadii) -> Self {
        radii.0
    }
}
