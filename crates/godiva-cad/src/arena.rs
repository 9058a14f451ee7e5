//! Stable logical volume indices across kernel boolean operations.
//!
//! CAD kernels renumber volumes when a boolean creates a new body. The
//! arena keeps one record per shell under a fixed logical index
//! (1 = innermost) and re-resolves the kernel id after every operation
//! that can change it, so the volume-to-material table stays valid.

use godiva_core::ShellRadii;

use crate::kernel::{CadError, CadSession, EntityKind, KernelId};

/// One shell as the generator sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalVolume {
    pub index: usize,
    pub outer_radius: f64,
    pub kernel_id: KernelId,
}

/// Logical shells, innermost first.
#[derive(Debug, Clone, Default)]
pub struct VolumeArena {
    volumes: Vec<LogicalVolume>,
}

impl VolumeArena {
    /// Create one full sphere per radius.
    pub fn create_spheres(
        session: &mut dyn CadSession,
        radii: &ShellRadii,
    ) -> Result<Self, CadError> {
        let mut arena = Self::default();
        for (i, &r) in radii.as_slice().iter().enumerate() {
            session.execute(&format!("create sphere radius {}", r))?;
            let kernel_id = session.last_created(EntityKind::Volume)?;
            arena.volumes.push(LogicalVolume {
                index: i + 1,
                outer_radius: r,
                kernel_id,
            });
        }
        Ok(arena)
    }

    /// Carve every sphere into a shell by subtracting the next smaller one.
    ///
    /// Runs from the outermost pair inward and keeps the tool, so each step
    /// only touches two live volumes. The boolean result is renumbered back
    /// to the logical index right away.
    pub fn carve_shells(&mut self, session: &mut dyn CadSession) -> Result<(), CadError> {
        for i in (2..=self.volumes.len()).rev() {
            let tool = self.kernel_id(i - 1).clone();
            let target = self.kernel_id(i).clone();
            session.execute(&format!(
                "subtract volume {} from volume {} keep_tool",
                tool, target
            ))?;
            let result = session.last_created(EntityKind::Volume)?;
            session.execute(&format!("volume {} id {}", result, i))?;
            self.volumes[i - 1].kernel_id = KernelId::Resolved(i as u32);
        }
        Ok(())
    }

    /// Kernel id for logical `index` (1-based).
    ///
    /// # Panics
    /// If `index` is outside `1..=len`.
    pub fn kernel_id(&self, index: usize) -> &KernelId {
        &self.volumes[index - 1].kernel_id
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogicalVolume> {
        self.volumes.iter()
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }
}
