//! Material catalog and the volume-to-material assignment table.
//!
//! Material ids are small dense integers (1..=7 for the benchmark). Exactly
//! one of them is the background material filling the gaps between the
//! physical shells.

use std::collections::BTreeMap;

/// Name of the background material in the benchmark catalog.
pub const BACKGROUND_MATERIAL: &str = "Air";

/// Mapping from material id to material name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialCatalog {
    names: BTreeMap<u32, String>,
}

impl MaterialCatalog {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        Self {
            names: entries.into_iter().map(|(id, name)| (id, name.into())).collect(),
        }
    }

    /// Six physical shells plus the background.
    pub fn godiva() -> Self {
        Self::new([
            (1, "Shell_1"),
            (2, "Shell_2"),
            (3, "Shell_3"),
            (4, "Shell_4"),
            (5, "Shell_5"),
            (6, "Shell_6"),
            (7, BACKGROUND_MATERIAL),
        ])
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.names.iter().find(|(_, n)| n.as_str() == name).map(|(id, _)| *id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.names.contains_key(&id)
    }

    /// Entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.names.iter().map(|(id, name)| (*id, name.as_str()))
    }

    pub fn ids(&self) -> Vec<u32> {
        self.names.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Mapping from logical volume index (1 = innermost shell) to material id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeAssignment {
    materials: BTreeMap<usize, u32>,
}

impl VolumeAssignment {
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (usize, u32)>,
    {
        Self {
            materials: entries.into_iter().collect(),
        }
    }

    /// Physical shells on odd indices, background on even ones, with the two
    /// outermost shells both physical.
    pub fn godiva() -> Self {
        Self::new([
            (1, 1),
            (2, 7),
            (3, 2),
            (4, 7),
            (5, 3),
            (6, 7),
            (7, 4),
            (8, 7),
            (9, 5),
            (10, 6),
        ])
    }

    pub fn material_of(&self, volume: usize) -> Option<u32> {
        self.materials.get(&volume).copied()
    }

    /// Entries in ascending volume order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.materials.iter().map(|(v, m)| (*v, *m))
    }

    /// Volume indices assigned to `material`, ascending.
    pub fn volumes_of(&self, material: u32) -> Vec<usize> {
        self.materials
            .iter()
            .filter(|(_, m)| **m == material)
            .map(|(v, _)| *v)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_godiva_catalog_is_dense() {
        let catalog = MaterialCatalog::godiva();
        assert_eq!(catalog.ids(), (1..=7).collect::<Vec<_>>());
        assert_eq!(catalog.id_of(BACKGROUND_MATERIAL), Some(7));
        assert_eq!(catalog.name(3), Some("Shell_3"));
    }

    #[test]
    fn test_background_fills_even_gaps() {
        let assignment = VolumeAssignment::godiva();
        assert_eq!(assignment.volumes_of(7), vec![2, 4, 6, 8]);
        assert_eq!(assignment.material_of(10), Some(6));
        assert_eq!(assignment.material_of(11), None);
    }
}
