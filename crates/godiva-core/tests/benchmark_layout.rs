//! Exact-volume properties of the benchmark layout and the two-shell
//! reference case.

use approx::assert_relative_eq;
use godiva_core::{MaterialCatalog, ShellLayout, ShellRadii, VolumeAssignment};
use std::f64::consts::PI;

#[test]
fn test_per_material_sums_match_assigned_shells() {
    let layout = ShellLayout::godiva();
    let shells = layout.radii().shell_volumes();

    for (name, exact) in layout.material_volumes() {
        let id = layout.catalog().id_of(&name).unwrap();
        let expected: f64 = layout
            .assignment()
            .volumes_of(id)
            .iter()
            .map(|v| shells[v - 1])
            .sum();
        assert_relative_eq!(exact, expected, max_relative = 1e-12);
    }
}

#[test]
fn test_outermost_sphere_is_conserved() {
    let layout = ShellLayout::godiva();
    let total: f64 = layout.material_volumes().iter().map(|(_, v)| v).sum();
    let outer = 4.0 / 3.0 * PI * layout.radii().outer().powi(3);
    assert_relative_eq!(total, outer, max_relative = 1e-12);
}

#[test]
fn test_two_shell_end_to_end() {
    let layout = ShellLayout::new(
        ShellRadii::new(vec![1.0, 2.0]).unwrap(),
        MaterialCatalog::new([(1, "A"), (2, "Air")]),
        VolumeAssignment::new([(1, 1), (2, 2)]),
    )
    .unwrap();

    let shells = layout.radii().shell_volumes();
    assert_relative_eq!(shells[0], 4.0 * PI / 3.0, max_relative = 1e-12);
    assert_relative_eq!(shells[1], 28.0 * PI / 3.0, max_relative = 1e-12);

    let volumes = layout.material_volumes();
    assert_eq!(volumes[0].0, "A");
    assert_relative_eq!(volumes[0].1, 4.0 * PI / 3.0, max_relative = 1e-12);
    assert_eq!(volumes[1].0, "Air");
    assert_relative_eq!(volumes[1].1, 28.0 * PI / 3.0, max_relative = 1e-12);
}
