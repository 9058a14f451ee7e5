//! CSG and DAGMC models assembled from the same static inputs.

use std::path::{Path, PathBuf};

use godiva_core::artifact::SweepPoint;
use godiva_core::ShellLayout;
use godiva_transport::inputs::InputError;
use godiva_transport::model::Geometry;
use godiva_transport::{ModelAssembler, ModelOptions, StaticInputs};

fn godiva_materials() -> String {
    let mut xml = String::from("<?xml version='1.0' encoding='utf-8'?>\n<materials>\n");
    for (id, name) in ShellLayout::godiva().catalog().iter() {
        xml.push_str(&format!(
            "  <material id=\"{}\" name=\"{}\">\n    <density value=\"1.0\" units=\"g/cm3\" />\n  </material>\n",
            id, name
        ));
    }
    xml.push_str("</materials>\n");
    xml
}

const SETTINGS: &str = "<?xml version='1.0' encoding='utf-8'?>
<settings>
  <run_mode>eigenvalue</run_mode>
  <particles>1000</particles>
  <batches>20</batches>
  <inactive>5</inactive>
  <volume_calc>
    <domain_type>cell</domain_type>
    <domain_ids>1</domain_ids>
    <samples>10</samples>
  </volume_calc>
</settings>
";

fn xml_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("godiva-model-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("materials.xml"), godiva_materials()).unwrap();
    std::fs::write(dir.join("settings.xml"), SETTINGS).unwrap();
    dir
}

#[test]
fn test_csg_model_has_one_cell_per_shell() {
    let dir = xml_dir("csg");
    let layout = ShellLayout::godiva();
    let inputs = StaticInputs::load(&dir).unwrap();
    inputs.check_catalog(layout.catalog()).unwrap();

    let model = ModelAssembler::new(&layout, &inputs, ModelOptions::default()).csg();
    assert_eq!(model.cell_count(), Some(10));

    let geometry = model.geometry_xml();
    assert_eq!(geometry.matches("<surface").count(), 10);
    assert_eq!(geometry.matches("boundary=\"vacuum\"").count(), 1);
    assert!(geometry.contains("coeffs=\"0.0 0.0 0.0 8.7499\" boundary=\"vacuum\""));
    assert!(geometry.contains("<cell id=\"1\" name=\"Shell_1\" material=\"1\" region=\"-1\""));
    assert!(geometry.contains("<cell id=\"2\" name=\"Air\" material=\"7\" region=\"1 -2\""));

    let plots = model.plots_xml();
    assert!(plots.contains("filename=\"plots/material_csg\""));
    assert!(plots.contains("filename=\"plots/cell_csg\""));
    assert!(plots.contains("<pixels>5000 5000</pixels>"));
}

#[test]
fn test_cad_model_wraps_artifact_in_vacuum_sphere() {
    let dir = xml_dir("cad");
    let layout = ShellLayout::godiva();
    let inputs = StaticInputs::load(&dir).unwrap();
    let assembler = ModelAssembler::new(&layout, &inputs, ModelOptions::default());

    let point = SweepPoint::new(2.0, 100.0);
    let cad = assembler.cad(point);
    match &cad.geometry {
        Geometry::Dagmc { filename, outer_radius } => {
            assert_eq!(filename, Path::new("h5m/geometry_angle_2_aniso_100.h5m"));
            assert_eq!(*outer_radius, 8.7499);
        }
        other => panic!("expected DAGMC geometry, got {:?}", other),
    }
    let geometry = cad.geometry_xml();
    assert!(geometry.contains("filename=\"h5m/geometry_angle_2_aniso_100.h5m\" auto_geom_ids=\"true\""));
    assert!(cad.plots_xml().contains("plots/cell_angle_2_aniso_100"));

    // Same materials and bounding volume as the CSG twin.
    let csg = assembler.csg();
    assert_eq!(cad.volume_calc, csg.volume_calc);
    assert_eq!(cad.volume_calc.material_ids, (1..=7).collect::<Vec<_>>());
}

#[test]
fn test_settings_volume_calc_is_replaced() {
    let dir = xml_dir("settings");
    let layout = ShellLayout::godiva();
    let inputs = StaticInputs::load(&dir).unwrap();
    let options = ModelOptions {
        volume_samples: 1234,
        ..ModelOptions::default()
    };
    let model = ModelAssembler::new(&layout, &inputs, options).csg();

    let settings = model.settings_xml();
    assert_eq!(settings.matches("<volume_calc>").count(), 1);
    assert!(!settings.contains("<domain_type>cell</domain_type>"));
    assert!(settings.contains("<samples>1234</samples>"));
    assert!(settings.contains("<domain_ids>1 2 3 4 5 6 7</domain_ids>"));
    assert!(settings.contains("<lower_left>-8.7499 -8.7499 -8.7499</lower_left>"));
    assert!(settings.trim_end().ends_with("</settings>"));
}

#[test]
fn test_self_closing_settings_still_get_volume_calc() {
    let dir = xml_dir("empty-settings");
    std::fs::write(dir.join("settings.xml"), "<?xml version='1.0'?>\n<settings/>\n").unwrap();
    let layout = ShellLayout::godiva();
    let inputs = StaticInputs::load(&dir).unwrap();
    let model = ModelAssembler::new(&layout, &inputs, ModelOptions::default()).csg();

    let settings = model.settings_xml();
    assert!(settings.starts_with("<settings>"));
    assert_eq!(settings.matches("<volume_calc>").count(), 1);
    assert!(settings.contains("<samples>10000000</samples>"));
    assert!(settings.ends_with("</settings>"));
}

#[test]
fn test_export_writes_single_model_file() {
    let dir = xml_dir("export");
    let layout = ShellLayout::godiva();
    let inputs = StaticInputs::load(&dir).unwrap();
    let model = ModelAssembler::new(&layout, &inputs, ModelOptions::default()).csg();

    let out = dir.join("work");
    std::fs::create_dir_all(&out).unwrap();
    let path = model.export(&out).unwrap();
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.starts_with("<?xml"));
    assert_eq!(text.matches("<?xml").count(), 1);
    for element in ["<model>", "<materials>", "<geometry>", "<settings>", "<plots>", "</model>"] {
        assert!(text.contains(element), "missing {}", element);
    }
}

#[test]
fn test_missing_materials_is_fatal() {
    let dir = xml_dir("missing");
    std::fs::remove_file(dir.join("materials.xml")).unwrap();
    assert!(matches!(StaticInputs::load(&dir), Err(InputError::Io { .. })));
}
