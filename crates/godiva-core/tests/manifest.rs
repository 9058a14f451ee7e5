//! Manifest persistence against a real directory.

use std::path::PathBuf;

use godiva_core::artifact::{parse_legacy_name, ArtifactEntry, Manifest, Pipeline, SweepPoint};

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("godiva-core-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_missing_manifest_is_empty() {
    let dir = scratch("missing");
    assert!(Manifest::load(&dir).unwrap().artifacts.is_empty());
    assert!(Manifest::available(&dir).unwrap().is_empty());
}

#[test]
fn test_available_skips_unexported_artifacts() {
    let dir = scratch("available");
    let present = SweepPoint::new(2.0, 100.0);
    let absent = SweepPoint::new(1.0, 100.0);
    std::fs::write(dir.join(present.mesh_file()), b"mesh").unwrap();

    Manifest::record(&dir, ArtifactEntry::new(present, Pipeline::Cubit)).unwrap();
    Manifest::record(&dir, ArtifactEntry::new(absent, Pipeline::Cubit)).unwrap();

    assert_eq!(Manifest::load(&dir).unwrap().artifacts.len(), 2);
    let available = Manifest::available(&dir).unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].point, present);
    assert!(!dir.join("manifest.json.tmp").exists());
}

#[test]
fn test_legacy_listing_skips_malformed_names() {
    let dir = scratch("legacy");
    std::fs::write(dir.join("geometry_angle_0.5_aniso_100.h5m"), b"").unwrap();
    std::fs::write(dir.join("geometry_angle_3_aniso_100.h5m"), b"").unwrap();
    std::fs::write(dir.join("geometry_broken.h5m"), b"").unwrap();
    std::fs::write(dir.join("notes.txt"), b"").unwrap();

    let (manifest, rejected) = Manifest::from_legacy_listing(&dir).unwrap();
    assert_eq!(manifest.artifacts.len(), 2);
    assert_eq!(manifest.artifacts[0].point, SweepPoint::new(0.5, 100.0));
    assert_eq!(manifest.artifacts[1].pipeline, Pipeline::Unknown);
    assert_eq!(rejected.len(), 1);
    assert!(parse_legacy_name("geometry_broken.h5m").is_err());
}
