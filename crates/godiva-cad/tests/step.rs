//! STEP export plus external converter, with shell commands standing in
//! for the converter.

use std::path::PathBuf;

use godiva_cad::memory::InMemoryKernel;
use godiva_cad::step::{ConverterCommand, StepPipeline};
use godiva_cad::{CadError, CadKernel, CadSession, GenerateError, OutputDirs};
use godiva_core::artifact::{Manifest, Pipeline, SweepPoint};
use godiva_core::ShellLayout;

/// In-memory kernel that reports its exports as real geometry.
struct SnapshotKernel(InMemoryKernel);

impl CadKernel for SnapshotKernel {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn open<'a>(&'a self, label: &str) -> Result<Box<dyn CadSession + 'a>, CadError> {
        self.0.open(label)
    }
}

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("godiva-step-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Copies the STEP file to the mesh path and records the tags beside it.
fn copying_converter() -> ConverterCommand {
    ConverterCommand {
        program: "sh".into(),
        args: vec![
            "-c".into(),
            r#"cp "$0" "$1" && printf %s "$2" > "$1.tags""#.into(),
            "{step}".into(),
            "{h5m}".into(),
            "{tags}".into(),
        ],
    }
}

#[test]
fn test_step_export_is_converted_and_registered() {
    let root = scratch("convert");
    let layout = ShellLayout::godiva();
    let kernel = SnapshotKernel(InMemoryKernel::new());
    let pipeline = StepPipeline::new(&layout, OutputDirs::under(&root), copying_converter());
    let point = SweepPoint::new(3.0, 100.0);

    let entry = pipeline.generate(&kernel, point).unwrap();
    assert_eq!(entry.pipeline, Pipeline::Step);
    assert!(kernel.0.history().iter().any(|c| c.starts_with("export step")));

    let step = std::fs::read(root.join("c2omc").join(point.step_file())).unwrap();
    let mesh_path = root.join("h5m").join(point.mesh_file());
    assert_eq!(std::fs::read(&mesh_path).unwrap(), step);

    let tags = std::fs::read_to_string(root.join("h5m").join(format!("{}.tags", point.mesh_file()))).unwrap();
    assert_eq!(tags, pipeline.sequential_tags().join(","));
    assert!(tags.starts_with("Shell_1,Air,"));

    let available = Manifest::available(&root.join("h5m")).unwrap();
    assert_eq!(available, vec![entry]);
}

#[test]
fn test_simulated_kernel_registers_dry_run() {
    let root = scratch("simulated");
    let layout = ShellLayout::godiva();
    let pipeline = StepPipeline::new(&layout, OutputDirs::under(&root), copying_converter());

    let entry = pipeline
        .generate(&InMemoryKernel::new(), SweepPoint::new(1.0, 100.0))
        .unwrap();
    assert_eq!(entry.pipeline, Pipeline::DryRun);
}

#[test]
fn test_converter_failure_discards_mesh_and_keeps_manifest() {
    let root = scratch("fail");
    let layout = ShellLayout::godiva();
    let kernel = SnapshotKernel(InMemoryKernel::new());
    let point = SweepPoint::new(2.0, 100.0);

    StepPipeline::new(&layout, OutputDirs::under(&root), copying_converter())
        .generate(&kernel, point)
        .unwrap();
    let before = Manifest::load(&root.join("h5m")).unwrap();

    let failing = ConverterCommand {
        program: "false".into(),
        args: vec!["{step}".into(), "{h5m}".into()],
    };
    let err = StepPipeline::new(&layout, OutputDirs::under(&root), failing)
        .generate(&kernel, point)
        .unwrap_err();
    assert!(matches!(
        err,
        GenerateError::Cad { source: CadError::Converter(_), .. }
    ));

    assert!(!root.join("h5m").join(point.mesh_file()).exists());
    assert_eq!(Manifest::load(&root.join("h5m")).unwrap(), before);
    assert!(Manifest::available(&root.join("h5m")).unwrap().is_empty());
}
