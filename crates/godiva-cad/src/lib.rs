//! # Godiva CAD
//!
//! Builds the layered Godiva sphere in an external CAD kernel and exports it
//! as a DAGMC mesh artifact.
//!
//! The kernel itself is never reimplemented here. [`kernel::CadKernel`]
//! opens an explicitly owned [`kernel::CadSession`] per geometry build;
//! the generators only issue commands through it.
//!
//! ## Available kernels
//!
//! | Kernel | Module | Notes |
//! |--------|--------|-------|
//! | Cubit (batch journal) | [`cubit`] | Production path |
//! | In-memory | [`memory`] | Tracks shells as radius intervals; tests and dry runs |
//!
//! ## Generators
//!
//! - [`generator::ShellGenerator`]: boolean shells, trimesh, `cf_dagmc` export.
//! - [`step::StepPipeline`]: STEP export plus an external STEP-to-DAGMC converter.

pub mod arena;
pub mod cubit;
pub mod generator;
pub mod kernel;
pub mod memory;
pub mod step;

pub use generator::{GenerateError, OutputDirs, ShellGenerator};
pub use kernel::{CadError, CadKernel, CadSession, EntityKind, KernelId};
