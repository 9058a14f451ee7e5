//! # Godiva Core
//!
//! Bookkeeping shared by every stage of the Godiva CSG-vs-DAGMC benchmark
//! sweep. Nothing in here talks to the CAD kernel or the transport engine;
//! it is the data those stages agree on.
//!
//! ## Modules
//!
//! - [`shells`]: Concentric shell radii and their analytic volumes.
//! - [`materials`]: Material catalog and the volume-to-material table.
//! - [`layout`]: A validated combination of the two, with per-material
//!   exact volumes and logical cells.
//! - [`artifact`]: Sweep parameter pairs, artifact naming and the sidecar
//!   manifest that replaces filename parsing.
//! - [`results`]: k-effective and volume result records.

pub mod artifact;
pub mod layout;
pub mod materials;
pub mod results;
pub mod shells;

pub use artifact::{ArtifactEntry, ArtifactError, Manifest, Pipeline, SweepPoint};
pub use layout::{LayoutError, ShellCell, ShellLayout};
pub use materials::{MaterialCatalog, VolumeAssignment};
pub use shells::ShellRadii;
