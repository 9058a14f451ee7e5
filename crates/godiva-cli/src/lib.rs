//! Drivers shared by the `godiva-sweep` and `godiva-mesh` binaries.

pub mod config;
pub mod runner;
