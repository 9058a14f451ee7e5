//! # Godiva Transport
//!
//! Everything between a shell layout and the Monte Carlo transport engine.
//!
//! - [`inputs`]: Reads the static `materials.xml` / `settings.xml`.
//! - [`model`]: Assembles CSG and DAGMC models into a single `model.xml`.
//! - [`engine`]: The [`TransportEngine`](engine::TransportEngine) trait and
//!   transient-file cleanup.
//! - [`openmc`]: Runs the `openmc` executable and parses its output.

pub mod engine;
pub mod inputs;
pub mod model;
pub mod openmc;

pub use engine::{clean_transient, EngineError, TransportEngine};
pub use inputs::{InputError, StaticInputs};
pub use model::{Model, ModelAssembler, ModelOptions};
pub use openmc::OpenMcExecutable;
