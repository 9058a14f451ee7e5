//! CAD kernel and session traits.
//!
//! A [`CadKernel`] hands out one [`CadSession`] per geometry build. The
//! session owns all kernel state for that build and is consumed by
//! [`CadSession::close`], so nothing leaks between sweep points.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by a CAD kernel or its session.
#[derive(Debug, Error)]
pub enum CadError {
    #[error("Kernel rejected '{command}': {message}")]
    Command { command: String, message: String },

    #[error("Kernel run failed: {0}")]
    Kernel(String),

    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Converter failed: {0}")]
    Converter(String),
}

/// Kinds of kernel entity whose ids can be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Volume,
    Surface,
    Block,
}

impl EntityKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            EntityKind::Volume => "volume",
            EntityKind::Surface => "surface",
            EntityKind::Block => "block",
        }
    }
}

/// A kernel-native entity id.
///
/// Kernels that run commands immediately return [`KernelId::Resolved`].
/// Journal-based kernels only learn ids at playback time and return a
/// [`KernelId::Deferred`] variable that the kernel fills in when it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelId {
    Resolved(u32),
    Deferred(String),
}

impl fmt::Display for KernelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelId::Resolved(id) => write!(f, "{}", id),
            KernelId::Deferred(var) => write!(f, "{{{}}}", var),
        }
    }
}

/// A single, exclusively owned CAD modelling session.
pub trait CadSession {
    /// Issue one kernel command.
    fn execute(&mut self, command: &str) -> Result<(), CadError>;

    /// Id of the most recently created entity of `kind`.
    fn last_created(&mut self, kind: EntityKind) -> Result<KernelId, CadError>;

    /// Finish the session, flushing any pending work to the kernel.
    fn close(self: Box<Self>) -> Result<(), CadError>;
}

/// Factory for CAD sessions.
pub trait CadKernel {
    /// Human-readable name of the kernel.
    fn name(&self) -> &str;

    /// Open a fresh session; `label` names any files the session keeps.
    fn open<'a>(&'a self, label: &str) -> Result<Box<dyn CadSession + 'a>, CadError>;

    /// True when exports are model snapshots rather than real geometry.
    fn is_simulated(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_id_rendering() {
        assert_eq!(KernelId::Resolved(7).to_string(), "7");
        assert_eq!(KernelId::Deferred("vol_3".into()).to_string(), "{vol_3}");
    }
}
