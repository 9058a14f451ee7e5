//! In-memory CAD kernel.
//!
//! Understands the subset of Cubit commands the generators issue and keeps
//! every volume as a spherical shell `(inner, outer)`. Booleans renumber
//! their result the way the real kernel does, so the generator's id
//! bookkeeping is exercised for real. Saves and exports write the model
//! snapshot as JSON to the requested path.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::kernel::{CadError, CadKernel, CadSession, EntityKind, KernelId};

/// A solid bounded by two concentric spheres; `inner == 0` is a full ball.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Solid {
    pub inner: f64,
    pub outer: f64,
}

impl Solid {
    pub fn volume(&self) -> f64 {
        4.0 / 3.0 * std::f64::consts::PI * (self.outer.powi(3) - self.inner.powi(3))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub name: Option<String>,
    pub material: Option<String>,
    pub volumes: BTreeSet<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimeshSettings {
    pub ratio: f64,
    pub angle: f64,
}

/// Complete kernel state of one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub volumes: BTreeMap<u32, Solid>,
    pub materials: BTreeSet<String>,
    pub blocks: BTreeMap<u32, Block>,
    pub merge_tolerance: Option<f64>,
    pub imprinted: bool,
    pub merged: bool,
    pub trimesh: Option<TrimeshSettings>,
    pub meshed: bool,
}

impl ModelSnapshot {
    /// Block holding `volume`, if any.
    pub fn block_of(&self, volume: u32) -> Option<(u32, &Block)> {
        self.blocks
            .iter()
            .find(|(_, b)| b.volumes.contains(&volume))
            .map(|(id, b)| (*id, b))
    }

    /// Material name of every volume that sits in a named-material block.
    pub fn volume_materials(&self) -> BTreeMap<u32, String> {
        self.volumes
            .keys()
            .filter_map(|v| {
                let (_, block) = self.block_of(*v)?;
                Some((*v, block.material.clone()?))
            })
            .collect()
    }

    pub fn read(path: &Path) -> Result<Self, CadError> {
        let content = std::fs::read_to_string(path).map_err(|source| CadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content)
            .map_err(|e| CadError::Kernel(format!("{}: {}", path.display(), e)))
    }

    fn write(&self, path: &Path) -> Result<(), CadError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CadError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CadError::Kernel(format!("snapshot serialisation: {}", e)))?;
        std::fs::write(path, json).map_err(|source| CadError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Kernel whose sessions live entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryKernel {
    fail_on: Option<String>,
    history: RefCell<Vec<String>>,
    closed: RefCell<Vec<ModelSnapshot>>,
}

impl InMemoryKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any command containing `pattern`.
    pub fn failing_on(pattern: impl Into<String>) -> Self {
        Self {
            fail_on: Some(pattern.into()),
            ..Self::default()
        }
    }

    /// Every command accepted so far, across sessions.
    pub fn history(&self) -> Vec<String> {
        self.history.borrow().clone()
    }

    /// Final state of every session closed so far.
    pub fn closed_sessions(&self) -> Vec<ModelSnapshot> {
        self.closed.borrow().clone()
    }
}

impl CadKernel for InMemoryKernel {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn is_simulated(&self) -> bool {
        true
    }

    fn open<'a>(&'a self, _label: &str) -> Result<Box<dyn CadSession + 'a>, CadError> {
        Ok(Box::new(MemorySession {
            kernel: self,
            model: ModelSnapshot::default(),
            next_volume: 1,
            last_volume: None,
            last_block: None,
        }))
    }
}

struct MemorySession<'a> {
    kernel: &'a InMemoryKernel,
    model: ModelSnapshot,
    next_volume: u32,
    last_volume: Option<u32>,
    last_block: Option<u32>,
}

/// Text between each pair of double quotes.
fn quoted(command: &str) -> Vec<&str> {
    command.split('"').skip(1).step_by(2).collect()
}

impl MemorySession<'_> {
    fn reject(command: &str, message: impl Into<String>) -> CadError {
        CadError::Command {
            command: command.to_string(),
            message: message.into(),
        }
    }

    fn number<T: std::str::FromStr>(command: &str, token: &str) -> Result<T, CadError> {
        token
            .parse()
            .map_err(|_| Self::reject(command, format!("'{}' is not a number", token)))
    }

    fn solid(&self, command: &str, id: u32) -> Result<Solid, CadError> {
        self.model
            .volumes
            .get(&id)
            .copied()
            .ok_or_else(|| Self::reject(command, format!("volume {} does not exist", id)))
    }

    fn path_arg<'c>(command: &'c str) -> Result<&'c Path, CadError> {
        quoted(command)
            .first()
            .map(|p| Path::new(*p))
            .ok_or_else(|| Self::reject(command, "expected a quoted path"))
    }

    fn subtract(&mut self, command: &str, tool: u32, target: u32, keep_tool: bool) -> Result<(), CadError> {
        let tool_solid = self.solid(command, tool)?;
        let target_solid = self.solid(command, target)?;
        if tool == target || target_solid.inner > 0.0 || tool_solid.outer >= target_solid.outer {
            return Err(Self::reject(command, "degenerate boolean"));
        }
        let result = self.next_volume;
        self.next_volume += 1;
        self.model.volumes.remove(&target);
        if !keep_tool {
            self.model.volumes.remove(&tool);
        }
        self.model.volumes.insert(
            result,
            Solid {
                inner: tool_solid.outer,
                outer: target_solid.outer,
            },
        );
        self.last_volume = Some(result);
        Ok(())
    }

    fn renumber(&mut self, command: &str, from: u32, to: u32) -> Result<(), CadError> {
        let solid = self.solid(command, from)?;
        if from != to && self.model.volumes.contains_key(&to) {
            return Err(Self::reject(command, format!("id {} is already in use", to)));
        }
        self.model.volumes.remove(&from);
        self.model.volumes.insert(to, solid);
        self.next_volume = self.next_volume.max(to + 1);
        if self.last_volume == Some(from) {
            self.last_volume = Some(to);
        }
        Ok(())
    }

    fn interpret(&mut self, command: &str) -> Result<(), CadError> {
        let lower = command.to_ascii_lowercase();
        let tokens: Vec<&str> = lower.split_whitespace().collect();
        let names = quoted(command);

        match tokens.as_slice() {
            ["reset"] => {
                self.model = ModelSnapshot::default();
                self.next_volume = 1;
                self.last_volume = None;
                self.last_block = None;
            }
            ["create", "sphere", "radius", r] => {
                let r: f64 = Self::number(command, r)?;
                if r <= 0.0 {
                    return Err(Self::reject(command, "radius must be positive"));
                }
                let id = self.next_volume;
                self.next_volume += 1;
                self.model.volumes.insert(id, Solid { inner: 0.0, outer: r });
                self.last_volume = Some(id);
            }
            ["subtract", "volume", tool, "from", "volume", target, rest @ ..] => {
                let tool = Self::number(command, tool)?;
                let target = Self::number(command, target)?;
                self.subtract(command, tool, target, rest.contains(&"keep_tool"))?;
            }
            ["volume", from, "id", to] => {
                let from = Self::number(command, from)?;
                let to = Self::number(command, to)?;
                self.renumber(command, from, to)?;
            }
            ["merge", "tolerance", t] => {
                self.model.merge_tolerance = Some(Self::number(command, t)?);
            }
            ["imprint", "volume", "all"] => self.model.imprinted = true,
            ["merge", "volume", "all"] => self.model.merged = true,
            ["create", "material", ..] => {
                let name = names
                    .first()
                    .ok_or_else(|| Self::reject(command, "material needs a quoted name"))?;
                self.model.materials.insert(name.to_string());
            }
            ["set", "duplicate", "block", "elements", "off"] => {}
            ["block", block, "add", "volume", volume] => {
                let block: u32 = Self::number(command, block)?;
                let volume: u32 = Self::number(command, volume)?;
                self.solid(command, volume)?;
                if let Some((other, _)) = self.model.block_of(volume) {
                    if other != block {
                        return Err(Self::reject(
                            command,
                            format!("volume {} already belongs to block {}", volume, other),
                        ));
                    }
                }
                self.model.blocks.entry(block).or_default().volumes.insert(volume);
                self.last_block = Some(block);
            }
            ["block", block, "name", ..] => {
                let block: u32 = Self::number(command, block)?;
                let name = names
                    .first()
                    .ok_or_else(|| Self::reject(command, "block name must be quoted"))?;
                let entry = self
                    .model
                    .blocks
                    .get_mut(&block)
                    .ok_or_else(|| Self::reject(command, format!("block {} is empty", block)))?;
                entry.name = Some(name.to_string());
            }
            ["block", block, "material", ..] => {
                let block: u32 = Self::number(command, block)?;
                let name = names
                    .first()
                    .ok_or_else(|| Self::reject(command, "material name must be quoted"))?;
                if !self.model.materials.contains(*name) {
                    return Err(Self::reject(command, format!("material '{}' does not exist", name)));
                }
                let entry = self
                    .model
                    .blocks
                    .get_mut(&block)
                    .ok_or_else(|| Self::reject(command, format!("block {} is empty", block)))?;
                entry.material = Some(name.to_string());
            }
            ["set", "trimesher", "coarse", "on", "ratio", ratio, "angle", angle] => {
                self.model.trimesh = Some(TrimeshSettings {
                    ratio: Self::number(command, ratio)?,
                    angle: Self::number(command, angle)?,
                });
            }
            ["surface", "all", "scheme", "trimesh"] => {}
            ["mesh", "surface", "all"] => {
                if self.model.volumes.is_empty() {
                    return Err(Self::reject(command, "nothing to mesh"));
                }
                if !(self.model.imprinted && self.model.merged) {
                    return Err(Self::reject(command, "surfaces are not imprinted and merged"));
                }
                self.model.meshed = true;
            }
            ["save", "cub5", ..] | ["export", "step", ..] => {
                self.model.write(Self::path_arg(command)?)?;
            }
            ["export", "cf_dagmc", ..] => {
                if !self.model.meshed {
                    return Err(Self::reject(command, "surfaces are not meshed"));
                }
                self.model.write(Self::path_arg(command)?)?;
            }
            _ => return Err(Self::reject(command, "unknown command")),
        }
        Ok(())
    }
}

impl CadSession for MemorySession<'_> {
    fn execute(&mut self, command: &str) -> Result<(), CadError> {
        if let Some(pattern) = &self.kernel.fail_on {
            if command.contains(pattern.as_str()) {
                return Err(Self::reject(command, "injected failure"));
            }
        }
        self.interpret(command)?;
        self.kernel.history.borrow_mut().push(command.to_string());
        Ok(())
    }

    fn last_created(&mut self, kind: EntityKind) -> Result<KernelId, CadError> {
        let id = match kind {
            EntityKind::Volume => self.last_volume,
            EntityKind::Block => self.last_block,
            EntityKind::Surface => None,
        };
        id.map(KernelId::Resolved).ok_or_else(|| {
            CadError::Kernel(format!("no {} has been created", kind.keyword()))
        })
    }

    fn close(self: Box<Self>) -> Result<(), CadError> {
        self.kernel.closed.borrow_mut().push(self.model);
        Ok(())
    }
}
