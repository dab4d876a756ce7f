//! Chunks (output bundles) and their structural links
//!
//! The ChunkGraph owns every chunk of a compilation, original and derived, and
//! tracks which chunk currently owns each module. A module belongs to at most
//! one chunk at a time; moving it between chunks goes through
//! [`ChunkGraph::move_module`].

use std::{fmt, hash::BuildHasherDefault};

use anyhow::{Result, anyhow, bail};
use indexmap::{IndexMap, IndexSet};
use log::trace;
use rustc_hash::FxHasher;

use crate::module_graph::ModuleId;

/// Type alias for FxHasher-based IndexSet
pub type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

/// Type alias for FxHasher-based IndexMap
pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Unique identifier for a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(u32);

impl ChunkId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named group of modules emitted together
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    /// Chunk name, absent for anonymous (usually async) chunks
    pub name: Option<String>,
    /// Whether the chunk is loaded on page start (entry chunk)
    pub initial: bool,
    /// Chunks loaded from this one
    pub children: FxIndexSet<ChunkId>,
    /// Chunks this one is loaded from
    pub parents: FxIndexSet<ChunkId>,
    /// Names of the entry points served by this chunk
    pub entrypoints: IndexSet<String>,
    /// Set once the chunk took part in a split, as source or as result
    pub processed: bool,
    /// Set once a derived chunk was written to the asset set
    pub emitted: bool,
    /// Output files produced for this chunk
    pub files: Vec<String>,
    /// Chunk whose structure this chunk mirrors
    pub origin: Option<ChunkId>,
    modules: FxIndexSet<ModuleId>,
}

impl Chunk {
    /// An anonymous, non-initial chunk
    pub fn new() -> Self {
        Self::default()
    }

    /// A named entry chunk serving the entry point of the same name
    pub fn entry(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut entrypoints = IndexSet::new();
        entrypoints.insert(name.clone());
        Self {
            name: Some(name),
            initial: true,
            entrypoints,
            ..Self::default()
        }
    }

    /// A non-initial chunk, optionally named
    pub fn async_chunk(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_owned),
            ..Self::default()
        }
    }

    /// Snapshot of `origin`'s name and links, without any modules.
    ///
    /// The link sets are copied, so later edits on either side stay local.
    pub fn derived_from(origin_id: ChunkId, origin: &Self) -> Self {
        Self {
            name: origin.name.clone(),
            initial: origin.initial,
            children: origin.children.clone(),
            parents: origin.parents.clone(),
            entrypoints: origin.entrypoints.clone(),
            origin: Some(origin_id),
            ..Self::default()
        }
    }

    pub fn is_initial(&self) -> bool {
        self.initial
    }

    pub fn modules(&self) -> &FxIndexSet<ModuleId> {
        &self.modules
    }

    pub fn has_module(&self, module: ModuleId) -> bool {
        self.modules.contains(&module)
    }

    /// Label for log lines
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

/// Arena of chunks plus the module ownership index
#[derive(Debug, Clone, Default)]
pub struct ChunkGraph {
    chunks: Vec<Chunk>,
    owners: FxIndexMap<ModuleId, ChunkId>,
}

impl ChunkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chunk. Modules must be attached with [`ChunkGraph::add_module`].
    pub fn add_chunk(&mut self, mut chunk: Chunk) -> ChunkId {
        let id = ChunkId::new(self.chunks.len() as u32);
        chunk.modules.clear();
        trace!("Registered chunk {id} ({})", chunk.label());
        self.chunks.push(chunk);
        id
    }

    pub fn get(&self, id: ChunkId) -> Option<&Chunk> {
        self.chunks.get(id.index())
    }

    pub fn get_mut(&mut self, id: ChunkId) -> Option<&mut Chunk> {
        self.chunks.get_mut(id.index())
    }

    fn chunk_mut(&mut self, id: ChunkId) -> Result<&mut Chunk> {
        self.chunks
            .get_mut(id.index())
            .ok_or_else(|| anyhow!("Chunk {id} not found in chunk graph"))
    }

    /// All chunk ids in creation order
    pub fn ids(&self) -> impl Iterator<Item = ChunkId> + '_ {
        (0..self.chunks.len() as u32).map(ChunkId::new)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The chunk whose structure `id` mirrors (itself for original chunks)
    pub fn origin_of(&self, id: ChunkId) -> ChunkId {
        self.get(id).and_then(|c| c.origin).unwrap_or(id)
    }

    /// Chunk currently owning `module`
    pub fn owner(&self, module: ModuleId) -> Option<ChunkId> {
        self.owners.get(&module).copied()
    }

    /// Attach a module to a chunk.
    ///
    /// Returns `false` if the chunk already holds it, and fails if another chunk
    /// owns it.
    pub fn add_module(&mut self, chunk: ChunkId, module: ModuleId) -> Result<bool> {
        match self.owner(module) {
            Some(owner) if owner == chunk => return Ok(false),
            Some(owner) => {
                bail!("{module} already belongs to chunk {owner}, cannot add to {chunk}")
            }
            None => {}
        }
        self.chunk_mut(chunk)?.modules.insert(module);
        self.owners.insert(module, chunk);
        Ok(true)
    }

    /// Detach a module from a chunk, returns whether it was there
    pub fn remove_module(&mut self, chunk: ChunkId, module: ModuleId) -> bool {
        let Some(target) = self.chunks.get_mut(chunk.index()) else {
            return false;
        };
        if !target.modules.shift_remove(&module) {
            return false;
        }
        self.owners.swap_remove(&module);
        true
    }

    /// Move a module from one chunk to another
    pub fn move_module(&mut self, from: ChunkId, to: ChunkId, module: ModuleId) -> Result<()> {
        if !self.remove_module(from, module) {
            bail!("{module} is not part of chunk {from}");
        }
        self.add_module(to, module)?;
        Ok(())
    }

    /// Record `child` as loaded from `chunk` (one direction only)
    pub fn add_child(&mut self, chunk: ChunkId, child: ChunkId) -> Result<bool> {
        Ok(self.chunk_mut(chunk)?.children.insert(child))
    }

    /// Record `parent` as loading `chunk` (one direction only)
    pub fn add_parent(&mut self, chunk: ChunkId, parent: ChunkId) -> Result<bool> {
        Ok(self.chunk_mut(chunk)?.parents.insert(parent))
    }

    /// Link both directions between a parent and a child chunk
    pub fn connect(&mut self, parent: ChunkId, child: ChunkId) -> Result<()> {
        self.add_child(parent, child)?;
        self.add_parent(child, parent)?;
        Ok(())
    }
}
