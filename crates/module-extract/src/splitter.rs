//! Chunk splitting
//!
//! A chunk with pending registry entries is split into itself and a derived
//! chunk. The derived chunk mirrors the origin chunk's name and links (a
//! snapshot, not shared sets) and receives every module whose resource is
//! flagged. Modules are moved, never copied.

use anyhow::{Context, Result};
use log::debug;

use crate::{
    chunk_graph::{Chunk, ChunkGraph, ChunkId},
    gate::{Admission, RecursionGate},
    module_graph::{ModuleGraph, ModuleId},
    registry::ExtractionRegistry,
};

#[derive(Debug)]
pub struct BundleSplitter<'a> {
    modules: &'a ModuleGraph,
    registry: &'a ExtractionRegistry,
    gate: RecursionGate,
}

impl<'a> BundleSplitter<'a> {
    pub fn new(modules: &'a ModuleGraph, registry: &'a ExtractionRegistry) -> Self {
        Self {
            modules,
            registry,
            gate: RecursionGate::new(),
        }
    }

    /// Split `chunk_ids` and every chunk re-signalled on the way.
    ///
    /// Returns the derived chunks in creation order.
    pub fn split(
        &mut self,
        chunks: &mut ChunkGraph,
        chunk_ids: &[ChunkId],
    ) -> Result<Vec<ChunkId>> {
        let mut derived = Vec::new();
        self.gate.signal(chunk_ids.iter().copied());

        while let Some(chunk_id) = self.gate.next_pending() {
            match RecursionGate::admit(chunks, self.registry, chunk_id) {
                Admission::Split(name) => {
                    let new_chunk = self.split_chunk(chunks, chunk_id, &name)?;
                    derived.push(new_chunk);
                    self.gate.signal([new_chunk]);
                }
                reason => {
                    let label = chunks.get(chunk_id).map_or("<unknown>", Chunk::label);
                    debug!(
                        "Skipping optimization for {label} chunk ({reason:?}). No modules to \
                         extract or they have been already extracted."
                    );
                }
            }
        }

        Ok(derived)
    }

    /// Number of split attempts so far, skipped ones included
    pub fn attempts(&self) -> usize {
        self.gate.attempts()
    }

    fn split_chunk(
        &self,
        chunks: &mut ChunkGraph,
        chunk_id: ChunkId,
        name: &str,
    ) -> Result<ChunkId> {
        let origin_id = chunks.origin_of(chunk_id);
        let origin = chunks
            .get(origin_id)
            .with_context(|| format!("Origin chunk {origin_id} of chunk {chunk_id} not found"))?;
        debug!("Extracting modules from {} chunk", origin.label());

        let snapshot = Chunk::derived_from(origin_id, origin);
        let entry_name = snapshot.name.clone().unwrap_or_else(|| name.to_owned());
        let derived_id = chunks.add_chunk(snapshot);

        // Collect first, move afterwards: the module set must not change under the scan
        let to_move = self.matching_modules(chunks, chunk_id, &entry_name);
        for &module in &to_move {
            chunks.move_module(chunk_id, derived_id, module)?;
            debug!(
                "Extracted module {} from {entry_name} chunk.",
                self.modules.matching_resource(module).unwrap_or_default()
            );
        }

        RecursionGate::close(chunks, chunk_id, derived_id);
        debug!("Done extracting modules from {entry_name} chunk.");
        Ok(derived_id)
    }

    fn matching_modules(
        &self,
        chunks: &ChunkGraph,
        chunk_id: ChunkId,
        entry_name: &str,
    ) -> Vec<ModuleId> {
        let Some(chunk) = chunks.get(chunk_id) else {
            return Vec::new();
        };
        chunk
            .modules()
            .iter()
            .copied()
            .filter(|&module| {
                self.modules
                    .matching_resource(module)
                    .is_some_and(|resource| self.registry.contains(entry_name, resource))
            })
            .collect()
    }
}
