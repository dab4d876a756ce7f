//! Reachability scan over the module graph
//!
//! For every named initial chunk, each module matching one of the configured
//! roots starts a depth-first walk over dependency edges. Every reached module
//! whose resource matches the extraction pattern is flagged in the
//! [`ExtractionRegistry`] under the chunk's name.
//!
//! The walk uses an explicit stack but visits modules in the same pre-order a
//! recursive walk would.

use log::{debug, trace};
use rustc_hash::FxHashSet;

use crate::{
    chunk_graph::{ChunkGraph, ChunkId},
    config::{ExtractOptions, VisitScope},
    module_graph::{ModuleGraph, ModuleId},
    registry::ExtractionRegistry,
};

/// One scan pass over a set of chunks
#[derive(Debug)]
pub struct ReachabilityScanner<'a> {
    options: &'a ExtractOptions,
    visited: FxHashSet<String>,
}

impl<'a> ReachabilityScanner<'a> {
    pub fn new(options: &'a ExtractOptions) -> Self {
        Self {
            options,
            visited: FxHashSet::default(),
        }
    }

    /// Scan `chunk_ids` and record flagged resources in `registry`.
    ///
    /// Returns the number of resources newly flagged.
    pub fn scan(
        &mut self,
        modules: &ModuleGraph,
        chunks: &ChunkGraph,
        chunk_ids: &[ChunkId],
        registry: &mut ExtractionRegistry,
    ) -> usize {
        let mut flagged = 0;

        for &chunk_id in chunk_ids {
            let Some(chunk) = chunks.get(chunk_id) else {
                continue;
            };
            // Only named entry chunks are handled, same as the text extractor upstream
            let Some(chunk_name) = chunk.name.as_deref().filter(|_| chunk.is_initial()) else {
                continue;
            };
            if chunk.processed {
                debug!("Skipping search in {chunk_name} chunk, it was already split");
                continue;
            }
            if self.options.visit_scope == VisitScope::PerChunk {
                self.visited.clear();
            }

            debug!("Starting search for modules in {chunk_name} chunk");
            for &module_id in chunk.modules() {
                let is_root = modules
                    .resource(module_id)
                    .is_some_and(|resource| self.options.is_root(resource));
                if is_root {
                    registry.ensure_entry(chunk_name);
                    flagged += self.traverse(modules, module_id, chunk_name, registry);
                }
            }
            debug!("Done search for modules in {chunk_name} chunk");
        }

        flagged
    }

    fn traverse(
        &mut self,
        modules: &ModuleGraph,
        root: ModuleId,
        chunk_name: &str,
        registry: &mut ExtractionRegistry,
    ) -> usize {
        let mut flagged = 0;
        let mut stack = vec![Some(root)];

        while let Some(next) = stack.pop() {
            let Some((module_id, module)) = next.and_then(|id| modules.get(id).map(|m| (id, m)))
            else {
                trace!("Module not found, stopping traversal for chunk {chunk_name}");
                continue;
            };

            let key = module
                .resource
                .clone()
                .unwrap_or_else(|| module_id.to_string());
            if self.visited.contains(&key) || registry.contains(chunk_name, &key) {
                continue;
            }
            self.visited.insert(key);

            if let Some(resource) = module.resource.as_deref()
                && self.options.should_extract(resource)
            {
                debug!("Flagging module {resource} for extraction in {chunk_name} chunk");
                if registry.flag(chunk_name, resource) {
                    flagged += 1;
                }
            }

            stack.extend(module.dependencies.iter().rev().map(|dep| modules.resolve(dep)));
        }

        flagged
    }

    /// Whether a resource was inspected during this pass
    pub fn was_visited(&self, resource: &str) -> bool {
        self.visited.contains(resource)
    }
}
