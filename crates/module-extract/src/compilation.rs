//! Host side of the extraction passes
//!
//! [`Compilation`] stands in for the build tool: it owns the module and chunk
//! graphs, the output asset set and the path template resolver, and drives
//! the three hook phases in their fixed order through [`Compilation::seal`].

use std::{collections::VecDeque, fmt};

use anyhow::{Context, Result};
use log::debug;

use crate::{
    chunk_graph::{Chunk, ChunkGraph, ChunkId, FxIndexMap},
    module_graph::ModuleGraph,
    render::RawSource,
};

/// Context a path template is resolved against
#[derive(Debug, Clone, Copy)]
pub struct PathData<'a> {
    pub chunk_id: ChunkId,
    pub chunk: &'a Chunk,
}

/// Resolves output path templates such as `[name].above.css`
pub trait PathResolver {
    fn resolve(&self, template: &str, data: &PathData<'_>) -> Result<String>;
}

/// Replaces `[name]` (the chunk id for unnamed chunks) and `[id]`.
///
/// Other tokens, `[contenthash]` included, are left for later stages.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplatePathResolver;

impl PathResolver for TemplatePathResolver {
    fn resolve(&self, template: &str, data: &PathData<'_>) -> Result<String> {
        let id = data.chunk_id.to_string();
        let name = data.chunk.name.as_deref().unwrap_or(&id);
        Ok(template.replace("[name]", name).replace("[id]", &id))
    }
}

/// Single-use completion callback of the additional-assets phase
#[derive(Debug)]
#[must_use = "the additional-assets phase only completes once the callback is consumed"]
pub struct AssetsDone(());

impl AssetsDone {
    /// Signal that every asset of this hook has been registered
    pub fn complete(self) -> AssetsComplete {
        AssetsComplete(())
    }
}

/// Proof that [`AssetsDone::complete`] was called
#[derive(Debug)]
pub struct AssetsComplete(());

/// Extension points of a compilation, called in declaration order
pub trait CompilationHooks {
    /// Chunk membership is settled
    fn after_optimize_chunks(
        &mut self,
        _compilation: &mut Compilation,
        _chunks: &[ChunkId],
    ) -> Result<()> {
        Ok(())
    }

    /// Chunks may be restructured. Returned chunks are signalled again, as a
    /// new batch, to every hook.
    fn optimize_extracted_chunks(
        &mut self,
        _compilation: &mut Compilation,
        _chunks: &[ChunkId],
    ) -> Result<Vec<ChunkId>> {
        Ok(Vec::new())
    }

    /// Final assets may be added; `done` must be consumed exactly once
    fn additional_assets(
        &mut self,
        _compilation: &mut Compilation,
        done: AssetsDone,
    ) -> Result<AssetsComplete> {
        Ok(done.complete())
    }
}

pub struct Compilation {
    pub modules: ModuleGraph,
    pub chunks: ChunkGraph,
    assets: FxIndexMap<String, RawSource>,
    path_resolver: Box<dyn PathResolver>,
}

impl fmt::Debug for Compilation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compilation")
            .field("modules", &self.modules.len())
            .field("chunks", &self.chunks.len())
            .field("assets", &self.assets.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Compilation {
    pub fn new(modules: ModuleGraph, chunks: ChunkGraph) -> Self {
        Self {
            modules,
            chunks,
            assets: FxIndexMap::default(),
            path_resolver: Box::new(TemplatePathResolver),
        }
    }

    #[must_use]
    pub fn with_path_resolver(mut self, resolver: impl PathResolver + 'static) -> Self {
        self.path_resolver = Box::new(resolver);
        self
    }

    /// Resolve a path template against a chunk
    pub fn get_path(&self, template: &str, chunk_id: ChunkId) -> Result<String> {
        let chunk = self
            .chunks
            .get(chunk_id)
            .with_context(|| format!("Chunk {chunk_id} not found while resolving {template}"))?;
        self.path_resolver
            .resolve(template, &PathData { chunk_id, chunk })
    }

    /// Register an output asset, returning the one it replaced
    pub fn emit_asset(&mut self, name: impl Into<String>, source: RawSource) -> Option<RawSource> {
        self.assets.insert(name.into(), source)
    }

    pub fn asset(&self, name: &str) -> Option<&RawSource> {
        self.assets.get(name)
    }

    pub fn assets(&self) -> &FxIndexMap<String, RawSource> {
        &self.assets
    }

    /// Run the chunk hooks in order: after-optimize-chunks, then
    /// optimize-extracted-chunks until no hook produces new chunks, then
    /// additional-assets.
    pub fn seal(&mut self, hooks: &mut [&mut dyn CompilationHooks]) -> Result<()> {
        let chunk_ids: Vec<ChunkId> = self.chunks.ids().collect();

        debug!("after-optimize-chunks over {} chunks", chunk_ids.len());
        for hook in hooks.iter_mut() {
            hook.after_optimize_chunks(self, &chunk_ids)?;
        }

        let mut batches = VecDeque::from([chunk_ids]);
        while let Some(batch) = batches.pop_front() {
            debug!("optimize-extracted-chunks over {batch:?}");
            for hook in hooks.iter_mut() {
                let produced = hook.optimize_extracted_chunks(self, &batch)?;
                if !produced.is_empty() {
                    batches.push_back(produced);
                }
            }
        }

        debug!("additional-assets");
        for hook in hooks.iter_mut() {
            let AssetsComplete(()) = hook.additional_assets(self, AssetsDone(()))?;
        }
        Ok(())
    }
}
