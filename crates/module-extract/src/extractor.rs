//! The extraction pass as one value owning all per-build state
//!
//! [`ModuleTextExtractor`] wires the scanner, splitter and emitter to the three
//! compilation hooks. Nothing is global: the registry and the list of derived
//! chunks live here and are dropped with the extractor.

use std::fmt;

use anyhow::Result;
use log::debug;

use crate::{
    chunk_graph::ChunkId,
    compilation::{AssetsComplete, AssetsDone, Compilation, CompilationHooks},
    config::{ExtractConfig, ExtractOptions},
    emitter::ArtifactEmitter,
    hashing::{HashDigest, ShaDigest},
    registry::ExtractionRegistry,
    render::{ChunkRenderer, ConcatRenderer},
    scanner::ReachabilityScanner,
    splitter::BundleSplitter,
};

pub struct ModuleTextExtractor {
    options: ExtractOptions,
    registry: ExtractionRegistry,
    derived: Vec<ChunkId>,
    renderer: Box<dyn ChunkRenderer>,
    hasher: Box<dyn HashDigest>,
}

impl fmt::Debug for ModuleTextExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleTextExtractor")
            .field("options", &self.options)
            .field("registry", &self.registry)
            .field("derived", &self.derived)
            .finish_non_exhaustive()
    }
}

impl ModuleTextExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        debug!("Initializing");
        let hasher = ShaDigest::new(options.hash_function);
        Self {
            options,
            registry: ExtractionRegistry::new(),
            derived: Vec::new(),
            renderer: Box::new(ConcatRenderer::default()),
            hasher: Box::new(hasher),
        }
    }

    pub fn from_config(config: ExtractConfig) -> Result<Self> {
        Ok(Self::new(ExtractOptions::from_config(config)?))
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: impl ChunkRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    #[must_use]
    pub fn with_hasher(mut self, hasher: impl HashDigest + 'static) -> Self {
        self.hasher = Box::new(hasher);
        self
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn registry(&self) -> &ExtractionRegistry {
        &self.registry
    }

    /// Derived chunks created so far, in creation order
    pub fn derived_chunks(&self) -> &[ChunkId] {
        &self.derived
    }

    /// Flag the modules to extract from `chunks`
    pub fn search_chunks(&mut self, compilation: &Compilation, chunks: &[ChunkId]) -> usize {
        ReachabilityScanner::new(&self.options).scan(
            &compilation.modules,
            &compilation.chunks,
            chunks,
            &mut self.registry,
        )
    }

    /// Split `chunks` (and whatever they produce) until nothing is left to split
    pub fn extract_modules_from_chunks(
        &mut self,
        compilation: &mut Compilation,
        chunks: &[ChunkId],
    ) -> Result<Vec<ChunkId>> {
        let produced = BundleSplitter::new(&compilation.modules, &self.registry)
            .split(&mut compilation.chunks, chunks)?;
        self.derived.extend(produced.iter().copied());
        Ok(produced)
    }

    /// Write every derived chunk to the asset set
    pub fn output_chunk_assets(&self, compilation: &mut Compilation) -> Result<Vec<String>> {
        ArtifactEmitter::new(&self.options.filename, &*self.renderer, &*self.hasher)
            .emit(compilation, &self.derived)
    }
}

impl CompilationHooks for ModuleTextExtractor {
    fn after_optimize_chunks(
        &mut self,
        compilation: &mut Compilation,
        chunks: &[ChunkId],
    ) -> Result<()> {
        let flagged = self.search_chunks(compilation, chunks);
        debug!("Flagged {flagged} modules for extraction");
        Ok(())
    }

    fn optimize_extracted_chunks(
        &mut self,
        compilation: &mut Compilation,
        chunks: &[ChunkId],
    ) -> Result<Vec<ChunkId>> {
        self.extract_modules_from_chunks(compilation, chunks)
    }

    fn additional_assets(
        &mut self,
        compilation: &mut Compilation,
        done: AssetsDone,
    ) -> Result<AssetsComplete> {
        self.output_chunk_assets(compilation)?;
        Ok(done.complete())
    }
}
