//! Writing derived chunks to the output asset set
//!
//! The content hash is computed over the rendered text, so rendering always
//! happens before the output path is resolved.

use anyhow::{Context, Result};
use log::debug;

use crate::{
    chunk_graph::ChunkId,
    compilation::Compilation,
    hashing::{HashDigest, has_content_hash, interpolate_content_hash},
    render::ChunkRenderer,
};

#[derive(Clone, Copy)]
pub struct ArtifactEmitter<'a> {
    filename: &'a str,
    renderer: &'a dyn ChunkRenderer,
    hasher: &'a dyn HashDigest,
}

impl std::fmt::Debug for ArtifactEmitter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactEmitter")
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}

impl<'a> ArtifactEmitter<'a> {
    pub fn new(
        filename: &'a str,
        renderer: &'a dyn ChunkRenderer,
        hasher: &'a dyn HashDigest,
    ) -> Self {
        Self {
            filename,
            renderer,
            hasher,
        }
    }

    /// Emit every derived chunk that has not been emitted yet.
    ///
    /// Returns the paths registered by this call.
    pub fn emit(&self, compilation: &mut Compilation, derived: &[ChunkId]) -> Result<Vec<String>> {
        let mut written = Vec::new();

        for &chunk_id in derived {
            let chunk = compilation
                .chunks
                .get(chunk_id)
                .with_context(|| format!("Derived chunk {chunk_id} not found"))?;
            if chunk.emitted {
                continue;
            }
            let origin_id = compilation.chunks.origin_of(chunk_id);
            debug!("Outputting {} chunk assets", chunk.label());

            let source = self.renderer.render(&compilation.modules, chunk)?;
            let mut path = compilation.get_path(self.filename, origin_id)?;
            if has_content_hash(&path) {
                path = interpolate_content_hash(&path, source.source(), self.hasher)?;
            }

            if compilation.emit_asset(path.clone(), source).is_some() {
                debug!("Asset {path} was already registered and has been replaced");
            }
            if let Some(origin) = compilation.chunks.get_mut(origin_id)
                && !origin.files.contains(&path)
            {
                origin.files.push(path.clone());
            }
            if let Some(chunk) = compilation.chunks.get_mut(chunk_id) {
                chunk.emitted = true;
            }
            debug!("Done outputting {path}");
            written.push(path);
        }

        Ok(written)
    }
}
