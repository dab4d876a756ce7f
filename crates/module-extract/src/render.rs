//! Rendering a chunk's modules into one text asset

use std::sync::Arc;

use anyhow::{Result, anyhow};

use crate::{chunk_graph::Chunk, module_graph::ModuleGraph};

/// Rendered text of an output asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSource(Arc<str>);

impl RawSource {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    pub fn source(&self) -> &str {
        &self.0
    }

    pub fn size(&self) -> usize {
        self.0.len()
    }
}

/// Turns a chunk into a single text asset
pub trait ChunkRenderer {
    fn render(&self, modules: &ModuleGraph, chunk: &Chunk) -> Result<RawSource>;
}

/// Concatenates module sources in chunk order, one module per block
#[derive(Debug, Clone)]
pub struct ConcatRenderer {
    separator: String,
}

impl Default for ConcatRenderer {
    fn default() -> Self {
        Self {
            separator: "\n".to_owned(),
        }
    }
}

impl ConcatRenderer {
    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl ChunkRenderer for ConcatRenderer {
    fn render(&self, modules: &ModuleGraph, chunk: &Chunk) -> Result<RawSource> {
        let parts = chunk
            .modules()
            .iter()
            .map(|&id| {
                modules.get(id).map(|module| module.source.as_str()).ok_or_else(|| {
                    anyhow!("{id} of chunk {} is not in the module graph", chunk.label())
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RawSource::new(parts.join(&self.separator)))
    }
}
