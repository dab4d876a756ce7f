//! Moves predicate-matched modules out of build chunks into derived chunks
//!
//! Starting from configured root modules in every named entry chunk, the
//! reachability scan flags dependencies whose resource matches a pattern
//! (typically stylesheets). Each chunk with flagged modules is then split: a
//! derived chunk mirroring the chunk's links receives the flagged modules, and
//! is finally rendered to a text asset named from a hash-aware template.

pub mod chunk_graph;
pub mod compilation;
pub mod config;
pub mod emitter;
pub mod extractor;
pub mod gate;
pub mod hashing;
pub mod module_graph;
pub mod registry;
pub mod render;
pub mod scanner;
pub mod splitter;

#[cfg(test)]
mod test_support;

pub use chunk_graph::{Chunk, ChunkGraph, ChunkId};
pub use compilation::{Compilation, CompilationHooks};
pub use config::{ExtractConfig, ExtractOptions, VisitScope};
pub use extractor::ModuleTextExtractor;
pub use module_graph::{Dependency, Module, ModuleGraph, ModuleId};
