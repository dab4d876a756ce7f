//! Graph fixtures shared by unit tests

use crate::{
    chunk_graph::{Chunk, ChunkGraph, ChunkId},
    config::{ExtractConfig, ExtractOptions, VisitScope},
    module_graph::{Dependency, Module, ModuleGraph, ModuleId},
};

#[derive(Debug, Default)]
pub(crate) struct Fixture {
    pub(crate) modules: ModuleGraph,
    pub(crate) chunks: ChunkGraph,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Module at `/src/<name>` whose source is `/* <name> */`
    pub(crate) fn module(&mut self, name: &str) -> ModuleId {
        self.modules
            .add_module(Module::new(format!("/src/{name}"), format!("/* {name} */")))
    }

    pub(crate) fn depend(&mut self, from: ModuleId, to: ModuleId) {
        self.modules.add_dependency(from, Dependency::Direct(to));
    }

    pub(crate) fn chunk(&mut self, chunk: Chunk, modules: &[ModuleId]) -> ChunkId {
        let id = self.chunks.add_chunk(chunk);
        for &module in modules {
            self.chunks
                .add_module(id, module)
                .expect("fixture modules have a single owner");
        }
        id
    }

    pub(crate) fn entry(&mut self, name: &str, modules: &[ModuleId]) -> ChunkId {
        self.chunk(Chunk::entry(name), modules)
    }

    /// Resource names (without `/src/`) of the modules in a chunk
    pub(crate) fn names(&self, chunk: ChunkId) -> Vec<String> {
        self.chunks
            .get(chunk)
            .expect("chunk exists")
            .modules()
            .iter()
            .filter_map(|&m| self.modules.resource(m))
            .map(|r| r.trim_start_matches("/src/").to_owned())
            .collect()
    }
}

pub(crate) fn css_options(roots: &[&str]) -> ExtractOptions {
    ExtractOptions::from_config(ExtractConfig::new(r"\.css$", "[name].above.css", roots))
        .expect("valid options")
}

pub(crate) fn css_options_scoped(roots: &[&str], scope: VisitScope) -> ExtractOptions {
    let mut config = ExtractConfig::new(r"\.css$", "[name].above.css", roots);
    config.visit_scope = scope;
    ExtractOptions::from_config(config).expect("valid options")
}
