//! Compilation fixtures for the integration tests

#![allow(dead_code)]

use std::fmt::Write;

use module_extract::{
    Chunk, ChunkGraph, ChunkId, Compilation, Dependency, Module, ModuleGraph, ModuleId,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builds the module and chunk graphs of a compilation
#[derive(Debug, Default)]
pub struct Build {
    pub modules: ModuleGraph,
    pub chunks: ChunkGraph,
}

impl Build {
    pub fn new() -> Self {
        Self::default()
    }

    /// Module at `/app/<name>`; stylesheets get a one-rule body
    pub fn module(&mut self, name: &str) -> ModuleId {
        let source = if name.ends_with(".css") {
            format!(".{} {{ display: block; }}", name.trim_end_matches(".css"))
        } else {
            format!("require('./{name}');")
        };
        self.modules
            .add_module(Module::new(format!("/app/{name}"), source))
    }

    pub fn import(&mut self, from: ModuleId, to: ModuleId) {
        let request = self
            .modules
            .resource(to)
            .unwrap_or_default()
            .replace("/app/", "./");
        self.modules
            .add_dependency(from, Dependency::wrapped(request, Some(to)));
    }

    pub fn chunk(&mut self, chunk: Chunk, modules: &[ModuleId]) -> ChunkId {
        let id = self.chunks.add_chunk(chunk);
        for &module in modules {
            self.chunks.add_module(id, module).expect("single owner");
        }
        id
    }

    pub fn finish(self) -> Compilation {
        Compilation::new(self.modules, self.chunks)
    }
}

/// Short names of the modules held by a chunk
pub fn module_names(compilation: &Compilation, chunk: ChunkId) -> Vec<String> {
    compilation
        .chunks
        .get(chunk)
        .expect("chunk exists")
        .modules()
        .iter()
        .filter_map(|&m| compilation.modules.resource(m))
        .map(|r| r.trim_start_matches("/app/").to_owned())
        .collect()
}

/// Plain-text listing of chunks and assets, for snapshots
pub fn describe(compilation: &Compilation) -> String {
    let mut out = String::new();
    for id in compilation.chunks.ids() {
        let chunk = compilation.chunks.get(id).expect("chunk exists");
        let origin = chunk
            .origin
            .map(|o| format!(" <- {o}"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "chunk {id} {}{origin}: [{}] files=[{}]",
            chunk.label(),
            module_names(compilation, id).join(", "),
            chunk.files.join(", ")
        );
    }
    for (name, source) in compilation.assets() {
        let _ = writeln!(out, "asset {name}: {}", source.source().replace('\n', "\\n"));
    }
    out
}
