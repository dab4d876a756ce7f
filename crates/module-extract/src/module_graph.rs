//! Read-only view of the host's module dependency graph
//!
//! Modules live in an arena addressed by [`ModuleId`]. Dependency edges keep
//! the host's ordering and come in two shapes: a direct reference to a module,
//! or a wrapper (the host's dependency object) that may or may not resolve to a
//! module. Either shape is unwrapped with [`Dependency::module`].

use std::fmt;

use log::trace;

/// Unique identifier for a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u32);

impl ModuleId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value of the ModuleId
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module#{}", self.0)
    }
}

/// A dependency edge as the host hands it over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// Points straight at a module
    Direct(ModuleId),
    /// Host dependency object exposing an optional `module`
    Wrapped {
        /// Request string that produced the dependency (e.g. `./styles.css`)
        request: String,
        /// Resolved module, absent when the dependency was elided or broken
        module: Option<ModuleId>,
    },
}

impl Dependency {
    pub fn wrapped(request: impl Into<String>, module: Option<ModuleId>) -> Self {
        Self::Wrapped {
            request: request.into(),
            module,
        }
    }

    /// Unwrap the edge to the module it refers to, if any
    pub fn module(&self) -> Option<ModuleId> {
        match self {
            Self::Direct(id) => Some(*id),
            Self::Wrapped { module, .. } => *module,
        }
    }
}

/// A module as seen by the extraction passes
#[derive(Debug, Clone, Default)]
pub struct Module {
    /// Stable resource identifier (usually an absolute path plus query)
    pub resource: Option<String>,
    /// Ordered dependency edges
    pub dependencies: Vec<Dependency>,
    /// Module this one was cloned from when it is a rehosted copy
    pub original: Option<ModuleId>,
    /// Text produced upstream by the loader pipeline
    pub source: String,
}

impl Module {
    pub fn new(resource: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            resource: Some(resource.into()),
            source: source.into(),
            ..Self::default()
        }
    }
}

/// Arena of all modules of one compilation
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    modules: Vec<Module>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module and return its id
    pub fn add_module(&mut self, module: Module) -> ModuleId {
        let id = ModuleId::new(self.modules.len() as u32);
        trace!("Registered {id} ({:?})", module.resource);
        self.modules.push(module);
        id
    }

    /// Register a rehosted copy of `original` that shares its resource
    pub fn add_rehosted(&mut self, original: ModuleId, source: impl Into<String>) -> ModuleId {
        let resource = self.resource(original).map(str::to_owned);
        self.add_module(Module {
            resource,
            original: Some(original),
            source: source.into(),
            ..Module::default()
        })
    }

    /// Append a dependency edge to `from`, keeping insertion order
    pub fn add_dependency(&mut self, from: ModuleId, dependency: Dependency) {
        if let Some(module) = self.modules.get_mut(from.index()) {
            module.dependencies.push(dependency);
        }
    }

    pub fn get(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id.index())
    }

    /// Resolve a dependency edge to a module that exists in this graph
    pub fn resolve(&self, dependency: &Dependency) -> Option<ModuleId> {
        dependency.module().filter(|id| id.index() < self.modules.len())
    }

    pub fn resource(&self, id: ModuleId) -> Option<&str> {
        self.get(id).and_then(|m| m.resource.as_deref())
    }

    /// Resource used when matching a module against extraction entries.
    ///
    /// A rehosted copy is matched through the module it was cloned from.
    pub fn matching_resource(&self, id: ModuleId) -> Option<&str> {
        let module = self.get(id)?;
        match module.original {
            Some(original) => self.resource(original),
            None => module.resource.as_deref(),
        }
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_dependency_unwraps_to_module() {
        let mut graph = ModuleGraph::new();
        let css = graph.add_module(Module::new("/src/a.css", ".a{}"));

        assert_eq!(Dependency::Direct(css).module(), Some(css));
        assert_eq!(Dependency::wrapped("./a.css", Some(css)).module(), Some(css));
        assert_eq!(Dependency::wrapped("./gone.css", None).module(), None);
    }

    #[test]
    fn test_resolve_rejects_ids_outside_graph() {
        let graph = ModuleGraph::new();
        assert_eq!(graph.resolve(&Dependency::Direct(ModuleId::new(7))), None);
    }

    #[test]
    fn test_rehosted_copy_matches_through_original() {
        let mut graph = ModuleGraph::new();
        let original = graph.add_module(Module::new("/src/b.css", ".b{}"));
        let copy = graph.add_rehosted(original, ".b{color:red}");

        assert_ne!(original, copy);
        assert_eq!(graph.matching_resource(copy), Some("/src/b.css"));
        assert_eq!(
            graph.get(copy).map(|m| m.source.as_str()),
            Some(".b{color:red}")
        );
    }

    #[test]
    fn test_dependencies_keep_insertion_order() {
        let mut graph = ModuleGraph::new();
        let entry = graph.add_module(Module::new("/src/entry.js", ""));
        let first = graph.add_module(Module::new("/src/first.css", ""));
        let second = graph.add_module(Module::new("/src/second.css", ""));
        graph.add_dependency(entry, Dependency::Direct(first));
        graph.add_dependency(entry, Dependency::wrapped("./second.css", Some(second)));

        let deps: Vec<_> = graph
            .get(entry)
            .expect("entry exists")
            .dependencies
            .iter()
            .map(Dependency::module)
            .collect();
        assert_eq!(deps, vec![Some(first), Some(second)]);
    }
}
