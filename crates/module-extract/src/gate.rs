//! Idempotency and re-entry control for chunk splitting
//!
//! Splitting a chunk re-signals the split phase for the derived chunk it
//! produced. Instead of recursing, the signal lands in a FIFO work queue that
//! is drained until it is empty. Termination follows from the processed flag:
//! the source, its origin and the derived chunk are flagged as soon as a split
//! happens, and a chunk is not admitted when it or its origin is flagged. An
//! origin is therefore split at most once, however many chunks mirror it.

use std::collections::VecDeque;

use log::trace;

use crate::{
    chunk_graph::{ChunkGraph, ChunkId},
    registry::ExtractionRegistry,
};

/// Outcome of asking the gate whether a chunk may be split
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Split the chunk; carries the registry key to consult
    Split(String),
    /// Already took part in a split
    AlreadyProcessed,
    /// No registry entry, or an empty one
    NothingToExtract,
    /// Unknown or unnamed chunk
    Unknown,
}

#[derive(Debug, Default)]
pub struct RecursionGate {
    queue: VecDeque<ChunkId>,
    attempts: usize,
}

impl RecursionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue chunks for a split attempt
    pub fn signal(&mut self, chunks: impl IntoIterator<Item = ChunkId>) {
        self.queue.extend(chunks);
    }

    /// Next chunk to attempt, in signal order
    pub fn next_pending(&mut self) -> Option<ChunkId> {
        let next = self.queue.pop_front();
        if next.is_some() {
            self.attempts += 1;
        }
        next
    }

    /// Number of split attempts handed out so far, including skipped ones
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn admit(chunks: &ChunkGraph, registry: &ExtractionRegistry, id: ChunkId) -> Admission {
        let Some(name) = chunks.get(id).and_then(|c| c.name.as_deref()) else {
            return Admission::Unknown;
        };
        let processed = |chunk_id: ChunkId| chunks.get(chunk_id).is_some_and(|c| c.processed);
        if processed(id) || processed(chunks.origin_of(id)) {
            return Admission::AlreadyProcessed;
        }
        if !registry.has_pending(name) {
            return Admission::NothingToExtract;
        }
        Admission::Split(name.to_owned())
    }

    /// Flag both sides of a split, and the origin they mirror, so none is
    /// split again
    pub fn close(chunks: &mut ChunkGraph, source: ChunkId, derived: ChunkId) {
        let origin = chunks.origin_of(source);
        for id in [source, origin, derived] {
            if let Some(chunk) = chunks.get_mut(id) {
                chunk.processed = true;
            }
        }
        trace!("Closed chunks {source} and {derived} for further splitting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk_graph::Chunk;

    #[test]
    fn test_admission_reasons() {
        let mut chunks = ChunkGraph::new();
        let main = chunks.add_chunk(Chunk::entry("main"));
        let other = chunks.add_chunk(Chunk::entry("other"));
        let anon = chunks.add_chunk(Chunk::new());
        let mut registry = ExtractionRegistry::new();
        registry.flag("main", "/b.css");
        registry.ensure_entry("other");

        assert_eq!(
            RecursionGate::admit(&chunks, &registry, main),
            Admission::Split("main".to_owned())
        );
        assert_eq!(
            RecursionGate::admit(&chunks, &registry, other),
            Admission::NothingToExtract
        );
        assert_eq!(RecursionGate::admit(&chunks, &registry, anon), Admission::Unknown);
        assert_eq!(
            RecursionGate::admit(&chunks, &registry, ChunkId::new(42)),
            Admission::Unknown
        );

        let derived = chunks.add_chunk(Chunk::derived_from(main, &Chunk::entry("main")));
        RecursionGate::close(&mut chunks, main, derived);
        assert_eq!(
            RecursionGate::admit(&chunks, &registry, main),
            Admission::AlreadyProcessed
        );
        assert_eq!(
            RecursionGate::admit(&chunks, &registry, derived),
            Admission::AlreadyProcessed
        );
    }

    #[test]
    fn test_mirrors_of_a_split_origin_are_refused() {
        let mut chunks = ChunkGraph::new();
        let main = chunks.add_chunk(Chunk::entry("main"));
        let mut mirror = Chunk::entry("main");
        mirror.origin = Some(main);
        let mirror = chunks.add_chunk(mirror);
        let mut registry = ExtractionRegistry::new();
        registry.flag("main", "/b.css");

        let derived = chunks.add_chunk(Chunk::derived_from(main, &Chunk::entry("main")));
        RecursionGate::close(&mut chunks, mirror, derived);

        assert!(chunks.get(main).expect("main").processed);
        assert_eq!(
            RecursionGate::admit(&chunks, &registry, main),
            Admission::AlreadyProcessed
        );
        assert_eq!(
            RecursionGate::admit(&chunks, &registry, mirror),
            Admission::AlreadyProcessed
        );
    }

    #[test]
    fn test_queue_is_fifo_and_counts_attempts() {
        let mut gate = RecursionGate::new();
        gate.signal([ChunkId::new(1), ChunkId::new(2)]);
        assert_eq!(gate.next_pending(), Some(ChunkId::new(1)));
        gate.signal([ChunkId::new(3)]);
        assert_eq!(gate.next_pending(), Some(ChunkId::new(2)));
        assert_eq!(gate.next_pending(), Some(ChunkId::new(3)));
        assert_eq!(gate.next_pending(), None);
        assert_eq!(gate.attempts(), 3);
    }
}
