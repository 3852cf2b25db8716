use crate::graph::DependencyGraph;
use crate::segment::CodeSegment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One output unit: concatenated segment code plus chunk-level metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable id, globally unique across the whole run
    pub id: String,

    /// Concatenated segment code
    pub content: String,

    /// UTF-8 byte length of `content`
    pub size: usize,

    /// Top-level names the constituent segments declare
    pub exports: Vec<String>,

    /// Ids of chunks this chunk depends on. Never contains the chunk's
    /// own id, even when mutually dependent segments share the chunk.
    pub dependencies: Vec<String>,

    /// 0-based emission order within one strategy pass
    pub order: usize,
}

impl Chunk {
    /// Replace the content, recomputing the size. The permitted mutation
    /// for an external formatting step: id, exports, dependencies and
    /// order are untouched.
    pub fn rewrite_content(&mut self, content: String) {
        self.size = content.len();
        self.content = content;
    }
}

/// Materializes chunk groups into [`Chunk`]s.
///
/// Owns the monotonically increasing id counter. The counter persists
/// across calls within one run so that ids stay globally unique when
/// multiple inputs are processed sequentially; `reset` exists for test
/// isolation and deliberate reruns.
#[derive(Debug, Default)]
pub struct Materializer {
    next_id: usize,
}

impl Materializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the id counter to zero
    pub fn reset(&mut self) {
        self.next_id = 0;
    }

    fn allocate_id(&mut self) -> String {
        let id = format!("chunk_{:03}", self.next_id);
        self.next_id += 1;
        id
    }

    /// Materialize groups of segment indices into chunks.
    ///
    /// Two passes: the first allocates ids, joins content and collects
    /// exports; the second, once every segment's owning chunk is known,
    /// re-derives each chunk's dependency set in terms of other chunks.
    pub fn materialize(
        &mut self,
        groups: &[Vec<usize>],
        segments: &[CodeSegment],
        graph: &DependencyGraph,
    ) -> Vec<Chunk> {
        let mut chunks = Vec::with_capacity(groups.len());
        let mut chunk_of_segment = vec![usize::MAX; segments.len()];

        for (order, group) in groups.iter().enumerate() {
            for &index in group {
                chunk_of_segment[index] = order;
            }

            let content = group
                .iter()
                .map(|&i| segments[i].text.as_str())
                .collect::<Vec<_>>()
                .join("\n");

            let mut exports = Vec::new();
            for &index in group {
                for name in &segments[index].exports {
                    if !exports.contains(name) {
                        exports.push(name.clone());
                    }
                }
            }

            chunks.push(Chunk {
                id: self.allocate_id(),
                size: content.len(),
                content,
                exports,
                dependencies: Vec::new(),
                order,
            });
        }

        for (order, group) in groups.iter().enumerate() {
            let mut dep_ids: BTreeSet<String> = BTreeSet::new();
            for &index in group {
                for dep in graph.dependencies_of(index) {
                    let owner = chunk_of_segment[dep];
                    if owner != order && owner != usize::MAX {
                        dep_ids.insert(chunks[owner].id.clone());
                    }
                }
            }
            chunks[order].dependencies = dep_ids.into_iter().collect();
        }

        chunks
    }
}
