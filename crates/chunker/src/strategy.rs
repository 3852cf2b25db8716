use crate::config::{ChunkStrategy, ChunkerConfig};
use crate::graph::DependencyGraph;
use crate::segment::CodeSegment;

/// Byte size of a group once materialized: segment sizes plus one newline
/// joiner per additional segment.
fn joined_size(group: &[usize], segments: &[CodeSegment]) -> usize {
    let bytes: usize = group.iter().map(|&i| segments[i].size).sum();
    bytes + group.len().saturating_sub(1)
}

/// Applies the configured packing policy, turning segments plus their
/// dependency graph into ordered groups of segment indices. Each inner
/// vector is one future chunk's worth of segments, in emission order.
pub struct StrategyEngine {
    config: ChunkerConfig,
}

impl StrategyEngine {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Partition segments into chunk groups under the byte budget
    pub fn apply(&self, segments: &[CodeSegment], graph: &DependencyGraph) -> Vec<Vec<usize>> {
        let groups = match self.config.strategy {
            ChunkStrategy::Aggressive => self.apply_aggressive(segments),
            ChunkStrategy::Conservative => self.apply_conservative(segments, graph),
            ChunkStrategy::Auto => self.apply_auto(segments, graph),
        };

        match self.config.min_chunk_size {
            Some(min) if min > 0 => self.coalesce_undersized(groups, segments, min),
            _ => groups,
        }
    }

    /// Greedy source-order byte packing, dependencies ignored
    fn apply_aggressive(&self, segments: &[CodeSegment]) -> Vec<Vec<usize>> {
        let indices: Vec<usize> = (0..segments.len()).collect();
        self.pack_by_size(&indices, segments)
    }

    /// Pack the given segment indices, in the given order, into groups no
    /// larger than the budget. Accounting includes the newline joiners the
    /// materializer inserts between segments. An indivisible oversized
    /// segment is still placed alone: the budget is a target, not a hard
    /// ceiling.
    fn pack_by_size(&self, indices: &[usize], segments: &[CodeSegment]) -> Vec<Vec<usize>> {
        let max = self.config.max_chunk_size;
        let mut groups = Vec::new();
        let mut current: Vec<usize> = Vec::new();
        let mut current_size = 0usize;

        for &index in indices {
            let size = segments[index].size;
            if !current.is_empty() && current_size + 1 + size > max {
                groups.push(std::mem::take(&mut current));
                current_size = 0;
            }
            if size > max {
                log::debug!(
                    "segment {index} ({size} bytes) exceeds the {max}-byte budget; emitting alone"
                );
            }
            if !current.is_empty() {
                current_size += 1;
            }
            current.push(index);
            current_size += size;
        }

        if !current.is_empty() {
            groups.push(current);
        }
        groups
    }

    /// Pack whole strongly-connected components greedily in dependency
    /// order. An SCC is never split unless it alone exceeds the budget,
    /// in which case it is internally byte-packed and emitted before
    /// packing resumes.
    fn apply_auto(&self, segments: &[CodeSegment], graph: &DependencyGraph) -> Vec<Vec<usize>> {
        let max = self.config.max_chunk_size;
        let mut groups = Vec::new();
        let mut current: Vec<usize> = Vec::new();
        let mut current_size = 0usize;

        for component in graph.components_in_dependency_order() {
            let component_size = joined_size(&component, segments);

            if component_size > max {
                log::debug!(
                    "cycle of {} segments ({component_size} bytes) exceeds the {max}-byte budget",
                    component.len()
                );
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                    current_size = 0;
                }
                groups.extend(self.pack_by_size(&component, segments));
                continue;
            }

            if !current.is_empty() && current_size + 1 + component_size > max {
                groups.push(std::mem::take(&mut current));
                current_size = 0;
            }
            if !current.is_empty() {
                current_size += 1;
            }
            current.extend(component);
            current_size += component_size;
        }

        if !current.is_empty() {
            groups.push(current);
        }
        groups
    }

    /// Treat each SCC as atomic and merge every transitively
    /// dependency-connected cluster into a single group when the whole
    /// cluster fits the budget. A cluster that does not fit keeps its
    /// original SCC-sized pieces; an SCC that alone exceeds the budget
    /// falls back to byte packing within itself.
    fn apply_conservative(
        &self,
        segments: &[CodeSegment],
        graph: &DependencyGraph,
    ) -> Vec<Vec<usize>> {
        let max = self.config.max_chunk_size;
        let components = graph.components();

        let mut component_of = vec![0usize; segments.len()];
        for (c, members) in components.iter().enumerate() {
            for &index in members {
                component_of[index] = c;
            }
        }

        // Undirected adjacency between components: a dependency edge in
        // either direction makes two components mergeable.
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); components.len()];
        for i in 0..segments.len() {
            for j in graph.dependencies_of(i) {
                let (ci, cj) = (component_of[i], component_of[j]);
                if ci != cj {
                    adjacency[ci].push(cj);
                    adjacency[cj].push(ci);
                }
            }
        }

        let mut visited = vec![false; components.len()];
        let mut groups = Vec::new();

        for start in 0..components.len() {
            if visited[start] {
                continue;
            }

            // Collect the whole connected cluster
            let mut cluster = Vec::new();
            let mut stack = vec![start];
            visited[start] = true;
            while let Some(c) = stack.pop() {
                cluster.push(c);
                for &next in &adjacency[c] {
                    if !visited[next] {
                        visited[next] = true;
                        stack.push(next);
                    }
                }
            }

            let mut members: Vec<usize> = cluster
                .iter()
                .flat_map(|&c| components[c].iter().copied())
                .collect();
            members.sort_unstable();

            if joined_size(&members, segments) <= max {
                groups.push(members);
                continue;
            }

            // Merge would exceed budget: keep SCC-sized pieces
            let mut pieces: Vec<usize> = cluster;
            pieces.sort_by_key(|&c| components[c][0]);
            for c in pieces {
                let members = &components[c];
                if joined_size(members, segments) > max {
                    groups.extend(self.pack_by_size(members, segments));
                } else {
                    groups.push(members.clone());
                }
            }
        }

        groups.sort_by_key(|members| members[0]);
        groups
    }

    /// Best-effort coalescing of undersized groups into their successor,
    /// bounded by the byte budget. A trailing undersized group that
    /// cannot merge further is emitted as-is.
    fn coalesce_undersized(
        &self,
        groups: Vec<Vec<usize>>,
        segments: &[CodeSegment],
        min: usize,
    ) -> Vec<Vec<usize>> {
        let max = self.config.max_chunk_size;
        let mut out: Vec<Vec<usize>> = Vec::with_capacity(groups.len());
        let mut carry: Vec<usize> = Vec::new();

        for group in groups {
            if !carry.is_empty() {
                if joined_size(&carry, segments) + 1 + joined_size(&group, segments) <= max {
                    let mut merged = std::mem::take(&mut carry);
                    merged.extend(group);
                    if joined_size(&merged, segments) < min {
                        carry = merged;
                    } else {
                        out.push(merged);
                    }
                    continue;
                }
                // Merging would exceed the budget: the undersized group
                // stays as it is.
                out.push(std::mem::take(&mut carry));
            }

            if joined_size(&group, segments) < min {
                carry = group;
            } else {
                out.push(group);
            }
        }

        // A trailing undersized group that cannot merge further is still
        // emitted; the minimum is best-effort.
        if !carry.is_empty() {
            out.push(carry);
        }
        out
    }
}
