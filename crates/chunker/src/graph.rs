use crate::segment::CodeSegment;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::BTreeSet;

/// Directed dependency graph over segments.
///
/// Node weights are segment indices; an edge `a -> b` means segment `a`
/// depends on a name segment `b` exports. Self-edges are never created,
/// even for self-recursive segments. Dependency names no segment exports
/// are external/global references and produce no edge.
pub struct DependencyGraph {
    graph: DiGraph<usize, ()>,
    nodes: Vec<NodeIndex>,
}

impl DependencyGraph {
    /// Build the graph by resolving each dependency name to the first
    /// segment (list order) that exports it.
    pub fn build(segments: &[CodeSegment]) -> Self {
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..segments.len()).map(|i| graph.add_node(i)).collect();

        for (i, segment) in segments.iter().enumerate() {
            for name in &segment.dependencies {
                let Some(j) = segments.iter().position(|s| s.exports_name(name)) else {
                    continue;
                };
                if j != i {
                    graph.update_edge(nodes[i], nodes[j], ());
                }
            }
        }

        Self { graph, nodes }
    }

    /// Segment indices the given segment depends on, sorted
    pub fn dependencies_of(&self, index: usize) -> Vec<usize> {
        let mut deps: Vec<usize> = self
            .graph
            .neighbors(self.nodes[index])
            .map(|n| self.graph[n])
            .collect();
        deps.sort_unstable();
        deps.dedup();
        deps
    }

    /// Strongly connected components, each a non-empty list of segment
    /// indices in source order. Components are ordered by their smallest
    /// member, so acyclic inputs come back in source order. Every cycle
    /// is fully contained in exactly one component.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut components: Vec<Vec<usize>> = tarjan_scc(&self.graph)
            .into_iter()
            .map(|scc| {
                let mut members: Vec<usize> = scc.into_iter().map(|n| self.graph[n]).collect();
                members.sort_unstable();
                members
            })
            .collect();
        components.sort_by_key(|members| members[0]);
        components
    }

    /// Strongly connected components ordered so that every component
    /// comes after the components it depends on. Ties are broken by the
    /// smallest member index, so independent components keep source
    /// order; a dependency may move earlier than its dependents, which
    /// is the one reordering the pipeline permits.
    pub fn components_in_dependency_order(&self) -> Vec<Vec<usize>> {
        let components = self.components();
        let count = components.len();

        // Map each segment to its component
        let mut component_of = vec![0usize; self.nodes.len()];
        for (c, members) in components.iter().enumerate() {
            for &index in members {
                component_of[index] = c;
            }
        }

        // Condensation: distinct inter-component dependency edges
        let mut dep_sets: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); count];
        for edge in self.graph.edge_indices() {
            let (from, to) = self.graph.edge_endpoints(edge).expect("edge exists");
            let (cf, ct) = (component_of[self.graph[from]], component_of[self.graph[to]]);
            if cf != ct {
                dep_sets[cf].insert(ct);
            }
        }

        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut pending: Vec<usize> = vec![0; count];
        for (c, deps) in dep_sets.iter().enumerate() {
            pending[c] = deps.len();
            for &d in deps {
                dependents[d].push(c);
            }
        }

        // Kahn's algorithm, always taking the ready component whose first
        // member is earliest in the source.
        let mut ready: BTreeSet<(usize, usize)> = (0..count)
            .filter(|&c| pending[c] == 0)
            .map(|c| (components[c][0], c))
            .collect();

        let mut ordered = Vec::with_capacity(count);
        while let Some(&(key, c)) = ready.iter().next() {
            ready.remove(&(key, c));
            ordered.push(components[c].clone());
            for &dep in &dependents[c] {
                pending[dep] -= 1;
                if pending[dep] == 0 {
                    ready.insert((components[dep][0], dep));
                }
            }
        }

        debug_assert_eq!(ordered.len(), count);
        ordered
    }
}
