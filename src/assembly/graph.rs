use crate::types::{ParentEdge, PersonId};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// Parent -> child adjacency keyed by person id.
pub struct KinshipGraph {
    graph: DiGraph<PersonId, ()>,
    node_map: HashMap<PersonId, NodeIndex>,
}

impl KinshipGraph {
    pub fn from_parent_edges(edges: &[ParentEdge]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map: HashMap<PersonId, NodeIndex> = HashMap::new();
        let mut seen = HashSet::new();

        for edge in edges {
            if !seen.insert(*edge) {
                continue;
            }
            let parent = *node_map
                .entry(edge.parent_id)
                .or_insert_with(|| graph.add_node(edge.parent_id));
            let child = *node_map
                .entry(edge.child_id)
                .or_insert_with(|| graph.add_node(edge.child_id));
            graph.add_edge(parent, child, ());
        }

        Self { graph, node_map }
    }

    /// Get the number of persons that appear in any parent edge
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of distinct parent edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &PersonId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Direct parents, in the order their edges were recorded.
    pub fn parents_of(&self, id: &PersonId) -> Vec<PersonId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Direct children, in the order their edges were recorded.
    pub fn children_of(&self, id: &PersonId) -> Vec<PersonId> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: &PersonId, direction: Direction) -> Vec<PersonId> {
        let Some(&index) = self.node_map.get(id) else {
            return Vec::new();
        };

        // petgraph yields the most recently added edge first
        let mut ids: Vec<PersonId> = self
            .graph
            .neighbors_directed(index, direction)
            .filter_map(|n| self.graph.node_weight(n).copied())
            .collect();
        ids.reverse();
        ids
    }

    /// True when some person is recorded as their own ancestor.
    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }
}
