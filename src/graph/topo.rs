//! Mesh removal order.

use std::collections::{BTreeMap, VecDeque};

use thiserror::Error;

use super::MeshGraph;
use crate::scene::MeshId;

/// Meshes in an order where every blocker precedes what it blocks.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Topology {
    pub order: Vec<MeshId>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// Meshes that block each other. Holds one path around the cycle.
    #[error("meshes block each other: {}", format_cycle(.cycle))]
    Cycle { cycle: Vec<MeshId> },
}

fn format_cycle(cycle: &[MeshId]) -> String {
    if cycle.is_empty() {
        return "cycle".to_owned();
    }
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl Topology {
    #[must_use]
    pub fn empty() -> Self {
        Self { order: Vec::new() }
    }

    /// Kahn's algorithm; ties resolve by ascending mesh id.
    pub fn sort(graph: &MeshGraph) -> Result<Self, TopologyError> {
        if graph.node_count() == 0 {
            return Ok(Self::empty());
        }

        let mut indegree: BTreeMap<MeshId, usize> = BTreeMap::new();
        let mut adjacency: BTreeMap<MeshId, Vec<MeshId>> = BTreeMap::new();

        for node in graph.nodes() {
            indegree.entry(node.id).or_insert(0);
            adjacency.entry(node.id).or_default();
        }

        // Edges come out sorted, so every neighbour list is sorted too.
        for edge in graph.edges() {
            adjacency.entry(edge.blocker).or_default().push(edge.blocked);
            *indegree.entry(edge.blocked).or_insert(0) += 1;
        }

        let mut queue: VecDeque<MeshId> = indegree
            .iter()
            .filter_map(|(mesh, &count)| (count == 0).then_some(*mesh))
            .collect();
        let mut order = Vec::with_capacity(graph.node_count());

        while let Some(mesh) = queue.pop_front() {
            order.push(mesh);
            if let Some(neighbours) = adjacency.get(&mesh) {
                for neighbour in neighbours {
                    if let Some(count) = indegree.get_mut(neighbour) {
                        *count -= 1;
                        if *count == 0 {
                            queue.push_back(*neighbour);
                        }
                    }
                }
            }
        }

        if order.len() == graph.node_count() {
            return Ok(Self { order });
        }

        let cycle = find_cycle(&adjacency).unwrap_or_default();
        log::error!("mesh blocking graph has a cycle through {} meshes", cycle.len().saturating_sub(1));
        Err(TopologyError::Cycle { cycle })
    }

    /// Position of `mesh` in the removal order.
    #[must_use]
    pub fn rank(&self, mesh: MeshId) -> Option<usize> {
        self.order.iter().position(|&m| m == mesh)
    }
}

fn find_cycle(adjacency: &BTreeMap<MeshId, Vec<MeshId>>) -> Option<Vec<MeshId>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum VisitState {
        Unvisited,
        Visiting,
        Visited,
    }

    fn dfs(
        mesh: MeshId,
        adjacency: &BTreeMap<MeshId, Vec<MeshId>>,
        state: &mut BTreeMap<MeshId, VisitState>,
        stack: &mut Vec<MeshId>,
    ) -> Option<Vec<MeshId>> {
        state.insert(mesh, VisitState::Visiting);
        stack.push(mesh);

        if let Some(neighbours) = adjacency.get(&mesh) {
            for neighbour in neighbours {
                match state
                    .get(neighbour)
                    .copied()
                    .unwrap_or(VisitState::Unvisited)
                {
                    VisitState::Unvisited => {
                        if let Some(cycle) = dfs(*neighbour, adjacency, state, stack) {
                            return Some(cycle);
                        }
                    }
                    VisitState::Visiting => {
                        if let Some(position) = stack.iter().position(|&m| m == *neighbour) {
                            let mut cycle = stack[position..].to_vec();
                            cycle.push(*neighbour);
                            return Some(cycle);
                        }
                    }
                    VisitState::Visited => {}
                }
            }
        }

        stack.pop();
        state.insert(mesh, VisitState::Visited);
        None
    }

    let mut state: BTreeMap<MeshId, VisitState> = BTreeMap::new();
    for mesh in adjacency.keys() {
        if state.get(mesh).copied().unwrap_or(VisitState::Unvisited) == VisitState::Unvisited {
            let mut stack = Vec::new();
            if let Some(cycle) = dfs(*mesh, adjacency, &mut state, &mut stack) {
                return Some(cycle);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::{Topology, TopologyError};
    use crate::graph::MeshGraph;
    use crate::scene::MeshId;

    fn graph_of(names: &[&str]) -> (MeshGraph, Vec<MeshId>) {
        let mut graph = MeshGraph::new();
        let ids = names
            .iter()
            .enumerate()
            .map(|(i, name)| graph.add_mesh(MeshId::new(i), *name).unwrap())
            .collect();
        (graph, ids)
    }

    #[test]
    fn blockers_come_first() {
        let (mut graph, ids) = graph_of(&["inner", "middle", "outer"]);
        graph.add_edge(ids[2], ids[1]).unwrap();
        graph.add_edge(ids[1], ids[0]).unwrap();

        let topology = Topology::sort(&graph).expect("topology");
        assert_eq!(topology.order, vec![ids[2], ids[1], ids[0]]);
        assert_eq!(topology.rank(ids[0]), Some(2));
    }

    #[test]
    fn independent_meshes_keep_id_order() {
        let (graph, ids) = graph_of(&["a", "b", "c"]);
        assert_eq!(Topology::sort(&graph).unwrap().order, ids);
        assert!(Topology::sort(&MeshGraph::new()).unwrap().order.is_empty());
    }

    #[test]
    fn detects_cycle() {
        let (mut graph, ids) = graph_of(&["a", "b"]);
        graph.add_edge(ids[0], ids[1]).unwrap();
        graph.add_edge(ids[1], ids[0]).unwrap();

        let err = Topology::sort(&graph).expect_err("cycle detected");
        match err {
            TopologyError::Cycle { ref cycle } => {
                assert!(cycle.contains(&ids[0]));
                assert!(cycle.contains(&ids[1]));
            }
        }
        assert_eq!(err.to_string(), "meshes block each other: #0 -> #1 -> #0");
    }
}
