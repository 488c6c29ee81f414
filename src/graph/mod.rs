//! Mesh blocking graph derived from generated points.
//!
//! An edge `blocker -> blocked` means a bolt on `blocked` cannot be removed
//! until `blocker` is gone.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::points::PointSet;
use crate::scene::{MeshId, Scene};

pub mod topo;

pub use topo::{Topology, TopologyError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshNode {
    pub id: MeshId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockEdge {
    pub blocker: MeshId,
    pub blocked: MeshId,
}

/// Graph container with indices for fast lookups.
#[derive(Debug, Clone, Default)]
pub struct MeshGraph {
    nodes: Vec<MeshNode>,
    edges: BTreeSet<BlockEdge>,
    node_index: HashMap<MeshId, usize>,
    name_index: HashMap<String, MeshId>,
}

impl MeshGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph of every mesh owning or blocking a point.
    ///
    /// Meshes missing from `scene` are named after their id. A name clash
    /// between such a fallback and a scene mesh is an error.
    pub fn from_points(scene: &Scene, points: &PointSet) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for point in points.iter() {
            graph.ensure(scene, point.mesh)?;
            if let Some(blocker) = point.blocked_by {
                graph.ensure(scene, blocker)?;
                graph.add_edge(blocker, point.mesh)?;
            }
        }
        log::debug!(
            "mesh graph with {} meshes and {} blocking edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Builds the graph from `(owner, blocker)` mesh names, as found in a
    /// point export. Ids are handed out in order of first appearance.
    pub fn from_names<'a>(pairs: impl IntoIterator<Item = (&'a str, Option<&'a str>)>) -> Self {
        let mut graph = Self::new();
        for (owner, blocker) in pairs {
            let owner = graph.intern(owner);
            if let Some(blocker) = blocker {
                let blocker = graph.intern(blocker);
                let _ = graph.add_edge(blocker, owner);
            }
        }
        graph
    }

    pub fn add_mesh(&mut self, id: MeshId, name: impl Into<String>) -> Result<MeshId, GraphError> {
        let name = name.into();
        if self.node_index.contains_key(&id) || self.name_index.contains_key(&name) {
            return Err(GraphError::DuplicateMesh(name));
        }
        self.node_index.insert(id, self.nodes.len());
        self.name_index.insert(name.clone(), id);
        self.nodes.push(MeshNode { id, name });
        Ok(id)
    }

    /// Adds `blocker -> blocked`. Returns `false` for self-loops and edges
    /// that already exist.
    pub fn add_edge(&mut self, blocker: MeshId, blocked: MeshId) -> Result<bool, GraphError> {
        for id in [blocker, blocked] {
            if !self.contains(id) {
                return Err(GraphError::UnknownMesh(id));
            }
        }
        if blocker == blocked {
            return Ok(false);
        }
        Ok(self.edges.insert(BlockEdge { blocker, blocked }))
    }

    #[must_use]
    pub fn contains(&self, id: MeshId) -> bool {
        self.node_index.contains_key(&id)
    }

    #[must_use]
    pub fn node(&self, id: MeshId) -> Option<&MeshNode> {
        self.node_index.get(&id).and_then(|&idx| self.nodes.get(idx))
    }

    #[must_use]
    pub fn name(&self, id: MeshId) -> Option<&str> {
        self.node(id).map(|n| n.name.as_str())
    }

    #[must_use]
    pub fn mesh_by_name(&self, name: &str) -> Option<MeshId> {
        self.name_index.get(name).copied()
    }

    #[must_use]
    pub fn nodes(&self) -> &[MeshNode] {
        &self.nodes
    }

    /// Edges sorted by `(blocker, blocked)`.
    pub fn edges(&self) -> impl Iterator<Item = BlockEdge> + '_ {
        self.edges.iter().copied()
    }

    /// Meshes that have to go before `mesh`.
    pub fn blockers_of(&self, mesh: MeshId) -> impl Iterator<Item = MeshId> + '_ {
        self.edges
            .iter()
            .filter(move |e| e.blocked == mesh)
            .map(|e| e.blocker)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn ensure(&mut self, scene: &Scene, id: MeshId) -> Result<(), GraphError> {
        if self.contains(id) {
            return Ok(());
        }
        let name = scene.mesh(id).map_or_else(|| id.to_string(), |m| m.name.clone());
        self.add_mesh(id, name).map(|_| ())
    }

    fn intern(&mut self, name: &str) -> MeshId {
        if let Some(id) = self.mesh_by_name(name) {
            return id;
        }
        let id = MeshId::new(self.nodes.len());
        self.node_index.insert(id, self.nodes.len());
        self.name_index.insert(name.to_owned(), id);
        self.nodes.push(MeshNode {
            id,
            name: name.to_owned(),
        });
        id
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("mesh '{0}' is already in the graph")]
    DuplicateMesh(String),
    #[error("mesh {0} is not in the graph")]
    UnknownMesh(MeshId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{BoxFace, Point3, Vec3, box_mesh};
    use crate::points::GeneratedPoint;
    use crate::scene::MeshRecord;

    fn point(n: usize, mesh: usize, blocked_by: Option<usize>) -> GeneratedPoint {
        GeneratedPoint {
            id: format!("BoltPoint_{n}"),
            mesh: MeshId::new(mesh),
            face: BoxFace::PosX,
            position: Point3::ORIGIN,
            normal: Vec3::X,
            depth: 0,
            blocked_by: blocked_by.map(MeshId::new),
        }
    }

    fn scene_of(names: &[&str]) -> Scene {
        let mut scene = Scene::new();
        for name in names {
            scene.add_mesh(MeshRecord::new(*name, box_mesh([1.0; 3]))).unwrap();
        }
        scene
    }

    #[test]
    fn graph_from_generated_points() {
        let scene = scene_of(&["lid", "box", "base"]);
        let points = PointSet::new(vec![
            point(0, 0, None),
            point(1, 1, Some(0)),
            point(2, 1, Some(0)),
            point(3, 2, Some(1)),
        ]);
        let graph = MeshGraph::from_points(&scene, &points).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.name(MeshId::new(2)), Some("base"));
        assert_eq!(graph.blockers_of(MeshId::new(1)).collect::<Vec<_>>(), vec![MeshId::new(0)]);

        let order = Topology::sort(&graph).unwrap().order;
        assert_eq!(order, vec![MeshId::new(0), MeshId::new(1), MeshId::new(2)]);
    }

    #[test]
    fn unnamed_blocker_clashing_with_scene_name_errors() {
        // Mesh #1 is not in the scene; its fallback name is taken.
        let scene = scene_of(&["#1"]);
        let points = PointSet::new(vec![point(0, 0, Some(1))]);
        assert_eq!(
            MeshGraph::from_points(&scene, &points).unwrap_err(),
            GraphError::DuplicateMesh("#1".to_owned())
        );

        let scene = scene_of(&["lid"]);
        let graph = MeshGraph::from_points(&scene, &points).unwrap();
        assert_eq!(graph.name(MeshId::new(1)), Some("#1"));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn duplicate_meshes_error() {
        let mut graph = MeshGraph::new();
        graph.add_mesh(MeshId::new(5), "lid").unwrap();
        let err = graph.add_mesh(MeshId::new(6), "lid").unwrap_err();
        assert_eq!(err, GraphError::DuplicateMesh("lid".to_owned()));
        assert_eq!(graph.mesh_by_name("lid"), Some(MeshId::new(5)));
    }

    #[test]
    fn adding_edge_requires_existing_meshes() {
        let mut graph = MeshGraph::new();
        let a = graph.add_mesh(MeshId::new(0), "a").unwrap();
        assert_eq!(
            graph.add_edge(a, MeshId::new(1)),
            Err(GraphError::UnknownMesh(MeshId::new(1)))
        );

        let b = graph.add_mesh(MeshId::new(1), "b").unwrap();
        assert_eq!(graph.add_edge(a, b), Ok(true));
        assert_eq!(graph.add_edge(a, b), Ok(false));
        assert_eq!(graph.add_edge(b, b), Ok(false));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.blockers_of(b).collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn names_are_interned_in_order() {
        let graph = MeshGraph::from_names([
            ("shell", None),
            ("core", Some("shell")),
            ("core", Some("shell")),
            ("pin", Some("core")),
        ]);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.mesh_by_name("core"), Some(MeshId::new(1)));
        let edges: Vec<(&str, &str)> = graph
            .edges()
            .map(|e| (graph.name(e.blocker).unwrap(), graph.name(e.blocked).unwrap()))
            .collect();
        assert_eq!(edges, vec![("shell", "core"), ("core", "pin")]);
    }
}
