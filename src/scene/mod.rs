//! Mesh registry handed to point generation.
//!
//! Meshes are addressed by [`MeshId`] handles internally; names are only used
//! at the serialization boundary.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::geom::{BBox, TriMesh, Transform};

pub mod collider;

pub use collider::{ColliderScope, CollisionWorld, RaycastHit, SurfacePoint};

/// Stable handle of a mesh inside a [`Scene`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd)]
pub struct MeshId(pub usize);

impl MeshId {
    #[must_use]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }
}

impl From<usize> for MeshId {
    fn from(value: usize) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One mesh of the puzzle: local geometry, placement and assembly depth.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRecord {
    pub name: String,
    pub mesh: TriMesh,
    /// Local-to-world placement.
    pub transform: Transform,
    pub depth: i32,
    /// Disabled meshes receive no points and are ignored by the validator.
    pub enabled: bool,
    /// Whether the mesh carries its own persistent collision proxy.
    pub has_collider: bool,
}

impl MeshRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, mesh: TriMesh) -> Self {
        Self {
            name: name.into(),
            mesh,
            transform: Transform::identity(),
            depth: 0,
            enabled: true,
            has_collider: false,
        }
    }

    #[must_use]
    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = depth;
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn with_collider(mut self, has_collider: bool) -> Self {
        self.has_collider = has_collider;
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Triangle-sum area of the mesh as placed in the world.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.mesh.transformed(self.transform).surface_area()
    }

    #[must_use]
    pub fn local_bounds(&self) -> Option<BBox> {
        self.mesh.local_bounds()
    }

    #[must_use]
    pub fn world_bounds(&self) -> Option<BBox> {
        self.mesh.transformed(self.transform).local_bounds()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("a mesh named '{0}' is already registered")]
    DuplicateMesh(String),
}

pub type SceneResult<T> = Result<T, SceneError>;

#[derive(Debug, Clone, Default)]
pub struct Scene {
    meshes: Vec<MeshRecord>,
    name_index: HashMap<String, MeshId>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mesh. Names must be unique; they become the exported mesh ids.
    pub fn add_mesh(&mut self, record: MeshRecord) -> SceneResult<MeshId> {
        if self.name_index.contains_key(&record.name) {
            return Err(SceneError::DuplicateMesh(record.name));
        }
        let id = MeshId::new(self.meshes.len());
        self.name_index.insert(record.name.clone(), id);
        self.meshes.push(record);
        Ok(id)
    }

    #[must_use]
    pub fn mesh(&self, id: MeshId) -> Option<&MeshRecord> {
        self.meshes.get(id.0)
    }

    #[must_use]
    pub fn mesh_by_name(&self, name: &str) -> Option<MeshId> {
        self.name_index.get(name).copied()
    }

    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &MeshRecord)> {
        self.meshes.iter().enumerate().map(|(i, m)| (MeshId::new(i), m))
    }

    /// Enabled meshes in registration order.
    #[must_use]
    pub fn tracked(&self) -> Vec<MeshId> {
        self.meshes()
            .filter_map(|(id, m)| m.enabled.then_some(id))
            .collect()
    }

    #[must_use]
    pub fn is_tracked(&self, id: MeshId) -> bool {
        self.mesh(id).is_some_and(|m| m.enabled)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}
