use thiserror::Error;

use super::{BBox, Point3, Transform, Triangle3};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("mesh indices are not a triangle list ({0} indices)")]
    NotTriangleList(usize),
    #[error("mesh has invalid vertex coordinates (NaN/Inf) at vertex {0}")]
    InvalidVertex(usize),
    #[error("mesh index {index} is out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds { index: u32, vertex_count: usize },
    #[error("mesh has no triangles")]
    Empty,
}

pub type MeshResult<T> = Result<T, MeshError>;

/// Indexed triangle mesh in its own local space.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriMesh {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
}

impl TriMesh {
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn validate(&self) -> MeshResult<()> {
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::NotTriangleList(self.indices.len()));
        }
        if let Some(bad) = self
            .positions
            .iter()
            .position(|p| p.iter().any(|c| !c.is_finite()))
        {
            return Err(MeshError::InvalidVertex(bad));
        }
        let vertex_count = self.positions.len();
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::IndexOutOfBounds { index, vertex_count });
        }
        if self.indices.is_empty() {
            return Err(MeshError::Empty);
        }
        Ok(())
    }

    /// Triangle `i`. Callers must have validated the mesh.
    #[must_use]
    pub fn triangle(&self, i: usize) -> Triangle3 {
        let corner = |k: usize| Point3::from(self.positions[self.indices[i * 3 + k] as usize]);
        Triangle3::new(corner(0), corner(1), corner(2))
    }

    pub fn triangles(&self) -> impl Iterator<Item = Triangle3> + '_ {
        (0..self.triangle_count()).map(|i| self.triangle(i))
    }

    /// Sum of triangle areas.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.triangles().map(Triangle3::area).sum()
    }

    /// Axis-aligned bounds of the referenced vertices, `None` for an empty mesh.
    #[must_use]
    pub fn local_bounds(&self) -> Option<BBox> {
        let points: Vec<Point3> = self.positions.iter().copied().map(Point3::from).collect();
        BBox::from_points(&points)
    }

    /// Copy with every vertex mapped through `transform`.
    #[must_use]
    pub fn transformed(&self, transform: Transform) -> Self {
        let positions = self
            .positions
            .iter()
            .map(|&p| transform.apply_point(Point3::from(p)).to_array())
            .collect();
        Self::new(positions, self.indices.clone())
    }
}
