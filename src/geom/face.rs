//! The six canonical faces of a mesh's local bounding box.

use super::{BBox, Point3, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxFace {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl BoxFace {
    /// Canonical order; also the order points are collected in after allocation.
    pub const ALL: [Self; 6] = [
        Self::PosX,
        Self::NegX,
        Self::PosY,
        Self::NegY,
        Self::PosZ,
        Self::NegZ,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::PosX => 0,
            Self::NegX => 1,
            Self::PosY => 2,
            Self::NegY => 3,
            Self::PosZ => 4,
            Self::NegZ => 5,
        }
    }

    #[must_use]
    pub const fn normal(self) -> Vec3 {
        match self {
            Self::PosX => Vec3::X,
            Self::NegX => Vec3::new(-1.0, 0.0, 0.0),
            Self::PosY => Vec3::Y,
            Self::NegY => Vec3::new(0.0, -1.0, 0.0),
            Self::PosZ => Vec3::Z,
            Self::NegZ => Vec3::new(0.0, 0.0, -1.0),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PosX => "+X",
            Self::NegX => "-X",
            Self::PosY => "+Y",
            Self::NegY => "-Y",
            Self::PosZ => "+Z",
            Self::NegZ => "-Z",
        }
    }
}

/// A bounding-box face in mesh-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceInfo {
    pub face: BoxFace,
    pub center: Point3,
    pub normal: Vec3,
    /// Product of the two extents orthogonal to the normal.
    pub area: f64,
}

#[must_use]
pub fn box_faces(bounds: BBox) -> [FaceInfo; 6] {
    let center = bounds.center();
    let half = bounds.half_extents();
    let size = bounds.size();
    BoxFace::ALL.map(|face| {
        let n = face.normal();
        let area = match face {
            BoxFace::PosX | BoxFace::NegX => size.y * size.z,
            BoxFace::PosY | BoxFace::NegY => size.x * size.z,
            BoxFace::PosZ | BoxFace::NegZ => size.x * size.y,
        };
        let offset = Vec3::new(n.x * half.x, n.y * half.y, n.z * half.z);
        FaceInfo {
            face,
            center: center + offset,
            normal: n,
            area,
        }
    })
}

/// Face indices by descending area. Equal areas keep canonical order.
#[must_use]
pub fn faces_by_area(faces: &[FaceInfo; 6]) -> [usize; 6] {
    let mut order = [0, 1, 2, 3, 4, 5];
    order.sort_by(|&a, &b| faces[b].area.total_cmp(&faces[a].area));
    order
}

/// Orthonormal tangent pair `(axis_a, axis_b)` for a face normal.
///
/// `axis_a = normal × up`, switching to `normal × right` when the normal is
/// (nearly) vertical; `axis_b = normal × axis_a`.
#[must_use]
pub fn tangent_basis(normal: Vec3) -> (Vec3, Vec3) {
    let mut axis_a = normal.cross(Vec3::Y);
    if axis_a.length_squared() < 1e-4 {
        axis_a = normal.cross(Vec3::X);
    }
    let axis_a = axis_a.normalized().unwrap_or(Vec3::X);
    let axis_b = normal.cross(axis_a).normalized().unwrap_or(Vec3::Z);
    (axis_a, axis_b)
}
