mod bvh;
mod core;
mod face;
mod mesh;
mod primitives;
mod triangle;

pub(crate) use bvh::Bvh;
pub use core::{BBox, Point3, Tolerance, Transform, Vec3};
pub use face::{BoxFace, FaceInfo, box_faces, faces_by_area, tangent_basis};
pub use mesh::{MeshError, MeshResult, TriMesh};
pub use primitives::box_mesh;
pub use triangle::{RayHit, Triangle3};

#[cfg(test)]
mod tests;
