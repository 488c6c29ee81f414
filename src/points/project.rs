//! Snaps bounding-box candidates onto the true mesh surface.

use crate::geom::{Point3, Vec3};
use crate::scene::{CollisionWorld, MeshId, Scene};

use super::PlacedPoint;

/// Closest-point projection followed by a short inward ray for the normal.
#[derive(Debug, Clone, Copy)]
pub struct Projector<'a> {
    world: &'a CollisionWorld,
    offset: f64,
}

impl<'a> Projector<'a> {
    /// `offset` is how far outside the surface the normal probe starts.
    #[must_use]
    pub const fn new(world: &'a CollisionWorld, offset: f64) -> Self {
        Self { world, offset }
    }

    /// Projected `(position, normal)`, or `None` when `mesh` has no collider.
    #[must_use]
    pub fn project(&self, mesh: MeshId, position: Point3, normal: Vec3) -> Option<(Point3, Vec3)> {
        let surface = self.world.closest_point(mesh, position)?;
        let outward = normal.normalized().unwrap_or(Vec3::Y);

        let start = surface.point + outward * self.offset;
        if let Some(hit) = self.world.raycast_mesh(mesh, start, -outward, self.offset * 2.0) {
            return Some((hit.point, hit.normal));
        }

        // Probe missed (edge or corner): fall back to the closest triangle,
        // flipped to face the candidate's side.
        let fallback = surface
            .normal
            .map(|n| if n.dot(outward) < 0.0 { -n } else { n })
            .unwrap_or(outward);
        Some((surface.point, fallback))
    }
}

/// Projects every point of `mesh` in place.
///
/// A temporary collider is created for the mesh when it has none and removed
/// before returning. Points are left untouched when no collider can be built.
pub fn project_points(
    scene: &Scene,
    world: &mut CollisionWorld,
    mesh: MeshId,
    offset: f64,
    points: &mut [PlacedPoint],
) -> usize {
    let scope = world.scope(scene, &[mesh]);
    let projector = Projector::new(&scope, offset);

    let mut moved = 0;
    for point in points.iter_mut().filter(|p| p.mesh == mesh) {
        if let Some((position, normal)) = projector.project(mesh, point.position, point.normal) {
            point.position = position;
            point.normal = normal;
            moved += 1;
        }
    }
    log::debug!("projected {moved} points onto mesh {mesh}");
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{BoxFace, Tolerance, Transform, TriMesh, box_mesh};
    use crate::scene::MeshRecord;

    fn placed(mesh: MeshId, position: Point3, normal: Vec3) -> PlacedPoint {
        PlacedPoint {
            mesh,
            face: BoxFace::PosY,
            position,
            normal,
            blocked_by: None,
        }
    }

    /// A tetrahedron whose bounding box is much larger than its upper surface.
    fn wedge() -> TriMesh {
        TriMesh::new(
            vec![
                [-1.0, 0.0, -1.0],
                [1.0, 0.0, -1.0],
                [0.0, 0.0, 1.0],
                [0.0, 1.0, 0.0],
            ],
            vec![0, 1, 2, 0, 3, 1, 1, 3, 2, 0, 2, 3],
        )
    }

    #[test]
    fn box_face_candidate_stays_on_box() {
        let mut scene = Scene::new();
        let id = scene.add_mesh(MeshRecord::new("box", box_mesh([1.0; 3]))).unwrap();
        let mut world = CollisionWorld::new();
        let mut points = [placed(id, Point3::new(0.1, 0.5, 0.2), Vec3::Y)];

        assert_eq!(project_points(&scene, &mut world, id, 0.01, &mut points), 1);
        assert!(Tolerance::LOOSE.approx_eq_point3(points[0].position, Point3::new(0.1, 0.5, 0.2)));
        assert_eq!(points[0].normal, Vec3::Y);
        // The temporary collider is gone again.
        assert!(!world.has_collider(id));
    }

    #[test]
    fn bounding_face_candidate_snaps_to_slanted_surface() {
        let mut scene = Scene::new();
        let id = scene.add_mesh(MeshRecord::new("wedge", wedge())).unwrap();
        let mut world = CollisionWorld::new();
        // On the +X bounding face, well off the slanted side 2x + y + z = 1.
        let mut points = [placed(id, Point3::new(1.0, 0.3, 0.0), Vec3::X)];
        project_points(&scene, &mut world, id, 0.01, &mut points);

        let expected = Point3::new(1.0 - 1.3 / 3.0, 0.3 - 1.3 / 6.0, -1.3 / 6.0);
        let expected_normal = Vec3::new(2.0, 1.0, 1.0).normalized().unwrap();
        assert!(Tolerance::LOOSE.approx_eq_point3(points[0].position, expected));
        assert!((points[0].normal - expected_normal).length() < 1e-9);
    }

    #[test]
    fn persistent_colliders_survive_projection() {
        let mut scene = Scene::new();
        let id = scene
            .add_mesh(
                MeshRecord::new("box", box_mesh([1.0; 3]))
                    .with_collider(true)
                    .with_transform(Transform::translate(Vec3::new(0.0, 2.0, 0.0))),
            )
            .unwrap();
        let mut world = CollisionWorld::from_scene(&scene);
        let mut points = [placed(id, Point3::new(0.1, 2.6, 0.2), Vec3::Y)];
        project_points(&scene, &mut world, id, 0.01, &mut points);

        assert!(world.has_collider(id));
        assert!(Tolerance::LOOSE.approx_eq_point3(points[0].position, Point3::new(0.1, 2.5, 0.2)));
    }
}
