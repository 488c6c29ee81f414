//! World-space collision proxies used for ray casts and closest-point queries.
//!
//! Persistent colliders mirror meshes that carry one in the scene. Meshes
//! without a collider can receive a temporary proxy through
//! [`CollisionWorld::scope`]; the returned guard removes every proxy it added
//! when dropped, on every exit path.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use super::{MeshId, MeshRecord, Scene};
use crate::geom::{BBox, Bvh, Point3, Tolerance, Triangle3, Vec3};

/// A single ray intersection against a collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub mesh: MeshId,
    /// Distance along the (unit) ray direction.
    pub distance: f64,
    pub point: Point3,
    /// Unit winding normal of the hit triangle.
    pub normal: Vec3,
}

/// Closest surface location to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub point: Point3,
    /// Unit normal of the closest triangle, `None` when it is degenerate.
    pub normal: Option<Vec3>,
    pub distance: f64,
}

#[derive(Debug, Clone)]
struct Collider {
    triangles: Vec<Triangle3>,
    bvh: Bvh,
}

impl Collider {
    fn build(record: &MeshRecord) -> Option<Self> {
        if record.mesh.validate().is_err() {
            return None;
        }
        let world = record.mesh.transformed(record.transform);
        let triangles: Vec<Triangle3> = world.triangles().collect();
        let bounds: Vec<BBox> = triangles.iter().map(|t| t.bbox()).collect();
        let bvh = Bvh::build(&bounds)?;
        Some(Self { triangles, bvh })
    }

    fn raycast(
        &self,
        mesh: MeshId,
        origin: Point3,
        dir: Vec3,
        max_distance: f64,
        hit_backfaces: bool,
        hits: &mut Vec<RaycastHit>,
    ) {
        self.bvh.ray_candidates(origin, dir, max_distance, |prim| {
            let tri = self.triangles[prim];
            let Some(normal) = tri.unit_normal() else {
                return true;
            };
            if !hit_backfaces && normal.dot(dir) >= 0.0 {
                return true;
            }
            if let Some(hit) = tri.intersect_ray(origin, dir, Tolerance::DEFAULT) {
                if hit.t <= max_distance {
                    hits.push(RaycastHit {
                        mesh,
                        distance: hit.t,
                        point: origin + dir * hit.t,
                        normal,
                    });
                }
            }
            true
        });
    }

    fn closest_point(&self, query: Point3) -> Option<SurfacePoint> {
        let (prim, d2) = self
            .bvh
            .nearest(query, |i| self.triangles[i].closest_point(query).distance_squared_to(query))?;
        let tri = self.triangles[prim];
        Some(SurfacePoint {
            point: tri.closest_point(query),
            normal: tri.unit_normal(),
            distance: d2.sqrt(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollisionWorld {
    colliders: BTreeMap<MeshId, Collider>,
}

impl CollisionWorld {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds persistent colliders for every mesh flagged with one.
    #[must_use]
    pub fn from_scene(scene: &Scene) -> Self {
        let mut world = Self::new();
        for (id, record) in scene.meshes() {
            if record.has_collider {
                world.insert(id, record);
            }
        }
        world
    }

    #[must_use]
    pub fn has_collider(&self, mesh: MeshId) -> bool {
        self.colliders.contains_key(&mesh)
    }

    #[must_use]
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Adds (or rebuilds) the collider of `mesh`. Returns `false` for meshes
    /// whose buffers cannot produce a collider.
    pub fn insert(&mut self, mesh: MeshId, record: &MeshRecord) -> bool {
        match Collider::build(record) {
            Some(collider) => {
                self.colliders.insert(mesh, collider);
                true
            }
            None => {
                log::warn!("mesh '{}' has no usable triangles; no collider built", record.name);
                false
            }
        }
    }

    pub fn remove(&mut self, mesh: MeshId) -> bool {
        self.colliders.remove(&mesh).is_some()
    }

    /// Adds temporary colliders for the listed meshes that lack one.
    ///
    /// The proxies live exactly as long as the returned guard.
    pub fn scope<'w>(&'w mut self, scene: &Scene, meshes: &[MeshId]) -> ColliderScope<'w> {
        let mut added = Vec::new();
        for &id in meshes {
            if self.has_collider(id) {
                continue;
            }
            if let Some(record) = scene.mesh(id) {
                if self.insert(id, record) {
                    log::debug!("temporary collider added for '{}'", record.name);
                    added.push(id);
                }
            }
        }
        ColliderScope { world: self, added }
    }

    /// All intersections along `origin + t * dir`, `0 <= t <= max_distance`,
    /// sorted by distance. `dir` must be unit length.
    #[must_use]
    pub fn raycast_all(
        &self,
        origin: Point3,
        dir: Vec3,
        max_distance: f64,
        hit_backfaces: bool,
    ) -> Vec<RaycastHit> {
        let mut hits = Vec::new();
        for (&mesh, collider) in &self.colliders {
            collider.raycast(mesh, origin, dir, max_distance, hit_backfaces, &mut hits);
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.mesh.cmp(&b.mesh)));
        hits
    }

    /// Nearest front-face hit on one mesh's collider.
    #[must_use]
    pub fn raycast_mesh(
        &self,
        mesh: MeshId,
        origin: Point3,
        dir: Vec3,
        max_distance: f64,
    ) -> Option<RaycastHit> {
        let collider = self.colliders.get(&mesh)?;
        let mut hits = Vec::new();
        collider.raycast(mesh, origin, dir, max_distance, false, &mut hits);
        hits.into_iter().min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    #[must_use]
    pub fn closest_point(&self, mesh: MeshId, query: Point3) -> Option<SurfacePoint> {
        self.colliders.get(&mesh)?.closest_point(query)
    }
}

/// Guard over a [`CollisionWorld`] holding temporary colliders.
#[derive(Debug)]
pub struct ColliderScope<'w> {
    world: &'w mut CollisionWorld,
    added: Vec<MeshId>,
}

impl ColliderScope<'_> {
    #[must_use]
    pub fn temporary(&self) -> &[MeshId] {
        &self.added
    }
}

impl Deref for ColliderScope<'_> {
    type Target = CollisionWorld;

    fn deref(&self) -> &Self::Target {
        self.world
    }
}

impl DerefMut for ColliderScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.world
    }
}

impl Drop for ColliderScope<'_> {
    fn drop(&mut self) {
        for id in self.added.drain(..) {
            self.world.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Transform, box_mesh};

    fn two_box_scene() -> (Scene, MeshId, MeshId) {
        let mut scene = Scene::new();
        let near = scene
            .add_mesh(MeshRecord::new("near", box_mesh([1.0; 3])).with_collider(true))
            .unwrap();
        let far = scene
            .add_mesh(
                MeshRecord::new("far", box_mesh([1.0; 3]))
                    .with_transform(Transform::translate(Vec3::new(3.0, 0.0, 0.0))),
            )
            .unwrap();
        (scene, near, far)
    }

    #[test]
    fn from_scene_only_builds_flagged_colliders() {
        let (scene, near, far) = two_box_scene();
        let world = CollisionWorld::from_scene(&scene);
        assert!(world.has_collider(near));
        assert!(!world.has_collider(far));
    }

    #[test]
    fn scope_removes_temporary_colliders_on_drop() {
        let (scene, near, far) = two_box_scene();
        let mut world = CollisionWorld::from_scene(&scene);
        {
            let scope = world.scope(&scene, &[near, far]);
            assert_eq!(scope.temporary(), &[far]);
            assert!(scope.has_collider(far));
        }
        assert!(world.has_collider(near));
        assert!(!world.has_collider(far));
    }

    #[test]
    fn raycast_all_sorts_front_face_hits() {
        let (scene, near, far) = two_box_scene();
        let mut world = CollisionWorld::from_scene(&scene);
        let scope = world.scope(&scene, &[far]);

        let hits = scope.raycast_all(Point3::new(-2.0, 0.1, 0.2), Vec3::X, f64::INFINITY, false);
        let summary: Vec<(MeshId, f64)> = hits.iter().map(|h| (h.mesh, h.distance)).collect();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].0, near);
        assert!((summary[0].1 - 1.5).abs() < 1e-9);
        assert_eq!(summary[1].0, far);
        assert!((summary[1].1 - 4.5).abs() < 1e-9);
        assert_eq!(hits[0].normal, Vec3::new(-1.0, 0.0, 0.0));

        let both = scope.raycast_all(Point3::new(-2.0, 0.1, 0.2), Vec3::X, f64::INFINITY, true);
        assert_eq!(both.len(), 4);
    }

    #[test]
    fn closest_point_lands_on_surface() {
        let (scene, near, _) = two_box_scene();
        let world = CollisionWorld::from_scene(&scene);
        let surface = world
            .closest_point(near, Point3::new(0.2, 2.0, -0.1))
            .expect("closest point");
        assert!(Tolerance::LOOSE.approx_eq_point3(surface.point, Point3::new(0.2, 0.5, -0.1)));
        assert_eq!(surface.normal, Some(Vec3::Y));
        assert!((surface.distance - 1.5).abs() < 1e-9);
    }
}
