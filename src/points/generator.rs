//! One generation run: distribute, allocate per mesh, project, number.

use crate::geom::{BoxFace, MeshError, Point3, Vec3};
use crate::metrics::{GenerationMetrics, Phase, TimingReport};
use crate::scene::{CollisionWorld, MeshId, Scene};

use super::allocate::{AllocationStats, MeshAllocator};
use super::distribute::distribute;
use super::project::project_points;
use super::validate::Validator;
use super::{GenerationError, GenerationResult, GeneratorSettings, PlacedPoint};

/// A final bolt point with its exported id.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPoint {
    /// `BoltPoint_{n}`, numbered across the whole run.
    pub id: String,
    pub mesh: MeshId,
    pub face: BoxFace,
    pub position: Point3,
    pub normal: Vec3,
    /// Depth of the owning mesh at generation time.
    pub depth: i32,
    pub blocked_by: Option<MeshId>,
}

/// Every point of a run, grouped by mesh in tracking order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    points: Vec<GeneratedPoint>,
}

impl PointSet {
    #[must_use]
    pub fn new(points: Vec<GeneratedPoint>) -> Self {
        Self { points }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneratedPoint> {
        self.points.iter()
    }

    pub fn on_mesh(&self, mesh: MeshId) -> impl Iterator<Item = &GeneratedPoint> {
        self.points.iter().filter(move |p| p.mesh == mesh)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&GeneratedPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<GeneratedPoint> {
        self.points
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshReport {
    pub mesh: MeshId,
    pub quota: usize,
    pub stats: AllocationStats,
    /// Points moved by surface projection.
    pub projected: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub meshes: Vec<MeshReport>,
    /// Temporary colliders built for the run and removed afterwards.
    pub temporary_colliders: usize,
    /// Only filled with the `generation_metrics` feature.
    pub timing: Option<TimingReport>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub points: PointSet,
    pub report: GenerationReport,
}

/// Runs generation against the scene's persistent colliders.
pub fn generate(scene: &Scene, settings: &GeneratorSettings) -> GenerationResult<Generation> {
    let mut world = CollisionWorld::from_scene(scene);
    generate_with_world(scene, &mut world, settings)
}

/// Runs generation against `world`.
///
/// Temporary colliders added for the run are removed before returning, on
/// success and on failure alike.
pub fn generate_with_world(
    scene: &Scene,
    world: &mut CollisionWorld,
    settings: &GeneratorSettings,
) -> GenerationResult<Generation> {
    let tracked = scene.tracked();
    if tracked.is_empty() {
        log::error!("no enabled meshes to generate points on");
        return Err(GenerationError::NoMeshes);
    }

    let mut areas = Vec::with_capacity(tracked.len());
    for &id in &tracked {
        let Some(record) = scene.mesh(id) else {
            continue;
        };
        if let Err(source) = record.mesh.validate() {
            log::error!("mesh '{}' is invalid: {source}", record.name);
            return Err(GenerationError::InvalidMesh {
                name: record.name.clone(),
                source,
            });
        }
        areas.push(record.surface_area());
    }

    let mut metrics = GenerationMetrics::default();
    metrics.begin();

    let quotas = metrics.time(Phase::Distribution, || distribute(&areas, settings.total_points));

    let scoped: &[MeshId] = if settings.add_collider_if_missing {
        &tracked
    } else {
        &[]
    };
    let mut scope = world.scope(scene, scoped);
    let temporary_colliders = scope.temporary().len();

    let mut per_mesh: Vec<(MeshId, Vec<PlacedPoint>)> = Vec::with_capacity(tracked.len());
    let mut reports = Vec::with_capacity(tracked.len());
    {
        let validator = Validator::new(scene, &scope, settings.validator);
        for (&id, &quota) in tracked.iter().zip(&quotas) {
            let Some(record) = scene.mesh(id) else {
                continue;
            };
            let Some(mut allocator) = MeshAllocator::new(
                id,
                record,
                quota,
                &validator,
                settings.mode,
                settings.allocator,
            ) else {
                return Err(GenerationError::InvalidMesh {
                    name: record.name.clone(),
                    source: MeshError::Empty,
                });
            };

            let outcome = metrics.time(Phase::Allocation, || allocator.run());
            let placed = match outcome {
                Ok(placed) => placed,
                Err(failure) => {
                    log::error!(
                        "could not place bolt points on mesh '{}'; generation aborted",
                        record.name
                    );
                    return Err(GenerationError::PlacementExhausted {
                        name: record.name.clone(),
                        remaining: failure.remaining,
                        attempts: failure.attempts,
                    });
                }
            };
            log::debug!("mesh '{}': {} points placed", record.name, placed.len());
            reports.push(MeshReport {
                mesh: id,
                quota,
                stats: allocator.stats(),
                projected: 0,
            });
            per_mesh.push((id, placed));
        }
    }

    if settings.project_to_surface {
        let offset = settings.validator.ray_offset;
        for ((id, placed), report) in per_mesh.iter_mut().zip(&mut reports) {
            report.projected = metrics.time(Phase::Projection, || {
                project_points(scene, &mut scope, *id, offset, placed)
            });
        }
    }
    drop(scope);

    let mut points = Vec::with_capacity(quotas.iter().sum());
    for (id, placed) in per_mesh {
        let depth = scene.mesh(id).map_or(0, |m| m.depth);
        for p in placed {
            let id_text = format!("BoltPoint_{}", points.len());
            points.push(GeneratedPoint {
                id: id_text,
                mesh: id,
                face: p.face,
                position: p.position,
                normal: p.normal,
                depth,
                blocked_by: p.blocked_by,
            });
        }
    }

    log::info!("created {} points for {} meshes", points.len(), tracked.len());
    Ok(Generation {
        points: PointSet::new(points),
        report: GenerationReport {
            meshes: reports,
            temporary_colliders,
            timing: metrics.end(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Transform, TriMesh, box_mesh};
    use crate::scene::MeshRecord;

    fn two_cubes() -> Scene {
        let mut scene = Scene::new();
        scene
            .add_mesh(MeshRecord::new("front", box_mesh([1.0; 3])).with_depth(0))
            .unwrap();
        scene
            .add_mesh(
                MeshRecord::new("back", box_mesh([1.0; 3]))
                    .with_depth(1)
                    .with_transform(Transform::translate(Vec3::new(3.0, 0.0, 0.0))),
            )
            .unwrap();
        scene
    }

    #[test]
    fn ids_are_sequential_across_meshes() {
        let scene = two_cubes();
        let settings = GeneratorSettings {
            total_points: 6,
            ..GeneratorSettings::default()
        };
        let generation = generate(&scene, &settings).unwrap();
        let ids: Vec<&str> = generation.points.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            ids,
            ["BoltPoint_0", "BoltPoint_1", "BoltPoint_2", "BoltPoint_3", "BoltPoint_4", "BoltPoint_5"]
        );
        assert_eq!(generation.points.on_mesh(MeshId::new(0)).count(), 3);
        assert_eq!(generation.points.on_mesh(MeshId::new(1)).count(), 3);
        assert!(generation.points.on_mesh(MeshId::new(1)).all(|p| p.depth == 1));
    }

    #[test]
    fn temporary_colliders_do_not_leak() {
        let scene = two_cubes();
        let mut world = CollisionWorld::from_scene(&scene);
        assert_eq!(world.collider_count(), 0);
        let generation = generate_with_world(&scene, &mut world, &GeneratorSettings::default()).unwrap();
        assert_eq!(generation.report.temporary_colliders, 2);
        assert_eq!(world.collider_count(), 0);
    }

    #[test]
    fn colliders_removed_on_failure() {
        let mut scene = Scene::new();
        scene.add_mesh(MeshRecord::new("core", box_mesh([1.0; 3]))).unwrap();
        scene
            .add_mesh(
                MeshRecord::new("shell", box_mesh([3.0; 3]))
                    .with_depth(1)
                    .with_collider(true),
            )
            .unwrap();
        // Only the shell's back faces are visible from the core.
        let settings = GeneratorSettings {
            total_points: 4,
            validator: crate::points::ValidatorConfig {
                hit_backfaces: true,
                ..Default::default()
            },
            ..GeneratorSettings::default()
        };
        let mut world = CollisionWorld::from_scene(&scene);
        let err = generate_with_world(&scene, &mut world, &settings).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::PlacementExhausted { ref name, .. } if name == "core"
        ));
        assert_eq!(world.collider_count(), 1);
        assert!(!world.has_collider(MeshId::new(0)));
    }

    #[test]
    fn no_enabled_meshes_is_a_configuration_error() {
        let mut scene = Scene::new();
        scene
            .add_mesh(MeshRecord::new("off", box_mesh([1.0; 3])).with_enabled(false))
            .unwrap();
        assert_eq!(
            generate(&scene, &GeneratorSettings::default()).unwrap_err(),
            GenerationError::NoMeshes
        );
    }

    #[test]
    fn invalid_buffers_abort_before_allocation() {
        let mut scene = Scene::new();
        scene
            .add_mesh(MeshRecord::new("broken", TriMesh::new(vec![[0.0; 3]; 3], vec![0, 1])))
            .unwrap();
        let err = generate(&scene, &GeneratorSettings::default()).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidMesh { ref name, .. } if name == "broken"));
    }
}
