//! Occlusion/depth classification of a candidate point.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geom::{Point3, Vec3};
use crate::scene::{CollisionWorld, MeshId, Scene};

/// Tunables of the depth validator, including the equal-depth tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// The ray starts this far behind the surface, along `-normal`.
    pub ray_offset: f64,
    /// Equal-depth hits whose normal dot is below this are head-on and block.
    pub opposition_dot: f64,
    /// Equal-depth hits closer than this fraction of the source mesh's
    /// smallest world extent block.
    pub separation_fraction: f64,
    /// Lower bound of the separation threshold.
    pub separation_floor: f64,
    /// Also report back-facing triangles.
    pub hit_backfaces: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            ray_offset: 0.01,
            opposition_dot: -0.5,
            separation_fraction: 0.03,
            separation_floor: 0.001,
            hit_backfaces: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The first foreign mesh on the ray is deeper than the source.
    DeeperMesh,
    /// Same depth, facing the source head-on.
    HeadOn,
    /// Same depth, closer than the minimum separation.
    TooClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The point can be placed. `blocked_by` records a shallower mesh in front
    /// of it, which has to be removed first.
    Accepted { blocked_by: Option<MeshId> },
    Rejected { blocked_by: MeshId, reason: RejectReason },
}

impl Verdict {
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    #[must_use]
    pub const fn blocked_by(self) -> Option<MeshId> {
        match self {
            Self::Accepted { blocked_by } => blocked_by,
            Self::Rejected { blocked_by, .. } => Some(blocked_by),
        }
    }
}

/// Classifies candidates against the tracked meshes of a scene.
#[derive(Debug)]
pub struct Validator<'a> {
    scene: &'a Scene,
    world: &'a CollisionWorld,
    config: ValidatorConfig,
    separation: HashMap<MeshId, f64>,
}

impl<'a> Validator<'a> {
    #[must_use]
    pub fn new(scene: &'a Scene, world: &'a CollisionWorld, config: ValidatorConfig) -> Self {
        let separation = scene
            .meshes()
            .map(|(id, record)| {
                let min_dim = record.world_bounds().map_or(0.0, |b| b.min_dimension());
                (id, (min_dim * config.separation_fraction).max(config.separation_floor))
            })
            .collect();
        Self {
            scene,
            world,
            config,
            separation,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Equal-depth separation threshold for points on `mesh`.
    #[must_use]
    pub fn separation_threshold(&self, mesh: MeshId) -> f64 {
        self.separation
            .get(&mesh)
            .copied()
            .unwrap_or(self.config.separation_floor)
    }

    /// Casts along `normal` from just behind `position` and classifies the
    /// first relevant hit against the depth of `source`.
    #[must_use]
    pub fn check(&self, source: MeshId, position: Point3, normal: Vec3) -> Verdict {
        let Some(source_depth) = self.scene.mesh(source).map(|m| m.depth) else {
            return Verdict::Accepted { blocked_by: None };
        };
        let Some(dir) = normal.normalized() else {
            return Verdict::Accepted { blocked_by: None };
        };

        let origin = position - dir * self.config.ray_offset;
        let hits = self
            .world
            .raycast_all(origin, dir, f64::INFINITY, self.config.hit_backfaces);

        for hit in hits {
            if hit.mesh == source {
                continue;
            }
            let Some(other) = self.scene.mesh(hit.mesh).filter(|m| m.enabled) else {
                continue;
            };

            if other.depth > source_depth {
                return Verdict::Rejected {
                    blocked_by: hit.mesh,
                    reason: RejectReason::DeeperMesh,
                };
            }
            if other.depth < source_depth {
                return Verdict::Accepted {
                    blocked_by: Some(hit.mesh),
                };
            }

            if dir.dot(hit.normal) < self.config.opposition_dot {
                return Verdict::Rejected {
                    blocked_by: hit.mesh,
                    reason: RejectReason::HeadOn,
                };
            }
            if hit.distance < self.separation_threshold(source) {
                return Verdict::Rejected {
                    blocked_by: hit.mesh,
                    reason: RejectReason::TooClose,
                };
            }
            log::debug!(
                "equal-depth hit on '{}' at {:.4} ignored",
                other.name,
                hit.distance
            );
        }

        Verdict::Accepted { blocked_by: None }
    }
}
