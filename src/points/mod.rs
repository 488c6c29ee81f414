//! Bolt-point generation: area split, face layouts, depth validation,
//! round-robin allocation and surface projection.

pub mod allocate;
pub mod distribute;
pub mod generator;
pub mod layout;
pub mod project;
pub mod validate;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geom::{BoxFace, MeshError, Point3, Vec3};
use crate::scene::MeshId;

pub use allocate::{AllocationState, AllocationStats, AllocatorConfig, MeshAllocator, Proposal};
pub use distribute::distribute;
pub use generator::{GeneratedPoint, Generation, GenerationReport, MeshReport, PointSet, generate, generate_with_world};
pub use layout::{DistributionMode, face_layout};
pub use project::{Projector, project_points};
pub use validate::{RejectReason, ValidatorConfig, Validator, Verdict};

/// A validated point in world space, before it gets an exported id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedPoint {
    pub mesh: MeshId,
    /// Bounding-box face the point was laid out on.
    pub face: BoxFace,
    pub position: Point3,
    pub normal: Vec3,
    /// Shallower mesh in front of the point, if any.
    pub blocked_by: Option<MeshId>,
}

/// Tunables of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Requested point total across all tracked meshes. Values below one are
    /// treated as one.
    pub total_points: i64,
    pub mode: DistributionMode,
    /// Build temporary colliders for tracked meshes that have none.
    pub add_collider_if_missing: bool,
    pub validator: ValidatorConfig,
    pub allocator: AllocatorConfig,
    pub project_to_surface: bool,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            total_points: 10,
            mode: DistributionMode::Auto,
            add_collider_if_missing: true,
            validator: ValidatorConfig::default(),
            allocator: AllocatorConfig::default(),
            project_to_surface: true,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerationError {
    #[error("scene has no enabled meshes")]
    NoMeshes,
    #[error("mesh '{name}' is invalid: {source}")]
    InvalidMesh {
        name: String,
        #[source]
        source: MeshError,
    },
    #[error("could not place {remaining} remaining point(s) on mesh '{name}' after {attempts} attempt(s)")]
    PlacementExhausted {
        name: String,
        remaining: usize,
        attempts: u32,
    },
}

pub type GenerationResult<T> = Result<T, GenerationError>;
