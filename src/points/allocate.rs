//! Round-robin, face-by-face point placement for a single mesh.
//!
//! Faces are visited by descending area. Each visit proposes one more point
//! on the face, regenerates the whole face layout at the new count and
//! validates every candidate. An accepted proposal replaces the face's batch;
//! a full round without acceptance fails the attempt. Failed attempts restart
//! from scratch until `max_attempts` is used up.

use serde::{Deserialize, Serialize};

use crate::geom::{FaceInfo, Point3, Vec3, box_faces, faces_by_area};
use crate::scene::{MeshId, MeshRecord};

use super::PlacedPoint;
use super::layout::{DistributionMode, face_layout};
use super::validate::{Validator, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Attempts per mesh, the first one included.
    pub max_attempts: u32,
    /// Hard cap on round-robin rounds per attempt.
    pub max_rounds: usize,
    /// Reject proposals landing too close to points on the mesh's other faces.
    pub anti_clustering: bool,
    /// Minimum spacing as a fraction of the mesh's smallest world extent.
    pub min_spacing_fraction: f64,
    pub min_spacing_floor: f64,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            max_rounds: 4096,
            anti_clustering: true,
            min_spacing_fraction: 0.03,
            min_spacing_floor: 0.001,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationState {
    Idle,
    Allocating { attempt: u32 },
    Succeeded,
    Failed { remaining: usize },
}

/// Outcome of growing one face by a single point.
#[derive(Debug, Clone, PartialEq)]
pub enum Proposal {
    /// The regenerated batch, ready to replace the face's points.
    Accepted(Vec<PlacedPoint>),
    /// Candidate `index` of the batch was rejected by the validator.
    Blocked { index: usize, verdict: Verdict },
    /// A candidate came too close to a point on another face.
    Clustered { index: usize },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AllocationStats {
    pub attempts: u32,
    pub rounds: usize,
    pub proposals: usize,
    pub blocked: usize,
    pub clustered: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationFailure {
    pub mesh: MeshId,
    pub remaining: usize,
    pub attempts: u32,
}

/// Allocator for one mesh; owns the per-face point batches.
#[derive(Debug)]
pub struct MeshAllocator<'v, 's> {
    mesh: MeshId,
    record: &'s MeshRecord,
    validator: &'v Validator<'s>,
    mode: DistributionMode,
    config: AllocatorConfig,
    quota: usize,
    faces: [FaceInfo; 6],
    order: [usize; 6],
    size: Vec3,
    min_spacing: f64,
    slots: [Vec<PlacedPoint>; 6],
    state: AllocationState,
    stats: AllocationStats,
}

impl<'v, 's> MeshAllocator<'v, 's> {
    /// Returns `None` for meshes without vertices.
    #[must_use]
    pub fn new(
        mesh: MeshId,
        record: &'s MeshRecord,
        quota: usize,
        validator: &'v Validator<'s>,
        mode: DistributionMode,
        config: AllocatorConfig,
    ) -> Option<Self> {
        let bounds = record.local_bounds()?;
        let faces = box_faces(bounds);
        let min_dim = record.world_bounds().map_or(0.0, |b| b.min_dimension());
        Some(Self {
            mesh,
            record,
            validator,
            mode,
            config,
            quota,
            order: faces_by_area(&faces),
            faces,
            size: bounds.size(),
            min_spacing: (min_dim * config.min_spacing_fraction).max(config.min_spacing_floor),
            slots: Default::default(),
            state: AllocationState::Idle,
            stats: AllocationStats::default(),
        })
    }

    #[must_use]
    pub const fn state(&self) -> AllocationState {
        self.state
    }

    #[must_use]
    pub const fn stats(&self) -> AllocationStats {
        self.stats
    }

    #[must_use]
    pub fn face_points(&self, face: usize) -> &[PlacedPoint] {
        &self.slots[face]
    }

    #[must_use]
    pub fn placed_count(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    /// Runs attempts until one places the full quota or the budget is spent.
    pub fn run(&mut self) -> Result<Vec<PlacedPoint>, AllocationFailure> {
        let attempts = self.config.max_attempts.max(1);
        let mut remaining = self.quota;

        for attempt in 1..=attempts {
            self.state = AllocationState::Allocating { attempt };
            self.stats.attempts = attempt;
            self.clear();

            remaining = self.attempt();
            if remaining == 0 {
                self.state = AllocationState::Succeeded;
                return Ok(self.collect());
            }
            log::warn!(
                "mesh '{}': attempt {attempt}/{attempts} left {remaining} of {} points unplaced",
                self.record.name,
                self.quota
            );
        }

        self.state = AllocationState::Failed { remaining };
        Err(AllocationFailure {
            mesh: self.mesh,
            remaining,
            attempts,
        })
    }

    /// Returns the number of points still needed when the attempt stops.
    fn attempt(&mut self) -> usize {
        let mut needed = self.quota;
        let mut rounds = 0;

        while needed > 0 {
            if rounds >= self.config.max_rounds {
                log::warn!(
                    "mesh '{}': round cap {} reached",
                    self.record.name,
                    self.config.max_rounds
                );
                return needed;
            }
            rounds += 1;
            self.stats.rounds += 1;

            let mut placed_this_round = false;
            for face in self.order {
                match self.propose(face) {
                    Proposal::Accepted(batch) => {
                        self.replace_batch(face, batch);
                        needed -= 1;
                        placed_this_round = true;
                        if needed == 0 {
                            break;
                        }
                    }
                    Proposal::Blocked { index, verdict } => {
                        self.stats.blocked += 1;
                        log::debug!(
                            "mesh '{}' face {}: candidate {index} rejected ({verdict:?})",
                            self.record.name,
                            self.faces[face].face.label()
                        );
                    }
                    Proposal::Clustered { index } => {
                        self.stats.clustered += 1;
                        log::debug!(
                            "mesh '{}' face {}: candidate {index} too close to another face",
                            self.record.name,
                            self.faces[face].face.label()
                        );
                    }
                }
            }

            if !placed_this_round {
                return needed;
            }
        }
        0
    }

    /// Regenerates `face` at one more point and checks the whole batch.
    #[must_use]
    pub fn propose(&mut self, face: usize) -> Proposal {
        self.stats.proposals += 1;
        let info = self.faces[face];
        let count = self.slots[face].len() + 1;
        let transform = self.record.transform;
        let normal = transform.apply_normal(info.normal).unwrap_or(info.normal);

        let mut batch = Vec::with_capacity(count);
        for (index, local) in face_layout(&info, count, self.mode, self.size).into_iter().enumerate() {
            let position = transform.apply_point(local);
            let verdict = self.validator.check(self.mesh, position, normal);
            let Verdict::Accepted { blocked_by } = verdict else {
                return Proposal::Blocked { index, verdict };
            };

            if self.config.anti_clustering && self.crowds_other_faces(face, position) {
                return Proposal::Clustered { index };
            }

            batch.push(PlacedPoint {
                mesh: self.mesh,
                face: info.face,
                position,
                normal,
                blocked_by,
            });
        }
        Proposal::Accepted(batch)
    }

    fn crowds_other_faces(&self, face: usize, position: Point3) -> bool {
        let limit2 = self.min_spacing * self.min_spacing;
        self.slots
            .iter()
            .enumerate()
            .filter(|&(other, _)| other != face)
            .flat_map(|(_, points)| points.iter())
            .any(|p| p.position.distance_squared_to(position) < limit2)
    }

    /// Swaps in a whole new batch for `face`; the previous points are dropped.
    fn replace_batch(&mut self, face: usize, batch: Vec<PlacedPoint>) {
        self.slots[face] = batch;
    }

    fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
    }

    /// Points in canonical face order.
    fn collect(&self) -> Vec<PlacedPoint> {
        self.slots.iter().flatten().copied().collect()
    }
}
