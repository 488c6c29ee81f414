//! `{ "points": [...] }` export.

use serde::{Deserialize, Serialize};

use crate::points::PointSet;
use crate::scene::Scene;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointEntry {
    pub id: String,
    #[serde(default)]
    pub depth: i32,
    #[serde(default)]
    pub parent_mesh_id: String,
    /// Empty when the point is unblocked.
    #[serde(default)]
    pub blocked_by_mesh_id: String,
}

impl PointEntry {
    #[must_use]
    pub fn blocked_by(&self) -> Option<&str> {
        (!self.blocked_by_mesh_id.is_empty()).then_some(self.blocked_by_mesh_id.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsFile {
    #[serde(default)]
    pub points: Vec<PointEntry>,
}

impl PointsFile {
    /// Mesh ids are the scene's mesh names.
    #[must_use]
    pub fn from_points(scene: &Scene, points: &PointSet) -> Self {
        let name = |id| scene.mesh(id).map_or_else(String::new, |m| m.name.clone());
        Self {
            points: points
                .iter()
                .map(|p| PointEntry {
                    id: p.id.clone(),
                    depth: p.depth,
                    parent_mesh_id: name(p.mesh),
                    blocked_by_mesh_id: p.blocked_by.map_or_else(String::new, name),
                })
                .collect(),
        }
    }
}
