//! Scene input: generator settings plus placed meshes.

use serde::{Deserialize, Serialize};

use super::{FormatError, FormatResult};
use crate::geom::{Transform, TriMesh, Vec3, box_mesh};
use crate::points::GeneratorSettings;
use crate::scene::{MeshRecord, Scene};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryEntry {
    Box {
        size: [f64; 3],
    },
    Triangles {
        positions: Vec<[f64; 3]>,
        indices: Vec<u32>,
    },
}

impl GeometryEntry {
    #[must_use]
    pub fn to_mesh(&self) -> TriMesh {
        match self {
            Self::Box { size } => box_mesh(*size),
            Self::Triangles { positions, indices } => TriMesh::new(positions.clone(), indices.clone()),
        }
    }
}

const fn unit_scale() -> [f64; 3] {
    [1.0; 3]
}

const fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshEntry {
    pub name: String,
    #[serde(default)]
    pub depth: i32,
    #[serde(default = "enabled")]
    pub enabled: bool,
    /// The mesh carries a persistent collider.
    #[serde(default)]
    pub collider: bool,
    #[serde(default)]
    pub translation: [f64; 3],
    /// Euler angles in degrees, applied X then Y then Z.
    #[serde(default)]
    pub rotation_deg: [f64; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f64; 3],
    pub geometry: GeometryEntry,
}

impl MeshEntry {
    #[must_use]
    pub fn transform(&self) -> Transform {
        Transform::from_trs(
            Vec3::from(self.translation),
            Vec3::from(self.rotation_deg),
            Vec3::from(self.scale),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub settings: GeneratorSettings,
    #[serde(default)]
    pub meshes: Vec<MeshEntry>,
}

impl SceneFile {
    /// Builds the scene registry. Fails on duplicate names and on enabled
    /// meshes with broken buffers.
    pub fn to_scene(&self) -> FormatResult<Scene> {
        let mut scene = Scene::new();
        for entry in &self.meshes {
            let mesh = entry.geometry.to_mesh();
            if entry.enabled {
                mesh.validate().map_err(|source| FormatError::Mesh {
                    name: entry.name.clone(),
                    source,
                })?;
            }
            let record = MeshRecord::new(entry.name.clone(), mesh)
                .with_depth(entry.depth)
                .with_enabled(entry.enabled)
                .with_collider(entry.collider)
                .with_transform(entry.transform());
            scene.add_mesh(record)?;
        }
        log::debug!("scene with {} meshes loaded", scene.len());
        Ok(scene)
    }
}
