//! JSON artefacts: scene input, point export, bolt dependencies and baskets.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::geom::MeshError;
use crate::scene::SceneError;

pub mod baskets;
pub mod bolts;
pub mod points;
pub mod scene;

pub use baskets::{BasketEntry, BasketsFile};
pub use bolts::{BasketOrderEntry, BasketOrderFile, BoltEntry, BoltsFile};
pub use points::{PointEntry, PointsFile};
pub use scene::{GeometryEntry, MeshEntry, SceneFile};

/// Result type for reading and writing artefacts.
pub type FormatResult<T> = Result<T, FormatError>;

#[derive(Debug, Error)]
pub enum FormatError {
    /// The document is not valid JSON or has the wrong shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A scene entry could not be registered.
    #[error("invalid scene: {0}")]
    Scene(#[from] SceneError),
    /// A mesh entry has unusable buffers.
    #[error("mesh '{name}': {source}")]
    Mesh {
        name: String,
        #[source]
        source: MeshError,
    },
}

/// Parses a JSON document.
pub fn parse_str<T: DeserializeOwned>(input: &str) -> FormatResult<T> {
    Ok(serde_json::from_str(input.trim_start_matches('\u{feff}'))?)
}

/// Pretty-printed JSON.
pub fn to_json<T: Serialize>(value: &T) -> FormatResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> FormatResult<T> {
    let text = fs::read_to_string(path).map_err(|source| FormatError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("read {} bytes from {}", text.len(), path.display());
    parse_str(&text)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> FormatResult<()> {
    let text = to_json(value)?;
    fs::write(path, text).map_err(|source| FormatError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_order_mark_is_ignored() {
        let file: PointsFile = parse_str("\u{feff}{\"points\": []}").unwrap();
        assert!(file.points.is_empty());
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = parse_str::<PointsFile>("{\"points\": [").unwrap_err();
        assert!(matches!(err, FormatError::Json(_)));
        assert!(err.to_string().starts_with("JSON error"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_json::<PointsFile>(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
