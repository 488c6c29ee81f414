//! Deterministic candidate arrangements on a bounding-box face.

use std::f64::consts::{FRAC_PI_4, TAU};

use serde::{Deserialize, Serialize};

use crate::geom::{FaceInfo, Point3, Vec3, tangent_basis};

/// Requested arrangement of points on a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum DistributionMode {
    /// Linear on elongated faces, radial otherwise.
    #[default]
    Auto,
    Linear,
    Radial,
}

/// Arrangement actually used for a face once `Auto` is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrangement {
    Linear,
    Radial,
}

/// Extent ratio above which `Auto` picks a linear layout.
pub const AUTO_LINEAR_RATIO: f64 = 1.5;
/// Fraction of the longer extent covered by a linear layout.
pub const LINEAR_SPAN: f64 = 0.8;
/// Ring radius as a fraction of the shorter extent.
pub const RING_RADIUS: f64 = 0.35;
/// Angular offset of the ring; two-point rings land on a diagonal.
pub const RING_PHASE: f64 = FRAC_PI_4;

#[must_use]
pub fn resolve_mode(mode: DistributionMode, size_a: f64, size_b: f64) -> Arrangement {
    match mode {
        DistributionMode::Linear => Arrangement::Linear,
        DistributionMode::Radial => Arrangement::Radial,
        DistributionMode::Auto => {
            if size_a > size_b * AUTO_LINEAR_RATIO || size_b > size_a * AUTO_LINEAR_RATIO {
                Arrangement::Linear
            } else {
                Arrangement::Radial
            }
        }
    }
}

/// Local-space candidates for `count` points on `face`.
///
/// `size` is the mesh's local bounding-box size. The same inputs always give
/// the same output.
#[must_use]
pub fn face_layout(face: &FaceInfo, count: usize, mode: DistributionMode, size: Vec3) -> Vec<Point3> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![face.center];
    }

    let (axis_a, axis_b) = tangent_basis(face.normal);
    let size_a = size.dot(axis_a).abs();
    let size_b = size.dot(axis_b).abs();

    match resolve_mode(mode, size_a, size_b) {
        Arrangement::Linear => {
            let dir = if size_a >= size_b { axis_a } else { axis_b };
            let length = size_a.max(size_b) * LINEAR_SPAN;
            let step = length / (count - 1) as f64;
            (0..count)
                .map(|i| face.center + dir * (-length * 0.5 + step * i as f64))
                .collect()
        }
        Arrangement::Radial => {
            let with_center = count % 2 == 1;
            let ring = if with_center { count - 1 } else { count };
            let radius = size_a.min(size_b) * RING_RADIUS;

            let mut points = Vec::with_capacity(count);
            if with_center {
                points.push(face.center);
            }
            for k in 0..ring {
                let angle = TAU * k as f64 / ring as f64 + RING_PHASE;
                let (sin, cos) = angle.sin_cos();
                points.push(face.center + axis_a * (cos * radius) + axis_b * (sin * radius));
            }
            points
        }
    }
}
