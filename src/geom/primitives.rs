use super::TriMesh;

/// Axis-aligned box centred on the origin with outward (counter-clockwise) winding.
///
/// Each side gets its own four vertices so side normals stay flat.
#[must_use]
pub fn box_mesh(size: [f64; 3]) -> TriMesh {
    let [hx, hy, hz] = size.map(|s| s.abs() * 0.5);
    // Corners of each side, counter-clockwise seen from outside.
    let sides: [[[f64; 3]; 4]; 6] = [
        [[hx, -hy, -hz], [hx, hy, -hz], [hx, hy, hz], [hx, -hy, hz]],
        [[-hx, -hy, hz], [-hx, hy, hz], [-hx, hy, -hz], [-hx, -hy, -hz]],
        [[-hx, hy, -hz], [-hx, hy, hz], [hx, hy, hz], [hx, hy, -hz]],
        [[-hx, -hy, hz], [-hx, -hy, -hz], [hx, -hy, -hz], [hx, -hy, hz]],
        [[-hx, -hy, hz], [hx, -hy, hz], [hx, hy, hz], [-hx, hy, hz]],
        [[hx, -hy, -hz], [-hx, -hy, -hz], [-hx, hy, -hz], [hx, hy, -hz]],
    ];

    let mut positions = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for quad in sides {
        let base = positions.len() as u32;
        positions.extend_from_slice(&quad);
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    TriMesh::new(positions, indices)
}
