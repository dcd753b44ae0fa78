//! Mesh fixtures shared by unit tests.

use std::f64::consts::TAU;

use crate::math::Point3;
use crate::mesh::TriangleMesh;

fn idx(i: usize) -> u32 {
    u32::try_from(i).unwrap_or(u32::MAX)
}

/// Flat `nx` x `ny` vertex grid with unit spacing in the XY plane.
///
/// Vertex `(i, j)` sits at `(i, j, 0)` with index `j * nx + i`. Each quad is
/// split along its `(i, j) - (i + 1, j + 1)` diagonal, both triangles CCW.
pub fn grid(nx: usize, ny: usize) -> TriangleMesh {
    let mut positions = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            #[allow(clippy::cast_precision_loss)]
            positions.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }
    let mut triangles = Vec::new();
    for j in 0..ny.saturating_sub(1) {
        for i in 0..nx.saturating_sub(1) {
            let v00 = idx(j * nx + i);
            let v10 = idx(j * nx + i + 1);
            let v01 = idx((j + 1) * nx + i);
            let v11 = idx((j + 1) * nx + i + 1);
            triangles.push([v00, v10, v11]);
            triangles.push([v00, v11, v01]);
        }
    }
    TriangleMesh {
        positions,
        triangles,
    }
}

/// Index of vertex `(i, j)` in a grid `nx` wide.
pub fn grid_vertex(nx: usize, i: usize, j: usize) -> u32 {
    idx(j * nx + i)
}

/// Flat disc of unit-spaced rings around a center vertex at the origin.
///
/// Vertex 0 is the center; ring `r` (1-based) vertex `k` has index
/// `1 + (r - 1) * segments + k` and sits at radius `r`.
pub fn disc(rings: usize, segments: usize) -> TriangleMesh {
    let mut positions = vec![Point3::origin()];
    for r in 1..=rings {
        for k in 0..segments {
            #[allow(clippy::cast_precision_loss)]
            let (radius, angle) = (r as f64, TAU * k as f64 / segments as f64);
            positions.push(Point3::new(radius * angle.cos(), radius * angle.sin(), 0.0));
        }
    }

    let ring = |r: usize, k: usize| idx(1 + (r - 1) * segments + k % segments);
    let mut triangles = Vec::new();
    for k in 0..segments {
        triangles.push([0, ring(1, k), ring(1, k + 1)]);
    }
    for r in 1..rings {
        for k in 0..segments {
            let (a, b) = (ring(r, k), ring(r, k + 1));
            let (c, d) = (ring(r + 1, k), ring(r + 1, k + 1));
            triangles.push([a, c, d]);
            triangles.push([a, d, b]);
        }
    }
    TriangleMesh {
        positions,
        triangles,
    }
}

/// Index of vertex `k` on ring `r` of a disc with `segments` per ring.
pub fn disc_vertex(segments: usize, r: usize, k: usize) -> u32 {
    idx(1 + (r - 1) * segments + k % segments)
}

/// Flattens a mesh back into host buffers.
#[allow(clippy::cast_possible_truncation)]
pub fn to_buffers(mesh: &TriangleMesh) -> (Vec<f32>, Vec<u32>) {
    let positions = mesh
        .positions
        .iter()
        .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32])
        .collect();
    let indices = mesh.triangles.iter().flatten().copied().collect();
    (positions, indices)
}
