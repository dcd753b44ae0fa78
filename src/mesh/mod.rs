mod model_id;

pub use model_id::ModelId;

use crate::error::{GeometryError, Result};
use crate::math::{centroid, Point3};

/// Triangulated surface geometry as handed over by the host renderer.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub positions: Vec<Point3>,
    /// Triangle indices (each triple defines a triangle).
    pub triangles: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Builds a mesh from a flat `[x, y, z, x, y, z, ...]` position buffer and
    /// an optional flat triangle index buffer.
    ///
    /// Without indices, consecutive vertex triples form the triangles; trailing
    /// vertices that do not complete a triangle are kept as isolated vertices.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError` if the position or index buffer length is not a
    /// multiple of 3, or an index points past the last vertex.
    pub fn from_buffers(positions: &[f32], indices: Option<&[u32]>) -> Result<Self> {
        if positions.len() % 3 != 0 {
            return Err(GeometryError::PositionBufferLength(positions.len()).into());
        }
        let positions: Vec<Point3> = positions
            .chunks_exact(3)
            .map(|c| Point3::new(f64::from(c[0]), f64::from(c[1]), f64::from(c[2])))
            .collect();

        let triangles = match indices {
            Some(indices) => triangles_from_indices(indices, positions.len())?,
            None => implicit_triangles(positions.len())?,
        };

        Ok(Self {
            positions,
            triangles,
        })
    }

    /// Builds a mesh from already-typed positions and triangles.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::IndexOutOfRange` if a triangle references a
    /// vertex that does not exist.
    pub fn new(positions: Vec<Point3>, triangles: Vec<[u32; 3]>) -> Result<Self> {
        let vertex_count = positions.len();
        for &index in triangles.iter().flatten() {
            if index as usize >= vertex_count {
                return Err(GeometryError::IndexOutOfRange {
                    index,
                    vertex_count,
                }
                .into());
            }
        }
        Ok(Self {
            positions,
            triangles,
        })
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Corner positions of triangle `t`.
    #[must_use]
    pub fn triangle_points(&self, t: usize) -> [Point3; 3] {
        let [a, b, c] = self.triangles[t];
        [
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        ]
    }

    /// Centroid of triangle `t`.
    #[must_use]
    pub fn triangle_centroid(&self, t: usize) -> Point3 {
        centroid(&self.triangle_points(t))
    }
}

fn triangles_from_indices(indices: &[u32], vertex_count: usize) -> Result<Vec<[u32; 3]>> {
    if indices.len() % 3 != 0 {
        return Err(GeometryError::IndexBufferLength(indices.len()).into());
    }
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(GeometryError::IndexOutOfRange {
            index,
            vertex_count,
        }
        .into());
    }
    Ok(indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

fn implicit_triangles(vertex_count: usize) -> Result<Vec<[u32; 3]>> {
    let full = vertex_count - vertex_count % 3;
    let last = u32::try_from(full).map_err(|_| GeometryError::IndexOutOfRange {
        index: u32::MAX,
        vertex_count,
    })?;
    Ok((0..last).step_by(3).map(|i| [i, i + 1, i + 2]).collect())
}
