use std::collections::{BTreeSet, VecDeque};

use crate::error::{GeometryError, Result};
use crate::math::Point3;
use crate::mesh::TriangleMesh;

/// Undirected vertex adjacency over a triangulated surface.
///
/// Built once per loaded mesh and never mutated afterwards. Every edge is
/// stored in both directions and neighbor lists are sorted, so iteration
/// order is deterministic.
#[derive(Debug, Clone, Default)]
pub struct MeshGraph {
    positions: Vec<Point3>,
    neighbors: Vec<Vec<u32>>,
}

impl MeshGraph {
    /// Builds the graph from a mesh: each triangle `(a, b, c)` contributes
    /// the edges `(a, b)`, `(b, c)` and `(c, a)`.
    #[must_use]
    pub fn build(mesh: &TriangleMesh) -> Self {
        let mut sets: Vec<BTreeSet<u32>> = vec![BTreeSet::new(); mesh.vertex_count()];
        for &[a, b, c] in &mesh.triangles {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                if u == v {
                    continue;
                }
                sets[u as usize].insert(v);
                sets[v as usize].insert(u);
            }
        }
        Self {
            positions: mesh.positions.clone(),
            neighbors: sets.into_iter().map(|s| s.into_iter().collect()).collect(),
        }
    }

    /// Builds the graph straight from host buffers.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError` if the buffers do not describe valid triangles.
    pub fn from_buffers(positions: &[f32], indices: Option<&[u32]>) -> Result<Self> {
        Ok(Self::build(&TriangleMesh::from_buffers(positions, indices)?))
    }

    /// Number of vertices (graph nodes), including isolated ones.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Whether `v` is a vertex of this graph.
    #[must_use]
    pub fn contains(&self, v: u32) -> bool {
        (v as usize) < self.positions.len()
    }

    /// Position of vertex `v`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::VertexOutOfRange` if `v` is not in the graph.
    pub fn position(&self, v: u32) -> Result<Point3> {
        self.positions.get(v as usize).copied().ok_or_else(|| {
            GeometryError::VertexOutOfRange {
                vertex: v,
                vertex_count: self.positions.len(),
            }
            .into()
        })
    }

    /// All vertex positions, indexed by vertex.
    #[must_use]
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    /// Sorted neighbors of `v`; empty for isolated or unknown vertices.
    #[must_use]
    pub fn neighbors(&self, v: u32) -> &[u32] {
        self.neighbors.get(v as usize).map_or(&[], Vec::as_slice)
    }

    /// Nearest vertex to `point` by Euclidean distance, or `None` for an
    /// empty graph. Ties resolve to the lower index.
    ///
    /// This is a linear scan over all vertices. It runs once per pick, which
    /// is fine for typical meshes but scales linearly with vertex count.
    #[must_use]
    pub fn nearest_vertex(&self, point: &Point3) -> Option<u32> {
        let mut best: Option<(usize, f64)> = None;
        for (i, p) in self.positions.iter().enumerate() {
            let d = (p - point).norm_squared();
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((i, d));
            }
        }
        best.and_then(|(i, _)| u32::try_from(i).ok())
    }

    /// Vertices reachable from `seed` through graph edges whose positions lie
    /// within `radius` of `center`. The seed itself is always included.
    #[must_use]
    pub fn vertices_within(&self, seed: u32, center: &Point3, radius: f64) -> Vec<u32> {
        if !self.contains(seed) {
            return Vec::new();
        }
        let mut visited = BTreeSet::from([seed]);
        let mut queue = VecDeque::from([seed]);
        let mut found = vec![seed];

        while let Some(curr) = queue.pop_front() {
            for &n in self.neighbors(curr) {
                if !visited.insert(n) {
                    continue;
                }
                if (self.positions[n as usize] - center).norm() <= radius {
                    found.push(n);
                    queue.push_back(n);
                }
            }
        }
        found.sort_unstable();
        found
    }
}
