use std::collections::{BTreeSet, HashMap};

use crate::math::Point3;
use crate::mesh::TriangleMesh;

/// Canonical key of a geometric edge.
///
/// Built from the quantized endpoint *positions*, sorted lexicographically, so
/// `EdgeKey::new(a, b) == EdgeKey::new(b, a)` and vertices duplicated at the
/// same position (seams, unindexed meshes) share their edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    lo: (i64, i64, i64),
    hi: (i64, i64, i64),
}

impl EdgeKey {
    /// Creates the key for the edge between two positions.
    #[must_use]
    pub fn new(a: &Point3, b: &Point3) -> Self {
        let (qa, qb) = (quantize(a), quantize(b));
        if qa <= qb {
            Self { lo: qa, hi: qb }
        } else {
            Self { lo: qb, hi: qa }
        }
    }

    /// Whether both endpoints quantize to the same point.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.lo == self.hi
    }
}

/// Quantizes a point to integer coordinates for hashing.
/// Fine enough to keep separate vertices apart, coarse enough to merge
/// coincident ones.
#[allow(clippy::cast_possible_truncation)]
fn quantize(p: &Point3) -> (i64, i64, i64) {
    const INV_GRID: f64 = 1e6;
    (
        (p.x * INV_GRID).round() as i64,
        (p.y * INV_GRID).round() as i64,
        (p.z * INV_GRID).round() as i64,
    )
}

/// Maps every geometric edge to the triangles that share it.
///
/// Must be rebuilt whenever the geometry changes; [`Self::is_built_from`]
/// detects an index that no longer matches its mesh.
#[derive(Debug, Clone, Default)]
pub struct EdgeTriangleIndex {
    edge_to_triangles: HashMap<EdgeKey, Vec<usize>>,
    triangle_edges: Vec<[EdgeKey; 3]>,
    vertex_count: usize,
}

impl EdgeTriangleIndex {
    /// Builds the index for every triangle of `mesh`.
    #[must_use]
    pub fn build(mesh: &TriangleMesh) -> Self {
        let mut edge_to_triangles: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
        let mut triangle_edges = Vec::with_capacity(mesh.triangle_count());

        for t in 0..mesh.triangle_count() {
            let keys = triangle_keys(mesh, t);
            for key in keys {
                let tris = edge_to_triangles.entry(key).or_default();
                if !tris.contains(&t) {
                    tris.push(t);
                }
            }
            triangle_edges.push(keys);
        }

        Self {
            edge_to_triangles,
            triangle_edges,
            vertex_count: mesh.vertex_count(),
        }
    }

    /// Number of distinct geometric edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_to_triangles.len()
    }

    /// Number of indexed triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangle_edges.len()
    }

    /// Triangles incident to the edge between two positions.
    #[must_use]
    pub fn triangles_for_edge(&self, a: &Point3, b: &Point3) -> &[usize] {
        self.triangles_for_key(&EdgeKey::new(a, b))
    }

    /// Triangles incident to an edge key.
    #[must_use]
    pub fn triangles_for_key(&self, key: &EdgeKey) -> &[usize] {
        self.edge_to_triangles.get(key).map_or(&[], Vec::as_slice)
    }

    /// Triangles sharing at least one edge with triangle `t`, excluding `t`.
    #[must_use]
    pub fn adjacent_triangles(&self, t: usize) -> BTreeSet<usize> {
        let Some(keys) = self.triangle_edges.get(t) else {
            return BTreeSet::new();
        };
        let mut adjacent: BTreeSet<usize> = keys
            .iter()
            .flat_map(|k| self.triangles_for_key(k).iter().copied())
            .collect();
        adjacent.remove(&t);
        adjacent
    }

    /// Edges with exactly one incident triangle.
    pub fn boundary_edges(&self) -> impl Iterator<Item = &EdgeKey> + '_ {
        self.edge_to_triangles
            .iter()
            .filter(|(_, tris)| tris.len() == 1)
            .map(|(key, _)| key)
    }

    /// Number of edges shared by more than two triangles.
    #[must_use]
    pub fn non_manifold_edge_count(&self) -> usize {
        self.edge_to_triangles
            .values()
            .filter(|tris| tris.len() > 2)
            .count()
    }

    /// Whether this index was built from geometry identical to `mesh`.
    ///
    /// Querying an index against a different mesh yields wrong adjacency, so
    /// callers check this before trusting lookups.
    #[must_use]
    pub fn is_built_from(&self, mesh: &TriangleMesh) -> bool {
        self.vertex_count == mesh.vertex_count()
            && self.triangle_edges.len() == mesh.triangle_count()
            && self
                .triangle_edges
                .iter()
                .enumerate()
                .all(|(t, keys)| *keys == triangle_keys(mesh, t))
    }
}

fn triangle_keys(mesh: &TriangleMesh, t: usize) -> [EdgeKey; 3] {
    let [a, b, c] = mesh.triangle_points(t);
    [EdgeKey::new(&a, &b), EdgeKey::new(&b, &c), EdgeKey::new(&c, &a)]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn key_is_order_independent() {
        let a = p(0.0, 1.0, 2.0);
        let b = p(3.0, -1.0, 0.5);
        assert_eq!(EdgeKey::new(&a, &b), EdgeKey::new(&b, &a));
        assert_ne!(EdgeKey::new(&a, &b), EdgeKey::new(&a, &p(3.0, -1.0, 0.6)));
        assert!(EdgeKey::new(&a, &a).is_degenerate());
    }

    #[test]
    fn interior_edges_have_two_triangles_boundary_edges_one() {
        let mesh = fixtures::grid(4, 3);
        let index = EdgeTriangleIndex::build(&mesh);

        let mut interior = 0;
        let mut boundary = 0;
        for t in 0..mesh.triangle_count() {
            for key in triangle_keys(&mesh, t) {
                match index.triangles_for_key(&key).len() {
                    1 => boundary += 1,
                    2 => interior += 1,
                    n => panic!("edge with {n} triangles"),
                }
            }
        }
        // 3x2 quads: perimeter of 10 unit edges.
        assert_eq!(boundary, 10);
        assert_eq!(index.boundary_edges().count(), 10);
        assert_eq!(index.non_manifold_edge_count(), 0);
        // Each interior edge is visited once from each side.
        assert_eq!(interior % 2, 0);
        assert_eq!(index.edge_count(), 10 + interior / 2);
    }

    #[test]
    fn disc_boundary_is_outer_ring() {
        let mesh = fixtures::disc(2, 12);
        let index = EdgeTriangleIndex::build(&mesh);
        assert_eq!(index.boundary_edges().count(), 12);
    }

    #[test]
    fn adjacent_triangles_excludes_self() {
        let mesh = fixtures::grid(3, 3);
        let index = EdgeTriangleIndex::build(&mesh);
        for t in 0..mesh.triangle_count() {
            let adj = index.adjacent_triangles(t);
            assert!(!adj.contains(&t));
            assert!(!adj.is_empty() && adj.len() <= 3);
        }
        assert!(index.adjacent_triangles(999).is_empty());
    }

    #[test]
    fn unindexed_mesh_shares_edges_by_position() {
        // Two triangles with duplicated vertices along the shared edge.
        let positions = [
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0,
        ];
        let mesh = TriangleMesh::from_buffers(&positions, None).unwrap();
        let index = EdgeTriangleIndex::build(&mesh);
        assert_eq!(
            index.triangles_for_edge(&p(1.0, 1.0, 0.0), &p(0.0, 0.0, 0.0)),
            &[0, 1]
        );
        assert_eq!(index.adjacent_triangles(0).into_iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn detects_stale_index() {
        let mesh = fixtures::grid(3, 3);
        let index = EdgeTriangleIndex::build(&mesh);
        assert!(index.is_built_from(&mesh));

        let mut moved = mesh.clone();
        moved.positions[4].z = 0.5;
        assert!(!index.is_built_from(&moved));
        assert!(!index.is_built_from(&fixtures::grid(4, 3)));
        assert!(EdgeTriangleIndex::build(&moved).is_built_from(&moved));
    }
}
