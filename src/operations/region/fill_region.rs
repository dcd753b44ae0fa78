use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::math::polygon_2d::{
    dedup_ring, orient_2d, point_in_polygon_2d, signed_area_2d, Projection,
};
use crate::math::{Point2, Point3, TOLERANCE};
use crate::mesh::TriangleMesh;
use crate::operations::search::SurfacePath;
use crate::topology::{EdgeKey, EdgeTriangleIndex};

use super::{FillParams, FillProjection, RegionFill};

/// Finds the triangles enclosed by a closed loop of path segments.
///
/// Triangles along the loop are classified by which side of the path edge
/// their centroid lies on, relative to the loop's winding. The inner ones seed
/// an iterative flood fill over edge-adjacent triangles that keeps every
/// triangle whose centroid passes an even-odd point-in-polygon test.
pub struct FillRegion<'a> {
    paths: &'a [SurfacePath],
    params: FillParams,
}

impl<'a> FillRegion<'a> {
    /// Creates a new `FillRegion` operation with default parameters.
    #[must_use]
    pub fn new(paths: &'a [SurfacePath]) -> Self {
        Self {
            paths,
            params: FillParams::default(),
        }
    }

    /// Sets custom fill parameters.
    #[must_use]
    pub fn with_params(mut self, params: FillParams) -> Self {
        self.params = params;
        self
    }

    /// Executes the fill.
    ///
    /// Returns `None` when fewer than three segments are given, the loop has
    /// fewer than three distinct points or no area in the projection plane,
    /// `index` was not built from `mesh`, or no triangle ends up enclosed.
    #[must_use]
    pub fn execute(&self, mesh: &TriangleMesh, index: &EdgeTriangleIndex) -> Option<RegionFill> {
        if self.paths.len() < 3 {
            return None;
        }
        if !index.is_built_from(mesh) {
            warn!("edge index does not match mesh geometry, skipping fill");
            return None;
        }

        let all_points: Vec<Point3> = self
            .paths
            .iter()
            .flat_map(|p| p.points.iter().copied())
            .collect();
        let ring = dedup_ring(&all_points);
        if ring.len() < 3 {
            return None;
        }

        let projection = match self.params.projection {
            FillProjection::Xy => Projection::Xy,
            FillProjection::DominantAxis => Projection::dominant_for(&ring),
        };
        let polygon = projection.project_all(&ring);
        let area = signed_area_2d(&polygon);
        if area.abs() < TOLERANCE {
            debug!("loop has no area in the projection plane");
            return None;
        }
        let ccw = area > 0.0;

        let (inner, outer) = self.classify_boundary(mesh, index, projection, ccw);

        // Boundary triangles on the outer side block the flood.
        let mut visited: BTreeSet<usize> = inner.union(&outer).copied().collect();
        let mut triangles = inner.clone();
        let mut stack: Vec<usize> = inner.into_iter().collect();

        while let Some(t) = stack.pop() {
            for next in index.adjacent_triangles(t) {
                if !visited.insert(next) {
                    continue;
                }
                let c = projection.project(&mesh.triangle_centroid(next));
                if point_in_polygon_2d(&c, &polygon) {
                    triangles.insert(next);
                    stack.push(next);
                }
            }
        }

        if triangles.is_empty() {
            debug!("loop edges match no mesh edges, nothing to fill");
            return None;
        }

        let vertices = triangles
            .iter()
            .flat_map(|&t| mesh.triangles[t])
            .collect();
        debug!(
            triangles = triangles.len(),
            visited = visited.len(),
            "region fill complete"
        );

        Some(RegionFill {
            triangles,
            vertices,
            boundary: self.boundary_ring(),
        })
    }

    /// Splits the triangles incident to each path edge into the ones inside
    /// the loop and the ones outside.
    fn classify_boundary(
        &self,
        mesh: &TriangleMesh,
        index: &EdgeTriangleIndex,
        projection: Projection,
        ccw: bool,
    ) -> (BTreeSet<usize>, BTreeSet<usize>) {
        let mut inner = BTreeSet::new();
        let mut outer = BTreeSet::new();

        for path in self.paths {
            for pair in path.points.windows(2) {
                let key = EdgeKey::new(&pair[0], &pair[1]);
                if key.is_degenerate() {
                    continue;
                }
                let a: Point2 = projection.project(&pair[0]);
                let b: Point2 = projection.project(&pair[1]);
                for &t in index.triangles_for_key(&key) {
                    let c = projection.project(&mesh.triangle_centroid(t));
                    let side = orient_2d(&a, &b, &c);
                    let is_inner = if ccw { side > 0.0 } else { side < 0.0 };
                    if is_inner {
                        inner.insert(t);
                    } else {
                        outer.insert(t);
                    }
                }
            }
        }

        // A corner triangle can touch the loop from both sides; inside wins.
        let outer = outer.difference(&inner).copied().collect();
        (inner, outer)
    }

    fn boundary_ring(&self) -> Vec<u32> {
        let mut ring: Vec<u32> = Vec::new();
        for &v in self.paths.iter().flat_map(|p| p.vertices.iter()) {
            if ring.last() != Some(&v) {
                ring.push(v);
            }
        }
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        ring
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures::{self, disc_vertex, grid_vertex};
    use crate::operations::search::PathMethod;

    fn path(mesh: &TriangleMesh, vertices: Vec<u32>) -> SurfacePath {
        let points = vertices
            .iter()
            .map(|&v| mesh.positions[v as usize])
            .collect();
        SurfacePath {
            vertices,
            points,
            method: PathMethod::AStar,
        }
    }

    /// Square loop on a 6x6 grid around the quads from (1, 1) to (4, 4).
    fn grid_square(mesh: &TriangleMesh) -> Vec<SurfacePath> {
        let g = |i, j| grid_vertex(6, i, j);
        vec![
            path(mesh, vec![g(1, 1), g(2, 1), g(3, 1), g(4, 1)]),
            path(mesh, vec![g(4, 1), g(4, 2), g(4, 3), g(4, 4)]),
            path(mesh, vec![g(4, 4), g(3, 4), g(2, 4), g(1, 4)]),
            path(mesh, vec![g(1, 4), g(1, 3), g(1, 2), g(1, 1)]),
        ]
    }

    fn disc_loop(mesh: &TriangleMesh, segments: usize, ring: usize) -> Vec<SurfacePath> {
        let v = |k| disc_vertex(segments, ring, k);
        let third = segments / 3;
        vec![
            path(mesh, (0..=third).map(v).collect()),
            path(mesh, (third..=2 * third).map(v).collect()),
            path(mesh, (2 * third..=segments).map(v).collect()),
        ]
    }

    #[test]
    fn fills_grid_square_exactly() {
        let mesh = fixtures::grid(6, 6);
        let index = EdgeTriangleIndex::build(&mesh);
        let fill = FillRegion::new(&grid_square(&mesh))
            .execute(&mesh, &index)
            .unwrap();

        // 3x3 quads, two triangles each.
        assert_eq!(fill.triangles.len(), 18);
        assert_eq!(fill.vertices.len(), 16);
        for t in &fill.triangles {
            let c = mesh.triangle_centroid(*t);
            assert!(c.x > 1.0 && c.x < 4.0 && c.y > 1.0 && c.y < 4.0);
        }
        assert_eq!(fill.boundary.len(), 12);
    }

    #[test]
    fn winding_direction_does_not_matter() {
        let mesh = fixtures::grid(6, 6);
        let index = EdgeTriangleIndex::build(&mesh);
        let ccw = grid_square(&mesh);
        let cw: Vec<SurfacePath> = ccw
            .iter()
            .rev()
            .map(|p| path(&mesh, p.vertices.iter().rev().copied().collect()))
            .collect();

        let a = FillRegion::new(&ccw).execute(&mesh, &index).unwrap();
        let b = FillRegion::new(&cw).execute(&mesh, &index).unwrap();
        assert_eq!(a.triangles, b.triangles);
    }

    #[test]
    fn disc_fill_covers_inside_and_excludes_outside() {
        let segments = 18;
        let mesh = fixtures::disc(4, segments);
        let index = EdgeTriangleIndex::build(&mesh);
        let paths = disc_loop(&mesh, segments, 2);
        let fill = FillRegion::new(&paths).execute(&mesh, &index).unwrap();

        let polygon: Vec<Point2> = (0..segments)
            .map(|k| Projection::Xy.project(&mesh.positions[disc_vertex(segments, 2, k) as usize]))
            .collect();
        let inside = |p: &Point3| point_in_polygon_2d(&Projection::Xy.project(p), &polygon);

        for t in 0..mesh.triangle_count() {
            if inside(&mesh.triangle_centroid(t)) {
                assert!(fill.triangles.contains(&t), "inside triangle {t} missing");
            }
            let corners = mesh.triangle_points(t);
            let on_loop = |p: &Point3| {
                polygon
                    .iter()
                    .any(|q| (Projection::Xy.project(p) - q).norm() < 1e-9)
            };
            if corners.iter().all(|p| !inside(p) && !on_loop(p)) {
                assert!(!fill.triangles.contains(&t), "outside triangle {t} filled");
            }
        }
        // Fan around the center plus the band out to ring 2.
        assert_eq!(fill.triangles.len(), segments * 3);
        assert!(fill.vertices.contains(&0));
    }

    #[test]
    fn fewer_than_three_segments_fill_nothing() {
        let mesh = fixtures::grid(6, 6);
        let index = EdgeTriangleIndex::build(&mesh);
        let paths = grid_square(&mesh);
        assert!(FillRegion::new(&paths[..2]).execute(&mesh, &index).is_none());
    }

    #[test]
    fn collinear_loop_fills_nothing() {
        let mesh = fixtures::grid(6, 6);
        let index = EdgeTriangleIndex::build(&mesh);
        let g = |i| grid_vertex(6, i, 2);
        let paths = vec![
            path(&mesh, vec![g(0), g(1)]),
            path(&mesh, vec![g(1), g(2)]),
            path(&mesh, vec![g(2), g(0)]),
        ];
        assert!(FillRegion::new(&paths).execute(&mesh, &index).is_none());

        let stuck = vec![
            path(&mesh, vec![g(0)]),
            path(&mesh, vec![g(0)]),
            path(&mesh, vec![g(0)]),
        ];
        assert!(FillRegion::new(&stuck).execute(&mesh, &index).is_none());
    }

    #[test]
    fn loop_off_mesh_edges_fills_nothing() {
        // Corners sit on quad centers, so no path edge is a mesh edge.
        let mesh = fixtures::grid(6, 6);
        let index = EdgeTriangleIndex::build(&mesh);
        let seg = |a: (f64, f64), b: (f64, f64)| SurfacePath {
            vertices: vec![0, 1],
            points: vec![Point3::new(a.0, a.1, 0.0), Point3::new(b.0, b.1, 0.0)],
            method: PathMethod::DirectConnection,
        };
        let paths = vec![
            seg((0.5, 0.5), (3.5, 0.5)),
            seg((3.5, 0.5), (3.5, 3.5)),
            seg((3.5, 3.5), (0.5, 3.5)),
            seg((0.5, 3.5), (0.5, 0.5)),
        ];
        assert!(FillRegion::new(&paths).execute(&mesh, &index).is_none());
    }

    #[test]
    fn stale_index_fills_nothing() {
        let mesh = fixtures::grid(6, 6);
        let stale = EdgeTriangleIndex::build(&fixtures::grid(5, 5));
        assert!(FillRegion::new(&grid_square(&mesh))
            .execute(&mesh, &stale)
            .is_none());
    }

    #[test]
    fn dominant_axis_projection_handles_vertical_loops() {
        // The same grid stood up in the XZ plane.
        let mut mesh = fixtures::grid(6, 6);
        for p in &mut mesh.positions {
            p.z = p.y;
            p.y = 0.0;
        }
        let index = EdgeTriangleIndex::build(&mesh);
        let paths = grid_square(&mesh);

        assert!(FillRegion::new(&paths).execute(&mesh, &index).is_none());

        let params = FillParams {
            projection: FillProjection::DominantAxis,
        };
        let fill = FillRegion::new(&paths)
            .with_params(params)
            .execute(&mesh, &index)
            .unwrap();
        assert_eq!(fill.triangles.len(), 18);
    }
}
