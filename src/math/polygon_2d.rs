use serde::{Deserialize, Serialize};

use super::{Point2, Point3, Vector3, TOLERANCE};

/// Plane a 3D polygon is flattened onto before 2D polygon tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// Drop Z.
    #[default]
    Xy,
    /// Drop X.
    Yz,
    /// Drop Y.
    Zx,
}

impl Projection {
    /// Picks the projection whose dropped axis is the dominant component of
    /// the polygon's Newell normal, so the projected polygon has maximal area.
    #[must_use]
    pub fn dominant_for(points: &[Point3]) -> Self {
        let n = newell_normal(points);
        let (ax, ay, az) = (n.x.abs(), n.y.abs(), n.z.abs());
        if az >= ax && az >= ay {
            Self::Xy
        } else if ax >= ay {
            Self::Yz
        } else {
            Self::Zx
        }
    }

    /// Projects a 3D point into this plane's 2D coordinates.
    ///
    /// The axis pairs keep a right-handed orientation with respect to the
    /// dropped axis, so winding signs are consistent across projections.
    #[must_use]
    pub fn project(self, p: &Point3) -> Point2 {
        match self {
            Self::Xy => Point2::new(p.x, p.y),
            Self::Yz => Point2::new(p.y, p.z),
            Self::Zx => Point2::new(p.z, p.x),
        }
    }

    /// Projects a whole polygon.
    #[must_use]
    pub fn project_all(self, points: &[Point3]) -> Vec<Point2> {
        points.iter().map(|p| self.project(p)).collect()
    }
}

/// Newell's method polygon normal (not normalized).
#[must_use]
pub fn newell_normal(points: &[Point3]) -> Vector3 {
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

/// Computes the signed area of a 2D polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// 2D cross product of `(b - a)` and `(c - a)`.
///
/// Positive when `c` lies to the left of the directed line `a -> b`.
#[inline]
#[must_use]
pub fn orient_2d(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Even-odd (ray casting) point-in-polygon test.
///
/// Casts a ray towards +X and counts edge crossings. Points exactly on the
/// boundary may land on either side.
#[must_use]
pub fn point_in_polygon_2d(point: &Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y) {
            let dy = pj.y - pi.y;
            let x_cross = pi.x + (point.y - pi.y) * (pj.x - pi.x) / dy;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Removes consecutive duplicates (within [`TOLERANCE`]) and a closing point
/// equal to the first one.
#[must_use]
pub fn dedup_ring(points: &[Point3]) -> Vec<Point3> {
    let mut ring: Vec<Point3> = Vec::with_capacity(points.len());
    for p in points {
        if ring.last().is_some_and(|last| (last - p).norm() < TOLERANCE) {
            continue;
        }
        ring.push(*p);
    }
    while ring.len() > 1 && (ring[0] - ring[ring.len() - 1]).norm() < TOLERANCE {
        ring.pop();
    }
    ring
}
