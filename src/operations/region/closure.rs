use crate::math::Point3;
use crate::operations::search::SurfacePath;

/// Distance below which two path points count as the same point.
pub const CLOSURE_TOLERANCE: f64 = 0.001;

/// Decides whether accumulated path segments form a closed loop.
///
/// Needs at least three segments. The loop is closed when the very first
/// point is within tolerance of either the last point or the start of the
/// newest segment.
pub struct IsClosed {
    tolerance: f64,
}

impl Default for IsClosed {
    fn default() -> Self {
        Self::new()
    }
}

impl IsClosed {
    /// Creates a new `IsClosed` query with [`CLOSURE_TOLERANCE`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            tolerance: CLOSURE_TOLERANCE,
        }
    }

    /// Sets a custom tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Executes the query.
    #[must_use]
    pub fn execute(&self, paths: &[SurfacePath]) -> bool {
        if paths.len() < 3 {
            return false;
        }
        let Some(first) = paths.first().and_then(SurfacePath::start_point) else {
            return false;
        };
        let Some(newest) = paths.last() else {
            return false;
        };

        let near = |p: Option<&Point3>| {
            p.is_some_and(|p| (p - first).norm() < self.tolerance)
        };
        near(newest.end_point()) || near(newest.start_point())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::search::PathMethod;

    fn seg(a: (f64, f64), b: (f64, f64)) -> SurfacePath {
        SurfacePath {
            vertices: vec![0, 1],
            points: vec![Point3::new(a.0, a.1, 0.0), Point3::new(b.0, b.1, 0.0)],
            method: PathMethod::AStar,
        }
    }

    #[test]
    fn needs_three_segments() {
        let two = vec![seg((0.0, 0.0), (1.0, 0.0)), seg((1.0, 0.0), (0.0, 0.0))];
        assert!(!IsClosed::new().execute(&two));
        assert!(!IsClosed::new().execute(&[]));
    }

    #[test]
    fn closed_when_last_meets_first() {
        let tri = vec![
            seg((0.0, 0.0), (1.0, 0.0)),
            seg((1.0, 0.0), (0.0, 1.0)),
            seg((0.0, 1.0), (0.0005, 0.0)),
        ];
        assert!(IsClosed::new().execute(&tri));
    }

    #[test]
    fn open_when_gap_exceeds_tolerance() {
        let tri = vec![
            seg((0.0, 0.0), (1.0, 0.0)),
            seg((1.0, 0.0), (0.0, 1.0)),
            seg((0.0, 1.0), (0.01, 0.0)),
        ];
        assert!(!IsClosed::new().execute(&tri));
        assert!(IsClosed::new().with_tolerance(0.1).execute(&tri));
    }

    #[test]
    fn closed_when_newest_segment_starts_at_first_point() {
        let paths = vec![
            seg((0.0, 0.0), (1.0, 0.0)),
            seg((1.0, 0.0), (1.0, 1.0)),
            seg((0.0, 0.0), (0.0, 1.0)),
        ];
        assert!(IsClosed::new().execute(&paths));
    }
}
