use crate::error::Result;
use crate::math::Point3;
use crate::topology::MeshGraph;

/// Approximate path between two vertices: samples the straight segment
/// between their positions and snaps every sample to its nearest vertex.
///
/// Consecutive duplicate snaps are collapsed, so the result may contain a
/// single vertex when start and goal snap together.
pub struct DirectConnection {
    start: u32,
    goal: u32,
    steps: usize,
}

impl DirectConnection {
    /// Creates a new `DirectConnection` with `steps` interpolation intervals.
    #[must_use]
    pub fn new(start: u32, goal: u32, steps: usize) -> Self {
        Self {
            start,
            goal,
            steps: steps.max(1),
        }
    }

    /// Executes the interpolation.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::VertexOutOfRange` if either endpoint is not in
    /// the graph.
    pub fn execute(&self, graph: &MeshGraph) -> Result<Vec<u32>> {
        let a = graph.position(self.start)?;
        let b = graph.position(self.goal)?;

        let mut path: Vec<u32> = Vec::with_capacity(self.steps + 1);
        for i in 0..=self.steps {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f64 / self.steps as f64;
            let sample = Point3::from(a.coords.lerp(&b.coords, t));
            let Some(v) = graph.nearest_vertex(&sample) else {
                continue;
            };
            if path.last() != Some(&v) {
                path.push(v);
            }
        }
        Ok(path)
    }
}
