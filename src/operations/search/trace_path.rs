use tracing::warn;

use crate::error::{MeshmarkError, Result};
use crate::topology::MeshGraph;

use super::{DirectConnection, FindPath, PathMethod, SearchParams, SurfacePath};

/// Traces a user path segment between two picked vertices.
///
/// Tries A* first. When it fails or yields fewer than two vertices, falls
/// back to [`DirectConnection`], and finally to the bare `[start, goal]`
/// segment. Search failures never surface as errors.
pub struct TracePath {
    start: u32,
    goal: u32,
    params: SearchParams,
}

impl TracePath {
    /// Creates a new `TracePath` operation with default search parameters.
    #[must_use]
    pub fn new(start: u32, goal: u32) -> Self {
        Self {
            start,
            goal,
            params: SearchParams::default(),
        }
    }

    /// Sets custom search parameters.
    #[must_use]
    pub fn with_params(mut self, params: SearchParams) -> Self {
        self.params = params;
        self
    }

    /// Executes the trace.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::VertexOutOfRange` if either endpoint is not in
    /// the graph.
    pub fn execute(&self, graph: &MeshGraph) -> Result<SurfacePath> {
        if self.start == self.goal {
            graph.position(self.start)?;
            return to_surface_path(graph, vec![self.start], PathMethod::AStar);
        }

        match FindPath::new(self.start, self.goal)
            .with_params(self.params)
            .execute(graph)
        {
            Ok(vertices) if vertices.len() >= 2 => {
                return to_surface_path(graph, vertices, PathMethod::AStar);
            }
            Ok(_) => {}
            Err(MeshmarkError::Search(err)) => {
                warn!(%err, "a* failed, falling back to direct connection");
            }
            Err(err) => return Err(err),
        }

        let direct = DirectConnection::new(self.start, self.goal, self.params.interpolation_steps)
            .execute(graph)?;
        if direct.len() >= 2 {
            return to_surface_path(graph, direct, PathMethod::DirectConnection);
        }

        warn!(
            start = self.start,
            goal = self.goal,
            "direct connection degenerate, using straight segment"
        );
        to_surface_path(graph, vec![self.start, self.goal], PathMethod::StraightLine)
    }
}

fn to_surface_path(graph: &MeshGraph, vertices: Vec<u32>, method: PathMethod) -> Result<SurfacePath> {
    let points = vertices
        .iter()
        .map(|&v| graph.position(v))
        .collect::<Result<Vec<_>>>()?;
    Ok(SurfacePath {
        vertices,
        points,
        method,
    })
}
