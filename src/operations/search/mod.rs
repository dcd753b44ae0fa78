mod direct_connection;
mod find_path;
mod trace_path;

pub use direct_connection::DirectConnection;
pub use find_path::FindPath;
pub use trace_path::TracePath;

use serde::{Deserialize, Serialize};

use crate::math::Point3;

/// How A* charges for crossing a graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeCost {
    /// Every edge costs 1: paths are shortest by hop count.
    #[default]
    Hops,
    /// Edges cost their Euclidean length: paths are geometrically shortest.
    Euclidean,
}

/// Parameters controlling surface path search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// A* gives up after this many node expansions.
    pub max_expansions: usize,
    /// Cost model for `g`.
    pub edge_cost: EdgeCost,
    /// Decimal places the heuristic is rounded to.
    pub heuristic_decimals: i32,
    /// Interpolation steps used by the direct-connection fallback.
    pub interpolation_steps: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            max_expansions: 10_000,
            edge_cost: EdgeCost::Hops,
            heuristic_decimals: 2,
            interpolation_steps: 100,
        }
    }
}

/// Which strategy produced a [`SurfacePath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMethod {
    /// A* over the mesh graph.
    AStar,
    /// Straight line interpolation snapped to nearest vertices.
    DirectConnection,
    /// Bare `[start, goal]` segment.
    StraightLine,
}

/// One traced segment of a user path, from one picked vertex to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfacePath {
    /// Visited vertices, start first.
    pub vertices: Vec<u32>,
    /// Positions of `vertices`.
    pub points: Vec<Point3>,
    /// Strategy that produced the path.
    pub method: PathMethod,
}

impl SurfacePath {
    /// First point of the path.
    #[must_use]
    pub fn start_point(&self) -> Option<&Point3> {
        self.points.first()
    }

    /// Last point of the path.
    #[must_use]
    pub fn end_point(&self) -> Option<&Point3> {
        self.points.last()
    }

    /// Number of edges traversed.
    #[must_use]
    pub fn hop_count(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }
}
