use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::error::{Result, SearchError};
use crate::math::{round_to, Point3};
use crate::topology::MeshGraph;

use super::{EdgeCost, SearchParams};

/// A* shortest path between two vertices of a [`MeshGraph`].
///
/// `g` follows [`SearchParams::edge_cost`]; the heuristic is the Euclidean
/// distance to the goal rounded to [`SearchParams::heuristic_decimals`]. The
/// open set is a min-heap ordered by `f` and then by insertion order, so equal
/// inputs always yield the same path.
pub struct FindPath {
    start: u32,
    goal: u32,
    params: SearchParams,
}

impl FindPath {
    /// Creates a new `FindPath` query with default search parameters.
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

    /// Runs the search, returning the vertex sequence from start to goal.
    ///
    /// `start == goal` yields `[start]`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::VertexOutOfRange` if either endpoint is not in
    /// the graph, and `SearchError::NoPathFound` if the goal is unreachable or
    /// the expansion cap is hit first.
    pub fn execute(&self, graph: &MeshGraph) -> Result<Vec<u32>> {
        graph.position(self.start)?;
        let goal_pos = graph.position(self.goal)?;
        if self.start == self.goal {
            return Ok(vec![self.start]);
        }

        let positions = graph.positions();
        let heuristic = |v: u32| -> f64 {
            round_to(
                (positions[v as usize] - goal_pos).norm(),
                self.params.heuristic_decimals,
            )
        };

        let n = graph.vertex_count();
        let mut g_score = vec![f64::INFINITY; n];
        let mut came_from: Vec<Option<u32>> = vec![None; n];
        let mut closed = vec![false; n];
        let mut open = BinaryHeap::new();
        let mut seq = 0u64;

        g_score[self.start as usize] = 0.0;
        open.push(OpenEntry {
            f: heuristic(self.start),
            seq,
            vertex: self.start,
        });

        let mut expansions = 0usize;
        while let Some(OpenEntry { vertex, .. }) = open.pop() {
            let vi = vertex as usize;
            if closed[vi] {
                continue;
            }
            if vertex == self.goal {
                debug!(start = self.start, goal = self.goal, expansions, "a* reached goal");
                return Ok(reconstruct(&came_from, self.goal));
            }
            if expansions >= self.params.max_expansions {
                break;
            }
            expansions += 1;
            closed[vi] = true;

            for &next in graph.neighbors(vertex) {
                let ni = next as usize;
                if closed[ni] {
                    continue;
                }
                let step = edge_cost(self.params.edge_cost, &positions[vi], &positions[ni]);
                let tentative = g_score[vi] + step;
                if tentative < g_score[ni] {
                    g_score[ni] = tentative;
                    came_from[ni] = Some(vertex);
                    seq += 1;
                    open.push(OpenEntry {
                        f: tentative + heuristic(next),
                        seq,
                        vertex: next,
                    });
                }
            }
        }

        Err(SearchError::NoPathFound {
            start: self.start,
            goal: self.goal,
            expansions,
        }
        .into())
    }
}

fn edge_cost(cost: EdgeCost, a: &Point3, b: &Point3) -> f64 {
    match cost {
        EdgeCost::Hops => 1.0,
        EdgeCost::Euclidean => (b - a).norm(),
    }
}

fn reconstruct(came_from: &[Option<u32>], goal: u32) -> Vec<u32> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(prev) = came_from[current as usize] {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Open-set entry. `BinaryHeap` is a max-heap, so the ordering is reversed:
/// the smallest `f` pops first, earlier insertions win ties.
#[derive(Debug)]
struct OpenEntry {
    f: f64,
    seq: u64,
    vertex: u32,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}
