use serde::{Deserialize, Serialize};

use crate::math::Point3;
use crate::operations::region::RegionFill;
use crate::operations::search::SurfacePath;

/// Active interaction tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// Paint vertices under the brush.
    Spray,
    /// Place markers.
    Keypoint,
    /// Draw surface paths; closed loops are filled.
    Path,
    /// Camera navigation; picks are ignored.
    Pan,
    #[default]
    None,
}

/// A resolved surface pick from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickEvent {
    /// Hit point on the surface.
    pub point: Point3,
    /// Vertex the host already resolved, if any.
    pub vertex: Option<u32>,
}

impl PickEvent {
    /// A pick that still needs a nearest-vertex lookup.
    #[must_use]
    pub fn at(point: Point3) -> Self {
        Self {
            point,
            vertex: None,
        }
    }

    /// Attaches the vertex the host resolved.
    #[must_use]
    pub fn with_vertex(mut self, vertex: u32) -> Self {
        self.vertex = Some(vertex);
        self
    }
}

/// What a pick did.
#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    /// Nothing changed.
    Ignored,
    /// Vertices were colored in one undoable action.
    Painted { vertices: Vec<u32> },
    /// A keypoint was placed.
    KeypointAdded { position: Point3 },
    /// First vertex of a new path.
    PathStarted { vertex: u32 },
    /// A segment was appended to the path in progress.
    SegmentAdded { segment: SurfacePath },
    /// The path closed. `fill` is `None` when the loop encloses no area.
    LoopClosed {
        segment: SurfacePath,
        fill: Option<RegionFill>,
    },
}

/// Path being drawn with the path tool.
#[derive(Debug, Clone, PartialEq)]
pub struct PathDraft {
    /// First picked vertex.
    pub anchor: u32,
    /// Traced segments in drawing order.
    pub segments: Vec<SurfacePath>,
}

impl PathDraft {
    /// Starts a path at `anchor`.
    #[must_use]
    pub fn new(anchor: u32) -> Self {
        Self {
            anchor,
            segments: Vec::new(),
        }
    }

    /// Vertex the next segment starts from.
    #[must_use]
    pub fn last_vertex(&self) -> u32 {
        self.segments
            .last()
            .and_then(|s| s.vertices.last())
            .copied()
            .unwrap_or(self.anchor)
    }

    /// Vertices along all segments, without repeats at segment joints or the
    /// closing vertex.
    #[must_use]
    pub fn ring(&self) -> Vec<u32> {
        let mut ring: Vec<u32> = Vec::new();
        for &v in self.segments.iter().flat_map(|s| &s.vertices) {
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
