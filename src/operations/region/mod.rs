mod closure;
mod fill_region;

pub use closure::{IsClosed, CLOSURE_TOLERANCE};
pub use fill_region::FillRegion;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Plane a closed loop is flattened onto for winding and containment tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillProjection {
    /// Always project onto XY.
    #[default]
    Xy,
    /// Project onto the axis plane best aligned with the loop.
    DominantAxis,
}

/// Parameters controlling region fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FillParams {
    /// Projection used for the polygon tests.
    pub projection: FillProjection,
}

/// Triangles enclosed by a closed path loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionFill {
    /// Enclosed triangle ordinals.
    pub triangles: BTreeSet<usize>,
    /// Every vertex of every enclosed triangle.
    pub vertices: BTreeSet<u32>,
    /// The loop itself as a vertex ring, without the closing repeat.
    pub boundary: Vec<u32>,
}
