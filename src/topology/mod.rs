mod edge_index;
mod mesh_graph;

pub use edge_index::{EdgeKey, EdgeTriangleIndex};
pub use mesh_graph::MeshGraph;

use std::sync::Arc;

use crate::error::Result;
use crate::mesh::{ModelId, TriangleMesh};

/// Immutable navigation structures derived from one loaded mesh.
///
/// Shared through `Arc` so a background loader may build it and hand it to
/// the single-threaded orchestrator; nothing mutates it after construction.
#[derive(Debug, Clone)]
pub struct MeshTopology {
    /// Model the geometry belongs to.
    pub model: ModelId,
    /// The geometry itself.
    pub mesh: Arc<TriangleMesh>,
    /// Vertex adjacency.
    pub graph: Arc<MeshGraph>,
    /// Edge to triangle lookup.
    pub edges: Arc<EdgeTriangleIndex>,
}

impl MeshTopology {
    /// Builds graph and edge index for `mesh`.
    #[must_use]
    pub fn build(model: ModelId, mesh: TriangleMesh) -> Self {
        let graph = MeshGraph::build(&mesh);
        let edges = EdgeTriangleIndex::build(&mesh);
        Self {
            model,
            mesh: Arc::new(mesh),
            graph: Arc::new(graph),
            edges: Arc::new(edges),
        }
    }

    /// Validates host buffers and builds the topology.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError` if the buffers are malformed.
    pub fn from_buffers(model: ModelId, positions: &[f32], indices: Option<&[u32]>) -> Result<Self> {
        Ok(Self::build(model, TriangleMesh::from_buffers(positions, indices)?))
    }
}
