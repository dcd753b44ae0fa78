use thiserror::Error;

/// Top-level error type for the meshmark annotation engine.
#[derive(Debug, Error)]
pub enum MeshmarkError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Errors raised while loading or querying mesh geometry.
///
/// All of these are fatal to the mesh load that produced them; the previously
/// loaded mesh stays in place.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("invalid geometry: position buffer length {0} is not a multiple of 3")]
    PositionBufferLength(usize),

    #[error("invalid geometry: index buffer length {0} is not a multiple of 3")]
    IndexBufferLength(usize),

    #[error("invalid geometry: index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("vertex {vertex} is out of range for {vertex_count} vertices")]
    VertexOutOfRange { vertex: u32, vertex_count: usize },

    #[error("no mesh is loaded")]
    NoMeshLoaded,
}

/// Errors raised by surface path search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no path found from vertex {start} to vertex {goal} after {expansions} expansions")]
    NoPathFound {
        start: u32,
        goal: u32,
        expansions: usize,
    },
}

/// Errors raised when an annotation store invariant would be violated.
///
/// These are rejected before any state is mutated.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("model {0} already has an open paint action")]
    ActionAlreadyOpen(String),

    #[error("model {0} has no open paint action")]
    NoOpenAction(String),

    #[error("class '{active}' is already being annotated")]
    ConcurrentAnnotation { active: String },

    #[error("class '{0}' is not being annotated")]
    NotAnnotating(String),

    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("color {color} is already used by class '{class}'")]
    ColorInUse { color: String, class: String },
}

/// Errors raised while saving or loading persisted annotation state.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("annotation json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("annotation file: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for results using [`MeshmarkError`].
pub type Result<T> = std::result::Result<T, MeshmarkError>;
