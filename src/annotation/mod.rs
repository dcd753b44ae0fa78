mod classes;
mod color;
mod export;
mod history;
mod persistence;
mod store;

pub use color::{Color, ParseColorError};
pub use export::{AnnotationExport, ExportReport, ProblemExport, UNLABELLED};
pub use history::{Action, ActionKind, ActionLog, ChangeTarget, PaintChange, PaintState};
pub use store::{AnnotationStore, ModelState};

use serde::{Deserialize, Serialize};

use crate::math::Point3;

slotmap::new_key_type! {
    /// Unique identifier for a problem within a model.
    pub struct ProblemId;
}

slotmap::new_key_type! {
    /// Unique identifier for a class within a model.
    pub struct ClassId;
}

/// How a class is annotated on the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationType {
    Keypoint,
    Spray,
    Path,
    None,
}

/// Committed annotation data of a class, one shape per [`AnnotationType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnnotationPayload {
    /// Marker positions.
    Keypoint { points: Vec<Point3> },
    /// Labelled vertices.
    Spray { vertices: Vec<u32> },
    /// Filled vertices and the closed loops that produced them.
    Path {
        vertices: Vec<u32>,
        loops: Vec<Vec<u32>>,
    },
    None,
}

impl AnnotationPayload {
    /// Empty payload for a type.
    #[must_use]
    pub fn empty(annotation_type: AnnotationType) -> Self {
        match annotation_type {
            AnnotationType::Keypoint => Self::Keypoint { points: Vec::new() },
            AnnotationType::Spray => Self::Spray {
                vertices: Vec::new(),
            },
            AnnotationType::Path => Self::Path {
                vertices: Vec::new(),
                loops: Vec::new(),
            },
            AnnotationType::None => Self::None,
        }
    }

    /// Type this payload belongs to.
    #[must_use]
    pub fn annotation_type(&self) -> AnnotationType {
        match self {
            Self::Keypoint { .. } => AnnotationType::Keypoint,
            Self::Spray { .. } => AnnotationType::Spray,
            Self::Path { .. } => AnnotationType::Path,
            Self::None => AnnotationType::None,
        }
    }
}

/// A user-defined label class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassAnnotation {
    /// Owning problem.
    pub problem: ProblemId,
    pub name: String,
    pub color: Color,
    pub payload: AnnotationPayload,
    /// Whether this class is the one currently being annotated.
    pub is_annotating: bool,
}

impl ClassAnnotation {
    /// Type of the class, taken from its payload.
    #[must_use]
    pub fn annotation_type(&self) -> AnnotationType {
        self.payload.annotation_type()
    }
}

/// A labelling task grouping classes, e.g. "segmentation" or "landmarks".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub name: String,
    /// Classes in label order.
    pub classes: Vec<ClassId>,
}

/// A placed marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub position: Point3,
    pub color: Color,
}

/// A closed path loop drawn with the path tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedLoop {
    /// Loop vertices without the closing repeat.
    pub vertices: Vec<u32>,
    pub color: Color,
}
