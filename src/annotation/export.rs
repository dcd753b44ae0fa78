use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PersistenceError, Result};
use crate::mesh::ModelId;

use super::{AnnotationStore, AnnotationType, Color};

/// Label index of vertices no class claims.
pub const UNLABELLED: i32 = -1;

/// Annotation export document of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationExport {
    pub filename: String,
    /// Problems keyed by name.
    pub problems: BTreeMap<String, ProblemExport>,
}

/// Labelled vertices of one problem.
///
/// `point_labels` lists every vertex that carries a color, ascending.
/// `labels` runs parallel to it with the label index of the problem's class
/// owning that color, or `-1` when no class of this problem does. Both are
/// empty when nothing is labelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemExport {
    /// Label index (as a string) to class name, including `"-1": "unlabelled"`.
    pub label_mapping: BTreeMap<String, String>,
    /// Indices of labelled vertices.
    pub point_labels: Vec<u32>,
    /// Label of each entry of `point_labels`.
    pub labels: Vec<i32>,
    /// Closed path loops of the problem's path classes.
    pub loops: Vec<Vec<u32>>,
}

/// Export document plus what the caller may want to confirm first.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub document: AnnotationExport,
    /// Vertices without any color.
    pub unlabelled_vertices: usize,
}

impl AnnotationExport {
    /// Serializes the document as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Json` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PersistenceError::Json(e).into())
    }
}

impl AnnotationStore {
    /// Builds the export document of a model with `vertex_count` vertices.
    ///
    /// Classes are labelled `0..n` in problem order. A labelled vertex takes
    /// the label of the spray or path class whose color it carries; class
    /// colors are unique per model, so the owner is unambiguous.
    #[must_use]
    pub fn export(&self, model: &ModelId, filename: &str, vertex_count: usize) -> ExportReport {
        let mut problems = BTreeMap::new();
        let mut unlabelled_vertices = vertex_count;

        if let Some(state) = self.model(model) {
            let labelled: Vec<(u32, Color)> = state
                .colors()
                .iter()
                .filter(|(&v, _)| (v as usize) < vertex_count)
                .map(|(&v, &c)| (v, c))
                .collect();
            unlabelled_vertices = vertex_count - labelled.len();

            for (_, problem) in state.problems() {
                let mut label_mapping = BTreeMap::new();
                label_mapping.insert(UNLABELLED.to_string(), "unlabelled".to_owned());
                let mut owners: BTreeMap<Color, i32> = BTreeMap::new();
                let mut loops = Vec::new();

                let classes = problem.classes.iter().filter_map(|&id| state.class(id));
                for (label, class) in classes.enumerate() {
                    let Ok(label) = i32::try_from(label) else {
                        warn!(%model, problem = %problem.name, "too many classes to label");
                        break;
                    };
                    label_mapping.insert(label.to_string(), class.name.clone());
                    match class.annotation_type() {
                        AnnotationType::Spray => {
                            owners.insert(class.color, label);
                        }
                        AnnotationType::Path => {
                            owners.insert(class.color, label);
                            loops.extend(
                                state
                                    .loops()
                                    .iter()
                                    .filter(|l| l.color == class.color)
                                    .map(|l| l.vertices.clone()),
                            );
                        }
                        AnnotationType::Keypoint | AnnotationType::None => {}
                    }
                }

                let (point_labels, labels): (Vec<u32>, Vec<i32>) = labelled
                    .iter()
                    .map(|(v, c)| (*v, owners.get(c).copied().unwrap_or(UNLABELLED)))
                    .unzip();

                problems.insert(
                    problem.name.clone(),
                    ProblemExport {
                        label_mapping,
                        point_labels,
                        labels,
                        loops,
                    },
                );
            }
        }

        info!(%model, problems = problems.len(), unlabelled_vertices, "export built");
        ExportReport {
            document: AnnotationExport {
                filename: filename.to_owned(),
                problems,
            },
            unlabelled_vertices,
        }
    }
}
