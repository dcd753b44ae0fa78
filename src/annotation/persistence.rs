//! Save/load of annotation state.
//!
//! Only the current state of each model is written. Undo history and open
//! actions are not persisted: a loaded model starts with an empty history
//! whose base is the saved state.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::info;

use crate::error::{PersistenceError, Result};
use crate::mesh::ModelId;

use super::{
    AnnotationStore, ClassAnnotation, ClassId, ClosedLoop, ModelState, PaintState, Problem,
    ProblemId,
};

#[derive(Serialize, Deserialize)]
struct PersistedModel {
    state: PaintState,
    problems: SlotMap<ProblemId, Problem>,
    classes: SlotMap<ClassId, ClassAnnotation>,
    #[serde(default)]
    loops: Vec<ClosedLoop>,
}

#[derive(Serialize, Deserialize)]
struct PersistedStore {
    models: BTreeMap<ModelId, PersistedModel>,
}

impl AnnotationStore {
    /// Serializes the current state of every model.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let persisted = PersistedStore {
            models: self
                .models
                .iter()
                .map(|(id, state)| {
                    (
                        id.clone(),
                        PersistedModel {
                            state: state.current_state(),
                            problems: state.problems.clone(),
                            classes: state.classes.clone(),
                            loops: state.loops.clone(),
                        },
                    )
                })
                .collect(),
        };
        serde_json::to_string_pretty(&persisted).map_err(|e| PersistenceError::Json(e).into())
    }

    /// Restores a store from [`AnnotationStore::to_json`] output.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Json` if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        let persisted: PersistedStore =
            serde_json::from_str(json).map_err(PersistenceError::Json)?;
        let models = persisted
            .models
            .into_iter()
            .map(|(id, m)| {
                let state = ModelState {
                    base: m.state.clone(),
                    live: m.state,
                    problems: m.problems,
                    classes: m.classes,
                    loops: m.loops,
                    ..ModelState::default()
                };
                (id, state)
            })
            .collect();
        Ok(Self { models })
    }

    /// Writes the store to a file.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if serialization or the write fails.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(PersistenceError::Io)?;
        info!(path = %path.display(), models = self.models.len(), "annotations saved");
        Ok(())
    }

    /// Reads a store from a file.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the file cannot be read or parsed.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(PersistenceError::Io)?;
        let store = Self::from_json(&json)?;
        info!(path = %path.display(), models = store.models.len(), "annotations loaded");
        Ok(store)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::annotation::{ActionKind, AnnotationType, ChangeTarget, Color};
    use crate::error::MeshmarkError;
    use crate::math::Point3;

    fn populated() -> (AnnotationStore, ModelId, ClassId) {
        let model = ModelId::from_byte_len(2048);
        let mut store = AnnotationStore::new();
        let problem = store.add_problem(&model, "segmentation");
        let class = store
            .add_class(&model, problem, "teeth", AnnotationType::Spray, Color::RED)
            .unwrap();
        store
            .commit_action(
                &model,
                ActionKind::Spray,
                [1, 2].map(|v| (ChangeTarget::Vertex(v), Color::RED)),
            )
            .unwrap();
        store
            .commit_action(
                &model,
                ActionKind::Point,
                [(ChangeTarget::Keypoint(Point3::new(1.0, 1.0, 0.0)), Color::WHITE)],
            )
            .unwrap();
        store.record_loop(&model, vec![1, 2, 3], Color::RED);
        (store, model, class)
    }

    #[test]
    fn json_restores_state_without_history() {
        let (store, model, class) = populated();
        let restored = AnnotationStore::from_json(&store.to_json().unwrap()).unwrap();

        assert_eq!(restored.current_state(&model), store.current_state(&model));
        let state = restored.model(&model).unwrap();
        assert!(state.log().is_empty());
        assert_eq!(state.loops().len(), 1);
        assert_eq!(state.class(class).unwrap().name, "teeth");
    }

    #[test]
    fn restored_classes_keep_their_ids() {
        let (store, model, class) = populated();
        let mut restored = AnnotationStore::from_json(&store.to_json().unwrap()).unwrap();
        restored.begin_class_annotation(&model, class).unwrap();
        restored.finish_class_annotation(&model, class).unwrap();
        assert!(restored.model(&model).unwrap().class(class).is_some());
    }

    #[test]
    fn file_round_trip() {
        let (store, model, _) = populated();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotations.json");
        store.save_to_path(&path).unwrap();

        let restored = AnnotationStore::load_from_path(&path).unwrap();
        assert_eq!(restored.current_state(&model), store.current_state(&model));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AnnotationStore::load_from_path(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(
            err,
            MeshmarkError::Persistence(PersistenceError::Io(_))
        ));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = AnnotationStore::from_json("{\"models\": 3}").unwrap_err();
        assert!(matches!(
            err,
            MeshmarkError::Persistence(PersistenceError::Json(_))
        ));
    }
}
