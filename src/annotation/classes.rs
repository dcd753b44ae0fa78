use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::mesh::ModelId;

use super::{
    AnnotationPayload, AnnotationStore, AnnotationType, ClassAnnotation, ClassId, Color,
    ModelState, Problem, ProblemId,
};

impl AnnotationStore {
    /// Adds an empty problem to a model.
    pub fn add_problem(&mut self, model: &ModelId, name: impl Into<String>) -> ProblemId {
        let name = name.into();
        debug!(%model, %name, "adding problem");
        self.model_mut(model).problems.insert(Problem {
            name,
            classes: Vec::new(),
        })
    }

    /// Removes a problem together with all of its classes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EntityNotFound` if the problem does not exist, or
    /// any error of [`AnnotationStore::remove_class`].
    pub fn remove_problem(&mut self, model: &ModelId, problem: ProblemId) -> Result<Problem> {
        let classes = self
            .model(model)
            .and_then(|state| state.problems.get(problem))
            .map(|p| p.classes.clone())
            .ok_or_else(|| StoreError::EntityNotFound(format!("problem in {model}")))?;
        for class in classes {
            self.remove_class(model, class)?;
        }
        self.model_mut(model)
            .problems
            .remove(problem)
            .ok_or_else(|| StoreError::EntityNotFound(format!("problem in {model}")).into())
    }

    /// Adds a class to a problem. The class starts idle with an empty payload.
    ///
    /// Vertex colors and keypoints are attributed to classes by color, so a
    /// color identifies at most one class per model.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EntityNotFound` if the problem does not exist and
    /// `StoreError::ColorInUse` if another class of the model has `color`.
    pub fn add_class(
        &mut self,
        model: &ModelId,
        problem: ProblemId,
        name: impl Into<String>,
        annotation_type: AnnotationType,
        color: Color,
    ) -> Result<ClassId> {
        let state = self.model_mut(model);
        if !state.problems.contains_key(problem) {
            return Err(StoreError::EntityNotFound(format!("problem in {model}")).into());
        }
        if let Some((_, owner)) = state.classes.iter().find(|(_, c)| c.color == color) {
            warn!(%model, %color, owner = %owner.name, "rejected duplicate class color");
            return Err(StoreError::ColorInUse {
                color: color.to_string(),
                class: owner.name.clone(),
            }
            .into());
        }
        let class = state.classes.insert(ClassAnnotation {
            problem,
            name: name.into(),
            color,
            payload: AnnotationPayload::empty(annotation_type),
            is_annotating: false,
        });
        if let Some(p) = state.problems.get_mut(problem) {
            p.classes.push(class);
        }
        Ok(class)
    }

    /// Removes a class, erasing its keypoints and vertex colors from the model.
    ///
    /// The history is folded into the base state afterwards, so the removal
    /// itself cannot be undone.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EntityNotFound` for an unknown class and
    /// `StoreError::ActionAlreadyOpen` while a paint action is open.
    pub fn remove_class(&mut self, model: &ModelId, class: ClassId) -> Result<ClassAnnotation> {
        let state = self.model_mut(model);
        if state.open.is_some() {
            return Err(StoreError::ActionAlreadyOpen(model.to_string()).into());
        }
        let removed = state
            .classes
            .remove(class)
            .ok_or_else(|| StoreError::EntityNotFound(format!("class in {model}")))?;
        if let Some(p) = state.problems.get_mut(removed.problem) {
            p.classes.retain(|&c| c != class);
        }

        erase_class_marks(state, &removed);
        state.reconcile();
        info!(%model, class = %removed.name, "class removed");
        Ok(removed)
    }

    /// Starts annotating a class.
    ///
    /// Only one class across all models may be annotating at a time. Beginning
    /// the class that is already active is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EntityNotFound` for an unknown class and
    /// `StoreError::ConcurrentAnnotation` if another class is active.
    pub fn begin_class_annotation(&mut self, model: &ModelId, class: ClassId) -> Result<()> {
        if !self
            .model(model)
            .is_some_and(|state| state.classes.contains_key(class))
        {
            return Err(StoreError::EntityNotFound(format!("class in {model}")).into());
        }
        if let Some((active_model, active)) = self.active_class() {
            if active_model == model && active == class {
                return Ok(());
            }
            let name = self
                .model(active_model)
                .and_then(|state| state.classes.get(active))
                .map(|c| c.name.clone())
                .unwrap_or_default();
            warn!(%model, active = %name, "rejected concurrent class annotation");
            return Err(StoreError::ConcurrentAnnotation { active: name }.into());
        }

        if let Some(c) = self.model_mut(model).classes.get_mut(class) {
            c.is_annotating = true;
            info!(%model, class = %c.name, "class annotation started");
        }
        Ok(())
    }

    /// Finishes annotating a class.
    ///
    /// The live marks in the class color become the class payload and the
    /// history is folded into the base state.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EntityNotFound` for an unknown class,
    /// `StoreError::NotAnnotating` if the class is idle and
    /// `StoreError::ActionAlreadyOpen` while a paint action is open.
    pub fn finish_class_annotation(&mut self, model: &ModelId, class: ClassId) -> Result<()> {
        let state = self.model_mut(model);
        let Some(annotation) = state.classes.get(class) else {
            return Err(StoreError::EntityNotFound(format!("class in {model}")).into());
        };
        if !annotation.is_annotating {
            return Err(StoreError::NotAnnotating(annotation.name.clone()).into());
        }
        if state.open.is_some() {
            return Err(StoreError::ActionAlreadyOpen(model.to_string()).into());
        }

        let payload = collect_payload(state, annotation.annotation_type(), annotation.color);
        if let Some(c) = state.classes.get_mut(class) {
            c.payload = payload;
            c.is_annotating = false;
            info!(%model, class = %c.name, "class annotation finished");
        }
        state.reconcile();
        Ok(())
    }

    /// The class currently being annotated, if any.
    #[must_use]
    pub fn active_class(&self) -> Option<(&ModelId, ClassId)> {
        self.models.iter().find_map(|(model, state)| {
            state
                .classes
                .iter()
                .find(|(_, c)| c.is_annotating)
                .map(|(id, _)| (model, id))
        })
    }

    /// Classes of a problem in label order.
    pub fn classes(
        &self,
        model: &ModelId,
        problem: ProblemId,
    ) -> impl Iterator<Item = (ClassId, &ClassAnnotation)> {
        let state = self.model(model);
        state
            .and_then(|s| s.problems.get(problem))
            .into_iter()
            .flat_map(|p| p.classes.iter())
            .filter_map(move |&id| state.and_then(|s| s.classes.get(id)).map(|c| (id, c)))
    }
}

/// Erases the marks a removed class still owns: vertices and keypoints that
/// carry its color. Vertices repainted by another class keep that class's
/// color; vertices the removed class painted over another class's committed
/// payload fall back to that class's color.
fn erase_class_marks(state: &mut ModelState, class: &ClassAnnotation) {
    let color = class.color;
    let owned: Vec<u32> = state
        .live
        .colors
        .iter()
        .filter(|(_, c)| **c == color)
        .map(|(&v, _)| v)
        .collect();
    for v in owned {
        let fallback = state
            .classes
            .values()
            .find(|c| match &c.payload {
                AnnotationPayload::Spray { vertices }
                | AnnotationPayload::Path { vertices, .. } => vertices.contains(&v),
                AnnotationPayload::Keypoint { .. } | AnnotationPayload::None => false,
            })
            .map(|c| c.color);
        match fallback {
            Some(other) => {
                state.live.colors.insert(v, other);
            }
            None => {
                state.live.colors.remove(&v);
            }
        }
    }
    state.live.keypoints.retain(|k| k.color != color);
    if matches!(class.payload, AnnotationPayload::Path { .. }) {
        state.loops.retain(|l| l.color != color);
    }
}

fn collect_payload(
    state: &ModelState,
    annotation_type: AnnotationType,
    color: Color,
) -> AnnotationPayload {
    let painted = || {
        state
            .live
            .colors
            .iter()
            .filter(|(_, c)| **c == color)
            .map(|(&v, _)| v)
            .collect::<Vec<_>>()
    };
    match annotation_type {
        AnnotationType::Keypoint => AnnotationPayload::Keypoint {
            points: state
                .live
                .keypoints
                .iter()
                .filter(|k| k.color == color)
                .map(|k| k.position)
                .collect(),
        },
        AnnotationType::Spray => AnnotationPayload::Spray {
            vertices: painted(),
        },
        AnnotationType::Path => AnnotationPayload::Path {
            vertices: painted(),
            loops: state
                .loops
                .iter()
                .filter(|l| l.color == color)
                .map(|l| l.vertices.clone())
                .collect(),
        },
        AnnotationType::None => AnnotationPayload::None,
    }
}
