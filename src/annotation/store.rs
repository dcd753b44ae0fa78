use std::collections::BTreeMap;

use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::mesh::ModelId;

use super::{
    Action, ActionKind, ActionLog, ChangeTarget, ClassAnnotation, ClassId, ClosedLoop, Color,
    Keypoint, PaintChange, PaintState, Problem, ProblemId,
};

/// Annotation state of one model.
#[derive(Debug, Clone, Default)]
pub struct ModelState {
    /// State the history starts from (last load or reconcile).
    pub(super) base: PaintState,
    /// Base plus applied actions plus the open action.
    pub(super) live: PaintState,
    pub(super) log: ActionLog,
    pub(super) open: Option<Action>,
    pub(super) problems: SlotMap<ProblemId, Problem>,
    pub(super) classes: SlotMap<ClassId, ClassAnnotation>,
    pub(super) loops: Vec<ClosedLoop>,
}

impl ModelState {
    /// Live vertex colors.
    #[must_use]
    pub fn colors(&self) -> &BTreeMap<u32, Color> {
        &self.live.colors
    }

    /// Live keypoints.
    #[must_use]
    pub fn keypoints(&self) -> &[Keypoint] {
        &self.live.keypoints
    }

    /// Closed loops drawn so far.
    #[must_use]
    pub fn loops(&self) -> &[ClosedLoop] {
        &self.loops
    }

    /// Undo history.
    #[must_use]
    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    /// Whether a paint action is open.
    #[must_use]
    pub fn has_open_action(&self) -> bool {
        self.open.is_some()
    }

    /// Problems of this model.
    pub fn problems(&self) -> impl Iterator<Item = (ProblemId, &Problem)> {
        self.problems.iter()
    }

    /// Problem by id.
    #[must_use]
    pub fn problem(&self, id: ProblemId) -> Option<&Problem> {
        self.problems.get(id)
    }

    /// Class by id.
    #[must_use]
    pub fn class(&self, id: ClassId) -> Option<&ClassAnnotation> {
        self.classes.get(id)
    }

    /// Base state replayed through every applied action.
    #[must_use]
    pub fn current_state(&self) -> PaintState {
        let mut state = self.base.clone();
        for action in self.log.applied() {
            for change in &action.changes {
                state.apply(change, true);
            }
        }
        state
    }

    /// Makes the live state the new base and forgets the history.
    pub(super) fn reconcile(&mut self) {
        self.base = self.live.clone();
        self.log.clear();
    }
}

/// Owner of all per-model annotation state.
///
/// Every operation is scoped to a [`ModelId`]; the state of an unknown model is
/// created on first mutable reference. At most one paint action may be open
/// per model, and actions are undone and redone in strict stack order.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    pub(super) models: BTreeMap<ModelId, ModelState>,
}

impl AnnotationStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a model, if it was ever referenced.
    #[must_use]
    pub fn model(&self, model: &ModelId) -> Option<&ModelState> {
        self.models.get(model)
    }

    /// State of a model, created empty on first use.
    pub fn model_mut(&mut self, model: &ModelId) -> &mut ModelState {
        self.models.entry(model.clone()).or_insert_with(|| {
            debug!(%model, "creating annotation state");
            ModelState::default()
        })
    }

    /// Ids of all known models.
    pub fn model_ids(&self) -> impl Iterator<Item = &ModelId> {
        self.models.keys()
    }

    /// Opens a new paint action.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ActionAlreadyOpen` if the model already has one.
    pub fn start_paint_action(&mut self, model: &ModelId, kind: ActionKind) -> Result<()> {
        let state = self.model_mut(model);
        if state.open.is_some() {
            warn!(%model, "rejected paint action: one is already open");
            return Err(StoreError::ActionAlreadyOpen(model.to_string()).into());
        }
        state.open = Some(Action::new(kind));
        Ok(())
    }

    /// Records a change in the open action and applies it to the live state.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoOpenAction` if no action is open.
    pub fn add_paint_change(
        &mut self,
        model: &ModelId,
        target: ChangeTarget,
        color: Color,
    ) -> Result<()> {
        let state = self.model_mut(model);
        let Some(open) = state.open.as_mut() else {
            return Err(StoreError::NoOpenAction(model.to_string()).into());
        };
        let change = PaintChange {
            target,
            previous: state.live.value_of(&target),
            new: Some(color),
        };
        state.live.apply(&change, true);
        open.changes.push(change);
        Ok(())
    }

    /// Closes the open action and appends it to the history.
    ///
    /// Actions without changes are dropped instead of recorded, so every undo
    /// step changes something. Returns whether the action was recorded.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoOpenAction` if no action is open.
    pub fn end_paint_action(&mut self, model: &ModelId) -> Result<bool> {
        let state = self.model_mut(model);
        let Some(action) = state.open.take() else {
            return Err(StoreError::NoOpenAction(model.to_string()).into());
        };
        if action.changes.is_empty() {
            debug!(%model, "dropping empty paint action");
            return Ok(false);
        }
        debug!(%model, kind = ?action.kind, changes = action.changes.len(), "paint action committed");
        state.log.push(action);
        Ok(true)
    }

    /// Discards the open action and reverts its live changes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoOpenAction` if no action is open.
    pub fn cancel_paint_action(&mut self, model: &ModelId) -> Result<()> {
        let state = self.model_mut(model);
        let Some(action) = state.open.take() else {
            return Err(StoreError::NoOpenAction(model.to_string()).into());
        };
        for change in action.changes.iter().rev() {
            state.live.apply(change, false);
        }
        Ok(())
    }

    /// Records one complete action: opens it, applies every change and closes
    /// it. Nothing is mutated if an action is already open.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ActionAlreadyOpen` if the model has an open action.
    pub fn commit_action<I>(&mut self, model: &ModelId, kind: ActionKind, changes: I) -> Result<bool>
    where
        I: IntoIterator<Item = (ChangeTarget, Color)>,
    {
        self.start_paint_action(model, kind)?;
        for (target, color) in changes {
            self.add_paint_change(model, target, color)?;
        }
        self.end_paint_action(model)
    }

    /// Reverts the latest applied action. Returns `false` at the start of the
    /// history or while an action is open.
    pub fn undo(&mut self, model: &ModelId) -> bool {
        let state = self.model_mut(model);
        if state.open.is_some() {
            return false;
        }
        let Some(action) = state.log.step_back() else {
            return false;
        };
        for change in action.changes.iter().rev() {
            state.live.apply(change, false);
        }
        true
    }

    /// Reapplies the next undone action. Returns `false` at the end of the
    /// history or while an action is open.
    pub fn redo(&mut self, model: &ModelId) -> bool {
        let state = self.model_mut(model);
        if state.open.is_some() {
            return false;
        }
        let Some(action) = state.log.step_forward() else {
            return false;
        };
        for change in &action.changes {
            state.live.apply(change, true);
        }
        true
    }

    /// Colors and keypoints derived from the base state and the applied
    /// history. Changes of an open action are not included.
    #[must_use]
    pub fn current_state(&self, model: &ModelId) -> PaintState {
        self.model(model)
            .map(ModelState::current_state)
            .unwrap_or_default()
    }

    /// Records a closed path loop.
    pub fn record_loop(&mut self, model: &ModelId, vertices: Vec<u32>, color: Color) {
        self.model_mut(model).loops.push(ClosedLoop { vertices, color });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::MeshmarkError;
    use crate::math::Point3;

    const BLUE: Color = Color::rgb(0, 0, 255);

    fn model() -> ModelId {
        ModelId::from_byte_len(100)
    }

    fn spray(store: &mut AnnotationStore, vertices: &[u32], color: Color) {
        store
            .commit_action(
                &model(),
                ActionKind::Spray,
                vertices.iter().map(|&v| (ChangeTarget::Vertex(v), color)),
            )
            .unwrap();
    }

    #[test]
    fn state_is_created_lazily() {
        let mut store = AnnotationStore::new();
        assert!(store.model(&model()).is_none());
        assert_eq!(store.current_state(&model()), PaintState::default());
        store.model_mut(&model());
        assert!(store.model(&model()).is_some());
    }

    #[test]
    fn second_open_action_is_rejected() {
        let mut store = AnnotationStore::new();
        store.start_paint_action(&model(), ActionKind::Spray).unwrap();
        let err = store
            .start_paint_action(&model(), ActionKind::Point)
            .unwrap_err();
        assert!(matches!(
            err,
            MeshmarkError::Store(StoreError::ActionAlreadyOpen(_))
        ));

        // Another model is unaffected.
        store
            .start_paint_action(&ModelId::new("other"), ActionKind::Spray)
            .unwrap();
    }

    #[test]
    fn changes_need_an_open_action() {
        let mut store = AnnotationStore::new();
        let err = store
            .add_paint_change(&model(), ChangeTarget::Vertex(0), Color::RED)
            .unwrap_err();
        assert!(matches!(err, MeshmarkError::Store(StoreError::NoOpenAction(_))));
        assert!(store.end_paint_action(&model()).is_err());
    }

    #[test]
    fn commit_is_rejected_without_mutation_while_open() {
        let mut store = AnnotationStore::new();
        store.start_paint_action(&model(), ActionKind::Spray).unwrap();
        let result = store.commit_action(
            &model(),
            ActionKind::Spray,
            [(ChangeTarget::Vertex(5), Color::RED)],
        );
        assert!(result.is_err());
        assert!(store.model(&model()).unwrap().colors().is_empty());
    }

    #[test]
    fn empty_actions_are_not_recorded() {
        let mut store = AnnotationStore::new();
        store.start_paint_action(&model(), ActionKind::Spray).unwrap();
        assert!(!store.end_paint_action(&model()).unwrap());
        assert_eq!(store.model(&model()).unwrap().log().len(), 0);
        assert!(!store.undo(&model()));
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut store = AnnotationStore::new();
        spray(&mut store, &[0, 1, 2], Color::RED);
        spray(&mut store, &[2, 3], BLUE);
        spray(&mut store, &[0, 3, 4], Color::WHITE);
        let final_state = store.model(&model()).unwrap().live.clone();

        for _ in 0..3 {
            assert!(store.undo(&model()));
        }
        assert!(!store.undo(&model()));
        assert!(store.model(&model()).unwrap().colors().is_empty());

        for _ in 0..3 {
            assert!(store.redo(&model()));
        }
        assert!(!store.redo(&model()));
        assert_eq!(store.model(&model()).unwrap().live, final_state);
        assert_eq!(store.model(&model()).unwrap().colors().get(&2), Some(&BLUE));
    }

    #[test]
    fn undo_restores_previous_color() {
        let mut store = AnnotationStore::new();
        spray(&mut store, &[7], Color::RED);
        spray(&mut store, &[7], BLUE);
        store.undo(&model());
        assert_eq!(
            store.model(&model()).unwrap().colors().get(&7),
            Some(&Color::RED)
        );
    }

    #[test]
    fn new_action_after_undo_discards_redo() {
        let mut store = AnnotationStore::new();
        spray(&mut store, &[0], Color::RED);
        spray(&mut store, &[1], Color::RED);
        store.undo(&model());
        spray(&mut store, &[2], BLUE);

        assert!(!store.redo(&model()));
        let colors = store.model(&model()).unwrap().colors();
        assert!(colors.contains_key(&0));
        assert!(!colors.contains_key(&1));
        assert!(colors.contains_key(&2));
    }

    #[test]
    fn current_state_matches_live_state() {
        let mut store = AnnotationStore::new();
        spray(&mut store, &[0, 1], Color::RED);
        store
            .commit_action(
                &model(),
                ActionKind::Point,
                [(ChangeTarget::Keypoint(Point3::new(0.5, 0.5, 0.0)), BLUE)],
            )
            .unwrap();
        spray(&mut store, &[1, 2], BLUE);
        store.undo(&model());

        let state = store.model(&model()).unwrap();
        assert_eq!(store.current_state(&model()), state.live);
        assert_eq!(state.keypoints().len(), 1);
    }

    #[test]
    fn open_action_is_excluded_from_current_state_and_can_be_cancelled() {
        let mut store = AnnotationStore::new();
        spray(&mut store, &[0], Color::RED);
        store.start_paint_action(&model(), ActionKind::Spray).unwrap();
        store
            .add_paint_change(&model(), ChangeTarget::Vertex(0), BLUE)
            .unwrap();
        store
            .add_paint_change(&model(), ChangeTarget::Vertex(1), BLUE)
            .unwrap();

        assert!(!store.undo(&model()));
        assert_eq!(
            store.current_state(&model()).colors.get(&0),
            Some(&Color::RED)
        );

        store.cancel_paint_action(&model()).unwrap();
        let state = store.model(&model()).unwrap();
        assert_eq!(state.colors().get(&0), Some(&Color::RED));
        assert!(!state.colors().contains_key(&1));
        assert_eq!(state.log().len(), 1);
    }

    #[test]
    fn keypoint_undo_removes_marker() {
        let mut store = AnnotationStore::new();
        let p = Point3::new(1.0, 0.0, 0.0);
        store
            .commit_action(&model(), ActionKind::Point, [(ChangeTarget::Keypoint(p), Color::RED)])
            .unwrap();
        assert_eq!(store.model(&model()).unwrap().keypoints().len(), 1);
        store.undo(&model());
        assert!(store.model(&model()).unwrap().keypoints().is_empty());
        store.redo(&model());
        assert_eq!(store.model(&model()).unwrap().keypoints()[0].position, p);
    }
}
