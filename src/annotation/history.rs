use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::math::Point3;

use super::{Color, Keypoint};

/// What kind of tool produced an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Vertex coloring: spray strokes and region fills.
    Spray,
    /// Keypoint placement.
    Point,
}

/// What a single change touched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChangeTarget {
    /// A mesh vertex color.
    Vertex(u32),
    /// A keypoint at a surface position.
    Keypoint(Point3),
}

/// One recorded change. `None` means unlabelled / absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintChange {
    pub target: ChangeTarget,
    pub previous: Option<Color>,
    pub new: Option<Color>,
}

/// A group of changes undone and redone as one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    pub changes: Vec<PaintChange>,
}

impl Action {
    /// Creates an action without changes.
    #[must_use]
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            changes: Vec::new(),
        }
    }
}

/// Vertex colors and keypoints of one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaintState {
    /// Labelled vertices. Vertices missing here are unlabelled.
    pub colors: BTreeMap<u32, Color>,
    /// Keypoints in placement order.
    pub keypoints: Vec<Keypoint>,
}

impl PaintState {
    /// Applies a change forwards (`new`) or backwards (`previous`).
    pub fn apply(&mut self, change: &PaintChange, forward: bool) {
        let (from, to) = if forward {
            (change.previous, change.new)
        } else {
            (change.new, change.previous)
        };
        match change.target {
            ChangeTarget::Vertex(v) => match to {
                Some(color) => {
                    self.colors.insert(v, color);
                }
                None => {
                    self.colors.remove(&v);
                }
            },
            ChangeTarget::Keypoint(position) => {
                if let Some(color) = from {
                    self.remove_keypoint(&position, color);
                }
                if let Some(color) = to {
                    self.keypoints.push(Keypoint { position, color });
                }
            }
        }
    }

    /// Current value of a change target.
    #[must_use]
    pub fn value_of(&self, target: &ChangeTarget) -> Option<Color> {
        match target {
            ChangeTarget::Vertex(v) => self.colors.get(v).copied(),
            // Placing a keypoint never overwrites another one.
            ChangeTarget::Keypoint(_) => None,
        }
    }

    fn remove_keypoint(&mut self, position: &Point3, color: Color) {
        if let Some(i) = self
            .keypoints
            .iter()
            .rposition(|k| k.color == color && k.position == *position)
        {
            self.keypoints.remove(i);
        }
    }
}

/// Linear undo/redo history.
///
/// `cursor` counts the applied actions: `0 <= cursor <= actions.len()`.
/// Pushing after an undo discards everything past the cursor.
#[derive(Debug, Clone, Default)]
pub struct ActionLog {
    actions: Vec<Action>,
    cursor: usize,
}

impl ActionLog {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded actions, including undone ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether nothing was ever recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of applied actions.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether an applied action is left to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Whether an undone action is left to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor < self.actions.len()
    }

    /// Appends an action, dropping the redo tail.
    pub fn push(&mut self, action: Action) {
        self.actions.truncate(self.cursor);
        self.actions.push(action);
        self.cursor = self.actions.len();
    }

    /// Moves the cursor back and returns the action to revert.
    pub fn step_back(&mut self) -> Option<&Action> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.actions.get(self.cursor)
    }

    /// Moves the cursor forward and returns the action to reapply.
    pub fn step_forward(&mut self) -> Option<&Action> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.actions.get(self.cursor - 1)
    }

    /// Applied actions, oldest first.
    #[must_use]
    pub fn applied(&self) -> &[Action] {
        &self.actions[..self.cursor]
    }

    /// Forgets every action and resets the cursor.
    pub fn clear(&mut self) {
        self.actions.clear();
        self.cursor = 0;
    }
}
