//! Undo/redo over whole-scene snapshots.
//!
//! Every structural mutation marks the scene *before* it is applied, so the
//! undo stack holds states the user can return to. Snapshots are deep
//! copies; nothing in them aliases the live scene.
//!
//! Drag gestures use **snapshot batching**: the scene is captured when the
//! gesture starts and pushed once when it ends, only if something moved.

use std::collections::VecDeque;
use tc_core::model::Scene;

/// Bounded snapshot history.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<Scene>,
    redo_stack: Vec<Scene>,
    /// Maximum undo depth. Oldest entries are evicted first.
    max_depth: usize,
    /// Scene captured at the start of the current gesture.
    gesture: Option<Scene>,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth,
            gesture: None,
        }
    }

    /// Record the current scene as an undo point and clear redo.
    pub fn mark(&mut self, scene: &Scene) {
        self.push_undo(scene.clone());
        self.redo_stack.clear();
    }

    fn push_undo(&mut self, snapshot: Scene) {
        self.undo_stack.push_back(snapshot);
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Restore the most recent undo point. The live scene moves to redo.
    pub fn undo(&mut self, scene: &mut Scene) -> bool {
        let Some(previous) = self.undo_stack.pop_back() else {
            return false;
        };
        self.redo_stack.push(std::mem::replace(scene, previous));
        true
    }

    /// Re-apply the most recently undone state. The live scene moves back
    /// to undo.
    pub fn redo(&mut self, scene: &mut Scene) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(scene, next);
        self.push_undo(current);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Start a gesture. Nested calls keep the first snapshot.
    pub fn begin_gesture(&mut self, scene: &Scene) {
        if self.gesture.is_none() {
            self.gesture = Some(scene.clone());
        }
    }

    /// End the gesture, pushing one undo point if the scene changed.
    /// Returns whether an entry was recorded.
    pub fn end_gesture(&mut self, scene: &Scene) -> bool {
        let Some(before) = self.gesture.take() else {
            return false;
        };
        if before == *scene {
            return false;
        }
        self.push_undo(before);
        self.redo_stack.clear();
        true
    }

    pub fn in_gesture(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.gesture = None;
    }
}
