// undo.rs

use std::collections::VecDeque;

use crate::error::CalcError;
use crate::history::Snapshot;

/// Linear undo/redo over history snapshots. There is no branching: recording
/// a new state throws the redo stack away.
#[derive(Debug, Clone, Default)]
pub struct UndoRedoManager {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
    limit: Option<usize>,
}

impl UndoRedoManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the undo stack; the oldest snapshot is dropped once the cap is
    /// exceeded. `None` leaves it unbounded.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Saves the state as it was before a change.
    pub fn record_state(&mut self, snapshot: Snapshot) {
        self.push_undo(snapshot);
        self.redo_stack.clear();
    }

    pub fn undo(&mut self, current: Snapshot) -> Result<Snapshot, CalcError> {
        let previous = self.undo_stack.pop_back().ok_or(CalcError::NothingToUndo)?;
        self.redo_stack.push(current);
        Ok(previous)
    }

    pub fn redo(&mut self, current: Snapshot) -> Result<Snapshot, CalcError> {
        let next = self.redo_stack.pop().ok_or(CalcError::NothingToRedo)?;
        self.push_undo(current);
        Ok(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// The state `undo` would restore, without restoring it.
    pub fn peek_undo(&self) -> Option<&Snapshot> {
        self.undo_stack.back()
    }

    /// The state `redo` would restore, without restoring it.
    pub fn peek_redo(&self) -> Option<&Snapshot> {
        self.redo_stack.last()
    }

    fn push_undo(&mut self, snapshot: Snapshot) {
        self.undo_stack.push_back(snapshot);
        if let Some(limit) = self.limit {
            while self.undo_stack.len() > limit {
                self.undo_stack.pop_front();
            }
        }
    }
}
