//! Undo/redo over reversible actions.
//!
//! The undo stack is bounded; once it is full the oldest entry is dropped.
//! Executing a new action outside of a replay clears the redo stack. Actions
//! executed while a transaction is open are collected into one composite and
//! become a single undo entry on commit.

pub mod actions;

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, warn};

use crate::config::{DEFAULT_UNDO_DEPTH, EngineConfig};
use crate::error::{ScheduleError, ScheduleResult};
use crate::project::{ChangeEvent, ChangeOrigin, Project};

pub use actions::{
    AddTask, DeleteResource, DeleteTask, EditDirectory, EditTask, GroupTask, MergeSplitPart,
    MoveTask, RelateTasks, RemoveSplitPart, RemoveTask, SplitPart, SplitTask, TaskEdit,
    UngroupTask, UnrelateTasks, UnsplitTask,
};

/// A reversible mutation of a [`Project`].
///
/// `apply` may capture whatever it needs to undo itself; `revert` is only
/// called after a successful `apply`, and `apply` may be called again after
/// `revert` (redo).
pub trait Action: fmt::Debug {
    fn description(&self) -> String;
    fn apply(&mut self, project: &mut Project) -> ScheduleResult<()>;
    fn revert(&mut self, project: &mut Project) -> ScheduleResult<()>;
}

/// Several actions applied in order and reverted in exactly reverse order.
/// Applying is atomic: if a child fails, the children already applied are
/// reverted before the error is returned.
#[derive(Debug, Default)]
pub struct CompositeAction {
    description: String,
    actions: Vec<Box<dyn Action>>,
}

impl CompositeAction {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            actions: Vec::new(),
        }
    }

    pub fn with(mut self, action: impl Action + 'static) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    pub fn push(&mut self, action: Box<dyn Action>) {
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Action for CompositeAction {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn apply(&mut self, project: &mut Project) -> ScheduleResult<()> {
        for i in 0..self.actions.len() {
            if let Err(err) = self.actions[i].apply(project) {
                for applied in self.actions[..i].iter_mut().rev() {
                    if let Err(undo_err) = applied.revert(project) {
                        warn!(action = %applied.description(), %undo_err, "rollback step failed");
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> ScheduleResult<()> {
        let count = self.actions.len();
        for i in (0..count).rev() {
            if let Err(err) = self.actions[i].revert(project) {
                for reverted in self.actions[i + 1..].iter_mut() {
                    if let Err(redo_err) = reverted.apply(project) {
                        warn!(action = %reverted.description(), %redo_err, "reapply step failed");
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }
}

pub struct History {
    undo: VecDeque<Box<dyn Action>>,
    redo: Vec<Box<dyn Action>>,
    transaction: Option<CompositeAction>,
    replaying: bool,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_DEPTH)
    }
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("undo", &self.undo.len())
            .field("redo", &self.redo.len())
            .field("transaction", &self.transaction.as_ref().map(|t| t.len()))
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            transaction: None,
            replaying: false,
            max_depth: max_depth.max(1),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.max_undo_depth)
    }

    /// Applies `action` and records it.
    pub fn execute(
        &mut self,
        project: &mut Project,
        action: impl Action + 'static,
    ) -> ScheduleResult<()> {
        self.execute_boxed(project, Box::new(action))
    }

    pub fn execute_boxed(
        &mut self,
        project: &mut Project,
        mut action: Box<dyn Action>,
    ) -> ScheduleResult<()> {
        action.apply(project)?;
        let description = action.description();
        self.push(action);
        project.notify(ChangeEvent {
            description,
            origin: ChangeOrigin::Execute,
        });
        Ok(())
    }

    /// Records an action whose effect has already been applied.
    pub fn record(&mut self, action: impl Action + 'static) {
        self.push(Box::new(action));
    }

    /// Reverts the most recent entry. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self, project: &mut Project) -> ScheduleResult<bool> {
        if self.transaction.is_some() {
            return Err(ScheduleError::TransactionInProgress);
        }
        let Some(mut action) = self.undo.pop_back() else {
            return Ok(false);
        };
        self.replaying = true;
        let result = action.revert(project);
        self.replaying = false;
        if let Err(err) = result {
            self.undo.push_back(action);
            return Err(err);
        }
        let description = action.description();
        debug!(%description, "undo");
        self.redo.push(action);
        project.notify(ChangeEvent {
            description,
            origin: ChangeOrigin::Undo,
        });
        Ok(true)
    }

    pub fn redo(&mut self, project: &mut Project) -> ScheduleResult<bool> {
        if self.transaction.is_some() {
            return Err(ScheduleError::TransactionInProgress);
        }
        let Some(mut action) = self.redo.pop() else {
            return Ok(false);
        };
        self.replaying = true;
        let result = action.apply(project);
        self.replaying = false;
        if let Err(err) = result {
            self.redo.push(action);
            return Err(err);
        }
        let description = action.description();
        debug!(%description, "redo");
        self.undo.push_back(action);
        self.evict();
        project.notify(ChangeEvent {
            description,
            origin: ChangeOrigin::Redo,
        });
        Ok(true)
    }

    pub fn begin_transaction(&mut self, description: impl Into<String>) -> ScheduleResult<()> {
        if self.transaction.is_some() {
            return Err(ScheduleError::TransactionAlreadyActive);
        }
        let description = description.into();
        debug!(%description, "transaction started");
        self.transaction = Some(CompositeAction::new(description));
        Ok(())
    }

    /// Closes the open transaction; an empty one leaves no undo entry.
    pub fn commit_transaction(&mut self, project: &mut Project) -> ScheduleResult<()> {
        let composite = self
            .transaction
            .take()
            .ok_or(ScheduleError::NoActiveTransaction)?;
        if composite.is_empty() {
            debug!(description = %composite.description, "empty transaction discarded");
            return Ok(());
        }
        let description = composite.description();
        debug!(%description, actions = composite.len(), "transaction committed");
        self.push(Box::new(composite));
        project.notify(ChangeEvent {
            description,
            origin: ChangeOrigin::Commit,
        });
        Ok(())
    }

    /// Undoes every action of the open transaction, newest first. The undo
    /// stack is left as it was before the transaction began.
    pub fn rollback_transaction(&mut self, project: &mut Project) -> ScheduleResult<()> {
        let mut composite = self
            .transaction
            .take()
            .ok_or(ScheduleError::NoActiveTransaction)?;
        self.replaying = true;
        let result = composite.revert(project);
        self.replaying = false;
        result?;
        let description = composite.description();
        debug!(%description, "transaction rolled back");
        project.notify(ChangeEvent {
            description,
            origin: ChangeOrigin::Rollback,
        });
        Ok(())
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    pub fn is_undoing_or_redoing(&self) -> bool {
        self.replaying
    }

    pub fn can_undo(&self) -> bool {
        self.transaction.is_none() && !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        self.transaction.is_none() && !self.redo.is_empty()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo.back().map(|a| a.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo.last().map(|a| a.description())
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Drops every entry and any open transaction without touching the project.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.transaction = None;
    }

    fn push(&mut self, action: Box<dyn Action>) {
        if let Some(transaction) = self.transaction.as_mut() {
            transaction.push(action);
            return;
        }
        self.undo.push_back(action);
        self.evict();
        if !self.replaying {
            self.redo.clear();
        }
    }

    fn evict(&mut self) {
        while self.undo.len() > self.max_depth {
            if let Some(dropped) = self.undo.pop_front() {
                debug!(description = %dropped.description(), "oldest undo entry evicted");
            }
        }
    }
}
