//! Value mutators. Out-of-range values are clamped, never rejected, and every
//! mutator keeps split chains contiguous.

use super::{Changeset, TaskGraph};
use crate::error::ScheduleResult;
use crate::task::{TaskId, clamp_complete, clamp_duration, clamp_start};

impl TaskGraph {
    pub fn set_name(&mut self, id: TaskId, name: impl Into<String>) -> ScheduleResult<Changeset> {
        let changes = self.capture_one(id)?;
        self.task_mut(id)?.set_name(name.into());
        Ok(changes)
    }

    /// Moves a task. Moving a split root or any of its parts shifts the whole chain.
    pub fn set_start(&mut self, id: TaskId, start: i64) -> ScheduleResult<Changeset> {
        let start = clamp_start(start);
        let root = self.split_root_of(id).unwrap_or(id);
        if !self.is_split(root) {
            let changes = self.capture_one(id)?;
            self.task_mut(id)?.set_start(start);
            return Ok(changes);
        }

        let current = self.task(id)?.start();
        let root_start = self.task(root)?.start();
        let delta = (start - current).max(-root_start);
        let chain = self.chain_of(root);
        let changes = Changeset::capture(self, &chain);
        for member in &chain {
            let task = self.task_mut(*member)?;
            let shifted = task.start() + delta;
            task.set_start(shifted);
        }
        Ok(changes)
    }

    /// Changes the length of a task. For a part, later parts shift and the root
    /// is resized; for a split root, the last part absorbs the difference.
    pub fn set_duration(&mut self, id: TaskId, duration: i64) -> ScheduleResult<Changeset> {
        let duration = clamp_duration(duration);
        if let Some(root) = self.split_root_of(id) {
            let chain = self.chain_of(root);
            let changes = Changeset::capture(self, &chain);
            self.task_mut(id)?.set_duration(duration);
            self.repack_split(root)?;
            return Ok(changes);
        }
        if self.is_split(id) {
            let chain = self.chain_of(id);
            let changes = Changeset::capture(self, &chain);
            let delta = duration - self.task(id)?.duration();
            if let Some(last) = self.parts_of(id).last().copied() {
                let task = self.task_mut(last)?;
                let resized = task.duration() + delta;
                task.set_duration(resized);
            }
            self.repack_split(id)?;
            return Ok(changes);
        }
        let changes = self.capture_one(id)?;
        self.task_mut(id)?.set_duration(duration);
        Ok(changes)
    }

    /// Sets the exclusive end; the start stays put and the duration follows.
    pub fn set_end(&mut self, id: TaskId, end: i64) -> ScheduleResult<Changeset> {
        let start = self.task(id)?.start();
        self.set_duration(id, end - start)
    }

    /// Completing a split root completes every part alike; completing a part
    /// recomputes the root as the duration-weighted mean of its parts.
    pub fn set_complete(&mut self, id: TaskId, complete: f64) -> ScheduleResult<Changeset> {
        let complete = clamp_complete(complete);
        let root = self.split_root_of(id).unwrap_or(id);
        if !self.is_split(root) {
            let changes = self.capture_one(id)?;
            self.task_mut(id)?.set_complete(complete);
            return Ok(changes);
        }

        let chain = self.chain_of(root);
        let changes = Changeset::capture(self, &chain);
        if id == root {
            for member in &chain {
                self.task_mut(*member)?.set_complete(complete);
            }
        } else {
            self.task_mut(id)?.set_complete(complete);
            let weighted = self.weighted_complete(root);
            self.task_mut(root)?.set_complete(weighted);
        }
        Ok(changes)
    }

    /// Deadlines earlier than the computed end are moved up to the end.
    pub fn set_deadline(&mut self, id: TaskId, deadline: Option<i64>) -> ScheduleResult<Changeset> {
        let changes = self.capture_one(id)?;
        self.task_mut(id)?.set_deadline(deadline);
        Ok(changes)
    }

    pub fn set_note(&mut self, id: TaskId, note: Option<String>) -> ScheduleResult<Changeset> {
        let changes = self.capture_one(id)?;
        let note = note.filter(|n| !n.is_empty());
        self.task_mut(id)?.set_note(note);
        Ok(changes)
    }

    pub fn set_collapse(&mut self, id: TaskId, collapsed: bool) -> ScheduleResult<Changeset> {
        let changes = self.capture_one(id)?;
        self.task_mut(id)?.set_collapsed(collapsed);
        Ok(changes)
    }

    fn capture_one(&self, id: TaskId) -> ScheduleResult<Changeset> {
        self.ensure_exists(id)?;
        Ok(Changeset::capture(self, [&id]))
    }

    /// Root followed by its parts.
    pub(super) fn chain_of(&self, root: TaskId) -> Vec<TaskId> {
        let mut chain = vec![root];
        chain.extend_from_slice(self.parts_of(root));
        chain
    }

    pub(super) fn weighted_complete(&self, root: TaskId) -> f64 {
        let (done, total) = self
            .parts_of(root)
            .iter()
            .filter_map(|p| self.tasks.get(p))
            .fold((0.0, 0.0), |(done, total), part| {
                let weight = part.duration() as f64;
                (done + part.complete() * weight, total + weight)
            });
        if total > 0.0 { done / total } else { 0.0 }
    }

    /// Lays parts end to end from the first part's start and resizes the root.
    pub(super) fn repack_split(&mut self, root: TaskId) -> ScheduleResult<()> {
        let parts = self.parts_of(root).to_vec();
        let Some(first) = parts.first() else {
            return Ok(());
        };
        let origin = self.task(*first)?.start();
        let mut cursor = origin;
        for part in &parts {
            let task = self.task_mut(*part)?;
            task.set_start(cursor);
            cursor = task.end();
        }
        let root_task = self.task_mut(root)?;
        root_task.set_start(origin);
        root_task.set_duration(cursor - origin);
        Ok(())
    }
}
