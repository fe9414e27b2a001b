//! Split chains: a root task whose work is carried out by two or more
//! contiguous, time-ordered parts.

use tracing::debug;

use super::TaskGraph;
use crate::error::{ScheduleError, ScheduleResult};
use crate::task::{Task, TaskId};

/// Snapshot of a split chain, used to reverse split operations exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitMemento {
    root: Task,
    parts: Vec<Task>,
}

impl SplitMemento {
    pub fn root(&self) -> TaskId {
        self.root.id()
    }

    pub fn parts(&self) -> &[Task] {
        &self.parts
    }
}

impl TaskGraph {
    /// Turns a plain task into a split root with two parts. `first_duration`
    /// is clamped so both parts keep at least one day.
    pub fn split(
        &mut self,
        root: TaskId,
        part_a: Task,
        part_b: Task,
        first_duration: i64,
    ) -> ScheduleResult<()> {
        let root_task = self.task(root)?;
        if self.is_group(root) {
            return Err(ScheduleError::invalid("a group cannot be split"));
        }
        if self.is_split(root) {
            return Err(ScheduleError::invalid(
                "task is already split; split one of its parts instead",
            ));
        }
        if self.is_part(root) {
            return Err(ScheduleError::invalid(
                "use split_part to divide an existing part",
            ));
        }
        if root_task.duration() < 2 {
            return Err(ScheduleError::invalid(
                "a task needs at least two days to be split",
            ));
        }
        self.ensure_new_parts(&[&part_a, &part_b])?;

        let total = root_task.duration();
        let start = root_task.start();
        let complete = root_task.complete();
        let first = first_duration.clamp(1, total - 1);

        let part_a = part_a.starting_at(start).lasting(first).completed(complete);
        let part_b = part_b
            .starting_at(start + first)
            .lasting(total - first)
            .completed(complete);

        let ids = vec![part_a.id(), part_b.id()];
        for part in [part_a, part_b] {
            self.split_roots.insert(part.id(), root);
            self.tasks.insert(part.id(), part);
        }
        self.parts.insert(root, ids);
        debug!(%root, first, "task split");
        Ok(())
    }

    /// Divides an existing part; the part keeps `duration` days and `new_part`
    /// takes the remainder, directly after it in the chain.
    pub fn split_part(
        &mut self,
        part: TaskId,
        new_part: Task,
        duration: i64,
    ) -> ScheduleResult<()> {
        let root = self
            .split_root_of(part)
            .ok_or_else(|| ScheduleError::invalid("task is not a split part"))?;
        let part_task = self.task(part)?;
        if part_task.duration() < 2 {
            return Err(ScheduleError::invalid(
                "a part needs at least two days to be split",
            ));
        }
        self.ensure_new_parts(&[&new_part])?;

        let total = part_task.duration();
        let first = duration.clamp(1, total - 1);
        let new_part = new_part
            .starting_at(part_task.start() + first)
            .lasting(total - first)
            .completed(part_task.complete());
        let new_id = new_part.id();

        self.task_mut(part)?.set_duration(first);
        self.tasks.insert(new_id, new_part);
        self.split_roots.insert(new_id, root);
        if let Some(chain) = self.parts.get_mut(&root) {
            let position = chain.iter().position(|p| *p == part).unwrap_or(chain.len() - 1);
            chain.insert(position + 1, new_id);
        }
        self.repack_split(root)?;
        debug!(%root, %part, %new_id, "split part divided");
        Ok(())
    }

    /// Dissolves a split: parts are removed and the root covers their span.
    pub fn unsplit(&mut self, root: TaskId) -> ScheduleResult<SplitMemento> {
        let memento = self.split_memento(root)?;
        if memento.parts.is_empty() {
            return Err(ScheduleError::invalid("task is not split"));
        }
        self.repack_split(root)?;
        self.detach_parts(root);
        debug!(%root, "split dissolved");
        Ok(memento)
    }

    /// Drops one part and closes the gap it leaves; the root shrinks by the
    /// part's duration. Removing one of two parts turns the root back into a
    /// plain task covering the remaining part.
    pub fn remove_part(&mut self, part: TaskId) -> ScheduleResult<SplitMemento> {
        let root = self
            .split_root_of(part)
            .ok_or_else(|| ScheduleError::invalid("task is not a split part"))?;
        let memento = self.split_memento(root)?;
        let origin = memento.root.start();
        self.detach_part(root, part);
        if let Some(first) = self.parts_of(root).first().copied() {
            self.task_mut(first)?.set_start(origin);
        }
        self.repack_split(root)?;
        let weighted = self.weighted_complete(root);
        self.task_mut(root)?.set_complete(weighted);
        if self.parts_of(root).len() < 2 {
            self.detach_parts(root);
        }
        debug!(%root, %part, "split part removed");
        Ok(memento)
    }

    /// Folds a part into the part before it (or after it, for the first part).
    /// A two-part chain collapses back into a plain task.
    pub fn merge_part(&mut self, part: TaskId) -> ScheduleResult<SplitMemento> {
        let root = self
            .split_root_of(part)
            .ok_or_else(|| ScheduleError::invalid("task is not a split part"))?;
        let memento = self.split_memento(root)?;
        let chain = self.parts_of(root).to_vec();
        let position = chain.iter().position(|p| *p == part).unwrap_or(0);
        let neighbour = if position > 0 {
            chain[position - 1]
        } else {
            chain[1]
        };
        let (start, absorbed, absorbed_done) = {
            let task = self.task(part)?;
            (task.start(), task.duration(), task.complete())
        };
        let (kept, kept_done) = {
            let task = self.task(neighbour)?;
            (task.duration(), task.complete())
        };
        let grown = kept + absorbed;
        let merged_done =
            (kept_done * kept as f64 + absorbed_done * absorbed as f64) / grown as f64;
        let merged = self.task_mut(neighbour)?;
        merged.set_duration(grown);
        merged.set_complete(merged_done);
        if position == 0 {
            merged.set_start(start);
        }
        self.detach_part(root, part);
        self.repack_split(root)?;
        let weighted = self.weighted_complete(root);
        self.task_mut(root)?.set_complete(weighted);
        if self.parts_of(root).len() < 2 {
            self.detach_parts(root);
        }
        debug!(%root, %part, %neighbour, "split part merged");
        Ok(memento)
    }

    /// Captures a root and its parts; a plain task yields an empty part list.
    pub fn split_memento(&self, root: TaskId) -> ScheduleResult<SplitMemento> {
        let root_task = self.task(root)?.clone();
        let parts = self
            .parts_of(root)
            .iter()
            .filter_map(|p| self.tasks.get(p).cloned())
            .collect();
        Ok(SplitMemento {
            root: root_task,
            parts,
        })
    }

    /// Reinstates a chain exactly as captured, discarding the current parts.
    pub fn restore_split(&mut self, memento: &SplitMemento) -> ScheduleResult<()> {
        let root = memento.root.id();
        self.ensure_exists(root)?;
        for part in &memento.parts {
            let id = part.id();
            if self.tasks.contains_key(&id) && self.split_root_of(id) != Some(root) {
                return Err(ScheduleError::DuplicateId(id));
            }
        }
        self.detach_parts(root);
        if !memento.parts.is_empty() {
            let ids = memento.parts.iter().map(Task::id).collect();
            for part in &memento.parts {
                self.split_roots.insert(part.id(), root);
                self.tasks.insert(part.id(), part.clone());
            }
            self.parts.insert(root, ids);
        }
        self.tasks.insert(root, memento.root.clone());
        Ok(())
    }

    /// Installs a chain read from storage. Parts are sorted by start and laid
    /// end to end; returns `true` if any part had to be moved to do so.
    pub(crate) fn install_split(
        &mut self,
        root: TaskId,
        mut parts: Vec<Task>,
    ) -> ScheduleResult<bool> {
        self.ensure_exists(root)?;
        if parts.len() < 2 {
            return Err(ScheduleError::invalid("a split needs at least two parts"));
        }
        if self.is_group(root) || self.is_split(root) || self.is_part(root) {
            return Err(ScheduleError::invalid("task cannot become a split root"));
        }
        let refs: Vec<&Task> = parts.iter().collect();
        self.ensure_new_parts(&refs)?;

        parts.sort_by_key(Task::start);
        let mut moved = false;
        for pair in parts.windows(2) {
            if pair[1].start() != pair[0].end() {
                moved = true;
            }
        }
        let ids = parts.iter().map(Task::id).collect();
        for part in parts {
            self.split_roots.insert(part.id(), root);
            self.tasks.insert(part.id(), part);
        }
        self.parts.insert(root, ids);
        self.repack_split(root)?;
        let weighted = self.weighted_complete(root);
        self.task_mut(root)?.set_complete(weighted);
        Ok(moved)
    }

    fn ensure_new_parts(&self, parts: &[&Task]) -> ScheduleResult<()> {
        for (i, part) in parts.iter().enumerate() {
            let id = part.id();
            if self.tasks.contains_key(&id) || parts[..i].iter().any(|p| p.id() == id) {
                return Err(ScheduleError::DuplicateId(id));
            }
        }
        Ok(())
    }

    fn detach_part(&mut self, root: TaskId, part: TaskId) {
        if let Some(chain) = self.parts.get_mut(&root) {
            chain.retain(|p| *p != part);
        }
        self.split_roots.remove(&part);
        self.tasks.remove(&part);
    }

    fn detach_parts(&mut self, root: TaskId) {
        if let Some(chain) = self.parts.remove(&root) {
            for part in chain {
                self.split_roots.remove(&part);
                self.tasks.remove(&part);
            }
        }
    }
}
