use tracing::debug;

use super::{DependencyDag, TaskGraph};
use crate::error::{ScheduleError, ScheduleResult};
use crate::task::TaskId;

impl TaskGraph {
    pub fn group(&mut self, group: TaskId, member: TaskId) -> ScheduleResult<()> {
        self.group_at(group, member, None)
    }

    /// Attaches `member` under `group` at a member position (`None` appends).
    pub fn group_at(
        &mut self,
        group: TaskId,
        member: TaskId,
        index: Option<usize>,
    ) -> ScheduleResult<()> {
        self.ensure_exists(group)?;
        self.ensure_exists(member)?;
        if group == member || self.groups_of(group).contains(&member) {
            return Err(ScheduleError::Cycle { group, member });
        }
        if self.is_part(group) || self.is_part(member) {
            return Err(ScheduleError::invalid("split parts cannot take part in groups"));
        }
        if self.is_split(group) {
            return Err(ScheduleError::invalid("a split task cannot become a group"));
        }
        if let Some(current) = self.parents.get(&member) {
            return Err(ScheduleError::AlreadyGrouped {
                group: *current,
                member,
            });
        }
        let mut ancestors = self.groups_of(group);
        ancestors.push(group);
        let mut subtree = self.descendants_of(member);
        subtree.push(member);
        let linked = self.relations.iter().any(|(precedent, dependant)| {
            (ancestors.contains(precedent) && subtree.contains(dependant))
                || (subtree.contains(precedent) && ancestors.contains(dependant))
        });
        if linked {
            return Err(ScheduleError::invalid(
                "a group cannot depend on its own member",
            ));
        }

        let members = self.members.entry(group).or_default();
        match index {
            Some(index) if index <= members.len() => members.insert(index, member),
            _ => members.push(member),
        }
        self.parents.insert(member, group);
        debug!(%group, %member, "task grouped");
        Ok(())
    }

    /// Detaches `member` from `group`, returning its former member position.
    pub fn ungroup(&mut self, group: TaskId, member: TaskId) -> ScheduleResult<usize> {
        if self.parents.get(&member) != Some(&group) {
            return Err(ScheduleError::NotGrouped { group, member });
        }
        let members = self
            .members
            .get_mut(&group)
            .ok_or(ScheduleError::NotGrouped { group, member })?;
        let index = members
            .iter()
            .position(|m| *m == member)
            .ok_or(ScheduleError::NotGrouped { group, member })?;
        members.remove(index);
        if members.is_empty() {
            self.members.remove(&group);
        }
        self.parents.remove(&member);
        debug!(%group, %member, "task ungrouped");
        Ok(index)
    }

    /// Records an advisory precedence edge. Returns `false` when it already exists.
    pub fn relate(&mut self, precedent: TaskId, dependant: TaskId) -> ScheduleResult<bool> {
        self.ensure_exists(precedent)?;
        self.ensure_exists(dependant)?;
        if precedent == dependant {
            return Err(ScheduleError::DependencyCycle {
                precedent,
                dependant,
            });
        }
        if self.is_part(precedent) || self.is_part(dependant) {
            return Err(ScheduleError::invalid(
                "relate the split task instead of its parts",
            ));
        }
        if self.groups_of(precedent).contains(&dependant)
            || self.groups_of(dependant).contains(&precedent)
        {
            return Err(ScheduleError::invalid(
                "a group cannot depend on its own member",
            ));
        }
        if self.relations.contains(&(precedent, dependant)) {
            return Ok(false);
        }
        if DependencyDag::build(self).has_path(dependant, precedent) {
            return Err(ScheduleError::DependencyCycle {
                precedent,
                dependant,
            });
        }
        self.relations.insert((precedent, dependant));
        debug!(%precedent, %dependant, "tasks related");
        Ok(true)
    }

    pub fn unrelate(&mut self, precedent: TaskId, dependant: TaskId) -> ScheduleResult<()> {
        if !self.relations.remove(&(precedent, dependant)) {
            return Err(ScheduleError::NotRelated {
                precedent,
                dependant,
            });
        }
        debug!(%precedent, %dependant, "tasks unrelated");
        Ok(())
    }

    /// Moves a task `offset` places among its siblings (the members of its
    /// group, or the display list when ungrouped). Time fields are untouched.
    /// Returns the previous position.
    pub fn move_task(&mut self, task: TaskId, offset: i64) -> ScheduleResult<usize> {
        let siblings = self.siblings_mut(task)?;
        let from = siblings
            .iter()
            .position(|id| *id == task)
            .ok_or(ScheduleError::TaskNotFound(task))?;
        let last = siblings.len().saturating_sub(1) as i64;
        let to = (from as i64).saturating_add(offset).clamp(0, last) as usize;
        let id = siblings.remove(from);
        siblings.insert(to, id);
        Ok(from)
    }

    /// Places a task at an absolute sibling position.
    pub fn move_to(&mut self, task: TaskId, index: usize) -> ScheduleResult<usize> {
        let current = self.sibling_index(task)?;
        let offset = i64::try_from(index).unwrap_or(i64::MAX).saturating_sub(current as i64);
        self.move_task(task, offset)
    }

    pub fn sibling_index(&self, task: TaskId) -> ScheduleResult<usize> {
        let siblings = match self.parents.get(&task) {
            Some(parent) => self.members_of(*parent),
            None => self.order.as_slice(),
        };
        siblings
            .iter()
            .position(|id| *id == task)
            .ok_or(ScheduleError::TaskNotFound(task))
    }

    fn siblings_mut(&mut self, task: TaskId) -> ScheduleResult<&mut Vec<TaskId>> {
        self.ensure_exists(task)?;
        if self.is_part(task) {
            return Err(ScheduleError::invalid("split parts are ordered by time"));
        }
        match self.parents.get(&task).copied() {
            Some(parent) => self
                .members
                .get_mut(&parent)
                .ok_or(ScheduleError::TaskNotFound(task)),
            None => Ok(&mut self.order),
        }
    }
}
