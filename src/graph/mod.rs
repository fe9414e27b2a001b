//! The task graph: every task plus the group, split and dependency relations
//! between them.
//!
//! Relations are kept in id-keyed adjacency maps owned by the graph; tasks
//! never reference each other. Every mutator either fully succeeds or leaves
//! the graph untouched.

pub mod dependency_dag;
mod relations;
mod split;
mod timing;

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::error::{ScheduleError, ScheduleResult};
use crate::interval::DayRange;
use crate::task::{Task, TaskId};

pub use dependency_dag::DependencyDag;
pub use split::SplitMemento;

/// Previous records of every task touched by a value mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    previous: Vec<Task>,
}

impl Changeset {
    fn capture<'a>(graph: &TaskGraph, ids: impl IntoIterator<Item = &'a TaskId>) -> Self {
        let mut previous: Vec<Task> = Vec::new();
        for id in ids {
            if previous.iter().any(|t| t.id() == *id) {
                continue;
            }
            if let Some(task) = graph.tasks.get(id) {
                previous.push(task.clone());
            }
        }
        Self { previous }
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }

    pub fn touched(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.previous.iter().map(Task::id)
    }

    pub fn previous(&self) -> &[Task] {
        &self.previous
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskGraph {
    tasks: HashMap<TaskId, Task>,
    /// Display order of every task that is not a split part.
    order: Vec<TaskId>,
    members: HashMap<TaskId, Vec<TaskId>>,
    parents: HashMap<TaskId, TaskId>,
    parts: HashMap<TaskId, Vec<TaskId>>,
    split_roots: HashMap<TaskId, TaskId>,
    /// Dependency edges as `(precedent, dependant)`.
    relations: BTreeSet<(TaskId, TaskId)>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks, split parts included.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn task(&self, id: TaskId) -> ScheduleResult<&Task> {
        self.tasks.get(&id).ok_or(ScheduleError::TaskNotFound(id))
    }

    /// Tasks in display order; split parts are reached through [`Self::parts_of`].
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.order.iter().filter_map(|id| self.tasks.get(id))
    }

    /// Every task including split parts, in no particular order.
    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn is_group(&self, id: TaskId) -> bool {
        self.members.get(&id).is_some_and(|m| !m.is_empty())
    }

    pub fn is_split(&self, id: TaskId) -> bool {
        self.parts.contains_key(&id)
    }

    pub fn is_part(&self, id: TaskId) -> bool {
        self.split_roots.contains_key(&id)
    }

    pub fn members_of(&self, group: TaskId) -> &[TaskId] {
        self.members.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn direct_group_of(&self, task: TaskId) -> Option<TaskId> {
        self.parents.get(&task).copied()
    }

    /// Ancestor chain, nearest group first.
    pub fn groups_of(&self, task: TaskId) -> Vec<TaskId> {
        let mut chain = Vec::new();
        let mut current = task;
        while let Some(parent) = self.parents.get(&current) {
            chain.push(*parent);
            current = *parent;
        }
        chain
    }

    /// All members of `group`, depth first in member order.
    pub fn descendants_of(&self, group: TaskId) -> Vec<TaskId> {
        let mut out = Vec::new();
        let mut stack: Vec<TaskId> = self.members_of(group).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.members_of(id).iter().rev().copied());
        }
        out
    }

    pub fn parts_of(&self, root: TaskId) -> &[TaskId] {
        self.parts.get(&root).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn split_root_of(&self, part: TaskId) -> Option<TaskId> {
        self.split_roots.get(&part).copied()
    }

    pub fn index_of(&self, task: TaskId) -> Option<usize> {
        self.order.iter().position(|id| *id == task)
    }

    pub fn precedents_of(&self, task: TaskId) -> Vec<TaskId> {
        self.relations
            .iter()
            .filter(|(_, dependant)| *dependant == task)
            .map(|(precedent, _)| *precedent)
            .collect()
    }

    pub fn dependants_of(&self, task: TaskId) -> Vec<TaskId> {
        self.relations
            .iter()
            .filter(|(precedent, _)| *precedent == task)
            .map(|(_, dependant)| *dependant)
            .collect()
    }

    pub fn relations(&self) -> impl Iterator<Item = (TaskId, TaskId)> + '_ {
        self.relations.iter().copied()
    }

    /// Bounds implied by a group's members, computed recursively.
    pub fn group_span(&self, group: TaskId) -> Option<DayRange> {
        let members = self.members.get(&group)?;
        let mut bounds: Option<(i64, i64)> = None;
        for member in members {
            let span = if self.is_group(*member) {
                match self.group_span(*member) {
                    Some(span) => {
                        let end = span.end().unwrap_or(span.start().saturating_add(1));
                        (span.start(), end)
                    }
                    None => continue,
                }
            } else {
                match self.tasks.get(member) {
                    Some(task) => (task.start(), task.end()),
                    None => continue,
                }
            };
            bounds = Some(match bounds {
                Some((start, end)) => (start.min(span.0), end.max(span.1)),
                None => span,
            });
        }
        bounds.map(|(start, end)| DayRange::bounded(start, end))
    }

    /// Whether work on `task` happens on `day`. Split roots only occupy the
    /// days covered by their parts.
    pub fn occupies_day(&self, task: TaskId, day: i64) -> bool {
        match self.parts.get(&task) {
            Some(parts) => parts
                .iter()
                .filter_map(|p| self.tasks.get(p))
                .any(|p| p.span().contains_day(day)),
            None => self
                .tasks
                .get(&task)
                .is_some_and(|t| t.span().contains_day(day)),
        }
    }

    /// Tasks ordered so that every precedent comes before its dependants.
    pub fn dependency_order(&self) -> ScheduleResult<Vec<TaskId>> {
        DependencyDag::build(self).topological_order()
    }

    /// Whether the task still takes part in any relation.
    pub fn is_attached(&self, task: TaskId) -> bool {
        self.parents.contains_key(&task)
            || self.is_group(task)
            || self.is_split(task)
            || self.is_part(task)
            || self
                .relations
                .iter()
                .any(|(p, d)| *p == task || *d == task)
    }

    pub fn add(&mut self, task: Task) -> ScheduleResult<()> {
        self.insert(task, None)
    }

    /// Adds a task at a display position; `None` appends.
    pub fn insert(&mut self, task: Task, index: Option<usize>) -> ScheduleResult<()> {
        let id = task.id();
        if self.tasks.contains_key(&id) {
            return Err(ScheduleError::DuplicateId(id));
        }
        self.tasks.insert(id, task);
        match index {
            Some(index) if index <= self.order.len() => self.order.insert(index, id),
            _ => self.order.push(id),
        }
        debug!(task = %id, "task added");
        Ok(())
    }

    /// Removes a detached task and returns it with its former display index.
    /// The graph does not cascade: relations must be dissolved first.
    pub fn delete(&mut self, id: TaskId) -> ScheduleResult<(Task, usize)> {
        if !self.tasks.contains_key(&id) {
            return Err(ScheduleError::TaskNotFound(id));
        }
        if self.is_attached(id) {
            return Err(ScheduleError::TaskInUse(id));
        }
        let index = self.index_of(id).unwrap_or(self.order.len());
        self.order.retain(|t| *t != id);
        self.members.remove(&id);
        let task = self
            .tasks
            .remove(&id)
            .ok_or(ScheduleError::TaskNotFound(id))?;
        debug!(task = %id, "task deleted");
        Ok((task, index))
    }

    /// Puts back the task records captured by a value mutation.
    pub fn restore(&mut self, changeset: &Changeset) {
        for task in &changeset.previous {
            if let Some(slot) = self.tasks.get_mut(&task.id()) {
                *slot = task.clone();
            }
        }
    }

    fn task_mut(&mut self, id: TaskId) -> ScheduleResult<&mut Task> {
        self.tasks.get_mut(&id).ok_or(ScheduleError::TaskNotFound(id))
    }

    fn ensure_exists(&self, id: TaskId) -> ScheduleResult<()> {
        if self.tasks.contains_key(&id) {
            Ok(())
        } else {
            Err(ScheduleError::TaskNotFound(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_rejects_duplicate_identity() {
        let mut graph = TaskGraph::new();
        let task = Task::new("Foundation");
        graph.add(task.clone()).unwrap();
        let err = graph.add(task.clone()).unwrap_err();
        assert_eq!(err, ScheduleError::DuplicateId(task.id()));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn delete_requires_detached_task() {
        let mut graph = TaskGraph::new();
        let group = Task::new("Group");
        let member = Task::new("Member");
        graph.add(group.clone()).unwrap();
        graph.add(member.clone()).unwrap();
        graph.group(group.id(), member.id()).unwrap();

        assert_eq!(
            graph.delete(member.id()).unwrap_err(),
            ScheduleError::TaskInUse(member.id())
        );
        graph.ungroup(group.id(), member.id()).unwrap();
        let (removed, index) = graph.delete(member.id()).unwrap();
        assert_eq!(removed.id(), member.id());
        assert_eq!(index, 1);
        assert!(!graph.contains(member.id()));
    }

    #[test]
    fn insert_at_index_restores_display_position() {
        let mut graph = TaskGraph::new();
        let ids: Vec<_> = (0..3)
            .map(|i| {
                let t = Task::new(format!("T{i}"));
                let id = t.id();
                graph.add(t).unwrap();
                id
            })
            .collect();
        let (task, index) = graph.delete(ids[1]).unwrap();
        graph.insert(task, Some(index)).unwrap();
        assert_eq!(graph.index_of(ids[1]), Some(1));
    }

    #[test]
    fn group_span_follows_nested_members() {
        let mut graph = TaskGraph::new();
        let outer = Task::new("Outer").starting_at(50).lasting(1);
        let inner = Task::new("Inner").starting_at(40);
        let a = Task::new("A").starting_at(3).lasting(4);
        let b = Task::new("B").starting_at(10).lasting(5);
        for t in [&outer, &inner, &a, &b] {
            graph.add((*t).clone()).unwrap();
        }
        graph.group(outer.id(), inner.id()).unwrap();
        graph.group(inner.id(), a.id()).unwrap();
        graph.group(outer.id(), b.id()).unwrap();

        assert_eq!(graph.group_span(outer.id()), Some(DayRange::bounded(3, 15)));
        assert_eq!(graph.group_span(inner.id()), Some(DayRange::bounded(3, 7)));
        assert_eq!(graph.group_span(a.id()), None);
        // the group's own anchor is untouched
        assert_eq!(graph.task(outer.id()).unwrap().start(), 50);
        assert_eq!(graph.descendants_of(outer.id()), vec![inner.id(), a.id(), b.id()]);
    }
}
