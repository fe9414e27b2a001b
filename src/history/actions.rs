//! Concrete reversible actions over the task graph and resource directory.

use crate::directory::{DirectoryEdit, Record, RecordKey};
use crate::error::{ScheduleError, ScheduleResult};
use crate::graph::{Changeset, SplitMemento};
use crate::project::Project;
use crate::resource::ResourceId;
use crate::task::{Task, TaskId};

use super::{Action, CompositeAction};

fn not_applied(action: &str) -> ScheduleError {
    ScheduleError::invalid(format!("{action} was reverted before being applied"))
}

/// Adds a task at a display position, optionally as a member of a group.
#[derive(Debug)]
pub struct AddTask {
    task: Task,
    index: Option<usize>,
    group: Option<TaskId>,
}

impl AddTask {
    pub fn new(task: Task) -> Self {
        Self {
            task,
            index: None,
            group: None,
        }
    }

    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn in_group(mut self, group: TaskId) -> Self {
        self.group = Some(group);
        self
    }

    pub fn id(&self) -> TaskId {
        self.task.id()
    }
}

impl Action for AddTask {
    fn description(&self) -> String {
        format!("Add task '{}'", self.task.name())
    }

    fn apply(&mut self, project: &mut Project) -> ScheduleResult<()> {
        let graph = project.tasks_mut();
        graph.insert(self.task.clone(), self.index)?;
        if let Some(group) = self.group {
            if let Err(err) = graph.group(group, self.task.id()) {
                graph.delete(self.task.id())?;
                return Err(err);
            }
        }
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> ScheduleResult<()> {
        let graph = project.tasks_mut();
        if let Some(group) = self.group {
            graph.ungroup(group, self.task.id())?;
        }
        let (task, _) = graph.delete(self.task.id())?;
        self.task = task;
        Ok(())
    }
}

/// Removes a task that carries no relations. See [`DeleteTask`] for the
/// cascading form.
#[derive(Debug)]
pub struct RemoveTask {
    id: TaskId,
    removed: Option<(Task, usize)>,
}

impl RemoveTask {
    pub fn new(id: TaskId) -> Self {
        Self { id, removed: None }
    }
}

impl Action for RemoveTask {
    fn description(&self) -> String {
        match &self.removed {
            Some((task, _)) => format!("Remove task '{}'", task.name()),
            None => "Remove task".to_string(),
        }
    }

    fn apply(&mut self, project: &mut Project) -> ScheduleResult<()> {
        self.removed = Some(project.tasks_mut().delete(self.id)?);
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> ScheduleResult<()> {
        let (task, index) = self
            .removed
            .clone()
            .ok_or_else(|| not_applied("remove task"))?;
        project.tasks_mut().insert(task, Some(index))
    }
}

/// Deletes a task together with everything attached to it: group members
/// (recursively), split parts, dependency edges and resource assignments.
#[derive(Debug)]
pub struct DeleteTask {
    id: TaskId,
    name: Option<String>,
    plan: Option<CompositeAction>,
}

impl DeleteTask {
    pub fn new(id: TaskId) -> Self {
        Self {
            id,
            name: None,
            plan: None,
        }
    }

    fn plan(&self, project: &Project) -> ScheduleResult<CompositeAction> {
        let graph = project.tasks();
        let task = graph.task(self.id)?;
        let mut plan = CompositeAction::new(format!("Delete task '{}'", task.name()));

        for member in graph.members_of(self.id) {
            plan.push(Box::new(DeleteTask::new(*member)));
        }

        let mut owned = vec![self.id];
        owned.extend_from_slice(graph.parts_of(self.id));
        for assignment in project.resources().assignments() {
            if owned.contains(&assignment.task) {
                plan.push(Box::new(EditDirectory::new(DirectoryEdit::Remove(
                    RecordKey::Assignment(assignment.id),
                ))));
            }
        }

        if graph.is_part(self.id) {
            plan.push(Box::new(RemoveSplitPart::new(self.id)));
            return Ok(plan);
        }
        if graph.is_split(self.id) {
            plan.push(Box::new(UnsplitTask::new(self.id)));
        }
        for precedent in graph.precedents_of(self.id) {
            plan.push(Box::new(UnrelateTasks::new(precedent, self.id)));
        }
        for dependant in graph.dependants_of(self.id) {
            plan.push(Box::new(UnrelateTasks::new(self.id, dependant)));
        }
        if let Some(group) = graph.direct_group_of(self.id) {
            plan.push(Box::new(UngroupTask::new(group, self.id)));
        }
        plan.push(Box::new(RemoveTask::new(self.id)));
        Ok(plan)
    }
}

impl Action for DeleteTask {
    fn description(&self) -> String {
        match &self.name {
            Some(name) => format!("Delete task '{name}'"),
            None => "Delete task".to_string(),
        }
    }

    fn apply(&mut self, project: &mut Project) -> ScheduleResult<()> {
        let mut plan = self.plan(project)?;
        self.name = Some(project.tasks().task(self.id)?.name().to_string());
        plan.apply(project)?;
        self.plan = Some(plan);
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> ScheduleResult<()> {
        let mut plan = self.plan.take().ok_or_else(|| not_applied("delete task"))?;
        plan.revert(project)
    }
}

/// A single field change of a task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEdit {
    Name(String),
    Start(i64),
    Duration(i64),
    End(i64),
    Complete(f64),
    Deadline(Option<i64>),
    Note(Option<String>),
    Collapse(bool),
}

impl TaskEdit {
    fn field(&self) -> &'static str {
        match self {
            TaskEdit::Name(_) => "name",
            TaskEdit::Start(_) => "start",
            TaskEdit::Duration(_) => "duration",
            TaskEdit::End(_) => "end",
            TaskEdit::Complete(_) => "completion",
            TaskEdit::Deadline(_) => "deadline",
            TaskEdit::Note(_) => "note",
            TaskEdit::Collapse(_) => "collapse",
        }
    }
}

#[derive(Debug)]
pub struct EditTask {
    id: TaskId,
    edit: TaskEdit,
    changes: Option<Changeset>,
}

impl EditTask {
    pub fn new(id: TaskId, edit: TaskEdit) -> Self {
        Self {
            id,
            edit,
            changes: None,
        }
    }
}

impl Action for EditTask {
    fn description(&self) -> String {
        format!("Change {}", self.edit.field())
    }

    fn apply(&mut self, project: &mut Project) -> ScheduleResult<()> {
        let graph = project.tasks_mut();
        let changes = match &self.edit {
            TaskEdit::Name(name) => graph.set_name(self.id, name.clone())?,
            TaskEdit::Start(start) => graph.set_start(self.id, *start)?,
            TaskEdit::Duration(duration) => graph.set_duration(self.id, *duration)?,
            TaskEdit::End(end) => graph.set_end(self.id, *end)?,
            TaskEdit::Complete(complete) => graph.set_complete(self.id, *complete)?,
            TaskEdit::Deadline(deadline) => graph.set_deadline(self.id, *deadline)?,
            TaskEdit::Note(note) => graph.set_note(self.id, note.clone())?,
            TaskEdit::Collapse(collapsed) => graph.set_collapse(self.id, *collapsed)?,
        };
        self.changes = Some(changes);
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> ScheduleResult<()> {
        let changes = self.changes.take().ok_or_else(|| not_applied("edit task"))?;
        project.tasks_mut().restore(&changes);
        Ok(())
    }
}

#[derive(Debug)]
pub struct GroupTask {
    group: TaskId,
    member: TaskId,
    index: Option<usize>,
}

impl GroupTask {
    pub fn new(group: TaskId, member: TaskId) -> Self {
        Self {
            group,
            member,
            index: None,
        }
    }

    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

impl Action for GroupTask {
    fn description(&self) -> String {
        "Group task".to_string()
    }

    fn apply(&mut self, project: &mut Project) -> ScheduleResult<()> {
        project
            .tasks_mut()
            .group_at(self.group, self.member, self.index)
    }

    fn revert(&mut self, project: &mut Project) -> ScheduleResult<()> {
        project.tasks_mut().ungroup(self.group, self.member).map(|_| ())
    }
}

#[derive(Debug)]
pub struct UngroupTask {
    group: TaskId,
    member: TaskId,
    index: Option<usize>,
}

impl UngroupTask {
    pub fn new(group: TaskId, member: TaskId) -> Self {
        Self {
            group,
            member,
            index: None,
        }
    }
}

impl Action for UngroupTask {
    fn description(&self) -> String {
        "Ungroup task".to_string()
    }

    fn apply(&mut self, project: &mut Project) -> ScheduleResult<()> {
        self.index = Some(project.tasks_mut().ungroup(self.group, self.member)?);
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> ScheduleResult<()> {
        project
            .tasks_mut()
            .group_at(self.group, self.member, self.index)
    }
}

#[derive(Debug)]
pub struct RelateTasks {
    precedent: TaskId,
    dependant: TaskId,
    added: bool,
}

impl RelateTasks {
    pub fn new(precedent: TaskId, dependant: TaskId) -> Self {
        Self {
            precedent,
            dependant,
            added: false,
        }
    }
}

impl Action for RelateTasks {
    fn description(&self) -> String {
        "Relate tasks".to_string()
    }

    fn apply(&mut self, project: &mut Project) -> ScheduleResult<()> {
        self.added = project.tasks_mut().relate(self.precedent, self.dependant)?;
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> ScheduleResult<()> {
        if self.added {
            project.tasks_mut().unrelate(self.precedent, self.dependant)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct UnrelateTasks {
    precedent: TaskId,
    dependant: TaskId,
}

impl UnrelateTasks {
    pub fn new(precedent: TaskId, dependant: TaskId) -> Self {
        Self {
            precedent,
            dependant,
        }
    }
}

impl Action for UnrelateTasks {
    fn description(&self) -> String {
        "Unrelate tasks".to_string()
    }

    fn apply(&mut self, project: &mut Project) -> ScheduleResult<()> {
        project.tasks_mut().unrelate(self.precedent, self.dependant)
    }

    fn revert(&mut self, project: &mut Project) -> ScheduleResult<()> {
        project
            .tasks_mut()
            .relate(self.precedent, self.dependant)
            .map(|_| ())
    }
}

/// Reorders a task among its siblings by `offset` places.
#[derive(Debug)]
pub struct MoveTask {
    id: TaskId,
    offset: i64,
    previous: Option<usize>,
}

impl MoveTask {
    pub fn new(id: TaskId, offset: i64) -> Self {
        Self {
            id,
            offset,
            previous: None,
        }
    }
}

impl Action for MoveTask {
    fn description(&self) -> String {
        if self.offset < 0 {
            "Move task up".to_string()
        } else {
            "Move task down".to_string()
        }
    }

    fn apply(&mut self, project: &mut Project) -> ScheduleResult<()> {
        self.previous = Some(project.tasks_mut().move_task(self.id, self.offset)?);
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> ScheduleResult<()> {
        let previous = self.previous.ok_or_else(|| not_applied("move task"))?;
        project.tasks_mut().move_to(self.id, previous).map(|_| ())
    }
}

fn restore_chain(
    project: &mut Project,
    memento: Option<SplitMemento>,
    action: &str,
) -> ScheduleResult<()> {
    let memento = memento.ok_or_else(|| not_applied(action))?;
    project.tasks_mut().restore_split(&memento)
}

/// First split of a plain task into two parts.
#[derive(Debug)]
pub struct SplitTask {
    root: TaskId,
    part_a: Task,
    part_b: Task,
    first_duration: i64,
    memento: Option<SplitMemento>,
}

impl SplitTask {
    pub fn new(root: TaskId, part_a: Task, part_b: Task, first_duration: i64) -> Self {
        Self {
            root,
            part_a,
            part_b,
            first_duration,
            memento: None,
        }
    }
}

impl Action for SplitTask {
    fn description(&self) -> String {
        "Split task".to_string()
    }

    fn apply(&mut self, project: &mut Project) -> ScheduleResult<()> {
        let graph = project.tasks_mut();
        let memento = graph.split_memento(self.root)?;
        graph.split(
            self.root,
            self.part_a.clone(),
            self.part_b.clone(),
            self.first_duration,
        )?;
        self.memento = Some(memento);
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> ScheduleResult<()> {
        restore_chain(project, self.memento.take(), "split task")
    }
}

/// Divides an existing part, extending its chain.
#[derive(Debug)]
pub struct SplitPart {
    part: TaskId,
    new_part: Task,
    duration: i64,
    memento: Option<SplitMemento>,
}

impl SplitPart {
    pub fn new(part: TaskId, new_part: Task, duration: i64) -> Self {
        Self {
            part,
            new_part,
            duration,
            memento: None,
        }
    }
}

impl Action for SplitPart {
    fn description(&self) -> String {
        "Split part".to_string()
    }

    fn apply(&mut self, project: &mut Project) -> ScheduleResult<()> {
        let graph = project.tasks_mut();
        let root = graph
            .split_root_of(self.part)
            .ok_or_else(|| ScheduleError::invalid("task is not a split part"))?;
        let memento = graph.split_memento(root)?;
        graph.split_part(self.part, self.new_part.clone(), self.duration)?;
        self.memento = Some(memento);
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> ScheduleResult<()> {
        restore_chain(project, self.memento.take(), "split part")
    }
}

#[derive(Debug)]
pub struct UnsplitTask {
    root: TaskId,
    memento: Option<SplitMemento>,
}

impl UnsplitTask {
    pub fn new(root: TaskId) -> Self {
        Self { root, memento: None }
    }
}

impl Action for UnsplitTask {
    fn description(&self) -> String {
        "Merge split task".to_string()
    }

    fn apply(&mut self, project: &mut Project) -> ScheduleResult<()> {
        self.memento = Some(project.tasks_mut().unsplit(self.root)?);
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> ScheduleResult<()> {
        restore_chain(project, self.memento.take(), "merge split task")
    }
}

#[derive(Debug)]
pub struct RemoveSplitPart {
    part: TaskId,
    memento: Option<SplitMemento>,
}

impl RemoveSplitPart {
    pub fn new(part: TaskId) -> Self {
        Self { part, memento: None }
    }
}

impl Action for RemoveSplitPart {
    fn description(&self) -> String {
        "Remove split part".to_string()
    }

    fn apply(&mut self, project: &mut Project) -> ScheduleResult<()> {
        self.memento = Some(project.tasks_mut().remove_part(self.part)?);
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> ScheduleResult<()> {
        restore_chain(project, self.memento.take(), "remove split part")
    }
}

#[derive(Debug)]
pub struct MergeSplitPart {
    part: TaskId,
    memento: Option<SplitMemento>,
}

impl MergeSplitPart {
    pub fn new(part: TaskId) -> Self {
        Self { part, memento: None }
    }
}

impl Action for MergeSplitPart {
    fn description(&self) -> String {
        "Merge split part".to_string()
    }

    fn apply(&mut self, project: &mut Project) -> ScheduleResult<()> {
        self.memento = Some(project.tasks_mut().merge_part(self.part)?);
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> ScheduleResult<()> {
        restore_chain(project, self.memento.take(), "merge split part")
    }
}

/// Any directory insert, removal or replacement. Assignments are checked
/// against the task graph before they are stored.
#[derive(Debug)]
pub struct EditDirectory {
    edit: DirectoryEdit,
    inverse: Option<DirectoryEdit>,
}

impl EditDirectory {
    pub fn new(edit: DirectoryEdit) -> Self {
        Self {
            edit,
            inverse: None,
        }
    }

    pub fn insert(record: Record) -> Self {
        Self::new(DirectoryEdit::Insert {
            record,
            index: None,
        })
    }

    pub fn remove(key: RecordKey) -> Self {
        Self::new(DirectoryEdit::Remove(key))
    }

    pub fn replace(record: Record) -> Self {
        Self::new(DirectoryEdit::Replace(record))
    }
}

fn record_noun(key: &RecordKey) -> &'static str {
    match key {
        RecordKey::Resource(_) => "resource",
        RecordKey::Participation(_) => "participation interval",
        RecordKey::Absence(_) => "absence",
        RecordKey::Assignment(_) => "assignment",
        RecordKey::Holiday(_) => "holiday",
    }
}

impl Action for EditDirectory {
    fn description(&self) -> String {
        match &self.edit {
            DirectoryEdit::Insert { record, .. } => format!("Add {}", record_noun(&record.key())),
            DirectoryEdit::Remove(key) => format!("Remove {}", record_noun(key)),
            DirectoryEdit::Replace(record) => format!("Edit {}", record_noun(&record.key())),
        }
    }

    fn apply(&mut self, project: &mut Project) -> ScheduleResult<()> {
        if let DirectoryEdit::Insert {
            record: Record::Assignment(assignment),
            ..
        }
        | DirectoryEdit::Replace(Record::Assignment(assignment)) = &self.edit
        {
            if !project.tasks().contains(assignment.task) {
                return Err(ScheduleError::TaskNotFound(assignment.task));
            }
        }
        self.inverse = Some(project.resources_mut().apply(self.edit.clone())?);
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> ScheduleResult<()> {
        let inverse = self
            .inverse
            .take()
            .ok_or_else(|| not_applied("directory edit"))?;
        project.resources_mut().apply(inverse).map(|_| ())
    }
}

/// Removes a resource and every interval, absence and assignment referencing it.
#[derive(Debug)]
pub struct DeleteResource {
    id: ResourceId,
    plan: Option<CompositeAction>,
}

impl DeleteResource {
    pub fn new(id: ResourceId) -> Self {
        Self { id, plan: None }
    }
}

impl Action for DeleteResource {
    fn description(&self) -> String {
        "Delete resource".to_string()
    }

    fn apply(&mut self, project: &mut Project) -> ScheduleResult<()> {
        let directory = project.resources();
        if !directory.contains_resource(self.id) {
            return Err(ScheduleError::ResourceNotFound(self.id));
        }
        let mut plan = CompositeAction::new(self.description());
        for key in directory.dependents_of(self.id) {
            plan.push(Box::new(EditDirectory::remove(key)));
        }
        plan.push(Box::new(EditDirectory::remove(RecordKey::Resource(self.id))));
        plan.apply(project)?;
        self.plan = Some(plan);
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> ScheduleResult<()> {
        let mut plan = self
            .plan
            .take()
            .ok_or_else(|| not_applied("delete resource"))?;
        plan.revert(project)
    }
}
