use std::cell::RefCell;
use std::rc::Rc;

use gantt_schedule::directory::{Record, RecordKey};
use gantt_schedule::history::{
    AddTask, DeleteResource, DeleteTask, EditDirectory, EditTask, GroupTask, MergeSplitPart,
    MoveTask, RelateTasks, RemoveSplitPart, SplitPart, SplitTask, TaskEdit, UngroupTask,
    UnrelateTasks, UnsplitTask,
};
use gantt_schedule::{
    Absence, Action, ChangeOrigin, CompositeAction, EngineConfig, History, ParticipationInterval,
    Project, Resource, ResourceAssignment, ResourceDirectory, Role, ScheduleError, Task,
    TaskGraph, TaskId,
};

fn state(project: &Project) -> (TaskGraph, ResourceDirectory) {
    (project.tasks().clone(), project.resources().clone())
}

fn add(
    history: &mut History,
    project: &mut Project,
    name: &str,
    start: i64,
    duration: i64,
) -> TaskId {
    let action = AddTask::new(Task::new(name).starting_at(start).lasting(duration));
    let id = action.id();
    history.execute(project, action).unwrap();
    id
}

/// Executes `action`, then checks that undo and redo land on the exact states
/// before and after it.
fn assert_round_trip(history: &mut History, project: &mut Project, action: impl Action + 'static) {
    let before = state(project);
    history.execute(project, action).unwrap();
    let after = state(project);
    assert_ne!(before, after);

    assert!(history.undo(project).unwrap());
    assert_eq!(state(project), before);
    assert!(history.redo(project).unwrap());
    assert_eq!(state(project), after);
}

/// A task of ten days split into parts of 3 and 7.
fn split_task(history: &mut History, project: &mut Project) -> (TaskId, TaskId, TaskId) {
    let root = add(history, project, "Weld", 4, 10);
    let first = Task::new("Weld 1");
    let second = Task::new("Weld 2");
    let (first_id, second_id) = (first.id(), second.id());
    history
        .execute(project, SplitTask::new(root, first, second, 3))
        .unwrap();
    (root, first_id, second_id)
}

#[test]
fn undo_walks_back_through_every_state() {
    let mut project = Project::default();
    let mut history = History::default();
    let mut states = vec![state(&project)];

    let a = add(&mut history, &mut project, "Survey", 0, 3);
    states.push(state(&project));
    let b = add(&mut history, &mut project, "Design", 3, 5);
    states.push(state(&project));
    history
        .execute(&mut project, EditTask::new(a, TaskEdit::Duration(4)))
        .unwrap();
    states.push(state(&project));
    history
        .execute(&mut project, RelateTasks::new(a, b))
        .unwrap();
    states.push(state(&project));
    history.execute(&mut project, MoveTask::new(b, -1)).unwrap();
    states.push(state(&project));
    let finished = states.last().cloned().unwrap();

    for expected in states.iter().rev().skip(1) {
        assert!(history.undo(&mut project).unwrap());
        assert_eq!(&state(&project), expected);
    }
    assert!(!history.undo(&mut project).unwrap());

    while history.redo(&mut project).unwrap() {}
    assert_eq!(state(&project), finished);
    assert_eq!(project.tasks().index_of(b), Some(0));
}

#[test]
fn oldest_entries_are_evicted_beyond_the_depth() {
    let mut project = Project::default();
    let mut history = History::default();
    for i in 0..7 {
        add(&mut history, &mut project, &format!("T{i}"), i, 1);
    }
    assert_eq!(history.undo_len(), 5);

    let mut undone = 0;
    while history.undo(&mut project).unwrap() {
        undone += 1;
    }
    assert_eq!(undone, 5);
    assert_eq!(project.tasks().len(), 2);
}

#[test]
fn configured_depth_is_respected() {
    let config = EngineConfig::default().with_max_undo_depth(2);
    let mut project = Project::new(Default::default(), &config);
    let mut history = History::from_config(&config);
    for i in 0..4 {
        add(&mut history, &mut project, &format!("T{i}"), 0, 1);
    }
    assert_eq!(history.max_depth(), 2);
    assert_eq!(history.undo_len(), 2);
}

#[test]
fn new_action_clears_redo() {
    let mut project = Project::default();
    let mut history = History::default();
    let a = add(&mut history, &mut project, "A", 0, 2);
    history
        .execute(&mut project, EditTask::new(a, TaskEdit::Name("Renamed".into())))
        .unwrap();

    history.undo(&mut project).unwrap();
    assert!(history.can_redo());
    assert_eq!(history.redo_description().as_deref(), Some("Change name"));

    history
        .execute(&mut project, EditTask::new(a, TaskEdit::Complete(0.5)))
        .unwrap();
    assert!(!history.can_redo());
    assert_eq!(history.redo_len(), 0);
    assert_eq!(project.tasks().task(a).unwrap().name(), "A");
}

#[test]
fn transaction_becomes_one_entry_undone_in_reverse() {
    let mut project = Project::default();
    let mut history = History::default();
    let group = add(&mut history, &mut project, "Phase", 0, 1);
    let before = state(&project);

    history.begin_transaction("Add grouped task").unwrap();
    let member = add(&mut history, &mut project, "Member", 2, 3);
    history
        .execute(&mut project, GroupTask::new(group, member))
        .unwrap();
    history.commit_transaction(&mut project).unwrap();

    assert_eq!(history.undo_len(), 2);
    assert_eq!(
        history.undo_description().as_deref(),
        Some("Add grouped task")
    );
    assert_eq!(project.tasks().members_of(group), &[member]);

    // the member must be ungrouped before it can be removed
    assert!(history.undo(&mut project).unwrap());
    assert_eq!(state(&project), before);
    assert!(history.redo(&mut project).unwrap());
    assert_eq!(project.tasks().direct_group_of(member), Some(group));
}

#[test]
fn rollback_restores_the_state_before_begin() {
    let mut project = Project::default();
    let mut history = History::default();
    let a = add(&mut history, &mut project, "A", 0, 2);
    let before = state(&project);

    history.begin_transaction("Bulk edit").unwrap();
    history
        .execute(&mut project, EditTask::new(a, TaskEdit::Start(9)))
        .unwrap();
    add(&mut history, &mut project, "B", 0, 1);
    history
        .execute(&mut project, EditTask::new(a, TaskEdit::Duration(6)))
        .unwrap();
    history.rollback_transaction(&mut project).unwrap();

    assert_eq!(state(&project), before);
    assert!(!history.in_transaction());
    assert_eq!(history.undo_len(), 1);
}

#[test]
fn transaction_misuse_is_reported() {
    let mut project = Project::default();
    let mut history = History::default();
    assert_eq!(
        history.commit_transaction(&mut project).unwrap_err(),
        ScheduleError::NoActiveTransaction
    );

    history.begin_transaction("outer").unwrap();
    assert_eq!(
        history.begin_transaction("inner").unwrap_err(),
        ScheduleError::TransactionAlreadyActive
    );
    assert_eq!(
        history.undo(&mut project).unwrap_err(),
        ScheduleError::TransactionInProgress
    );
    assert!(!history.can_undo());

    history.commit_transaction(&mut project).unwrap();
    assert_eq!(history.undo_len(), 0);
}

#[test]
fn failing_composite_leaves_no_trace() {
    let mut project = Project::default();
    let mut history = History::default();
    let existing = add(&mut history, &mut project, "Existing", 0, 1);
    let before = state(&project);

    let composite = CompositeAction::new("Broken")
        .with(AddTask::new(Task::new("Fresh")))
        .with(GroupTask::new(existing, existing));
    let err = history.execute(&mut project, composite).unwrap_err();

    assert!(matches!(err, ScheduleError::Cycle { .. }));
    assert_eq!(state(&project), before);
    assert_eq!(history.undo_len(), 1);
}

#[test]
fn delete_task_cascades_and_undo_restores_everything() {
    let mut project = Project::default();
    let mut history = History::default();
    let group = add(&mut history, &mut project, "Phase", 0, 1);
    let welded = add(&mut history, &mut project, "Weld", 0, 6);
    let painted = add(&mut history, &mut project, "Paint", 6, 2);
    let other = add(&mut history, &mut project, "Inspect", 8, 1);
    history.begin_transaction("Set up").unwrap();
    history
        .execute(&mut project, GroupTask::new(group, welded))
        .unwrap();
    history
        .execute(&mut project, GroupTask::new(group, painted))
        .unwrap();
    history
        .execute(&mut project, RelateTasks::new(painted, other))
        .unwrap();
    history
        .execute(
            &mut project,
            SplitTask::new(welded, Task::new("Weld 1"), Task::new("Weld 2"), 2),
        )
        .unwrap();
    let resource = Resource::new("Pavel Kuznetsov", Role::Constructor);
    let resource_id = resource.id;
    history
        .execute(&mut project, EditDirectory::insert(Record::Resource(resource)))
        .unwrap();
    history
        .execute(
            &mut project,
            EditDirectory::insert(Record::Assignment(
                ResourceAssignment::new(welded, resource_id).with_workload(70),
            )),
        )
        .unwrap();
    history.commit_transaction(&mut project).unwrap();
    let before = state(&project);

    history.execute(&mut project, DeleteTask::new(group)).unwrap();
    let graph = project.tasks();
    assert!(!graph.contains(group));
    assert!(!graph.contains(welded));
    assert!(!graph.contains(painted));
    assert_eq!(graph.len(), 1);
    assert!(graph.contains(other));
    assert_eq!(graph.relations().count(), 0);
    assert!(project.resources().assignments().is_empty());
    assert!(project.resources().contains_resource(resource_id));

    history.undo(&mut project).unwrap();
    assert_eq!(state(&project), before);

    history.redo(&mut project).unwrap();
    assert_eq!(project.tasks().len(), 1);
}

#[test]
fn assignments_require_an_existing_task() {
    let mut project = Project::default();
    let mut history = History::default();
    let resource = Resource::new("Anna Belova", Role::Constructor);
    let resource_id = resource.id;
    history
        .execute(&mut project, EditDirectory::insert(Record::Resource(resource)))
        .unwrap();

    let ghost = TaskId::new_v4();
    let err = history
        .execute(
            &mut project,
            EditDirectory::insert(Record::Assignment(ResourceAssignment::new(
                ghost,
                resource_id,
            ))),
        )
        .unwrap_err();
    assert_eq!(err, ScheduleError::TaskNotFound(ghost));
    assert_eq!(history.undo_len(), 1);
}

#[test]
fn delete_resource_removes_dependents_and_undo_restores_them() {
    let mut project = Project::default();
    let mut history = History::default();
    let task = add(&mut history, &mut project, "Drafting", 0, 5);
    let resource = Resource::new("Olga Smirnova", Role::LeadSpecialist);
    let id = resource.id;
    {
        let directory = project.resources_mut();
        directory.add_resource(resource).unwrap();
        directory
            .add_participation(ParticipationInterval::new(id, 0, None, 50))
            .unwrap();
        directory.add_absence(Absence::new(id, 2, 3)).unwrap();
        directory
            .add_assignment(ResourceAssignment::new(task, id))
            .unwrap();
    }
    let before = state(&project);

    assert_eq!(
        history
            .execute(&mut project, EditDirectory::remove(RecordKey::Resource(id)))
            .unwrap_err(),
        ScheduleError::ResourceInUse(id)
    );

    history.execute(&mut project, DeleteResource::new(id)).unwrap();
    let directory = project.resources();
    assert!(!directory.contains_resource(id));
    assert!(directory.participations().is_empty());
    assert!(directory.absences().is_empty());
    assert!(directory.assignments().is_empty());

    history.undo(&mut project).unwrap();
    assert_eq!(state(&project), before);
}

#[test]
fn listeners_hear_every_kind_of_change() {
    let mut project = Project::default();
    let mut history = History::default();
    let seen: Rc<RefCell<Vec<ChangeOrigin>>> = Rc::default();
    let sink = Rc::clone(&seen);
    project.on_change(move |event| sink.borrow_mut().push(event.origin));

    add(&mut history, &mut project, "A", 0, 1);
    history.undo(&mut project).unwrap();
    history.redo(&mut project).unwrap();

    history.begin_transaction("kept").unwrap();
    add(&mut history, &mut project, "B", 0, 1);
    history.commit_transaction(&mut project).unwrap();

    history.begin_transaction("dropped").unwrap();
    add(&mut history, &mut project, "C", 0, 1);
    history.rollback_transaction(&mut project).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            ChangeOrigin::Execute,
            ChangeOrigin::Undo,
            ChangeOrigin::Redo,
            ChangeOrigin::Execute,
            ChangeOrigin::Commit,
            ChangeOrigin::Execute,
            ChangeOrigin::Rollback,
        ]
    );
    assert!(!history.is_undoing_or_redoing());
}

#[test]
fn split_actions_undo_and_redo_exactly() {
    let mut project = Project::default();
    let mut history = History::new(20);
    let (root, first, second) = split_task(&mut history, &mut project);
    history
        .execute(&mut project, EditTask::new(first, TaskEdit::Complete(1.0)))
        .unwrap();

    let third = Task::new("Weld 3");
    let third_id = third.id();
    assert_round_trip(&mut history, &mut project, SplitPart::new(second, third, 4));
    assert_eq!(project.tasks().parts_of(root), &[first, second, third_id]);

    assert_round_trip(&mut history, &mut project, MergeSplitPart::new(third_id));
    assert_eq!(project.tasks().parts_of(root), &[first, second]);

    assert_round_trip(&mut history, &mut project, UnsplitTask::new(root));
    assert!(!project.tasks().is_split(root));
    history.undo(&mut project).unwrap();

    assert_round_trip(&mut history, &mut project, RemoveSplitPart::new(first));
    assert!(!project.tasks().is_split(root));
    assert_eq!(project.tasks().task(root).unwrap().duration(), 7);
}

#[test]
fn relation_actions_undo_and_redo_exactly() {
    let mut project = Project::default();
    let mut history = History::default();
    let group = add(&mut history, &mut project, "Phase", 0, 1);
    let a = add(&mut history, &mut project, "Dig", 0, 2);
    let b = add(&mut history, &mut project, "Pour", 2, 3);
    let c = add(&mut history, &mut project, "Cure", 5, 7);
    history.begin_transaction("Set up").unwrap();
    history
        .execute(&mut project, GroupTask::new(group, a))
        .unwrap();
    history
        .execute(&mut project, GroupTask::new(group, b))
        .unwrap();
    history.execute(&mut project, RelateTasks::new(b, c)).unwrap();
    history.commit_transaction(&mut project).unwrap();

    assert_round_trip(&mut history, &mut project, UngroupTask::new(group, a));
    assert_eq!(project.tasks().members_of(group), &[b]);
    assert_round_trip(&mut history, &mut project, UnrelateTasks::new(b, c));
    assert_eq!(project.tasks().relations().count(), 0);
}

#[test]
fn grouping_over_a_dependency_is_refused_and_delete_stays_whole() {
    let mut project = Project::default();
    let mut history = History::default();
    let x = add(&mut history, &mut project, "Frame", 0, 2);
    let y = add(&mut history, &mut project, "Roof", 2, 2);
    let z = add(&mut history, &mut project, "Shell", 0, 1);
    history.execute(&mut project, GroupTask::new(z, x)).unwrap();
    history.execute(&mut project, RelateTasks::new(x, y)).unwrap();
    let before = state(&project);

    let err = history
        .execute(&mut project, GroupTask::new(y, z))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidOperation(_)));
    assert_eq!(state(&project), before);

    history.execute(&mut project, DeleteTask::new(y)).unwrap();
    assert!(project.tasks().contains(x));
    assert!(project.tasks().contains(z));
    history.undo(&mut project).unwrap();
    assert_eq!(state(&project), before);
}

#[test]
fn failed_cascading_delete_leaves_the_project_untouched() {
    let mut project = Project::default();
    let mut history = History::default();
    let group = add(&mut history, &mut project, "Phase", 0, 1);
    let (root, _, _) = split_task(&mut history, &mut project);
    let other = add(&mut history, &mut project, "Inspect", 14, 1);
    history.begin_transaction("Set up").unwrap();
    history
        .execute(&mut project, GroupTask::new(group, root))
        .unwrap();
    history
        .execute(&mut project, RelateTasks::new(root, other))
        .unwrap();
    history.commit_transaction(&mut project).unwrap();
    let before = state(&project);
    let entries = history.undo_len();

    let doomed = CompositeAction::new("Clear phase")
        .with(DeleteTask::new(group))
        .with(UngroupTask::new(group, other));
    assert!(matches!(
        history.execute(&mut project, doomed),
        Err(ScheduleError::NotGrouped { .. })
    ));
    assert_eq!(state(&project), before);
    assert_eq!(history.undo_len(), entries);

    let ghost = TaskId::new_v4();
    assert_eq!(
        history
            .execute(&mut project, DeleteTask::new(ghost))
            .unwrap_err(),
        ScheduleError::TaskNotFound(ghost)
    );
    assert_eq!(state(&project), before);
}
