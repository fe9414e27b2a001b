use chrono::NaiveDate;
use gantt_schedule::engagement::status_frame;
use gantt_schedule::resource::ResourceId;
use gantt_schedule::{
    Absence, DayRange, DayState, EngineConfig, Holiday, ParticipationInterval, Project,
    ProjectMetadata, Resource, ResourceAssignment, Role, Task, TaskId,
};
use uuid::Uuid;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// Day 0 is Monday 2025-01-06, so days 5 and 6 are a weekend.
fn empty_project() -> Project {
    Project::new(
        ProjectMetadata::new("Plant Upgrade", d(2025, 1, 6)),
        &EngineConfig::default(),
    )
}

fn add_resource(
    project: &mut Project,
    role: Role,
    start: i64,
    end: Option<i64>,
    max: i32,
) -> ResourceId {
    let resource = Resource::new("Oleg Sidorov", role);
    let id = resource.id;
    project.resources_mut().add_resource(resource).unwrap();
    project
        .resources_mut()
        .add_participation(ParticipationInterval::new(id, start, end, max))
        .unwrap();
    id
}

fn add_task(project: &mut Project, start: i64, duration: i64) -> TaskId {
    let task = Task::new("Drafting").starting_at(start).lasting(duration);
    let id = task.id();
    project.tasks_mut().add(task).unwrap();
    id
}

fn assign(project: &mut Project, task: TaskId, resource: ResourceId, workload: i32) {
    project
        .resources_mut()
        .add_assignment(ResourceAssignment::new(task, resource).with_workload(workload))
        .unwrap();
}

#[test]
fn allocation_sums_assignments_and_classifies() {
    let mut project = empty_project();
    let resource = add_resource(&mut project, Role::Constructor, 0, None, 100);
    let first = add_task(&mut project, 0, 10);
    assign(&mut project, first, resource, 60);

    let status = project.engagement().day_status(resource, 5).unwrap();
    assert_eq!(status.allocation_percent, 60);
    assert_eq!(status.state, DayState::PartialAssigned);
    assert_eq!(status.available_capacity(), 40);

    let second = add_task(&mut project, 3, 4);
    assign(&mut project, second, resource, 50);
    let status = project.engagement().day_status(resource, 5).unwrap();
    assert_eq!(status.allocation_percent, 110);
    assert_eq!(status.state, DayState::Overbooked);
    assert_eq!(status.assignments.len(), 2);
    assert_eq!(status.fill_ratio(), 1.0);
    assert_eq!(status.available_capacity(), 0);
}

#[test]
fn exact_capacity_is_assigned() {
    let mut project = empty_project();
    let resource = add_resource(&mut project, Role::LeadSpecialist, 0, None, 25);
    let task = add_task(&mut project, 0, 3);
    assign(&mut project, task, resource, 100);

    let status = project.engagement().day_status(resource, 1).unwrap();
    assert_eq!(status.allocation_percent, 25);
    assert_eq!(status.state, DayState::Assigned);
}

#[test]
fn role_coefficient_scales_load() {
    let mut project = empty_project();
    let chief = add_resource(&mut project, Role::ChiefConstructor, 0, None, 100);
    let task = add_task(&mut project, 0, 3);
    assign(&mut project, task, chief, 100);

    let status = project.engagement().day_status(chief, 0).unwrap();
    assert_eq!(status.allocation_percent, 10);
    assert_eq!(status.assignments[0].effective_load, 10.0);
    assert_eq!(status.state, DayState::PartialAssigned);
}

#[test]
fn outside_participation_ignores_assignments() {
    let mut project = empty_project();
    let resource = add_resource(&mut project, Role::Constructor, 0, Some(3), 100);
    let task = add_task(&mut project, 0, 10);
    assign(&mut project, task, resource, 60);

    let status = project.engagement().day_status(resource, 3).unwrap();
    assert_eq!(status.state, DayState::NotParticipating);
    assert_eq!(status.allocation_percent, 0);
    assert!(status.assignments.is_empty());
    assert!(!status.is_participating);

    let inside = project.engagement().day_status(resource, 2).unwrap();
    assert_eq!(inside.state, DayState::PartialAssigned);
}

#[test]
fn absence_with_work_is_a_conflict() {
    let mut project = empty_project();
    let resource = add_resource(&mut project, Role::Constructor, 0, None, 100);
    let task = add_task(&mut project, 0, 4);
    assign(&mut project, task, resource, 30);
    project
        .resources_mut()
        .add_absence(Absence::new(resource, 3, 10).with_reason("Vacation"))
        .unwrap();

    let busy = project.engagement().day_status(resource, 3).unwrap();
    assert!(busy.is_absent);
    assert_eq!(busy.absence_reason.as_deref(), Some("Vacation"));
    assert_eq!(busy.state, DayState::Overbooked);

    let idle = project.engagement().day_status(resource, 7).unwrap();
    assert_eq!(idle.state, DayState::Absence);
    assert_eq!(idle.allocation_percent, 0);
}

#[test]
fn idle_weekend_days_are_marked_and_holidays_are_carried() {
    let mut project = empty_project();
    let resource = add_resource(&mut project, Role::Constructor, 0, None, 100);
    project
        .resources_mut()
        .add_holiday(Holiday::new(2, Some("Founders Day".into())))
        .unwrap();

    let engine = project.engagement();
    let friday = engine.day_status(resource, 4).unwrap();
    assert_eq!(friday.state, DayState::Free);
    assert_eq!(friday.date, Some(d(2025, 1, 10)));

    let saturday = engine.day_status(resource, 5).unwrap();
    assert!(saturday.is_weekend);
    assert_eq!(saturday.state, DayState::Weekend);

    let holiday = engine.day_status(resource, 2).unwrap();
    assert_eq!(holiday.holiday.as_deref(), Some("Founders Day"));
    assert_eq!(holiday.state, DayState::Free);
}

#[test]
fn assignments_to_missing_tasks_are_ignored() {
    let mut project = empty_project();
    let resource = add_resource(&mut project, Role::Constructor, 0, None, 100);
    assign(&mut project, Uuid::new_v4(), resource, 80);

    let status = project.engagement().day_status(resource, 1).unwrap();
    assert_eq!(status.state, DayState::Free);
    assert_eq!(status.allocation_percent, 0);
}

#[test]
fn unknown_resource_and_unbounded_range_are_errors() {
    let mut project = empty_project();
    let resource = add_resource(&mut project, Role::Constructor, 0, None, 100);
    let engine = project.engagement();
    assert!(engine.day_status(Uuid::new_v4(), 0).is_err());
    assert!(engine.range(resource, DayRange::unbounded(0)).is_err());
}

#[test]
fn summary_and_conflicts_over_a_week() {
    let mut project = empty_project();
    let resource = add_resource(&mut project, Role::Constructor, 0, None, 100);
    let early = add_task(&mut project, 0, 5);
    let late = add_task(&mut project, 3, 5);
    assign(&mut project, early, resource, 60);
    assign(&mut project, late, resource, 60);

    let engine = project.engagement();
    let summary = engine.summarize(resource, DayRange::bounded(0, 7)).unwrap();
    assert_eq!(summary.days, 7);
    assert_eq!(summary.count(DayState::PartialAssigned), 5);
    assert_eq!(summary.count(DayState::Overbooked), 2);
    assert_eq!(summary.overbooked_days, vec![3, 4]);
    assert_eq!(summary.peak_allocation, 120);

    let conflicts = engine.conflicts(DayRange::bounded(0, 14)).unwrap();
    assert_eq!(conflicts.len(), 2);

    let task_conflicts = engine.task_conflicts(early).unwrap();
    let days: Vec<i64> = task_conflicts.iter().map(|s| s.day).collect();
    assert_eq!(days, vec![3, 4]);
}

#[test]
fn most_significant_state_of_a_cell() {
    let states = [DayState::Free, DayState::Overbooked, DayState::Assigned];
    assert_eq!(DayState::most_significant(states), Some(DayState::Overbooked));
    assert_eq!(
        DayState::most_significant([DayState::Weekend, DayState::NotParticipating]),
        Some(DayState::NotParticipating)
    );
}

#[test]
fn grid_exports_one_row_per_resource_day() {
    let mut project = empty_project();
    let first = add_resource(&mut project, Role::Constructor, 0, None, 100);
    add_resource(&mut project, Role::LeadSpecialist, 2, Some(5), 50);
    let task = add_task(&mut project, 0, 3);
    assign(&mut project, task, first, 100);

    let grid = project.engagement().grid(DayRange::bounded(0, 7)).unwrap();
    assert_eq!(grid.len(), 14);
    assert_eq!(grid[0].state, DayState::Assigned);

    let df = status_frame(&grid).unwrap();
    assert_eq!(df.height(), 14);
    assert_eq!(df.width(), 9);
    let allocation = df.column("allocation_percent").unwrap().i32().unwrap();
    assert_eq!(allocation.get(0), Some(100));
    let states = df.column("state").unwrap().str().unwrap();
    assert_eq!(states.get(5), Some("weekend"));
    assert_eq!(states.get(7), Some("not_participating"));
    assert_eq!(states.get(9), Some("free"));
}
