//! Mapping between the in-memory project and the versioned snapshot format.

pub mod dto;
pub mod file;
pub mod migration;

use std::collections::HashSet;
use std::io;

use thiserror::Error;
use uuid::Uuid;

use crate::calendar::WorkCalendar;
use crate::config::EngineConfig;
use crate::directory::ResourceDirectory;
use crate::graph::TaskGraph;
use crate::metadata::ProjectMetadata;
use crate::project::Project;
use crate::resource::{
    Absence, Holiday, ParticipationInterval, Resource, ResourceAssignment, Role,
};
use crate::task::{Task, TaskId};

pub use dto::{
    AbsenceDto, AssignmentDto, CURRENT_FORMAT_VERSION, GroupDto, HolidayDto, ParticipationDto,
    ProjectSnapshot, RelationDto, ResourceDto, SplitTaskDto, TaskDto,
};
pub use file::{load_project_from_json, load_project_from_str, save_project_to_json};
pub use migration::{MigrationReport, migrate};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("unsupported format version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: i64, supported: u32 },
    #[error("malformed project file: {0}")]
    Malformed(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// A restored project plus everything that had to be repaired on the way.
#[derive(Debug)]
pub struct LoadedProject {
    pub project: Project,
    pub report: MigrationReport,
}

impl Project {
    pub fn to_snapshot(&self) -> ProjectSnapshot {
        let graph = self.tasks();
        let directory = self.resources();

        let mut tasks = Vec::new();
        let mut split_tasks = Vec::new();
        let mut groups = Vec::new();
        for task in graph.tasks() {
            tasks.push(task_dto(task));
            for part in graph.parts_of(task.id()) {
                if let Some(part) = graph.get(*part) {
                    split_tasks.push(SplitTaskDto {
                        id: part.id(),
                        name: part.name().to_string(),
                        start: part.start(),
                        duration: part.duration(),
                        complete: part.complete(),
                        split_task_id: task.id(),
                    });
                }
            }
            for member in graph.members_of(task.id()) {
                groups.push(GroupDto {
                    group_id: task.id(),
                    member_id: *member,
                });
            }
        }

        ProjectSnapshot {
            version: CURRENT_FORMAT_VERSION,
            project_name: Some(self.metadata().project_name.clone()),
            project_start: self.metadata().project_start_date,
            tasks,
            split_tasks,
            groups,
            relations: graph
                .relations()
                .map(|(precedent_id, dependant_id)| RelationDto {
                    precedent_id,
                    dependant_id,
                })
                .collect(),
            resources: directory
                .resources()
                .iter()
                .map(|r| ResourceDto {
                    id: r.id,
                    name: r.name.clone(),
                    initials: r.initials.clone(),
                    color: r.color.clone(),
                    role: i64::from(r.role.code()),
                })
                .collect(),
            assignments: directory
                .assignments()
                .iter()
                .map(|a| AssignmentDto {
                    id: a.id,
                    task_id: a.task,
                    resource_id: a.resource,
                    workload: a.workload(),
                    note: a.note.clone(),
                })
                .collect(),
            participation_intervals: directory
                .participations()
                .iter()
                .map(|p| ParticipationDto {
                    id: p.id,
                    resource_id: p.resource,
                    start_days: p.range().start(),
                    end_days: p.range().end(),
                    max_workload: p.max_workload(),
                    created_at: Some(p.created_at),
                })
                .collect(),
            absences: directory
                .absences()
                .iter()
                .map(|a| AbsenceDto {
                    id: a.id,
                    resource_id: a.resource,
                    start_days: a.range().start(),
                    end_days: a.range().end().unwrap_or(a.range().start().saturating_add(1)),
                    reason: a.reason.clone(),
                })
                .collect(),
            holidays: directory
                .holidays()
                .iter()
                .map(|h| HolidayDto {
                    id: h.id,
                    day_offset: h.day,
                    name: h.name.clone(),
                })
                .collect(),
        }
    }
}

fn task_dto(task: &Task) -> TaskDto {
    TaskDto {
        id: task.id(),
        name: task.name().to_string(),
        start: task.start(),
        duration: task.duration(),
        complete: task.complete(),
        is_collapsed: task.is_collapsed(),
        deadline: task.deadline(),
        note: task.note().map(str::to_string),
    }
}

fn fresh_id(id: Uuid) -> Uuid {
    if id.is_nil() { Uuid::new_v4() } else { id }
}

/// Rebuilds a project from a current-version snapshot. References that cannot
/// be resolved are dropped and reported; the load never fails.
pub fn restore_project(snapshot: ProjectSnapshot, config: &EngineConfig) -> LoadedProject {
    let mut report = MigrationReport {
        from_version: snapshot.version,
        warnings: Vec::new(),
    };
    let metadata = ProjectMetadata::new(
        snapshot
            .project_name
            .unwrap_or_else(|| ProjectMetadata::default().project_name),
        snapshot.project_start,
    );
    let calendar = WorkCalendar::from_config(metadata.project_start_date, &config.calendar);

    let mut graph = TaskGraph::new();
    let mut regenerated = 0usize;
    for dto in snapshot.tasks {
        if dto.id.is_nil() {
            regenerated += 1;
        }
        let mut task = Task::with_id(fresh_id(dto.id), dto.name)
            .starting_at(dto.start)
            .lasting(dto.duration)
            .completed(dto.complete)
            .collapsed(dto.is_collapsed);
        task = task.with_deadline(dto.deadline);
        if let Some(note) = dto.note.filter(|n| !n.is_empty()) {
            task = task.with_note(note);
        }
        if let Err(err) = graph.add(task) {
            report.warn(format!("task skipped: {err}"));
        }
    }
    if regenerated > 0 {
        report.warn(format!(
            "{regenerated} task(s) had empty identities and were given new ones"
        ));
    }

    restore_splits(&mut graph, snapshot.split_tasks, &mut report);

    if regenerated > 0 && !snapshot.groups.is_empty() {
        report.warn("group relations cleared because task identities were regenerated");
    } else {
        for group in snapshot.groups {
            if let Err(err) = graph.group(group.group_id, group.member_id) {
                report.warn(format!("group relation dropped: {err}"));
            }
        }
    }

    for relation in snapshot.relations {
        if let Err(err) = graph.relate(relation.precedent_id, relation.dependant_id) {
            report.warn(format!("dependency dropped: {err}"));
        }
    }

    let directory = restore_directory(
        &graph,
        snapshot.resources,
        snapshot.participation_intervals,
        snapshot.absences,
        snapshot.assignments,
        snapshot.holidays,
        &mut report,
    );

    LoadedProject {
        project: Project::from_parts(metadata, calendar, graph, directory),
        report,
    }
}

fn restore_splits(graph: &mut TaskGraph, parts: Vec<SplitTaskDto>, report: &mut MigrationReport) {
    let mut chains: Vec<(TaskId, Vec<Task>)> = Vec::new();
    for dto in parts {
        let part = Task::with_id(fresh_id(dto.id), dto.name)
            .starting_at(dto.start)
            .lasting(dto.duration)
            .completed(dto.complete);
        match chains.iter_mut().find(|(root, _)| *root == dto.split_task_id) {
            Some((_, chain)) => chain.push(part),
            None => chains.push((dto.split_task_id, vec![part])),
        }
    }
    for (root, chain) in chains {
        match graph.install_split(root, chain) {
            Ok(true) => report.warn(format!(
                "split parts of {root} were not contiguous and were repacked"
            )),
            Ok(false) => {}
            Err(err) => report.warn(format!("split of {root} dropped: {err}")),
        }
    }
}

fn restore_directory(
    graph: &TaskGraph,
    resources: Vec<ResourceDto>,
    participations: Vec<ParticipationDto>,
    absences: Vec<AbsenceDto>,
    assignments: Vec<AssignmentDto>,
    holidays: Vec<HolidayDto>,
    report: &mut MigrationReport,
) -> ResourceDirectory {
    let mut directory = ResourceDirectory::new();

    for dto in resources {
        let role = Role::from_code(dto.role).unwrap_or_else(|| {
            report.warn(format!("unknown role code {}, using Constructor", dto.role));
            Role::Constructor
        });
        let mut resource = Resource::new(dto.name, role);
        resource.id = fresh_id(dto.id);
        if !dto.initials.trim().is_empty() {
            resource.initials = dto.initials;
        }
        if !dto.color.trim().is_empty() {
            resource.color = dto.color;
        }
        if let Err(err) = directory.add_resource(resource) {
            report.warn(format!("resource skipped: {err}"));
        }
    }

    for dto in participations {
        let mut interval = ParticipationInterval::new(
            dto.resource_id,
            dto.start_days,
            dto.end_days,
            dto.max_workload,
        );
        interval.id = fresh_id(dto.id);
        if let Some(created_at) = dto.created_at {
            interval.created_at = created_at;
        }
        if let Err(err) = directory.add_participation(interval) {
            report.warn(format!("participation interval dropped: {err}"));
        }
    }
    let overlapping = directory.overlapping_participations();
    if !overlapping.is_empty() {
        report.warn(format!(
            "{} pair(s) of participation intervals overlap; the most recent one wins",
            overlapping.len()
        ));
    }

    for dto in absences {
        let mut absence = Absence::new(dto.resource_id, dto.start_days, dto.end_days);
        absence.id = fresh_id(dto.id);
        absence.reason = dto.reason.filter(|r| !r.is_empty());
        if let Err(err) = directory.add_absence(absence) {
            report.warn(format!("absence dropped: {err}"));
        }
    }

    let mut seen_pairs: HashSet<(TaskId, Uuid)> = HashSet::new();
    for dto in assignments {
        if !graph.contains(dto.task_id) {
            report.warn(format!("assignment dropped: task {} not found", dto.task_id));
            continue;
        }
        if !seen_pairs.insert((dto.task_id, dto.resource_id)) {
            report.warn(format!(
                "duplicate assignment of resource {} to task {}; loads add up",
                dto.resource_id, dto.task_id
            ));
        }
        let mut assignment = ResourceAssignment::new(dto.task_id, dto.resource_id)
            .with_workload(dto.workload)
            .with_note(dto.note);
        assignment.id = fresh_id(dto.id);
        if let Err(err) = directory.add_assignment(assignment) {
            report.warn(format!("assignment dropped: {err}"));
        }
    }

    for dto in holidays {
        let mut holiday = Holiday::new(dto.day_offset, dto.name);
        holiday.id = fresh_id(dto.id);
        if let Err(err) = directory.add_holiday(holiday) {
            report.warn(format!("holiday dropped: {err}"));
        }
    }

    directory
}
