//! Per-resource, per-day engagement status.
//!
//! The engine is a read-only projection over the task graph, the resource
//! directory and the work calendar. Nothing is cached; every query recomputes
//! from the current state.

mod frame;

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::trace;
use uuid::Uuid;

use crate::calendar::WorkCalendar;
use crate::directory::ResourceDirectory;
use crate::error::{ScheduleError, ScheduleResult};
use crate::graph::TaskGraph;
use crate::interval::DayRange;
use crate::resource::{Resource, ResourceId};
use crate::task::TaskId;

pub use frame::status_frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayState {
    Free,
    Absence,
    NotParticipating,
    PartialAssigned,
    Assigned,
    Overbooked,
    Weekend,
}

impl DayState {
    pub const ALL: [DayState; 7] = [
        DayState::Overbooked,
        DayState::Assigned,
        DayState::PartialAssigned,
        DayState::Absence,
        DayState::NotParticipating,
        DayState::Free,
        DayState::Weekend,
    ];

    /// Visual priority; lower wins when several signals share one cell.
    pub fn priority(&self) -> u8 {
        match self {
            DayState::Overbooked => 1,
            DayState::Assigned => 2,
            DayState::PartialAssigned => 3,
            DayState::Absence => 4,
            DayState::NotParticipating => 5,
            DayState::Free => 6,
            DayState::Weekend => 7,
        }
    }

    pub fn most_significant<I>(states: I) -> Option<DayState>
    where
        I: IntoIterator<Item = DayState>,
    {
        states.into_iter().min_by_key(DayState::priority)
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, DayState::Overbooked)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayState::Free => "free",
            DayState::Absence => "absence",
            DayState::NotParticipating => "not_participating",
            DayState::PartialAssigned => "partial_assigned",
            DayState::Assigned => "assigned",
            DayState::Overbooked => "overbooked",
            DayState::Weekend => "weekend",
        }
    }
}

/// An assignment whose task is being worked on that day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveAssignment {
    pub assignment: Uuid,
    pub task: TaskId,
    pub workload: i32,
    /// Workload after the role coefficient.
    pub effective_load: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayStatus {
    pub resource: ResourceId,
    pub day: i64,
    pub date: Option<NaiveDate>,
    pub is_participating: bool,
    /// Zero when the resource does not participate that day.
    pub max_workload: i32,
    pub is_absent: bool,
    pub absence_reason: Option<String>,
    pub assignments: Vec<ActiveAssignment>,
    pub allocation_percent: i32,
    pub state: DayState,
    pub holiday: Option<String>,
    pub is_weekend: bool,
}

impl DayStatus {
    pub fn fill_ratio(&self) -> f64 {
        if self.max_workload > 0 {
            (self.allocation_percent as f64 / self.max_workload as f64).min(1.0)
        } else if self.allocation_percent > 0 {
            1.0
        } else {
            0.0
        }
    }

    pub fn available_capacity(&self) -> i32 {
        (self.max_workload - self.allocation_percent).max(0)
    }
}

/// Aggregate of a resource's states over a day range.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngagementSummary {
    pub days: usize,
    pub counts: HashMap<DayState, usize>,
    pub peak_allocation: i32,
    pub overbooked_days: Vec<i64>,
}

impl EngagementSummary {
    pub fn count(&self, state: DayState) -> usize {
        self.counts.get(&state).copied().unwrap_or(0)
    }
}

pub struct EngagementEngine<'a> {
    tasks: &'a TaskGraph,
    directory: &'a ResourceDirectory,
    calendar: &'a WorkCalendar,
}

impl<'a> EngagementEngine<'a> {
    pub fn new(
        tasks: &'a TaskGraph,
        directory: &'a ResourceDirectory,
        calendar: &'a WorkCalendar,
    ) -> Self {
        Self {
            tasks,
            directory,
            calendar,
        }
    }

    pub fn day_status(&self, resource: ResourceId, day: i64) -> ScheduleResult<DayStatus> {
        let resource = self
            .directory
            .resource(resource)
            .ok_or(ScheduleError::ResourceNotFound(resource))?;
        Ok(self.compute(resource, day))
    }

    /// Statuses for every day of a bounded range.
    pub fn range(&self, resource: ResourceId, range: DayRange) -> ScheduleResult<Vec<DayStatus>> {
        let end = bounded_end(range)?;
        let resource = self
            .directory
            .resource(resource)
            .ok_or(ScheduleError::ResourceNotFound(resource))?;
        Ok((range.start()..end)
            .map(|day| self.compute(resource, day))
            .collect())
    }

    /// Statuses for every resource, resource-major in directory order.
    pub fn grid(&self, range: DayRange) -> ScheduleResult<Vec<DayStatus>> {
        let end = bounded_end(range)?;
        let mut out = Vec::new();
        for resource in self.directory.resources() {
            out.extend((range.start()..end).map(|day| self.compute(resource, day)));
        }
        Ok(out)
    }

    pub fn summarize(
        &self,
        resource: ResourceId,
        range: DayRange,
    ) -> ScheduleResult<EngagementSummary> {
        let statuses = self.range(resource, range)?;
        let mut summary = EngagementSummary {
            days: statuses.len(),
            ..EngagementSummary::default()
        };
        for status in &statuses {
            *summary.counts.entry(status.state).or_insert(0) += 1;
            summary.peak_allocation = summary.peak_allocation.max(status.allocation_percent);
            if status.state.is_conflict() {
                summary.overbooked_days.push(status.day);
            }
        }
        Ok(summary)
    }

    /// Every overbooked resource-day in the range.
    pub fn conflicts(&self, range: DayRange) -> ScheduleResult<Vec<DayStatus>> {
        Ok(self
            .grid(range)?
            .into_iter()
            .filter(|status| status.state.is_conflict())
            .collect())
    }

    /// Overbooked days of the task's assignees while the task is worked on.
    pub fn task_conflicts(&self, task: TaskId) -> ScheduleResult<Vec<DayStatus>> {
        let span = self.tasks.task(task)?.span();
        let mut assignees: Vec<ResourceId> = Vec::new();
        for assignment in self.directory.assignments_for_task(task) {
            if !assignees.contains(&assignment.resource) {
                assignees.push(assignment.resource);
            }
        }

        let mut out = Vec::new();
        for resource in assignees {
            let Some(resource) = self.directory.resource(resource) else {
                continue;
            };
            for day in span.start()..span.end().unwrap_or(span.start().saturating_add(1)) {
                if !self.tasks.occupies_day(task, day) {
                    continue;
                }
                let status = self.compute(resource, day);
                if status.state.is_conflict() {
                    out.push(status);
                }
            }
        }
        Ok(out)
    }

    fn compute(&self, resource: &Resource, day: i64) -> DayStatus {
        let mut status = DayStatus {
            resource: resource.id,
            day,
            date: self.calendar.date_of(day),
            is_participating: false,
            max_workload: 0,
            is_absent: false,
            absence_reason: None,
            assignments: Vec::new(),
            allocation_percent: 0,
            state: DayState::NotParticipating,
            holiday: self
                .directory
                .holiday_on(day)
                .map(|h| h.name.clone().unwrap_or_default()),
            is_weekend: self.calendar.is_weekend(day),
        };

        let Some(participation) = self.directory.covering_participation(resource.id, day) else {
            trace!(resource = %resource.id, day, "not participating");
            return status;
        };
        status.is_participating = true;
        status.max_workload = participation.max_workload();

        let coefficient = resource.role.coefficient();
        status.assignments = self
            .directory
            .assignments_of(resource.id)
            .filter(|a| self.tasks.occupies_day(a.task, day))
            .map(|a| ActiveAssignment {
                assignment: a.id,
                task: a.task,
                workload: a.workload(),
                effective_load: a.workload() as f64 * coefficient,
            })
            .collect();
        let load: f64 = status.assignments.iter().map(|a| a.effective_load).sum();
        status.allocation_percent = load.round() as i32;

        if let Some(absence) = self.directory.absence_on(resource.id, day) {
            status.is_absent = true;
            status.absence_reason = absence.reason.clone();
            status.state = if status.assignments.is_empty() {
                DayState::Absence
            } else {
                DayState::Overbooked
            };
        } else {
            status.state = classify(status.allocation_percent, status.max_workload);
            if status.state == DayState::Free && status.is_weekend {
                status.state = DayState::Weekend;
            }
        }
        trace!(
            resource = %resource.id,
            day,
            allocation = status.allocation_percent,
            state = status.state.as_str(),
            "day status computed"
        );
        status
    }
}

fn classify(allocation: i32, max_workload: i32) -> DayState {
    if allocation == 0 {
        DayState::Free
    } else if allocation < max_workload {
        DayState::PartialAssigned
    } else if allocation == max_workload {
        DayState::Assigned
    } else {
        DayState::Overbooked
    }
}

fn bounded_end(range: DayRange) -> ScheduleResult<i64> {
    range
        .end()
        .ok_or_else(|| ScheduleError::invalid("engagement ranges must be bounded"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_thresholds() {
        assert_eq!(classify(0, 100), DayState::Free);
        assert_eq!(classify(1, 100), DayState::PartialAssigned);
        assert_eq!(classify(100, 100), DayState::Assigned);
        assert_eq!(classify(101, 100), DayState::Overbooked);
        assert_eq!(classify(5, 0), DayState::Overbooked);
    }

    #[test]
    fn most_significant_prefers_lowest_priority_number() {
        let picked = DayState::most_significant([
            DayState::Free,
            DayState::Absence,
            DayState::PartialAssigned,
        ]);
        assert_eq!(picked, Some(DayState::PartialAssigned));
        assert_eq!(DayState::most_significant(std::iter::empty()), None);
        assert!(DayState::Weekend.priority() > DayState::Free.priority());
    }

    #[test]
    fn fill_ratio_and_capacity() {
        let mut status = DayStatus {
            resource: Uuid::nil(),
            day: 0,
            date: None,
            is_participating: true,
            max_workload: 80,
            is_absent: false,
            absence_reason: None,
            assignments: Vec::new(),
            allocation_percent: 40,
            state: DayState::PartialAssigned,
            holiday: None,
            is_weekend: false,
        };
        assert_eq!(status.fill_ratio(), 0.5);
        assert_eq!(status.available_capacity(), 40);

        status.allocation_percent = 120;
        assert_eq!(status.fill_ratio(), 1.0);
        assert_eq!(status.available_capacity(), 0);

        status.max_workload = 0;
        status.allocation_percent = 0;
        assert_eq!(status.fill_ratio(), 0.0);
    }
}
