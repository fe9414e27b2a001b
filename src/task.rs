use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interval::{DayRange, MAX_DAY_OFFSET};

pub type TaskId = Uuid;

/// A schedulable unit of work. Offsets and durations are whole days relative
/// to the project start.
///
/// Fields are only writable through [`crate::graph::TaskGraph`] once a task has
/// been added; the builder methods below clamp values the same way the graph
/// mutators do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: String,
    start: i64,
    duration: i64,
    complete: f64,
    deadline: Option<i64>,
    note: Option<String>,
    is_collapsed: bool,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    pub fn with_id(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            start: 0,
            duration: 1,
            complete: 0.0,
            deadline: None,
            note: None,
            is_collapsed: false,
        }
    }

    pub fn starting_at(mut self, start: i64) -> Self {
        self.set_start(start);
        self
    }

    pub fn lasting(mut self, duration: i64) -> Self {
        self.set_duration(duration);
        self
    }

    pub fn completed(mut self, complete: f64) -> Self {
        self.complete = clamp_complete(complete);
        self
    }

    pub fn with_deadline(mut self, deadline: Option<i64>) -> Self {
        self.deadline = deadline.map(|d| d.max(self.end()));
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn collapsed(mut self, is_collapsed: bool) -> Self {
        self.is_collapsed = is_collapsed;
        self
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// Exclusive end offset, `start + duration`.
    pub fn end(&self) -> i64 {
        self.start.saturating_add(self.duration)
    }

    pub fn complete(&self) -> f64 {
        self.complete
    }

    pub fn deadline(&self) -> Option<i64> {
        self.deadline
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn is_collapsed(&self) -> bool {
        self.is_collapsed
    }

    pub fn span(&self) -> DayRange {
        DayRange::bounded(self.start, self.end())
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_start(&mut self, start: i64) {
        self.start = clamp_start(start);
        self.pull_deadline_to_end();
    }

    pub(crate) fn set_duration(&mut self, duration: i64) {
        self.duration = clamp_duration(duration);
        self.pull_deadline_to_end();
    }

    pub(crate) fn set_complete(&mut self, complete: f64) {
        self.complete = clamp_complete(complete);
    }

    pub(crate) fn set_deadline(&mut self, deadline: Option<i64>) {
        self.deadline = deadline.map(|d| d.max(self.end()));
    }

    fn pull_deadline_to_end(&mut self) {
        let end = self.end();
        if let Some(deadline) = self.deadline.as_mut() {
            *deadline = (*deadline).max(end);
        }
    }

    pub(crate) fn set_note(&mut self, note: Option<String>) {
        self.note = note;
    }

    pub(crate) fn set_collapsed(&mut self, is_collapsed: bool) {
        self.is_collapsed = is_collapsed;
    }
}

pub(crate) fn clamp_start(start: i64) -> i64 {
    start.clamp(0, MAX_DAY_OFFSET)
}

pub(crate) fn clamp_duration(duration: i64) -> i64 {
    duration.clamp(1, MAX_DAY_OFFSET)
}

pub(crate) fn clamp_complete(complete: f64) -> f64 {
    if complete.is_nan() {
        0.0
    } else {
        complete.clamp(0.0, 1.0)
    }
}
