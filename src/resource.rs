//! Resources and the calendar records that describe their availability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interval::DayRange;
use crate::task::TaskId;

pub type ResourceId = Uuid;

pub const MAX_WORKLOAD: i32 = 100;
pub const DEFAULT_WORKLOAD: i32 = 100;

pub(crate) fn clamp_workload(workload: i32) -> i32 {
    workload.clamp(0, MAX_WORKLOAD)
}

/// Staff role; determines how much of an assignment's nominal load counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Constructor,
    LeadSpecialist,
    ChiefConstructor,
}

impl Role {
    pub const ALL: [Role; 3] = [
        Role::Constructor,
        Role::LeadSpecialist,
        Role::ChiefConstructor,
    ];

    /// Workload coefficient applied to assignment percentages.
    pub fn coefficient(&self) -> f64 {
        match self {
            Role::Constructor => 1.0,
            Role::LeadSpecialist => 0.25,
            Role::ChiefConstructor => 0.10,
        }
    }

    /// Integer code used by the persisted snapshot.
    pub fn code(&self) -> i32 {
        match self {
            Role::Constructor => 0,
            Role::LeadSpecialist => 1,
            Role::ChiefConstructor => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Role> {
        match code {
            0 => Some(Role::Constructor),
            1 => Some(Role::LeadSpecialist),
            2 => Some(Role::ChiefConstructor),
            _ => None,
        }
    }

    /// Resolve the free-text role names written by early file versions.
    pub fn from_legacy_name(name: &str) -> Option<Role> {
        let normalized = name.trim().to_lowercase();
        match normalized.as_str() {
            "конструктор" | "constructor" => Some(Role::Constructor),
            "главный специалист" | "ведущий специалист" | "lead specialist"
            | "leadspecialist" => Some(Role::LeadSpecialist),
            "главный конструктор" | "chief constructor" | "chiefconstructor" => {
                Some(Role::ChiefConstructor)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Constructor => "constructor",
            Role::LeadSpecialist => "lead_specialist",
            Role::ChiefConstructor => "chief_constructor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub initials: String,
    /// Display color, `#RRGGBB`.
    pub color: String,
    pub role: Role,
}

impl Resource {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        let name = name.into();
        let initials = initials_of(&name);
        Self {
            id: Uuid::new_v4(),
            name,
            initials,
            color: "#4682B4".to_string(),
            role,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_initials(mut self, initials: impl Into<String>) -> Self {
        self.initials = initials.into();
        self
    }
}

fn initials_of(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

/// A period during which a resource takes part in the project, with the
/// maximum share of its time that may be allocated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipationInterval {
    pub id: Uuid,
    pub resource: ResourceId,
    range: DayRange,
    max_workload: i32,
    pub created_at: DateTime<Utc>,
}

impl ParticipationInterval {
    pub fn new(resource: ResourceId, start: i64, end: Option<i64>, max_workload: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource,
            range: DayRange::new(start, end),
            max_workload: clamp_workload(max_workload),
            created_at: Utc::now(),
        }
    }

    pub fn created(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn range(&self) -> DayRange {
        self.range
    }

    pub fn max_workload(&self) -> i32 {
        self.max_workload
    }

    pub fn set_range(&mut self, start: i64, end: Option<i64>) {
        self.range = DayRange::new(start, end);
    }

    pub fn set_max_workload(&mut self, max_workload: i32) {
        self.max_workload = clamp_workload(max_workload);
    }

    pub fn contains_day(&self, day: i64) -> bool {
        self.range.contains_day(day)
    }

    /// Overlap only counts between distinct intervals of the same resource.
    pub fn overlaps_with(&self, other: &ParticipationInterval) -> bool {
        self.id != other.id && self.resource == other.resource && self.range.overlaps(&other.range)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Absence {
    pub id: Uuid,
    pub resource: ResourceId,
    range: DayRange,
    pub reason: Option<String>,
}

impl Absence {
    pub fn new(resource: ResourceId, start: i64, end: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource,
            range: DayRange::bounded(start, end),
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn range(&self) -> DayRange {
        self.range
    }

    pub fn set_range(&mut self, start: i64, end: i64) {
        self.range = DayRange::bounded(start, end);
    }

    pub fn contains_day(&self, day: i64) -> bool {
        self.range.contains_day(day)
    }

    pub fn overlaps_with(&self, other: &Absence) -> bool {
        self.id != other.id && self.resource == other.resource && self.range.overlaps(&other.range)
    }
}

/// Links a resource to a task with a nominal workload percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAssignment {
    pub id: Uuid,
    pub task: TaskId,
    pub resource: ResourceId,
    workload: i32,
    pub note: String,
}

impl ResourceAssignment {
    pub fn new(task: TaskId, resource: ResourceId) -> Self {
        Self {
            id: Uuid::new_v4(),
            task,
            resource,
            workload: DEFAULT_WORKLOAD,
            note: String::new(),
        }
    }

    pub fn with_workload(mut self, workload: i32) -> Self {
        self.workload = clamp_workload(workload);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn workload(&self) -> i32 {
        self.workload
    }

    pub fn set_workload(&mut self, workload: i32) {
        self.workload = clamp_workload(workload);
    }
}

/// A project-wide non-working day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holiday {
    pub id: Uuid,
    pub day: i64,
    pub name: Option<String>,
}

impl Holiday {
    pub fn new(day: i64, name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            day,
            name,
        }
    }
}
