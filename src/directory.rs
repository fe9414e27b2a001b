//! Resource directory: resources, participation, absences, assignments and
//! holidays, mutated through reversible [`DirectoryEdit`]s.

use tracing::debug;
use uuid::Uuid;

use crate::error::{ScheduleError, ScheduleResult};
use crate::resource::{
    Absence, Holiday, ParticipationInterval, Resource, ResourceAssignment, ResourceId,
};
use crate::task::TaskId;

/// One row of any directory collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Resource(Resource),
    Participation(ParticipationInterval),
    Absence(Absence),
    Assignment(ResourceAssignment),
    Holiday(Holiday),
}

/// Identifies a row of a directory collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Resource(ResourceId),
    Participation(Uuid),
    Absence(Uuid),
    Assignment(Uuid),
    Holiday(Uuid),
}

/// A single reversible directory mutation. Applying an edit yields its inverse.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryEdit {
    Insert { record: Record, index: Option<usize> },
    Remove(RecordKey),
    Replace(Record),
}

impl Record {
    pub fn key(&self) -> RecordKey {
        match self {
            Record::Resource(r) => RecordKey::Resource(r.id),
            Record::Participation(p) => RecordKey::Participation(p.id),
            Record::Absence(a) => RecordKey::Absence(a.id),
            Record::Assignment(a) => RecordKey::Assignment(a.id),
            Record::Holiday(h) => RecordKey::Holiday(h.id),
        }
    }

    /// Resource this record belongs to, if any.
    pub fn resource(&self) -> Option<ResourceId> {
        match self {
            Record::Resource(r) => Some(r.id),
            Record::Participation(p) => Some(p.resource),
            Record::Absence(a) => Some(a.resource),
            Record::Assignment(a) => Some(a.resource),
            Record::Holiday(_) => None,
        }
    }

    // Deserialized records may bypass the clamping constructors.
    fn normalized(self) -> Self {
        match self {
            Record::Participation(mut p) => {
                let range = p.range();
                p.set_range(range.start(), range.end());
                p.set_max_workload(p.max_workload());
                Record::Participation(p)
            }
            Record::Assignment(mut a) => {
                a.set_workload(a.workload());
                Record::Assignment(a)
            }
            other => other,
        }
    }
}

impl RecordKey {
    pub fn id(&self) -> Uuid {
        match self {
            RecordKey::Resource(id)
            | RecordKey::Participation(id)
            | RecordKey::Absence(id)
            | RecordKey::Assignment(id)
            | RecordKey::Holiday(id) => *id,
        }
    }
}

trait Keyed {
    fn key_id(&self) -> Uuid;
}

impl Keyed for Resource {
    fn key_id(&self) -> Uuid {
        self.id
    }
}

impl Keyed for ParticipationInterval {
    fn key_id(&self) -> Uuid {
        self.id
    }
}

impl Keyed for Absence {
    fn key_id(&self) -> Uuid {
        self.id
    }
}

impl Keyed for ResourceAssignment {
    fn key_id(&self) -> Uuid {
        self.id
    }
}

impl Keyed for Holiday {
    fn key_id(&self) -> Uuid {
        self.id
    }
}

fn insert_row<T: Keyed>(rows: &mut Vec<T>, row: T, index: Option<usize>) -> ScheduleResult<()> {
    let id = row.key_id();
    if rows.iter().any(|existing| existing.key_id() == id) {
        return Err(ScheduleError::DuplicateId(id));
    }
    match index {
        Some(index) if index <= rows.len() => rows.insert(index, row),
        _ => rows.push(row),
    }
    Ok(())
}

fn remove_row<T: Keyed>(rows: &mut Vec<T>, id: Uuid) -> ScheduleResult<(T, usize)> {
    let index = rows
        .iter()
        .position(|row| row.key_id() == id)
        .ok_or(ScheduleError::RecordNotFound(id))?;
    Ok((rows.remove(index), index))
}

fn replace_row<T: Keyed>(rows: &mut [T], row: T) -> ScheduleResult<T> {
    let id = row.key_id();
    let slot = rows
        .iter_mut()
        .find(|existing| existing.key_id() == id)
        .ok_or(ScheduleError::RecordNotFound(id))?;
    Ok(std::mem::replace(slot, row))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceDirectory {
    resources: Vec<Resource>,
    participations: Vec<ParticipationInterval>,
    absences: Vec<Absence>,
    assignments: Vec<ResourceAssignment>,
    holidays: Vec<Holiday>,
}

impl ResourceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn participations(&self) -> &[ParticipationInterval] {
        &self.participations
    }

    pub fn absences(&self) -> &[Absence] {
        &self.absences
    }

    pub fn assignments(&self) -> &[ResourceAssignment] {
        &self.assignments
    }

    pub fn holidays(&self) -> &[Holiday] {
        &self.holidays
    }

    pub fn resource(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    pub fn contains_resource(&self, id: ResourceId) -> bool {
        self.resource(id).is_some()
    }

    pub fn participations_of(
        &self,
        resource: ResourceId,
    ) -> impl Iterator<Item = &ParticipationInterval> {
        self.participations
            .iter()
            .filter(move |p| p.resource == resource)
    }

    pub fn absences_of(&self, resource: ResourceId) -> impl Iterator<Item = &Absence> {
        self.absences.iter().filter(move |a| a.resource == resource)
    }

    pub fn assignments_of(
        &self,
        resource: ResourceId,
    ) -> impl Iterator<Item = &ResourceAssignment> {
        self.assignments
            .iter()
            .filter(move |a| a.resource == resource)
    }

    pub fn assignments_for_task(&self, task: TaskId) -> impl Iterator<Item = &ResourceAssignment> {
        self.assignments.iter().filter(move |a| a.task == task)
    }

    /// Participation interval governing `day`. Overlapping intervals are a
    /// data error; the most recently created one wins (later rows break ties).
    pub fn covering_participation(
        &self,
        resource: ResourceId,
        day: i64,
    ) -> Option<&ParticipationInterval> {
        self.participations_of(resource)
            .filter(|p| p.contains_day(day))
            .max_by_key(|p| p.created_at)
    }

    pub fn absence_on(&self, resource: ResourceId, day: i64) -> Option<&Absence> {
        self.absences_of(resource).find(|a| a.contains_day(day))
    }

    pub fn holiday_on(&self, day: i64) -> Option<&Holiday> {
        self.holidays.iter().find(|h| h.day == day)
    }

    /// Pairs of participation intervals of the same resource that overlap.
    pub fn overlapping_participations(&self) -> Vec<(Uuid, Uuid)> {
        let mut pairs = Vec::new();
        for (i, a) in self.participations.iter().enumerate() {
            for b in &self.participations[i + 1..] {
                if a.overlaps_with(b) {
                    pairs.push((a.id, b.id));
                }
            }
        }
        pairs
    }

    pub fn record(&self, key: RecordKey) -> Option<Record> {
        let id = key.id();
        match key {
            RecordKey::Resource(_) => self.resource(id).cloned().map(Record::Resource),
            RecordKey::Participation(_) => self
                .participations
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .map(Record::Participation),
            RecordKey::Absence(_) => self
                .absences
                .iter()
                .find(|a| a.id == id)
                .cloned()
                .map(Record::Absence),
            RecordKey::Assignment(_) => self
                .assignments
                .iter()
                .find(|a| a.id == id)
                .cloned()
                .map(Record::Assignment),
            RecordKey::Holiday(_) => self
                .holidays
                .iter()
                .find(|h| h.id == id)
                .cloned()
                .map(Record::Holiday),
        }
    }

    /// Keys of every record that references `resource`, resource row excluded.
    pub fn dependents_of(&self, resource: ResourceId) -> Vec<RecordKey> {
        let mut keys: Vec<RecordKey> = self
            .assignments_of(resource)
            .map(|a| RecordKey::Assignment(a.id))
            .collect();
        keys.extend(self.absences_of(resource).map(|a| RecordKey::Absence(a.id)));
        keys.extend(
            self.participations_of(resource)
                .map(|p| RecordKey::Participation(p.id)),
        );
        keys
    }

    pub fn add_resource(&mut self, resource: Resource) -> ScheduleResult<()> {
        self.apply(DirectoryEdit::Insert {
            record: Record::Resource(resource),
            index: None,
        })
        .map(|_| ())
    }

    pub fn add_participation(&mut self, interval: ParticipationInterval) -> ScheduleResult<()> {
        self.apply(DirectoryEdit::Insert {
            record: Record::Participation(interval),
            index: None,
        })
        .map(|_| ())
    }

    pub fn add_absence(&mut self, absence: Absence) -> ScheduleResult<()> {
        self.apply(DirectoryEdit::Insert {
            record: Record::Absence(absence),
            index: None,
        })
        .map(|_| ())
    }

    /// Adds an assignment without checking the task; use the `EditDirectory`
    /// action to have the task verified against the graph.
    pub fn add_assignment(&mut self, assignment: ResourceAssignment) -> ScheduleResult<()> {
        self.apply(DirectoryEdit::Insert {
            record: Record::Assignment(assignment),
            index: None,
        })
        .map(|_| ())
    }

    pub fn add_holiday(&mut self, holiday: Holiday) -> ScheduleResult<()> {
        self.apply(DirectoryEdit::Insert {
            record: Record::Holiday(holiday),
            index: None,
        })
        .map(|_| ())
    }

    /// Applies an edit and returns the edit that undoes it.
    pub fn apply(&mut self, edit: DirectoryEdit) -> ScheduleResult<DirectoryEdit> {
        match edit {
            DirectoryEdit::Insert { record, index } => {
                let record = record.normalized();
                let key = record.key();
                self.check_references(&record)?;
                self.insert(record, index)?;
                debug!(?key, "directory record inserted");
                Ok(DirectoryEdit::Remove(key))
            }
            DirectoryEdit::Remove(key) => {
                if let RecordKey::Resource(id) = key {
                    if !self.dependents_of(id).is_empty() {
                        return Err(ScheduleError::ResourceInUse(id));
                    }
                }
                let (record, index) = self.remove(key)?;
                debug!(?key, "directory record removed");
                Ok(DirectoryEdit::Insert {
                    record,
                    index: Some(index),
                })
            }
            DirectoryEdit::Replace(record) => {
                let record = record.normalized();
                self.check_references(&record)?;
                let previous = self.replace(record)?;
                Ok(DirectoryEdit::Replace(previous))
            }
        }
    }

    fn check_references(&self, record: &Record) -> ScheduleResult<()> {
        match record {
            Record::Resource(_) | Record::Holiday(_) => Ok(()),
            other => match other.resource() {
                Some(resource) if !self.contains_resource(resource) => {
                    Err(ScheduleError::ResourceNotFound(resource))
                }
                _ => Ok(()),
            },
        }
    }

    fn insert(&mut self, record: Record, index: Option<usize>) -> ScheduleResult<()> {
        match record {
            Record::Resource(r) => insert_row(&mut self.resources, r, index),
            Record::Participation(p) => insert_row(&mut self.participations, p, index),
            Record::Absence(a) => insert_row(&mut self.absences, a, index),
            Record::Assignment(a) => insert_row(&mut self.assignments, a, index),
            Record::Holiday(h) => insert_row(&mut self.holidays, h, index),
        }
    }

    fn remove(&mut self, key: RecordKey) -> ScheduleResult<(Record, usize)> {
        let id = key.id();
        Ok(match key {
            RecordKey::Resource(_) => {
                let (r, i) = remove_row(&mut self.resources, id)?;
                (Record::Resource(r), i)
            }
            RecordKey::Participation(_) => {
                let (p, i) = remove_row(&mut self.participations, id)?;
                (Record::Participation(p), i)
            }
            RecordKey::Absence(_) => {
                let (a, i) = remove_row(&mut self.absences, id)?;
                (Record::Absence(a), i)
            }
            RecordKey::Assignment(_) => {
                let (a, i) = remove_row(&mut self.assignments, id)?;
                (Record::Assignment(a), i)
            }
            RecordKey::Holiday(_) => {
                let (h, i) = remove_row(&mut self.holidays, id)?;
                (Record::Holiday(h), i)
            }
        })
    }

    fn replace(&mut self, record: Record) -> ScheduleResult<Record> {
        Ok(match record {
            Record::Resource(r) => Record::Resource(replace_row(&mut self.resources, r)?),
            Record::Participation(p) => {
                Record::Participation(replace_row(&mut self.participations, p)?)
            }
            Record::Absence(a) => Record::Absence(replace_row(&mut self.absences, a)?),
            Record::Assignment(a) => Record::Assignment(replace_row(&mut self.assignments, a)?),
            Record::Holiday(h) => Record::Holiday(replace_row(&mut self.holidays, h)?),
        })
    }
}
