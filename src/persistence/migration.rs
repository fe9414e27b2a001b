//! Upgrades older snapshot shapes to the current format version.
//!
//! Version 1 stored the role as free text and a single `MaxWorkload` per
//! resource; version 2 introduced integer role codes and participation
//! intervals; version 3 added holidays. Migration works on the raw JSON value
//! so every historical shape is accepted before typed parsing starts.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::warn;
use uuid::Uuid;

use super::dto::{CURRENT_FORMAT_VERSION, ProjectSnapshot, parse_fraction, parse_role};
use super::{PersistenceError, PersistenceResult};
use crate::metadata::ProjectMetadata;
use crate::resource::{DEFAULT_WORKLOAD, clamp_workload};

/// Problems recovered from while loading; the load itself succeeded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub warnings: Vec<String>,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "project load");
        self.warnings.push(message);
    }
}

/// Brings any supported snapshot value up to the current version and parses it.
pub fn migrate(mut root: Value) -> PersistenceResult<(ProjectSnapshot, MigrationReport)> {
    let object = root
        .as_object_mut()
        .ok_or_else(|| PersistenceError::Malformed("snapshot root is not an object".into()))?;
    let mut report = MigrationReport::default();

    let version = match object.get("Version") {
        None | Some(Value::Null) => 1,
        Some(value) => match read_version(value) {
            Some(v) if v > i64::from(CURRENT_FORMAT_VERSION) => {
                return Err(PersistenceError::UnsupportedVersion {
                    found: v,
                    supported: CURRENT_FORMAT_VERSION,
                });
            }
            Some(v) if v >= 1 => v as u32,
            _ => {
                report.warn(format!("unreadable format version {value}, assuming 1"));
                1
            }
        },
    };
    report.from_version = version;

    if version < 2 {
        upgrade_v1_to_v2(object, &mut report);
    }
    if version < 3 {
        upgrade_v2_to_v3(object);
    }
    object.insert("Version".into(), json!(CURRENT_FORMAT_VERSION));

    let snapshot = ProjectSnapshot {
        version: CURRENT_FORMAT_VERSION,
        project_name: object
            .get("ProjectName")
            .and_then(Value::as_str)
            .map(str::to_string),
        project_start: project_start(object, &mut report),
        tasks: section(object, "Tasks", &mut report),
        split_tasks: section(object, "SplitTasks", &mut report),
        groups: section(object, "Groups", &mut report),
        relations: section(object, "Relations", &mut report),
        resources: section(object, "Resources", &mut report),
        assignments: section(object, "Assignments", &mut report),
        participation_intervals: section(object, "ParticipationIntervals", &mut report),
        absences: section(object, "Absences", &mut report),
        holidays: section(object, "Holidays", &mut report),
    };
    Ok((snapshot, report))
}

/// Role names become codes and each resource's `MaxWorkload` becomes an
/// unbounded participation interval starting at day 0.
/// Integral numbers and numeric strings; anything else is unreadable.
fn read_version(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn upgrade_v1_to_v2(object: &mut Map<String, Value>, report: &mut MigrationReport) {
    // resources that already carry intervals keep them as they are
    let covered: Vec<Value> = match object.get("ParticipationIntervals") {
        Some(Value::Array(existing)) => existing
            .iter()
            .filter_map(|interval| interval.get("ResourceId").cloned())
            .collect(),
        _ => Vec::new(),
    };
    let mut synthesized = Vec::new();
    if let Some(Value::Array(resources)) = object.get_mut("Resources") {
        for resource in resources.iter_mut() {
            let Some(fields) = resource.as_object_mut() else {
                continue;
            };
            if let Some(role) = fields.get("Role") {
                let code = parse_role(role).unwrap_or_else(|| {
                    report.warn(format!("unknown role {role}, using Constructor"));
                    0
                });
                fields.insert("Role".into(), json!(code));
            }
            let max_workload = fields
                .remove("MaxWorkload")
                .and_then(|v| parse_fraction(&v))
                .map_or(DEFAULT_WORKLOAD, |f| clamp_workload(f.round() as i32));
            if let Some(id) = fields.get("Id").filter(|id| !covered.contains(id)).cloned() {
                synthesized.push(json!({
                    "Id": Uuid::new_v4(),
                    "ResourceId": id,
                    "StartDays": 0,
                    "EndDays": null,
                    "MaxWorkload": max_workload,
                }));
            }
        }
    }
    match object.get_mut("ParticipationIntervals") {
        Some(Value::Array(existing)) => existing.extend(synthesized),
        _ => {
            object.insert("ParticipationIntervals".into(), Value::Array(synthesized));
        }
    }
}

fn upgrade_v2_to_v3(object: &mut Map<String, Value>) {
    if !matches!(object.get("Holidays"), Some(Value::Array(_))) {
        object.insert("Holidays".into(), Value::Array(Vec::new()));
    }
}

fn project_start(object: &Map<String, Value>, report: &mut MigrationReport) -> NaiveDate {
    let fallback = ProjectMetadata::default().project_start_date;
    match object.get("ProjectStart") {
        Some(Value::String(text)) => {
            let date_part = text.get(..10).unwrap_or(text);
            NaiveDate::parse_from_str(date_part, "%Y-%m-%d").unwrap_or_else(|_| {
                report.warn(format!("invalid project start '{text}', using {fallback}"));
                fallback
            })
        }
        Some(Value::Null) | None => {
            report.warn(format!("missing project start, using {fallback}"));
            fallback
        }
        Some(other) => {
            report.warn(format!("invalid project start {other}, using {fallback}"));
            fallback
        }
    }
}

/// Parses a list element by element, dropping the ones that do not fit.
fn section<T: DeserializeOwned>(
    object: &Map<String, Value>,
    key: &str,
    report: &mut MigrationReport,
) -> Vec<T> {
    match object.get(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value::<T>(item.clone()) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    report.warn(format!("{key}[{index}] dropped: {err}"));
                    None
                }
            })
            .collect(),
        Some(_) => {
            report.warn(format!("{key} is not a list, ignored"));
            Vec::new()
        }
    }
}
