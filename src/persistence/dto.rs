//! Versioned snapshot records exchanged with the file layer.
//!
//! Field names are PascalCase. Time-like fields are written as whole day
//! counts but read leniently: integers, floats, numeric strings and
//! `d.hh:mm:ss` spans are all accepted, and anything else reads as zero.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::interval::MAX_DAY_OFFSET;
use crate::resource::{DEFAULT_WORKLOAD, Role};

pub const CURRENT_FORMAT_VERSION: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskDto {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_days")]
    pub start: i64,
    #[serde(default, deserialize_with = "lenient_days")]
    pub duration: i64,
    #[serde(default, deserialize_with = "lenient_fraction")]
    pub complete: f64,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_collapsed: bool,
    #[serde(default, deserialize_with = "lenient_optional_days")]
    pub deadline: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SplitTaskDto {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_days")]
    pub start: i64,
    #[serde(default, deserialize_with = "lenient_days")]
    pub duration: i64,
    #[serde(default, deserialize_with = "lenient_fraction")]
    pub complete: f64,
    pub split_task_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupDto {
    pub group_id: Uuid,
    pub member_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RelationDto {
    pub precedent_id: Uuid,
    pub dependant_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceDto {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub initials: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub color: String,
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssignmentDto {
    #[serde(default)]
    pub id: Uuid,
    pub task_id: Uuid,
    pub resource_id: Uuid,
    #[serde(default = "default_workload", deserialize_with = "lenient_percent")]
    pub workload: i32,
    #[serde(default, deserialize_with = "lenient_string")]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParticipationDto {
    #[serde(default)]
    pub id: Uuid,
    pub resource_id: Uuid,
    #[serde(default, deserialize_with = "lenient_days")]
    pub start_days: i64,
    #[serde(default, deserialize_with = "lenient_optional_days")]
    pub end_days: Option<i64>,
    #[serde(default = "default_workload", deserialize_with = "lenient_percent")]
    pub max_workload: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AbsenceDto {
    #[serde(default)]
    pub id: Uuid,
    pub resource_id: Uuid,
    #[serde(default, deserialize_with = "lenient_days")]
    pub start_days: i64,
    #[serde(default, deserialize_with = "lenient_days")]
    pub end_days: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HolidayDto {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default, deserialize_with = "lenient_days")]
    pub day_offset: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// The whole project in the current format version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectSnapshot {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    pub project_start: NaiveDate,
    #[serde(default)]
    pub tasks: Vec<TaskDto>,
    #[serde(default)]
    pub split_tasks: Vec<SplitTaskDto>,
    #[serde(default)]
    pub groups: Vec<GroupDto>,
    #[serde(default)]
    pub relations: Vec<RelationDto>,
    #[serde(default)]
    pub resources: Vec<ResourceDto>,
    #[serde(default)]
    pub assignments: Vec<AssignmentDto>,
    #[serde(default)]
    pub participation_intervals: Vec<ParticipationDto>,
    #[serde(default)]
    pub absences: Vec<AbsenceDto>,
    #[serde(default)]
    pub holidays: Vec<HolidayDto>,
}

fn default_workload() -> i32 {
    DEFAULT_WORKLOAD
}

/// Whole days of a time-like value.
pub(crate) fn parse_days(value: &Value) -> Option<i64> {
    let days = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_days_str(s),
        _ => None,
    };
    days.map(|days| days.clamp(-MAX_DAY_OFFSET, MAX_DAY_OFFSET))
}

fn parse_days_str(input: &str) -> Option<i64> {
    let s = input.trim();
    if let Ok(days) = s.parse::<i64>() {
        return Some(days);
    }
    if let Ok(days) = s.parse::<f64>() {
        return days.is_finite().then(|| days.trunc() as i64);
    }
    parse_span(s)
}

/// `[-][d.]hh:mm:ss[.fffffff]`; only the day component is kept.
fn parse_span(s: &str) -> Option<i64> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (days, clock) = match body.split_once(':') {
        Some((head, tail)) => match head.split_once('.') {
            Some((days, hours)) => (days.parse::<i64>().ok()?, format!("{hours}:{tail}")),
            None => (0, body.to_string()),
        },
        None => return None,
    };
    let mut fields = clock.split(':');
    let hours = fields.next()?.parse::<u32>().ok()?;
    let minutes = fields.next()?.parse::<u32>().ok()?;
    let seconds = fields.next().unwrap_or("0");
    let seconds_whole = seconds.split('.').next()?.parse::<u32>().ok()?;
    if fields.next().is_some() || hours > 23 || minutes > 59 || seconds_whole > 59 {
        return None;
    }
    Some(if negative { days.saturating_neg() } else { days })
}

pub(crate) fn parse_fraction(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

/// Role code from an integer, a numeric string or a legacy role name.
pub(crate) fn parse_role(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| Role::from_legacy_name(s).map(|r| i64::from(r.code()))),
        _ => None,
    }
}

fn lenient_days<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_days(&value).unwrap_or(0))
}

fn lenient_optional_days<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_days(&value))
}

fn lenient_fraction<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_fraction(&value).unwrap_or(0.0))
}

fn lenient_percent<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let percent = parse_fraction(&value).map_or(DEFAULT_WORKLOAD, |f| f.round() as i32);
    Ok(percent)
}

fn lenient_role<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_role(&value).unwrap_or(0))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn time_like_values_resolve_to_days() {
        assert_eq!(parse_days(&json!(12)), Some(12));
        assert_eq!(parse_days(&json!(3.9)), Some(3));
        assert_eq!(parse_days(&json!("7")), Some(7));
        assert_eq!(parse_days(&json!("5.00:00:00")), Some(5));
        assert_eq!(parse_days(&json!("14.12:30:00.5000000")), Some(14));
        assert_eq!(parse_days(&json!("-2.00:00:00")), Some(-2));
        assert_eq!(parse_days(&json!("08:00:00")), Some(0));
        assert_eq!(parse_days(&json!("tomorrow")), None);
        assert_eq!(parse_days(&json!(null)), None);
        assert_eq!(parse_days(&json!(1e300)), Some(MAX_DAY_OFFSET));
        assert_eq!(parse_days(&json!(i64::MIN)), Some(-MAX_DAY_OFFSET));
        assert_eq!(parse_days(&json!("99999999999.00:00:00")), Some(MAX_DAY_OFFSET));
    }

    #[test]
    fn malformed_task_fields_fall_back_to_zero() {
        let dto: TaskDto = serde_json::from_value(json!({
            "Id": "00000000-0000-0000-0000-000000000000",
            "Name": "Legacy",
            "Start": "soon",
            "Duration": "3.00:00:00",
            "Complete": "0.25",
        }))
        .unwrap();
        assert!(dto.id.is_nil());
        assert_eq!(dto.start, 0);
        assert_eq!(dto.duration, 3);
        assert_eq!(dto.complete, 0.25);
        assert_eq!(dto.deadline, None);
    }

    #[test]
    fn role_accepts_codes_and_legacy_names() {
        assert_eq!(parse_role(&json!(2)), Some(2));
        assert_eq!(parse_role(&json!("1")), Some(1));
        assert_eq!(parse_role(&json!("Главный специалист")), Some(1));
        assert_eq!(parse_role(&json!("Intern")), None);
    }
}
