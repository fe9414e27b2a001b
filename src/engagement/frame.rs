use chrono::NaiveDate;
use polars::prelude::*;

use super::DayStatus;

fn date_to_i32(date: NaiveDate) -> Option<i32> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    i32::try_from((date - epoch).num_days()).ok()
}

/// Flattens day statuses into one row per resource-day.
pub fn status_frame(statuses: &[DayStatus]) -> PolarsResult<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(9);

    let resource_ids: Vec<String> = statuses.iter().map(|s| s.resource.to_string()).collect();
    columns.push(Series::new(PlSmallStr::from_static("resource_id"), resource_ids).into_column());

    let days: Vec<i64> = statuses.iter().map(|s| s.day).collect();
    columns.push(Series::new(PlSmallStr::from_static("day"), days).into_column());

    let dates: Vec<Option<i32>> = statuses
        .iter()
        .map(|s| s.date.and_then(date_to_i32))
        .collect();
    columns.push(
        Series::new(PlSmallStr::from_static("date"), dates)
            .cast(&DataType::Date)?
            .into_column(),
    );

    let states: Vec<&str> = statuses.iter().map(|s| s.state.as_str()).collect();
    columns.push(Series::new(PlSmallStr::from_static("state"), states).into_column());

    let allocation: Vec<i32> = statuses.iter().map(|s| s.allocation_percent).collect();
    columns.push(
        Series::new(PlSmallStr::from_static("allocation_percent"), allocation).into_column(),
    );

    let max_workload: Vec<i32> = statuses.iter().map(|s| s.max_workload).collect();
    columns.push(Series::new(PlSmallStr::from_static("max_workload"), max_workload).into_column());

    let fill: Vec<f64> = statuses.iter().map(DayStatus::fill_ratio).collect();
    columns.push(Series::new(PlSmallStr::from_static("fill_ratio"), fill).into_column());

    let available: Vec<i32> = statuses.iter().map(DayStatus::available_capacity).collect();
    columns.push(
        Series::new(PlSmallStr::from_static("available_capacity"), available).into_column(),
    );

    let holidays: Vec<Option<&str>> = statuses.iter().map(|s| s.holiday.as_deref()).collect();
    columns.push(Series::new(PlSmallStr::from_static("holiday"), holidays).into_column());

    DataFrame::new(columns)
}
