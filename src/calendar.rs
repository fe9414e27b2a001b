use chrono::{Datelike, NaiveDate, TimeDelta, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::interval::DayRange;

/// Maps project day offsets onto calendar dates and knows the working week.
///
/// Day `0` is the project start date. Holidays are project records kept by the
/// resource directory; the calendar only answers weekday questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    project_start: NaiveDate,
    non_working_days: HashSet<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCalendarConfig {
    working_days: Vec<Weekday>,
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn new(project_start: NaiveDate) -> Self {
        Self::from_config(project_start, &WorkCalendarConfig::default())
    }

    pub fn from_config(project_start: NaiveDate, config: &WorkCalendarConfig) -> Self {
        let working: HashSet<Weekday> = config.working_days.iter().copied().collect();
        let non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working.contains(day))
            .collect();
        Self {
            project_start,
            non_working_days,
        }
    }

    pub fn to_config(&self) -> WorkCalendarConfig {
        WorkCalendarConfig::from(self)
    }

    pub fn project_start(&self) -> NaiveDate {
        self.project_start
    }

    pub fn set_project_start(&mut self, date: NaiveDate) {
        self.project_start = date;
    }

    /// Set custom working days (e.g., Mon-Sat for 6-day weeks)
    pub fn set_working_days(&mut self, days: Vec<Weekday>) {
        self.non_working_days.clear();
        for day in Self::ALL_WEEKDAYS {
            if !days.contains(&day) {
                self.non_working_days.insert(day);
            }
        }
    }

    /// Calendar date of a day offset, `None` when it falls outside chrono's range.
    pub fn date_of(&self, day: i64) -> Option<NaiveDate> {
        let delta = TimeDelta::try_days(day)?;
        self.project_start.checked_add_signed(delta)
    }

    pub fn day_of(&self, date: NaiveDate) -> i64 {
        (date - self.project_start).num_days()
    }

    pub fn is_working_day(&self, day: i64) -> bool {
        self.date_of(day)
            .is_some_and(|date| !self.non_working_days.contains(&date.weekday()))
    }

    pub fn is_weekend(&self, day: i64) -> bool {
        self.date_of(day)
            .is_some_and(|date| self.non_working_days.contains(&date.weekday()))
    }

    /// Next working day strictly after `day`.
    pub fn next_working_day(&self, day: i64) -> Option<i64> {
        if self.non_working_days.len() == Self::ALL_WEEKDAYS.len() {
            return None;
        }
        let mut current = day + 1;
        while !self.is_working_day(current) {
            self.date_of(current)?;
            current += 1;
        }
        Some(current)
    }

    /// Count working days in a bounded range; unbounded ranges yield `None`.
    pub fn working_days_in(&self, range: DayRange) -> Option<i64> {
        let end = range.end()?;
        Some(
            (range.start()..end)
                .filter(|day| self.is_working_day(*day))
                .count() as i64,
        )
    }
}

impl WorkCalendarConfig {
    pub fn new<I>(working_days: I) -> Self
    where
        I: IntoIterator<Item = Weekday>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup_by(|a, b| a.num_days_from_monday() == b.num_days_from_monday());
        Self {
            working_days: working,
        }
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }
}

impl Default for WorkCalendarConfig {
    fn default() -> Self {
        Self::new([
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ])
    }
}

impl From<&WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: &WorkCalendar) -> Self {
        Self::new(
            WorkCalendar::ALL_WEEKDAYS
                .into_iter()
                .filter(|day| !calendar.non_working_days.contains(day)),
        )
    }
}
