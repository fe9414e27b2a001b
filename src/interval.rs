//! Half-open day ranges shared by participation, absence and task spans.
//!
//! A range `[start, end)` includes `start` and excludes `end`. An `end` of
//! `None` is unbounded. Ranges are always non-empty: a bounded range whose end
//! does not lie after its start is corrected to a single day.

use serde::{Deserialize, Serialize};

/// Largest day offset accepted anywhere in a project, about ten thousand years.
pub const MAX_DAY_OFFSET: i64 = 3_652_425;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawDayRange", into = "RawDayRange")]
pub struct DayRange {
    start: i64,
    end: Option<i64>,
}

#[derive(Serialize, Deserialize)]
struct RawDayRange {
    start: i64,
    end: Option<i64>,
}

impl From<RawDayRange> for DayRange {
    fn from(raw: RawDayRange) -> Self {
        DayRange::new(raw.start, raw.end)
    }
}

impl From<DayRange> for RawDayRange {
    fn from(range: DayRange) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

impl DayRange {
    pub fn new(start: i64, end: Option<i64>) -> Self {
        let end = end.map(|end| if end > start { end } else { start.saturating_add(1) });
        Self { start, end }
    }

    pub fn bounded(start: i64, end: i64) -> Self {
        Self::new(start, Some(end))
    }

    pub fn unbounded(start: i64) -> Self {
        Self::new(start, None)
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> Option<i64> {
        self.end
    }

    pub fn is_bounded(&self) -> bool {
        self.end.is_some()
    }

    /// Number of days covered, `None` when unbounded.
    pub fn length(&self) -> Option<i64> {
        self.end.map(|end| end - self.start)
    }

    #[inline]
    pub fn contains_day(&self, day: i64) -> bool {
        day >= self.start && self.end.is_none_or(|end| day < end)
    }

    pub fn overlaps(&self, other: &DayRange) -> bool {
        self.start < other.end_or_max() && other.start < self.end_or_max()
    }

    pub fn intersection(&self, other: &DayRange) -> Option<DayRange> {
        if !self.overlaps(other) {
            return None;
        }
        let start = self.start.max(other.start);
        let end = match (self.end, other.end) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) | (None, Some(a)) => Some(a),
            (None, None) => None,
        };
        Some(DayRange { start, end })
    }

    fn end_or_max(&self) -> i64 {
        self.end.unwrap_or(i64::MAX)
    }
}
