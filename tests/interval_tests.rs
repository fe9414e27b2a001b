use gantt_schedule::{Absence, DayRange, ParticipationInterval};
use uuid::Uuid;

#[test]
fn contains_day_is_half_open() {
    let range = DayRange::bounded(3, 7);
    assert!(!range.contains_day(2));
    assert!(range.contains_day(3));
    assert!(range.contains_day(6));
    assert!(!range.contains_day(7));
    assert_eq!(range.length(), Some(4));
}

#[test]
fn unbounded_range_has_no_end() {
    let range = DayRange::unbounded(10);
    assert!(!range.contains_day(9));
    assert!(range.contains_day(10));
    assert!(range.contains_day(i64::MAX - 1));
    assert!(!range.is_bounded());
    assert_eq!(range.length(), None);
}

#[test]
fn inverted_bounds_collapse_to_one_day() {
    let range = DayRange::new(8, Some(2));
    assert_eq!(range.start(), 8);
    assert_eq!(range.end(), Some(9));
}

#[test]
fn adjacent_ranges_do_not_overlap() {
    let a = DayRange::bounded(0, 5);
    let b = DayRange::bounded(5, 9);
    assert!(!a.overlaps(&b));
    assert!(!b.overlaps(&a));
    assert_eq!(a.intersection(&b), None);

    let c = DayRange::unbounded(4);
    assert!(a.overlaps(&c));
    assert_eq!(a.intersection(&c), Some(DayRange::bounded(4, 5)));
    assert_eq!(b.intersection(&c), Some(b));
}

#[test]
fn overlap_is_symmetric_for_intervals_and_absences() {
    let resource = Uuid::new_v4();
    let other = Uuid::new_v4();
    let cases = [
        (0, Some(4), 3, None),
        (0, Some(4), 4, Some(6)),
        (2, None, 0, Some(3)),
        (5, Some(6), 0, Some(5)),
    ];
    for (s1, e1, s2, e2) in cases {
        let a = ParticipationInterval::new(resource, s1, e1, 100);
        let b = ParticipationInterval::new(resource, s2, e2, 100);
        assert_eq!(a.overlaps_with(&b), b.overlaps_with(&a));

        let foreign = ParticipationInterval::new(other, s2, e2, 100);
        assert!(!a.overlaps_with(&foreign));
    }

    let absence = Absence::new(resource, 1, 4);
    let later = Absence::new(resource, 3, 5);
    assert!(absence.overlaps_with(&later));
    assert!(later.overlaps_with(&absence));
    assert!(!absence.overlaps_with(&absence.clone()));
}
