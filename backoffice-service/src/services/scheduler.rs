//! Duty scheduling.
//!
//! Determines which staff are on duty for a calendar date by merging one-off
//! shifts falling on that date with recurring weekly patterns. Pure
//! functions over already-fetched rows; nothing here touches the database.

use crate::models::{Shift, Staff, weekday_token};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Staff ids on duty for `target_date`.
///
/// A one-off shift counts when its start time falls inside
/// `[date 00:00:00, date 23:59:59]` (naive local time, inclusive). A
/// recurring shift counts when its weekday set contains the date's weekday,
/// regardless of the template's own calendar date. A staff member with both
/// kinds of shift that day appears once.
pub fn staff_on_duty(target_date: NaiveDate, shifts: &[Shift]) -> BTreeSet<Uuid> {
    let day_token = weekday_token(target_date);
    let window_start = target_date.and_time(chrono::NaiveTime::MIN);
    let window_end = target_date
        .and_hms_opt(23, 59, 59)
        .expect("23:59:59 is a valid time of day");

    let mut on_duty = BTreeSet::new();
    for shift in shifts {
        let applies = if shift.is_recurring {
            shift.recurring_day_set().contains(day_token)
        } else {
            shift.start_time >= window_start && shift.start_time <= window_end
        };
        if applies {
            on_duty.insert(shift.staff_id);
        }
    }
    on_duty
}

/// Resolve the on-duty set against the roster for display, sorted by name.
pub fn on_duty_roster(target_date: NaiveDate, shifts: &[Shift], staff: &[Staff]) -> Vec<Staff> {
    let on_duty = staff_on_duty(target_date, shifts);
    let mut roster: Vec<Staff> = staff
        .iter()
        .filter(|member| on_duty.contains(&member.staff_id))
        .cloned()
        .collect();
    roster.sort_by(|a, b| a.name.cmp(&b.name));
    roster
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, s).unwrap()
    }

    fn one_off(staff_id: Uuid, start: NaiveDateTime, end: NaiveDateTime) -> Shift {
        Shift {
            shift_id: Uuid::new_v4(),
            staff_id,
            start_time: start,
            end_time: end,
            shift_type: "opening".to_string(),
            location: None,
            notes: None,
            is_recurring: false,
            recurring_days: None,
            google_event_id: None,
            created_utc: Utc::now(),
        }
    }

    fn recurring(staff_id: Uuid, days: &str) -> Shift {
        Shift {
            is_recurring: true,
            recurring_days: Some(days.to_string()),
            ..one_off(staff_id, at(2021, 1, 4, 8, 0, 0), at(2021, 1, 4, 16, 0, 0))
        }
    }

    fn member(staff_id: Uuid, name: &str) -> Staff {
        Staff {
            staff_id,
            name: name.to_string(),
            email: None,
            phone: None,
            position: None,
            is_active: true,
            color_tag: None,
            created_utc: Utc::now(),
        }
    }

    #[test]
    fn one_off_shift_counts_only_on_its_date() {
        let alice = Uuid::new_v4();
        let shifts = vec![one_off(
            alice,
            at(2024, 6, 10, 8, 0, 0),
            at(2024, 6, 10, 16, 0, 0),
        )];

        assert!(staff_on_duty(date(2024, 6, 10), &shifts).contains(&alice));
        assert!(staff_on_duty(date(2024, 6, 11), &shifts).is_empty());
    }

    #[test]
    fn day_window_is_inclusive_at_both_ends() {
        let early = Uuid::new_v4();
        let late = Uuid::new_v4();
        let shifts = vec![
            one_off(early, at(2024, 6, 10, 0, 0, 0), at(2024, 6, 10, 6, 0, 0)),
            one_off(late, at(2024, 6, 10, 23, 59, 59), at(2024, 6, 11, 6, 0, 0)),
        ];

        let on_duty = staff_on_duty(date(2024, 6, 10), &shifts);
        assert!(on_duty.contains(&early));
        assert!(on_duty.contains(&late));
        assert!(!staff_on_duty(date(2024, 6, 9), &shifts).contains(&early));
    }

    #[test]
    fn recurring_shift_matches_weekday_regardless_of_template_date() {
        let bella = Uuid::new_v4();
        // Template window is from January 2021; matches any later Mon/Wed.
        let shifts = vec![recurring(bella, "Mon,Wed")];

        // 2024-06-10 is a Monday, 2024-06-12 a Wednesday, 2024-06-11 a Tuesday.
        assert!(staff_on_duty(date(2024, 6, 10), &shifts).contains(&bella));
        assert!(staff_on_duty(date(2024, 6, 12), &shifts).contains(&bella));
        assert!(staff_on_duty(date(2024, 6, 11), &shifts).is_empty());
    }

    #[test]
    fn overlapping_one_off_and_recurring_dedupe_to_one_entry() {
        let cam = Uuid::new_v4();
        let shifts = vec![
            one_off(cam, at(2024, 6, 10, 8, 0, 0), at(2024, 6, 10, 16, 0, 0)),
            recurring(cam, "Mon"),
        ];

        let on_duty = staff_on_duty(date(2024, 6, 10), &shifts);
        assert_eq!(on_duty.len(), 1);
        assert!(on_duty.contains(&cam));
    }

    #[test]
    fn roster_resolution_sorts_by_name_and_skips_absent_staff() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let off_today = Uuid::new_v4();
        let shifts = vec![
            one_off(bob, at(2024, 6, 10, 12, 0, 0), at(2024, 6, 10, 20, 0, 0)),
            one_off(alice, at(2024, 6, 10, 8, 0, 0), at(2024, 6, 10, 16, 0, 0)),
        ];
        let staff = vec![
            member(bob, "Bob"),
            member(alice, "Alice"),
            member(off_today, "Zoe"),
        ];

        let roster = on_duty_roster(date(2024, 6, 10), &shifts, &staff);
        let names: Vec<&str> = roster.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob"]);
    }

    #[test]
    fn inputs_are_not_mutated_and_queries_are_repeatable() {
        let dana = Uuid::new_v4();
        let shifts = vec![recurring(dana, "Fri")];
        // 2024-06-14 is a Friday.
        let first = staff_on_duty(date(2024, 6, 14), &shifts);
        let second = staff_on_duty(date(2024, 6, 14), &shifts);
        assert_eq!(first, second);
        assert_eq!(shifts[0].recurring_days.as_deref(), Some("Fri"));
    }
}
