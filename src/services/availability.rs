//! Free-slot computation for a (business, service, date) triple.
//!
//! Candidate start times sit on a fixed 30-minute grid anchored at the
//! day's opening time, whatever the service duration. A candidate survives if
//! it fits before closing, does not overlap any pending or confirmed booking
//! (half-open intervals), and, for today, starts strictly after the current
//! time. Past dates are not filtered here; callers reject them.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{format_time, Service, WorkingHour};

pub const SLOT_STEP_MINUTES: u32 = 30;

/// An existing booking that holds part of the day.
#[derive(Debug, Clone, Copy)]
pub struct BookedInterval {
    pub start: NaiveTime,
    pub duration_minutes: i64,
}

fn minutes_of(t: &NaiveTime) -> i64 {
    i64::from(t.num_seconds_from_midnight() / 60)
}

pub fn compute_slots(
    hours: Option<&WorkingHour>,
    duration_minutes: i64,
    date: NaiveDate,
    booked: &[BookedInterval],
    now: NaiveDateTime,
) -> Vec<NaiveTime> {
    let hours = match hours {
        Some(h) if !h.is_closed => h,
        _ => return vec![],
    };
    if duration_minutes <= 0 {
        return vec![];
    }

    let open = minutes_of(&hours.open_time);
    let close = minutes_of(&hours.close_time);
    let is_today = date == now.date();
    let now_time = now.time();

    let taken: Vec<(i64, i64)> = booked
        .iter()
        .map(|b| {
            let start = minutes_of(&b.start);
            (start, start + b.duration_minutes)
        })
        .collect();

    let mut slots = vec![];
    let mut candidate = open;
    while candidate + duration_minutes <= close {
        let end = candidate + duration_minutes;
        let free = taken
            .iter()
            .all(|&(start, finish)| end <= start || candidate >= finish);

        if free {
            if let Some(start) = NaiveTime::from_num_seconds_from_midnight_opt(candidate as u32 * 60, 0) {
                if !is_today || start > now_time {
                    slots.push(start);
                }
            }
        }
        candidate += i64::from(SLOT_STEP_MINUTES);
    }
    slots
}

/// Loads the working hours and active bookings for `date` and returns the
/// bookable start times as `HH:MM` strings.
pub fn available_slots(
    conn: &Connection,
    business_id: i64,
    service: &Service,
    date: NaiveDate,
    now: NaiveDateTime,
) -> anyhow::Result<Vec<String>> {
    let weekday = date.weekday().num_days_from_monday();
    let hours = queries::get_working_hour_for_day(conn, business_id, weekday)?;
    let booked: Vec<BookedInterval> = queries::get_active_intervals(conn, business_id, &date)?
        .into_iter()
        .map(|(start, duration_minutes)| BookedInterval {
            start,
            duration_minutes,
        })
        .collect();

    let slots = compute_slots(hours.as_ref(), service.duration_minutes, date, &booked, now);
    Ok(slots.iter().map(format_time).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn hours(open: &str, close: &str, closed: bool) -> WorkingHour {
        WorkingHour {
            id: 1,
            business_id: 1,
            day_of_week: 0,
            open_time: t(open),
            close_time: t(close),
            is_closed: closed,
        }
    }

    fn fmt(slots: &[NaiveTime]) -> Vec<String> {
        slots.iter().map(format_time).collect()
    }

    // 2030-06-17 is a Monday; "now" sits well before it unless a test says otherwise.
    const DAY: &str = "2030-06-17";
    const EARLIER: &str = "2030-06-01 08:00";

    #[test]
    fn test_closed_day_has_no_slots() {
        let wh = hours("09:00", "17:00", true);
        assert!(compute_slots(Some(&wh), 30, d(DAY), &[], dt(EARLIER)).is_empty());
    }

    #[test]
    fn test_missing_hours_has_no_slots() {
        assert!(compute_slots(None, 30, d(DAY), &[], dt(EARLIER)).is_empty());
    }

    #[test]
    fn test_full_day_grid() {
        let wh = hours("09:00", "17:00", false);
        let slots = fmt(&compute_slots(Some(&wh), 30, d(DAY), &[], dt(EARLIER)));
        assert_eq!(slots.len(), 16);
        assert_eq!(slots.first().unwrap(), "09:00");
        assert_eq!(slots.last().unwrap(), "16:30");
    }

    #[test]
    fn test_candidates_aligned_and_fit_before_close() {
        let wh = hours("08:15", "12:40", false);
        for duration in [5, 20, 30, 45, 90, 240] {
            let slots = compute_slots(Some(&wh), duration, d(DAY), &[], dt(EARLIER));
            for slot in &slots {
                let offset = minutes_of(slot) - minutes_of(&wh.open_time);
                assert_eq!(offset % 30, 0, "{slot} not on the grid");
                assert!(minutes_of(slot) + duration <= minutes_of(&wh.close_time));
            }
        }
    }

    #[test]
    fn test_short_service_still_on_half_hour() {
        let wh = hours("09:00", "10:00", false);
        let slots = fmt(&compute_slots(Some(&wh), 15, d(DAY), &[], dt(EARLIER)));
        assert_eq!(slots, vec!["09:00", "09:30"]);
    }

    #[test]
    fn test_long_service_must_fit() {
        let wh = hours("09:00", "17:00", false);
        let slots = fmt(&compute_slots(Some(&wh), 480, d(DAY), &[], dt(EARLIER)));
        assert_eq!(slots, vec!["09:00"]);
        assert!(compute_slots(Some(&wh), 481, d(DAY), &[], dt(EARLIER)).is_empty());
    }

    #[test]
    fn test_existing_booking_blocks_its_slot_only() {
        let wh = hours("09:00", "17:00", false);
        let booked = [BookedInterval {
            start: t("10:00"),
            duration_minutes: 30,
        }];
        let slots = fmt(&compute_slots(Some(&wh), 30, d(DAY), &booked, dt(EARLIER)));
        assert!(!slots.contains(&"10:00".to_string()));
        assert!(slots.contains(&"09:30".to_string()));
        assert!(slots.contains(&"10:30".to_string()));
    }

    #[test]
    fn test_longer_request_overlapping_booking_is_dropped() {
        let wh = hours("09:00", "17:00", false);
        let booked = [BookedInterval {
            start: t("10:00"),
            duration_minutes: 30,
        }];
        // A 60-minute service at 09:30 would run into the 10:00 booking.
        let slots = fmt(&compute_slots(Some(&wh), 60, d(DAY), &booked, dt(EARLIER)));
        assert!(slots.contains(&"09:00".to_string()));
        assert!(!slots.contains(&"09:30".to_string()));
        assert!(!slots.contains(&"10:00".to_string()));
        assert!(slots.contains(&"10:30".to_string()));
    }

    #[test]
    fn test_off_grid_booking_blocks_overlapping_candidates() {
        let wh = hours("09:00", "12:00", false);
        let booked = [BookedInterval {
            start: t("09:45"),
            duration_minutes: 45,
        }];
        let slots = fmt(&compute_slots(Some(&wh), 30, d(DAY), &booked, dt(EARLIER)));
        assert_eq!(slots, vec!["09:00", "10:30", "11:00", "11:30"]);
    }

    #[test]
    fn test_today_after_last_slot_is_empty() {
        let wh = hours("09:00", "17:00", false);
        let slots = compute_slots(Some(&wh), 30, d(DAY), &[], dt("2030-06-17 16:45"));
        assert!(slots.is_empty());
    }

    #[test]
    fn test_today_drops_current_and_past_starts() {
        let wh = hours("09:00", "17:00", false);
        let slots = fmt(&compute_slots(Some(&wh), 30, d(DAY), &[], dt("2030-06-17 15:30")));
        assert_eq!(slots, vec!["16:00", "16:30"]);
    }

    #[test]
    fn test_past_date_not_filtered_by_engine() {
        let wh = hours("09:00", "10:00", false);
        let slots = compute_slots(Some(&wh), 30, d(DAY), &[], dt("2030-07-01 12:00"));
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn test_late_close_does_not_wrap() {
        let wh = hours("22:00", "23:59", false);
        let slots = fmt(&compute_slots(Some(&wh), 60, d(DAY), &[], dt(EARLIER)));
        assert_eq!(slots, vec!["22:00", "22:30"]);
    }

    #[test]
    fn test_available_slots_reads_store() {
        use crate::db;
        use crate::db::queries::{insert_business, insert_service, insert_working_hour, NewUser};
        use crate::models::{Booking, BookingStatus, BusinessFields, ServiceFields};

        let conn = db::init_db(":memory:").unwrap();
        let owner = queries::create_user(
            &conn,
            &NewUser {
                email: "o@example.com",
                password_hash: "x",
                first_name: "Olive",
                last_name: "Owner",
                is_admin: false,
            },
        )
        .unwrap();
        let business_id = insert_business(
            &conn,
            owner,
            "olive",
            &BusinessFields {
                name: "Olive".to_string(),
                ..Default::default()
            },
            true,
        )
        .unwrap();
        insert_working_hour(&conn, business_id, 0, &t("09:00"), &t("11:00"), false).unwrap();
        let fields = ServiceFields {
            name: "Cut".to_string(),
            description: None,
            price_cents: 1000,
            duration_minutes: 30,
        };
        let service_id = insert_service(&conn, business_id, &fields).unwrap();
        let service = queries::get_service(&conn, business_id, service_id).unwrap().unwrap();

        let now = dt(EARLIER);
        queries::insert_booking(
            &conn,
            &Booking {
                id: "bk".to_string(),
                business_id,
                service_id,
                customer_name: "Carl".to_string(),
                customer_phone: "5551234567".to_string(),
                customer_email: None,
                booking_date: d(DAY),
                booking_time: t("10:00"),
                status: BookingStatus::Confirmed,
                notes: None,
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();

        let slots = available_slots(&conn, business_id, &service, d(DAY), now).unwrap();
        assert_eq!(slots, vec!["09:00", "09:30", "10:30"]);

        // Tuesday has no working-hour row at all.
        let tuesday = available_slots(&conn, business_id, &service, d("2030-06-18"), now).unwrap();
        assert!(tuesday.is_empty());
    }
}
