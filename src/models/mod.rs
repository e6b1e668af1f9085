pub mod booking;
pub mod business;
pub mod service;
pub mod user;
pub mod working_hour;

pub use booking::{Booking, BookingDetails, BookingStatus};
pub use business::{Business, BusinessFields};
pub use service::{Service, ServiceFields};
pub use user::{Session, User};
pub use working_hour::WorkingHour;

use chrono::{NaiveDate, NaiveTime};

/// Accepts `HH:MM` as well as the `HH:MM:SS` some browsers submit from time inputs.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

pub fn format_time(t: &NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

pub fn format_date(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}
