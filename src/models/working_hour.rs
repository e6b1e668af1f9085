use chrono::NaiveTime;
use serde::Serialize;

pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Opening window for one day of the week. `day_of_week` counts from Monday = 0.
#[derive(Debug, Clone, Serialize)]
pub struct WorkingHour {
    pub id: i64,
    pub business_id: i64,
    pub day_of_week: u32,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub is_closed: bool,
}

impl WorkingHour {
    pub fn day_name(&self) -> &'static str {
        DAY_NAMES.get(self.day_of_week as usize).copied().unwrap_or("Unknown")
    }
}

/// The week every new business starts with: 09:00-17:00, weekends closed.
pub fn default_week() -> Vec<(u32, NaiveTime, NaiveTime, bool)> {
    let open = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN);
    let close = NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN);
    (0..7).map(|day| (day, open, close, day >= 5)).collect()
}
