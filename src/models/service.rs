use chrono::NaiveDateTime;
use serde::Serialize;
use validator::Validate;

#[derive(Debug, Clone, Serialize)]
pub struct Service {
    pub id: i64,
    pub business_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub duration_minutes: i64,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl Service {
    pub fn price_display(&self) -> String {
        format_price(self.price_cents)
    }
}

#[derive(Debug, Clone, Validate)]
pub struct ServiceFields {
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Price cannot be negative."))]
    pub price_cents: i64,
    #[validate(range(min = 5, max = 480, message = "Must be between 5 and 480 minutes."))]
    pub duration_minutes: i64,
}

pub fn format_price(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Parses a non-negative decimal amount with at most two fractional digits
/// ("12", "12.5", "12.50") into cents.
pub fn parse_price(s: &str) -> Option<i64> {
    let s = s.trim();
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let whole: i64 = whole.parse().ok()?;
    let frac_cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };
    whole.checked_mul(100)?.checked_add(frac_cents)
}
