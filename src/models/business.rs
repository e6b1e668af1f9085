use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Business {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub owner_id: i64,
    pub created_at: NaiveDateTime,
}

/// Editable profile of a business. The slug is deliberately absent: it is
/// assigned once at creation and never rewritten.
#[derive(Debug, Clone, Default)]
pub struct BusinessFields {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}
