use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{
    format_date, format_time, Booking, BookingDetails, BookingStatus, Business, BusinessFields,
    Service, ServiceFields, User, WorkingHour,
};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn now_string() -> String {
    Utc::now().naive_utc().format(DATETIME_FORMAT).to_string()
}

fn parse_datetime(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .with_context(|| format!("invalid stored timestamp: {s}"))
}

fn parse_stored_date(s: &str) -> anyhow::Result<NaiveDate> {
    crate::models::parse_date(s).with_context(|| format!("invalid stored date: {s}"))
}

fn parse_stored_time(s: &str) -> anyhow::Result<NaiveTime> {
    crate::models::parse_time(s).with_context(|| format!("invalid stored time: {s}"))
}

// ── Users ──

const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, is_admin, created_at";

fn parse_user_row(row: &Row) -> anyhow::Result<User> {
    let created_at: String = row.get(6)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        is_admin: row.get(5)?,
        created_at: parse_datetime(&created_at)?,
    })
}

pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub is_admin: bool,
}

pub fn create_user(conn: &Connection, user: &NewUser) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO users (email, password_hash, first_name, last_name, is_admin)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.email,
            user.password_hash,
            user.first_name,
            user.last_name,
            user.is_admin,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, id: i64) -> anyhow::Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    conn.query_row(&sql, params![id], |row| Ok(parse_user_row(row)))
        .optional()?
        .transpose()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> anyhow::Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
    conn.query_row(&sql, params![email], |row| Ok(parse_user_row(row)))
        .optional()?
        .transpose()
}

pub struct UserUpdate<'a> {
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub is_admin: bool,
    /// Left untouched when `None`.
    pub password_hash: Option<&'a str>,
}

pub fn update_user(conn: &Connection, id: i64, update: &UserUpdate) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE users SET email = ?1, first_name = ?2, last_name = ?3, is_admin = ?4,
           password_hash = COALESCE(?5, password_hash)
         WHERE id = ?6",
        params![
            update.email,
            update.first_name,
            update.last_name,
            update.is_admin,
            update.password_hash,
            id,
        ],
    )?;
    Ok(count > 0)
}

pub fn list_users(conn: &Connection) -> anyhow::Result<Vec<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
    collect_rows(conn, &sql, [], parse_user_row)
}

pub fn list_users_by_name(conn: &Connection) -> anyhow::Result<Vec<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY first_name, last_name, id");
    collect_rows(conn, &sql, [], parse_user_row)
}

pub fn count_users(conn: &Connection) -> anyhow::Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
}

// ── Sessions ──

pub fn create_session(
    conn: &Connection,
    token: &str,
    user_id: i64,
    expires_at: &NaiveDateTime,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
        params![token, user_id, expires_at.format(DATETIME_FORMAT).to_string()],
    )?;
    Ok(())
}

/// Resolves a live session token to its user. Expired sessions resolve to `None`.
pub fn get_session_user(
    conn: &Connection,
    token: &str,
    now: &NaiveDateTime,
) -> anyhow::Result<Option<User>> {
    let sql = format!(
        "SELECT {} FROM users u JOIN sessions s ON s.user_id = u.id
         WHERE s.token = ?1 AND s.expires_at > ?2",
        USER_COLUMNS
            .split(", ")
            .map(|c| format!("u.{c}"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    conn.query_row(
        &sql,
        params![token, now.format(DATETIME_FORMAT).to_string()],
        |row| Ok(parse_user_row(row)),
    )
    .optional()?
    .transpose()
}

pub fn delete_session(conn: &Connection, token: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(count > 0)
}

pub fn purge_expired_sessions(conn: &Connection, now: &NaiveDateTime) -> anyhow::Result<usize> {
    let count = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![now.format(DATETIME_FORMAT).to_string()],
    )?;
    Ok(count)
}

// ── Businesses ──

const BUSINESS_COLUMNS: &str =
    "id, name, slug, phone, address, description, is_active, owner_id, created_at";

fn parse_business_row(row: &Row) -> anyhow::Result<Business> {
    let created_at: String = row.get(8)?;
    Ok(Business {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
        description: row.get(5)?,
        is_active: row.get(6)?,
        owner_id: row.get(7)?,
        created_at: parse_datetime(&created_at)?,
    })
}

pub fn slug_exists(conn: &Connection, slug: &str) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM businesses WHERE slug = ?1",
        params![slug],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn insert_business(
    conn: &Connection,
    owner_id: i64,
    slug: &str,
    fields: &BusinessFields,
    is_active: bool,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO businesses (name, slug, phone, address, description, is_active, owner_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            fields.name,
            slug,
            fields.phone,
            fields.address,
            fields.description,
            is_active,
            owner_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_business(conn: &Connection, id: i64) -> anyhow::Result<Option<Business>> {
    let sql = format!("SELECT {BUSINESS_COLUMNS} FROM businesses WHERE id = ?1");
    conn.query_row(&sql, params![id], |row| Ok(parse_business_row(row)))
        .optional()?
        .transpose()
}

pub fn get_business_by_owner(conn: &Connection, owner_id: i64) -> anyhow::Result<Option<Business>> {
    let sql = format!(
        "SELECT {BUSINESS_COLUMNS} FROM businesses WHERE owner_id = ?1 ORDER BY id LIMIT 1"
    );
    conn.query_row(&sql, params![owner_id], |row| Ok(parse_business_row(row)))
        .optional()?
        .transpose()
}

pub fn get_business_by_slug(conn: &Connection, slug: &str) -> anyhow::Result<Option<Business>> {
    let sql = format!("SELECT {BUSINESS_COLUMNS} FROM businesses WHERE slug = ?1");
    conn.query_row(&sql, params![slug], |row| Ok(parse_business_row(row)))
        .optional()?
        .transpose()
}

/// Public lookups only ever see active businesses.
pub fn get_active_business_by_slug(
    conn: &Connection,
    slug: &str,
) -> anyhow::Result<Option<Business>> {
    Ok(get_business_by_slug(conn, slug)?.filter(|b| b.is_active))
}

pub fn update_business_profile(
    conn: &Connection,
    id: i64,
    fields: &BusinessFields,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE businesses SET name = ?1, phone = ?2, address = ?3, description = ?4 WHERE id = ?5",
        params![fields.name, fields.phone, fields.address, fields.description, id],
    )?;
    Ok(count > 0)
}

pub fn update_business_admin(
    conn: &Connection,
    id: i64,
    fields: &BusinessFields,
    owner_id: i64,
    is_active: bool,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE businesses SET name = ?1, phone = ?2, address = ?3, description = ?4,
           owner_id = ?5, is_active = ?6
         WHERE id = ?7",
        params![
            fields.name,
            fields.phone,
            fields.address,
            fields.description,
            owner_id,
            is_active,
            id,
        ],
    )?;
    Ok(count > 0)
}

pub fn set_business_active(conn: &Connection, id: i64, is_active: bool) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE businesses SET is_active = ?1 WHERE id = ?2",
        params![is_active, id],
    )?;
    Ok(count > 0)
}

pub fn list_businesses(conn: &Connection) -> anyhow::Result<Vec<Business>> {
    let sql =
        format!("SELECT {BUSINESS_COLUMNS} FROM businesses ORDER BY created_at DESC, id DESC");
    collect_rows(conn, &sql, [], parse_business_row)
}

pub fn list_businesses_by_name(conn: &Connection) -> anyhow::Result<Vec<Business>> {
    let sql = format!("SELECT {BUSINESS_COLUMNS} FROM businesses ORDER BY name, id");
    collect_rows(conn, &sql, [], parse_business_row)
}

pub fn count_businesses(conn: &Connection, active_only: bool) -> anyhow::Result<i64> {
    let sql = if active_only {
        "SELECT COUNT(*) FROM businesses WHERE is_active = 1"
    } else {
        "SELECT COUNT(*) FROM businesses"
    };
    Ok(conn.query_row(sql, [], |row| row.get(0))?)
}

// ── Working Hours ──

const WORKING_HOUR_COLUMNS: &str =
    "id, business_id, day_of_week, open_time, close_time, is_closed";

fn parse_working_hour_row(row: &Row) -> anyhow::Result<WorkingHour> {
    let open_time: String = row.get(3)?;
    let close_time: String = row.get(4)?;
    Ok(WorkingHour {
        id: row.get(0)?,
        business_id: row.get(1)?,
        day_of_week: row.get(2)?,
        open_time: parse_stored_time(&open_time)?,
        close_time: parse_stored_time(&close_time)?,
        is_closed: row.get(5)?,
    })
}

pub fn insert_working_hour(
    conn: &Connection,
    business_id: i64,
    day_of_week: u32,
    open_time: &NaiveTime,
    close_time: &NaiveTime,
    is_closed: bool,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO working_hours (business_id, day_of_week, open_time, close_time, is_closed)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            business_id,
            day_of_week,
            format_time(open_time),
            format_time(close_time),
            is_closed,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_working_hours(conn: &Connection, business_id: i64) -> anyhow::Result<Vec<WorkingHour>> {
    let sql = format!(
        "SELECT {WORKING_HOUR_COLUMNS} FROM working_hours WHERE business_id = ?1 ORDER BY day_of_week"
    );
    collect_rows(conn, &sql, params![business_id], parse_working_hour_row)
}

pub fn get_working_hour_for_day(
    conn: &Connection,
    business_id: i64,
    day_of_week: u32,
) -> anyhow::Result<Option<WorkingHour>> {
    let sql = format!(
        "SELECT {WORKING_HOUR_COLUMNS} FROM working_hours WHERE business_id = ?1 AND day_of_week = ?2"
    );
    conn.query_row(&sql, params![business_id, day_of_week], |row| {
        Ok(parse_working_hour_row(row))
    })
    .optional()?
    .transpose()
}

/// Scoped by business: an id belonging to another business is simply not found.
pub fn get_working_hour(
    conn: &Connection,
    business_id: i64,
    id: i64,
) -> anyhow::Result<Option<WorkingHour>> {
    let sql = format!(
        "SELECT {WORKING_HOUR_COLUMNS} FROM working_hours WHERE id = ?1 AND business_id = ?2"
    );
    conn.query_row(&sql, params![id, business_id], |row| {
        Ok(parse_working_hour_row(row))
    })
    .optional()?
    .transpose()
}

pub fn update_working_hour(
    conn: &Connection,
    business_id: i64,
    id: i64,
    open_time: &NaiveTime,
    close_time: &NaiveTime,
    is_closed: bool,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE working_hours SET open_time = ?1, close_time = ?2, is_closed = ?3
         WHERE id = ?4 AND business_id = ?5",
        params![
            format_time(open_time),
            format_time(close_time),
            is_closed,
            id,
            business_id,
        ],
    )?;
    Ok(count > 0)
}

// ── Services ──

const SERVICE_COLUMNS: &str =
    "id, business_id, name, description, price_cents, duration_minutes, is_active, created_at";

fn parse_service_row(row: &Row) -> anyhow::Result<Service> {
    let created_at: String = row.get(7)?;
    Ok(Service {
        id: row.get(0)?,
        business_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        price_cents: row.get(4)?,
        duration_minutes: row.get(5)?,
        is_active: row.get(6)?,
        created_at: parse_datetime(&created_at)?,
    })
}

pub fn insert_service(
    conn: &Connection,
    business_id: i64,
    fields: &ServiceFields,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO services (business_id, name, description, price_cents, duration_minutes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            business_id,
            fields.name,
            fields.description,
            fields.price_cents,
            fields.duration_minutes,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Scoped by business; includes inactive services.
pub fn get_service(
    conn: &Connection,
    business_id: i64,
    id: i64,
) -> anyhow::Result<Option<Service>> {
    let sql = format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1 AND business_id = ?2");
    conn.query_row(&sql, params![id, business_id], |row| {
        Ok(parse_service_row(row))
    })
    .optional()?
    .transpose()
}

pub fn get_active_service(
    conn: &Connection,
    business_id: i64,
    id: i64,
) -> anyhow::Result<Option<Service>> {
    Ok(get_service(conn, business_id, id)?.filter(|s| s.is_active))
}

pub fn list_services(
    conn: &Connection,
    business_id: i64,
    active_only: bool,
) -> anyhow::Result<Vec<Service>> {
    let filter = if active_only { " AND is_active = 1" } else { "" };
    let sql = format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE business_id = ?1{filter} ORDER BY name, id"
    );
    collect_rows(conn, &sql, params![business_id], parse_service_row)
}

pub fn update_service(
    conn: &Connection,
    business_id: i64,
    id: i64,
    fields: &ServiceFields,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET name = ?1, description = ?2, price_cents = ?3, duration_minutes = ?4
         WHERE id = ?5 AND business_id = ?6",
        params![
            fields.name,
            fields.description,
            fields.price_cents,
            fields.duration_minutes,
            id,
            business_id,
        ],
    )?;
    Ok(count > 0)
}

/// Soft delete: the row stays so existing bookings keep their service.
pub fn deactivate_service(conn: &Connection, business_id: i64, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET is_active = 0 WHERE id = ?1 AND business_id = ?2",
        params![id, business_id],
    )?;
    Ok(count > 0)
}

pub fn count_active_services(conn: &Connection, business_id: i64) -> anyhow::Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM services WHERE business_id = ?1 AND is_active = 1",
        params![business_id],
        |row| row.get(0),
    )?)
}

// ── Bookings ──

const BOOKING_DETAIL_SELECT: &str = "SELECT b.id, b.business_id, b.service_id, b.customer_name, \
     b.customer_phone, b.customer_email, b.booking_date, b.booking_time, b.status, b.notes, \
     b.created_at, b.updated_at, s.name, s.duration_minutes, bz.name, bz.slug \
     FROM bookings b \
     JOIN services s ON s.id = b.service_id \
     JOIN businesses bz ON bz.id = b.business_id";

fn parse_booking_row(row: &Row) -> anyhow::Result<BookingDetails> {
    let booking_date: String = row.get(6)?;
    let booking_time: String = row.get(7)?;
    let status_str: String = row.get(8)?;
    let created_at: String = row.get(10)?;
    let updated_at: String = row.get(11)?;

    let status = BookingStatus::parse(&status_str)
        .with_context(|| format!("invalid stored booking status: {status_str}"))?;

    Ok(BookingDetails {
        booking: Booking {
            id: row.get(0)?,
            business_id: row.get(1)?,
            service_id: row.get(2)?,
            customer_name: row.get(3)?,
            customer_phone: row.get(4)?,
            customer_email: row.get(5)?,
            booking_date: parse_stored_date(&booking_date)?,
            booking_time: parse_stored_time(&booking_time)?,
            status,
            notes: row.get(9)?,
            created_at: parse_datetime(&created_at)?,
            updated_at: parse_datetime(&updated_at)?,
        },
        service_name: row.get(12)?,
        duration_minutes: row.get(13)?,
        business_name: row.get(14)?,
        business_slug: row.get(15)?,
    })
}

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, business_id, service_id, customer_name, customer_phone,
           customer_email, booking_date, booking_time, status, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            booking.id,
            booking.business_id,
            booking.service_id,
            booking.customer_name,
            booking.customer_phone,
            booking.customer_email,
            format_date(&booking.booking_date),
            format_time(&booking.booking_time),
            booking.status.as_str(),
            booking.notes,
            booking.created_at.format(DATETIME_FORMAT).to_string(),
            booking.updated_at.format(DATETIME_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<BookingDetails>> {
    let sql = format!("{BOOKING_DETAIL_SELECT} WHERE b.id = ?1");
    conn.query_row(&sql, params![id], |row| Ok(parse_booking_row(row)))
        .optional()?
        .transpose()
}

pub fn get_booking_for_business(
    conn: &Connection,
    business_id: i64,
    id: &str,
) -> anyhow::Result<Option<BookingDetails>> {
    let sql = format!("{BOOKING_DETAIL_SELECT} WHERE b.id = ?1 AND b.business_id = ?2");
    conn.query_row(&sql, params![id, business_id], |row| {
        Ok(parse_booking_row(row))
    })
    .optional()?
    .transpose()
}

/// Start time and duration of every pending or confirmed booking on `date`.
pub fn get_active_intervals(
    conn: &Connection,
    business_id: i64,
    date: &NaiveDate,
) -> anyhow::Result<Vec<(NaiveTime, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT b.booking_time, s.duration_minutes
         FROM bookings b JOIN services s ON s.id = b.service_id
         WHERE b.business_id = ?1 AND b.booking_date = ?2
           AND b.status IN ('pending', 'confirmed')
         ORDER BY b.booking_time",
    )?;
    let rows = stmt.query_map(params![business_id, format_date(date)], |row| {
        let time: String = row.get(0)?;
        let duration: i64 = row.get(1)?;
        Ok((time, duration))
    })?;

    let mut intervals = vec![];
    for row in rows {
        let (time, duration) = row?;
        intervals.push((parse_stored_time(&time)?, duration));
    }
    Ok(intervals)
}

#[derive(Debug, Default, Clone)]
pub struct BookingFilter {
    pub business_id: Option<i64>,
    pub status: Option<BookingStatus>,
    pub date: Option<NaiveDate>,
}

pub enum BookingOrder {
    /// Latest appointment first.
    Schedule,
    /// Most recently submitted first.
    Created,
}

pub fn list_bookings(
    conn: &Connection,
    filter: &BookingFilter,
    order: BookingOrder,
    limit: Option<i64>,
) -> anyhow::Result<Vec<BookingDetails>> {
    let mut sql = format!("{BOOKING_DETAIL_SELECT} WHERE 1 = 1");
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(business_id) = filter.business_id {
        values.push(Box::new(business_id));
        sql.push_str(&format!(" AND b.business_id = ?{}", values.len()));
    }
    if let Some(status) = filter.status {
        values.push(Box::new(status.as_str()));
        sql.push_str(&format!(" AND b.status = ?{}", values.len()));
    }
    if let Some(date) = filter.date {
        values.push(Box::new(format_date(&date)));
        sql.push_str(&format!(" AND b.booking_date = ?{}", values.len()));
    }

    sql.push_str(match order {
        BookingOrder::Schedule => " ORDER BY b.booking_date DESC, b.booking_time DESC",
        BookingOrder::Created => " ORDER BY b.created_at DESC, b.rowid DESC",
    });

    if let Some(limit) = limit {
        values.push(Box::new(limit));
        sql.push_str(&format!(" LIMIT ?{}", values.len()));
    }

    let params_refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|p| p.as_ref()).collect();
    collect_rows(conn, &sql, params_refs.as_slice(), parse_booking_row)
}

pub fn get_upcoming_bookings(
    conn: &Connection,
    business_id: i64,
    from: &NaiveDate,
    limit: i64,
) -> anyhow::Result<Vec<BookingDetails>> {
    let sql = format!(
        "{BOOKING_DETAIL_SELECT}
         WHERE b.business_id = ?1 AND b.booking_date >= ?2
           AND b.status IN ('pending', 'confirmed')
         ORDER BY b.booking_date, b.booking_time
         LIMIT ?3"
    );
    collect_rows(
        conn,
        &sql,
        params![business_id, format_date(from), limit],
        parse_booking_row,
    )
}

/// Moves a booking from `from` to `to`. Returns `false` when the stored
/// status is no longer `from`.
pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    from: BookingStatus,
    to: BookingStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
        params![to.as_str(), now_string(), id, from.as_str()],
    )?;
    Ok(count > 0)
}

pub fn count_bookings(
    conn: &Connection,
    business_id: Option<i64>,
    status: Option<BookingStatus>,
) -> anyhow::Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM bookings
         WHERE (?1 IS NULL OR business_id = ?1) AND (?2 IS NULL OR status = ?2)",
        params![business_id, status.map(|s| s.as_str())],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ── Helpers ──

fn collect_rows<T, P>(
    conn: &Connection,
    sql: &str,
    params: P,
    parse: fn(&Row) -> anyhow::Result<T>,
) -> anyhow::Result<Vec<T>>
where
    P: rusqlite::Params,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| Ok(parse(row)))?;

    let mut items = vec![];
    for row in rows {
        items.push(row??);
    }
    Ok(items)
}
