use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{Connection, TransactionBehavior};

use crate::db::{self, queries};
use crate::models::{format_time, Booking, BookingDetails, BookingStatus, Business, Service};
use crate::services::availability;

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("This time slot is no longer available.")]
    SlotUnavailable,

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for SchedulingError {
    fn from(e: rusqlite::Error) -> Self {
        SchedulingError::Database(e.into())
    }
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub notes: Option<String>,
}

/// Creates a pending booking if the requested start time is still offered.
///
/// The availability check and the insert share one IMMEDIATE transaction, so
/// two submissions for the same slot cannot both pass the check.
pub fn submit_booking(
    conn: &mut Connection,
    business: &Business,
    service: &Service,
    request: &BookingRequest,
    now: NaiveDateTime,
) -> Result<Booking, SchedulingError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let slots = availability::available_slots(&tx, business.id, service, request.date, now)?;
    let wanted = format_time(&request.time);
    if !slots.contains(&wanted) {
        tracing::info!(business_id = business.id, date = %request.date, time = %wanted, "slot no longer available");
        return Err(SchedulingError::SlotUnavailable);
    }

    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        business_id: business.id,
        service_id: service.id,
        customer_name: request.customer_name.clone(),
        customer_phone: request.customer_phone.clone(),
        customer_email: request.customer_email.clone(),
        booking_date: request.date,
        booking_time: request.time,
        status: BookingStatus::Pending,
        notes: request.notes.clone(),
        created_at: now,
        updated_at: now,
    };

    match queries::insert_booking(&tx, &booking) {
        Ok(()) => {}
        Err(e) if db::is_constraint_violation(&e) => return Err(SchedulingError::SlotUnavailable),
        Err(e) => return Err(e.into()),
    }
    tx.commit()?;

    tracing::info!(booking_id = %booking.id, business_id = business.id, date = %booking.booking_date, time = %wanted, "booking created");
    Ok(booking)
}

#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("A {} booking cannot be marked {}.", .from.as_str(), .to.as_str())]
    NotAllowed { from: BookingStatus, to: BookingStatus },

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// Moves a booking to `to`. Returns `false` when it already had that status.
///
/// `booking` may be stale: the update only applies while the stored status
/// still matches, otherwise the rules are checked again against the stored
/// status. Transitions only move forward, so the loop ends.
pub fn change_status(
    conn: &Connection,
    booking: &BookingDetails,
    to: BookingStatus,
) -> Result<bool, TransitionError> {
    let id = &booking.booking.id;
    let mut from = booking.booking.status;
    loop {
        if from == to {
            return Ok(false);
        }
        if !from.can_transition_to(to) {
            return Err(TransitionError::NotAllowed { from, to });
        }
        if queries::update_booking_status(conn, id, from, to)? {
            tracing::info!(booking_id = %id, from = from.as_str(), to = to.as_str(), "booking status changed");
            return Ok(true);
        }

        tracing::debug!(booking_id = %id, expected = from.as_str(), "booking status changed concurrently");
        from = queries::get_booking(conn, id)?
            .map(|d| d.booking.status)
            .ok_or_else(|| anyhow::anyhow!("booking {id} vanished during status change"))?;
    }
}
