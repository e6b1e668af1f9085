//! Customer-facing pages under `/b/{slug}/`. Only active businesses are
//! reachable, except for the confirmation page of an existing booking.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use axum_extra::extract::cookie::CookieJar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::forms::{BookingForm, FieldErrors};
use crate::handlers::extract::MaybeUser;
use crate::models::{format_date, format_time, parse_date, Business, Service, WorkingHour};
use crate::services::availability;
use crate::services::scheduling::{self, SchedulingError};
use crate::state::AppState;
use crate::web::{self, attr, esc, esc_opt, flash, form};

fn active_business(state: &AppState, slug: &str) -> Result<Business, AppError> {
    let db = state.db();
    queries::get_active_business_by_slug(&db, slug)?.ok_or(AppError::NotFound)
}

fn book_url(slug: &str, service_id: i64, date: &NaiveDate) -> String {
    let query = serde_urlencoded::to_string([
        ("service_id", service_id.to_string()),
        ("date", format_date(date)),
    ])
    .unwrap_or_default();
    format!("/b/{slug}/book?{query}")
}

/// Free start times for a service on a date; empty for past dates.
fn slots_for(
    state: &AppState,
    business: &Business,
    service: &Service,
    date: NaiveDate,
) -> Result<Vec<String>, AppError> {
    let now = chrono::Local::now().naive_local();
    if date < now.date() {
        return Ok(vec![]);
    }
    let db = state.db();
    Ok(availability::available_slots(&db, business.id, service, date, now)?)
}

// ── Public page ──

fn hours_list(hours: &[WorkingHour]) -> String {
    let rows: String = hours
        .iter()
        .map(|h| {
            let window = if h.is_closed {
                "Closed".to_string()
            } else {
                format!("{} - {}", format_time(&h.open_time), format_time(&h.close_time))
            };
            format!("<tr><td>{}</td><td>{window}</td></tr>", h.day_name())
        })
        .collect();
    format!("<table><tbody>{rows}</tbody></table>")
}

pub async fn public_page(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let business = active_business(&state, &slug)?;
    let (services, hours) = {
        let db = state.db();
        (
            queries::list_services(&db, business.id, true)?,
            queries::list_working_hours(&db, business.id)?,
        )
    };

    let services_html = if services.is_empty() {
        r#"<p class="muted">No services are offered right now.</p>"#.to_string()
    } else {
        services
            .iter()
            .map(|s| {
                format!(
                    r#"<div class="card"><strong>{}</strong> · {} · {} min<p class="muted">{}</p><a class="btn" href="/b/{}/book?service_id={}">Book</a></div>"#,
                    esc(&s.name),
                    s.price_display(),
                    s.duration_minutes,
                    esc_opt(s.description.as_deref()),
                    attr(&business.slug),
                    s.id,
                )
            })
            .collect()
    };

    let content = format!(
        r#"<div class="card"><p>{}</p><p class="muted">{}<br>{}</p></div><h2>Services</h2>{services_html}<h2>Opening hours</h2>{}"#,
        esc_opt(business.description.as_deref()),
        esc_opt(business.address.as_deref()),
        esc_opt(business.phone.as_deref()),
        hours_list(&hours),
    );
    Ok(web::page(jar, &business.name, user.as_ref(), &content).into_response())
}

// ── Booking form ──

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SlotsQuery {
    pub service_id: String,
    pub date: String,
}

const SLOT_SCRIPT: &str = r#"<script>
(function () {
  var form = document.getElementById('booking-form');
  if (!form) return;
  var service = form.querySelector('[name=service_id]');
  var date = form.querySelector('[name=booking_date]');
  var time = form.querySelector('[name=booking_time]');
  function refresh() {
    if (!service.value || !date.value) return;
    var url = form.dataset.slots + '?service_id=' + encodeURIComponent(service.value) + '&date=' + encodeURIComponent(date.value);
    fetch(url).then(function (r) { return r.json(); }).then(function (data) {
      time.innerHTML = '';
      data.slots.forEach(function (s) {
        var o = document.createElement('option');
        o.value = s; o.textContent = s; time.appendChild(o);
      });
    });
  }
  service.addEventListener('change', refresh);
  date.addEventListener('change', refresh);
})();
</script>"#;

fn book_content(
    business: &Business,
    services: &[Service],
    form_data: &BookingForm,
    slots: &[String],
    errors: &FieldErrors,
) -> String {
    let service_options: Vec<(String, String)> = services
        .iter()
        .map(|s| {
            (
                s.id.to_string(),
                format!("{} - {} ({} min)", s.name, s.price_display(), s.duration_minutes),
            )
        })
        .collect();
    let time_options: Vec<(String, String)> = slots.iter().map(|s| (s.clone(), s.clone())).collect();

    let mut fields = [
        form::select("service_id", "Service", &service_options, &form_data.service_id, errors),
        form::input("date", "booking_date", "Date", &form_data.booking_date, errors),
        form::select("booking_time", "Time", &time_options, &form_data.booking_time, errors),
    ]
    .concat();
    if slots.is_empty() && !form_data.booking_date.is_empty() {
        fields.push_str(r#"<p class="muted">No available times on this date.</p>"#);
    }
    fields.push_str(&[
        form::input("text", "customer_name", "Your name", &form_data.customer_name, errors),
        form::input("tel", "customer_phone", "Phone", &form_data.customer_phone, errors),
        form::input("email", "customer_email", "Email (optional)", form_data.customer_email.as_deref().unwrap_or_default(), errors),
        form::textarea("notes", "Notes", &form_data.notes, errors),
    ]
    .concat());

    let slug = attr(&business.slug);
    format!(
        r#"<form id="booking-form" class="card" method="post" action="/b/{slug}/book" data-slots="/b/{slug}/slots">{fields}<p><button class="btn" type="submit">Book appointment</button></p></form>
<form method="get" action="/b/{slug}/book"><input type="hidden" name="service_id" value="{}"><input type="hidden" name="date" value="{}"><noscript><button class="btn btn-secondary" type="submit">Show times</button></noscript></form>{SLOT_SCRIPT}"#,
        attr(&form_data.service_id),
        attr(&form_data.booking_date),
    )
}

fn bookable_services(state: &AppState, business: &Business) -> Result<Vec<Service>, AppError> {
    let db = state.db();
    Ok(queries::list_services(&db, business.id, true)?)
}

fn no_services(jar: CookieJar, slug: &str) -> Response {
    let jar = flash::push(jar, flash::Level::Error, "No services available for booking.");
    (jar, Redirect::to(&format!("/b/{slug}/"))).into_response()
}

pub async fn book_page(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Path(slug): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Response, AppError> {
    let business = active_business(&state, &slug)?;
    let services = bookable_services(&state, &business)?;
    let first = match services.first() {
        Some(s) => s.id,
        None => return Ok(no_services(jar, &business.slug)),
    };

    let selected = query
        .service_id
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|id| services.iter().find(|s| s.id == id))
        .map(|s| s.id)
        .unwrap_or(first);
    let form_data = BookingForm {
        service_id: selected.to_string(),
        booking_date: query.date.trim().to_string(),
        ..Default::default()
    };

    let slots = match (services.iter().find(|s| s.id == selected), parse_date(&query.date)) {
        (Some(service), Some(date)) => slots_for(&state, &business, service, date)?,
        _ => vec![],
    };

    let content = book_content(&business, &services, &form_data, &slots, &FieldErrors::default());
    let title = format!("Book at {}", business.name);
    Ok(web::page(jar, &title, user.as_ref(), &content).into_response())
}

pub async fn book(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Path(slug): Path<String>,
    Form(form_data): Form<BookingForm>,
) -> Result<Response, AppError> {
    let business = active_business(&state, &slug)?;
    let services = bookable_services(&state, &business)?;
    if services.is_empty() {
        return Ok(no_services(jar, &business.slug));
    }

    let today = chrono::Local::now().date_naive();
    let service = form_data
        .service_id()
        .and_then(|id| services.iter().find(|s| s.id == id));
    let request = match (form_data.validate(today), service) {
        (Ok(request), Some(service)) => Ok((request, service)),
        (Ok(_), None) => {
            let mut errors = FieldErrors::default();
            errors.add("service_id", "Choose a service.");
            Err(errors)
        }
        (Err(mut errors), service) => {
            if service.is_none() && errors.get("service_id").is_none() {
                errors.add("service_id", "Choose a service.");
            }
            Err(errors)
        }
    };

    let (request, service) = match request {
        Ok(v) => v,
        Err(errors) => {
            let slots = match (service, form_data.date()) {
                (Some(service), Some(date)) => slots_for(&state, &business, service, date)?,
                _ => vec![],
            };
            let content = book_content(&business, &services, &form_data, &slots, &errors);
            let title = format!("Book at {}", business.name);
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                web::page(jar, &title, user.as_ref(), &content),
            )
                .into_response());
        }
    };

    let now = chrono::Local::now().naive_local();
    let booking = {
        let mut db = state.db();
        scheduling::submit_booking(&mut db, &business, service, &request, now)
    };
    let booking = match booking {
        Ok(b) => b,
        Err(e @ SchedulingError::SlotUnavailable) => {
            let retry = book_url(&business.slug, service.id, &request.date);
            return Err(AppError::from_scheduling(e, retry));
        }
        Err(SchedulingError::Database(e)) => return Err(e.into()),
    };

    Ok(Redirect::to(&format!("/b/{}/confirmation/{}", business.slug, booking.id)).into_response())
}

// ── Slots API ──

#[derive(Debug, Serialize)]
pub struct SlotsResponse {
    pub slots: Vec<String>,
}

pub async fn slots(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, AppError> {
    let business = active_business(&state, &slug)?;
    let empty = || Json(SlotsResponse { slots: vec![] });

    let (service_id, date) = match (query.service_id.trim().parse::<i64>(), parse_date(&query.date)) {
        (Ok(id), Some(date)) => (id, date),
        _ => return Ok(empty()),
    };
    let service = {
        let db = state.db();
        queries::get_active_service(&db, business.id, service_id)?
    };
    let service = match service {
        Some(s) => s,
        None => return Ok(empty()),
    };

    let slots = slots_for(&state, &business, &service, date)?;
    Ok(Json(SlotsResponse { slots }))
}

// ── Confirmation ──

pub async fn confirmation(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Path((slug, booking_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (business, details) = {
        let db = state.db();
        let business = queries::get_business_by_slug(&db, &slug)?.ok_or(AppError::NotFound)?;
        let details = queries::get_booking_for_business(&db, business.id, &booking_id)?
            .ok_or(AppError::NotFound)?;
        (business, details)
    };

    let b = &details.booking;
    let content = format!(
        r#"<div class="card"><p>Thank you, {name}. Your request has been received.</p>
<p><strong>{service}</strong> at {business}<br>{date}, {start} - {end}</p>
<p>Status: {status}</p>
<p class="muted">Reference {id}</p></div>
<p><a href="/b/{slug}/">Back to {business}</a></p>"#,
        name = esc(&b.customer_name),
        service = esc(&details.service_name),
        business = esc(&business.name),
        date = format_date(&b.booking_date),
        start = format_time(&b.booking_time),
        end = format_time(&details.end_time()),
        status = web::status_badge(b.status),
        id = esc(&b.id),
        slug = attr(&business.slug),
    );
    Ok(web::page(jar, "Booking received", user.as_ref(), &content).into_response())
}
