//! Owner dashboard. Every lookup is scoped through the signed-in owner's
//! business, and rows outside it are reported as not found.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::db::queries::{self, BookingFilter, BookingOrder};
use crate::errors::AppError;
use crate::forms::{BusinessForm, FieldErrors, ServiceForm, StatusForm, WorkingHourForm};
use crate::handlers::extract::CurrentUser;
use crate::models::{format_date, format_time, BookingDetails, BookingStatus, Business, User};
use crate::models::{parse_date, Service, WorkingHour};
use crate::services::business::create_business;
use crate::services::scheduling;
use crate::state::AppState;
use crate::web::{self, attr, esc, esc_opt, flash, form};

const CREATE_BUSINESS_URL: &str = "/dashboard/business/create";

fn find_business(state: &AppState, user: &User) -> Result<Option<Business>, AppError> {
    let db = state.db();
    Ok(queries::get_business_by_owner(&db, user.id)?)
}

/// Pages need a business to show; owners without one are sent to create it.
fn owned_business(state: &AppState, user: &User) -> Result<Business, AppError> {
    find_business(state, user)?
        .ok_or_else(|| AppError::conflict("Create your business first.", CREATE_BUSINESS_URL))
}

fn subnav(business: &Business) -> String {
    format!(
        r#"<p class="actions"><a href="/dashboard/">Overview</a> <a href="/dashboard/business/edit">Business</a> <a href="/dashboard/services">Services</a> <a href="/dashboard/hours">Hours</a> <a href="/dashboard/bookings">Bookings</a> <a href="/b/{}/">Public page</a></p>"#,
        attr(&business.slug)
    )
}

fn view_link(b: &BookingDetails) -> String {
    format!(r#"<a href="/dashboard/bookings/{}">View</a>"#, attr(&b.booking.id))
}

fn invalid(jar: CookieJar, title: &str, user: &User, content: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        web::page(jar, title, Some(user), content),
    )
        .into_response()
}

fn done(jar: CookieJar, message: &str, to: &str) -> Response {
    (flash::push(jar, flash::Level::Success, message), Redirect::to(to)).into_response()
}

// ── Overview ──

pub async fn index(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    if user.is_admin {
        return Ok(Redirect::to("/admin/").into_response());
    }
    let business = match find_business(&state, &user)? {
        Some(b) => b,
        None => return Ok(Redirect::to(CREATE_BUSINESS_URL).into_response()),
    };

    let today = chrono::Local::now().date_naive();
    let (total, pending, services, upcoming) = {
        let db = state.db();
        (
            queries::count_bookings(&db, Some(business.id), None)?,
            queries::count_bookings(&db, Some(business.id), Some(BookingStatus::Pending))?,
            queries::count_active_services(&db, business.id)?,
            queries::get_upcoming_bookings(&db, business.id, &today, 5)?,
        )
    };

    let content = format!(
        r#"{nav}<div class="stats">{}{}{}</div><h2>Upcoming bookings</h2>{}"#,
        web::stat("Total bookings", total),
        web::stat("Pending", pending),
        web::stat("Active services", services),
        web::bookings_table(&upcoming, false, view_link),
        nav = subnav(&business),
    );
    Ok(web::page(jar, &business.name, Some(&user), &content).into_response())
}

// ── Business ──

fn business_content(action: &str, form_data: &BusinessForm, errors: &FieldErrors, submit: &str) -> String {
    let fields = [
        form::input("text", "name", "Name", &form_data.name, errors),
        form::input("text", "phone", "Phone", &form_data.phone, errors),
        form::input("text", "address", "Address", &form_data.address, errors),
        form::textarea("description", "Description", &form_data.description, errors),
    ]
    .concat();
    form::form(action, &fields, submit)
}

pub async fn business_create_page(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    if find_business(&state, &user)?.is_some() {
        let jar = flash::push(jar, flash::Level::Info, "You already have a business.");
        return Ok((jar, Redirect::to("/dashboard/")).into_response());
    }
    let content = business_content(CREATE_BUSINESS_URL, &BusinessForm::default(), &FieldErrors::default(), "Create business");
    Ok(web::page(jar, "Create your business", Some(&user), &content).into_response())
}

pub async fn business_create(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Form(form_data): Form<BusinessForm>,
) -> Result<Response, AppError> {
    let fields = match form_data.validate() {
        Ok(f) => f,
        Err(errors) => {
            let content = business_content(CREATE_BUSINESS_URL, &form_data, &errors, "Create business");
            return Ok(invalid(jar, "Create your business", &user, &content));
        }
    };

    let business = {
        let mut db = state.db();
        create_business(&mut db, user.id, &fields, true)?
    };
    tracing::info!(business_id = business.id, owner_id = user.id, "owner created business");
    Ok(done(jar, "Business created successfully!", "/dashboard/"))
}

pub async fn business_edit_page(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let business = owned_business(&state, &user)?;
    let form_data = BusinessForm {
        name: business.name.clone(),
        phone: business.phone.clone().unwrap_or_default(),
        address: business.address.clone().unwrap_or_default(),
        description: business.description.clone().unwrap_or_default(),
    };
    let content = format!(
        r#"{}<p class="muted">Public address: <a href="/b/{slug}/">/b/{slug}/</a></p>{}"#,
        subnav(&business),
        business_content("/dashboard/business/edit", &form_data, &FieldErrors::default(), "Save"),
        slug = esc(&business.slug),
    );
    Ok(web::page(jar, "Edit business", Some(&user), &content).into_response())
}

pub async fn business_edit(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Form(form_data): Form<BusinessForm>,
) -> Result<Response, AppError> {
    let business = owned_business(&state, &user)?;
    let fields = match form_data.validate() {
        Ok(f) => f,
        Err(errors) => {
            let content = format!(
                "{}{}",
                subnav(&business),
                business_content("/dashboard/business/edit", &form_data, &errors, "Save")
            );
            return Ok(invalid(jar, "Edit business", &user, &content));
        }
    };

    {
        let db = state.db();
        queries::update_business_profile(&db, business.id, &fields)?;
    }
    tracing::info!(business_id = business.id, "business profile updated");
    Ok(done(jar, "Business updated successfully!", "/dashboard/"))
}

// ── Services ──

fn services_table(services: &[Service]) -> String {
    if services.is_empty() {
        return r#"<p class="muted">No services yet.</p>"#.to_string();
    }
    let rows: String = services
        .iter()
        .map(|s| {
            let actions = if s.is_active {
                format!(
                    r#"<div class="actions"><a class="btn btn-secondary" href="/dashboard/services/{id}/edit">Edit</a>{}</div>"#,
                    form::post_button(&format!("/dashboard/services/{}/delete", s.id), "Delete", "btn-danger"),
                    id = s.id,
                )
            } else {
                format!(
                    r#"<a class="btn btn-secondary" href="/dashboard/services/{}/edit">Edit</a>"#,
                    s.id
                )
            };
            format!(
                "<tr><td>{}</td><td>{}</td><td>{} min</td><td>{}</td><td>{actions}</td></tr>",
                esc(&s.name),
                s.price_display(),
                s.duration_minutes,
                if s.is_active { "Active" } else { r#"<span class="muted">Inactive</span>"# },
            )
        })
        .collect();
    format!("<table><thead><tr><th>Name</th><th>Price</th><th>Duration</th><th>Status</th><th></th></tr></thead><tbody>{rows}</tbody></table>")
}

fn service_content(action: &str, form_data: &ServiceForm, errors: &FieldErrors) -> String {
    let fields = [
        form::input("text", "name", "Name", &form_data.name, errors),
        form::textarea("description", "Description", &form_data.description, errors),
        form::input("text", "price", "Price", &form_data.price, errors),
        form::input("number", "duration_minutes", "Duration (minutes)", &form_data.duration_minutes, errors),
    ]
    .concat();
    form::form(action, &fields, "Save service")
}

pub async fn services_list(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let business = owned_business(&state, &user)?;
    let services = {
        let db = state.db();
        queries::list_services(&db, business.id, false)?
    };
    let content = format!(
        r#"{}<p><a class="btn" href="/dashboard/services/add">Add service</a></p>{}"#,
        subnav(&business),
        services_table(&services)
    );
    Ok(web::page(jar, "Services", Some(&user), &content).into_response())
}

pub async fn service_add_page(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let business = owned_business(&state, &user)?;
    let form_data = ServiceForm {
        duration_minutes: "30".to_string(),
        ..Default::default()
    };
    let content = format!(
        "{}{}",
        subnav(&business),
        service_content("/dashboard/services/add", &form_data, &FieldErrors::default())
    );
    Ok(web::page(jar, "Add service", Some(&user), &content).into_response())
}

pub async fn service_add(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Form(form_data): Form<ServiceForm>,
) -> Result<Response, AppError> {
    let business = owned_business(&state, &user)?;
    let fields = match form_data.validate() {
        Ok(f) => f,
        Err(errors) => {
            let content = service_content("/dashboard/services/add", &form_data, &errors);
            return Ok(invalid(jar, "Add service", &user, &content));
        }
    };

    let service_id = {
        let db = state.db();
        queries::insert_service(&db, business.id, &fields)?
    };
    tracing::info!(service_id, business_id = business.id, "service added");
    Ok(done(jar, "Service added successfully!", "/dashboard/services"))
}

pub async fn service_edit_page(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Path(service_id): Path<i64>,
) -> Result<Response, AppError> {
    let business = owned_business(&state, &user)?;
    let service = {
        let db = state.db();
        queries::get_service(&db, business.id, service_id)?.ok_or(AppError::NotFound)?
    };

    let form_data = ServiceForm {
        name: service.name.clone(),
        description: service.description.clone().unwrap_or_default(),
        price: service.price_display(),
        duration_minutes: service.duration_minutes.to_string(),
    };
    let action = format!("/dashboard/services/{service_id}/edit");
    let content = format!(
        "{}{}",
        subnav(&business),
        service_content(&action, &form_data, &FieldErrors::default())
    );
    Ok(web::page(jar, "Edit service", Some(&user), &content).into_response())
}

pub async fn service_edit(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Path(service_id): Path<i64>,
    Form(form_data): Form<ServiceForm>,
) -> Result<Response, AppError> {
    let business = find_business(&state, &user)?.ok_or(AppError::NotFound)?;
    {
        let db = state.db();
        queries::get_service(&db, business.id, service_id)?.ok_or(AppError::NotFound)?;
    }

    let fields = match form_data.validate() {
        Ok(f) => f,
        Err(errors) => {
            let action = format!("/dashboard/services/{service_id}/edit");
            return Ok(invalid(jar, "Edit service", &user, &service_content(&action, &form_data, &errors)));
        }
    };

    {
        let db = state.db();
        if !queries::update_service(&db, business.id, service_id, &fields)? {
            return Err(AppError::NotFound);
        }
    }
    tracing::info!(service_id, business_id = business.id, "service updated");
    Ok(done(jar, "Service updated successfully!", "/dashboard/services"))
}

pub async fn service_delete(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Path(service_id): Path<i64>,
) -> Result<Response, AppError> {
    let business = find_business(&state, &user)?.ok_or(AppError::NotFound)?;
    {
        let db = state.db();
        if !queries::deactivate_service(&db, business.id, service_id)? {
            return Err(AppError::NotFound);
        }
    }
    tracing::info!(service_id, business_id = business.id, "service deactivated");
    Ok(done(jar, "Service deleted successfully!", "/dashboard/services"))
}

// ── Working hours ──

fn hours_table(hours: &[WorkingHour]) -> String {
    let rows: String = hours
        .iter()
        .map(|h| {
            let window = if h.is_closed {
                r#"<span class="muted">Closed</span>"#.to_string()
            } else {
                format!("{} - {}", format_time(&h.open_time), format_time(&h.close_time))
            };
            format!(
                r#"<tr><td>{}</td><td>{window}</td><td><a href="/dashboard/hours/{}/edit">Edit</a></td></tr>"#,
                h.day_name(),
                h.id
            )
        })
        .collect();
    format!("<table><thead><tr><th>Day</th><th>Hours</th><th></th></tr></thead><tbody>{rows}</tbody></table>")
}

fn hour_content(hour: &WorkingHour, form_data: &WorkingHourForm, errors: &FieldErrors) -> String {
    let fields = [
        form::input("time", "open_time", "Opens", &form_data.open_time, errors),
        form::input("time", "close_time", "Closes", &form_data.close_time, errors),
        form::checkbox("is_closed", "Closed all day", form_data.is_closed()),
    ]
    .concat();
    form::form(&format!("/dashboard/hours/{}/edit", hour.id), &fields, "Save hours")
}

pub async fn hours_list(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let business = owned_business(&state, &user)?;
    let hours = {
        let db = state.db();
        queries::list_working_hours(&db, business.id)?
    };
    let content = format!("{}{}", subnav(&business), hours_table(&hours));
    Ok(web::page(jar, "Working hours", Some(&user), &content).into_response())
}

pub async fn hour_edit_page(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Path(hour_id): Path<i64>,
) -> Result<Response, AppError> {
    let business = owned_business(&state, &user)?;
    let hour = {
        let db = state.db();
        queries::get_working_hour(&db, business.id, hour_id)?.ok_or(AppError::NotFound)?
    };
    let content = format!(
        "{}{}",
        subnav(&business),
        hour_content(&hour, &WorkingHourForm::from_hour(&hour), &FieldErrors::default())
    );
    Ok(web::page(jar, &format!("{} hours", hour.day_name()), Some(&user), &content).into_response())
}

pub async fn hour_edit(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Path(hour_id): Path<i64>,
    Form(form_data): Form<WorkingHourForm>,
) -> Result<Response, AppError> {
    let business = find_business(&state, &user)?.ok_or(AppError::NotFound)?;
    let hour = {
        let db = state.db();
        queries::get_working_hour(&db, business.id, hour_id)?.ok_or(AppError::NotFound)?
    };

    let (open, close, closed) = match form_data.validate(&hour) {
        Ok(v) => v,
        Err(errors) => {
            let title = format!("{} hours", hour.day_name());
            return Ok(invalid(jar, &title, &user, &hour_content(&hour, &form_data, &errors)));
        }
    };

    {
        let db = state.db();
        queries::update_working_hour(&db, business.id, hour.id, &open, &close, closed)?;
    }
    tracing::info!(business_id = business.id, day = hour.day_of_week, closed, "working hours updated");
    Ok(done(jar, "Working hours updated!", "/dashboard/hours"))
}

// ── Bookings ──

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BookingsQuery {
    pub status: String,
    pub date: String,
}

fn booking_filters(query: &BookingsQuery) -> String {
    let fields = [
        form::select("status", "Status", &web::status_options(), &query.status, &FieldErrors::default()),
        form::input("date", "date", "Date", &query.date, &FieldErrors::default()),
    ]
    .concat();
    format!(
        r#"<form class="card" method="get" action="/dashboard/bookings">{fields}<p><button class="btn" type="submit">Filter</button></p></form>"#
    )
}

pub async fn bookings_list(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Query(query): Query<BookingsQuery>,
) -> Result<Response, AppError> {
    let business = owned_business(&state, &user)?;
    // Unknown statuses and malformed dates fall back to no filter.
    let filter = BookingFilter {
        business_id: Some(business.id),
        status: BookingStatus::parse(&query.status),
        date: parse_date(&query.date),
    };
    let bookings = {
        let db = state.db();
        queries::list_bookings(&db, &filter, BookingOrder::Schedule, None)?
    };

    let content = format!(
        "{}{}{}",
        subnav(&business),
        booking_filters(&query),
        web::bookings_table(&bookings, false, view_link)
    );
    Ok(web::page(jar, "Bookings", Some(&user), &content).into_response())
}

fn booking_detail_content(details: &BookingDetails) -> String {
    let b = &details.booking;
    let options: Vec<(String, String)> = BookingStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), s.label().to_string()))
        .collect();
    let status_form = form::form(
        &format!("/dashboard/bookings/{}", b.id),
        &form::select("status", "Status", &options, b.status.as_str(), &FieldErrors::default()),
        "Update status",
    );

    let mut quick = String::new();
    if b.status.can_transition_to(BookingStatus::Confirmed) {
        quick.push_str(&form::post_button(&format!("/dashboard/bookings/{}/confirm", b.id), "Confirm", ""));
    }
    if b.status.can_transition_to(BookingStatus::Cancelled) {
        quick.push_str(&form::post_button(&format!("/dashboard/bookings/{}/cancel", b.id), "Cancel", "btn-danger"));
    }

    format!(
        r#"<div class="card"><p>{status}</p>
<p><strong>{service}</strong> on {date}, {start} - {end}</p>
<p>{name}<br>{phone}<br>{email}</p>
<p class="muted">{notes}</p>
<div class="actions">{quick}</div></div>{status_form}"#,
        status = web::status_badge(b.status),
        service = esc(&details.service_name),
        date = format_date(&b.booking_date),
        start = format_time(&b.booking_time),
        end = format_time(&details.end_time()),
        name = esc(&b.customer_name),
        phone = esc(&b.customer_phone),
        email = esc_opt(b.customer_email.as_deref()),
        notes = esc_opt(b.notes.as_deref()),
    )
}

fn owned_booking(state: &AppState, business: &Business, booking_id: &str) -> Result<BookingDetails, AppError> {
    let db = state.db();
    queries::get_booking_for_business(&db, business.id, booking_id)?.ok_or(AppError::NotFound)
}

pub async fn booking_detail(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Path(booking_id): Path<String>,
) -> Result<Response, AppError> {
    let business = owned_business(&state, &user)?;
    let details = owned_booking(&state, &business, &booking_id)?;
    let content = format!("{}{}", subnav(&business), booking_detail_content(&details));
    Ok(web::page(jar, "Booking", Some(&user), &content).into_response())
}

fn apply_status(
    state: &AppState,
    user: &User,
    jar: CookieJar,
    booking_id: &str,
    to: BookingStatus,
    message: &str,
) -> Result<Response, AppError> {
    let business = find_business(state, user)?.ok_or(AppError::NotFound)?;
    let details = owned_booking(state, &business, booking_id)?;
    let back = format!("/dashboard/bookings/{booking_id}");
    {
        let db = state.db();
        scheduling::change_status(&db, &details, to).map_err(|e| AppError::from_transition(e, back))?;
    }
    Ok(done(jar, message, "/dashboard/bookings"))
}

pub async fn booking_update_status(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Path(booking_id): Path<String>,
    Form(form_data): Form<StatusForm>,
) -> Result<Response, AppError> {
    let to = match form_data.status() {
        Some(s) => s,
        None => {
            return Err(AppError::conflict(
                "Choose a valid status.",
                format!("/dashboard/bookings/{booking_id}"),
            ))
        }
    };
    apply_status(&state, &user, jar, &booking_id, to, "Booking status updated!")
}

pub async fn booking_confirm(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Path(booking_id): Path<String>,
) -> Result<Response, AppError> {
    apply_status(&state, &user, jar, &booking_id, BookingStatus::Confirmed, "Booking confirmed!")
}

pub async fn booking_cancel(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Path(booking_id): Path<String>,
) -> Result<Response, AppError> {
    apply_status(&state, &user, jar, &booking_id, BookingStatus::Cancelled, "Booking cancelled.")
}
