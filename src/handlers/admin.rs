//! Administrator console. Nothing here is scoped by owner; the `AdminUser`
//! guard is the only gate.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::db::{self, queries};
use crate::db::queries::{BookingFilter, BookingOrder, NewUser, UserUpdate};
use crate::errors::AppError;
use crate::forms::{AdminBusinessForm, AdminUserForm, FieldErrors, StatusForm};
use crate::handlers::extract::AdminUser;
use crate::models::{BookingDetails, BookingStatus, Business, User};
use crate::services::auth;
use crate::services::business::{create_business, OnboardingError};
use crate::services::scheduling;
use crate::state::AppState;
use crate::web::{self, attr, esc, flash, form};

const SUBNAV: &str = r#"<p class="actions"><a href="/admin/">Overview</a> <a href="/admin/users">Users</a> <a href="/admin/businesses">Businesses</a> <a href="/admin/bookings">Bookings</a></p>"#;

fn invalid(jar: CookieJar, title: &str, user: &User, content: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        web::page(jar, title, Some(user), &format!("{SUBNAV}{content}")),
    )
        .into_response()
}

fn done(jar: CookieJar, message: &str, to: &str) -> Response {
    (flash::push(jar, flash::Level::Success, message), Redirect::to(to)).into_response()
}

// ── Overview ──

pub async fn index(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (businesses, active, users, bookings, pending, recent) = {
        let db = state.db();
        (
            queries::count_businesses(&db, false)?,
            queries::count_businesses(&db, true)?,
            queries::count_users(&db)?,
            queries::count_bookings(&db, None, None)?,
            queries::count_bookings(&db, None, Some(BookingStatus::Pending))?,
            queries::list_bookings(&db, &BookingFilter::default(), BookingOrder::Created, Some(10))?,
        )
    };

    let content = format!(
        r#"{SUBNAV}<div class="stats">{}{}{}{}{}</div><h2>Recent bookings</h2>{}"#,
        web::stat("Businesses", businesses),
        web::stat("Active businesses", active),
        web::stat("Users", users),
        web::stat("Bookings", bookings),
        web::stat("Pending", pending),
        web::bookings_table(&recent, true, |_| String::new()),
    );
    Ok(web::page(jar, "Admin", Some(&admin), &content).into_response())
}

// ── Users ──

fn users_table(users: &[User]) -> String {
    let rows: String = users
        .iter()
        .map(|u| {
            format!(
                r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><a href="/admin/users/{}/edit">Edit</a></td></tr>"#,
                esc(&u.full_name()),
                esc(&u.email),
                if u.is_admin { "Admin" } else { "Owner" },
                u.created_at.format("%Y-%m-%d"),
                u.id,
            )
        })
        .collect();
    format!("<table><thead><tr><th>Name</th><th>Email</th><th>Role</th><th>Joined</th><th></th></tr></thead><tbody>{rows}</tbody></table>")
}

fn user_content(action: &str, form_data: &AdminUserForm, errors: &FieldErrors, editing: bool) -> String {
    let password_label = if editing { "New password (leave blank to keep)" } else { "Password" };
    let fields = [
        form::input("email", "email", "Email", &form_data.email, errors),
        form::input("text", "first_name", "First name", &form_data.first_name, errors),
        form::input("text", "last_name", "Last name", &form_data.last_name, errors),
        form::input("password", "password", password_label, "", errors),
        form::checkbox("is_admin", "Administrator", form_data.is_admin()),
    ]
    .concat();
    form::form(action, &fields, "Save user")
}

pub async fn users_list(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let users = {
        let db = state.db();
        queries::list_users(&db)?
    };
    let content = format!(
        r#"{SUBNAV}<p><a class="btn" href="/admin/users/add">Add user</a></p>{}"#,
        users_table(&users)
    );
    Ok(web::page(jar, "Users", Some(&admin), &content).into_response())
}

pub async fn user_add_page(AdminUser(admin): AdminUser, jar: CookieJar) -> Response {
    let content = format!(
        "{SUBNAV}{}",
        user_content("/admin/users/add", &AdminUserForm::default(), &FieldErrors::default(), false)
    );
    web::page(jar, "Add user", Some(&admin), &content).into_response()
}

fn email_taken(state: &AppState, email: &str, except: Option<i64>) -> Result<bool, AppError> {
    let db = state.db();
    Ok(queries::get_user_by_email(&db, email)?.is_some_and(|u| Some(u.id) != except))
}

pub async fn user_add(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    jar: CookieJar,
    Form(form_data): Form<AdminUserForm>,
) -> Result<Response, AppError> {
    let rerender = |jar: CookieJar, errors: &FieldErrors| {
        invalid(jar, "Add user", &admin, &user_content("/admin/users/add", &form_data, errors, false))
    };
    let mut duplicate = FieldErrors::default();
    duplicate.add("email", "Email already exists.");

    let input = match form_data.validate(true) {
        Ok(i) => i,
        Err(errors) => return Ok(rerender(jar, &errors)),
    };
    if email_taken(&state, &input.email, None)? {
        return Ok(rerender(jar, &duplicate));
    }

    let password = input.password.clone().unwrap_or_default();
    let password_hash = auth::hash_password(password, state.config.bcrypt_cost).await?;

    let created = {
        let db = state.db();
        queries::create_user(
            &db,
            &NewUser {
                email: &input.email,
                password_hash: &password_hash,
                first_name: &input.first_name,
                last_name: &input.last_name,
                is_admin: input.is_admin,
            },
        )
    };
    let user_id = match created {
        Ok(id) => id,
        Err(e) if db::is_constraint_violation(&e) => return Ok(rerender(jar, &duplicate)),
        Err(e) => return Err(e.into()),
    };
    tracing::info!(user_id, admin_id = admin.id, is_admin = input.is_admin, "admin created user");
    Ok(done(jar, "User created successfully!", "/admin/users"))
}

fn load_user(state: &AppState, user_id: i64) -> Result<User, AppError> {
    let db = state.db();
    queries::get_user(&db, user_id)?.ok_or(AppError::NotFound)
}

pub async fn user_edit_page(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    jar: CookieJar,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    let user = load_user(&state, user_id)?;
    let form_data = AdminUserForm {
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        password: None,
        is_admin: user.is_admin.then(|| "on".to_string()),
    };
    let content = format!(
        "{SUBNAV}{}",
        user_content(&format!("/admin/users/{user_id}/edit"), &form_data, &FieldErrors::default(), true)
    );
    Ok(web::page(jar, "Edit user", Some(&admin), &content).into_response())
}

pub async fn user_edit(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    jar: CookieJar,
    Path(user_id): Path<i64>,
    Form(form_data): Form<AdminUserForm>,
) -> Result<Response, AppError> {
    load_user(&state, user_id)?;
    let action = format!("/admin/users/{user_id}/edit");
    let rerender = |jar: CookieJar, errors: &FieldErrors| {
        invalid(jar, "Edit user", &admin, &user_content(&action, &form_data, errors, true))
    };

    let input = match form_data.validate(false) {
        Ok(i) => i,
        Err(errors) => return Ok(rerender(jar, &errors)),
    };
    if email_taken(&state, &input.email, Some(user_id))? {
        let mut errors = FieldErrors::default();
        errors.add("email", "Email already exists.");
        return Ok(rerender(jar, &errors));
    }

    let password_hash = match input.password.clone() {
        Some(p) => Some(auth::hash_password(p, state.config.bcrypt_cost).await?),
        None => None,
    };

    {
        let db = state.db();
        queries::update_user(
            &db,
            user_id,
            &UserUpdate {
                email: &input.email,
                first_name: &input.first_name,
                last_name: &input.last_name,
                is_admin: input.is_admin,
                password_hash: password_hash.as_deref(),
            },
        )?;
    }
    tracing::info!(user_id, admin_id = admin.id, password_changed = password_hash.is_some(), "admin updated user");
    Ok(done(jar, "User updated successfully!", "/admin/users"))
}

// ── Businesses ──

fn businesses_table(businesses: &[Business]) -> String {
    let rows: String = businesses
        .iter()
        .map(|b| {
            let (status, toggle) = if b.is_active {
                ("Active", "Deactivate")
            } else {
                ("Inactive", "Activate")
            };
            format!(
                r#"<tr><td>{}</td><td><a href="/b/{slug}/">{slug}</a></td><td>{status}</td><td><div class="actions"><a class="btn btn-secondary" href="/admin/businesses/{id}/edit">Edit</a>{}</div></td></tr>"#,
                esc(&b.name),
                form::post_button(&format!("/admin/businesses/{}/toggle", b.id), toggle, ""),
                slug = attr(&b.slug),
                id = b.id,
            )
        })
        .collect();
    format!("<table><thead><tr><th>Name</th><th>Slug</th><th>Status</th><th></th></tr></thead><tbody>{rows}</tbody></table>")
}

fn owner_options(state: &AppState) -> Result<Vec<(String, String)>, AppError> {
    let db = state.db();
    Ok(queries::list_users_by_name(&db)?
        .into_iter()
        .map(|u| (u.id.to_string(), format!("{} ({})", u.full_name(), u.email)))
        .collect())
}

fn business_content(
    action: &str,
    owners: &[(String, String)],
    form_data: &AdminBusinessForm,
    errors: &FieldErrors,
) -> String {
    let fields = [
        form::input("text", "name", "Name", &form_data.name, errors),
        form::select("owner_id", "Owner", owners, &form_data.owner_id, errors),
        form::input("text", "phone", "Phone", &form_data.phone, errors),
        form::input("text", "address", "Address", &form_data.address, errors),
        form::textarea("description", "Description", &form_data.description, errors),
        form::checkbox("is_active", "Active", form_data.is_active()),
    ]
    .concat();
    form::form(action, &fields, "Save business")
}

pub async fn businesses_list(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let businesses = {
        let db = state.db();
        queries::list_businesses(&db)?
    };
    let content = format!(
        r#"{SUBNAV}<p><a class="btn" href="/admin/businesses/add">Add business</a></p>{}"#,
        businesses_table(&businesses)
    );
    Ok(web::page(jar, "Businesses", Some(&admin), &content).into_response())
}

pub async fn business_add_page(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let owners = owner_options(&state)?;
    let form_data = AdminBusinessForm {
        is_active: Some("on".to_string()),
        ..Default::default()
    };
    let content = format!(
        "{SUBNAV}{}",
        business_content("/admin/businesses/add", &owners, &form_data, &FieldErrors::default())
    );
    Ok(web::page(jar, "Add business", Some(&admin), &content).into_response())
}

pub async fn business_add(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    jar: CookieJar,
    Form(form_data): Form<AdminBusinessForm>,
) -> Result<Response, AppError> {
    let owners = owner_options(&state)?;
    let rerender = |jar: CookieJar, errors: &FieldErrors| {
        invalid(jar, "Add business", &admin, &business_content("/admin/businesses/add", &owners, &form_data, errors))
    };

    let input = match form_data.validate() {
        Ok(i) => i,
        Err(errors) => return Ok(rerender(jar, &errors)),
    };
    if !owner_exists(&state, input.owner_id)? {
        let mut errors = FieldErrors::default();
        errors.add("owner_id", "Choose an owner.");
        return Ok(rerender(jar, &errors));
    }

    let created = {
        let mut db = state.db();
        create_business(&mut db, input.owner_id, &input.fields, input.is_active)
    };
    let business = match created {
        Ok(b) => b,
        Err(OnboardingError::OwnerHasBusiness) => {
            let mut errors = FieldErrors::default();
            errors.add("owner_id", "This user already has a business.");
            return Ok(rerender(jar, &errors));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(business_id = business.id, admin_id = admin.id, "admin created business");
    Ok(done(jar, "Business created successfully!", "/admin/businesses"))
}

fn owner_exists(state: &AppState, owner_id: i64) -> Result<bool, AppError> {
    let db = state.db();
    Ok(queries::get_user(&db, owner_id)?.is_some())
}

fn load_business(state: &AppState, business_id: i64) -> Result<Business, AppError> {
    let db = state.db();
    queries::get_business(&db, business_id)?.ok_or(AppError::NotFound)
}

pub async fn business_edit_page(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    jar: CookieJar,
    Path(business_id): Path<i64>,
) -> Result<Response, AppError> {
    let business = load_business(&state, business_id)?;
    let owners = owner_options(&state)?;
    let form_data = AdminBusinessForm {
        name: business.name.clone(),
        phone: business.phone.clone().unwrap_or_default(),
        address: business.address.clone().unwrap_or_default(),
        description: business.description.clone().unwrap_or_default(),
        owner_id: business.owner_id.to_string(),
        is_active: business.is_active.then(|| "on".to_string()),
    };
    let content = format!(
        r#"{SUBNAV}<p class="muted">Slug: {}</p>{}"#,
        esc(&business.slug),
        business_content(
            &format!("/admin/businesses/{business_id}/edit"),
            &owners,
            &form_data,
            &FieldErrors::default()
        )
    );
    Ok(web::page(jar, "Edit business", Some(&admin), &content).into_response())
}

pub async fn business_edit(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    jar: CookieJar,
    Path(business_id): Path<i64>,
    Form(form_data): Form<AdminBusinessForm>,
) -> Result<Response, AppError> {
    load_business(&state, business_id)?;
    let owners = owner_options(&state)?;
    let action = format!("/admin/businesses/{business_id}/edit");
    let rerender = |jar: CookieJar, errors: &FieldErrors| {
        invalid(jar, "Edit business", &admin, &business_content(&action, &owners, &form_data, errors))
    };

    let input = match form_data.validate() {
        Ok(i) => i,
        Err(errors) => return Ok(rerender(jar, &errors)),
    };

    let owner_error = if !owner_exists(&state, input.owner_id)? {
        Some("Choose an owner.")
    } else {
        let db = state.db();
        queries::get_business_by_owner(&db, input.owner_id)?
            .is_some_and(|b| b.id != business_id)
            .then_some("This user already has a business.")
    };
    if let Some(message) = owner_error {
        let mut errors = FieldErrors::default();
        errors.add("owner_id", message);
        return Ok(rerender(jar, &errors));
    }

    let updated = {
        let db = state.db();
        queries::update_business_admin(&db, business_id, &input.fields, input.owner_id, input.is_active)
    };
    match updated {
        Ok(_) => {}
        Err(e) if db::is_constraint_violation(&e) => {
            let mut errors = FieldErrors::default();
            errors.add("owner_id", "This user already has a business.");
            return Ok(rerender(jar, &errors));
        }
        Err(e) => return Err(e.into()),
    }
    tracing::info!(business_id, admin_id = admin.id, "admin updated business");
    Ok(done(jar, "Business updated successfully!", "/admin/businesses"))
}

pub async fn business_toggle(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    jar: CookieJar,
    Path(business_id): Path<i64>,
) -> Result<Response, AppError> {
    let business = load_business(&state, business_id)?;
    let is_active = !business.is_active;
    {
        let db = state.db();
        queries::set_business_active(&db, business_id, is_active)?;
    }
    tracing::info!(business_id, admin_id = admin.id, is_active, "business toggled");

    let message = if is_active {
        "Business activated successfully!"
    } else {
        "Business deactivated successfully!"
    };
    Ok(done(jar, message, "/admin/businesses"))
}

// ── Bookings ──

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdminBookingsQuery {
    pub status: String,
    pub business: String,
}

fn status_cell(b: &BookingDetails) -> String {
    let options: Vec<(String, String)> = BookingStatus::ALL
        .iter()
        .filter(|s| **s == b.booking.status || b.booking.status.can_transition_to(**s))
        .map(|s| (s.as_str().to_string(), s.label().to_string()))
        .collect();
    if options.len() < 2 {
        return String::new();
    }
    let mut select = String::new();
    for (value, label) in &options {
        select.push_str(&format!(
            r#"<option value="{value}"{}>{label}</option>"#,
            if value == b.booking.status.as_str() { " selected" } else { "" }
        ));
    }
    format!(
        r#"<form class="actions" method="post" action="/admin/bookings/{}/status"><select name="status">{select}</select><button class="btn btn-secondary" type="submit">Set</button></form>"#,
        attr(&b.booking.id)
    )
}

pub async fn bookings_list(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    jar: CookieJar,
    Query(query): Query<AdminBookingsQuery>,
) -> Result<Response, AppError> {
    let filter = BookingFilter {
        business_id: query.business.trim().parse().ok(),
        status: BookingStatus::parse(&query.status),
        date: None,
    };
    let (bookings, businesses) = {
        let db = state.db();
        (
            queries::list_bookings(&db, &filter, BookingOrder::Created, None)?,
            queries::list_businesses_by_name(&db)?,
        )
    };

    let business_options: Vec<(String, String)> = std::iter::once((String::new(), "All businesses".to_string()))
        .chain(businesses.iter().map(|b| (b.id.to_string(), b.name.clone())))
        .collect();
    let no_errors = FieldErrors::default();
    let filters = [
        form::select("status", "Status", &web::status_options(), &query.status, &no_errors),
        form::select("business", "Business", &business_options, &query.business, &no_errors),
    ]
    .concat();

    let content = format!(
        r#"{SUBNAV}<form class="card" method="get" action="/admin/bookings">{filters}<p><button class="btn" type="submit">Filter</button></p></form>{}"#,
        web::bookings_table(&bookings, true, status_cell)
    );
    Ok(web::page(jar, "All bookings", Some(&admin), &content).into_response())
}

pub async fn booking_status(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    jar: CookieJar,
    Path(booking_id): Path<String>,
    Form(form_data): Form<StatusForm>,
) -> Result<Response, AppError> {
    let to = form_data
        .status()
        .ok_or_else(|| AppError::conflict("Choose a valid status.", "/admin/bookings"))?;
    {
        let db = state.db();
        let details = queries::get_booking(&db, &booking_id)?.ok_or(AppError::NotFound)?;
        scheduling::change_status(&db, &details, to)
            .map_err(|e| AppError::from_transition(e, "/admin/bookings".to_string()))?;
    }
    tracing::info!(booking_id = %booking_id, admin_id = admin.id, status = to.as_str(), "admin changed booking status");
    Ok(done(jar, "Booking status updated!", "/admin/bookings"))
}
