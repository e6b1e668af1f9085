use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::forms::{FieldErrors, LoginForm, RegisterForm};
use crate::handlers::extract::MaybeUser;
use crate::services::auth::{self, SESSION_COOKIE};
use crate::state::AppState;
use crate::web::{self, esc, flash, form};

const INVALID_LOGIN: &str = "Invalid email or password.";

/// Only local paths are honored, so `next` cannot bounce to another host.
fn safe_next(next: &str) -> Option<&str> {
    let local = next.starts_with('/') && !next.starts_with("//") && !next.starts_with("/\\");
    local.then_some(next)
}

fn session_cookie(value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn signed_in(state: &AppState, jar: CookieJar, user_id: i64) -> Result<CookieJar, AppError> {
    let now = chrono::Local::now().naive_local();
    let token = {
        let db = state.db();
        auth::start_session(&db, user_id, state.session_ttl(), now)?
    };
    Ok(jar.add(session_cookie(state.sessions.sign(&token))))
}

// ── Login ──

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NextQuery {
    pub next: String,
}

fn login_content(form_data: &LoginForm, errors: &FieldErrors, message: Option<&str>) -> String {
    let mut fields = String::new();
    if let Some(message) = message {
        fields.push_str(&format!(r#"<p class="field-error">{}</p>"#, esc(message)));
    }
    fields.push_str(&form::input("email", "email", "Email", &form_data.email, errors));
    fields.push_str(&form::input("password", "password", "Password", "", errors));
    fields.push_str(&form::hidden("next", &form_data.next));

    format!(
        r#"{}<p class="muted">No account yet? <a href="/auth/register">Register your business</a>.</p>"#,
        form::form("/auth/login", &fields, "Log in")
    )
}

pub async fn login_page(
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Query(query): Query<NextQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/dashboard/").into_response();
    }
    let form_data = LoginForm {
        next: query.next,
        ..Default::default()
    };
    web::page(jar, "Log in", None, &login_content(&form_data, &FieldErrors::default(), None)).into_response()
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form_data): Form<LoginForm>,
) -> Result<Response, AppError> {
    let email = match form_data.validate() {
        Ok(email) => email,
        Err(errors) => {
            let content = login_content(&form_data, &errors, None);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, web::page(jar, "Log in", None, &content)).into_response());
        }
    };

    let user = {
        let db = state.db();
        queries::get_user_by_email(&db, &email)?
    };

    let verified = match &user {
        Some(u) => auth::verify_password(form_data.password.clone(), u.password_hash.clone()).await,
        None => false,
    };
    let user = match user {
        Some(u) if verified => u,
        _ => {
            tracing::info!(email = %email, "login failed");
            let content = login_content(&form_data, &FieldErrors::default(), Some(INVALID_LOGIN));
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, web::page(jar, "Log in", None, &content)).into_response());
        }
    };

    let jar = signed_in(&state, jar, user.id)?;
    tracing::info!(user_id = user.id, "user logged in");

    let target = safe_next(&form_data.next).unwrap_or("/dashboard/").to_string();
    let jar = flash::push(jar, flash::Level::Success, format!("Welcome back, {}!", user.first_name));
    Ok((jar, Redirect::to(&target)).into_response())
}

// ── Registration ──

fn register_content(form_data: &RegisterForm, errors: &FieldErrors) -> String {
    let fields = [
        form::input("email", "email", "Email", &form_data.email, errors),
        form::input("text", "first_name", "First name", &form_data.first_name, errors),
        form::input("text", "last_name", "Last name", &form_data.last_name, errors),
        form::input("password", "password", "Password", "", errors),
        form::input("password", "confirm_password", "Confirm password", "", errors),
    ]
    .concat();
    format!(
        r#"{}<p class="muted">Already registered? <a href="/auth/login">Log in</a>.</p>"#,
        form::form("/auth/register", &fields, "Create account")
    )
}

pub async fn register_page(MaybeUser(user): MaybeUser, jar: CookieJar) -> Response {
    if user.is_some() {
        return Redirect::to("/dashboard/").into_response();
    }
    let content = register_content(&RegisterForm::default(), &FieldErrors::default());
    web::page(jar, "Register", None, &content).into_response()
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form_data): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let rerender = |jar: CookieJar, errors: &FieldErrors| {
        let content = register_content(&form_data, errors);
        (StatusCode::UNPROCESSABLE_ENTITY, web::page(jar, "Register", None, &content)).into_response()
    };

    let registration = match form_data.validate() {
        Ok(r) => r,
        Err(errors) => return Ok(rerender(jar, &errors)),
    };

    let taken = {
        let db = state.db();
        queries::get_user_by_email(&db, &registration.email)?.is_some()
    };
    let mut duplicate = FieldErrors::default();
    duplicate.add("email", "This email is already registered.");
    if taken {
        return Ok(rerender(jar, &duplicate));
    }

    let password_hash = auth::hash_password(registration.password.clone(), state.config.bcrypt_cost).await?;

    let created = {
        let db = state.db();
        queries::create_user(
            &db,
            &queries::NewUser {
                email: &registration.email,
                password_hash: &password_hash,
                first_name: &registration.first_name,
                last_name: &registration.last_name,
                is_admin: false,
            },
        )
    };
    let user_id = match created {
        Ok(id) => id,
        // Lost a race with a concurrent registration for the same address.
        Err(e) if db::is_constraint_violation(&e) => return Ok(rerender(jar, &duplicate)),
        Err(e) => return Err(e.into()),
    };
    tracing::info!(user_id, "user registered");

    let jar = signed_in(&state, jar, user_id)?;
    let jar = flash::push(jar, flash::Level::Success, "Your account has been created.");
    Ok((jar, Redirect::to("/dashboard/")).into_response())
}

// ── Logout ──

pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<Response, AppError> {
    let token = jar
        .get(SESSION_COOKIE)
        .and_then(|c| state.sessions.verify(c.value()).map(str::to_string));
    if let Some(token) = token {
        let db = state.db();
        auth::end_session(&db, &token)?;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    let jar = flash::push(jar, flash::Level::Info, "You have been logged out.");
    Ok((jar, Redirect::to("/")).into_response())
}
