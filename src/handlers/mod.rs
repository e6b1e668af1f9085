pub mod admin;
pub mod auth;
pub mod booking;
pub mod dashboard;
pub mod extract;
pub mod health;
pub mod home;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/health", get(health::health))
        // Auth
        .route("/auth/login", get(auth::login_page).post(auth::login))
        .route("/auth/register", get(auth::register_page).post(auth::register))
        .route("/auth/logout", post(auth::logout))
        // Owner dashboard
        .route("/dashboard", get(dashboard::index))
        .route("/dashboard/", get(dashboard::index))
        .route(
            "/dashboard/business/create",
            get(dashboard::business_create_page).post(dashboard::business_create),
        )
        .route(
            "/dashboard/business/edit",
            get(dashboard::business_edit_page).post(dashboard::business_edit),
        )
        .route("/dashboard/services", get(dashboard::services_list))
        .route(
            "/dashboard/services/add",
            get(dashboard::service_add_page).post(dashboard::service_add),
        )
        .route(
            "/dashboard/services/:id/edit",
            get(dashboard::service_edit_page).post(dashboard::service_edit),
        )
        .route("/dashboard/services/:id/delete", post(dashboard::service_delete))
        .route("/dashboard/hours", get(dashboard::hours_list))
        .route(
            "/dashboard/hours/:id/edit",
            get(dashboard::hour_edit_page).post(dashboard::hour_edit),
        )
        .route("/dashboard/bookings", get(dashboard::bookings_list))
        .route(
            "/dashboard/bookings/:id",
            get(dashboard::booking_detail).post(dashboard::booking_update_status),
        )
        .route("/dashboard/bookings/:id/confirm", post(dashboard::booking_confirm))
        .route("/dashboard/bookings/:id/cancel", post(dashboard::booking_cancel))
        // Admin console
        .route("/admin", get(admin::index))
        .route("/admin/", get(admin::index))
        .route("/admin/users", get(admin::users_list))
        .route("/admin/users/add", get(admin::user_add_page).post(admin::user_add))
        .route(
            "/admin/users/:id/edit",
            get(admin::user_edit_page).post(admin::user_edit),
        )
        .route("/admin/businesses", get(admin::businesses_list))
        .route(
            "/admin/businesses/add",
            get(admin::business_add_page).post(admin::business_add),
        )
        .route(
            "/admin/businesses/:id/edit",
            get(admin::business_edit_page).post(admin::business_edit),
        )
        .route("/admin/businesses/:id/toggle", post(admin::business_toggle))
        .route("/admin/bookings", get(admin::bookings_list))
        .route("/admin/bookings/:id/status", post(admin::booking_status))
        // Public booking pages
        .route("/b/:slug", get(booking::public_page))
        .route("/b/:slug/", get(booking::public_page))
        .route("/b/:slug/book", get(booking::book_page).post(booking::book))
        .route("/b/:slug/slots", get(booking::slots))
        .route(
            "/b/:slug/confirmation/:booking_id",
            get(booking::confirmation),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
