use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::services::business::OnboardingError;
use crate::services::scheduling::{SchedulingError, TransitionError};
use crate::web::{self, flash};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    #[error("login required")]
    LoginRequired { next: String },

    #[error("{message}")]
    Conflict { message: String, redirect_to: String },
}

impl AppError {
    pub fn conflict(message: impl Into<String>, redirect_to: impl Into<String>) -> Self {
        AppError::Conflict {
            message: message.into(),
            redirect_to: redirect_to.into(),
        }
    }

    /// Maps a booking submission failure; `retry_url` is where the customer
    /// picks another slot.
    pub fn from_scheduling(e: SchedulingError, retry_url: String) -> Self {
        match e {
            SchedulingError::SlotUnavailable => AppError::conflict(e.to_string(), retry_url),
            SchedulingError::Database(e) => AppError::Internal(e),
        }
    }

    pub fn from_transition(e: TransitionError, back_to: String) -> Self {
        match e {
            TransitionError::NotAllowed { .. } => AppError::conflict(e.to_string(), back_to),
            TransitionError::Database(e) => AppError::Internal(e),
        }
    }
}

impl From<OnboardingError> for AppError {
    fn from(e: OnboardingError) -> Self {
        match e {
            OnboardingError::OwnerHasBusiness => {
                AppError::conflict("You already have a business.", "/dashboard/")
            }
            OnboardingError::Database(e) => AppError::Internal(e),
        }
    }
}

pub fn login_url(next: &str) -> String {
    match serde_urlencoded::to_string([("next", next)]) {
        Ok(query) => format!("/auth/login?{query}"),
        Err(_) => "/auth/login".to_string(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                server_error()
            }
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "internal error");
                server_error()
            }
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                web::error_page("Page not found", "The page you were looking for does not exist."),
            )
                .into_response(),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                web::error_page("Forbidden", "You do not have access to this page."),
            )
                .into_response(),
            AppError::LoginRequired { next } => Redirect::to(&login_url(&next)).into_response(),
            AppError::Conflict {
                message,
                redirect_to,
            } => {
                tracing::info!(%message, %redirect_to, "conflict");
                let jar = flash::push(CookieJar::new(), flash::Level::Error, message);
                (jar, Redirect::to(&redirect_to)).into_response()
            }
        }
    }
}

fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        web::error_page("Something went wrong", "An unexpected error occurred. Please try again."),
    )
        .into_response()
}
