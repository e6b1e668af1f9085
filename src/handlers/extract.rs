//! Request guards. Handlers name the capability they need in their signature.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use crate::errors::AppError;
use crate::models::User;
use crate::services::auth::{self, SESSION_COOKIE};
use crate::state::AppState;

/// The signed-in user, if any. Never rejects a request on its own.
pub struct MaybeUser(pub Option<User>);

/// A signed-in user. Anonymous requests are sent to the login page.
pub struct CurrentUser(pub User);

/// A signed-in administrator. Other users get 403.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = match jar
            .get(SESSION_COOKIE)
            .and_then(|c| state.sessions.verify(c.value()).map(str::to_string))
        {
            Some(token) => token,
            None => return Ok(MaybeUser(None)),
        };

        let now = chrono::Local::now().naive_local();
        let user = {
            let db = state.db();
            auth::resolve_session(&db, &token, now)?
        };
        Ok(MaybeUser(user))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await? {
            MaybeUser(Some(user)) => Ok(CurrentUser(user)),
            MaybeUser(None) => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| "/".to_string());
                Err(AppError::LoginRequired { next })
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            tracing::warn!(user_id = user.id, path = %parts.uri.path(), "non-admin denied");
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}
