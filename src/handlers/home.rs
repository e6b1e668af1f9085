use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::extract::MaybeUser;
use crate::state::AppState;
use crate::web::{self, attr, esc};

pub async fn index(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let businesses = {
        let db = state.db();
        queries::list_businesses_by_name(&db)?
    };

    let listing: String = businesses
        .iter()
        .filter(|b| b.is_active)
        .map(|b| format!(r#"<li><a href="/b/{}/">{}</a></li>"#, attr(&b.slug), esc(&b.name)))
        .collect();

    let call_to_action = match &user {
        Some(_) => r#"<a class="btn" href="/dashboard/">Go to your dashboard</a>"#,
        None => r#"<a class="btn" href="/auth/register">Register your business</a>"#,
    };
    let content = format!(
        r#"<div class="card"><p>Online appointment booking for small businesses.</p><p>{call_to_action}</p></div>{}"#,
        if listing.is_empty() {
            String::new()
        } else {
            format!("<h2>Book with</h2><ul>{listing}</ul>")
        }
    );
    Ok(web::page(jar, "Welcome", user.as_ref(), &content).into_response())
}
