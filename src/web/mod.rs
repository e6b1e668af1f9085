//! Server-rendered HTML. Pages are plain strings assembled from escaped
//! fragments and dropped into the embedded layout.

pub mod flash;
pub mod form;

use std::borrow::Cow;
use std::fmt::Write;

use axum::response::Html;
use axum_extra::extract::cookie::CookieJar;

use crate::models::{format_date, format_time, BookingDetails, BookingStatus, User};

pub use flash::{Flash, Level};

const LAYOUT: &str = include_str!("layout.html");

pub fn esc(s: &str) -> Cow<'_, str> {
    html_escape::encode_text(s)
}

pub fn attr(s: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(s)
}

pub fn esc_opt(s: Option<&str>) -> Cow<'_, str> {
    esc(s.unwrap_or(""))
}

/// Substitutes `{{KEY}}` placeholders in one pass, so values that themselves
/// contain braces are never expanded again.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match values.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn nav(user: Option<&User>) -> String {
    match user {
        Some(u) => {
            let mut links = String::new();
            if u.is_admin {
                links.push_str(r#"<a href="/admin/">Admin</a>"#);
            } else {
                links.push_str(r#"<a href="/dashboard/">Dashboard</a>"#);
            }
            format!(
                r#"{links}<span>{}</span><form method="post" action="/auth/logout"><button type="submit">Log out</button></form>"#,
                esc(&u.full_name())
            )
        }
        None => r#"<a href="/auth/login">Log in</a><a href="/auth/register">Register</a>"#.to_string(),
    }
}

fn flashes(items: &[Flash]) -> String {
    items
        .iter()
        .map(|f| {
            format!(
                r#"<div class="flash flash-{}">{}</div>"#,
                f.level.as_str(),
                esc(&f.message)
            )
        })
        .collect()
}

pub fn render(title: &str, user: Option<&User>, flash: &[Flash], content: &str) -> Html<String> {
    Html(fill(
        LAYOUT,
        &[
            ("TITLE", &esc(title)),
            ("NAV", &nav(user)),
            ("FLASHES", &flashes(flash)),
            ("CONTENT", content),
        ],
    ))
}

/// Renders a page, draining any queued flash messages into it.
pub fn page(jar: CookieJar, title: &str, user: Option<&User>, content: &str) -> (CookieJar, Html<String>) {
    let (jar, messages) = flash::take(jar);
    (jar, render(title, user, &messages, content))
}

pub fn error_page(title: &str, message: &str) -> Html<String> {
    render(
        title,
        None,
        &[],
        &format!(r#"<div class="card"><p>{}</p><p><a href="/">Back to home</a></p></div>"#, esc(message)),
    )
}

pub fn status_badge(status: BookingStatus) -> String {
    format!(
        r#"<span class="status status-{}">{}</span>"#,
        status.as_str(),
        status.label()
    )
}

/// `actions` renders the last cell of each row.
pub fn bookings_table<F>(bookings: &[BookingDetails], show_business: bool, actions: F) -> String
where
    F: Fn(&BookingDetails) -> String,
{
    if bookings.is_empty() {
        return r#"<p class="muted">No bookings found.</p>"#.to_string();
    }

    let mut html = String::from("<table><thead><tr><th>Date</th><th>Time</th><th>Customer</th><th>Service</th>");
    if show_business {
        html.push_str("<th>Business</th>");
    }
    html.push_str("<th>Status</th><th></th></tr></thead><tbody>");

    for b in bookings {
        let booking = &b.booking;
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{} - {}</td><td>{}<br><span class=\"muted\">{}</span></td><td>{}</td>",
            format_date(&booking.booking_date),
            format_time(&booking.booking_time),
            format_time(&b.end_time()),
            esc(&booking.customer_name),
            esc(&booking.customer_phone),
            esc(&b.service_name),
        );
        if show_business {
            let _ = write!(html, "<td>{}</td>", esc(&b.business_name));
        }
        let _ = write!(
            html,
            "<td>{}</td><td>{}</td></tr>",
            status_badge(booking.status),
            actions(b)
        );
    }
    html.push_str("</tbody></table>");
    html
}

/// `(value, label)` pairs for a status filter, led by "all".
pub fn status_options() -> Vec<(String, String)> {
    std::iter::once(("all".to_string(), "All".to_string()))
        .chain(
            BookingStatus::ALL
                .iter()
                .map(|s| (s.as_str().to_string(), s.label().to_string())),
        )
        .collect()
}

pub fn stat(label: &str, value: i64) -> String {
    format!(
        r#"<div class="card stat"><strong>{value}</strong>{}</div>"#,
        esc(label)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_is_single_pass() {
        let out = fill("<h1>{{TITLE}}</h1>{{BODY}}", &[("TITLE", "{{BODY}}"), ("BODY", "x")]);
        assert_eq!(out, "<h1>{{BODY}}</h1>x");
    }

    #[test]
    fn test_fill_keeps_unknown_placeholders() {
        assert_eq!(fill("a {{NOPE}} b {{", &[]), "a {{NOPE}} b {{");
    }

    #[test]
    fn test_render_escapes_title() {
        let Html(page) = render("<script>", None, &[], "");
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<h1><script>"));
    }
}
