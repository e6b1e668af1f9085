//! HTML form fragments. Every value and error passes through the escapers.

use std::fmt::Write;

use super::{attr, esc};
use crate::forms::FieldErrors;

fn errors_for(errors: &FieldErrors, name: &str) -> String {
    errors
        .get(name)
        .map(|messages| {
            messages
                .iter()
                .map(|m| format!(r#"<p class="field-error">{}</p>"#, esc(m)))
                .collect()
        })
        .unwrap_or_default()
}

pub fn input(kind: &str, name: &str, label: &str, value: &str, errors: &FieldErrors) -> String {
    // Passwords are never echoed back.
    let value = if kind == "password" { "" } else { value };
    format!(
        r#"<label for="{name}">{label}</label><input type="{kind}" id="{name}" name="{name}" value="{value}">{errors}"#,
        name = attr(name),
        label = esc(label),
        kind = attr(kind),
        value = attr(value),
        errors = errors_for(errors, name),
    )
}

pub fn textarea(name: &str, label: &str, value: &str, errors: &FieldErrors) -> String {
    format!(
        r#"<label for="{name}">{label}</label><textarea id="{name}" name="{name}" rows="3">{value}</textarea>{errors}"#,
        name = attr(name),
        label = esc(label),
        value = esc(value),
        errors = errors_for(errors, name),
    )
}

pub fn checkbox(name: &str, label: &str, checked: bool) -> String {
    format!(
        r#"<label><input type="checkbox" name="{name}" value="on"{checked}> {label}</label>"#,
        name = attr(name),
        label = esc(label),
        checked = if checked { " checked" } else { "" },
    )
}

pub fn hidden(name: &str, value: &str) -> String {
    format!(
        r#"<input type="hidden" name="{}" value="{}">"#,
        attr(name),
        attr(value)
    )
}

/// `options` are `(value, label)` pairs.
pub fn select(
    name: &str,
    label: &str,
    options: &[(String, String)],
    selected: &str,
    errors: &FieldErrors,
) -> String {
    let mut html = format!(
        r#"<label for="{name}">{label}</label><select id="{name}" name="{name}">"#,
        name = attr(name),
        label = esc(label),
    );
    for (value, text) in options {
        let _ = write!(
            html,
            r#"<option value="{}"{}>{}</option>"#,
            attr(value),
            if value == selected { " selected" } else { "" },
            esc(text)
        );
    }
    html.push_str("</select>");
    html.push_str(&errors_for(errors, name));
    html
}

pub fn form(action: &str, fields: &str, submit: &str) -> String {
    format!(
        r#"<form class="card" method="post" action="{}">{fields}<p><button class="btn" type="submit">{}</button></p></form>"#,
        attr(action),
        esc(submit)
    )
}

/// A single-button POST form, for actions such as cancel or delete.
pub fn post_button(action: &str, label: &str, class: &str) -> String {
    format!(
        r#"<form method="post" action="{}"><button class="btn {}" type="submit">{}</button></form>"#,
        attr(action),
        attr(class),
        esc(label)
    )
}
