//! One-shot messages carried across a redirect in an unsigned cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use serde::{Deserialize, Serialize};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

fn decode(value: &str) -> Vec<Flash> {
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

fn encode(items: &[Flash]) -> String {
    let json = serde_json::to_vec(items).unwrap_or_default();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json)
}

/// Appends a message to whatever is already queued.
pub fn push(jar: CookieJar, level: Level, message: impl Into<String>) -> CookieJar {
    let mut items = jar.get(FLASH_COOKIE).map(|c| decode(c.value())).unwrap_or_default();
    items.push(Flash {
        level,
        message: message.into(),
    });
    jar.add(
        Cookie::build((FLASH_COOKIE, encode(&items)))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Drains the queued messages. The returned jar clears the cookie.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<Flash>) {
    let items = match jar.get(FLASH_COOKIE) {
        Some(c) => decode(c.value()),
        None => return (jar, vec![]),
    };
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    (jar, items)
}
