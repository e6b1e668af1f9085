use anyhow::Context;
use base64::Engine;
use chrono::{Duration, NaiveDateTime};
use hmac::{Hmac, Mac};
use rusqlite::Connection;
use sha1::Sha1;

use crate::db::queries;
use crate::models::User;

pub const SESSION_COOKIE: &str = "session";

// ── Passwords ──

/// Hashes off the async executor; bcrypt is deliberately slow.
pub async fn hash_password(password: String, cost: u32) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .context("password hashing task failed")?
        .context("failed to hash password")
}

pub async fn verify_password(password: String, hash: String) -> bool {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

// ── Session cookies ──

/// Signs session tokens so a forged cookie is rejected before it reaches the
/// database. The cookie value is `<token>.<base64url(hmac-sha1(token))>`.
#[derive(Clone)]
pub struct SessionSigner {
    mac: Hmac<Sha1>,
}

impl SessionSigner {
    pub fn new(secret: &str) -> anyhow::Result<Self> {
        let mac = <Hmac<Sha1> as Mac>::new_from_slice(secret.as_bytes())
            .map_err(|_| anyhow::anyhow!("invalid session secret"))?;
        Ok(Self { mac })
    }

    pub fn sign(&self, token: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        let signature = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{token}.{signature}")
    }

    /// Returns the token when the signature matches.
    pub fn verify<'a>(&self, value: &'a str) -> Option<&'a str> {
        let (token, signature) = value.rsplit_once('.')?;
        let signature = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(signature)
            .ok()?;
        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(token)
    }
}

/// Opens a session for `user_id` and returns its opaque token.
pub fn start_session(
    conn: &Connection,
    user_id: i64,
    ttl: Duration,
    now: NaiveDateTime,
) -> anyhow::Result<String> {
    let expires_at = now
        .checked_add_signed(ttl)
        .ok_or_else(|| anyhow::anyhow!("session lifetime {ttl} overflows"))?;
    let purged = queries::purge_expired_sessions(conn, &now)?;
    if purged > 0 {
        tracing::debug!(purged, "purged expired sessions");
    }

    let token = uuid::Uuid::new_v4().simple().to_string();
    queries::create_session(conn, &token, user_id, &expires_at)?;
    tracing::info!(user_id, "session started");
    Ok(token)
}

pub fn end_session(conn: &Connection, token: &str) -> anyhow::Result<()> {
    if queries::delete_session(conn, token)? {
        tracing::info!("session ended");
    }
    Ok(())
}

pub fn resolve_session(
    conn: &Connection,
    token: &str,
    now: NaiveDateTime,
) -> anyhow::Result<Option<User>> {
    queries::get_session_user(conn, token, &now)
}
