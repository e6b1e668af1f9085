use std::env;

const DEV_SESSION_SECRET: &str = "dev-secret-key-change-in-production";
const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub admin_email: String,
    pub admin_password: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let session_secret = env::var("SESSION_SECRET").unwrap_or_else(|_| {
            tracing::warn!("SESSION_SECRET not set, using the development secret");
            DEV_SESSION_SECRET.to_string()
        });

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "slotbook.db".to_string()),
            session_secret,
            session_ttl_hours: session_ttl_hours(env::var("SESSION_TTL_HOURS").ok().as_deref()),
            bcrypt_cost: env::var("BCRYPT_COST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(bcrypt::DEFAULT_COST),
            admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@slotbook.local".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
        }
    }
}

/// Session lifetime in hours, kept within one hour and one year.
fn session_ttl_hours(raw: Option<&str>) -> i64 {
    let Some(hours) = raw.and_then(|v| v.trim().parse::<i64>().ok()) else {
        return DEFAULT_SESSION_TTL_HOURS;
    };
    let clamped = hours.clamp(1, MAX_SESSION_TTL_HOURS);
    if clamped != hours {
        tracing::warn!(requested = hours, used = clamped, "SESSION_TTL_HOURS out of range");
    }
    clamped
}
