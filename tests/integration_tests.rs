use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use tower::ServiceExt;

use slotbook::config::AppConfig;
use slotbook::db::{self, queries};
use slotbook::handlers;
use slotbook::models::{parse_date, parse_time, Booking, BookingStatus, Business, BusinessFields, ServiceFields};
use slotbook::services::auth;
use slotbook::services::business::create_business;
use slotbook::state::AppState;

// 2099-06-15 is a Monday, open 09:00-17:00 by default.
const MONDAY: &str = "2099-06-15";
const PASSWORD: &str = "hunter22";

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        session_secret: "test-secret".to_string(),
        session_ttl_hours: 24,
        bcrypt_cost: 4,
        admin_email: "admin@slotbook.local".to_string(),
        admin_password: "admin123".to_string(),
    }
}

fn test_state() -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    Arc::new(AppState::new(conn, test_config()).unwrap())
}

async fn send(state: &Arc<AppState>, req: Request<Body>) -> Response<Body> {
    handlers::router(Arc::clone(state)).oneshot(req).await.unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, cookie: Option<&str>, fields: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(serde_urlencoded::to_string(fields).unwrap()))
        .unwrap()
}

async fn body_string(res: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(res: &Response<Body>) -> &str {
    res.headers().get(header::LOCATION).unwrap().to_str().unwrap()
}

/// The `name=value` pair of a cookie set by the response.
fn set_cookie(res: &Response<Body>, name: &str) -> Option<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{name}=")))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

fn create_user(state: &AppState, email: &str, is_admin: bool) -> i64 {
    let hash = bcrypt::hash(PASSWORD, 4).unwrap();
    let db = state.db();
    queries::create_user(
        &db,
        &queries::NewUser {
            email,
            password_hash: &hash,
            first_name: "Test",
            last_name: "User",
            is_admin,
        },
    )
    .unwrap()
}

/// Signs a user in without going through the login form.
fn session_for(state: &AppState, user_id: i64) -> String {
    let db = state.db();
    let now = chrono::Local::now().naive_local();
    let token = auth::start_session(&db, user_id, state.session_ttl(), now).unwrap();
    format!("{}={}", auth::SESSION_COOKIE, state.sessions.sign(&token))
}

struct Owner {
    cookie: String,
    business: Business,
    service_id: i64,
}

fn owner_with_business(state: &AppState, email: &str, name: &str) -> Owner {
    let user_id = create_user(state, email, false);
    let (business, service_id) = {
        let mut db = state.db();
        let business = create_business(
            &mut db,
            user_id,
            &BusinessFields {
                name: name.to_string(),
                ..Default::default()
            },
            true,
        )
        .unwrap();
        let service_id = queries::insert_service(
            &db,
            business.id,
            &ServiceFields {
                name: "Haircut".to_string(),
                description: None,
                price_cents: 2500,
                duration_minutes: 30,
            },
        )
        .unwrap();
        (business, service_id)
    };
    Owner {
        cookie: session_for(state, user_id),
        business,
        service_id,
    }
}

fn insert_confirmed(state: &AppState, owner: &Owner, date: &str, time: &str) {
    let now = chrono::Local::now().naive_local();
    let db = state.db();
    queries::insert_booking(
        &db,
        &Booking {
            id: uuid::Uuid::new_v4().to_string(),
            business_id: owner.business.id,
            service_id: owner.service_id,
            customer_name: "Existing Customer".to_string(),
            customer_phone: "5550001111".to_string(),
            customer_email: None,
            booking_date: parse_date(date).unwrap(),
            booking_time: parse_time(time).unwrap(),
            status: BookingStatus::Confirmed,
            notes: None,
            created_at: now,
            updated_at: now,
        },
    )
    .unwrap();
}

fn booking_fields<'a>(service_id: &'a str, time: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("service_id", service_id),
        ("booking_date", MONDAY),
        ("booking_time", time),
        ("customer_name", "Carl Customer"),
        ("customer_phone", "5551234567"),
        ("customer_email", ""),
        ("notes", ""),
    ]
}

// ── Health & landing ──

#[tokio::test]
async fn test_health() {
    let state = test_state();
    let res = send(&state, get("/health", None)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(res).await).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_landing_lists_active_businesses() {
    let state = test_state();
    let owner = owner_with_business(&state, "joe@example.com", "Joe's Cafe");

    let res = send(&state, get("/", None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_string(res).await;
    assert!(body.contains(&format!("/b/{}/", owner.business.slug)));
}

// ── Auth ──

#[tokio::test]
async fn test_register_signs_in_and_sends_to_business_setup() {
    let state = test_state();

    let res = send(
        &state,
        post_form(
            "/auth/register",
            None,
            &[
                ("email", "Olive@Example.com"),
                ("first_name", "Olive"),
                ("last_name", "Owner"),
                ("password", PASSWORD),
                ("confirm_password", PASSWORD),
            ],
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/dashboard/");
    let cookie = set_cookie(&res, auth::SESSION_COOKIE).unwrap();

    {
        let db = state.db();
        assert!(queries::get_user_by_email(&db, "olive@example.com").unwrap().is_some());
    }

    let res = send(&state, get("/dashboard/", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/dashboard/business/create");
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let state = test_state();
    create_user(&state, "olive@example.com", false);

    let res = send(
        &state,
        post_form(
            "/auth/register",
            None,
            &[
                ("email", "olive@example.com"),
                ("first_name", "Olive"),
                ("last_name", "Owner"),
                ("password", PASSWORD),
                ("confirm_password", PASSWORD),
            ],
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_string(res).await.contains("This email is already registered."));
}

#[tokio::test]
async fn test_login_and_logout() {
    let state = test_state();
    create_user(&state, "olive@example.com", false);

    let res = send(
        &state,
        post_form(
            "/auth/login",
            None,
            &[("email", "olive@example.com"), ("password", PASSWORD), ("next", "/dashboard/services")],
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/dashboard/services");
    let cookie = set_cookie(&res, auth::SESSION_COOKIE).unwrap();

    let res = send(&state, post_form("/auth/logout", Some(&cookie), &[])).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    // The old cookie no longer resolves to a session.
    let res = send(&state, get("/dashboard/", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert!(location(&res).starts_with("/auth/login"));
}

#[tokio::test]
async fn test_login_wrong_password() {
    let state = test_state();
    create_user(&state, "olive@example.com", false);

    let res = send(
        &state,
        post_form(
            "/auth/login",
            None,
            &[("email", "olive@example.com"), ("password", "wrong-password")],
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(set_cookie(&res, auth::SESSION_COOKIE).is_none());
    assert!(body_string(res).await.contains("Invalid email or password."));
}

#[tokio::test]
async fn test_login_ignores_foreign_next() {
    let state = test_state();
    create_user(&state, "olive@example.com", false);

    let res = send(
        &state,
        post_form(
            "/auth/login",
            None,
            &[("email", "olive@example.com"), ("password", PASSWORD), ("next", "//evil.example.com")],
        ),
    )
    .await;
    assert_eq!(location(&res), "/dashboard/");
}

#[tokio::test]
async fn test_tampered_session_cookie_is_anonymous() {
    let state = test_state();
    let owner = owner_with_business(&state, "joe@example.com", "Joe's Cafe");
    let tampered = format!("{}x", owner.cookie);

    let res = send(&state, get("/dashboard/", Some(&tampered))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert!(location(&res).starts_with("/auth/login"));
}

// ── Access control ──

#[tokio::test]
async fn test_dashboard_redirects_anonymous_to_login() {
    let state = test_state();
    let res = send(&state, get("/dashboard/services", None)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/auth/login?next=%2Fdashboard%2Fservices");
}

#[tokio::test]
async fn test_admin_gate() {
    let state = test_state();
    let owner = owner_with_business(&state, "joe@example.com", "Joe's Cafe");
    let admin_id = create_user(&state, "admin@example.com", true);
    let admin_cookie = session_for(&state, admin_id);

    let res = send(&state, get("/admin/", None)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let res = send(&state, get("/admin/", Some(&owner.cookie))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = send(&state, get("/admin/", Some(&admin_cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);

    // Admins landing on the owner dashboard are sent to the console.
    let res = send(&state, get("/dashboard/", Some(&admin_cookie))).await;
    assert_eq!(location(&res), "/admin/");
}

#[tokio::test]
async fn test_non_owner_cannot_touch_foreign_service() {
    let state = test_state();
    let joe = owner_with_business(&state, "joe@example.com", "Joe's Cafe");
    let ann = owner_with_business(&state, "ann@example.com", "Ann's Salon");
    let uri = format!("/dashboard/services/{}/edit", joe.service_id);

    let res = send(&state, get(&uri, Some(&ann.cookie))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = send(
        &state,
        post_form(
            &uri,
            Some(&ann.cookie),
            &[("name", "Hijacked"), ("description", ""), ("price", "1"), ("duration_minutes", "30")],
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = send(
        &state,
        post_form(&format!("/dashboard/services/{}/delete", joe.service_id), Some(&ann.cookie), &[]),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let db = state.db();
    let service = queries::get_service(&db, joe.business.id, joe.service_id).unwrap().unwrap();
    assert_eq!(service.name, "Haircut");
    assert!(service.is_active);
}

// ── Owner dashboard ──

#[tokio::test]
async fn test_owner_creates_business_once() {
    let state = test_state();
    let user_id = create_user(&state, "olive@example.com", false);
    let cookie = session_for(&state, user_id);

    let res = send(
        &state,
        post_form(
            "/dashboard/business/create",
            Some(&cookie),
            &[("name", "Olive's Barbers"), ("phone", ""), ("address", ""), ("description", "")],
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/dashboard/");

    let res = send(&state, get("/dashboard/business/create", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/dashboard/");

    let db = state.db();
    let business = queries::get_business_by_owner(&db, user_id).unwrap().unwrap();
    assert_eq!(business.slug, "olives-barbers");
    assert_eq!(queries::list_working_hours(&db, business.id).unwrap().len(), 7);
}

#[tokio::test]
async fn test_service_validation_rerenders_form() {
    let state = test_state();
    let owner = owner_with_business(&state, "joe@example.com", "Joe's Cafe");

    let res = send(
        &state,
        post_form(
            "/dashboard/services/add",
            Some(&owner.cookie),
            &[("name", "X"), ("description", ""), ("price", "1.234"), ("duration_minutes", "2")],
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_string(res).await;
    assert!(body.contains("field-error"));

    let db = state.db();
    assert_eq!(queries::list_services(&db, owner.business.id, false).unwrap().len(), 1);
}

#[tokio::test]
async fn test_soft_deleted_service_hidden_from_public_page() {
    let state = test_state();
    let owner = owner_with_business(&state, "joe@example.com", "Joe's Cafe");
    let public = format!("/b/{}/", owner.business.slug);

    let body = body_string(send(&state, get(&public, None)).await).await;
    assert!(body.contains("Haircut"));

    let res = send(
        &state,
        post_form(&format!("/dashboard/services/{}/delete", owner.service_id), Some(&owner.cookie), &[]),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let body = body_string(send(&state, get(&public, None)).await).await;
    assert!(!body.contains("Haircut"));

    // Still listed for the owner, marked inactive.
    let body = body_string(send(&state, get("/dashboard/services", Some(&owner.cookie))).await).await;
    assert!(body.contains("Haircut"));
    assert!(body.contains("Inactive"));

    // With no active services left the booking form bounces back.
    let res = send(&state, get(&format!("/b/{}/book", owner.business.slug), None)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), public);
}

#[tokio::test]
async fn test_working_hours_edit_rejects_inverted_window() {
    let state = test_state();
    let owner = owner_with_business(&state, "joe@example.com", "Joe's Cafe");
    let monday = {
        let db = state.db();
        queries::get_working_hour_for_day(&db, owner.business.id, 0).unwrap().unwrap()
    };
    let uri = format!("/dashboard/hours/{}/edit", monday.id);

    let res = send(
        &state,
        post_form(&uri, Some(&owner.cookie), &[("open_time", "12:00"), ("close_time", "11:00")]),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = send(
        &state,
        post_form(&uri, Some(&owner.cookie), &[("open_time", "10:00"), ("close_time", "12:00")]),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let slots_uri = format!("/b/{}/slots?service_id={}&date={MONDAY}", owner.business.slug, owner.service_id);
    let json: serde_json::Value = serde_json::from_str(&body_string(send(&state, get(&slots_uri, None)).await).await).unwrap();
    assert_eq!(json["slots"], serde_json::json!(["10:00", "10:30", "11:00", "11:30"]));
}

#[tokio::test]
async fn test_owner_confirms_then_cannot_revive_cancelled() {
    let state = test_state();
    let owner = owner_with_business(&state, "joe@example.com", "Joe's Cafe");
    let service_id = owner.service_id.to_string();

    let res = send(
        &state,
        post_form(&format!("/b/{}/book", owner.business.slug), None, &booking_fields(&service_id, "11:00")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let booking_id = location(&res).rsplit('/').next().unwrap().to_string();

    let res = send(
        &state,
        post_form(&format!("/dashboard/bookings/{booking_id}/confirm"), Some(&owner.cookie), &[]),
    )
    .await;
    assert_eq!(location(&res), "/dashboard/bookings");

    let res = send(
        &state,
        post_form(&format!("/dashboard/bookings/{booking_id}/cancel"), Some(&owner.cookie), &[]),
    )
    .await;
    assert_eq!(location(&res), "/dashboard/bookings");

    let res = send(
        &state,
        post_form(
            &format!("/dashboard/bookings/{booking_id}"),
            Some(&owner.cookie),
            &[("status", "pending")],
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), format!("/dashboard/bookings/{booking_id}"));
    assert!(set_cookie(&res, "flash").is_some());

    let db = state.db();
    let details = queries::get_booking(&db, &booking_id).unwrap().unwrap();
    assert_eq!(details.booking.status, BookingStatus::Cancelled);
}

// ── Public booking ──

#[tokio::test]
async fn test_slots_exclude_booked_interval() {
    let state = test_state();
    let owner = owner_with_business(&state, "joe@example.com", "Joe's Cafe");
    insert_confirmed(&state, &owner, MONDAY, "10:00");

    let uri = format!("/b/{}/slots?service_id={}&date={MONDAY}", owner.business.slug, owner.service_id);
    let res = send(&state, get(&uri, None)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(res).await).unwrap();
    let slots: Vec<String> = serde_json::from_value(json["slots"].clone()).unwrap();
    assert!(!slots.contains(&"10:00".to_string()));
    assert!(slots.contains(&"09:30".to_string()));
    assert!(slots.contains(&"10:30".to_string()));
    assert_eq!(slots.len(), 15);
}

#[tokio::test]
async fn test_slots_bad_input_is_empty() {
    let state = test_state();
    let owner = owner_with_business(&state, "joe@example.com", "Joe's Cafe");
    let other = owner_with_business(&state, "ann@example.com", "Ann's Salon");
    let slug = &owner.business.slug;

    for query in [
        String::new(),
        format!("service_id={}", owner.service_id),
        format!("service_id={}&date=not-a-date", owner.service_id),
        format!("service_id={}&date=2000-01-03", owner.service_id),
        format!("service_id={}&date={MONDAY}", other.service_id),
        // Saturday is closed by default.
        format!("service_id={}&date=2099-06-13", owner.service_id),
    ] {
        let res = send(&state, get(&format!("/b/{slug}/slots?{query}"), None)).await;
        assert_eq!(res.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(res).await).unwrap();
        assert_eq!(json, serde_json::json!({"slots": []}), "query {query}");
    }
}

#[tokio::test]
async fn test_booking_flow_and_confirmation() {
    let state = test_state();
    let owner = owner_with_business(&state, "joe@example.com", "Joe's Cafe");
    let service_id = owner.service_id.to_string();

    let res = send(
        &state,
        post_form(&format!("/b/{}/book", owner.business.slug), None, &booking_fields(&service_id, "09:00")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let confirmation = location(&res).to_string();
    assert!(confirmation.starts_with(&format!("/b/{}/confirmation/", owner.business.slug)));

    let res = send(&state, get(&confirmation, None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_string(res).await;
    assert!(body.contains("Carl Customer"));
    assert!(body.contains("09:00 - 09:30"));

    // The owner sees it as pending.
    let body = body_string(send(&state, get("/dashboard/bookings?status=pending", Some(&owner.cookie))).await).await;
    assert!(body.contains("Carl Customer"));
}

#[tokio::test]
async fn test_booking_taken_slot_conflicts_without_insert() {
    let state = test_state();
    let owner = owner_with_business(&state, "joe@example.com", "Joe's Cafe");
    insert_confirmed(&state, &owner, MONDAY, "10:00");
    let service_id = owner.service_id.to_string();

    let res = send(
        &state,
        post_form(&format!("/b/{}/book", owner.business.slug), None, &booking_fields(&service_id, "10:00")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let retry = location(&res).to_string();
    assert_eq!(
        retry,
        format!("/b/{}/book?service_id={}&date={MONDAY}", owner.business.slug, owner.service_id)
    );
    let flash = set_cookie(&res, "flash").unwrap();

    {
        let db = state.db();
        assert_eq!(queries::count_bookings(&db, Some(owner.business.id), None).unwrap(), 1);
    }

    // The flash is shown once on the retry page.
    let body = body_string(send(&state, get(&retry, Some(&flash))).await).await;
    assert!(body.contains("This time slot is no longer available."));
}

#[tokio::test]
async fn test_booking_validation_errors() {
    let state = test_state();
    let owner = owner_with_business(&state, "joe@example.com", "Joe's Cafe");
    let service_id = owner.service_id.to_string();
    let mut fields = booking_fields(&service_id, "10:00");
    fields[4] = ("customer_phone", "123");
    fields[1] = ("booking_date", "2000-01-03");

    let res = send(&state, post_form(&format!("/b/{}/book", owner.business.slug), None, &fields)).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let db = state.db();
    assert_eq!(queries::count_bookings(&db, None, None).unwrap(), 0);
}

#[tokio::test]
async fn test_inactive_business_hidden_but_confirmation_kept() {
    let state = test_state();
    let owner = owner_with_business(&state, "joe@example.com", "Joe's Cafe");
    let service_id = owner.service_id.to_string();
    let slug = owner.business.slug.clone();

    let res = send(&state, post_form(&format!("/b/{slug}/book"), None, &booking_fields(&service_id, "13:00"))).await;
    let confirmation = location(&res).to_string();

    let admin_id = create_user(&state, "admin@example.com", true);
    let admin_cookie = session_for(&state, admin_id);
    let res = send(
        &state,
        post_form(&format!("/admin/businesses/{}/toggle", owner.business.id), Some(&admin_cookie), &[]),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    assert_eq!(send(&state, get(&format!("/b/{slug}/"), None)).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        send(&state, get(&format!("/b/{slug}/slots?service_id={service_id}&date={MONDAY}"), None))
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(send(&state, get(&confirmation, None)).await.status(), StatusCode::OK);

    // A booking id from another business does not resolve under this slug.
    let other = owner_with_business(&state, "ann@example.com", "Ann's Salon");
    let booking_id = confirmation.rsplit('/').next().unwrap();
    let res = send(&state, get(&format!("/b/{}/confirmation/{booking_id}", other.business.slug), None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

// ── Admin console ──

#[tokio::test]
async fn test_admin_creates_business_for_owner_once() {
    let state = test_state();
    let admin_id = create_user(&state, "admin@example.com", true);
    let admin_cookie = session_for(&state, admin_id);
    let owner_id = create_user(&state, "olive@example.com", false);
    let owner_field = owner_id.to_string();

    let fields = [
        ("name", "Olive's Barbers"),
        ("owner_id", owner_field.as_str()),
        ("phone", ""),
        ("address", ""),
        ("description", ""),
        ("is_active", "on"),
    ];
    let res = send(&state, post_form("/admin/businesses/add", Some(&admin_cookie), &fields)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/admin/businesses");

    let res = send(&state, post_form("/admin/businesses/add", Some(&admin_cookie), &fields)).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_string(res).await.contains("This user already has a business."));

    let db = state.db();
    assert_eq!(queries::count_businesses(&db, false).unwrap(), 1);
}

#[tokio::test]
async fn test_admin_cannot_give_owner_a_second_business() {
    let state = test_state();
    let admin_id = create_user(&state, "admin@example.com", true);
    let admin_cookie = session_for(&state, admin_id);
    let olive = owner_with_business(&state, "olive@example.com", "Olive's Salon");
    let otto = owner_with_business(&state, "otto@example.com", "Otto's Barbers");
    let owner_field = olive.business.owner_id.to_string();

    let fields = [
        ("name", "Otto's Barbers"),
        ("owner_id", owner_field.as_str()),
        ("phone", ""),
        ("address", ""),
        ("description", ""),
        ("is_active", "on"),
    ];
    let uri = format!("/admin/businesses/{}/edit", otto.business.id);
    let res = send(&state, post_form(&uri, Some(&admin_cookie), &fields)).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_string(res).await.contains("This user already has a business."));

    let db = state.db();
    let business = queries::get_business(&db, otto.business.id).unwrap().unwrap();
    assert_eq!(business.owner_id, otto.business.owner_id);
}

#[tokio::test]
async fn test_admin_edits_user_without_changing_password() {
    let state = test_state();
    let admin_id = create_user(&state, "admin@example.com", true);
    let admin_cookie = session_for(&state, admin_id);
    let user_id = create_user(&state, "olive@example.com", false);
    let before = {
        let db = state.db();
        queries::get_user(&db, user_id).unwrap().unwrap()
    };

    let res = send(
        &state,
        post_form(
            &format!("/admin/users/{user_id}/edit"),
            Some(&admin_cookie),
            &[("email", "admin@example.com"), ("first_name", "Olive"), ("last_name", "Owner"), ("password", "")],
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = send(
        &state,
        post_form(
            &format!("/admin/users/{user_id}/edit"),
            Some(&admin_cookie),
            &[("email", "olive@example.org"), ("first_name", "Olive"), ("last_name", "Owner"), ("password", "")],
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let db = state.db();
    let after = queries::get_user(&db, user_id).unwrap().unwrap();
    assert_eq!(after.email, "olive@example.org");
    assert_eq!(after.password_hash, before.password_hash);
}

#[tokio::test]
async fn test_admin_booking_filters_and_status() {
    let state = test_state();
    let admin_id = create_user(&state, "admin@example.com", true);
    let admin_cookie = session_for(&state, admin_id);
    let joe = owner_with_business(&state, "joe@example.com", "Joe's Cafe");
    let ann = owner_with_business(&state, "ann@example.com", "Ann's Salon");
    insert_confirmed(&state, &joe, MONDAY, "10:00");
    insert_confirmed(&state, &ann, MONDAY, "11:00");

    let body = body_string(
        send(&state, get(&format!("/admin/bookings?status=all&business={}", ann.business.id), Some(&admin_cookie))).await,
    )
    .await;
    assert!(body.contains("11:00 - 11:30"));
    assert!(!body.contains("10:00 - 10:30"));

    let booking_id = {
        let db = state.db();
        let filter = queries::BookingFilter {
            business_id: Some(joe.business.id),
            ..Default::default()
        };
        queries::list_bookings(&db, &filter, queries::BookingOrder::Created, None).unwrap()[0]
            .booking
            .id
            .clone()
    };
    let res = send(
        &state,
        post_form(&format!("/admin/bookings/{booking_id}/status"), Some(&admin_cookie), &[("status", "completed")]),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let db = state.db();
    let details = queries::get_booking(&db, &booking_id).unwrap().unwrap();
    assert_eq!(details.booking.status, BookingStatus::Completed);
}
