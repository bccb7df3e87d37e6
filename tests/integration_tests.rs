use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, patch, post};
use axum::Router;
use chrono::NaiveDateTime;
use tower::ServiceExt;

use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::db::queries;
use salonbook::handlers;
use salonbook::models::{Booking, BookingStatus, Business, Customer, Service, Staff};
use salonbook::state::AppState;

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        slot_granularity_minutes: None,
    }
}

fn test_state() -> Arc<AppState> {
    let config = test_config();
    let conn = db::init_db(":memory:").unwrap();
    let (events_tx, _) = tokio::sync::broadcast::channel(64);
    Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config,
        events_tx,
    })
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/businesses", post(handlers::businesses::create_business))
        .route(
            "/api/businesses/:business_id/customers",
            post(handlers::customers::create_customer).get(handlers::customers::list_customers),
        )
        .route(
            "/api/businesses/:business_id/customers/:id",
            get(handlers::customers::get_customer),
        )
        .route(
            "/api/businesses/:business_id/customers/:id/bookings",
            get(handlers::customers::customer_bookings),
        )
        .route(
            "/api/businesses/:business_id/availability",
            get(handlers::availability::get_availability),
        )
        .route(
            "/api/businesses/:business_id/bookings",
            post(handlers::bookings::create_booking).get(handlers::bookings::list_bookings),
        )
        .route(
            "/api/businesses/:business_id/bookings/:id",
            patch(handlers::bookings::update_booking),
        )
        .route(
            "/api/businesses/:business_id/bookings/:id/cancel",
            post(handlers::bookings::cancel_booking),
        )
        .route(
            "/api/businesses/:business_id/bookings/:id/confirm",
            post(handlers::bookings::confirm_booking),
        )
        .route(
            "/api/businesses/:business_id/bookings/:id/complete",
            post(handlers::bookings::complete_booking),
        )
        .route(
            "/api/businesses/:business_id/dashboard",
            get(handlers::dashboard::get_dashboard),
        )
        .with_state(state)
}

fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

/// Seeds one business with a 30-minute service and a staff member working
/// 09:00-18:00 every day. Bookings in these tests target 2030-06-17, a
/// Monday far enough out that the booking horizon never interferes.
fn seed(state: &Arc<AppState>) {
    let db = state.db.lock().unwrap();
    let now = dt("2025-06-01 00:00");

    queries::create_business(
        &db,
        &Business {
            id: "biz".to_string(),
            name: "Shear Genius".to_string(),
            timezone: "UTC".to_string(),
            utc_offset_minutes: 0,
            created_at: now,
            updated_at: now,
        },
    )
    .unwrap();

    queries::create_service(
        &db,
        &Service {
            id: "cut".to_string(),
            business_id: "biz".to_string(),
            name: "Haircut".to_string(),
            duration_minutes: 30,
            price_cents: 4000,
            currency: "USD".to_string(),
            buffer_before_minutes: 0,
            buffer_after_minutes: 0,
            min_advance_hours: 0,
            max_advance_days: 3650,
            active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .unwrap();

    let days: Vec<String> = (0..7)
        .map(|d| format!(r#"{{"weekday":{d},"start":"09:00","end":"18:00","enabled":true}}"#))
        .collect();
    queries::create_staff(
        &db,
        &Staff {
            id: "anna".to_string(),
            business_id: "biz".to_string(),
            name: "Anna".to_string(),
            working_hours: Some(format!(r#"{{"days":[{}]}}"#, days.join(","))),
            active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .unwrap();

    queries::create_customer(
        &db,
        &Customer {
            id: "cust".to_string(),
            business_id: "biz".to_string(),
            name: "Carol".to_string(),
            email: Some("carol@example.com".to_string()),
            phone: None,
            tags: vec![],
            total_bookings: 0,
            total_spent_cents: 0,
            last_visit_at: None,
            created_at: now,
            updated_at: now,
        },
    )
    .unwrap();
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", "Bearer test-token")
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", "Bearer test-token")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_patch(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(uri)
        .header("Authorization", "Bearer test-token")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create_booking(state: &Arc<AppState>, start: &str) -> serde_json::Value {
    let (status, json) = send(
        test_app(state.clone()),
        post_json(
            "/api/businesses/biz/bookings",
            &format!(
                r#"{{"service_id":"cut","staff_id":"anna","customer_id":"cust","start_time":"{start}"}}"#
            ),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
    json["data"].clone()
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let res = test_app(test_state())
        .oneshot(get_req("/health"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ── Auth gate ──

#[tokio::test]
async fn test_admin_endpoints_require_auth() {
    let state = test_state();
    seed(&state);

    let (status, json) = send(test_app(state.clone()), get_req("/api/businesses/biz/bookings")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "UNAUTHORIZED");

    let (status, _) = send(test_app(state), get_req("/api/businesses/biz/dashboard")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_business_via_api() {
    let state = test_state();
    let (status, json) = send(
        test_app(state),
        admin_post("/api/businesses", r#"{"name":"Snip City","timezone":"Europe/Berlin","utc_offset_minutes":120}"#),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["name"], "Snip City");
    assert_eq!(json["status"], 201);
}

// ── Availability ──

#[tokio::test]
async fn test_open_day_reports_all_slots_available() {
    let state = test_state();
    seed(&state);

    let (status, json) = send(
        test_app(state),
        get_req("/api/businesses/biz/availability?service_id=cut&staff_id=anna&date=2030-06-17"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let slots = json["data"]["slots"].as_array().unwrap();
    // 09:00-18:00 with 30-minute slots
    assert_eq!(slots.len(), 18);
    assert!(slots.iter().all(|s| s["available"] == true));
    assert_eq!(json["data"]["date"], "2030-06-17");
}

#[tokio::test]
async fn test_unknown_service_availability_404() {
    let state = test_state();
    seed(&state);

    let (status, json) = send(
        test_app(state),
        get_req("/api/businesses/biz/availability?service_id=nope&date=2030-06-17"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "SERVICE_NOT_FOUND");
}

#[tokio::test]
async fn test_booking_blocks_slot_and_cancel_frees_it() {
    let state = test_state();
    seed(&state);

    let booking = create_booking(&state, "2030-06-17 10:00").await;
    let booking_id = booking["id"].as_str().unwrap().to_string();
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["end_time"], "2030-06-17T10:30:00");

    // The 10:00 slot is now busy; neighbours are not.
    let (_, json) = send(
        test_app(state.clone()),
        get_req("/api/businesses/biz/availability?service_id=cut&staff_id=anna&date=2030-06-17"),
    )
    .await;
    let slots = json["data"]["slots"].as_array().unwrap().clone();
    let slot = |t: &str| {
        slots
            .iter()
            .find(|s| s["start"].as_str().unwrap().ends_with(t))
            .unwrap()
            .clone()
    };
    assert_eq!(slot("T10:00:00")["available"], false);
    assert_eq!(slot("T09:00:00")["available"], true);
    assert_eq!(slot("T11:00:00")["available"], true);

    // Overlapping request rejected with the conflict code.
    let (status, json) = send(
        test_app(state.clone()),
        post_json(
            "/api/businesses/biz/bookings",
            r#"{"service_id":"cut","staff_id":"anna","customer_id":"cust","start_time":"2030-06-17 10:15"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "SLOT_NOT_AVAILABLE");

    // Cancel, then the slot opens up again.
    let (status, _) = send(
        test_app(state.clone()),
        admin_post(
            &format!("/api/businesses/biz/bookings/{booking_id}/cancel"),
            r#"{"reason":"schedule change"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(
        test_app(state.clone()),
        get_req("/api/businesses/biz/availability?service_id=cut&staff_id=anna&date=2030-06-17"),
    )
    .await;
    let slots = json["data"]["slots"].as_array().unwrap();
    let ten = slots
        .iter()
        .find(|s| s["start"].as_str().unwrap().ends_with("T10:00:00"))
        .unwrap();
    assert_eq!(ten["available"], true);

    // Cancelling twice reports the dedicated error.
    let (status, json) = send(
        test_app(state),
        admin_post(
            &format!("/api/businesses/biz/bookings/{booking_id}/cancel"),
            "{}",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BOOKING_ALREADY_CANCELLED");
}

// ── Guest bookings ──

#[tokio::test]
async fn test_guest_email_reused_across_bookings() {
    let state = test_state();
    seed(&state);

    let guest = |start: &str| {
        format!(
            r#"{{"service_id":"cut","staff_id":"anna","customer_name":"Greta","customer_email":"greta@example.com","start_time":"{start}"}}"#
        )
    };

    let (status, first) = send(
        test_app(state.clone()),
        post_json("/api/businesses/biz/bookings", &guest("2030-06-17 10:00")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, second) = send(
        test_app(state.clone()),
        post_json("/api/businesses/biz/bookings", &guest("2030-06-17 11:00")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["data"]["customer_id"], second["data"]["customer_id"]);

    let customer_id = first["data"]["customer_id"].as_str().unwrap();
    let (status, json) = send(
        test_app(state),
        admin_get(&format!("/api/businesses/biz/customers/{customer_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total_bookings"], 2);
}

#[tokio::test]
async fn test_guest_booking_without_contact_fails_validation() {
    let state = test_state();
    seed(&state);

    let (status, json) = send(
        test_app(state),
        post_json(
            "/api/businesses/biz/bookings",
            r#"{"service_id":"cut","staff_id":"anna","start_time":"2030-06-17 10:00"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
    assert!(!json["validation_errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_bad_start_time_fails_validation() {
    let state = test_state();
    seed(&state);

    let (status, json) = send(
        test_app(state),
        post_json(
            "/api/businesses/biz/bookings",
            r#"{"service_id":"cut","staff_id":"anna","customer_id":"cust","start_time":"next tuesday"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
    assert_eq!(json["validation_errors"][0]["field"], "start_time");
}

// ── Customers ──

#[tokio::test]
async fn test_customer_booking_history_includes_cancelled() {
    let state = test_state();
    seed(&state);

    let a = create_booking(&state, "2030-06-17 10:00").await;
    create_booking(&state, "2030-06-17 11:00").await;
    let a_id = a["id"].as_str().unwrap();

    send(
        test_app(state.clone()),
        admin_post(&format!("/api/businesses/biz/bookings/{a_id}/cancel"), "{}"),
    )
    .await;

    let (status, json) = send(
        test_app(state.clone()),
        admin_get("/api/businesses/biz/customers/cust/bookings"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let history = json["data"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    // Oldest first; cancellation stays visible as a status.
    assert_eq!(history[0]["status"], "cancelled");
    assert_eq!(history[1]["status"], "confirmed");

    let (status, json) = send(
        test_app(state),
        admin_get("/api/businesses/biz/customers/ghost/bookings"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "CUSTOMER_NOT_FOUND");
}

#[tokio::test]
async fn test_duplicate_customer_email_conflict() {
    let state = test_state();
    seed(&state);

    let (status, _) = send(
        test_app(state.clone()),
        admin_post(
            "/api/businesses/biz/customers",
            r#"{"name":"Dana","email":"dana@example.com"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = send(
        test_app(state),
        admin_post(
            "/api/businesses/biz/customers",
            r#"{"name":"Other Dana","email":"dana@example.com"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "CUSTOMER_EMAIL_EXISTS");
}

// ── Transitions ──

#[tokio::test]
async fn test_reschedule_and_conflict() {
    let state = test_state();
    seed(&state);

    let a = create_booking(&state, "2030-06-17 10:00").await;
    create_booking(&state, "2030-06-17 11:00").await;
    let a_id = a["id"].as_str().unwrap();

    // Onto the other booking: conflict.
    let (status, json) = send(
        test_app(state.clone()),
        admin_patch(
            &format!("/api/businesses/biz/bookings/{a_id}"),
            r#"{"start_time":"2030-06-17 11:00"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "SLOT_NOT_AVAILABLE");

    // To a free slot: fine, end recomputed.
    let (status, json) = send(
        test_app(state),
        admin_patch(
            &format!("/api/businesses/biz/bookings/{a_id}"),
            r#"{"start_time":"2030-06-17 14:00"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["end_time"], "2030-06-17T14:30:00");
}

#[tokio::test]
async fn test_confirm_auto_confirmed_booking_fails() {
    let state = test_state();
    seed(&state);

    let booking = create_booking(&state, "2030-06-17 10:00").await;
    let id = booking["id"].as_str().unwrap();

    let (status, json) = send(
        test_app(state),
        admin_post(&format!("/api/businesses/biz/bookings/{id}/confirm"), "{}"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_unknown_booking_404() {
    let state = test_state();
    seed(&state);

    let (status, json) = send(
        test_app(state),
        admin_post("/api/businesses/biz/bookings/ghost/complete", "{}"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "BOOKING_NOT_FOUND");
}

// ── Dashboard ──

#[tokio::test]
async fn test_dashboard_revenue_counts_completed_only() {
    let state = test_state();
    seed(&state);

    let a = create_booking(&state, "2030-06-17 10:00").await;
    create_booking(&state, "2030-06-17 11:00").await;
    let a_id = a["id"].as_str().unwrap();

    let (status, _) = send(
        test_app(state.clone()),
        admin_post(&format!("/api/businesses/biz/bookings/{a_id}/complete"), "{}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(test_app(state), admin_get("/api/businesses/biz/dashboard")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total_revenue_cents"], 4000);
    assert_eq!(json["data"]["average_booking_value_cents"], 4000);
    let popular = json["data"]["popular_services"].as_array().unwrap();
    assert_eq!(popular[0]["service_id"], "cut");
    assert_eq!(popular[0]["bookings"], 2);
}

// ── Bookings listing ──

#[tokio::test]
async fn test_list_bookings_with_status_filter() {
    let state = test_state();
    seed(&state);

    let a = create_booking(&state, "2030-06-17 10:00").await;
    create_booking(&state, "2030-06-17 11:00").await;
    let a_id = a["id"].as_str().unwrap();

    send(
        test_app(state.clone()),
        admin_post(&format!("/api/businesses/biz/bookings/{a_id}/cancel"), "{}"),
    )
    .await;

    let (status, json) = send(
        test_app(state.clone()),
        admin_get("/api/businesses/biz/bookings?status=cancelled"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let list = json["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["status"], "cancelled");

    let (_, json) = send(test_app(state), admin_get("/api/businesses/biz/bookings")).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

// ── Ledger/availability agreement under direct seeding ──

#[tokio::test]
async fn test_seeded_ledger_matches_availability() {
    let state = test_state();
    seed(&state);

    // Insert a confirmed booking directly, the way an import would.
    {
        let db = state.db.lock().unwrap();
        let now = dt("2025-06-01 00:00");
        queries::create_booking(
            &db,
            &Booking {
                id: "bk-direct".to_string(),
                business_id: "biz".to_string(),
                customer_id: "cust".to_string(),
                staff_id: "anna".to_string(),
                service_id: "cut".to_string(),
                start_time: dt("2030-06-17 09:00"),
                end_time: dt("2030-06-17 09:30"),
                status: BookingStatus::Confirmed,
                price_cents: 4000,
                currency: "USD".to_string(),
                buffer_before_minutes: 0,
                buffer_after_minutes: 0,
                notes: None,
                cancel_reason: None,
                cancelled_at: None,
                cancelled_by: None,
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
    }

    let (_, json) = send(
        test_app(state),
        get_req("/api/businesses/biz/availability?service_id=cut&staff_id=anna&date=2030-06-17"),
    )
    .await;
    let slots = json["data"]["slots"].as_array().unwrap();
    let nine = slots
        .iter()
        .find(|s| s["start"].as_str().unwrap().ends_with("T09:00:00"))
        .unwrap();
    assert_eq!(nine["available"], false);
}
