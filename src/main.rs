use std::sync::{Arc, Mutex};

use axum::routing::{get, patch, post};
use axum::Router;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::handlers;
use salonbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let (events_tx, _) = broadcast::channel(256);

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        events_tx,
    });

    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/businesses", post(handlers::businesses::create_business))
        .route(
            "/api/businesses/:business_id",
            get(handlers::businesses::get_business),
        )
        .route(
            "/api/businesses/:business_id/services",
            post(handlers::catalog::create_service).get(handlers::catalog::list_services),
        )
        .route(
            "/api/businesses/:business_id/services/:id",
            patch(handlers::catalog::update_service),
        )
        .route(
            "/api/businesses/:business_id/staff",
            post(handlers::catalog::create_staff).get(handlers::catalog::list_staff),
        )
        .route(
            "/api/businesses/:business_id/staff/:id",
            patch(handlers::catalog::update_staff),
        )
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
            "/api/businesses/:business_id/bookings/:id/no-show",
            post(handlers::bookings::no_show_booking),
        )
        .route(
            "/api/businesses/:business_id/dashboard",
            get(handlers::dashboard::get_dashboard),
        )
        .route("/api/events", get(handlers::events::events_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
