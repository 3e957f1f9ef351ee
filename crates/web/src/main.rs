use anyhow::Context;
use std::sync::Arc;
use storage::{
    BookingEngine, BookingStore, Database, InMemoryStore, SystemClock,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod app;
mod config;
mod error;
mod features;
mod middleware;

use config::Config;
use features::{classes, members, reservations, waitlist};
use middleware::auth::ApiKeys;

const ARCHIVE_INTERVAL: std::time::Duration = std::time::Duration::from_secs(3600);

#[derive(OpenApi)]
#[openapi(
    paths(
        app::health,
        classes::handlers::list_available,
        classes::handlers::get_availability,
        classes::handlers::get_waitlist,
        classes::handlers::create_class,
        classes::handlers::get_roster,
        classes::handlers::cancel_class,
        classes::handlers::complete_class,
        classes::handlers::mark_attendance,
        members::handlers::create_member,
        members::handlers::get_member,
        members::handlers::list_reservations,
        members::handlers::list_waitlist,
        reservations::handlers::book,
        reservations::handlers::cancel,
        reservations::handlers::admin_cancel,
        reservations::handlers::mark_present,
        reservations::handlers::mark_absent,
        waitlist::handlers::join,
        waitlist::handlers::leave,
    ),
    components(
        schemas(
            storage::dto::class::CreateClassRequest,
            storage::dto::class::ClassResponse,
            storage::dto::class::AvailabilityResponse,
            storage::dto::class::ClassCancellationResponse,
            storage::dto::class::BulkAttendanceRequest,
            storage::dto::class::BulkAttendanceItem,
            storage::dto::class::BulkAttendanceResponse,
            storage::dto::member::CreateMemberRequest,
            storage::dto::member::MemberResponse,
            storage::dto::reservation::BookRequest,
            storage::dto::reservation::BookingKind,
            storage::dto::reservation::BookingResponse,
            storage::dto::reservation::CancelReservationRequest,
            storage::dto::reservation::ReservationResponse,
            storage::dto::reservation::CancellationResponse,
            storage::dto::reservation::PenaltyResponse,
            storage::dto::reservation::AttendanceResponse,
            storage::dto::waitlist::JoinWaitlistRequest,
            storage::dto::waitlist::LeaveWaitlistRequest,
            storage::dto::waitlist::WaitlistEntryResponse,
            storage::dto::common::PaginationMeta,
            storage::models::ClassType,
            storage::models::ClassStatus,
            storage::models::ReservationStatus,
            storage::models::WaitlistStatus,
            storage::models::MembershipStatus,
        )
    ),
    tags(
        (name = "health", description = "Liveness"),
        (name = "classes", description = "Class schedule, seats and attendance"),
        (name = "members", description = "Members, their status and history"),
        (name = "reservations", description = "Booking and cancelling seats"),
        (name = "waitlist", description = "Waitlist queue"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting gym booking API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    let store: Arc<dyn BookingStore> = match &config.database_url {
        Some(database_url) => {
            tracing::info!(
                "Connecting to database at: {}",
                database_url.split('@').next_back().unwrap_or("unknown")
            );
            let db = Database::new(database_url)
                .await
                .context("Failed to initialize database")?;
            tracing::info!("Database connection established");

            tracing::info!("Running database migrations");
            db.run_migrations()
                .await
                .context("Failed to run migrations")?;
            tracing::info!("Database migrations completed successfully");

            Arc::new(db.booking_store())
        }
        None => {
            tracing::warn!("DATABASE_URL not set, bookings are kept in memory only");
            Arc::new(InMemoryStore::new())
        }
    };

    let engine = BookingEngine::open(store, Arc::new(SystemClock), config.policy.clone())
        .await
        .context("Failed to load bookings")?;
    let engine = Arc::new(engine);

    let archiver = Arc::clone(&engine);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ARCHIVE_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = archiver.archive_closed().await {
                tracing::error!("Failed to archive closed classes: {:?}", e);
            }
        }
    });

    let api_keys = ApiKeys::from_comma_separated(&config.api_keys);
    if api_keys.is_empty() {
        tracing::warn!("API_KEYS is empty, administrative routes will reject every request");
    }

    let app = app::router(engine, api_keys)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    axum::serve(listener, app).await?;

    Ok(())
}
