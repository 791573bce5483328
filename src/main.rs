//! Farewell Party Backend
//!
//! REST backend for the party app: name+birthday login, meal survey, music box,
//! roster and schedule management, backed by SQLite.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod summary;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{AdminSeed, Config};
use db::Repository;
use models::{CreateMemberRequest, Role};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Farewell Party Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (PARTY_API_PSK). The API is open to the network");
    }

    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    if let Some(seed) = &config.admin_seed {
        seed_admin(&repo, seed).await?;
    }

    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Make sure the bootstrap organizer can log in.
async fn seed_admin(repo: &Repository, seed: &AdminSeed) -> Result<(), errors::AppError> {
    let request = CreateMemberRequest {
        name: seed.name.clone(),
        first_name: seed.first_name.clone(),
        birthday: seed.birthday.clone(),
        role: Role::Admin,
    }
    .validated()?;

    if repo.ensure_member(&request).await? {
        tracing::info!("Seeded organizer account {}", request.name);
    }
    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // Organizer screens
    let admin_routes = Router::new()
        .route("/members", get(api::list_members))
        .route("/members", post(api::create_member))
        .route("/members/{id}", delete(api::delete_member))
        .route("/members/{id}/presence", put(api::update_presence))
        .route("/meal", get(api::list_meal_preferences))
        .route("/meal/summary", get(api::get_meal_summary))
        .route("/schedules", put(api::save_schedules))
        .route("/schedules/{id}", delete(api::delete_schedule))
        .route("/requests/{id}", delete(api::delete_request))
        .route_layer(middleware::from_fn(auth::admin_layer));

    // Screens for any logged-in member
    let member_routes = Router::new()
        .route("/session/home", get(api::home))
        .route("/meal", get(api::get_my_meal_preference))
        .route("/meal", put(api::save_my_meal_preference))
        .route("/requests", get(api::list_requests))
        .route("/requests", post(api::create_request))
        .route("/schedules", get(api::list_schedules))
        .nest("/admin", admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::session_layer,
        ));

    let public_routes = Router::new()
        .route("/session/login", post(api::login))
        .route("/meal/options", get(api::get_meal_options))
        .route("/revision", get(api::get_revision));

    let api_routes = public_routes
        .merge(member_routes)
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
