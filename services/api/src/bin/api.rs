//! services/api/src/bin/api.rs

use api_lib::{
    adapters::db::DbAdapter,
    config::Config,
    error::ApiError,
    web::{
        auth::{login_handler, signup_handler, verify_handler},
        conversations::{create_conversation_handler, list_conversations_handler},
        documents::{create_document_handler, delete_document_handler, list_documents_handler},
        health_handler,
        jwt::TokenManager,
        middleware::require_auth,
        sessions::{
            create_session_handler, delete_session_handler, list_sessions_handler,
            pause_session_handler, resume_session_handler, start_conversation_handler,
            stop_conversation_handler,
        },
        state::AppState,
        ApiDoc,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database at {}...", config.database_url);
    let db_adapter = Arc::new(DbAdapter::connect(&config.database_url).await?);
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db: db_adapter,
        config: config.clone(),
        tokens: TokenManager::new(config.jwt_secret.clone()),
    });

    // The control panel polls from arbitrary origins; mirror the permissive
    // CORS policy of the original deployment.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // --- 4. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/api/auth/signup", post(signup_handler))
        .route("/api/auth/login", post(login_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/auth/verify", get(verify_handler))
        .route(
            "/api/glass-sessions",
            get(list_sessions_handler).post(create_session_handler),
        )
        .route("/api/glass-sessions/{id}", delete(delete_session_handler))
        .route(
            "/api/glass-sessions/{id}/pause",
            post(pause_session_handler),
        )
        .route(
            "/api/glass-sessions/{id}/resume",
            post(resume_session_handler),
        )
        .route(
            "/api/glass-sessions/{id}/start-conversation",
            post(start_conversation_handler),
        )
        .route(
            "/api/glass-sessions/{id}/stop-conversation",
            post(stop_conversation_handler),
        )
        .route(
            "/api/glass-sessions/{id}/conversations",
            get(list_conversations_handler).post(create_conversation_handler),
        )
        .route(
            "/api/documents",
            get(list_documents_handler).post(create_document_handler),
        )
        .route("/api/documents/{id}", delete(delete_document_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes; document payloads can be large, so allow 100 MiB
    // bodies like the original transport did.
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
