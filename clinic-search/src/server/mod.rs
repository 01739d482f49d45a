// Server module - HTTP server setup and routing
pub mod handlers;
pub mod response;
pub mod state;

use std::net::SocketAddr;

use axum::http::{header, HeaderName, Method};
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use self::handlers::{health, management, search};
use self::state::AppState;
use crate::AppError;

/// Create CORS layer allowing the operator header.
pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(management::OPERATOR_TOKEN_HEADER),
        ])
}

fn management_routes() -> Router<AppState> {
    Router::new()
        .route("/indices/create", post(management::create_indices))
        .route("/indices/faq", post(management::create_faq_index))
        .route("/indices/list", get(management::list_indices))
        .route("/indices/all", delete(management::delete_all_indices))
        .route("/indices/:name", delete(management::delete_index))
        .route("/sync/all", post(management::sync_all))
        .route("/sync/status/:index_name", get(management::sync_status))
        .route("/sync/bulk/:index_name", post(management::bulk_sync))
        .route(
            "/sync/document/:index_name/:document_id",
            post(management::sync_document).delete(management::delete_document),
        )
        .route(
            "/sync/document/:index_name/:document_id/update",
            post(management::update_document),
        )
        .route("/sync/:index_name", post(management::sync_index))
}

fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/pets", get(search::search_pets))
        .route("/appointments", get(search::search_appointments))
        .route("/users", get(search::search_users))
        .route("/clinics", get(search::search_clinics))
        .route("/health-records", get(search::search_health_records))
        .route("/faqs", get(search::search_faqs))
        .route("/global", post(search::global_search))
        .route("/suggestions", get(search::suggestions))
}

/// Create the Axum application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .nest("/elasticsearch/management", management_routes())
        .nest("/elasticsearch/search", search_routes())
        .route("/elasticsearch/health", get(health::health))
        .route("/elasticsearch/health/cluster", get(health::cluster_health))
        .route("/elasticsearch/status", get(health::service_status))
        .layer(create_cors_layer())
        .with_state(state)
}

/// Run the server on the specified address until Ctrl-C.
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    info!(addr = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await
        }
    }
}
