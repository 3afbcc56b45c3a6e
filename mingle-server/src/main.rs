use std::net::SocketAddr;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mingle_server::api;
use mingle_server::config::Settings;
use mingle_server::db::Database;
use mingle_server::identity::IdentityClient;
use mingle_server::media::MediaStore;
use mingle_server::state::AppState;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mingle_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load settings
    let settings = Settings::new().expect("Failed to load settings");

    // Initialize database
    let db = Database::new(&settings.database.path).expect("Failed to create database");

    db.initialize()
        .expect("Failed to initialize database schema");

    tracing::info!("Database initialized successfully");

    // Create application state
    let identity = IdentityClient::new(&settings.identity.base_url);
    let media = MediaStore::new(&settings.media.base_url);
    let state = AppState::new(db, identity, media);

    // Run initial session cleanup on startup
    match state.sessions.cleanup_expired_sessions() {
        Ok(count) if count > 0 => {
            tracing::info!("Cleaned up {} expired sessions on startup", count);
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!("Failed to cleanup expired sessions on startup: {}", e);
        }
    }

    // Start background task for periodic session cleanup
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            if let Err(e) = cleanup_state.sessions.cleanup_expired_sessions() {
                tracing::error!("Periodic session cleanup failed: {}", e);
            }
        }
    });

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .expect("Failed to parse server address");
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app).await.expect("Server error");
}
