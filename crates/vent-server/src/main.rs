use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use vent_api::auth::{AppState, AppStateInner, AuthConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vent=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret = std::env::var("VENT_JWT_SECRET").unwrap_or_else(|_| {
        warn!("VENT_JWT_SECRET not set, using dev secret");
        "dev-secret-change-me".into()
    });
    let db_path = std::env::var("VENT_DB_PATH").unwrap_or_else(|_| "vent.db".into());
    let host = std::env::var("VENT_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("VENT_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let secure_cookies = std::env::var("VENT_SECURE_COOKIES")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    // Init database
    let db = vent_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        config: AuthConfig {
            jwt_secret,
            secure_cookies,
        },
    });

    let app = vent_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Vent server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
