use userdesk::{
    config::{
        api::ApiConfig,
        session::{validate_production_config, SessionConfig},
    },
    db, router,
    services::ReqresClient,
    AppState,
};

use std::{env, net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "userdesk=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    validate_production_config()?;

    // Session store
    let pool = db::create_pool().await?;
    let session_store = SqliteStore::new(pool).with_table_name("sessions")?;
    session_store.migrate().await?;

    let session_config = SessionConfig::from_env();
    let session_layer = session_config.create_layer(session_store);

    // Users API client
    let api_config = ApiConfig::from_env();
    let client = ReqresClient::new(&api_config)?;
    tracing::info!("Using users API at {}", client.base_url());

    let app_state = AppState::new(Arc::new(client), session_config.idle_view_lifetime());

    let app = router(app_state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http());

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
