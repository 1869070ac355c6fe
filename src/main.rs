use std::sync::Arc;

use axum::http::HeaderValue;
use axum::middleware;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use obala_gateway::{
    logging, routes, AppState, Config, GeminiClient, KeyAuthenticator, QuotaEnforcer, TtsClient,
    UserStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting OBALA API gateway");

    // Initialize components
    let store = Arc::new(UserStore::new(&config.database_url)?);
    let authenticator = KeyAuthenticator::new(store.clone());
    let quota = QuotaEnforcer::new(store.clone());
    let gemini = GeminiClient::new(
        &config.generation_base_url,
        &config.generation_api_key,
        &config.generation_model,
    );
    let tts = TtsClient::new(&config.tts_base_url, &config.tts_language, &config.tts_speaker);

    // Build CORS layer
    let cors = if config.cors_origins == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .split(',')
            .filter_map(|origin| origin.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let addr = format!("{}:{}", config.host, config.port);

    let state = Arc::new(AppState {
        store,
        authenticator,
        quota,
        gemini,
        tts,
    });

    // Build router
    let app = routes::router(state)
        .layer(middleware::from_fn(logging::request_logger))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
