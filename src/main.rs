use schoolmule_portal::{
    AppState, PortalError,
    api::{HttpSessionValidator, ValidatorState},
    config::{AppConfig, Env},
    create_router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, installs logging, wires the validation client and serves
/// the access-policy API.
#[tokio::main]
async fn main() -> Result<(), PortalError> {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // .env is read before the config so local overrides apply.
    dotenv::dotenv().ok();
    let config = AppConfig::load()?;

    // 2. Logging Filter Setup
    // RUST_LOG wins over the development default.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "schoolmule_portal=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: pretty output for reading in a terminal.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Portal starting in {:?} mode", config.env);

    // 4. Session Validation Client
    // Every authenticated route forwards the bearer token through this client.
    let validator = Arc::new(HttpSessionValidator::from_config(&config)?) as ValidatorState;
    tracing::info!(api = %config.api_base_url, "session validation client ready");

    // 5. Unified State Assembly
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState { validator, config });

    // 6. Router and Server Startup
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API documentation available at /swagger-ui");

    axum::serve(listener, app).await?;
    Ok(())
}
