mod config;
mod handlers;
mod service;

#[cfg(test)]
mod tests;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use handlers::AppState;
use service::AwsBillingService;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::load_config;

#[derive(Parser)]
#[command(name = "billing-api")]
struct Args {
    #[arg(long, default_value = "config")]
    config_file: String,
}

pub fn build_router(state: AppState) -> Router {
    let base = state.base_path.clone();

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/cost-data", post(handlers::cost_data))
        .route("/cost-data-simple", post(handlers::cost_data_simple))
        .route("/dimensions", post(handlers::dimension_values))
        .route("/account-info", post(handlers::account_info))
        .route("/validate-credentials", post(handlers::validate_credentials))
        .with_state(state);

    let app = Router::new()
        .route("/", get(handlers::root))
        .nest("/api", api_routes.clone());

    if base == "/" {
        app
    } else {
        // Dual-mount so the API also answers under the configured prefix.
        app.nest(&base, Router::new().nest("/api", api_routes))
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("server=info"));

    let args = Args::parse();
    let app_config = load_config(&args.config_file).await?;
    log::debug!(
        "config: default_aws_region={} redis_url={} cache_ttl={}s",
        app_config.default_aws_region,
        app_config.redis_url,
        app_config.cache_ttl
    );

    let state = AppState {
        service: Arc::new(AwsBillingService),
        base_path: app_config.base_path.clone(),
    };

    let app = build_router(state).layer(cors_layer(&app_config.origins()));

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", app_config.host, app_config.port)).await?;
    log::info!(
        "Listening on http://{}:{}",
        app_config.host,
        app_config.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
