use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use classifier::{KeywordClassifier, LazyModelClassifier, TicketClassifier};
use shared::protocol::{CLASSIFY_FILE_ROUTE, CLASSIFY_ROUTE, HEALTH_ROUTE};
use tokio::signal;
use tower_http::{
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::MAX_UPLOAD_BYTES;
use app_state::AppState;
use config::{load_settings, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let state = AppState {
        classifier: select_classifier(&settings),
    };
    let app = build_router(Arc::new(state), &settings);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn select_classifier(settings: &Settings) -> Arc<dyn TicketClassifier> {
    if settings.use_trained_model {
        if !settings.model_path.exists() {
            warn!(
                path = %settings.model_path.display(),
                "trained model not found yet; requests fail until it is trained"
            );
        }
        info!(path = %settings.model_path.display(), "using trained model");
        Arc::new(LazyModelClassifier::new(settings.model_path.clone()))
    } else {
        info!("using keyword classifier");
        Arc::new(KeywordClassifier)
    }
}

fn build_router(state: Arc<AppState>, settings: &Settings) -> Router {
    let router = Router::new()
        .route(HEALTH_ROUTE, get(api::health))
        .route(CLASSIFY_ROUTE, post(api::classify_ticket))
        .route(CLASSIFY_FILE_ROUTE, post(api::classify_file))
        .with_state(state);

    // Static page is mounted last so API routes take precedence.
    let router = match &settings.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
