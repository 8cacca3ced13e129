mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use er_core::domain::settings::ServiceSettings;
use er_core::infra::rewriter::{CompletionBackend, OpenRouterBackend};
use er_core::usecase::rewrite_service::RewriteService;

pub type BoxError = Box<dyn std::error::Error>;

/// ルーターを構築する（バックエンドは差し替え可能）
pub fn router(service: Arc<RewriteService>) -> Router {
    Router::new()
        .route("/api/rewrite", post(handlers::rewrite_email))
        .route("/health", get(handlers::health))
        .with_state(service)
}

fn create_backend(settings: &ServiceSettings) -> Result<Arc<dyn CompletionBackend>, BoxError> {
    let backend = OpenRouterBackend::new(settings.attempt_timeout())?;
    match settings.attempt_timeout() {
        Some(timeout) => log::info!("OpenRouter backend selected (attempt timeout {timeout:?})"),
        None => log::info!("OpenRouter backend selected (no attempt timeout)"),
    }
    Ok(Arc::new(backend))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("shutdown signal received");
}

/// ホスト名（localhost など）も IP アドレスもそのまま解決して待ち受ける
async fn bind_listener(host: &str, port: u16) -> Result<TcpListener, BoxError> {
    TcpListener::bind((host, port))
        .await
        .map_err(|e| format!("failed to bind {host}:{port}: {e}").into())
}

async fn serve(settings: ServiceSettings) -> Result<(), BoxError> {
    let listener = bind_listener(&settings.host, settings.port).await?;

    if settings.api_key.is_none() {
        log::warn!("OPENROUTER_API_KEY is not set; requests must supply api_key");
    }

    let backend = create_backend(&settings)?;
    let service = Arc::new(RewriteService::new(settings, backend));
    let app = router(service);

    log::info!("email rewriter listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn run() -> Result<(), BoxError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = ServiceSettings::from_env();
    log::debug!("settings: {settings:?}");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(settings))
}
