use std::{any::Any, net::SocketAddr};

use axum::{response::Response, routing::get, Router};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, cors::CorsLayer,
    trace::TraceLayer,
};

use crate::{
    discovery,
    response::{envelope_response, ApiResponse, ResponseStatus},
    state::AppState,
    swipes, users,
};

pub fn build_app(state: AppState) -> Router {
    let api = Router::new()
        .merge(users::router())
        .merge(discovery::router())
        .merge(swipes::router())
        .route("/health", get(|| async { ApiResponse::empty() }));

    with_pipeline(
        Router::new()
            .nest("/minder", api)
            .fallback(not_found)
            .with_state(state),
    )
}

/// Tracing, panic recovery, compression and CORS around every route.
pub fn with_pipeline(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|req: &axum::http::Request<_>| {
                        let method = req.method().clone();
                        let uri = req.uri().clone();
                        tracing::info_span!(
                            "http_request",
                            %method,
                            uri = %uri,
                            status = tracing::field::Empty
                        )
                    })
                    .on_response(
                        |res: &axum::http::Response<_>,
                         latency: std::time::Duration,
                         span: &tracing::Span| {
                            let status = res.status();
                            span.record("status", tracing::field::display(status));
                            let latency_ms = latency.as_millis() as u64;
                            if status.is_server_error() {
                                tracing::error!(%status, latency_ms, "response");
                            } else {
                                tracing::info!(%status, latency_ms, "response");
                            }
                        },
                    ),
            )
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive()),
    )
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "handler panicked");
    envelope_response::<()>(ResponseStatus::InternalServerError, None)
}

async fn not_found() -> Response {
    envelope_response::<()>(ResponseStatus::NotFound, None)
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for Ctrl+C");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
